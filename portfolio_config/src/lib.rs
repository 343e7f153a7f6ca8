use std::{net::IpAddr, path::Path};

use anyhow::Context;
use config::{File, FileFormat};
use serde::Deserialize;

pub use duration::Duration;

mod duration;

/// Default configuration, compiled into the binary.
pub const DEFAULT_CONFIG: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../config.toml"));

/// Environment variables that override single configuration keys.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("PORT", "http.port"),
    ("TRUST_PROXY", "http.trust_proxy"),
    ("CLIENT_URL", "cors.client_url"),
    ("DATABASE_URL", "database.url"),
    ("CONTACT_ADMIN_TOKEN", "contact.admin_token"),
];

/// Load the configuration from the process environment.
///
/// Additional TOML files can be listed in `PORTFOLIO_CONFIG`, separated by
/// colons. Later files take precedence.
pub fn load() -> anyhow::Result<Config> {
    let paths = std::env::var("PORTFOLIO_CONFIG").unwrap_or_default();
    let paths = paths.split(':').filter(|p| !p.is_empty()).collect::<Vec<_>>();
    load_with(&paths, |key| std::env::var(key).ok())
}

pub fn load_with(
    paths: &[impl AsRef<Path>],
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Config> {
    let builder = config::Config::builder()
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

    let builder = paths.iter().try_fold(builder, |builder, path| {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;
        let source = File::from_str(&content, FileFormat::Toml);
        anyhow::Ok(builder.add_source(source))
    })?;

    ENV_OVERRIDES
        .iter()
        .try_fold(builder, |builder, &(var, key)| {
            builder.set_override_option(key, env(var).filter(|v| !v.is_empty()))
        })?
        .build()?
        .try_deserialize()
        .context("Failed to load config")
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub http: HttpConfig,
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    pub health: HealthConfig,
    pub contact: ContactConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub host: IpAddr,
    pub port: u16,
    pub path_prefix: String,
    pub body_limit: usize,
    /// Whether to read the client address from `real_ip_header`.
    pub trust_proxy: bool,
    /// Peers allowed to set `real_ip_header`. Empty means any peer.
    #[serde(default)]
    pub trusted_proxies: Vec<IpAddr>,
    pub real_ip_header: String,
}

#[derive(Debug, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub client_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
}

#[derive(Debug, Deserialize)]
pub struct HealthConfig {
    pub cache_ttl: Duration,
}

#[derive(Debug, Deserialize)]
pub struct ContactConfig {
    /// Bearer token required to list contact messages.
    pub admin_token: Option<String>,
    pub rate_limit: ContactRateLimitConfig,
}

#[derive(Debug, Deserialize)]
pub struct ContactRateLimitConfig {
    pub window: Duration,
    pub max_requests: u64,
    /// Number of tracked clients after which expired windows are pruned.
    pub capacity: usize,
}
