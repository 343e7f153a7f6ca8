use std::{sync::Arc, time::Duration};

use portfolio_api_rest::{CorsPolicy, RealIpConfig, RestServerConfig};
use portfolio_config::Config;
use portfolio_core_contact_impl::ContactFeatureConfig;
use portfolio_core_health_impl::HealthFeatureConfig;
use portfolio_di::provider;
use portfolio_models::rate_limit::RateLimitPolicy;
use portfolio_shared_impl::rate_limit::RateLimitServiceConfig;
use types::Database;

pub mod types;

const MAX_RATE_LIMIT_WINDOW: Duration = Duration::from_secs(365 * 24 * 60 * 60);

provider! {
    /// The default provider, capable of providing all the dependencies
    pub Provider {
        database: Database,
        ..config: ConfigProvider {
            // API
            RestServerConfig,

            // Shared
            RateLimitServiceConfig,

            // Core
            ContactFeatureConfig,
            HealthFeatureConfig,
        }
    }
}

impl Provider {
    pub fn new(config: ConfigProvider, database: Database) -> Self {
        Self {
            _cache: Default::default(),
            database,
            config,
        }
    }
}

provider! {
    /// Reduced provider, capable of providing services that only depend on the configuration
    pub ConfigProvider {
        // API
        rest_server_config: RestServerConfig,

        // Shared
        rate_limit_service_config: RateLimitServiceConfig,

        // Core
        contact_feature_config: ContactFeatureConfig,
        health_feature_config: HealthFeatureConfig,
    }
}

impl ConfigProvider {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        anyhow::ensure!(
            config.contact.rate_limit.max_requests > 0,
            "contact.rate_limit.max_requests must be positive"
        );
        anyhow::ensure!(
            !config.contact.rate_limit.window.is_zero(),
            "contact.rate_limit.window must not be empty"
        );
        anyhow::ensure!(
            *config.contact.rate_limit.window <= MAX_RATE_LIMIT_WINDOW,
            "contact.rate_limit.window must not exceed 365 days"
        );

        // API
        let rest_server_config = RestServerConfig {
            path_prefix: config.http.path_prefix.clone(),
            body_limit: config.http.body_limit,
            real_ip: config.http.trust_proxy.then(|| {
                Arc::new(RealIpConfig {
                    header: config.http.real_ip_header.clone(),
                    trusted_proxies: config.http.trusted_proxies.clone(),
                })
            }),
            cors: Arc::new(CorsPolicy {
                allowed_origins: config.cors.allowed_origins.clone(),
                client_url: config.cors.client_url.clone(),
            }),
            admin_token: config.contact.admin_token.clone(),
        };

        // Shared
        let rate_limit_service_config = RateLimitServiceConfig {
            capacity: config.contact.rate_limit.capacity,
        };

        // Core
        let contact_feature_config = ContactFeatureConfig {
            rate_limit: RateLimitPolicy {
                max_requests: config.contact.rate_limit.max_requests,
                window: config.contact.rate_limit.window.into(),
            },
        };

        let health_feature_config = HealthFeatureConfig {
            cache_ttl: config.health.cache_ttl.into(),
        };

        Ok(Self {
            _cache: Default::default(),

            // API
            rest_server_config,

            // Shared
            rate_limit_service_config,

            // Core
            contact_feature_config,
            health_feature_config,
        })
    }
}

#[cfg(test)]
mod tests {
    use portfolio_di::Provide;
    use portfolio_persistence_postgres::PostgresDatabase;
    use types::{ContactFeature, RestServer};

    use super::*;

    const NO_PATHS: &[&str] = &[];

    #[tokio::test]
    async fn provide_rest_server() {
        let config = portfolio_config::load_with(NO_PATHS, |_| None).unwrap();
        let config_provider = ConfigProvider::new(&config).unwrap();

        let database = PostgresDatabase::dummy().await;

        let mut provider = Provider::new(config_provider, database);
        let _: RestServer = provider.provide();
        let _: ContactFeature = provider.provide();
    }

    #[test]
    fn real_ip_requires_trust_proxy() {
        let config = portfolio_config::load_with(NO_PATHS, |_| None).unwrap();
        let provider = ConfigProvider::new(&config).unwrap();
        assert!(provider.rest_server_config.real_ip.is_none());

        let config =
            portfolio_config::load_with(NO_PATHS, |key| (key == "TRUST_PROXY").then(|| "true".into()))
                .unwrap();
        let provider = ConfigProvider::new(&config).unwrap();
        let real_ip = provider.rest_server_config.real_ip.unwrap();
        assert_eq!(real_ip.header, "X-Forwarded-For");
    }

    #[test]
    fn huge_rate_limit_window_is_rejected() {
        let mut config = portfolio_config::load_with(NO_PATHS, |_| None).unwrap();
        config.contact.rate_limit.window = portfolio_config::Duration(Duration::from_secs(u64::MAX));
        assert!(ConfigProvider::new(&config).is_err());

        config.contact.rate_limit.window = portfolio_config::Duration(MAX_RATE_LIMIT_WINDOW);
        assert!(ConfigProvider::new(&config).is_ok());
    }

    #[test]
    fn empty_rate_limit_is_rejected() {
        let mut config = portfolio_config::load_with(NO_PATHS, |_| None).unwrap();
        config.contact.rate_limit.max_requests = 0;
        assert!(ConfigProvider::new(&config).is_err());
    }
}
