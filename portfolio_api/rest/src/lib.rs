use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use axum::{extract::DefaultBodyLimit, Router};
use portfolio_core_contact_contracts::ContactFeatureService;
use portfolio_core_health_contracts::HealthFeatureService;
use portfolio_di::Build;
use routes::contact::ContactState;
use tokio::{net::TcpListener, signal};
use tracing::info;

pub use middlewares::cors::{is_origin_allowed, CorsPolicy};

mod extractors;
mod middlewares;
mod models;
mod routes;


#[derive(Debug, Clone, Build)]
pub struct RestServer<Health, Contact> {
    health: Health,
    contact: Contact,
    config: RestServerConfig,
}

#[derive(Debug, Clone)]
pub struct RestServerConfig {
    /// Prefix of all routes, empty to mount them at the root.
    pub path_prefix: String,
    pub body_limit: usize,
    pub real_ip: Option<Arc<RealIpConfig>>,
    pub cors: Arc<CorsPolicy>,
    pub admin_token: Option<String>,
}

#[derive(Debug)]
pub struct RealIpConfig {
    /// Header carrying the client address, e.g. `X-Forwarded-For`.
    pub header: String,
    /// Peers allowed to set `header`. Empty means any peer.
    pub trusted_proxies: Vec<IpAddr>,
}

impl<Health, Contact> RestServer<Health, Contact>
where
    Health: HealthFeatureService,
    Contact: ContactFeatureService,
{
    pub async fn serve(self, host: IpAddr, port: u16) -> anyhow::Result<()> {
        let router = self.router();
        let listener = TcpListener::bind((host, port)).await?;
        info!("Listening on {}", listener.local_addr()?);

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(Into::into)
    }

    fn router(self) -> Router<()> {
        let RestServerConfig {
            path_prefix,
            body_limit,
            real_ip,
            cors,
            admin_token,
        } = self.config;

        let api = Router::new()
            .merge(routes::health::router(self.health.into()))
            .merge(routes::contact::router(Arc::new(ContactState {
                service: self.contact,
                admin_token,
            })));

        let router = match path_prefix.trim_matches('/') {
            "" => api,
            prefix => Router::new().nest(&format!("/{prefix}"), api),
        }
        .fallback(routes::not_found)
        .layer(DefaultBodyLimit::max(body_limit));

        let router = middlewares::panic_handler::add(router);
        let router = middlewares::cors::add(cors)(router);
        let router = middlewares::trace::add(router);
        let router = middlewares::request_id::add(router);
        middlewares::client_ip::add(real_ip)(router)
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install signal handler: {err}");
                std::future::pending::<()>().await;
            }
        }
        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
