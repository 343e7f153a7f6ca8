use portfolio_config::Config;
use portfolio_di::Provide;
use portfolio_persistence_contracts::Database;
use tracing::{info, warn};

use crate::{
    database,
    environment::{types::RestServer, ConfigProvider, Provider},
};

pub async fn serve(config: Config) -> anyhow::Result<()> {
    let config_provider = ConfigProvider::new(&config)?;

    info!("Connecting to database");
    let database = database::connect(&config.database).await?;
    database.ping().await?;

    info!("Applying pending migrations");
    let mut applied = false;
    for name in database.run_migrations(None).await? {
        info!("Applied {name}");
        applied = true;
    }
    if !applied {
        info!("No migrations pending");
    }

    if config.contact.admin_token.is_none() {
        warn!("No contact admin token configured, stored messages can be listed by anyone");
    }

    let mut provider = Provider::new(config_provider, database);
    let server: RestServer = provider.provide();
    info!(
        "Starting http server on {}:{}",
        config.http.host, config.http.port
    );
    server.serve(config.http.host, config.http.port).await
}
