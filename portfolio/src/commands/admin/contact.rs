use anyhow::Context;
use clap::Subcommand;
use portfolio_config::Config;
use portfolio_core_contact_contracts::ContactFeatureService;
use portfolio_di::Provide;
use portfolio_models::contact::ContactMessage;

use crate::{
    database,
    environment::{types::ContactFeature, ConfigProvider, Provider},
};

#[derive(Debug, Subcommand)]
pub enum AdminContactCommand {
    /// List all contact messages, newest first
    #[command(aliases(["ls", "l"]))]
    List {
        /// Print the messages as a JSON array
        #[arg(long)]
        json: bool,
    },
}

impl AdminContactCommand {
    pub async fn invoke(self, config: Config) -> anyhow::Result<()> {
        match self {
            AdminContactCommand::List { json } => list(config, json).await,
        }
    }
}

async fn list(config: Config, json: bool) -> anyhow::Result<()> {
    let database = database::connect(&config.database).await?;
    let config_provider = ConfigProvider::new(&config)?;
    let mut provider = Provider::new(config_provider, database);

    let contact: ContactFeature = provider.provide();
    let messages = contact
        .list_messages()
        .await
        .context("Failed to list contact messages")?;

    if json {
        let messages = messages.iter().map(to_json).collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    for message in &messages {
        println!(
            "{} {} <{}> [{}]\n{}\n",
            message.created_at.to_rfc3339(),
            message.name.as_str(),
            message.email.as_str(),
            *message.id,
            message.message.as_str(),
        );
    }
    println!("{} message(s)", messages.len());

    Ok(())
}

fn to_json(message: &ContactMessage) -> serde_json::Value {
    serde_json::json!({
        "id": message.id,
        "name": message.name.as_str(),
        "email": message.email.as_str(),
        "message": message.message.as_str(),
        "createdAt": message.created_at.to_rfc3339(),
    })
}
