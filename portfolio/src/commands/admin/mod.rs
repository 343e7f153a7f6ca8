use clap::Subcommand;
use contact::AdminContactCommand;
use portfolio_config::Config;

mod contact;

#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    /// Inspect submitted contact messages
    #[command(aliases(["c"]))]
    Contact {
        #[command(subcommand)]
        command: AdminContactCommand,
    },
}

impl AdminCommand {
    pub async fn invoke(self, config: Config) -> anyhow::Result<()> {
        match self {
            AdminCommand::Contact { command } => command.invoke(config).await,
        }
    }
}
