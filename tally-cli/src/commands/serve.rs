//! Tally serve command
//!
//! Runs the REST API over the configured store and models.

use anyhow::Result;
use clap::Args;
use tally_server::{AppState, ServerConfig, TallyServer};
use tracing::info;

use crate::config::{ConfigLoader, ConfigOverrides};
use crate::runtime::Runtime;

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Database file (or `:memory:`)
    #[arg(long)]
    pub database: Option<String>,
}

impl ServeArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            database: self.database.clone(),
        }
    }
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    let config = ConfigLoader::load_with(args.overrides())?;
    let runtime = Runtime::build(&config).await?;

    let server_config = ServerConfig::new(config.server.host, config.server.port);
    info!("Starting tally server on {}", server_config.addr());

    let state = AppState::new(runtime.manager, runtime.store);
    TallyServer::new(server_config, state).run().await?;
    Ok(())
}
