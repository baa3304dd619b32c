use anyhow::Result;
use clap::Args;
use tally_core::CustomerId;

use crate::config::{ConfigLoader, ConfigOverrides};
use crate::runtime::Runtime;

#[derive(Debug, Args)]
pub struct InsightsArgs {
    /// Customer to summarize
    pub customer_id: String,

    /// Database file (or `:memory:`)
    #[arg(long)]
    pub database: Option<String>,
}

/// Print search, display and cross-channel insights as JSON
pub async fn run(args: InsightsArgs) -> Result<()> {
    let config = ConfigLoader::load_with(ConfigOverrides {
        database: args.database,
        ..Default::default()
    })?;
    let runtime = Runtime::build(&config).await?;

    let insights = runtime
        .manager
        .comprehensive_insights(&CustomerId::from(args.customer_id))
        .await?;
    println!("{}", serde_json::to_string_pretty(&insights)?);
    Ok(())
}
