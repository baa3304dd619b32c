//! Compute attribution for a customer from the command line

use anyhow::Result;
use clap::{Args, ValueEnum};
use tally_core::{ConversionId, CustomerId};

use crate::config::{ConfigLoader, ConfigOverrides};
use crate::runtime::Runtime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChannelArg {
    Search,
    Display,
    Unified,
}

#[derive(Debug, Args)]
pub struct AttributeArgs {
    /// Customer to attribute
    pub customer_id: String,

    /// Conversion to attribute (defaults to the full history)
    #[arg(long)]
    pub conversion: Option<String>,

    /// Which channel model to run
    #[arg(long, value_enum, default_value_t = ChannelArg::Unified)]
    pub channel: ChannelArg,

    /// Database file (or `:memory:`)
    #[arg(long)]
    pub database: Option<String>,
}

pub async fn run(args: AttributeArgs) -> Result<()> {
    let config = ConfigLoader::load_with(ConfigOverrides {
        database: args.database.clone(),
        ..Default::default()
    })?;
    let runtime = Runtime::build(&config).await?;

    let customer_id = CustomerId::from(args.customer_id);
    let conversion_id = args.conversion.map(ConversionId::from);
    let conversion_id = conversion_id.as_ref();

    let output = match args.channel {
        ChannelArg::Search => serde_json::to_string_pretty(
            &runtime
                .manager
                .search_attribution(&customer_id, conversion_id)
                .await?,
        )?,
        ChannelArg::Display => serde_json::to_string_pretty(
            &runtime
                .manager
                .display_attribution(&customer_id, conversion_id)
                .await?,
        )?,
        ChannelArg::Unified => serde_json::to_string_pretty(
            &runtime
                .manager
                .unified_attribution(&customer_id, conversion_id)
                .await,
        )?,
    };
    println!("{}", output);
    Ok(())
}
