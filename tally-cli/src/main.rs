use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod runtime;

#[derive(Parser)]
#[command(name = "tally", about = "Search and display touchpoint attribution")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Attribute a customer's conversion across channels
    Attribute(commands::attribute::AttributeArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
    /// Summarize a customer's touchpoint history
    Insights(commands::insights::InsightsArgs),
    /// Run the tally server
    Serve(commands::serve::ServeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Attribute(args) => commands::attribute::run(args).await,
        Commands::Config(args) => commands::config::run(args),
        Commands::Insights(args) => commands::insights::run(args).await,
        Commands::Serve(args) => commands::serve::run(args).await,
    }
}
