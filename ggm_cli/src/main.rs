mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ggm_lib::ValuationConfig;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "ggm")]
#[command(about = "Value dividend-paying stocks with the Gordon Growth Model and CAPM")]
struct Cli {
    /// Output format: table, json, csv or markdown
    #[arg(long, default_value = "table", global = true)]
    output: String,

    /// TOML file overriding the default valuation settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate fair prices for one or more tickers
    Value(commands::value::ValueArgs),
    /// Back out growth or required return from the market price
    Infer(commands::infer::InferArgs),
    /// Show dividend statistics and growth for a ticker
    Stats(commands::stats::StatsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("ggm=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let format = match cli.output.as_str() {
        "json" => OutputFormat::Json,
        "csv" => OutputFormat::Csv,
        "markdown" | "md" => OutputFormat::Markdown,
        _ => OutputFormat::Table,
    };

    let config = ValuationConfig::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Value(args) => commands::value::run(args, &config, &format).await?,
        Commands::Infer(args) => commands::infer::run(args, &config, &format).await?,
        Commands::Stats(args) => commands::stats::run(args, &format).await?,
    }

    Ok(())
}
