//! `ggm stats`: dividend statistics and trailing-year growth.

use anyhow::Result;
use clap::Args;
use ggm_lib::validation::validate_ticker;
use ggm_lib::{DividataSource, DividendHistoryProvider, ValuationError};

use crate::output::{print_stats, OutputFormat};

#[derive(Args)]
pub struct StatsArgs {
    /// Ticker symbol
    pub ticker: String,
}

pub async fn run(args: &StatsArgs, format: &OutputFormat) -> Result<()> {
    let ticker = validate_ticker(&args.ticker)?;
    let dividata = DividataSource::new()?;

    let Some(history) = dividata.dividend_history(&ticker).await? else {
        eprintln!("{} has never paid a dividend.", ticker);
        return Ok(());
    };

    let stats = history.stats()?;
    let growth = match history.growth() {
        Ok(g) => Some(g),
        Err(e @ (ValuationError::InsufficientData { .. } | ValuationError::UndefinedValue(_))) => {
            eprintln!("Growth unavailable: {}", e);
            None
        }
        Err(e) => return Err(e.into()),
    };

    print_stats(&ticker, &stats, growth.as_ref(), format)
}
