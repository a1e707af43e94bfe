//! `ggm infer`: the growth or required return implied by the market price.

use anyhow::{bail, Result};
use clap::{Args, ValueEnum};
use ggm_lib::pipeline::infer_for_ticker;
use ggm_lib::{DividataSource, MarketContext, Parameter, ValuationConfig, YahooClient};

use crate::output::{print_inference, OutputFormat};

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SolveFor {
    Growth,
    RequiredReturn,
}

impl From<SolveFor> for Parameter {
    fn from(value: SolveFor) -> Self {
        match value {
            SolveFor::Growth => Parameter::Growth,
            SolveFor::RequiredReturn => Parameter::RequiredReturn,
        }
    }
}

#[derive(Args)]
pub struct InferArgs {
    /// Ticker symbol
    pub ticker: String,

    /// Parameter to back out of the last price
    #[arg(long, value_enum)]
    pub solve_for: SolveFor,

    /// Known required return when solving for growth (defaults to the CAPM estimate)
    #[arg(long)]
    pub required_return: Option<f64>,

    /// Known growth when solving for required return (defaults to dividend-history growth)
    #[arg(long)]
    pub growth: Option<f64>,

    /// Valuation date, YYYY-MM-DD (defaults to today)
    #[arg(long)]
    pub end_date: Option<String>,
}

/// The user-supplied value of the parameter that is not being solved for.
fn known_value(args: &InferArgs) -> Result<Option<f64>> {
    match args.solve_for {
        SolveFor::Growth => {
            if args.growth.is_some() {
                bail!("--growth cannot be given when solving for growth");
            }
            Ok(args.required_return)
        }
        SolveFor::RequiredReturn => {
            if args.required_return.is_some() {
                bail!("--required-return cannot be given when solving for required return");
            }
            Ok(args.growth)
        }
    }
}

pub async fn run(args: &InferArgs, config: &ValuationConfig, format: &OutputFormat) -> Result<()> {
    let known = known_value(args)?;
    let end = super::parse_end_date(args.end_date.as_deref())?;

    let yahoo = YahooClient::new()?.with_risk_free_symbol(&config.risk_free_symbol);
    let dividata = DividataSource::new()?;
    let ctx = MarketContext::load(&yahoo, config, end).await?;

    match infer_for_ticker(
        &ctx,
        &yahoo,
        &dividata,
        &args.ticker,
        args.solve_for.into(),
        known,
    )
    .await?
    {
        Some(inference) => print_inference(&inference, format),
        None => {
            eprintln!(
                "{} has no dividend history; nothing to infer.",
                args.ticker.trim().to_uppercase()
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(solve_for: SolveFor, required_return: Option<f64>, growth: Option<f64>) -> InferArgs {
        InferArgs {
            ticker: "KO".to_string(),
            solve_for,
            required_return,
            growth,
            end_date: None,
        }
    }

    #[test]
    fn known_value_follows_solve_for() {
        assert_eq!(known_value(&args(SolveFor::Growth, Some(0.08), None)).unwrap(), Some(0.08));
        assert_eq!(known_value(&args(SolveFor::RequiredReturn, None, Some(0.03))).unwrap(), Some(0.03));
        assert_eq!(known_value(&args(SolveFor::Growth, None, None)).unwrap(), None);
    }

    #[test]
    fn known_value_rejects_the_solved_parameter() {
        assert!(known_value(&args(SolveFor::Growth, None, Some(0.03))).is_err());
        assert!(known_value(&args(SolveFor::RequiredReturn, Some(0.08), None)).is_err());
    }

    #[test]
    fn solve_for_parses_kebab_case() {
        let parsed = SolveFor::from_str("required-return", false).unwrap();
        assert_eq!(Parameter::from(parsed), Parameter::RequiredReturn);
    }
}
