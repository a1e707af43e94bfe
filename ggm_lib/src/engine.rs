//! Valuation entry point: price series and dividends in, fair price out.
//!
//! Pure and synchronous. Every call owns its inputs; nothing is cached or
//! shared between calls, so callers may value tickers in parallel.

use serde::{Deserialize, Serialize};

use crate::capm::{percent_to_rate, required_return};
use crate::dividends::{DividendGrowth, DividendHistory, DividendStats};
use crate::error::ValuationError;
use crate::regression::{estimate_beta, RegressionResult};
use crate::series::{align_on_dates, latest_value, log_returns, PriceObservation};
use crate::valuation::{gordon_fair_price, FairPriceEstimate, ModelInputs};

/// Everything produced by one valuation.
///
/// For a ticker without dividends only `ticker` and the absent `estimate`
/// are populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub ticker: String,
    pub estimate: FairPriceEstimate,
    pub inputs: Option<ModelInputs>,
    pub regression: Option<RegressionResult>,
    pub dividend_growth: Option<DividendGrowth>,
    pub dividend_stats: Option<DividendStats>,
}

impl Valuation {
    fn without_dividends(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            estimate: FairPriceEstimate::absent(),
            inputs: None,
            regression: None,
            dividend_growth: None,
            dividend_stats: None,
        }
    }

    pub fn fair_price(&self) -> Option<f64> {
        self.estimate.value
    }

    /// Fair price relative to the last traded price, as a fraction.
    pub fn upside(&self) -> Option<f64> {
        let price = self.fair_price()?;
        let last = self.inputs?.last_price;
        (last > 0.0).then(|| price / last - 1.0)
    }
}

/// Reads the risk-free rate from a series quoted in percent.
pub fn risk_free_rate(risk_free: &[PriceObservation]) -> Result<f64, ValuationError> {
    latest_value(risk_free)
        .map(percent_to_rate)
        .ok_or_else(|| ValuationError::insufficient("risk-free rate", 1, 0))
}

/// Estimates beta of `prices` against `market` on their common dates.
pub fn estimate_regression(
    prices: &[PriceObservation],
    market: &[PriceObservation],
) -> Result<RegressionResult, ValuationError> {
    let (stock, index) = align_on_dates(prices, market);
    let stock_returns = log_returns(&stock)?;
    let market_returns = log_returns(&index)?;
    estimate_beta(&stock_returns, &market_returns)
}

/// CAPM required return for a ticker, with the regression it came from.
pub fn estimate_required_return(
    prices: &[PriceObservation],
    market: &[PriceObservation],
    risk_free: &[PriceObservation],
    market_return: f64,
) -> Result<(f64, f64, RegressionResult), ValuationError> {
    let regression = estimate_regression(prices, market)?;
    let rf = risk_free_rate(risk_free)?;
    Ok((
        required_return(rf, regression.beta, market_return),
        rf,
        regression,
    ))
}

/// Values a ticker with the Gordon Growth Model, CAPM supplying `r`.
///
/// A missing or empty dividend history is not an error: the result carries
/// an absent estimate. `r <= g` fails with
/// [`ValuationError::UndefinedValuation`].
pub fn estimate_fair_price(
    ticker: &str,
    prices: &[PriceObservation],
    market: &[PriceObservation],
    risk_free: &[PriceObservation],
    dividends: Option<&DividendHistory>,
    market_return: f64,
) -> Result<Valuation, ValuationError> {
    let dividends = match dividends {
        Some(history) if !history.is_empty() => history,
        _ => {
            tracing::info!(ticker, "no dividend history, fair price is absent");
            return Ok(Valuation::without_dividends(ticker));
        }
    };

    let growth = dividends.growth()?;
    let stats = dividends.stats()?;

    let (required, rf, regression) =
        estimate_required_return(prices, market, risk_free, market_return)?;
    let last_price = latest_value(prices)
        .ok_or_else(|| ValuationError::insufficient("last price", 1, 0))?;

    let fair_price = gordon_fair_price(required, growth.growth, growth.yearly_dividend)?;

    tracing::info!(
        ticker,
        beta = regression.beta,
        required_return = required,
        growth = growth.growth,
        fair_price,
        last_price,
        "fair price estimated"
    );

    Ok(Valuation {
        ticker: ticker.to_string(),
        estimate: FairPriceEstimate::of(fair_price),
        inputs: Some(ModelInputs {
            yearly_dividend: growth.yearly_dividend,
            growth: growth.growth,
            required_return: required,
            risk_free_rate: rf,
            market_return,
            last_price,
        }),
        regression: Some(regression),
        dividend_growth: Some(growth),
        dividend_stats: Some(stats),
    })
}
