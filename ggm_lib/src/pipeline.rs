//! Glue between the providers and the pure engine.
//!
//! A [`MarketContext`] holds the series shared by every ticker of a run;
//! per-ticker work then only fetches that ticker's own data.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::config::ValuationConfig;
use crate::engine::{estimate_fair_price, estimate_required_return, Valuation};
use crate::error::{GgmError, ValuationError};
use crate::inverse::{infer_parameter, InferredParameter, KnownParameter, Parameter};
use crate::provider::{DividendHistoryProvider, PriceSeriesProvider, RiskFreeRateProvider};
use crate::regression::RegressionResult;
use crate::series::{latest_value, period_return, PriceObservation};
use crate::validation::validate_ticker;

/// Market index and risk-free series for one estimation window.
#[derive(Debug, Clone)]
pub struct MarketContext {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub market: Vec<PriceObservation>,
    pub risk_free: Vec<PriceObservation>,
    pub market_return: f64,
}

impl MarketContext {
    /// Fetches the shared series for `[end - lookback_days, end]`.
    ///
    /// The market return is `last / first - 1` of the index series unless
    /// the config fixes it.
    pub async fn load<P>(
        provider: &P,
        config: &ValuationConfig,
        end: NaiveDate,
    ) -> Result<Self, GgmError>
    where
        P: PriceSeriesProvider + RiskFreeRateProvider,
    {
        let start = end
            .checked_sub_days(Days::new(u64::from(config.lookback_days)))
            .ok_or_else(|| {
                GgmError::Config(format!(
                    "lookback of {} days before {} is out of range",
                    config.lookback_days, end
                ))
            })?;

        let (market, risk_free) = tokio::try_join!(
            provider.price_series(&config.market_symbol, start, end),
            provider.risk_free_series(start, end),
        )?;

        let market_return = match config.market_return {
            Some(fixed) => fixed,
            None => period_return(&market)?,
        };

        tracing::info!(
            market = %config.market_symbol,
            %start,
            %end,
            market_observations = market.len(),
            risk_free_observations = risk_free.len(),
            market_return,
            "market context loaded"
        );

        Ok(Self {
            start,
            end,
            market,
            risk_free,
            market_return,
        })
    }
}

/// Values one ticker against a loaded context.
///
/// Dividends are looked up first; a ticker that never paid one yields an
/// absent estimate without fetching its prices.
pub async fn value_ticker<P, D>(
    ctx: &MarketContext,
    prices: &P,
    dividends: &D,
    ticker: &str,
) -> Result<Valuation, GgmError>
where
    P: PriceSeriesProvider,
    D: DividendHistoryProvider,
{
    let history = dividends.dividend_history(ticker).await?;
    let series = match history {
        Some(ref h) if !h.is_empty() => prices.price_series(ticker, ctx.start, ctx.end).await?,
        _ => Vec::new(),
    };
    Ok(estimate_fair_price(
        ticker,
        &series,
        &ctx.market,
        &ctx.risk_free,
        history.as_ref(),
        ctx.market_return,
    )?)
}

/// Outcome of one ticker in a batch.
#[derive(Debug)]
pub struct BatchEntry {
    pub ticker: String,
    pub outcome: Result<Valuation, GgmError>,
}

impl BatchEntry {
    pub fn fair_price(&self) -> Option<f64> {
        self.outcome.as_ref().ok().and_then(Valuation::fair_price)
    }

    /// Failure reason, if the ticker could not be valued.
    pub fn failure(&self) -> Option<String> {
        self.outcome.as_ref().err().map(|e| e.to_string())
    }
}

/// Validates `ticker` and values it, capturing any failure in the entry.
pub async fn value_entry<P, D>(
    ctx: &MarketContext,
    prices: &P,
    dividends: &D,
    ticker: &str,
) -> BatchEntry
where
    P: PriceSeriesProvider,
    D: DividendHistoryProvider,
{
    let outcome = match validate_ticker(ticker) {
        Ok(symbol) => value_ticker(ctx, prices, dividends, &symbol).await,
        Err(e) => Err(e.into()),
    };
    if let Err(ref e) = outcome {
        tracing::warn!(ticker, error = %e, "valuation failed");
    }
    BatchEntry {
        ticker: ticker.trim().to_uppercase(),
        outcome,
    }
}

/// Implied parameter for a ticker, with the regression used when the
/// required return came from CAPM.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inference {
    pub ticker: String,
    pub result: InferredParameter,
    pub regression: Option<RegressionResult>,
}

/// Solves for `solve_for` at the ticker's last adjusted close.
///
/// The other parameter is `known` when given. Otherwise it is estimated:
/// the CAPM required return when solving for growth, the dividend-history
/// growth when solving for the required return. `Ok(None)` means the ticker
/// has no dividends.
pub async fn infer_for_ticker<P, D>(
    ctx: &MarketContext,
    prices: &P,
    dividends: &D,
    ticker: &str,
    solve_for: Parameter,
    known: Option<f64>,
) -> Result<Option<Inference>, GgmError>
where
    P: PriceSeriesProvider,
    D: DividendHistoryProvider,
{
    let ticker = validate_ticker(ticker)?;
    let history = match dividends.dividend_history(&ticker).await? {
        Some(h) if !h.is_empty() => h,
        _ => {
            tracing::info!(ticker = %ticker, "no dividend history, nothing to infer");
            return Ok(None);
        }
    };

    let series = prices.price_series(&ticker, ctx.start, ctx.end).await?;
    let observed_price =
        latest_value(&series).ok_or_else(|| ValuationError::insufficient("last price", 1, 0))?;

    let (known_parameter, regression) = match (solve_for, known) {
        (Parameter::Growth, Some(r)) => (KnownParameter::RequiredReturn(r), None),
        (Parameter::Growth, None) => {
            let (r, _, regression) = estimate_required_return(
                &series,
                &ctx.market,
                &ctx.risk_free,
                ctx.market_return,
            )?;
            (KnownParameter::RequiredReturn(r), Some(regression))
        }
        (Parameter::RequiredReturn, Some(g)) => (KnownParameter::Growth(g), None),
        (Parameter::RequiredReturn, None) => {
            (KnownParameter::Growth(history.growth()?.growth), None)
        }
    };

    let result = infer_parameter(known_parameter, observed_price, &history)?;
    Ok(Some(Inference {
        ticker,
        result,
        regression,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dividends::{DividendHistory, DividendRecord};
    use std::collections::HashMap;

    struct Fixture {
        series: HashMap<String, Vec<PriceObservation>>,
        dividends: HashMap<String, DividendHistory>,
    }

    impl PriceSeriesProvider for Fixture {
        async fn price_series(
            &self,
            symbol: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<PriceObservation>, GgmError> {
            self.series
                .get(symbol)
                .cloned()
                .ok_or_else(|| GgmError::Config(format!("no series for {}", symbol)))
        }
    }

    impl RiskFreeRateProvider for Fixture {
        async fn risk_free_series(
            &self,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Vec<PriceObservation>, GgmError> {
            self.price_series("^TNX", start, end).await
        }
    }

    impl DividendHistoryProvider for Fixture {
        async fn dividend_history(
            &self,
            symbol: &str,
        ) -> Result<Option<DividendHistory>, GgmError> {
            Ok(self.dividends.get(symbol).cloned())
        }
    }

    fn day(i: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 2).unwrap() + Days::new(i)
    }

    fn fixture() -> Fixture {
        let mut market = Vec::new();
        let mut stock = Vec::new();
        let (mut log_m, mut log_s) = (100f64.ln(), 50f64.ln());
        for i in 0..60u64 {
            let r = 0.01 * ((i as f64) * 0.7).cos();
            log_m += r;
            log_s += 0.8 * r;
            market.push(PriceObservation::new(day(i), log_m.exp()));
            stock.push(PriceObservation::new(day(i), log_s.exp()));
        }
        let tnx = vec![
            PriceObservation::new(day(0), 4.0),
            PriceObservation::new(day(59), 3.0),
        ];
        let amounts = [0.22, 0.22, 0.20, 0.20, 0.20, 0.20, 0.18, 0.18];
        let records = amounts
            .iter()
            .enumerate()
            .map(|(i, a)| DividendRecord::new(day(400) - Days::new(91 * i as u64), *a))
            .collect();

        Fixture {
            series: [
                ("^GSPC".to_string(), market),
                ("^TNX".to_string(), tnx),
                ("KO".to_string(), stock.clone()),
                ("BRK.B".to_string(), stock),
            ]
            .into_iter()
            .collect(),
            dividends: [("KO".to_string(), DividendHistory::new(records))]
                .into_iter()
                .collect(),
        }
    }

    fn config(market_return: Option<f64>) -> ValuationConfig {
        ValuationConfig {
            market_return,
            ..ValuationConfig::defaults().unwrap()
        }
    }

    #[tokio::test]
    async fn context_derives_market_return_from_index() {
        let fx = fixture();
        let ctx = MarketContext::load(&fx, &config(None), day(59)).await.unwrap();
        let expected = fx.series["^GSPC"][59].adjusted_close / fx.series["^GSPC"][0].adjusted_close - 1.0;
        assert!((ctx.market_return - expected).abs() < 1e-12);
        assert_eq!(ctx.end, day(59));
        assert_eq!(ctx.start, day(59) - Days::new(365));
    }

    #[tokio::test]
    async fn context_uses_fixed_market_return() {
        let fx = fixture();
        let ctx = MarketContext::load(&fx, &config(Some(0.3)), day(59)).await.unwrap();
        assert_eq!(ctx.market_return, 0.3);
    }

    #[tokio::test]
    async fn value_ticker_uses_latest_risk_free() {
        let fx = fixture();
        let ctx = MarketContext::load(&fx, &config(Some(0.3)), day(59)).await.unwrap();
        let v = value_ticker(&ctx, &fx, &fx, "KO").await.unwrap();
        let inputs = v.inputs.unwrap();
        assert!((inputs.risk_free_rate - 0.03).abs() < 1e-12);
        assert!((v.regression.unwrap().beta - 0.8).abs() < 1e-9);
        // r = 0.03 + 0.8 * 0.27
        assert!((inputs.required_return - 0.246).abs() < 1e-9);
        assert!(v.fair_price().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn no_dividend_entry_is_absent_not_failed() {
        let fx = fixture();
        let ctx = MarketContext::load(&fx, &config(Some(0.3)), day(59)).await.unwrap();
        let entry = value_entry(&ctx, &fx, &fx, "brk.b").await;
        assert_eq!(entry.ticker, "BRK.B");
        assert!(entry.failure().is_none());
        assert!(entry.fair_price().is_none());
    }

    #[tokio::test]
    async fn invalid_ticker_entry_fails() {
        let fx = fixture();
        let ctx = MarketContext::load(&fx, &config(Some(0.3)), day(59)).await.unwrap();
        let entry = value_entry(&ctx, &fx, &fx, "../etc").await;
        assert!(entry.failure().unwrap().contains("Invalid input"));
    }

    #[tokio::test]
    async fn infer_growth_round_trips_fair_price() {
        let fx = fixture();
        let ctx = MarketContext::load(&fx, &config(Some(0.3)), day(59)).await.unwrap();
        let inference = infer_for_ticker(&ctx, &fx, &fx, "ko", Parameter::Growth, Some(0.25))
            .await
            .unwrap()
            .unwrap();
        let result = inference.result;
        assert_eq!(result.parameter, Parameter::Growth);
        let last = fx.series["KO"][59].adjusted_close;
        assert_eq!(result.observed_price, last);
        // P = D1 / (r - g)
        let implied = result.expected_dividend / (0.25 - result.value);
        assert!((implied - last).abs() / last < 1e-9);
        assert!(inference.regression.is_none());
    }

    #[tokio::test]
    async fn infer_growth_defaults_to_capm_return() {
        let fx = fixture();
        let ctx = MarketContext::load(&fx, &config(Some(0.3)), day(59)).await.unwrap();
        let inference = infer_for_ticker(&ctx, &fx, &fx, "KO", Parameter::Growth, None)
            .await
            .unwrap()
            .unwrap();
        match inference.result.known {
            KnownParameter::RequiredReturn(r) => assert!((r - 0.246).abs() < 1e-9),
            other => panic!("unexpected known parameter {:?}", other),
        }
        assert!(inference.regression.is_some());
    }

    #[tokio::test]
    async fn infer_required_return_defaults_to_history_growth() {
        let fx = fixture();
        let ctx = MarketContext::load(&fx, &config(Some(0.3)), day(59)).await.unwrap();
        let inference = infer_for_ticker(&ctx, &fx, &fx, "KO", Parameter::RequiredReturn, None)
            .await
            .unwrap()
            .unwrap();
        match inference.result.known {
            KnownParameter::Growth(g) => assert!((g - 0.84 / 0.76 + 1.0).abs() < 1e-12),
            other => panic!("unexpected known parameter {:?}", other),
        }
    }

    #[tokio::test]
    async fn infer_without_dividends_is_none() {
        let fx = fixture();
        let ctx = MarketContext::load(&fx, &config(Some(0.3)), day(59)).await.unwrap();
        let inference = infer_for_ticker(&ctx, &fx, &fx, "BRK.B", Parameter::Growth, Some(0.1))
            .await
            .unwrap();
        assert!(inference.is_none());
    }
}
