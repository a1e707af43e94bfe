//! Yahoo Finance client wrapper for fetching daily price history.
//!
//! Provides YahooClient, which serves both the ticker/index price series and
//! the risk-free proxy series, caching each (symbol, window) download so a
//! batch fetches the shared index and risk-free series only once.

use chrono::NaiveDate;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use time::OffsetDateTime;

use crate::error::GgmError;
use crate::provider::{PriceSeriesProvider, RiskFreeRateProvider};
use crate::series::PriceObservation;

/// Default risk-free proxy: CBOE 10-year Treasury yield, quoted in percent.
pub const DEFAULT_RISK_FREE_SYMBOL: &str = "^TNX";

/// Errors from Yahoo Finance operations.
#[derive(Error, Debug)]
pub enum YahooError {
    #[error("Rate limited by Yahoo Finance (HTTP 429)")]
    RateLimited,
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Failed to parse response: {0}")]
    ParseFailed(String),
    #[error(transparent)]
    Upstream(#[from] yahoo_finance_api::YahooError),
}

/// Convert chrono::NaiveDate to time::OffsetDateTime at UTC midnight.
pub fn date_to_offset_datetime(date: NaiveDate) -> Result<OffsetDateTime, YahooError> {
    let datetime = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| YahooError::InvalidDate(date.to_string()))?;

    let timestamp = datetime.and_utc().timestamp();

    OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|_| YahooError::InvalidDate(date.to_string()))
}

/// Convert a unix timestamp in seconds to its UTC calendar date.
pub fn timestamp_to_date(timestamp: i64) -> Result<NaiveDate, YahooError> {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| YahooError::InvalidDate(format!("timestamp {}", timestamp)))
}

/// Convert time::OffsetDateTime to chrono::NaiveDate.
pub fn offset_datetime_to_date(dt: OffsetDateTime) -> Result<NaiveDate, YahooError> {
    timestamp_to_date(dt.unix_timestamp())
}

type SeriesKey = (String, NaiveDate, NaiveDate);

/// Yahoo Finance client with a per-window series cache.
pub struct YahooClient {
    connector: yahoo_finance_api::YahooConnector,
    cache: Arc<DashMap<SeriesKey, Vec<PriceObservation>>>,
    risk_free_symbol: String,
}

impl YahooClient {
    /// Create a new YahooClient with default configuration.
    pub fn new() -> Result<Self, YahooError> {
        Ok(Self {
            connector: yahoo_finance_api::YahooConnector::new()?,
            cache: Arc::new(DashMap::new()),
            risk_free_symbol: DEFAULT_RISK_FREE_SYMBOL.to_string(),
        })
    }

    /// Use `symbol` as the risk-free proxy instead of `^TNX`.
    pub fn with_risk_free_symbol(mut self, symbol: &str) -> Self {
        self.risk_free_symbol = symbol.to_string();
        self
    }

    pub fn risk_free_symbol(&self) -> &str {
        &self.risk_free_symbol
    }

    /// Get the number of cached entries (for testing).
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Fetch daily adjusted closes for `symbol` over `[start, end]`, ascending by date.
    pub async fn get_price_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceObservation>, YahooError> {
        let key = (symbol.to_string(), start, end);
        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!(symbol, "price history served from cache");
            return Ok(cached.clone());
        }

        if end < start {
            return Err(YahooError::InvalidDate(format!(
                "window end {} precedes start {}",
                end, start
            )));
        }

        // Yahoo treats the end bound as exclusive.
        let start_dt = date_to_offset_datetime(start)?;
        let end_dt = date_to_offset_datetime(end + chrono::Days::new(1))?;

        let response = self
            .connector
            .get_quote_history(symbol, start_dt, end_dt)
            .await
            .map_err(classify_upstream)?;
        let quotes = response.quotes().map_err(classify_upstream)?;

        let mut series = Vec::with_capacity(quotes.len());
        for quote in quotes {
            let timestamp = i64::try_from(quote.timestamp)
                .map_err(|_| YahooError::ParseFailed(format!("timestamp out of range for {}", symbol)))?;
            series.push(PriceObservation::new(
                timestamp_to_date(timestamp)?,
                quote.adjclose,
            ));
        }
        let series = normalize_series(series);

        tracing::debug!(symbol, observations = series.len(), "price history downloaded");
        self.cache.insert(key, series.clone());
        Ok(series)
    }
}

fn classify_upstream(err: yahoo_finance_api::YahooError) -> YahooError {
    if err.to_string().contains("429") {
        YahooError::RateLimited
    } else {
        YahooError::Upstream(err)
    }
}

/// Sorts ascending by date and keeps the last quote of any repeated day.
fn normalize_series(mut series: Vec<PriceObservation>) -> Vec<PriceObservation> {
    series.sort_by_key(|obs| obs.date);
    let mut out: Vec<PriceObservation> = Vec::with_capacity(series.len());
    for obs in series {
        match out.last_mut() {
            Some(last) if last.date == obs.date => *last = obs,
            _ => out.push(obs),
        }
    }
    out
}

impl PriceSeriesProvider for YahooClient {
    async fn price_series(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceObservation>, GgmError> {
        Ok(self.get_price_history(symbol, start, end).await?)
    }
}

impl RiskFreeRateProvider for YahooClient {
    async fn risk_free_series(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceObservation>, GgmError> {
        Ok(self
            .get_price_history(&self.risk_free_symbol, start, end)
            .await?)
    }
}
