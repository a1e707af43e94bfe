//! Data provider contracts consumed by the valuation pipeline.
//!
//! The engine itself never performs I/O; these traits are how the pipeline
//! obtains the series it hands to the engine. Returned futures are `Send`
//! so batches can be spread over tokio tasks.

use std::future::Future;

use chrono::NaiveDate;

use crate::dividends::DividendHistory;
use crate::error::GgmError;
use crate::series::PriceObservation;

/// Daily adjusted closes for a ticker or index, ascending by date.
pub trait PriceSeriesProvider {
    fn price_series(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = Result<Vec<PriceObservation>, GgmError>> + Send;
}

/// Daily quotes of a risk-free proxy, in percent, ascending by date.
pub trait RiskFreeRateProvider {
    fn risk_free_series(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = Result<Vec<PriceObservation>, GgmError>> + Send;
}

/// Dividend history of a ticker, most recent first.
///
/// `Ok(None)` means the ticker has never paid a dividend.
pub trait DividendHistoryProvider {
    fn dividend_history(
        &self,
        symbol: &str,
    ) -> impl Future<Output = Result<Option<DividendHistory>, GgmError>> + Send;
}
