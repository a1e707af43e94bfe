//! Library layer for GGM valuation: pure Gordon Growth / CAPM engine plus
//! the providers and pipeline that feed it.
//!
//! The engine modules (`series`, `regression`, `capm`, `dividends`,
//! `valuation`, `inverse`, `engine`) do no I/O. Market data arrives through
//! the traits in `provider`, implemented for Yahoo Finance prices and
//! Dividata dividend pages.

pub mod capm;
pub mod config;
pub mod dividata;
pub mod dividends;
pub mod engine;
pub mod error;
pub mod inverse;
pub mod pipeline;
pub mod provider;
pub mod regression;
pub mod series;
pub mod validation;
pub mod valuation;
pub mod yahoo;

pub use dividata_api;

pub use config::ValuationConfig;
pub use dividata::DividataSource;
pub use dividends::{DividendGrowth, DividendHistory, DividendRecord, DividendStats};
pub use engine::{estimate_fair_price, Valuation};
pub use error::{GgmError, ValuationError};
pub use inverse::{infer_parameter, InferredParameter, KnownParameter, Parameter};
pub use pipeline::{infer_for_ticker, value_entry, value_ticker, BatchEntry, Inference, MarketContext};
pub use provider::{DividendHistoryProvider, PriceSeriesProvider, RiskFreeRateProvider};
pub use regression::RegressionResult;
pub use series::PriceObservation;
pub use valuation::{FairPriceEstimate, ModelInputs};
pub use yahoo::{YahooClient, YahooError};
