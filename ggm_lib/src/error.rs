//! Error types for the valuation engine and the library layer.

use thiserror::Error;

use crate::yahoo::YahooError;

/// Failures of the pure valuation engine.
///
/// Every variant is scoped to a single ticker: a batch that hits one of
/// these for a ticker records it against that ticker and carries on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValuationError {
    /// A series is shorter than the operation needs.
    #[error("Insufficient data: {operation} needs at least {required} observations, got {actual}")]
    InsufficientData {
        operation: &'static str,
        required: usize,
        actual: usize,
    },
    /// Required return does not exceed growth, so the Gordon model has no finite positive value.
    #[error("Undefined valuation: required return {required_return} does not exceed growth {growth}")]
    UndefinedValuation { required_return: f64, growth: f64 },
    /// A divisor that must be non-zero is zero.
    #[error("Division by zero: {0} is zero")]
    DivisionByZero(&'static str),
    /// An intermediate quantity has no defined value for the given data.
    #[error("Undefined value: {0}")]
    UndefinedValue(String),
    /// An input field could not be converted or is inconsistent.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ValuationError {
    pub(crate) fn insufficient(operation: &'static str, required: usize, actual: usize) -> Self {
        Self::InsufficientData {
            operation,
            required,
            actual,
        }
    }
}

/// Errors produced by the library layer, wrapping the engine's errors
/// together with provider and configuration failures.
#[derive(Error, Debug)]
pub enum GgmError {
    #[error(transparent)]
    Valuation(#[from] ValuationError),
    #[error("Price provider error: {0}")]
    Prices(#[from] YahooError),
    #[error("Dividend provider error: {0}")]
    Dividends(#[from] dividata_api::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Background task failed: {0}")]
    Task(String),
}

impl GgmError {
    /// Returns the engine error, if this failure came from the valuation itself.
    pub fn as_valuation(&self) -> Option<&ValuationError> {
        match self {
            Self::Valuation(e) => Some(e),
            _ => None,
        }
    }
}
