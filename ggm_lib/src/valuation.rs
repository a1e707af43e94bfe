//! Gordon Growth Model forward valuation.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::ValuationError;

/// Inputs that fed a valuation, kept for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelInputs {
    pub yearly_dividend: f64,
    pub growth: f64,
    pub required_return: f64,
    pub risk_free_rate: f64,
    pub market_return: f64,
    pub last_price: f64,
}

/// A fair price, or its absence when the ticker pays no dividend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FairPriceEstimate {
    pub value: Option<f64>,
}

impl FairPriceEstimate {
    pub fn of(value: f64) -> Self {
        Self { value: Some(value) }
    }

    pub fn absent() -> Self {
        Self { value: None }
    }

    pub fn is_absent(&self) -> bool {
        self.value.is_none()
    }
}

/// Next expected dividend: `D1 = D0 * (1 + g)`.
pub fn expected_dividend(yearly_dividend: f64, growth: f64) -> f64 {
    yearly_dividend * (1.0 + growth)
}

/// Fair price `D1 / (r - g)`.
///
/// Fails unless `r > g` holds; a NaN on either side also fails, so the
/// result is always a finite-denominator price.
pub fn gordon_fair_price(
    required_return: f64,
    growth: f64,
    yearly_dividend: f64,
) -> Result<f64, ValuationError> {
    match required_return.partial_cmp(&growth) {
        Some(Ordering::Greater) => {
            Ok(expected_dividend(yearly_dividend, growth) / (required_return - growth))
        }
        _ => Err(ValuationError::UndefinedValuation {
            required_return,
            growth,
        }),
    }
}

/// Gordon valuation where growth may be absent (no dividend history).
pub fn value_with_optional_growth(
    required_return: f64,
    growth: Option<f64>,
    yearly_dividend: f64,
) -> Result<FairPriceEstimate, ValuationError> {
    match growth {
        Some(g) => gordon_fair_price(required_return, g, yearly_dividend).map(FairPriceEstimate::of),
        None => Ok(FairPriceEstimate::absent()),
    }
}
