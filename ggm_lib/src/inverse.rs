//! Backing out growth or required return from an observed market price.
//!
//! Rearranges `P = D1 / (r - g)` for the unknown side. D1 is computed once
//! from the growth that is known going in (the dividend-history estimate
//! when solving for growth) and held fixed; the solver does not re-solve D1
//! jointly with the unknown.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dividends::DividendHistory;
use crate::error::ValuationError;
use crate::valuation::expected_dividend;

/// Which side of the Gordon identity is being solved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    Growth,
    RequiredReturn,
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Growth => write!(f, "growth"),
            Self::RequiredReturn => write!(f, "required return"),
        }
    }
}

/// The parameter supplied by the caller, with its value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "parameter", content = "value")]
pub enum KnownParameter {
    RequiredReturn(f64),
    Growth(f64),
}

impl KnownParameter {
    /// The parameter left to solve for.
    pub fn unknown(&self) -> Parameter {
        match self {
            Self::RequiredReturn(_) => Parameter::Growth,
            Self::Growth(_) => Parameter::RequiredReturn,
        }
    }
}

/// Result of an inversion, with the quantities it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InferredParameter {
    pub parameter: Parameter,
    pub value: f64,
    pub known: KnownParameter,
    pub observed_price: f64,
    pub expected_dividend: f64,
}

fn check_price(observed_price: f64) -> Result<(), ValuationError> {
    if observed_price == 0.0 {
        return Err(ValuationError::DivisionByZero("observed price"));
    }
    if !observed_price.is_finite() {
        return Err(ValuationError::InvalidInput(format!(
            "observed price {} is not finite",
            observed_price
        )));
    }
    Ok(())
}

/// `g = r - D1 / P`.
pub fn implied_growth(
    observed_price: f64,
    required_return: f64,
    expected_dividend: f64,
) -> Result<f64, ValuationError> {
    check_price(observed_price)?;
    Ok(required_return - expected_dividend / observed_price)
}

/// `r = D1 / P + g`.
pub fn implied_required_return(
    observed_price: f64,
    growth: f64,
    expected_dividend: f64,
) -> Result<f64, ValuationError> {
    check_price(observed_price)?;
    Ok(expected_dividend / observed_price + growth)
}

/// Solves for the parameter not supplied in `known`.
///
/// With a known required return, D1 uses the growth estimated from the
/// dividend history (eight records needed). With a known growth, D1 uses
/// that growth and only the trailing year (four records) is needed.
pub fn infer_parameter(
    known: KnownParameter,
    observed_price: f64,
    dividends: &DividendHistory,
) -> Result<InferredParameter, ValuationError> {
    check_price(observed_price)?;

    let (value, d1) = match known {
        KnownParameter::RequiredReturn(required_return) => {
            let estimate = dividends.growth()?;
            let d1 = expected_dividend(estimate.yearly_dividend, estimate.growth);
            (implied_growth(observed_price, required_return, d1)?, d1)
        }
        KnownParameter::Growth(growth) => {
            let d1 = expected_dividend(dividends.yearly_dividend()?, growth);
            (implied_required_return(observed_price, growth, d1)?, d1)
        }
    };

    let parameter = known.unknown();
    tracing::info!(
        parameter = %parameter,
        value,
        observed_price,
        expected_dividend = d1,
        "parameter inferred from market price"
    );

    Ok(InferredParameter {
        parameter,
        value,
        known,
        observed_price,
        expected_dividend: d1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dividends::DividendRecord;
    use chrono::NaiveDate;

    fn history(amounts: &[f64]) -> DividendHistory {
        let records = amounts
            .iter()
            .enumerate()
            .map(|(i, a)| {
                let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    - chrono::Days::new(91 * i as u64);
                DividendRecord::new(date, *a)
            })
            .collect();
        DividendHistory::new(records)
    }

    #[test]
    fn implied_growth_formula() {
        let g = implied_growth(20.0, 0.10, 1.0).unwrap();
        assert!((g - 0.05).abs() < 1e-12);
    }

    #[test]
    fn implied_required_return_formula() {
        let r = implied_required_return(20.0, 0.05, 1.0).unwrap();
        assert!((r - 0.10).abs() < 1e-12);
    }

    #[test]
    fn zero_price_is_division_by_zero() {
        assert_eq!(
            implied_growth(0.0, 0.1, 1.0),
            Err(ValuationError::DivisionByZero("observed price"))
        );
        assert_eq!(
            implied_required_return(0.0, 0.1, 1.0),
            Err(ValuationError::DivisionByZero("observed price"))
        );
        let h = history(&[0.25; 8]);
        assert_eq!(
            infer_parameter(KnownParameter::Growth(0.02), 0.0, &h),
            Err(ValuationError::DivisionByZero("observed price"))
        );
    }

    #[test]
    fn non_finite_price_rejected() {
        assert!(matches!(
            implied_growth(f64::INFINITY, 0.1, 1.0),
            Err(ValuationError::InvalidInput(_))
        ));
    }

    #[test]
    fn infer_growth_uses_history_growth_for_d1() {
        let h = history(&[0.22, 0.22, 0.20, 0.20, 0.20, 0.20, 0.18, 0.18]);
        let result = infer_parameter(KnownParameter::RequiredReturn(0.3267), 4.196, &h).unwrap();
        let g_est = 0.84 / 0.76 - 1.0;
        let d1 = 0.84 * (1.0 + g_est);
        assert_eq!(result.parameter, Parameter::Growth);
        assert!((result.expected_dividend - d1).abs() < 1e-12);
        assert!((result.value - (0.3267 - d1 / 4.196)).abs() < 1e-12);
    }

    #[test]
    fn infer_required_return_uses_known_growth() {
        let h = history(&[0.25; 4]);
        let result = infer_parameter(KnownParameter::Growth(0.04), 26.0, &h).unwrap();
        assert_eq!(result.parameter, Parameter::RequiredReturn);
        assert!((result.expected_dividend - 1.04).abs() < 1e-12);
        assert!((result.value - 0.08).abs() < 1e-12);
    }

    #[test]
    fn infer_growth_needs_full_two_years() {
        let h = history(&[0.25; 5]);
        assert!(matches!(
            infer_parameter(KnownParameter::RequiredReturn(0.1), 20.0, &h),
            Err(ValuationError::InsufficientData { .. })
        ));
    }

    #[test]
    fn unknown_side() {
        assert_eq!(KnownParameter::Growth(0.1).unknown(), Parameter::RequiredReturn);
        assert_eq!(KnownParameter::RequiredReturn(0.1).unknown(), Parameter::Growth);
    }

    #[test]
    fn known_parameter_serializes_tagged() {
        let json = serde_json::to_value(KnownParameter::Growth(0.05)).unwrap();
        assert_eq!(json["parameter"], "growth");
        assert_eq!(json["value"], 0.05);
    }
}
