//! Price series alignment and log-return transform.
//!
//! Series are ascending by date. Missing or unusable prices (non-finite or
//! non-positive) leave a gap in the return series, which is filled
//! backward first and forward second so results are reproducible.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValuationError;

/// One trading day of a price series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub date: NaiveDate,
    pub adjusted_close: f64,
}

impl PriceObservation {
    pub fn new(date: NaiveDate, adjusted_close: f64) -> Self {
        Self {
            date,
            adjusted_close,
        }
    }

    fn usable_price(&self) -> Option<f64> {
        (self.adjusted_close.is_finite() && self.adjusted_close > 0.0).then_some(self.adjusted_close)
    }
}

/// Keeps only the dates present in both series, preserving the order of `left`.
///
/// When `right` repeats a date, its last observation for that date wins.
pub fn align_on_dates(
    left: &[PriceObservation],
    right: &[PriceObservation],
) -> (Vec<PriceObservation>, Vec<PriceObservation>) {
    let by_date: HashMap<NaiveDate, PriceObservation> =
        right.iter().map(|obs| (obs.date, *obs)).collect();

    left.iter()
        .filter_map(|obs| by_date.get(&obs.date).map(|other| (*obs, *other)))
        .unzip()
}

/// Computes gap-filled log-returns, one per observation.
///
/// `r[i] = ln(p[i]) - ln(p[i-1])`; `r[0]` and any return touching an
/// unusable price start out missing and are then filled by [`fill_gaps`].
pub fn log_returns(series: &[PriceObservation]) -> Result<Vec<f64>, ValuationError> {
    if series.len() < 2 {
        return Err(ValuationError::insufficient(
            "log-return transform",
            2,
            series.len(),
        ));
    }

    let mut raw = Vec::with_capacity(series.len());
    raw.push(None);
    for pair in series.windows(2) {
        let ret = match (pair[0].usable_price(), pair[1].usable_price()) {
            (Some(prev), Some(curr)) => Some(curr.ln() - prev.ln()),
            _ => None,
        };
        raw.push(ret);
    }

    fill_gaps(&raw).ok_or_else(|| {
        ValuationError::UndefinedValue("price series has no usable consecutive prices".to_string())
    })
}

/// Fills missing values: backward-fill from the next valid value, then
/// forward-fill whatever remains at the tail.
///
/// Returns `None` when there is no valid value at all.
pub fn fill_gaps(values: &[Option<f64>]) -> Option<Vec<f64>> {
    let mut filled: Vec<Option<f64>> = values.to_vec();

    let mut next_valid = None;
    for slot in filled.iter_mut().rev() {
        match slot {
            Some(v) => next_valid = Some(*v),
            None => *slot = next_valid,
        }
    }

    let mut last_valid = None;
    for slot in filled.iter_mut() {
        match slot {
            Some(v) => last_valid = Some(*v),
            None => *slot = last_valid,
        }
    }

    filled.into_iter().collect()
}

/// Latest usable value of a series, if any.
pub fn latest_value(series: &[PriceObservation]) -> Option<f64> {
    series.iter().rev().find_map(|obs| obs.usable_price())
}

/// Simple return over the whole series: `last / first - 1`.
///
/// Needs two usable prices; unusable observations do not count.
pub fn period_return(series: &[PriceObservation]) -> Result<f64, ValuationError> {
    let usable = series.iter().filter(|obs| obs.usable_price().is_some()).count();
    match (series.iter().find_map(|obs| obs.usable_price()), latest_value(series)) {
        (Some(first), Some(last)) if usable >= 2 => Ok(last / first - 1.0),
        _ => Err(ValuationError::insufficient("period return", 2, usable)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn series(prices: &[f64]) -> Vec<PriceObservation> {
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| PriceObservation::new(day(i as u32 + 1), *p))
            .collect()
    }

    #[test]
    fn log_returns_first_value_is_backfilled() {
        let returns = log_returns(&series(&[100.0, 110.0, 99.0])).unwrap();
        let r1 = (110.0f64).ln() - (100.0f64).ln();
        let r2 = (99.0f64).ln() - (110.0f64).ln();
        assert_eq!(returns.len(), 3);
        assert!((returns[0] - r1).abs() < 1e-12);
        assert!((returns[1] - r1).abs() < 1e-12);
        assert!((returns[2] - r2).abs() < 1e-12);
    }

    #[test]
    fn log_returns_needs_two_points() {
        let err = log_returns(&series(&[100.0])).unwrap_err();
        assert_eq!(
            err,
            ValuationError::InsufficientData {
                operation: "log-return transform",
                required: 2,
                actual: 1
            }
        );
        assert!(log_returns(&[]).is_err());
    }

    #[test]
    fn log_returns_all_unusable_is_undefined() {
        let err = log_returns(&series(&[f64::NAN, f64::NAN, 0.0])).unwrap_err();
        assert!(matches!(err, ValuationError::UndefinedValue(_)));
    }

    #[test]
    fn missing_price_gap_is_filled_backward_then_forward() {
        // Price 3 is missing: returns 2 and 3 are gaps.
        let returns = log_returns(&series(&[100.0, 101.0, f64::NAN, 103.0, 104.0])).unwrap();
        let r1 = (101.0f64).ln() - (100.0f64).ln();
        let r4 = (104.0f64).ln() - (103.0f64).ln();
        assert!((returns[1] - r1).abs() < 1e-12);
        assert!((returns[2] - r4).abs() < 1e-12);
        assert!((returns[3] - r4).abs() < 1e-12);
        assert!((returns[4] - r4).abs() < 1e-12);
    }

    #[test]
    fn trailing_gap_is_forward_filled() {
        let returns = log_returns(&series(&[100.0, 105.0, -1.0])).unwrap();
        let r1 = (105.0f64).ln() - (100.0f64).ln();
        assert!(returns.iter().all(|r| (r - r1).abs() < 1e-12));
    }

    #[test]
    fn fill_gaps_order_backward_first() {
        let filled = fill_gaps(&[None, Some(1.0), None, Some(3.0), None]).unwrap();
        assert_eq!(filled, vec![1.0, 1.0, 3.0, 3.0, 3.0]);
        assert_eq!(fill_gaps(&[None, None]), None);
        assert_eq!(fill_gaps(&[]), Some(vec![]));
    }

    #[test]
    fn align_keeps_common_dates_in_left_order() {
        let left = series(&[1.0, 2.0, 3.0, 4.0]);
        let right = vec![
            PriceObservation::new(day(4), 40.0),
            PriceObservation::new(day(2), 20.0),
            PriceObservation::new(day(9), 90.0),
        ];
        let (l, r) = align_on_dates(&left, &right);
        assert_eq!(l.iter().map(|o| o.date).collect::<Vec<_>>(), vec![day(2), day(4)]);
        assert_eq!(r.iter().map(|o| o.adjusted_close).collect::<Vec<_>>(), vec![20.0, 40.0]);
    }

    #[test]
    fn latest_value_skips_unusable_tail() {
        let s = series(&[4.1, 4.3, f64::NAN]);
        assert_eq!(latest_value(&s), Some(4.3));
        assert_eq!(latest_value(&[]), None);
    }

    #[test]
    fn period_return_last_over_first() {
        let r = period_return(&series(&[100.0, 90.0, 125.0])).unwrap();
        assert!((r - 0.25).abs() < 1e-12);
        assert!(period_return(&series(&[100.0])).is_err());
    }

    #[test]
    fn period_return_counts_only_usable_prices() {
        let err = period_return(&series(&[f64::NAN, 100.0])).unwrap_err();
        assert_eq!(err, ValuationError::insufficient("period return", 2, 1));
        let r = period_return(&series(&[f64::NAN, 80.0, 0.0, 100.0])).unwrap();
        assert!((r - 0.25).abs() < 1e-12);
    }
}
