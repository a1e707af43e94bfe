//! Dividend history, trailing-year aggregates and growth.
//!
//! A history is ordered most recent first. The trailing year is the first
//! four records and the year before it the next four, selected by position,
//! so ordering is enforced when a history is built.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValuationError;

/// Records summed into one year of dividends (quarterly cadence).
pub const DIVIDENDS_PER_YEAR: usize = 4;

const DATE_FORMATS: &[&str] = &["%b %d, %Y", "%B %d, %Y", "%Y-%m-%d", "%m/%d/%Y"];

/// A single ex-dividend event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DividendRecord {
    pub ex_dividend_date: NaiveDate,
    pub amount: f64,
}

impl DividendRecord {
    pub fn new(ex_dividend_date: NaiveDate, amount: f64) -> Self {
        Self {
            ex_dividend_date,
            amount,
        }
    }

    /// Builds a record from display text such as `("Nov 10, 2023", "$0.24")`.
    pub fn parse(date: &str, amount: &str) -> Result<Self, ValuationError> {
        Ok(Self {
            ex_dividend_date: parse_date(date)?,
            amount: parse_amount(amount)?,
        })
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, ValuationError> {
    let text = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .ok_or_else(|| ValuationError::InvalidInput(format!("unrecognized date '{}'", raw)))
}

fn parse_amount(raw: &str) -> Result<f64, ValuationError> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(ValuationError::InvalidInput(format!(
            "malformed dividend amount '{}'",
            raw
        ))),
    }
}

/// Summary statistics over every amount in a history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DividendStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample variance; `None` with a single record.
    pub variance: Option<f64>,
    /// Sample standard deviation; `None` with a single record.
    pub std_dev: Option<f64>,
}

/// Trailing-year dividend and its growth over the prior year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DividendGrowth {
    pub yearly_dividend: f64,
    pub prior_yearly_dividend: f64,
    pub growth: f64,
}

/// A ticker's dividend records, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DividendHistory {
    records: Vec<DividendRecord>,
}

impl DividendHistory {
    /// Builds a history, re-sorting the records most recent first if needed.
    ///
    /// The sort is stable, so records sharing a date keep their input order.
    pub fn new(mut records: Vec<DividendRecord>) -> Self {
        let ordered = records
            .windows(2)
            .all(|w| w[0].ex_dividend_date >= w[1].ex_dividend_date);
        if !ordered {
            tracing::warn!(
                records = records.len(),
                "dividend history was not most-recent-first; re-sorting"
            );
            records.sort_by(|a, b| b.ex_dividend_date.cmp(&a.ex_dividend_date));
        }
        Self { records }
    }

    pub fn records(&self) -> &[DividendRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of the four most recent dividends (D0).
    pub fn yearly_dividend(&self) -> Result<f64, ValuationError> {
        self.year_sum(0, "yearly dividend")
    }

    /// Sum of the four dividends before the trailing year.
    pub fn prior_yearly_dividend(&self) -> Result<f64, ValuationError> {
        self.year_sum(1, "prior yearly dividend")
    }

    fn year_sum(&self, year: usize, operation: &'static str) -> Result<f64, ValuationError> {
        let start = year * DIVIDENDS_PER_YEAR;
        let end = start + DIVIDENDS_PER_YEAR;
        if self.records.len() < end {
            return Err(ValuationError::insufficient(
                operation,
                end,
                self.records.len(),
            ));
        }
        Ok(self.records[start..end].iter().map(|r| r.amount).sum())
    }

    /// Year-over-year growth: `yearly / prior_yearly - 1`.
    pub fn growth(&self) -> Result<DividendGrowth, ValuationError> {
        let required = 2 * DIVIDENDS_PER_YEAR;
        if self.records.len() < required {
            return Err(ValuationError::insufficient(
                "dividend growth",
                required,
                self.records.len(),
            ));
        }

        let yearly_dividend = self.yearly_dividend()?;
        let prior_yearly_dividend = self.prior_yearly_dividend()?;
        if prior_yearly_dividend == 0.0 {
            return Err(ValuationError::UndefinedValue(
                "prior-year dividend is zero, growth is undefined".to_string(),
            ));
        }

        let growth = yearly_dividend / prior_yearly_dividend - 1.0;
        tracing::debug!(
            yearly_dividend,
            prior_yearly_dividend,
            growth,
            "dividend growth computed"
        );
        Ok(DividendGrowth {
            yearly_dividend,
            prior_yearly_dividend,
            growth,
        })
    }

    /// Mean, median and sample dispersion over every recorded amount.
    pub fn stats(&self) -> Result<DividendStats, ValuationError> {
        let count = self.records.len();
        if count == 0 {
            return Err(ValuationError::insufficient("dividend statistics", 1, 0));
        }

        let mut amounts: Vec<f64> = self.records.iter().map(|r| r.amount).collect();
        let mean = amounts.iter().sum::<f64>() / count as f64;

        amounts.sort_by(|a, b| a.total_cmp(b));
        let mid = count / 2;
        let median = if count % 2 == 0 {
            (amounts[mid - 1] + amounts[mid]) / 2.0
        } else {
            amounts[mid]
        };

        let variance = (count > 1).then(|| {
            amounts.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / (count - 1) as f64
        });

        Ok(DividendStats {
            count,
            mean,
            median,
            variance,
            std_dev: variance.map(f64::sqrt),
        })
    }
}

impl From<Vec<DividendRecord>> for DividendHistory {
    fn from(records: Vec<DividendRecord>) -> Self {
        Self::new(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Quarterly history ending 2024-01-15, most recent first.
    fn history(amounts: &[f64]) -> DividendHistory {
        let mut date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let mut records = Vec::new();
        for amount in amounts {
            records.push(DividendRecord::new(date, *amount));
            date = date - chrono::Months::new(3);
        }
        DividendHistory::new(records)
    }

    fn scenario() -> DividendHistory {
        history(&[0.22, 0.22, 0.20, 0.20, 0.20, 0.20, 0.18, 0.18])
    }

    #[test]
    fn yearly_and_prior_sums() {
        let h = scenario();
        assert!((h.yearly_dividend().unwrap() - 0.84).abs() < 1e-12);
        assert!((h.prior_yearly_dividend().unwrap() - 0.76).abs() < 1e-12);
    }

    #[test]
    fn growth_year_over_year() {
        let g = scenario().growth().unwrap();
        assert!((g.growth - (0.84 / 0.76 - 1.0)).abs() < 1e-12);
        assert!((g.growth - 0.10526).abs() < 1e-5);
    }

    #[test]
    fn growth_ignores_records_beyond_two_years() {
        let g = history(&[0.22, 0.22, 0.20, 0.20, 0.20, 0.20, 0.18, 0.18, 9.0, 9.0])
            .growth()
            .unwrap();
        assert!((g.prior_yearly_dividend - 0.76).abs() < 1e-12);
    }

    #[test]
    fn growth_needs_eight_records() {
        let err = history(&[0.2; 7]).growth().unwrap_err();
        assert_eq!(
            err,
            ValuationError::InsufficientData {
                operation: "dividend growth",
                required: 8,
                actual: 7
            }
        );
    }

    #[test]
    fn yearly_dividend_needs_four_records() {
        assert!(history(&[0.2; 3]).yearly_dividend().is_err());
        assert!((history(&[0.25; 4]).yearly_dividend().unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_prior_year_is_undefined() {
        let err = history(&[0.1, 0.1, 0.1, 0.1, 0.0, 0.0, 0.0, 0.0])
            .growth()
            .unwrap_err();
        assert!(matches!(err, ValuationError::UndefinedValue(_)));
    }

    #[test]
    fn out_of_order_records_are_resorted() {
        let d = |m: u32| NaiveDate::from_ymd_opt(2023, m, 1).unwrap();
        let h = DividendHistory::new(vec![
            DividendRecord::new(d(2), 0.1),
            DividendRecord::new(d(11), 0.4),
            DividendRecord::new(d(5), 0.2),
            DividendRecord::new(d(8), 0.3),
        ]);
        let amounts: Vec<f64> = h.records().iter().map(|r| r.amount).collect();
        assert_eq!(amounts, vec![0.4, 0.3, 0.2, 0.1]);
    }

    #[test]
    fn stats_over_full_series() {
        let s = scenario().stats().unwrap();
        assert_eq!(s.count, 8);
        assert!((s.mean - 0.2).abs() < 1e-12);
        assert!((s.median - 0.2).abs() < 1e-12);
        // Sample variance: (2*0.02^2 + 2*0.02^2) / 7
        let expected_var = 4.0 * 0.0004 / 7.0;
        assert!((s.variance.unwrap() - expected_var).abs() < 1e-12);
        assert!((s.std_dev.unwrap() - expected_var.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn stats_single_record_has_no_dispersion() {
        let s = history(&[0.5]).stats().unwrap();
        assert_eq!(s.count, 1);
        assert_eq!(s.mean, 0.5);
        assert_eq!(s.median, 0.5);
        assert!(s.variance.is_none());
        assert!(s.std_dev.is_none());
    }

    #[test]
    fn stats_odd_count_median() {
        let s = history(&[0.3, 0.1, 0.2]).stats().unwrap();
        assert!((s.median - 0.2).abs() < 1e-12);
    }

    #[test]
    fn stats_empty_is_insufficient() {
        assert!(DividendHistory::default().stats().is_err());
    }

    #[test]
    fn parse_display_strings() {
        let r = DividendRecord::parse("Nov 10, 2023", "$0.24").unwrap();
        assert_eq!(r.ex_dividend_date, NaiveDate::from_ymd_opt(2023, 11, 10).unwrap());
        assert!((r.amount - 0.24).abs() < 1e-12);

        let r = DividendRecord::parse("2023-02-10", "1,250.50").unwrap();
        assert!((r.amount - 1250.5).abs() < 1e-9);

        let r = DividendRecord::parse("September 5, 2022", " $ 0.10 ").unwrap();
        assert_eq!(r.ex_dividend_date, NaiveDate::from_ymd_opt(2022, 9, 5).unwrap());
    }

    #[test]
    fn parse_rejects_malformed_fields() {
        assert!(matches!(
            DividendRecord::parse("Nov 10, 2023", ""),
            Err(ValuationError::InvalidInput(_))
        ));
        assert!(matches!(
            DividendRecord::parse("Nov 10, 2023", "$abc"),
            Err(ValuationError::InvalidInput(_))
        ));
        assert!(matches!(
            DividendRecord::parse("Nov 10, 2023", "-$0.10"),
            Err(ValuationError::InvalidInput(_))
        ));
        assert!(matches!(
            DividendRecord::parse("someday", "$0.10"),
            Err(ValuationError::InvalidInput(_))
        ));
    }
}
