//! CLI subcommand implementations.

pub mod infer;
pub mod stats;
pub mod value;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};

/// Parses `--end-date`, defaulting to today (UTC).
pub fn parse_end_date(raw: Option<&str>) -> Result<NaiveDate> {
    match raw {
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .with_context(|| format!("invalid --end-date '{}', expected YYYY-MM-DD", s)),
        None => Ok(Utc::now().date_naive()),
    }
}
