//! Raw dividend table types as scraped from Dividata.

use serde::{Deserialize, Serialize};

/// One row of the dividend table, exactly as displayed on the page.
///
/// Both columns are kept as text; converting them to a date and an amount
/// is left to the consumer so malformed cells can be reported per ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendRow {
    pub ex_dividend_date: String,
    pub amount: String,
}

/// The dividend history table for a ticker, in page order (most recent first).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendTable {
    pub rows: Vec<DividendRow>,
}

impl DividendTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
