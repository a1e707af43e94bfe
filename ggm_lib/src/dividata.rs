//! Dividend history source backed by the Dividata scraper.

use dividata_api::types::DividendTable;

use crate::dividends::{DividendHistory, DividendRecord};
use crate::error::{GgmError, ValuationError};
use crate::provider::DividendHistoryProvider;

/// Converts scraped rows into a history.
///
/// One unparseable row fails the whole table; a history with a silently
/// dropped quarter would shift every trailing-year window.
pub fn history_from_table(table: &DividendTable) -> Result<DividendHistory, ValuationError> {
    let records = table
        .rows
        .iter()
        .map(|row| DividendRecord::parse(&row.ex_dividend_date, &row.amount))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DividendHistory::new(records))
}

/// [`DividendHistoryProvider`] over `dividata_api::Client`.
pub struct DividataSource {
    client: dividata_api::Client,
}

impl DividataSource {
    pub fn new() -> Result<Self, GgmError> {
        Ok(Self {
            client: dividata_api::Client::new()?,
        })
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, GgmError> {
        Ok(Self {
            client: dividata_api::Client::with_base_url(base_url)?,
        })
    }
}

impl DividendHistoryProvider for DividataSource {
    async fn dividend_history(&self, symbol: &str) -> Result<Option<DividendHistory>, GgmError> {
        let table = match self.client.get_dividend_table(symbol).await? {
            Some(table) if !table.is_empty() => table,
            _ => {
                tracing::debug!(symbol, "no dividend history");
                return Ok(None);
            }
        };
        let history = history_from_table(&table)?;
        tracing::debug!(symbol, records = history.len(), "dividend history loaded");
        Ok(Some(history))
    }
}
