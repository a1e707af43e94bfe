//! Validation of user-supplied ticker symbols.

use crate::error::ValuationError;

pub const MAX_TICKER_LENGTH: usize = 12;

/// Validate a ticker symbol: trim, uppercase, allow `A-Z 0-9 . - ^ =`.
///
/// Index (`^GSPC`), share-class (`BRK.B`) and futures-style (`CL=F`) symbols pass.
pub fn validate_ticker(input: &str) -> Result<String, ValuationError> {
    let ticker = input.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(ValuationError::InvalidInput(
            "ticker must not be empty".to_string(),
        ));
    }
    if ticker.chars().count() > MAX_TICKER_LENGTH {
        return Err(ValuationError::InvalidInput(format!(
            "ticker '{}' exceeds {} characters",
            input.trim(),
            MAX_TICKER_LENGTH
        )));
    }
    if let Some(bad) = ticker
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=')))
    {
        return Err(ValuationError::InvalidInput(format!(
            "ticker '{}' contains invalid character '{}'",
            input.trim(),
            bad
        )));
    }
    Ok(ticker)
}
