//! Error types for the Dividata client.

/// Errors that can occur when fetching or parsing a dividend page.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An HTTP request failed (network error, timeout, or unreadable body).
    #[error("Request failed")]
    RequestFailed,
    /// The site returned a non-success status with a body snippet.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// The ticker cannot be placed into a URL path.
    #[error("Invalid ticker: {0}")]
    InvalidTicker(String),
    /// The HTML could not be parsed into a dividend table.
    #[error("Parse error: {0}")]
    Parse(String),
}
