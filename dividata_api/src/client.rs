//! HTTP client for Dividata dividend history pages.

use std::time::Duration;

use url::Url;

use crate::{parse::parse_dividend_table, types::DividendTable, user_agent::get_user_agent, Error};

/// HTTP client for Dividata stock dividend pages.
///
/// Sends requests with browser-like headers and a randomized user agent.
/// Each client holds a single `reqwest::Client` with a 30-second timeout.
pub struct Client {
    /// Base URL for the site. Defaults to `https://dividata.com`.
    base_url: String,
    http: reqwest::Client,
}

impl Client {
    /// Creates a new client pointing at the production Dividata site.
    pub fn new() -> Result<Self, Error> {
        Self::with_base_url("https://dividata.com")
    }

    /// Creates a new client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .user_agent(get_user_agent())
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed
            })?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn dividend_url(&self, ticker: &str) -> Result<Url, Error> {
        let symbol = ticker.trim().to_lowercase();
        if symbol.is_empty() || symbol.contains('/') {
            return Err(Error::InvalidTicker(ticker.to_string()));
        }
        Url::parse(&format!("{}/stock/{}/dividend", self.base_url, symbol)).map_err(|e| {
            tracing::error!("Invalid URL constructed: {}", e);
            Error::InvalidTicker(ticker.to_string())
        })
    }

    async fn get_html(&self, url: Url) -> Result<Option<String>, Error> {
        let resp = self
            .http
            .get(url)
            .header("accept", "text/html,application/xhtml+xml")
            .header("accept-language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to get resource: {}", e);
                Error::RequestFailed
            })?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            Error::RequestFailed
        })?;

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("Request failed with status {}: {}", status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        Ok(Some(body))
    }

    /// Fetches the dividend table for `ticker`.
    ///
    /// Returns `Ok(None)` when the ticker has never paid a dividend: either
    /// the page has no dividend table or the site answers 404.
    pub async fn get_dividend_table(&self, ticker: &str) -> Result<Option<DividendTable>, Error> {
        let url = self.dividend_url(ticker)?;
        tracing::debug!("Fetching dividend table from {}", url);
        match self.get_html(url).await? {
            Some(html) => parse_dividend_table(&html),
            None => Ok(None),
        }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...[truncated]", &body[..end])
}
