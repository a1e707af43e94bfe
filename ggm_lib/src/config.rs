//! Runtime configuration for valuation runs.
//!
//! Layering: embedded defaults, then an optional TOML file, then `GGM_*`
//! environment variables.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GgmError;

const DEFAULTS_TOML: &str = include_str!("../data/defaults.toml");

pub const ENV_MARKET_SYMBOL: &str = "GGM_MARKET_SYMBOL";
pub const ENV_RISK_FREE_SYMBOL: &str = "GGM_RISK_FREE_SYMBOL";
pub const ENV_LOOKBACK_DAYS: &str = "GGM_LOOKBACK_DAYS";
pub const ENV_MARKET_RETURN: &str = "GGM_MARKET_RETURN";
pub const ENV_CONCURRENCY: &str = "GGM_CONCURRENCY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValuationConfig {
    /// Index whose returns are the regressor, `^GSPC` by default.
    pub market_symbol: String,
    /// Risk-free proxy quoted in percent, `^TNX` by default.
    pub risk_free_symbol: String,
    /// Calendar days of history ending at the valuation date.
    pub lookback_days: u32,
    /// Fixed expected market return; derived from the index series when unset.
    pub market_return: Option<f64>,
    /// Tickers valued at once in a batch.
    pub concurrency: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigOverlay {
    market_symbol: Option<String>,
    risk_free_symbol: Option<String>,
    lookback_days: Option<u32>,
    market_return: Option<f64>,
    concurrency: Option<usize>,
}

impl ValuationConfig {
    /// The embedded defaults.
    pub fn defaults() -> Result<Self, GgmError> {
        let config: Self = toml::from_str(DEFAULTS_TOML)
            .map_err(|e| GgmError::Config(format!("embedded defaults: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with the fields present in `text`.
    pub fn from_toml_str(text: &str) -> Result<Self, GgmError> {
        let mut config = Self::defaults()?;
        config.overlay_toml(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, then `path` if given, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, GgmError> {
        let mut config = Self::defaults()?;
        if let Some(path) = path {
            let text = std::fs::read_to_string(path).map_err(|e| {
                GgmError::Config(format!("cannot read {}: {}", path.display(), e))
            })?;
            config.overlay_toml(&text)?;
        }
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    fn overlay_toml(&mut self, text: &str) -> Result<(), GgmError> {
        let overlay: ConfigOverlay =
            toml::from_str(text).map_err(|e| GgmError::Config(e.to_string()))?;
        if let Some(symbol) = overlay.market_symbol {
            self.market_symbol = symbol;
        }
        if let Some(symbol) = overlay.risk_free_symbol {
            self.risk_free_symbol = symbol;
        }
        if let Some(days) = overlay.lookback_days {
            self.lookback_days = days;
        }
        if overlay.market_return.is_some() {
            self.market_return = overlay.market_return;
        }
        if let Some(n) = overlay.concurrency {
            self.concurrency = n;
        }
        Ok(())
    }

    /// Applies `GGM_*` variables resolved through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), GgmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(symbol) = lookup(ENV_MARKET_SYMBOL) {
            self.market_symbol = symbol.trim().to_string();
        }
        if let Some(symbol) = lookup(ENV_RISK_FREE_SYMBOL) {
            self.risk_free_symbol = symbol.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_LOOKBACK_DAYS) {
            self.lookback_days = parse_env(ENV_LOOKBACK_DAYS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MARKET_RETURN) {
            self.market_return = Some(parse_env(ENV_MARKET_RETURN, &raw)?);
        }
        if let Some(raw) = lookup(ENV_CONCURRENCY) {
            self.concurrency = parse_env(ENV_CONCURRENCY, &raw)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), GgmError> {
        if self.market_symbol.trim().is_empty() || self.risk_free_symbol.trim().is_empty() {
            return Err(GgmError::Config("symbols must not be empty".to_string()));
        }
        if self.lookback_days == 0 {
            return Err(GgmError::Config("lookback_days must be positive".to_string()));
        }
        if self.concurrency == 0 {
            return Err(GgmError::Config("concurrency must be positive".to_string()));
        }
        if let Some(m) = self.market_return {
            if !m.is_finite() {
                return Err(GgmError::Config(format!("market_return {} is not finite", m)));
            }
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, GgmError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| GgmError::Config(format!("{} has invalid value '{}'", key, raw)))
}
