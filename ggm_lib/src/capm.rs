//! Capital Asset Pricing Model.

/// Required return on equity: `rf + beta * (market_return - rf)`.
///
/// Non-finite inputs are not masked: a NaN or infinite argument yields a
/// NaN or infinite result, which the Gordon valuation then rejects.
pub fn required_return(risk_free_rate: f64, beta: f64, market_return: f64) -> f64 {
    risk_free_rate + beta * (market_return - risk_free_rate)
}

/// Converts a yield quoted in percent (e.g. `^TNX` at 4.25) to a fraction.
pub fn percent_to_rate(quoted: f64) -> f64 {
    quoted / 100.0
}
