//! OLS estimation of beta from stock and market log-returns.
//!
//! The sample is split chronologically: the last [`TEST_WINDOW`] observations
//! are held out and the model is fitted on everything before them.

use serde::{Deserialize, Serialize};

use crate::error::ValuationError;

/// Number of trailing observations held out for R² and MSE.
pub const TEST_WINDOW: usize = 20;

/// Outcome of a single regression fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    /// Slope of stock returns on market returns.
    pub beta: f64,
    /// Fitted intercept. Diagnostic only.
    pub alpha: f64,
    /// Coefficient of determination on the held-out window.
    pub r_squared: f64,
    /// Mean squared prediction error on the held-out window.
    pub mean_squared_error: f64,
    pub train_size: usize,
    pub test_size: usize,
}

/// Fits `stock ≈ alpha + beta * market` and scores it on the held-out tail.
pub fn estimate_beta(
    stock_returns: &[f64],
    market_returns: &[f64],
) -> Result<RegressionResult, ValuationError> {
    if stock_returns.len() != market_returns.len() {
        return Err(ValuationError::InvalidInput(format!(
            "stock and market return series differ in length ({} vs {})",
            stock_returns.len(),
            market_returns.len()
        )));
    }

    let n = stock_returns.len();
    if n <= TEST_WINDOW {
        return Err(ValuationError::insufficient(
            "beta regression",
            TEST_WINDOW + 1,
            n,
        ));
    }

    let split = n - TEST_WINDOW;
    let (x_train, x_test) = market_returns.split_at(split);
    let (y_train, y_test) = stock_returns.split_at(split);

    let (alpha, beta) = fit_ols(x_train, y_train)?;

    let predictions: Vec<f64> = x_test.iter().map(|x| alpha + beta * x).collect();
    let r_squared = r2_score(y_test, &predictions);
    let mean_squared_error = mse(y_test, &predictions);

    tracing::debug!(
        beta,
        alpha,
        r_squared,
        mean_squared_error,
        train_size = split,
        "regression fitted"
    );

    Ok(RegressionResult {
        beta,
        alpha,
        r_squared,
        mean_squared_error,
        train_size: split,
        test_size: TEST_WINDOW,
    })
}

/// Closed-form single-regressor OLS with intercept. Returns `(alpha, beta)`.
///
/// A constant regressor is rejected before any arithmetic: rounding in the
/// mean leaves `sxx` a tiny positive number instead of zero.
fn fit_ols(x: &[f64], y: &[f64]) -> Result<(f64, f64), ValuationError> {
    if x.iter().all(|v| *v == x[0]) {
        return Err(ValuationError::UndefinedValue(
            "market returns have no variance in the training window".to_string(),
        ));
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        sxy += dx * (yi - mean_y);
        sxx += dx * dx;
    }

    if sxx == 0.0 || !sxx.is_finite() {
        return Err(ValuationError::UndefinedValue(
            "market returns have no variance in the training window".to_string(),
        ));
    }

    let beta = sxy / sxx;
    Ok((mean_y - beta * mean_x, beta))
}

/// R² of predictions against observations.
///
/// A constant target scores 1.0 when predicted exactly and 0.0 otherwise.
fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

fn mse(actual: &[f64], predicted: &[f64]) -> f64 {
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    sum / actual.len() as f64
}
