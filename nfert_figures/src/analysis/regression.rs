//! Ordinary least squares for observed vs modelled yield.

use ndarray::{Array1, ArrayView1};
use thiserror::Error;

use crate::models::RegressionResult;

#[derive(Debug, Error, PartialEq)]
pub enum RegressionError {
    #[error("observed has {observed} values but modelled has {modelled}")]
    LengthMismatch { observed: usize, modelled: usize },
    #[error("need at least two points to fit a line, got {0}")]
    TooFewPoints(usize),
}

/// Fit `y = slope·x + intercept`.
///
/// R² follows the usual convention for a constant target: 1 when the fit is exact, 0 otherwise.
/// With a constant `x` the slope is 0 and the intercept is the mean of `y`.
/// MAE and RMSE are taken over the fit residuals.
pub fn fit_ols(x: &[f64], y: &[f64]) -> Result<RegressionResult, RegressionError> {
    if x.len() != y.len() {
        return Err(RegressionError::LengthMismatch { observed: x.len(), modelled: y.len() });
    }
    if x.len() < 2 {
        return Err(RegressionError::TooFewPoints(x.len()));
    }

    let n = x.len() as f64;
    let x = ArrayView1::from(x);
    let y = ArrayView1::from(y);
    let x_mean = x.sum() / n;
    let y_mean = y.sum() / n;

    let dx: Array1<f64> = x.mapv(|v| v - x_mean);
    let dy: Array1<f64> = y.mapv(|v| v - y_mean);
    let sxx = dx.dot(&dx);
    let sxy = dx.dot(&dy);

    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    let intercept = y_mean - slope * x_mean;

    let residuals: Array1<f64> = &y - &x.mapv(|v| slope * v + intercept);
    let ss_res = residuals.dot(&residuals);
    let ss_tot = dy.dot(&dy);
    let r2 = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    };

    let mae = residuals.mapv(f64::abs).sum() / n;
    let rmse = (ss_res / n).sqrt();

    Ok(RegressionResult { slope, intercept, r2, mae, rmse, n: x.len() })
}

/// `y = 0.87x - 123.45` style label with an explicit sign on the intercept.
pub fn format_equation(fit: &RegressionResult) -> String {
    let sign = if fit.intercept < 0.0 { '-' } else { '+' };
    format!("y = {:.2}x {} {:.2}", fit.slope, sign, fit.intercept.abs())
}
