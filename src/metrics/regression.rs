//! Ordinary least squares on a single predictor

use serde::Serialize;

use crate::errors::{FractalError, Result};

/// `y ≈ slope·x + intercept`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Correlation coefficient `sqrt(1 - SS_res/SS_tot)`; 1.0 when `y` is constant
    pub r_value: f64,
}

/// Fit a straight line through `(xs[i], ys[i])`
pub fn least_squares(xs: &[f64], ys: &[f64]) -> Result<LinearFit> {
    if xs.len() != ys.len() {
        return Err(FractalError::invalid(
            "samples",
            format!("x and y lengths differ ({} vs {})", xs.len(), ys.len()),
        ));
    }
    if xs.len() < 2 {
        return Err(FractalError::InsufficientData(format!(
            "a line fit needs at least 2 samples, got {}",
            xs.len()
        )));
    }

    let n = xs.len() as f64;
    let x_mean = xs.iter().sum::<f64>() / n;
    let y_mean = ys.iter().sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        sxx += (x - x_mean) * (x - x_mean);
        sxy += (x - x_mean) * (y - y_mean);
    }
    if sxx <= f64::EPSILON * n {
        return Err(FractalError::InsufficientData(
            "all x samples are equal, slope is undefined".to_string(),
        ));
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let r = y - (slope * x + intercept);
        ss_res += r * r;
        ss_tot += (y - y_mean) * (y - y_mean);
    }
    let r_value = if ss_tot > 0.0 {
        (1.0 - ss_res / ss_tot).max(0.0).sqrt()
    } else {
        1.0
    };

    Ok(LinearFit {
        slope,
        intercept,
        r_value,
    })
}
