//! Correlation dimension (Grassberger–Procaccia) over sampled point pairs

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

use super::regression::least_squares;
use super::{normalize_to_unit, validate_scales};
use crate::errors::{FractalError, Result};
use crate::geometry::Point;

/// Default cap on sampled pairs
pub const DEFAULT_MAX_PAIRS: usize = 100_000;

/// Floor applied to `C(r)` before taking logs
const MIN_CORRELATION: f64 = 1e-12;

/// Result of a correlation-dimension fit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationEstimate {
    /// Strictly increasing radii
    pub radii: Vec<f64>,
    /// Fraction of sampled pairs closer than each radius
    pub correlation_sums: Vec<f64>,
    /// Fitted slope of `log C(r)` against `log r`
    pub estimated_slope: f64,
    pub intercept: f64,
}

impl CorrelationEstimate {
    pub fn log_radii(&self) -> Vec<f64> {
        self.radii.iter().map(|r| r.ln()).collect()
    }

    pub fn log_sums(&self) -> Vec<f64> {
        self.correlation_sums
            .iter()
            .map(|c| c.max(MIN_CORRELATION).ln())
            .collect()
    }
}

/// Estimate the correlation dimension after normalising to the unit square
///
/// Up to `max_pairs` index pairs are drawn with replacement; pairs of a point
/// with itself are dropped.
pub fn correlation_dimension(
    points: &[Point],
    radii: &[f64],
    max_pairs: usize,
    seed: u64,
) -> Result<CorrelationEstimate> {
    if points.len() < 2 {
        return Err(FractalError::InsufficientData(format!(
            "correlation dimension needs at least 2 points, got {}",
            points.len()
        )));
    }
    if radii.len() < 2 {
        return Err(FractalError::InsufficientData(format!(
            "need at least 2 radii, got {}",
            radii.len()
        )));
    }
    validate_scales("radii", radii, false)?;
    let unit = normalize_to_unit(points)?;

    let n = unit.len();
    let pairs = max_pairs.min(n * (n - 1) / 2).max(1);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut distances = Vec::with_capacity(pairs);
    for _ in 0..pairs {
        let i = rng.random_range(0..n);
        let j = rng.random_range(0..n);
        if i != j {
            distances.push(unit[i].distance(&unit[j]));
        }
    }
    if distances.is_empty() {
        return Err(FractalError::InsufficientData(
            "no distinct point pairs were sampled".to_string(),
        ));
    }
    debug!(requested = pairs, kept = distances.len(), "sampled point pairs");

    let total = distances.len() as f64;
    let correlation_sums: Vec<f64> = radii
        .iter()
        .map(|&r| distances.iter().filter(|&&d| d <= r).count() as f64 / total)
        .collect();

    let mut estimate = CorrelationEstimate {
        radii: radii.to_vec(),
        correlation_sums,
        estimated_slope: 0.0,
        intercept: 0.0,
    };
    let fit = least_squares(&estimate.log_radii(), &estimate.log_sums())?;
    estimate.estimated_slope = fit.slope;
    estimate.intercept = fit.intercept;

    info!(dimension = fit.slope, pairs = distances.len(), "estimated correlation dimension");
    Ok(estimate)
}

/// `count` radii growing by `sqrt(2)` from `smallest`
pub fn geometric_radii(smallest: f64, count: usize) -> Vec<f64> {
    (0..count)
        .map(|k| smallest * std::f64::consts::SQRT_2.powi(k as i32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cloud(n: usize, seed: u64, line: bool) -> Vec<Point> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                let x: f64 = rng.random();
                let y: f64 = if line { 0.5 * x } else { rng.random() };
                Point::new(x, y)
            })
            .collect()
    }

    #[test]
    fn test_square_cloud_is_near_two() {
        let est =
            correlation_dimension(&cloud(3_000, 5, false), &geometric_radii(0.01, 8), 50_000, 0)
                .unwrap();
        assert!(
            (est.estimated_slope - 2.0).abs() < 0.3,
            "slope = {}",
            est.estimated_slope
        );
    }

    #[test]
    fn test_line_cloud_is_near_one() {
        let est =
            correlation_dimension(&cloud(3_000, 5, true), &geometric_radii(0.01, 8), 50_000, 0)
                .unwrap();
        assert!(
            (est.estimated_slope - 1.0).abs() < 0.2,
            "slope = {}",
            est.estimated_slope
        );
    }

    #[test]
    fn test_sums_are_monotone_fractions() {
        let est =
            correlation_dimension(&cloud(500, 1, false), &geometric_radii(0.05, 6), 10_000, 2)
                .unwrap();
        assert!(est.correlation_sums.windows(2).all(|w| w[0] <= w[1]));
        assert!(est.correlation_sums.iter().all(|c| (0.0..=1.0).contains(c)));
    }

    #[test]
    fn test_needs_two_points() {
        assert!(matches!(
            correlation_dimension(&[Point::new(0.0, 0.0)], &[0.1, 0.2], 10, 0),
            Err(FractalError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_radii_must_increase() {
        assert!(matches!(
            correlation_dimension(&cloud(10, 0, false), &[0.2, 0.1], 10, 0),
            Err(FractalError::InvalidParameter { .. })
        ));
    }
}
