//! Box-counting (Minkowski) dimension

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::regression::least_squares;
use super::{bounds_of, validate_scales};
use crate::errors::{FractalError, Result};
use crate::geometry::{BoundingBox, Point};

/// Fits with a worse correlation than this are logged as suspicious
const POOR_FIT_R: f64 = 0.95;

/// Finest dyadic level accepted for generated box sizes
pub const MAX_BOX_LEVEL: u32 = 64;

/// Result of a box-counting fit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionEstimate {
    /// Strictly decreasing box sizes
    pub box_sizes: Vec<f64>,
    /// Occupied cells, one per box size
    pub counts: Vec<usize>,
    /// Fitted slope of `log N` against `log(1/δ)`: the dimension estimate
    pub estimated_slope: f64,
    pub intercept: f64,
    pub r_value: f64,
}

impl DimensionEstimate {
    /// `log(1/δ)` for every box size
    pub fn log_inverse_sizes(&self) -> Vec<f64> {
        self.box_sizes.iter().map(|d| (1.0 / d).ln()).collect()
    }

    /// `log N(δ)` for every box size
    pub fn log_counts(&self) -> Vec<f64> {
        self.counts.iter().map(|&c| (c as f64).ln()).collect()
    }
}

/// `extent · 2^-k` for `k` in `min_level..=max_level`
pub fn dyadic_box_sizes(extent: f64, min_level: u32, max_level: u32) -> Result<Vec<f64>> {
    if !(extent.is_finite() && extent > 0.0) {
        return Err(FractalError::DegenerateInput(format!(
            "box sizes need a positive extent, got {extent}"
        )));
    }
    if min_level > max_level {
        return Err(FractalError::invalid(
            "levels",
            format!("min level {min_level} exceeds max level {max_level}"),
        ));
    }
    if max_level > MAX_BOX_LEVEL {
        return Err(FractalError::invalid(
            "levels",
            format!("max level must be <= {MAX_BOX_LEVEL}, got {max_level}"),
        ));
    }
    Ok((min_level..=max_level)
        .map(|k| extent * 0.5_f64.powi(k as i32))
        .collect())
}

/// Number of grid cells of side `delta` anchored at the box's lower corner
/// holding at least one point
///
/// Points on the far edge of `bounds` fall into the last cell.
pub fn box_count(points: &[Point], bounds: &BoundingBox, delta: f64) -> usize {
    let cells_x = ((bounds.width() / delta).ceil() as i64).max(1);
    let cells_y = ((bounds.height() / delta).ceil() as i64).max(1);

    let occupied: HashSet<(i64, i64)> = points
        .iter()
        .map(|p| {
            let ix = (((p.x - bounds.min_x) / delta).floor() as i64).clamp(0, cells_x - 1);
            let iy = (((p.y - bounds.min_y) / delta).floor() as i64).clamp(0, cells_y - 1);
            (ix, iy)
        })
        .collect();
    occupied.len()
}

/// Estimate the box-counting dimension over the given box sizes
pub fn estimate_box_dimension(points: &[Point], box_sizes: &[f64]) -> Result<DimensionEstimate> {
    let bounds = bounds_of(points)?;
    if box_sizes.len() < 2 {
        return Err(FractalError::InsufficientData(format!(
            "need at least 2 box sizes, got {}",
            box_sizes.len()
        )));
    }
    validate_scales("box_sizes", box_sizes, true)?;

    let counts: Vec<usize> = box_sizes
        .iter()
        .map(|&delta| {
            let n = box_count(points, &bounds, delta);
            debug!(delta, count = n, "counted boxes");
            n
        })
        .collect();

    let mut estimate = DimensionEstimate {
        box_sizes: box_sizes.to_vec(),
        counts,
        estimated_slope: 0.0,
        intercept: 0.0,
        r_value: 0.0,
    };
    let fit = least_squares(&estimate.log_inverse_sizes(), &estimate.log_counts())?;
    estimate.estimated_slope = fit.slope;
    estimate.intercept = fit.intercept;
    estimate.r_value = fit.r_value;

    if fit.r_value < POOR_FIT_R {
        warn!(r = fit.r_value, "box-counting fit is poor, check the box size range");
    }
    info!(
        dimension = fit.slope,
        r = fit.r_value,
        sizes = box_sizes.len(),
        "estimated box-counting dimension"
    );
    Ok(estimate)
}

/// Dyadic sizes from the point set's own extent, then [`estimate_box_dimension`]
pub fn estimate_with_dyadic_sizes(
    points: &[Point],
    min_level: u32,
    max_level: u32,
) -> Result<DimensionEstimate> {
    let bounds = bounds_of(points)?;
    let sizes = dyadic_box_sizes(bounds.extent(), min_level, max_level)?;
    estimate_box_dimension(points, &sizes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn segment(n: usize) -> Vec<Point> {
        (0..n)
            .map(|i| {
                let t = i as f64 / (n - 1) as f64;
                Point::new(t, 0.3 * t)
            })
            .collect()
    }

    fn lattice(side: usize) -> Vec<Point> {
        let step = 1.0 / (side - 1) as f64;
        (0..side)
            .flat_map(|i| (0..side).map(move |j| Point::new(i as f64 * step, j as f64 * step)))
            .collect()
    }

    #[test]
    fn test_dyadic_sizes_halve() {
        let sizes = dyadic_box_sizes(2.0, 1, 4).unwrap();
        assert_eq!(sizes, vec![1.0, 0.5, 0.25, 0.125]);
    }

    #[test]
    fn test_dyadic_sizes_bad_levels() {
        assert!(matches!(
            dyadic_box_sizes(1.0, 5, 2),
            Err(FractalError::InvalidParameter { .. })
        ));
        assert!(matches!(
            dyadic_box_sizes(1.0, 0, MAX_BOX_LEVEL + 1),
            Err(FractalError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_box_count_on_lattice() {
        let pts = lattice(256);
        let bounds = BoundingBox::of(&pts).unwrap();
        assert_eq!(box_count(&pts, &bounds, 1.0), 1);
        assert_eq!(box_count(&pts, &bounds, 0.5), 4);
        assert_eq!(box_count(&pts, &bounds, 0.25), 16);
    }

    #[test]
    fn test_line_segment_is_one_dimensional() {
        let sizes: Vec<f64> = (1..=7).map(|k| 0.5_f64.powi(k)).collect();
        let est = estimate_box_dimension(&segment(10_000), &sizes).unwrap();
        assert!(
            (est.estimated_slope - 1.0).abs() < 0.2,
            "slope = {}",
            est.estimated_slope
        );
        assert_eq!(est.counts.len(), sizes.len());
    }

    #[test]
    fn test_filled_square_is_two_dimensional() {
        let sizes: Vec<f64> = (1..=6).map(|k| 0.5_f64.powi(k)).collect();
        let est = estimate_box_dimension(&lattice(256), &sizes).unwrap();
        assert!(
            (est.estimated_slope - 2.0).abs() < 0.2,
            "slope = {}",
            est.estimated_slope
        );
        assert!(est.r_value > 0.99);
    }

    #[test]
    fn test_counts_never_decrease_as_boxes_shrink() {
        let est = estimate_with_dyadic_sizes(&segment(2_000), 0, 8).unwrap();
        assert!(est.counts.windows(2).all(|w| w[0] <= w[1]));
        assert!(est.counts.iter().all(|&c| c >= 1));
    }

    #[test]
    fn test_single_box_size_is_insufficient() {
        assert!(matches!(
            estimate_box_dimension(&segment(10), &[0.5]),
            Err(FractalError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_empty_points_are_insufficient() {
        assert!(matches!(
            estimate_box_dimension(&[], &[0.5, 0.25]),
            Err(FractalError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_identical_points_are_degenerate() {
        let pts = vec![Point::new(0.3, 0.3); 50];
        assert!(matches!(
            estimate_box_dimension(&pts, &[0.5, 0.25]),
            Err(FractalError::DegenerateInput(_))
        ));
    }

    #[rstest]
    #[case(vec![0.25, 0.5])]
    #[case(vec![0.5, 0.5])]
    #[case(vec![0.5, 0.0])]
    #[case(vec![0.5, -0.25])]
    #[case(vec![f64::NAN, 0.25])]
    fn test_box_sizes_must_be_positive_and_decreasing(#[case] sizes: Vec<f64>) {
        assert!(matches!(
            estimate_box_dimension(&segment(100), &sizes),
            Err(FractalError::InvalidParameter { .. })
        ));
    }
}
