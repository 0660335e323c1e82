//! # Fractal measures
//!
//! - [`estimate_box_dimension`]: box-counting slope of `log N(δ)` vs `log(1/δ)`
//! - [`correlation_dimension`]: Grassberger–Procaccia slope of `log C(r)` vs `log r`
//! - [`lacunarity`]: fixed-grid mass spread per scale
//!
//! Every estimator rejects empty input with `InsufficientData` and point sets
//! without spatial extent with `DegenerateInput`.

mod box_counting;
mod correlation;
mod lacunarity;
mod regression;

pub use box_counting::{
    box_count, dyadic_box_sizes, estimate_box_dimension, estimate_with_dyadic_sizes,
    DimensionEstimate, MAX_BOX_LEVEL,
};
pub use correlation::{
    correlation_dimension, geometric_radii, CorrelationEstimate, DEFAULT_MAX_PAIRS,
};
pub use lacunarity::{lacunarity, LacunarityProfile};
pub use regression::{least_squares, LinearFit};

use crate::errors::{FractalError, Result};
use crate::geometry::{BoundingBox, Point};

/// Bounding box of a non-empty, finite point set with positive extent
pub(crate) fn bounds_of(points: &[Point]) -> Result<BoundingBox> {
    if points.iter().any(|p| !p.is_finite()) {
        return Err(FractalError::invalid("points", "coordinates must be finite"));
    }
    let bounds = BoundingBox::of(points)
        .ok_or_else(|| FractalError::InsufficientData("point set is empty".to_string()))?;
    if bounds.extent() <= 0.0 {
        return Err(FractalError::DegenerateInput(format!(
            "all {} points coincide",
            points.len()
        )));
    }
    Ok(bounds)
}

/// Scale each axis independently onto `[0, 1]`
///
/// An axis with no spread collapses to 0.
pub(crate) fn normalize_to_unit(points: &[Point]) -> Result<Vec<Point>> {
    let bounds = bounds_of(points)?;
    let span_x = bounds.width().max(1e-12);
    let span_y = bounds.height().max(1e-12);
    Ok(points
        .iter()
        .map(|p| Point::new((p.x - bounds.min_x) / span_x, (p.y - bounds.min_y) / span_y))
        .collect())
}

/// Check that scales are finite, positive and strictly monotone
pub(crate) fn validate_scales(field: &str, values: &[f64], decreasing: bool) -> Result<()> {
    if let Some(bad) = values
        .iter()
        .find(|v| !(v.is_finite() && **v > 0.0 && (1.0 / **v).is_finite()))
    {
        return Err(FractalError::invalid(
            field,
            format!("must be finite and > 0 with a finite inverse, got {bad}"),
        ));
    }
    let ordered = values.windows(2).all(|w| {
        if decreasing {
            w[0] > w[1]
        } else {
            w[0] < w[1]
        }
    });
    if !ordered {
        let order = if decreasing { "decreasing" } else { "increasing" };
        return Err(FractalError::invalid(
            field,
            format!("must be strictly {order}"),
        ));
    }
    Ok(())
}
