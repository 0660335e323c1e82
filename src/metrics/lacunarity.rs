//! Box-mass lacunarity `Λ(δ) = var/μ² + 1` on the unit square

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use super::{normalize_to_unit, validate_scales};
use crate::errors::{FractalError, Result};
use crate::geometry::Point;

/// Lacunarity per box size
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LacunarityProfile {
    /// Strictly decreasing box sizes
    pub box_sizes: Vec<f64>,
    pub lacunarity: Vec<f64>,
}

impl LacunarityProfile {
    pub fn log_inverse_sizes(&self) -> Vec<f64> {
        self.box_sizes.iter().map(|d| (1.0 / d).ln()).collect()
    }

    pub fn log_lacunarity(&self) -> Vec<f64> {
        self.lacunarity.iter().map(|l| l.ln()).collect()
    }
}

/// Histogram the normalised points into `round(1/δ)` bins per axis and compare
/// the spread of box masses to their mean
///
/// Only occupied cells are stored; empty cells enter the moments through the
/// total cell count, so memory stays proportional to the number of points.
pub fn lacunarity(points: &[Point], box_sizes: &[f64]) -> Result<LacunarityProfile> {
    if box_sizes.is_empty() {
        return Err(FractalError::InsufficientData(
            "need at least one box size".to_string(),
        ));
    }
    validate_scales("box_sizes", box_sizes, true)?;
    let unit = normalize_to_unit(points)?;
    let total = unit.len() as f64;

    let values = box_sizes
        .iter()
        .map(|&delta| {
            let bins = (1.0 / delta).round().max(1.0);
            let last = bins - 1.0;
            let mut masses: HashMap<(u64, u64), u64> = HashMap::new();
            for p in &unit {
                let ix = (p.x * bins).floor().clamp(0.0, last) as u64;
                let iy = (p.y * bins).floor().clamp(0.0, last) as u64;
                *masses.entry((ix, iy)).or_insert(0) += 1;
            }

            // Λ = E[m²] / E[m]² with both moments taken over all bins² cells
            let cells = bins * bins;
            let second_moment =
                masses.values().map(|&m| (m as f64).powi(2)).sum::<f64>() / cells;
            let mean = total / cells;
            debug!(delta, occupied = masses.len(), "binned box masses");
            second_moment / (mean * mean)
        })
        .collect();

    let profile = LacunarityProfile {
        box_sizes: box_sizes.to_vec(),
        lacunarity: values,
    };
    info!(sizes = box_sizes.len(), "computed lacunarity profile");
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lattice(side: usize) -> Vec<Point> {
        let step = 1.0 / (side - 1) as f64;
        (0..side)
            .flat_map(|i| (0..side).map(move |j| Point::new(i as f64 * step, j as f64 * step)))
            .collect()
    }

    #[test]
    fn test_uniform_lattice_has_unit_lacunarity() {
        let profile = lacunarity(&lattice(256), &[0.5, 0.25, 0.125]).unwrap();
        for l in &profile.lacunarity {
            assert!((l - 1.0).abs() < 1e-12, "lacunarity = {l}");
        }
    }

    #[test]
    fn test_clustered_set_is_gappier() {
        let mut pts: Vec<Point> = lattice(64).into_iter().map(|p| p * 0.1).collect();
        pts.push(Point::new(1.0, 1.0));
        let clustered = lacunarity(&pts, &[0.25]).unwrap();
        let uniform = lacunarity(&lattice(64), &[0.25]).unwrap();
        assert!(clustered.lacunarity[0] > uniform.lacunarity[0] + 1.0);
    }

    #[test]
    fn test_fine_boxes_stay_sparse() {
        // 2^33 bins per axis: a dense histogram would not fit in memory
        let pts = lattice(16);
        let profile = lacunarity(&pts, &[0.5, 0.5f64.powi(33)]).unwrap();
        // every point alone in its box: Λ = cells / N
        let expected = 2f64.powi(66) / pts.len() as f64;
        assert!((profile.lacunarity[1] / expected - 1.0).abs() < 1e-9);
        assert!((profile.lacunarity[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_input() {
        let pts = vec![Point::new(1.0, 1.0); 4];
        assert!(matches!(
            lacunarity(&pts, &[0.5]),
            Err(FractalError::DegenerateInput(_))
        ));
    }
}
