//! Iterated function systems sampled by the chaos game

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::{validate_angle, CurveGenerator, DEFAULT_ANGLE, MAX_POINTS};
use crate::errors::{FractalError, Result};
use crate::geometry::{rotation, Point};

/// Seed used when the caller does not pick one
pub const DEFAULT_SEED: u64 = 1337;

/// Iterates dropped before collecting points
pub const DEFAULT_DISCARD: usize = 100;

/// Affine map `p -> A·p + b`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine2D {
    pub a: [[f64; 2]; 2],
    pub b: [f64; 2],
}

impl Affine2D {
    pub const fn new(a: [[f64; 2]; 2], b: [f64; 2]) -> Self {
        Self { a, b }
    }

    /// Rotation by `theta` radians scaled by `scale`, then translated
    pub fn similarity(scale: f64, theta: f64, b: [f64; 2]) -> Self {
        let r = rotation(theta);
        Self::new(
            [
                [scale * r[0][0], scale * r[0][1]],
                [scale * r[1][0], scale * r[1][1]],
            ],
            b,
        )
    }

    #[inline]
    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a[0][0] * p.x + self.a[0][1] * p.y + self.b[0],
            self.a[1][0] * p.x + self.a[1][1] * p.y + self.b[1],
        )
    }
}

/// A weighted set of affine maps
#[derive(Debug, Clone)]
pub struct Ifs {
    transforms: Vec<Affine2D>,
    /// Cumulative, normalised weights; the last entry is 1.0
    cumulative: Vec<f64>,
}

impl Ifs {
    /// Uniformly weighted system
    pub fn uniform(transforms: Vec<Affine2D>) -> Result<Self> {
        let weights = vec![1.0; transforms.len()];
        Self::weighted(transforms, &weights)
    }

    /// Weighted system; weights are normalised to sum to one
    pub fn weighted(transforms: Vec<Affine2D>, weights: &[f64]) -> Result<Self> {
        if transforms.is_empty() {
            return Err(FractalError::invalid("transforms", "at least one map is required"));
        }
        if weights.len() != transforms.len() {
            return Err(FractalError::invalid(
                "probabilities",
                format!(
                    "expected {} weights, got {}",
                    transforms.len(),
                    weights.len()
                ),
            ));
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(FractalError::invalid(
                "probabilities",
                "weights must be finite and non-negative",
            ));
        }
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return Err(FractalError::invalid("probabilities", "weights must sum to > 0"));
        }

        let mut acc = 0.0;
        let mut cumulative: Vec<f64> = weights
            .iter()
            .map(|w| {
                acc += w / total;
                acc
            })
            .collect();
        if let Some(last) = cumulative.last_mut() {
            *last = 1.0;
        }
        Ok(Self {
            transforms,
            cumulative,
        })
    }

    pub fn transforms(&self) -> &[Affine2D] {
        &self.transforms
    }

    /// Normalised probability of each map
    pub fn probabilities(&self) -> Vec<f64> {
        let mut prev = 0.0;
        self.cumulative
            .iter()
            .map(|c| {
                let p = c - prev;
                prev = *c;
                p
            })
            .collect()
    }

    fn pick(&self, rng: &mut StdRng) -> &Affine2D {
        let u: f64 = rng.random();
        let idx = self
            .cumulative
            .iter()
            .position(|c| u < *c)
            .unwrap_or(self.transforms.len() - 1);
        &self.transforms[idx]
    }

    /// Run the chaos game from `start`, keep `n_points` after `discard` iterates
    pub fn sample(&self, n_points: usize, discard: usize, seed: u64, start: Point) -> Vec<Point> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut x = start;
        let mut points = Vec::with_capacity(n_points);

        for i in 0..n_points.saturating_add(discard) {
            x = self.pick(&mut rng).apply(x);
            if i >= discard {
                points.push(x);
            }
        }
        points
    }
}

/// Chaos-game Lévy C-curve
///
/// Maps `f1(p) = R(+θ)·p/√2` and `f2(p) = R(-θ)·p/√2 + (½, ½)` with equal weight.
/// At θ = 45° the attractor is the curve between `(0, 0)` and `(1, 0)`.
#[derive(Debug, Clone)]
pub struct LevyIfs {
    ifs: Ifs,
    n_points: usize,
    discard: usize,
    seed: u64,
}

impl LevyIfs {
    pub fn new(n_points: i64, angle_deg: f64) -> Result<Self> {
        if n_points < 1 {
            return Err(FractalError::invalid(
                "n_points",
                format!("must be >= 1, got {n_points}"),
            ));
        }
        if n_points > MAX_POINTS {
            return Err(FractalError::invalid(
                "n_points",
                format!("must be <= {MAX_POINTS}, got {n_points}"),
            ));
        }
        let theta = validate_angle(angle_deg)?.to_radians();
        let scale = std::f64::consts::FRAC_1_SQRT_2;
        let ifs = Ifs::uniform(vec![
            Affine2D::similarity(scale, theta, [0.0, 0.0]),
            Affine2D::similarity(scale, -theta, [0.5, 0.5]),
        ])?;
        Ok(Self {
            ifs,
            n_points: n_points as usize,
            discard: DEFAULT_DISCARD,
            seed: DEFAULT_SEED,
        })
    }

    /// Classic 45° curve
    pub fn classic(n_points: i64) -> Result<Self> {
        Self::new(n_points, DEFAULT_ANGLE)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_discard(mut self, discard: usize) -> Self {
        self.discard = discard;
        self
    }
}

impl CurveGenerator for LevyIfs {
    fn generate(&self) -> Result<Vec<Point>> {
        debug!(
            n_points = self.n_points,
            discard = self.discard,
            seed = self.seed,
            maps = self.ifs.transforms().len(),
            probabilities = ?self.ifs.probabilities(),
            "running chaos game"
        );
        let points = self
            .ifs
            .sample(self.n_points, self.discard, self.seed, Point::new(0.0, 0.0));
        info!(points = points.len(), seed = self.seed, "generated IFS point cloud");
        Ok(points)
    }

    fn name(&self) -> &'static str {
        "ifs"
    }

    fn is_ordered(&self) -> bool {
        false
    }
}
