//! L-system whose rule for `F` is drawn at random for every symbol

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use super::lsystem::{LSystem, LEVY_RULE};
use super::{validate_angle, validate_iterations, CurveGenerator, DEFAULT_SEED};
use crate::errors::{FractalError, Result};
use crate::geometry::Point;

/// Perturbed rule used with probability `1 - p`
pub const ALTERNATE_RULE: &str = "+F-+F-";

/// Stochastic Lévy-like curve
///
/// Each `F` is rewritten to [`LEVY_RULE`] with probability `p` and to
/// [`ALTERNATE_RULE`] otherwise. Both rules emit two draws, so the segment count
/// still doubles per round.
#[derive(Debug, Clone)]
pub struct StochasticLSystem {
    iterations: u32,
    angle_deg: f64,
    p: f64,
    seed: u64,
}

impl StochasticLSystem {
    pub fn new(iterations: i64, angle_deg: f64, p: f64) -> Result<Self> {
        let iterations = validate_iterations(iterations)?;
        let angle_deg = validate_angle(angle_deg)?;
        if !(0.0..=1.0).contains(&p) {
            return Err(FractalError::invalid(
                "p",
                format!("rule probability must lie in [0, 1], got {p}"),
            ));
        }
        Ok(Self {
            iterations,
            angle_deg,
            p,
            seed: DEFAULT_SEED,
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Expand the axiom `F`, drawing a rule independently for every `F`
    pub fn expand(&self) -> String {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut current = String::from("F");
        for _ in 0..self.iterations {
            let mut next = String::with_capacity(current.len() * 2);
            for ch in current.chars() {
                if ch == 'F' {
                    next.push_str(if rng.random_bool(self.p) {
                        LEVY_RULE
                    } else {
                        ALTERNATE_RULE
                    });
                } else {
                    next.push(ch);
                }
            }
            current = next;
        }
        current
    }
}

impl CurveGenerator for StochasticLSystem {
    fn generate(&self) -> Result<Vec<Point>> {
        let instructions = self.expand();
        let step = 2.0_f64.powf(-f64::from(self.iterations) / 2.0);
        let points = LSystem::new("F", self.angle_deg).interpret(&instructions, step)?;
        info!(
            iterations = self.iterations,
            p = self.p,
            seed = self.seed,
            points = points.len(),
            "generated stochastic L-system curve"
        );
        Ok(points)
    }

    fn name(&self) -> &'static str {
        "stochastic"
    }

    fn is_ordered(&self) -> bool {
        true
    }
}
