//! # Lévy C-curve generators
//!
//! Three constructions of the same attractor:
//!
//! - [`LevyLSystem`]: deterministic string rewriting `F -> +F--F+` read as turtle moves
//! - [`LevyIfs`]: chaos game over two similarity maps of ratio `1/sqrt(2)`
//! - [`StochasticLSystem`]: rewriting with a random choice between two rules per symbol
//!
//! All of them go through [`GenerationParameters`], which holds raw (signed)
//! user input and validates it before anything is allocated.

mod ifs;
mod lsystem;
mod stochastic;

pub use ifs::{Affine2D, Ifs, LevyIfs, DEFAULT_DISCARD, DEFAULT_SEED};
pub use lsystem::{LSystem, LevyLSystem, LEVY_RULE};
pub use stochastic::{StochasticLSystem, ALTERNATE_RULE};

use clap::ValueEnum;
use tracing::debug;

use crate::errors::{FractalError, Result};
use crate::geometry::Point;

/// Largest accepted rewriting depth; the instruction string doubles every round
pub const MAX_ITERATIONS: i64 = 20;

/// Largest accepted chaos-game sample, and burn-in, size
pub const MAX_POINTS: i64 = 10_000_000;

/// Default L-system turn and IFS rotation angle, in degrees
pub const DEFAULT_ANGLE: f64 = 45.0;

/// Something that can produce a point sequence approximating the curve
pub trait CurveGenerator {
    /// Generate the point sequence
    fn generate(&self) -> Result<Vec<Point>>;

    /// Short human readable label, used in logs
    fn name(&self) -> &'static str;

    /// Whether the output order is meaningful (polyline) or not (scatter cloud)
    fn is_ordered(&self) -> bool;
}

/// Construction method
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Method {
    /// Deterministic rewriting system
    Lsystem,
    /// Chaos game
    Ifs,
    /// Rewriting with randomly chosen rules
    Stochastic,
}

/// Unvalidated generation input, as received from the command line
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParameters {
    pub method: Method,
    pub iterations: i64,
    pub n_points: i64,
    pub angle_deg: f64,
    pub seed: u64,
    pub discard: usize,
    pub rule_probability: f64,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            method: Method::Lsystem,
            iterations: 12,
            n_points: 80_000,
            angle_deg: DEFAULT_ANGLE,
            seed: DEFAULT_SEED,
            discard: DEFAULT_DISCARD,
            rule_probability: 0.5,
        }
    }
}

impl GenerationParameters {
    pub fn lsystem(iterations: i64, angle_deg: f64) -> Self {
        Self {
            method: Method::Lsystem,
            iterations,
            angle_deg,
            ..Self::default()
        }
    }

    pub fn ifs(n_points: i64, seed: u64) -> Self {
        Self {
            method: Method::Ifs,
            n_points,
            seed,
            ..Self::default()
        }
    }

    /// Validate and turn the parameters into a concrete generator
    pub fn build(&self) -> Result<Box<dyn CurveGenerator>> {
        debug!(?self, "building generator");
        if self.discard as u64 > MAX_POINTS as u64 {
            return Err(FractalError::invalid(
                "discard",
                format!("must be <= {MAX_POINTS}, got {}", self.discard),
            ));
        }
        let generator: Box<dyn CurveGenerator> = match self.method {
            Method::Lsystem => Box::new(LevyLSystem::new(self.iterations, self.angle_deg)?),
            Method::Ifs => Box::new(
                LevyIfs::new(self.n_points, self.angle_deg)?
                    .with_seed(self.seed)
                    .with_discard(self.discard),
            ),
            Method::Stochastic => Box::new(
                StochasticLSystem::new(self.iterations, self.angle_deg, self.rule_probability)?
                    .with_seed(self.seed),
            ),
        };
        Ok(generator)
    }

    /// Build and run the generator in one step
    pub fn generate(&self) -> Result<Vec<Point>> {
        self.build()?.generate()
    }
}

pub(crate) fn validate_iterations(iterations: i64) -> Result<u32> {
    if iterations < 0 {
        return Err(FractalError::invalid(
            "iterations",
            format!("must be >= 0, got {iterations}"),
        ));
    }
    if iterations > MAX_ITERATIONS {
        return Err(FractalError::invalid(
            "iterations",
            format!("must be <= {MAX_ITERATIONS}, got {iterations}"),
        ));
    }
    Ok(iterations as u32)
}

pub(crate) fn validate_angle(angle_deg: f64) -> Result<f64> {
    if angle_deg.is_finite() {
        Ok(angle_deg)
    } else {
        Err(FractalError::invalid(
            "angle",
            format!("must be a finite number of degrees, got {angle_deg}"),
        ))
    }
}
