#![allow(clippy::too_many_arguments)]

//! # Levy Fractals
//!
//! Generates the Lévy C-curve by string rewriting (L-system) or by the chaos
//! game over its iterated function system, renders the point sets to raster
//! images, and estimates fractal dimension by box counting.
//!
//! ```text
//!   GenerationParameters ──build()──▶ CurveGenerator ──▶ Vec<Point>
//!                                                          │
//!                              ┌───────────────────────────┴───────────────┐
//!                              ▼                                           ▼
//!                     render::render_points                metrics::estimate_box_dimension
//! ```

pub mod cli;
pub mod curve;
pub mod errors;
pub mod geometry;
pub mod metrics;
pub mod render;

pub use curve::{CurveGenerator, GenerationParameters, LevyIfs, LevyLSystem, Method};
pub use errors::{FractalError, Result};
pub use geometry::{BoundingBox, Point};
pub use metrics::{estimate_box_dimension, DimensionEstimate};
pub use render::{render_points, PlotMode, RenderOptions};
