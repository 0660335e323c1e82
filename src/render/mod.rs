//! # Renderer
//!
//! Point sequences are drawn onto an in-memory [`Canvas`] and encoded by the
//! `image` crate, the format following the output file's extension.
//!
//! ```text
//!   &[Point] ──▶ Viewport (equal aspect, y up) ──▶ Shapes ──▶ Canvas ──▶ PNG
//! ```
//!
//! Figures carry no text. Panel titles go to the log instead.

mod canvas;
mod color;
mod figure;
mod shapes;

pub use canvas::Canvas;
pub use color::Color;
pub use figure::{
    draw_grid, draw_regression, grid_shape, render_comparison, render_grid, render_points,
    render_regression, Panel, PixelRect, PlotMode, RenderOptions, Viewport,
};
pub use shapes::{Frame, Line, Points, Polyline, Shape};
