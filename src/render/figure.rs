//! Figure layout: data-to-pixel mapping, panel grids and plot kinds

use std::path::PathBuf;

use clap::ValueEnum;
use tracing::{debug, warn};

use super::canvas::Canvas;
use super::color::Color;
use super::shapes::{Frame, Line, Points, Polyline};
use crate::errors::{FractalError, Result};
use crate::geometry::{BoundingBox, Point};

/// Fraction of the panel's short side kept free around the data
const MARGIN: f64 = 0.05;

/// How a point sequence is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PlotMode {
    /// Connect consecutive points
    #[default]
    Line,
    /// Draw every point as a marker
    Scatter,
}

/// Output configuration shared by every render call
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub outfile: PathBuf,
    /// Figure width in pixels
    pub width: u32,
    /// Figure height in pixels
    pub height: u32,
    pub color: Color,
    pub background: Color,
    pub line_width: f64,
    /// Marker radius in pixels
    pub marker_size: f64,
    pub mode: PlotMode,
}

impl RenderOptions {
    pub fn new(outfile: impl Into<PathBuf>) -> Self {
        Self {
            outfile: outfile.into(),
            ..Self::default()
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_mode(mut self, mode: PlotMode) -> Self {
        self.mode = mode;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.line_width.is_finite() && self.line_width > 0.0) {
            return Err(FractalError::invalid(
                "line_width",
                format!("must be a positive number, got {}", self.line_width),
            ));
        }
        if !(self.marker_size.is_finite() && self.marker_size >= 0.0) {
            return Err(FractalError::invalid(
                "marker_size",
                format!("must be a non-negative number, got {}", self.marker_size),
            ));
        }
        Ok(())
    }

    fn canvas(&self) -> Result<Canvas> {
        self.validate()?;
        Canvas::with_background(self.width, self.height, self.background)
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            outfile: PathBuf::from("levy_c.png"),
            width: 800,
            height: 800,
            color: Color::TAB_BLUE,
            background: Color::WHITE,
            line_width: 1.0,
            marker_size: 1.0,
            mode: PlotMode::Line,
        }
    }
}

/// One point sequence and how to draw it
#[derive(Debug, Clone, Copy)]
pub struct Panel<'a> {
    pub points: &'a [Point],
    pub mode: PlotMode,
}

impl<'a> Panel<'a> {
    pub fn line(points: &'a [Point]) -> Self {
        Self {
            points,
            mode: PlotMode::Line,
        }
    }

    pub fn scatter(points: &'a [Point]) -> Self {
        Self {
            points,
            mode: PlotMode::Scatter,
        }
    }
}

/// Pixel rectangle inside the figure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Equal-aspect mapping of a data box into a pixel rectangle, y pointing up
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    center: Point,
    origin: Point,
    scale: f64,
}

impl Viewport {
    pub fn fit(bounds: &BoundingBox, rect: PixelRect) -> Self {
        let margin = MARGIN * rect.width.min(rect.height);
        let avail_w = (rect.width - 2.0 * margin).max(1.0);
        let avail_h = (rect.height - 2.0 * margin).max(1.0);

        let scale = match (bounds.width() > 0.0, bounds.height() > 0.0) {
            (true, true) => (avail_w / bounds.width()).min(avail_h / bounds.height()),
            (true, false) => avail_w / bounds.width(),
            (false, true) => avail_h / bounds.height(),
            (false, false) => 1.0,
        };

        Self {
            center: bounds.center(),
            origin: Point::new(rect.x + rect.width / 2.0, rect.y + rect.height / 2.0),
            scale,
        }
    }

    #[inline]
    pub fn map(&self, p: Point) -> Point {
        Point::new(
            self.origin.x + (p.x - self.center.x) * self.scale,
            self.origin.y - (p.y - self.center.y) * self.scale,
        )
    }
}

/// Columns and rows for `n` panels with at most `max_per_row` per row
pub fn grid_shape(n: usize, max_per_row: usize) -> (usize, usize) {
    let cols = n.min(max_per_row.max(1)).max(1);
    let rows = n.div_ceil(cols).max(1);
    (cols, rows)
}

fn draw_panel(canvas: &mut Canvas, panel: &Panel<'_>, rect: PixelRect, options: &RenderOptions) {
    let Some(bounds) = BoundingBox::of(panel.points) else {
        warn!("skipping empty panel");
        return;
    };
    let viewport = Viewport::fit(&bounds, rect);
    let mapped: Vec<Point> = panel.points.iter().map(|p| viewport.map(*p)).collect();

    match panel.mode {
        PlotMode::Line if mapped.len() > 1 => canvas.draw(&Polyline {
            vertices: mapped,
            color: options.color,
            width: options.line_width,
        }),
        PlotMode::Line | PlotMode::Scatter => canvas.draw(
            &Points::new(mapped, options.color).with_radius(options.marker_size),
        ),
    }
}

/// Lay panels out row by row and draw them on one canvas
pub fn draw_grid(panels: &[Panel<'_>], max_per_row: usize, options: &RenderOptions) -> Result<Canvas> {
    if panels.is_empty() {
        return Err(FractalError::invalid("panels", "at least one panel is required"));
    }
    let mut canvas = options.canvas()?;
    let (cols, rows) = grid_shape(panels.len(), max_per_row);
    let cell_w = f64::from(options.width) / cols as f64;
    let cell_h = f64::from(options.height) / rows as f64;
    debug!(cols, rows, cell_w, cell_h, "laying out panels");

    for (i, panel) in panels.iter().enumerate() {
        let rect = PixelRect {
            x: (i % cols) as f64 * cell_w,
            y: (i / cols) as f64 * cell_h,
            width: cell_w,
            height: cell_h,
        };
        draw_panel(&mut canvas, panel, rect, options);
    }
    Ok(canvas)
}

/// Single sequence, drawn with `options.mode`
pub fn render_points(points: &[Point], options: &RenderOptions) -> Result<()> {
    let panel = Panel {
        points,
        mode: options.mode,
    };
    draw_grid(&[panel], 1, options)?.save(&options.outfile)
}

/// Two sequences side by side in one image of the configured size
pub fn render_comparison(left: Panel<'_>, right: Panel<'_>, options: &RenderOptions) -> Result<()> {
    draw_grid(&[left, right], 2, options)?.save(&options.outfile)
}

/// Panels in rows of at most `max_per_row`
pub fn render_grid(panels: &[Panel<'_>], max_per_row: usize, options: &RenderOptions) -> Result<()> {
    draw_grid(panels, max_per_row, options)?.save(&options.outfile)
}

/// Scatter of `(xs, ys)` with the line `slope·x + intercept` and a frame
pub fn draw_regression(
    xs: &[f64],
    ys: &[f64],
    slope: f64,
    intercept: f64,
    options: &RenderOptions,
) -> Result<Canvas> {
    if xs.len() != ys.len() || xs.is_empty() {
        return Err(FractalError::InsufficientData(format!(
            "regression plot needs matching, non-empty series (got {} x, {} y)",
            xs.len(),
            ys.len()
        )));
    }
    let mut canvas = options.canvas()?;
    let data: Vec<Point> = xs.iter().zip(ys).map(|(x, y)| Point::new(*x, *y)).collect();

    let x_min = xs.iter().copied().fold(f64::INFINITY, f64::min);
    let x_max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let fit = [
        Point::new(x_min, slope * x_min + intercept),
        Point::new(x_max, slope * x_max + intercept),
    ];

    let Some(bounds) = BoundingBox::union_of([data.as_slice(), fit.as_slice()]) else {
        return Ok(canvas);
    };
    // Log-log plots are not equal-aspect: stretch each axis to the frame
    let inset = 0.1 * f64::from(options.width.min(options.height));
    let frame = PixelRect {
        x: inset,
        y: inset,
        width: f64::from(options.width) - 2.0 * inset,
        height: f64::from(options.height) - 2.0 * inset,
    };
    let sx = if bounds.width() > 0.0 { frame.width / bounds.width() } else { 1.0 };
    let sy = if bounds.height() > 0.0 { frame.height / bounds.height() } else { 1.0 };
    let to_px = |p: Point| {
        Point::new(
            frame.x + (p.x - bounds.min_x) * sx,
            frame.y + frame.height - (p.y - bounds.min_y) * sy,
        )
    };

    canvas.draw(&Frame {
        left: frame.x - 1.0,
        top: frame.y - 1.0,
        right: frame.x + frame.width + 1.0,
        bottom: frame.y + frame.height + 1.0,
        color: Color::GRAY,
    });
    canvas.draw(
        &Line::new(to_px(fit[0]), to_px(fit[1]), Color::TAB_ORANGE).with_width(options.line_width),
    );
    canvas.draw(
        &Points::new(data.into_iter().map(to_px).collect(), options.color)
            .with_radius(options.marker_size.max(3.0)),
    );
    Ok(canvas)
}

/// Log-log regression plot written to `options.outfile`
pub fn render_regression(
    xs: &[f64],
    ys: &[f64],
    slope: f64,
    intercept: f64,
    options: &RenderOptions,
) -> Result<()> {
    draw_regression(xs, ys, slope, intercept, options)?.save(&options.outfile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 6, (1, 1))]
    #[case(5, 6, (5, 1))]
    #[case(7, 3, (3, 3))]
    #[case(4, 2, (2, 2))]
    #[case(3, 0, (1, 3))]
    fn test_grid_shape(#[case] n: usize, #[case] max: usize, #[case] expected: (usize, usize)) {
        assert_eq!(grid_shape(n, max), expected);
    }

    #[test]
    fn test_viewport_keeps_aspect_and_flips_y() {
        let bounds = BoundingBox {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 2.0,
            max_y: 1.0,
        };
        let rect = PixelRect {
            x: 0.0,
            y: 0.0,
            width: 200.0,
            height: 200.0,
        };
        let vp = Viewport::fit(&bounds, rect);
        let lo = vp.map(Point::new(0.0, 0.0));
        let hi = vp.map(Point::new(2.0, 1.0));
        // 10px margin each side, 180px for 2 data units
        assert!((lo.x - 10.0).abs() < 1e-9);
        assert!((hi.x - 190.0).abs() < 1e-9);
        assert!(hi.y < lo.y);
        assert!(((lo.y - hi.y) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_viewport_single_point_is_centered() {
        let p = Point::new(3.0, -4.0);
        let bounds = BoundingBox::of(&[p]).unwrap();
        let rect = PixelRect {
            x: 100.0,
            y: 0.0,
            width: 100.0,
            height: 50.0,
        };
        assert_eq!(Viewport::fit(&bounds, rect).map(p), Point::new(150.0, 25.0));
    }

    #[test]
    fn test_grid_paints_every_cell() {
        let a = [Point::new(0.0, 0.0), Point::new(1.0, 1.0)];
        let b = [Point::new(0.0, 1.0), Point::new(1.0, 0.0)];
        let options = RenderOptions::default().with_size(200, 100);
        let canvas = draw_grid(&[Panel::line(&a), Panel::scatter(&b)], 2, &options).unwrap();
        let left = (0..100).any(|x| (0..100).any(|y| canvas.get_pixel(x, y) != Some(Color::WHITE)));
        let right = (100..200).any(|x| (0..100).any(|y| canvas.get_pixel(x, y) != Some(Color::WHITE)));
        assert!(left && right);
    }

    #[test]
    fn test_bad_style_rejected() {
        let mut options = RenderOptions::default();
        options.line_width = 0.0;
        let pts = [Point::new(0.0, 0.0)];
        assert!(matches!(
            draw_grid(&[Panel::line(&pts)], 1, &options),
            Err(FractalError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_regression_plot_draws_something() {
        let xs = [1.0, 2.0, 3.0];
        let ys = [2.0, 4.1, 5.9];
        let options = RenderOptions::default().with_size(300, 200);
        let canvas = draw_regression(&xs, &ys, 2.0, 0.0, &options).unwrap();
        assert_eq!((canvas.width, canvas.height), (300, 200));
        assert!(canvas.painted_pixels() > 100);
    }

    #[test]
    fn test_regression_plot_rejects_mismatched_series() {
        let options = RenderOptions::default();
        assert!(draw_regression(&[1.0], &[], 1.0, 0.0, &options).is_err());
    }
}
