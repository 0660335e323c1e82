//! Drawable primitives in pixel coordinates

use super::Color;
use crate::geometry::Point;

/// Shape trait for drawable primitives
pub trait Shape {
    /// Draw the shape onto a pixel buffer
    fn rasterize(&self, width: u32, height: u32, pixels: &mut [Color]);
}

#[inline]
fn plot(pixels: &mut [Color], width: u32, height: u32, x: i64, y: i64, color: Color) {
    if x >= 0 && x < i64::from(width) && y >= 0 && y < i64::from(height) {
        let idx = (y as u64 * u64::from(width) + x as u64) as usize;
        if let Some(px) = pixels.get_mut(idx) {
            *px = color.blend_over(px);
        }
    }
}

/// Line segment
#[derive(Debug, Clone, Copy)]
pub struct Line {
    pub start: Point,
    pub end: Point,
    pub color: Color,
    pub width: f64,
}

impl Line {
    pub fn new(start: Point, end: Point, color: Color) -> Self {
        Self {
            start,
            end,
            color,
            width: 1.0,
        }
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    // Xiaolin Wu's line algorithm for anti-aliased hairlines
    fn rasterize_hairline(&self, width: u32, height: u32, pixels: &mut [Color]) {
        let mut x0 = self.start.x;
        let mut y0 = self.start.y;
        let mut x1 = self.end.x;
        let mut y1 = self.end.y;

        let steep = (y1 - y0).abs() > (x1 - x0).abs();

        if steep {
            std::mem::swap(&mut x0, &mut y0);
            std::mem::swap(&mut x1, &mut y1);
        }
        if x0 > x1 {
            std::mem::swap(&mut x0, &mut x1);
            std::mem::swap(&mut y0, &mut y1);
        }

        let dx = x1 - x0;
        let dy = y1 - y0;
        let gradient = if dx.abs() < 0.0001 { 0.0 } else { dy / dx };

        let x_start = x0.round() as i64;
        let x_end = x1.round() as i64;
        let mut y = y0 + gradient * (x_start as f64 - x0);
        for x in x_start..=x_end {
            let intensity = 1.0 - (y - y.floor()) as f32;
            let yi = y.floor() as i64;
            if steep {
                plot(pixels, width, height, yi, x, self.color.faded(intensity));
                plot(pixels, width, height, yi + 1, x, self.color.faded(1.0 - intensity));
            } else {
                plot(pixels, width, height, x, yi, self.color.faded(intensity));
                plot(pixels, width, height, x, yi + 1, self.color.faded(1.0 - intensity));
            }
            y += gradient;
        }
    }
}

impl Shape for Line {
    fn rasterize(&self, width: u32, height: u32, pixels: &mut [Color]) {
        if !(self.start.is_finite() && self.end.is_finite()) {
            return;
        }
        if self.width <= 1.0 {
            self.rasterize_hairline(width, height, pixels);
            return;
        }

        // Thick lines: stamp parallel hairlines across the pen width
        let dir = self.end - self.start;
        let len = dir.x.hypot(dir.y);
        let normal = if len < 1e-9 {
            Point::new(0.0, 1.0)
        } else {
            Point::new(-dir.y / len, dir.x / len)
        };
        let passes = self.width.ceil() as i32;
        for i in 0..passes {
            let offset = f64::from(i) - f64::from(passes - 1) / 2.0;
            let shift = normal * offset;
            Line::new(self.start + shift, self.end + shift, self.color)
                .rasterize_hairline(width, height, pixels);
        }
    }
}

/// Connected sequence of line segments
#[derive(Debug, Clone)]
pub struct Polyline {
    pub vertices: Vec<Point>,
    pub color: Color,
    pub width: f64,
}

impl Shape for Polyline {
    fn rasterize(&self, width: u32, height: u32, pixels: &mut [Color]) {
        for pair in self.vertices.windows(2) {
            Line::new(pair[0], pair[1], self.color)
                .with_width(self.width)
                .rasterize(width, height, pixels);
        }
    }
}

/// Collection of round markers (scatter plots)
#[derive(Debug, Clone)]
pub struct Points {
    pub coords: Vec<Point>,
    pub color: Color,
    /// Marker radius in pixels; below 1 a single pixel is set
    pub radius: f64,
}

impl Points {
    pub fn new(coords: Vec<Point>, color: Color) -> Self {
        Self {
            coords,
            color,
            radius: 0.5,
        }
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }
}

impl Shape for Points {
    fn rasterize(&self, width: u32, height: u32, pixels: &mut [Color]) {
        let r = self.radius;
        for p in self.coords.iter().filter(|p| p.is_finite()) {
            if r < 1.0 {
                plot(pixels, width, height, p.x.round() as i64, p.y.round() as i64, self.color);
                continue;
            }

            let min_x = (p.x - r - 1.0).floor() as i64;
            let max_x = (p.x + r + 1.0).ceil() as i64;
            let min_y = (p.y - r - 1.0).floor() as i64;
            let max_y = (p.y + r + 1.0).ceil() as i64;
            for py in min_y..=max_y {
                for px in min_x..=max_x {
                    let dist = (px as f64 - p.x).hypot(py as f64 - p.y);
                    let intensity = if dist <= r - 0.5 {
                        1.0
                    } else if dist <= r + 0.5 {
                        (r + 0.5 - dist) as f32
                    } else {
                        continue;
                    };
                    plot(pixels, width, height, px, py, self.color.faded(intensity));
                }
            }
        }
    }
}

/// Outline of an axis-aligned rectangle
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub color: Color,
}

impl Shape for Frame {
    fn rasterize(&self, width: u32, height: u32, pixels: &mut [Color]) {
        let corners = [
            Point::new(self.left, self.top),
            Point::new(self.right, self.top),
            Point::new(self.right, self.bottom),
            Point::new(self.left, self.bottom),
            Point::new(self.left, self.top),
        ];
        Polyline {
            vertices: corners.to_vec(),
            color: self.color,
            width: 1.0,
        }
        .rasterize(width, height, pixels);
    }
}
