//! Color types with alpha support

use std::str::FromStr;

use crate::errors::FractalError;

/// RGBA color with f32 components (0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Self = Self::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Self = Self::rgb(0.0, 0.0, 1.0);
    pub const GRAY: Self = Self::rgb(0.6, 0.6, 0.6);
    /// Matplotlib's default line color
    pub const TAB_BLUE: Self = Self::rgb(0.122, 0.467, 0.706);
    pub const TAB_ORANGE: Self = Self::rgb(1.0, 0.498, 0.055);

    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    #[inline]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create from 8-bit RGB values (0-255)
    #[inline]
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(f32::from(r) / 255.0, f32::from(g) / 255.0, f32::from(b) / 255.0)
    }

    /// Create from hex color (e.g., 0xFF0000 for red)
    #[inline]
    pub fn from_hex(hex: u32) -> Self {
        Self::from_rgb8(
            ((hex >> 16) & 0xFF) as u8,
            ((hex >> 8) & 0xFF) as u8,
            (hex & 0xFF) as u8,
        )
    }

    /// Convert to 8-bit RGB tuple
    #[inline]
    pub fn to_rgb8(&self) -> (u8, u8, u8) {
        (
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
        )
    }

    /// Same color with alpha multiplied by `factor`
    #[inline]
    pub fn faded(&self, factor: f32) -> Self {
        Self {
            a: self.a * factor.clamp(0.0, 1.0),
            ..*self
        }
    }

    /// Blend this color over another (alpha compositing)
    #[inline]
    pub fn blend_over(&self, bg: &Color) -> Color {
        let a = self.a + bg.a * (1.0 - self.a);
        if a < 0.0001 {
            return Color::TRANSPARENT;
        }
        Color {
            r: (self.r * self.a + bg.r * bg.a * (1.0 - self.a)) / a,
            g: (self.g * self.a + bg.g * bg.a * (1.0 - self.a)) / a,
            b: (self.b * self.a + bg.b * bg.a * (1.0 - self.a)) / a,
            a,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::TAB_BLUE
    }
}

impl FromStr for Color {
    type Err = FractalError;

    /// Accepts `#rrggbb`, `rrggbb` or a handful of names
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let named = match s.to_ascii_lowercase().as_str() {
            "black" => Some(Self::BLACK),
            "white" => Some(Self::WHITE),
            "red" => Some(Self::RED),
            "green" => Some(Self::GREEN),
            "blue" => Some(Self::BLUE),
            "gray" | "grey" => Some(Self::GRAY),
            "tab:blue" => Some(Self::TAB_BLUE),
            "tab:orange" => Some(Self::TAB_ORANGE),
            _ => None,
        };
        if let Some(color) = named {
            return Ok(color);
        }

        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() == 6 {
            if let Ok(value) = u32::from_str_radix(hex, 16) {
                return Ok(Self::from_hex(value));
            }
        }
        Err(FractalError::invalid(
            "color",
            format!("expected #rrggbb or a color name, got '{s}'"),
        ))
    }
}
