//! Grid backdrop configuration and its tileable pattern.
//!
//! The grid is presentation only. It is tiled behind the live view and is
//! never part of an export.

#[cfg(test)]
#[path = "grid_test.rs"]
mod grid_test;

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::consts::MAX_GRID_TILE_PX;

/// Grid appearance, as supplied by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridConfig {
    pub enabled: bool,
    /// Cell size in screen pixels.
    pub size: f64,
    /// CSS hex color, `#rgb` or `#rrggbb`.
    pub color: String,
    /// Line opacity in `[0, 1]`.
    pub opacity: f64,
    /// Line width in screen pixels.
    pub line_width: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { enabled: true, size: 25.0, color: "#e5e5e5".into(), opacity: 0.5, line_width: 1.0 }
    }
}

impl GridConfig {
    /// Build the repeating tile: one cell with its lines on the right and
    /// bottom edges. `None` when the grid is off, the cell is larger than
    /// [`MAX_GRID_TILE_PX`], or the grid cannot be drawn.
    #[must_use]
    pub fn pattern(&self) -> Option<RgbaImage> {
        if !self.enabled || !self.size.is_finite() || self.size < 1.0 || self.size > MAX_GRID_TILE_PX {
            return None;
        }
        let [r, g, b] = parse_hex_color(&self.color)?;
        let alpha = unit_to_byte(self.opacity);
        if alpha == 0 {
            return None;
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let size = self.size.round() as u32;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let line = (self.line_width.round().max(1.0) as u32).min(size);

        let mut tile = RgbaImage::new(size, size);
        let ink = Rgba([r, g, b, alpha]);
        for (x, y, px) in tile.enumerate_pixels_mut() {
            if x >= size - line || y >= size - line {
                *px = ink;
            }
        }
        Some(tile)
    }
}

/// Parse `#rgb` or `#rrggbb`.
#[must_use]
pub fn parse_hex_color(raw: &str) -> Option<[u8; 3]> {
    let hex = raw.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let digit = |i: usize, len: usize| u8::from_str_radix(&hex[i..i + len], 16);
    let parsed = match hex.len() {
        3 => [digit(0, 1), digit(1, 1), digit(2, 1)].map(|d| d.map(|v| v * 17)),
        6 => [digit(0, 2), digit(2, 2), digit(4, 2)],
        _ => return None,
    };
    match parsed {
        [Ok(r), Ok(g), Ok(b)] => Some([r, g, b]),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn unit_to_byte(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
