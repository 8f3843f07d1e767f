#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use crate::consts::{MAX_ZOOM, MIN_ZOOM};

/// A point in either screen or logical space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Midpoint between `self` and `other`.
    #[must_use]
    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned rectangle in either screen or logical space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle spanning two corners given in any order.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self { x: a.x.min(b.x), y: a.y.min(b.y), width: (a.x - b.x).abs(), height: (a.y - b.y).abs() }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Whether `other` lies entirely inside this rectangle.
    #[must_use]
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x && other.y >= self.y && other.right() <= self.right() && other.bottom() <= self.bottom()
    }
}

/// Affine mapping between screen pixels and logical canvas coordinates.
///
/// `screen = logical * scale + translate`, per axis. No rotation or skew.
/// Scales are kept within [`MIN_ZOOM`, `MAX_ZOOM`] by every zoom operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    pub scale_x: f64,
    pub scale_y: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self { scale_x: 1.0, scale_y: 1.0, translate_x: 0.0, translate_y: 0.0 }
    }
}

impl ViewportTransform {
    /// Convert a screen-space point (CSS pixels) to logical coordinates.
    #[must_use]
    pub fn to_logical(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.translate_x) / self.scale_x,
            y: (screen.y - self.translate_y) / self.scale_y,
        }
    }

    /// Convert a logical point to screen coordinates (CSS pixels).
    #[must_use]
    pub fn to_screen(&self, logical: Point) -> Point {
        Point {
            x: logical.x * self.scale_x + self.translate_x,
            y: logical.y * self.scale_y + self.translate_y,
        }
    }

    /// Uniform zoom level. Both axes share it after any zoom operation.
    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.scale_x
    }

    /// Multiply the scale by `factor`, keeping the logical point under
    /// `screen` fixed on screen. The result is clamped to the zoom limits.
    pub fn zoom_to_point(&mut self, screen: Point, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 || !screen.is_finite() {
            return;
        }
        let anchor = self.to_logical(screen);
        let scale = clamp_zoom(self.scale_x * factor);
        self.scale_x = scale;
        self.scale_y = scale;
        // Solve translate so that to_screen(anchor) == screen.
        self.translate_x = screen.x - anchor.x * scale;
        self.translate_y = screen.y - anchor.y * scale;
    }

    /// Shift the view by a screen-space delta. Unbounded.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        if !dx.is_finite() || !dy.is_finite() {
            return;
        }
        self.translate_x += dx;
        self.translate_y += dy;
    }

    /// Map a logical rectangle to screen space.
    #[must_use]
    pub fn rect_to_screen(&self, rect: &Rect) -> Rect {
        let origin = self.to_screen(Point::new(rect.x, rect.y));
        Rect::new(origin.x, origin.y, rect.width * self.scale_x, rect.height * self.scale_y)
    }
}

/// Clamp a scale value into the allowed zoom range.
#[must_use]
pub fn clamp_zoom(scale: f64) -> f64 {
    scale.clamp(MIN_ZOOM, MAX_ZOOM)
}
