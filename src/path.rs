//! Freehand path accumulation and its SVG-like string form.
//!
//! A stroke is recorded as a move-to followed by line-tos and, once finished,
//! a close command: `M x y L x y ... Z`. Only absolute `M`, `L` and `Z`
//! commands are produced.

#[cfg(test)]
#[path = "path_test.rs"]
mod path_test;

use crate::camera::Point;

/// Points of one freehand path in logical coordinates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathData {
    points: Vec<Point>,
    closed: bool,
}

impl PathData {
    /// Begin a path with a move-to at `start`.
    #[must_use]
    pub fn start(start: Point) -> Self {
        Self { points: vec![start], closed: false }
    }

    /// Append a line-to. Ignored once the path is closed.
    pub fn line_to(&mut self, p: Point) {
        if self.closed || !p.is_finite() {
            return;
        }
        self.points.push(p);
    }

    /// Append the close command.
    pub fn close(&mut self) {
        self.closed = true;
    }

    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// A path that encloses nothing: every point coincides with the first.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        match self.points.split_first() {
            Some((first, rest)) => rest.iter().all(|p| p == first),
            None => true,
        }
    }

    /// Render as `M x y L x y ... [Z]`.
    #[must_use]
    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        for (i, p) in self.points.iter().enumerate() {
            let cmd = if i == 0 { "M" } else { " L" };
            out.push_str(&format!("{cmd} {} {}", p.x, p.y));
        }
        if self.closed {
            out.push_str(" Z");
        }
        out
    }
}
