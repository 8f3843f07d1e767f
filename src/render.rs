//! Rendering: rasterizes the canvas scene into an RGBA buffer.
//!
//! This module is the only place that writes pixels. It receives read-only
//! views of document state and a [`RasterView`] describing how logical
//! coordinates land on the target, and it never mutates application state.
//!
//! Layers, bottom first:
//! 1. grid backdrop (live view only, tiled in screen space)
//! 2. objects in draw order: background, dropped images, paths
//! 3. selection chrome: outline, delete control, marquee (live view only)
//!
//! Images are resampled nearest-neighbour so a 1:1 export reproduces the
//! source pixels exactly. Strokes are anti-aliased by distance coverage.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::ops::Range;

use image::{Rgba, RgbaImage};

use crate::camera::{Point, Rect, ViewportTransform};
use crate::consts::{MAX_RASTER_PIXELS, PATH_STROKE_COLOR, PATH_STROKE_WIDTH};
use crate::doc::{BackgroundImage, CanvasObject, DocStore, DroppedImage};

/// Selection outline color.
const SELECTION_BORDER: [u8; 4] = [178, 204, 255, 255];
/// Marquee fill and border.
const MARQUEE_FILL: [u8; 4] = [100, 100, 255, 77];
const MARQUEE_BORDER: [u8; 4] = [255, 255, 255, 77];
/// Delete control disc fill.
const DELETE_FILL: [u8; 4] = [0xff, 0x44, 0x44, 0xff];
const WHITE: [u8; 4] = [0xff, 0xff, 0xff, 0xff];

/// The delete icon is drawn on a 24-unit grid: disc radius 10, glyph
/// arms reaching 4 units from the center, strokes 2 units wide.
const ICON_GRID: f64 = 24.0;
const ICON_RADIUS: f64 = 10.0;
const ICON_ARM: f64 = 4.0;
const ICON_STROKE: f64 = 2.0;

/// How logical coordinates map onto a raster: `pixel = logical * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterView {
    pub width: u32,
    pub height: u32,
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    /// Device pixels per screen (CSS) pixel. Screen-sized chrome scales by this.
    pub dpr: f64,
}

impl RasterView {
    /// The visible viewport, `width` by `height` CSS pixels at `dpr`.
    ///
    /// `None` when the area is empty or exceeds [`MAX_RASTER_PIXELS`].
    #[must_use]
    pub fn from_viewport(viewport: &ViewportTransform, width: f64, height: f64, dpr: f64) -> Option<Self> {
        let dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        let width = to_pixel_count(width * dpr)?;
        let height = to_pixel_count(height * dpr)?;
        if !fits_raster_budget(width, height) {
            return None;
        }
        Some(Self {
            width,
            height,
            scale: viewport.scale_x * dpr,
            offset_x: viewport.translate_x * dpr,
            offset_y: viewport.translate_y * dpr,
            dpr,
        })
    }

    /// The background's displayed region at its native resolution.
    ///
    /// One output pixel per source pixel: the multiplier is `1 / scale`,
    /// anchored at the background's logical top-left. The result depends
    /// only on the background, never on the viewport.
    #[must_use]
    pub fn cropped_to(background: &BackgroundImage) -> Option<Self> {
        let scale = background.scale;
        if !scale.is_finite() || scale <= 0.0 {
            return None;
        }
        let multiplier = 1.0 / scale;
        if !fits_raster_budget(background.native_width(), background.native_height()) {
            return None;
        }
        Some(Self {
            width: background.native_width(),
            height: background.native_height(),
            scale: multiplier,
            offset_x: -background.left * multiplier,
            offset_y: -background.top * multiplier,
            dpr: 1.0,
        })
    }

    #[must_use]
    pub fn to_pixel(&self, logical: Point) -> Point {
        Point::new(logical.x * self.scale + self.offset_x, logical.y * self.scale + self.offset_y)
    }

    #[must_use]
    pub fn rect_to_pixel(&self, rect: &Rect) -> Rect {
        let origin = self.to_pixel(Point::new(rect.x, rect.y));
        Rect::new(origin.x, origin.y, rect.width * self.scale, rect.height * self.scale)
    }

    /// A blank raster of this view's size.
    #[must_use]
    pub fn blank(&self) -> RgbaImage {
        RgbaImage::new(self.width, self.height)
    }
}

/// Live-view extras drawn around the objects.
#[derive(Debug, Default, Clone, Copy)]
pub struct Overlay<'a> {
    /// Grid tile, repeated from the screen origin.
    pub grid: Option<&'a RgbaImage>,
    /// Selected image, outlined with its delete control.
    pub selected: Option<&'a DroppedImage>,
    /// Marquee rectangle in screen space.
    pub marquee: Option<Rect>,
}

/// Draw the full scene: backdrop, objects, and selection UI.
pub fn draw(target: &mut RgbaImage, doc: &DocStore, view: &RasterView, overlay: &Overlay<'_>) {
    // Layer 1: backdrop.
    if let Some(tile) = overlay.grid {
        draw_grid(target, tile);
    }

    // Layer 2: objects in draw order.
    draw_objects(target, doc, view);

    // Layer 3: selection UI.
    if let Some(img) = overlay.selected {
        draw_selection(target, view, img);
    }
    if let Some(m) = overlay.marquee {
        draw_marquee(target, view.dpr, m);
    }
}

/// Draw every object, bottom first. Exports use this alone.
pub fn draw_objects(target: &mut RgbaImage, doc: &DocStore, view: &RasterView) {
    for obj in doc.all() {
        match obj {
            CanvasObject::Background(bg) => draw_image(target, view, bg.image.pixels(), bg.left, bg.top, bg.scale),
            CanvasObject::Image(img) => draw_image(target, view, img.image.pixels(), img.left, img.top, img.scale),
            CanvasObject::Path(path) => {
                let pts: Vec<Point> = path.data.points().iter().map(|p| view.to_pixel(*p)).collect();
                let half_width = PATH_STROKE_WIDTH * view.scale * 0.5;
                stroke_polyline(target, &pts, path.data.is_closed(), half_width, PATH_STROKE_COLOR);
            }
        }
    }
}

// =============================================================
// Images
// =============================================================

/// Blit `source` with its top-left at logical `(left, top)` and uniform `scale`.
fn draw_image(target: &mut RgbaImage, view: &RasterView, source: &RgbaImage, left: f64, top: f64, scale: f64) {
    let step = scale * view.scale;
    let origin = view.to_pixel(Point::new(left, top));
    if !step.is_finite() || step <= 0.0 || !origin.is_finite() {
        return;
    }
    let (src_w, src_h) = source.dimensions();
    let x_end = origin.x + f64::from(src_w) * step;
    let y_end = origin.y + f64::from(src_h) * step;

    for py in pixel_range(origin.y, y_end, target.height()) {
        let Some(sy) = source_index(f64::from(py), origin.y, step, src_h) else {
            continue;
        };
        for px in pixel_range(origin.x, x_end, target.width()) {
            let Some(sx) = source_index(f64::from(px), origin.x, step, src_w) else {
                continue;
            };
            blend(target.get_pixel_mut(px, py), *source.get_pixel(sx, sy), 1.0);
        }
    }
}

/// Source texel whose footprint covers the center of target pixel `p`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn source_index(p: f64, origin: f64, step: f64, len: u32) -> Option<u32> {
    let s = ((p + 0.5 - origin) / step).floor();
    if s < 0.0 || s >= f64::from(len) {
        return None;
    }
    Some(s as u32)
}

// =============================================================
// Strokes and fills
// =============================================================

/// Stroke connected segments through pixel-space points.
fn stroke_polyline(target: &mut RgbaImage, pts: &[Point], closed: bool, half_width: f64, color: [u8; 4]) {
    let Some((&first, _)) = pts.split_first() else {
        return;
    };
    if pts.iter().any(|p| !p.is_finite()) {
        return;
    }
    let mut segments: Vec<(Point, Point)> = pts.windows(2).map(|w| (w[0], w[1])).collect();
    if let Some(&last) = pts.last() {
        if closed && pts.len() > 2 {
            segments.push((last, first));
        }
    }
    if segments.is_empty() {
        segments.push((first, first));
    }
    stroke_segments(target, &segments, half_width.max(0.5), color);
}

fn stroke_segments(target: &mut RgbaImage, segments: &[(Point, Point)], half_width: f64, color: [u8; 4]) {
    if let Some(mask) = CoverageMask::build(segments, half_width, target.width(), target.height()) {
        mask.apply(target, color);
    }
}

/// Per-pixel stroke coverage over the stroke's clipped bounding box.
///
/// Each segment only samples the pixels within `half_width + 1` of it, row by
/// row, so cost follows stroke length rather than bounding box area. Joints
/// keep the highest coverage instead of blending twice.
struct CoverageMask {
    cols: Range<u32>,
    rows: Range<u32>,
    values: Vec<f32>,
    /// Distance evaluations performed while building.
    samples: usize,
}

impl CoverageMask {
    #[allow(clippy::cast_possible_truncation)]
    fn build(segments: &[(Point, Point)], half_width: f64, width: u32, height: u32) -> Option<Self> {
        let pad = half_width + 1.0;
        let (mut min, mut max) = (Point::new(f64::INFINITY, f64::INFINITY), Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY));
        for (a, b) in segments {
            min = Point::new(min.x.min(a.x).min(b.x), min.y.min(a.y).min(b.y));
            max = Point::new(max.x.max(a.x).max(b.x), max.y.max(a.y).max(b.y));
        }
        let cols = pixel_range(min.x - pad, max.x + pad, width);
        let rows = pixel_range(min.y - pad, max.y + pad, height);
        if cols.is_empty() || rows.is_empty() {
            return None;
        }
        let stride = (cols.end - cols.start) as usize;
        let mut mask = Self { values: vec![0.0; stride * (rows.end - rows.start) as usize], cols, rows, samples: 0 };

        for &(a, b) in segments {
            for py in pixel_range(a.y.min(b.y) - pad, a.y.max(b.y) + pad, height) {
                let cy = f64::from(py) + 0.5;
                let (x0, x1) = segment_x_span(a, b, cy - pad, cy + pad);
                for px in pixel_range(x0 - pad, x1 + pad, width) {
                    mask.samples += 1;
                    let d = distance_to_segment(pixel_center(px, py), a, b);
                    let coverage = (half_width + 0.5 - d).clamp(0.0, 1.0) as f32;
                    let idx = (py - mask.rows.start) as usize * stride + (px - mask.cols.start) as usize;
                    if coverage > mask.values[idx] {
                        mask.values[idx] = coverage;
                    }
                }
            }
        }
        Some(mask)
    }

    fn apply(&self, target: &mut RgbaImage, color: [u8; 4]) {
        let stride = (self.cols.end - self.cols.start) as usize;
        for py in self.rows.clone() {
            for px in self.cols.clone() {
                let coverage = self.values[(py - self.rows.start) as usize * stride + (px - self.cols.start) as usize];
                if coverage > 0.0 {
                    blend(target.get_pixel_mut(px, py), Rgba(color), f64::from(coverage));
                }
            }
        }
    }
}

/// X extent of segment `ab` restricted to the band `y_lo..=y_hi`.
fn segment_x_span(a: Point, b: Point, y_lo: f64, y_hi: f64) -> (f64, f64) {
    let dy = b.y - a.y;
    if dy.abs() <= f64::EPSILON {
        return (a.x.min(b.x), a.x.max(b.x));
    }
    let t0 = ((y_lo - a.y) / dy).clamp(0.0, 1.0);
    let t1 = ((y_hi - a.y) / dy).clamp(0.0, 1.0);
    let (xa, xb) = (a.x + t0 * (b.x - a.x), a.x + t1 * (b.x - a.x));
    (xa.min(xb), xa.max(xb))
}

fn fill_rect(target: &mut RgbaImage, rect: &Rect, color: [u8; 4]) {
    for py in pixel_range(rect.y, rect.bottom(), target.height()) {
        for px in pixel_range(rect.x, rect.right(), target.width()) {
            blend(target.get_pixel_mut(px, py), Rgba(color), 1.0);
        }
    }
}

fn stroke_rect(target: &mut RgbaImage, rect: &Rect, half_width: f64, color: [u8; 4]) {
    let corners = [
        Point::new(rect.x, rect.y),
        Point::new(rect.right(), rect.y),
        Point::new(rect.right(), rect.bottom()),
        Point::new(rect.x, rect.bottom()),
    ];
    stroke_polyline(target, &corners, true, half_width, color);
}

/// Fill a disc, then stroke its rim.
fn draw_disc(target: &mut RgbaImage, center: Point, radius: f64, fill: [u8; 4], rim: [u8; 4], rim_half_width: f64) {
    let pad = radius + rim_half_width + 1.0;
    for py in pixel_range(center.y - pad, center.y + pad, target.height()) {
        for px in pixel_range(center.x - pad, center.x + pad, target.width()) {
            let d = pixel_center(px, py).distance(center);
            let inside = (radius + 0.5 - d).clamp(0.0, 1.0);
            if inside > 0.0 {
                blend(target.get_pixel_mut(px, py), Rgba(fill), inside);
            }
            let on_rim = (rim_half_width + 0.5 - (d - radius).abs()).clamp(0.0, 1.0);
            if on_rim > 0.0 {
                blend(target.get_pixel_mut(px, py), Rgba(rim), on_rim);
            }
        }
    }
}

// =============================================================
// Backdrop and chrome
// =============================================================

/// Tile the grid pattern over the whole target, under anything drawn later.
fn draw_grid(target: &mut RgbaImage, tile: &RgbaImage) {
    let (tw, th) = tile.dimensions();
    if tw == 0 || th == 0 {
        return;
    }
    for (x, y, px) in target.enumerate_pixels_mut() {
        blend(px, *tile.get_pixel(x % tw, y % th), 1.0);
    }
}

/// Outline the selected image and draw its delete control.
fn draw_selection(target: &mut RgbaImage, view: &RasterView, img: &DroppedImage) {
    let bounds = view.rect_to_pixel(&img.bounds());
    stroke_rect(target, &bounds, 0.5 * view.dpr, SELECTION_BORDER);

    // The control is laid out in screen pixels, then scaled to device pixels.
    let screen_bounds = scale_rect(&bounds, 1.0 / view.dpr);
    let control = img.delete_control;
    let center = control.center(&screen_bounds);
    let center = Point::new(center.x * view.dpr, center.y * view.dpr);
    let unit = control.size * view.dpr / ICON_GRID;
    let half_stroke = ICON_STROKE * unit * 0.5;

    draw_disc(target, center, ICON_RADIUS * unit, DELETE_FILL, WHITE, half_stroke);
    let arm = ICON_ARM * unit;
    let cross = [
        (Point::new(center.x - arm, center.y - arm), Point::new(center.x + arm, center.y + arm)),
        (Point::new(center.x + arm, center.y - arm), Point::new(center.x - arm, center.y + arm)),
    ];
    stroke_segments(target, &cross, half_stroke, WHITE);
}

fn draw_marquee(target: &mut RgbaImage, dpr: f64, screen: Rect) {
    let rect = scale_rect(&screen, dpr);
    fill_rect(target, &rect, MARQUEE_FILL);
    stroke_rect(target, &rect, 0.5 * dpr, MARQUEE_BORDER);
}

// =============================================================
// Helpers
// =============================================================

/// Source-over blend of `src`, with its alpha multiplied by `coverage`.
fn blend(dst: &mut Rgba<u8>, src: Rgba<u8>, coverage: f64) {
    if src[3] == 0 || coverage <= 0.0 {
        return;
    }
    if src[3] == 255 && coverage >= 1.0 {
        *dst = src;
        return;
    }

    let sa = f64::from(src[3]) / 255.0 * coverage.min(1.0);
    let da = f64::from(dst[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return;
    }
    let channel = |i: usize| (f64::from(src[i]) * sa + f64::from(dst[i]) * da * (1.0 - sa)) / out_a;
    *dst = Rgba([to_byte(channel(0)), to_byte(channel(1)), to_byte(channel(2)), to_byte(out_a * 255.0)]);
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_byte(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Pixel columns (or rows) whose area overlaps `[lo, hi)`, clipped to `limit`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn pixel_range(lo: f64, hi: f64, limit: u32) -> Range<u32> {
    if !lo.is_finite() || !hi.is_finite() {
        return 0..0;
    }
    let lo = lo.floor().max(0.0);
    let hi = hi.ceil().min(f64::from(limit));
    if lo >= hi {
        return 0..0;
    }
    lo as u32..hi as u32
}

fn pixel_center(px: u32, py: u32) -> Point {
    Point::new(f64::from(px) + 0.5, f64::from(py) + 0.5)
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    if len2 <= f64::EPSILON {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + t * dx, a.y + t * dy))
}

fn scale_rect(rect: &Rect, k: f64) -> Rect {
    Rect::new(rect.x * k, rect.y * k, rect.width * k, rect.height * k)
}

fn fits_raster_budget(width: u32, height: u32) -> bool {
    u64::from(width) * u64::from(height) <= MAX_RASTER_PIXELS
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_pixel_count(v: f64) -> Option<u32> {
    let v = v.round();
    if !v.is_finite() || v < 1.0 || v > f64::from(u32::MAX) {
        return None;
    }
    Some(v as u32)
}
