//! Shared numeric constants for the canvas crate.

// ── Viewport ────────────────────────────────────────────────────

/// Smallest allowed viewport scale.
pub const MIN_ZOOM: f64 = 0.1;

/// Largest allowed viewport scale.
pub const MAX_ZOOM: f64 = 20.0;

/// Base of the exponential wheel zoom: `scale *= WHEEL_ZOOM_BASE ^ delta_y`.
pub const WHEEL_ZOOM_BASE: f64 = 0.999;

// ── Touch gestures ──────────────────────────────────────────────

/// Pinch ratios within `1 ± PINCH_DEAD_ZONE` are treated as jitter.
pub const PINCH_DEAD_ZONE: f64 = 0.02;

/// Two-finger center movement (screen pixels) below which no pan is emitted.
pub const TOUCH_PAN_THRESHOLD_PX: f64 = 3.0;

// ── Placement ───────────────────────────────────────────────────

/// Side of the box a dropped image is fitted into, in logical units.
pub const MAX_PLACEMENT_SIZE: f64 = 200.0;

/// Upper bound on the initial scale of a dropped image, before clamping.
pub const PLACEMENT_SCALE_CAP: f64 = 0.3;

/// Clamp range for the initial scale of a dropped image.
pub const MIN_PLACEMENT_SCALE: f64 = 0.1;
pub const MAX_PLACEMENT_SCALE: f64 = 2.0;

/// Height of the control strip kept free at the bottom of the container.
pub const DEFAULT_RESERVED_BOTTOM_PX: f64 = 332.0;

// ── Delete affordance ───────────────────────────────────────────

/// Delete icon diameter in screen pixels.
pub const DELETE_CONTROL_SIZE_PX: f64 = 24.0;

/// Offset of the delete icon center from the object's top-right corner.
pub const DELETE_CONTROL_OFFSET_X_PX: f64 = 16.0;
pub const DELETE_CONTROL_OFFSET_Y_PX: f64 = -16.0;

// ── Paths ───────────────────────────────────────────────────────

/// Stroke width of drawn paths in logical units.
pub const PATH_STROKE_WIDTH: f64 = 2.0;

/// Stroke color of drawn paths.
pub const PATH_STROKE_COLOR: [u8; 4] = [0xff, 0x00, 0x00, 0xff];

// ── Rasters ─────────────────────────────────────────────────────

/// Largest grid cell, in pixels, that gets a tile.
pub const MAX_GRID_TILE_PX: f64 = 1024.0;

/// Largest raster the renderer will allocate (64 megapixels).
pub const MAX_RASTER_PIXELS: u64 = 64 * 1024 * 1024;

// ── Loading ─────────────────────────────────────────────────────

pub const DEFAULT_LOAD_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// 10 MiB ceiling for declared and fetched image sizes.
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

// ── Drop monitor ────────────────────────────────────────────────

/// Number of drop records kept by the monitor.
pub const DROP_HISTORY_LIMIT: usize = 100;

/// Drops slower than this are logged as a warning.
pub const SLOW_DROP_MS: f64 = 1000.0;
