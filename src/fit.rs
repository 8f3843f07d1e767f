//! Background fit and dropped-image placement.
//!
//! The background is scaled to fit the container minus a control strip
//! reserved at the bottom, then centered in the remaining area. Dropped
//! images get a smaller initial scale so they land as thumbnails.

#[cfg(test)]
#[path = "fit_test.rs"]
mod fit_test;

use crate::consts::{MAX_PLACEMENT_SCALE, MIN_PLACEMENT_SCALE, PLACEMENT_SCALE_CAP};

/// Where and how large the background is drawn, in logical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fit {
    pub scale: f64,
    pub left: f64,
    pub top: f64,
}

/// Fit an image into the container above a reserved bottom strip.
///
/// Returns `None` when the image or the available area has no extent.
#[must_use]
pub fn fit(image_width: f64, image_height: f64, container_width: f64, container_height: f64, reserved_bottom: f64) -> Option<Fit> {
    let available_height = container_height - reserved_bottom.max(0.0);
    let sizes = [image_width, image_height, container_width, available_height];
    if sizes.iter().any(|v| !v.is_finite() || *v <= 0.0) {
        return None;
    }

    let scale = (container_width / image_width).min(available_height / image_height);
    let left = (container_width - image_width * scale) * 0.5;
    let top = (available_height - image_height * scale) * 0.5;
    Some(Fit { scale, left, top })
}

/// Initial scale of a dropped image: fit inside a `max_size` box, never
/// larger than the cap, then clamped to the placement range.
#[must_use]
pub fn placement_scale(image_width: f64, image_height: f64, max_size: f64) -> Option<f64> {
    if [image_width, image_height].iter().any(|v| !v.is_finite() || *v <= 0.0) {
        return None;
    }
    let scale = (max_size / image_width).min(max_size / image_height).min(PLACEMENT_SCALE_CAP);
    if scale.is_nan() {
        return None;
    }
    Some(scale.clamp(MIN_PLACEMENT_SCALE, MAX_PLACEMENT_SCALE))
}
