//! Composite export: rasterize the object stack without live-view chrome.
//!
//! Two shapes are offered. [`export_full`] is what the viewport shows, at
//! device resolution. [`export_cropped_to_background`] is the background's
//! displayed region re-rendered at the background's native resolution, so
//! its size never depends on zoom or pan. Neither includes the grid,
//! the selection outline, or delete controls.

#[cfg(test)]
#[path = "export_test.rs"]
mod export_test;

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, RgbaImage};
use tracing::debug;

use crate::camera::ViewportTransform;
use crate::doc::DocStore;
use crate::error::ExportError;
use crate::render::{self, RasterView};

/// File name given to the composite handed to the submission layer.
pub const COMPOSITE_FILE_NAME: &str = "composite-image.png";
pub const COMPOSITE_MIME: &str = "image/png";

/// An encoded composite ready to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl CompositeFile {
    /// Encode a raster as `composite-image.png`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] if the raster is empty or PNG encoding fails.
    pub fn from_raster(raster: &RgbaImage) -> Result<Self, ExportError> {
        Ok(Self { name: COMPOSITE_FILE_NAME.into(), mime: COMPOSITE_MIME.into(), bytes: encode_png(raster)? })
    }
}

/// Render whatever the viewport shows, scaled by the device pixel ratio.
///
/// Returns `None` when the viewport has no area.
#[must_use]
pub fn export_full(doc: &DocStore, viewport: &ViewportTransform, width: f64, height: f64, dpr: f64) -> Option<RgbaImage> {
    let view = RasterView::from_viewport(viewport, width, height, dpr)?;
    let mut out = view.blank();
    render::draw_objects(&mut out, doc, &view);
    debug!(width = view.width, height = view.height, "exported full canvas");
    Some(out)
}

/// Render the background's displayed region at its native resolution.
///
/// Returns `None` when there is no background.
#[must_use]
pub fn export_cropped_to_background(doc: &DocStore) -> Option<RgbaImage> {
    let background = doc.background()?;
    let view = RasterView::cropped_to(background)?;
    let mut out = view.blank();
    render::draw_objects(&mut out, doc, &view);
    debug!(
        width = view.width,
        height = view.height,
        multiplier = view.scale,
        "exported composite cropped to background"
    );
    Some(out)
}

/// Encode a raster as PNG.
///
/// # Errors
///
/// Returns [`ExportError::Empty`] for a zero-sized raster and
/// [`ExportError::Encode`] if the encoder fails.
pub fn encode_png(raster: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let (width, height) = raster.dimensions();
    if width == 0 || height == 0 {
        return Err(ExportError::Empty { width, height });
    }
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(raster.as_raw(), width, height, ColorType::Rgba8)
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    Ok(bytes)
}
