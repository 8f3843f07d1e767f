//! Error types for loading, exporting, and drop payload handling.
//!
//! None of these escape the engine's public input handlers: they are logged
//! and surfaced to the host as [`crate::engine::Notice`]s instead.

/// Errors produced while fetching or decoding an image.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The load did not finish within the configured bound.
    #[error("image load timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// The HTTP request could not be completed.
    #[error("image request failed: {0}")]
    Request(String),

    /// The server answered with a non-success status.
    #[error("image request returned status {status}")]
    Status { status: u16 },

    /// A local file could not be read.
    #[error("image read failed: {0}")]
    Io(String),

    /// The body exceeded the configured byte limit.
    #[error("image is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },

    /// The bytes are not a decodable image.
    #[error("image decode failed: {0}")]
    Decode(String),

    /// The decoded image has a zero width or height.
    #[error("image has invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// The URL scheme cannot be fetched by this source.
    #[error("unsupported image source: {0}")]
    UnsupportedSource(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

/// Errors produced while encoding an exported composite.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The raster has no pixels.
    #[error("nothing to export: raster is {width}x{height}")]
    Empty { width: u32, height: u32 },

    /// The PNG encoder rejected the raster.
    #[error("PNG encode failed: {0}")]
    Encode(String),
}

/// Errors produced while parsing or validating a drop payload.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// The drag data is not valid payload JSON.
    #[error("drop payload parse failed: {0}")]
    Parse(String),

    /// The payload carries no image URL.
    #[error("drop payload has no url")]
    MissingUrl,

    /// The attached file is not an image.
    #[error("dropped file type '{mime}' is not an image")]
    NotAnImage { mime: String },

    /// The attached file is larger than allowed.
    #[error("dropped file is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },
}
