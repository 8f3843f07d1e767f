//! Image loading: fetch bytes from a source, decode, validate.
//!
//! DESIGN
//! ======
//! Fetching sits behind the [`ImageSource`] trait so the engine driver can be
//! exercised with in-memory sources. [`HttpImageSource`] handles `http(s)://`
//! URLs through `reqwest` and `file://` URLs or bare paths through `tokio::fs`.
//! Browser-only URLs (`blob:`, `data:`) are rejected as unsupported; a browser
//! host resolves those itself and feeds decoded pixels to
//! [`crate::engine::EngineCore::apply_load`].
//!
//! Every load, fetch and decode together, is bounded by [`load_image`]'s
//! timeout. HTTP bodies are read chunk by chunk and abandoned once they pass
//! the configured size limit.

#[cfg(test)]
#[path = "loader_test.rs"]
mod loader_test;

use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;
use tracing::debug;

use crate::config::CanvasConfig;
use crate::error::LoadError;

/// Decoded RGBA pixels shared between the object that shows them and exports.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pixels: Arc<RgbaImage>,
}

impl DecodedImage {
    /// Wrap pixels, rejecting empty rasters.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::InvalidDimensions`] when either side is zero.
    pub fn new(pixels: RgbaImage) -> Result<Self, LoadError> {
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(LoadError::InvalidDimensions { width, height });
        }
        Ok(Self { pixels: Arc::new(pixels) })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    #[must_use]
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Decode encoded image bytes (PNG, JPEG, WebP, ...) into RGBA.
///
/// # Errors
///
/// Returns [`LoadError::Decode`] for unreadable data and
/// [`LoadError::InvalidDimensions`] for empty images.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, LoadError> {
    let decoded = image::load_from_memory(bytes).map_err(|e| LoadError::Decode(e.to_string()))?;
    DecodedImage::new(decoded.into_rgba8())
}

/// Somewhere image bytes can be fetched from. Enables mocking in tests.
#[async_trait::async_trait]
pub trait ImageSource: Send + Sync {
    /// Fetch the raw encoded bytes behind `url`.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] when the URL cannot be read.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError>;
}

/// Fetch and decode `url`, giving up after `timeout`.
///
/// The bound covers both steps. Decoding runs on the blocking pool so a
/// large image cannot stall the runtime.
///
/// # Errors
///
/// Returns [`LoadError::Timeout`] when the bound elapses, otherwise whatever
/// the source or decoder reports.
pub async fn load_image(source: &dyn ImageSource, url: &str, timeout: Duration) -> Result<DecodedImage, LoadError> {
    load_with(source, url, timeout, decode_image).await
}

type Decoder = fn(&[u8]) -> Result<DecodedImage, LoadError>;

async fn load_with(source: &dyn ImageSource, url: &str, timeout: Duration, decode: Decoder) -> Result<DecodedImage, LoadError> {
    let work = async {
        let bytes = source.fetch(url).await?;
        tokio::task::spawn_blocking(move || decode(&bytes))
            .await
            .map_err(|e| LoadError::Decode(format!("decoder task failed: {e}")))?
    };
    let image = match tokio::time::timeout(timeout, work).await {
        Ok(result) => result?,
        Err(_) => {
            let ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
            return Err(LoadError::Timeout { ms });
        }
    };
    debug!(%url, width = image.width(), height = image.height(), "image decoded");
    Ok(image)
}

/// Fetches images over HTTP(S) or from the local filesystem.
pub struct HttpImageSource {
    http: reqwest::Client,
    max_bytes: u64,
}

impl HttpImageSource {
    /// Build a source using the configured timeouts and size limit.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn new(config: &CanvasConfig) -> Result<Self, LoadError> {
        let http = reqwest::Client::builder()
            .timeout(config.load_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| LoadError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, max_bytes: config.max_image_bytes })
    }

    async fn fetch_http(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        let mut response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| LoadError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            return Err(LoadError::Status { status });
        }
        if let Some(size) = response.content_length() {
            self.check_size(size)?;
        }

        // Chunked bodies carry no length up front; stop once past the limit.
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| LoadError::Request(e.to_string()))? {
            append_capped(&mut body, &chunk, self.max_bytes)?;
        }
        Ok(body)
    }

    async fn fetch_file(&self, path: &str) -> Result<Vec<u8>, LoadError> {
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| LoadError::Io(format!("{path}: {e}")))?;
        self.check_size(meta.len())?;
        tokio::fs::read(path)
            .await
            .map_err(|e| LoadError::Io(format!("{path}: {e}")))
    }

    fn check_size(&self, size: u64) -> Result<(), LoadError> {
        if size > self.max_bytes {
            return Err(LoadError::TooLarge { size, limit: self.max_bytes });
        }
        Ok(())
    }
}

/// Append `chunk` to `body`, failing once the total passes `limit`.
fn append_capped(body: &mut Vec<u8>, chunk: &[u8], limit: u64) -> Result<(), LoadError> {
    let size = (body.len() + chunk.len()) as u64;
    if size > limit {
        return Err(LoadError::TooLarge { size, limit });
    }
    body.extend_from_slice(chunk);
    Ok(())
}

#[async_trait::async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        match classify(url) {
            SourceKind::Http => self.fetch_http(url).await,
            SourceKind::File(path) => self.fetch_file(path).await,
            SourceKind::Unsupported => Err(LoadError::UnsupportedSource(url.to_string())),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum SourceKind<'a> {
    Http,
    File(&'a str),
    Unsupported,
}

fn classify(url: &str) -> SourceKind<'_> {
    if url.starts_with("http://") || url.starts_with("https://") {
        return SourceKind::Http;
    }
    if let Some(path) = url.strip_prefix("file://") {
        return SourceKind::File(path);
    }
    match url.split_once(':') {
        // Windows drive letters look like a one-letter scheme.
        Some((scheme, _)) if scheme.len() > 1 => SourceKind::Unsupported,
        _ if url.is_empty() => SourceKind::Unsupported,
        _ => SourceKind::File(url),
    }
}
