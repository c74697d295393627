//! Core types for the editing session data model.

use std::io::Cursor;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use crate::resources::ResourceHandle;
use crate::utils::{ImageFormat, StudioError, StudioResult};

/// Pixel bounds accepted for target dimensions, matching the service cap.
pub const MIN_DIMENSION: u32 = 1;
pub const MAX_DIMENSION: u32 = 10_000;

/// Current transformation parameter set for one editing session.
///
/// Mutated only through the parameter store's setters, so the set is never
/// partially invalid: dimensions stay within `[1, 10000]`, quality within
/// `[1, 100]`, and `remove_background` implies PNG output.
///
/// Serializes to the flat snake_case key set the service consumes
/// (`width`, `height`, `format`, `quality`, `keep_aspect_ratio`,
/// `remove_background`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformParameters {
    /// Target width in pixels
    #[serde(rename = "width")]
    pub target_width: u32,
    /// Target height in pixels
    #[serde(rename = "height")]
    pub target_height: u32,
    /// Output format
    pub format: ImageFormat,
    /// Quality level (1-100)
    pub quality: u32,
    /// Whether width and height move together per the native ratio
    pub keep_aspect_ratio: bool,
    /// Whether the service should segment out the background
    pub remove_background: bool,
}

/// Source image for one editing session. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct SourceImage {
    bytes: Bytes,
    native_width: u32,
    native_height: u32,
    mime_type: String,
}

impl SourceImage {
    /// Creates a source image from known metadata.
    ///
    /// Both native dimensions must be at least one pixel.
    pub fn new(
        bytes: Bytes,
        native_width: u32,
        native_height: u32,
        mime_type: impl Into<String>,
    ) -> StudioResult<Self> {
        if native_width == 0 || native_height == 0 {
            return Err(StudioError::image(format!(
                "Source dimensions must be non-zero, got {}x{}",
                native_width, native_height
            )));
        }
        Ok(Self {
            bytes,
            native_width,
            native_height,
            mime_type: mime_type.into(),
        })
    }

    /// Creates a source image by sniffing the container header.
    ///
    /// Reads only the header for dimensions and format; pixel data is
    /// never decoded on this side of the service boundary.
    pub fn from_bytes(bytes: Bytes) -> StudioResult<Self> {
        let reader = image::ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()
            .map_err(|e| StudioError::image(format!("Unreadable image header: {e}")))?;
        let format = reader
            .format()
            .ok_or_else(|| StudioError::image("Unrecognized image container"))?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| StudioError::image(format!("Failed to read dimensions: {e}")))?;
        Self::new(bytes, width, height, format.to_mime_type())
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn native_width(&self) -> u32 {
        self.native_width
    }

    pub fn native_height(&self) -> u32 {
        self.native_height
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Format implied by the source MIME type; seeds the initial parameters.
    pub fn format(&self) -> ImageFormat {
        ImageFormat::from_mime(&self.mime_type)
    }

    /// Byte size of the raw source file
    pub fn byte_size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Authoritative outcome of one applied transform request.
///
/// Owns the processed blob's handle; installing a newer result into the
/// comparison revokes it.
#[derive(Debug)]
pub struct ProcessingResult {
    pub(crate) handle: ResourceHandle,
    /// Encoded size of the processed image in bytes
    pub byte_size: u64,
    /// Processed width in pixels
    pub width: u32,
    /// Processed height in pixels
    pub height: u32,
    /// Format the service actually encoded
    pub format: ImageFormat,
}

impl ProcessingResult {
    pub fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}
