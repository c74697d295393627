use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::utils::StudioError;

/// Output formats accepted by the transform service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    JPEG,
    PNG,
    WebP,
}

impl ImageFormat {
    /// Whether the format can carry an alpha channel.
    ///
    /// Background removal forces PNG because it is the only lossless
    /// alpha-capable encoding in this set.
    pub fn supports_transparency(&self) -> bool {
        !matches!(self, Self::JPEG)
    }

    /// Get file extensions associated with this format
    pub fn extensions(&self) -> &[&str] {
        match self {
            Self::JPEG => &["jpg", "jpeg"],
            Self::PNG => &["png"],
            Self::WebP => &["webp"],
        }
    }

    /// Get the primary extension for this format
    pub fn primary_extension(&self) -> &str {
        self.extensions()[0]
    }

    /// MIME type used when materializing a processed blob
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::JPEG => "image/jpeg",
            Self::PNG => "image/png",
            Self::WebP => "image/webp",
        }
    }

    /// Map a source MIME type to its format, defaulting to JPEG for
    /// anything unrecognized.
    pub fn from_mime(mime: &str) -> Self {
        if mime.contains("png") {
            Self::PNG
        } else if mime.contains("webp") {
            Self::WebP
        } else {
            Self::JPEG
        }
    }

    /// Wire name used in the flat query parameter set
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            Self::JPEG => "jpeg",
            Self::PNG => "png",
            Self::WebP => "webp",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire_str())
    }
}

impl FromStr for ImageFormat {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(Self::JPEG),
            "png" => Ok(Self::PNG),
            "webp" => Ok(Self::WebP),
            _ => Err(StudioError::image(format!(
                "Unsupported image format: {}", s
            ))),
        }
    }
}
