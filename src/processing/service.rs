//! Transform service boundary.
//!
//! The remote service is a pure function from the core's perspective: it
//! takes the source bytes plus a parameter set and returns a transformed
//! image with metadata. Implementations live behind this trait so the
//! pipeline can be driven by the HTTP client in production and by mocks
//! in tests.

use async_trait::async_trait;
use bytes::Bytes;
use crate::core::{SourceImage, TransformParameters};
use crate::utils::{ImageFormat, StudioResult};

/// Success payload of a transform call.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    /// Encoded image bytes for display
    pub bytes: Bytes,
    /// Encoded size in bytes
    pub byte_size: u64,
    /// Processed width in pixels
    pub width: u32,
    /// Processed height in pixels
    pub height: u32,
    /// Format the service actually encoded
    pub format: ImageFormat,
}

/// The two boundary operations the core consumes.
#[async_trait]
pub trait TransformService: Send + Sync {
    /// Re-encodes the image under `params` for the live preview.
    async fn transform(
        &self,
        image: &SourceImage,
        params: &TransformParameters,
    ) -> StudioResult<TransformOutput>;

    /// Produces the final file for an explicit save. Independent of the
    /// live-preview epoch protocol.
    async fn download(
        &self,
        image: &SourceImage,
        params: &TransformParameters,
    ) -> StudioResult<Bytes>;
}
