//! Interactive image tuning core.
//!
//! Models transformation parameters for a remote image service, derives
//! dependent dimensions under a locked aspect ratio, debounces parameter
//! bursts into single re-render requests, orders overlapping responses by
//! epoch, and owns the revocable handles backing the before/after
//! comparison view.

// Module declarations in dependency order
pub mod utils;
pub mod resources;
pub mod core;
pub mod processing;

// Public exports for external consumers
pub use crate::core::{
    AspectRatio, EditSession, ParameterStore, ProcessedView, ProcessingResult, SessionConfig,
    SessionView, SourceImage, TransformParameters,
};
pub use crate::processing::{
    DebounceConfig, Debouncer, HttpServiceConfig, HttpTransformService, ServiceFeatures,
    TransformOutput, TransformService,
};
pub use crate::resources::{ResourceHandle, ResourceTable, ResourceView};
pub use crate::utils::{ImageFormat, StudioError, StudioResult, ValidationError};
