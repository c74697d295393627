//! Debounced scheduling and epoch-ordered execution of transform requests.
//!
//! - [`Debouncer`]: coalesces parameter bursts into settled snapshots
//! - [`TransformService`]: boundary trait for the remote service
//! - [`HttpTransformService`]: production client over the HTTP surface

pub mod debounce;
pub mod http;
pub mod service;

pub(crate) mod coordinator;

pub use debounce::{DebounceConfig, Debouncer};
pub use http::{HttpServiceConfig, HttpTransformService, ProcessMetadata, ServiceFeatures};
pub use service::{TransformOutput, TransformService};
