//! Epoch-ordered dispatch of transform requests.
//!
//! Each dispatched request is tagged with a monotonically increasing
//! epoch. A response applies only while its epoch is still the latest
//! one dispatched; anything older is discarded, so a slow response to an
//! old parameter set can never overwrite a newer result. In-flight
//! requests are never hard-cancelled; the epoch check is the logical
//! cancellation.

use std::sync::{Arc, Mutex};
use bytes::Bytes;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use crate::core::{Comparison, ProcessingResult, SourceImage, TransformParameters};
use crate::processing::service::TransformService;
use crate::resources::ResourceTable;
use crate::utils::StudioResult;

/// Per-session mutable state shared between the dispatch and resolution
/// paths. Epoch counter, comparison slots, and the error banner live
/// behind one lock so payload bookkeeping and result installation never
/// interleave mid-update.
#[derive(Debug)]
pub(crate) struct SessionState {
    pub(crate) comparison: Comparison,
    /// Session-level error banner; overwritten by the next attempt
    pub(crate) last_error: Option<String>,
    /// Epoch of the most recently dispatched request
    pub(crate) latest_epoch: u64,
    /// Number of requests currently awaiting resolution
    pub(crate) in_flight: u32,
}

impl SessionState {
    pub(crate) fn new(comparison: Comparison) -> Self {
        Self {
            comparison,
            last_error: None,
            latest_epoch: 0,
            in_flight: 0,
        }
    }
}

/// Issues transform requests for settled parameter sets and applies the
/// results in epoch order.
pub(crate) struct RequestCoordinator {
    service: Arc<dyn TransformService>,
    resources: Arc<ResourceTable>,
    source: Arc<SourceImage>,
    state: Arc<Mutex<SessionState>>,
}

impl RequestCoordinator {
    pub(crate) fn new(
        service: Arc<dyn TransformService>,
        resources: Arc<ResourceTable>,
        source: Arc<SourceImage>,
        state: Arc<Mutex<SessionState>>,
    ) -> Self {
        Self {
            service,
            resources,
            source,
            state,
        }
    }

    /// Dispatches one transform request for a settled parameter set.
    ///
    /// Returns the assigned epoch and the resolution task's handle. The
    /// caller does not have to await the handle; resolution applies or
    /// discards the response on its own.
    pub(crate) fn dispatch(&self, params: TransformParameters) -> (u64, JoinHandle<()>) {
        let epoch = {
            let mut state = self.state.lock().expect("session state lock poisoned");
            state.latest_epoch += 1;
            state.in_flight += 1;
            state.latest_epoch
        };
        debug!(
            "Dispatching transform (epoch {}): {}x{} {} q{}",
            epoch, params.target_width, params.target_height, params.format, params.quality
        );

        let service = Arc::clone(&self.service);
        let resources = Arc::clone(&self.resources);
        let source = Arc::clone(&self.source);
        let state = Arc::clone(&self.state);

        let handle = tokio::spawn(async move {
            let outcome = service.transform(&source, &params).await;

            let mut state = state.lock().expect("session state lock poisoned");
            state.in_flight -= 1;

            if epoch != state.latest_epoch {
                debug!(
                    "Discarding stale response for epoch {} (latest is {})",
                    epoch, state.latest_epoch
                );
                return;
            }

            match outcome {
                Ok(output) => {
                    debug!(
                        "Applying result for epoch {}: {} bytes, {}x{}",
                        epoch, output.byte_size, output.width, output.height
                    );
                    let handle = resources.materialize(output.bytes, output.format.mime_type());
                    state.comparison.install(
                        ProcessingResult {
                            handle,
                            byte_size: output.byte_size,
                            width: output.width,
                            height: output.height,
                            format: output.format,
                        },
                        &resources,
                    );
                    state.last_error = None;
                }
                Err(err) => {
                    // The previous result keeps rendering; only the banner updates.
                    warn!("Transform for epoch {} failed: {}", epoch, err);
                    state.last_error = Some(err.to_string());
                }
            }
        });

        (epoch, handle)
    }

    /// One-shot save request, outside the epoch protocol.
    pub(crate) async fn download(&self, params: &TransformParameters) -> StudioResult<Bytes> {
        self.service.download(&self.source, params).await
    }
}
