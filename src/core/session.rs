//! Editing session: component wiring and lifecycle.
//!
//! An [`EditSession`] owns everything for one source image: the parameter
//! store, the resource table, the comparison pair, and the driver task
//! that turns settled parameter changes into transform dispatches. The
//! presentation layer talks only to this type.

use std::sync::{Arc, Mutex};
use bytes::Bytes;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::core::comparison::Comparison;
use crate::core::store::ParameterStore;
use crate::core::types::{SourceImage, TransformParameters};
use crate::processing::coordinator::{RequestCoordinator, SessionState};
use crate::processing::debounce::{DebounceConfig, Debouncer};
use crate::processing::service::TransformService;
use crate::resources::{ResourceTable, ResourceView};
use crate::utils::{ImageFormat, StudioError, StudioResult};

/// Configuration for one editing session.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub debounce: DebounceConfig,
}

/// Resolved snapshot of the comparison pair, read atomically under the
/// session lock so a swap never yields a half-updated pair.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub original: ResourceView,
    pub processed: Option<ProcessedView>,
}

/// Processed side of the comparison plus its display metadata.
#[derive(Debug, Clone)]
pub struct ProcessedView {
    pub view: ResourceView,
    pub byte_size: u64,
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

/// One interactive editing session over a single source image.
///
/// Must be created inside a Tokio runtime; the constructor spawns the
/// debounce driver. A fresh session schedules an initial render after one
/// quiet period, so the comparison populates without user input.
pub struct EditSession {
    source: Arc<SourceImage>,
    resources: Arc<ResourceTable>,
    store: Mutex<ParameterStore>,
    state: Arc<Mutex<SessionState>>,
    coordinator: Arc<RequestCoordinator>,
    driver: JoinHandle<()>,
}

impl EditSession {
    pub fn new(
        source: SourceImage,
        service: Arc<dyn TransformService>,
        config: SessionConfig,
    ) -> Self {
        let source = Arc::new(source);
        let resources = Arc::new(ResourceTable::new());
        let original = resources.materialize(source.bytes().clone(), source.mime_type());
        let state = Arc::new(Mutex::new(SessionState::new(Comparison::new(original))));

        let store = ParameterStore::new(&source);
        let mut debouncer = Debouncer::new(store.subscribe(), config.debounce);
        debouncer.prime();

        let coordinator = Arc::new(RequestCoordinator::new(
            service,
            Arc::clone(&resources),
            Arc::clone(&source),
            Arc::clone(&state),
        ));

        let driver = tokio::spawn({
            let coordinator = Arc::clone(&coordinator);
            async move {
                while let Some(params) = debouncer.settled().await {
                    coordinator.dispatch(params);
                }
                debug!("Parameter stream closed; driver exiting");
            }
        });

        debug!(
            "Session opened: {}x{} {} ({} bytes)",
            source.native_width(),
            source.native_height(),
            source.mime_type(),
            source.byte_size()
        );

        Self {
            source,
            resources,
            store: Mutex::new(store),
            state,
            coordinator,
            driver,
        }
    }

    pub fn source(&self) -> &SourceImage {
        &self.source
    }

    pub fn resources(&self) -> Arc<ResourceTable> {
        Arc::clone(&self.resources)
    }

    /// Snapshot of the current parameters.
    pub fn params(&self) -> TransformParameters {
        self.store.lock().expect("parameter store lock poisoned").current()
    }

    /// Width-derived scale readout in percent (informational).
    pub fn scale_percent(&self) -> u32 {
        self.store.lock().expect("parameter store lock poisoned").scale_percent()
    }

    pub fn set_width(&self, width: u32) -> StudioResult<()> {
        self.store().set_width(width)
    }

    pub fn set_height(&self, height: u32) -> StudioResult<()> {
        self.store().set_height(height)
    }

    pub fn set_scale(&self, percent: u32) -> StudioResult<()> {
        self.store().set_scale(percent)
    }

    pub fn set_format(&self, format: ImageFormat) -> StudioResult<()> {
        self.store().set_format(format)
    }

    pub fn set_quality(&self, quality: u32) -> StudioResult<()> {
        self.store().set_quality(quality)
    }

    pub fn set_keep_aspect_ratio(&self, locked: bool) -> StudioResult<()> {
        self.store().set_keep_aspect_ratio(locked)
    }

    pub fn set_remove_background(&self, enabled: bool) -> StudioResult<()> {
        self.store().set_remove_background(enabled)
    }

    /// Restores native dimensions (scale 100%).
    pub fn reset(&self) -> StudioResult<()> {
        self.store().reset()
    }

    fn store(&self) -> std::sync::MutexGuard<'_, ParameterStore> {
        self.store.lock().expect("parameter store lock poisoned")
    }

    /// Whether any dispatched request is still awaiting resolution.
    pub fn is_processing(&self) -> bool {
        self.state().in_flight > 0
    }

    /// Current session-level error banner, if any.
    pub fn last_error(&self) -> Option<String> {
        self.state().last_error.clone()
    }

    /// Dismisses and returns the error banner.
    pub fn take_error(&self) -> Option<String> {
        self.state().last_error.take()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().expect("session state lock poisoned")
    }

    /// Resolves the comparison pair for rendering.
    ///
    /// After a failed reprocess this still returns the last good result;
    /// the view never blanks because of a failure.
    pub fn view(&self) -> StudioResult<SessionView> {
        let state = self.state();
        let original_handle = state
            .comparison
            .original()
            .ok_or_else(|| StudioError::resource("Session is closed"))?;
        let original = self.resources.open(original_handle)?;
        let processed = state
            .comparison
            .processed()
            .map(|result| -> StudioResult<ProcessedView> {
                Ok(ProcessedView {
                    view: self.resources.open(result.handle())?,
                    byte_size: result.byte_size,
                    width: result.width,
                    height: result.height,
                    format: result.format,
                })
            })
            .transpose()?;
        Ok(SessionView {
            original,
            processed,
        })
    }

    /// Requests the final file with the current parameters.
    pub async fn download(&self) -> StudioResult<Bytes> {
        self.download_as(None).await
    }

    /// Requests the final file, optionally overriding the output format.
    ///
    /// Runs outside the live-preview epoch protocol: it may overlap an
    /// in-flight preview request and never touches the comparison.
    pub async fn download_as(&self, format_override: Option<ImageFormat>) -> StudioResult<Bytes> {
        let mut params = self.params();
        if let Some(format) = format_override {
            params.format = format;
        }
        self.coordinator.download(&params).await
    }

    /// File name for a saved result: `<stem>_nobg.png` when the
    /// background was removed, `<stem>_compressed.<ext>` otherwise.
    pub fn suggested_file_name(&self, stem: &str) -> String {
        let params = self.params();
        let suffix = if params.remove_background {
            "_nobg"
        } else {
            "_compressed"
        };
        format!("{stem}{suffix}.{}", params.format.primary_extension())
    }

    /// Closes the session: stops the driver, dooms in-flight requests,
    /// revokes both comparison handles, and audits the resource table.
    pub fn close(self) {
        let resources = Arc::clone(&self.resources);
        drop(self);
        let leaked = resources.live();
        if leaked > 0 {
            warn!("Resource audit: {} live handles after session close", leaked);
            debug_assert!(false, "session leaked {leaked} handles");
        } else {
            debug!("Session closed; resource audit clean");
        }
    }
}

impl Drop for EditSession {
    fn drop(&mut self) {
        self.driver.abort();
        if let Ok(mut state) = self.state.lock() {
            // Bumping the epoch makes any still-running resolution stale,
            // so nothing materializes into the table after this point.
            state.latest_epoch += 1;
            state.comparison.close(&self.resources);
        }
    }
}

#[cfg(test)]
mod tests {
    // Session behavior is covered end-to-end in tests/session_pipeline.rs;
    // only the pure helpers live here.
    use super::*;
    use async_trait::async_trait;
    use crate::processing::service::TransformOutput;

    struct NoopService;

    #[async_trait]
    impl TransformService for NoopService {
        async fn transform(
            &self,
            _image: &SourceImage,
            _params: &TransformParameters,
        ) -> StudioResult<TransformOutput> {
            Err(StudioError::service("unused"))
        }

        async fn download(
            &self,
            _image: &SourceImage,
            _params: &TransformParameters,
        ) -> StudioResult<Bytes> {
            Err(StudioError::service("unused"))
        }
    }

    #[tokio::test]
    async fn suggested_file_name_follows_parameters() {
        let source =
            SourceImage::new(Bytes::from_static(b"img"), 100, 100, "image/jpeg").unwrap();
        let session = EditSession::new(source, Arc::new(NoopService), SessionConfig::default());

        assert_eq!(session.suggested_file_name("photo"), "photo_compressed.jpg");
        session.set_remove_background(true).unwrap();
        assert_eq!(session.suggested_file_name("photo"), "photo_nobg.png");
        session.close();
    }
}
