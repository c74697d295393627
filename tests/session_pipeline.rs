//! End-to-end pipeline tests: debounced scheduling, epoch ordering,
//! failure handling, and the resource audit, driven through the public
//! session API against a scripted transform service on a paused clock.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::time::sleep;

use image_studio::{
    EditSession, ImageFormat, SessionConfig, SourceImage, StudioError, StudioResult,
    TransformOutput, TransformParameters, TransformService,
};

/// Scripted stand-in for the remote service: records every call, applies
/// a per-call virtual delay and optional failure, then echoes a payload
/// derived from the parameters it was given.
struct ScriptedService {
    calls: Mutex<Vec<TransformParameters>>,
    call_tx: mpsc::UnboundedSender<TransformParameters>,
    delays: Mutex<VecDeque<Duration>>,
    failures: Mutex<VecDeque<bool>>,
}

impl ScriptedService {
    fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<TransformParameters>) {
        let (call_tx, call_rx) = mpsc::unbounded_channel();
        let service = Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            call_tx,
            delays: Mutex::new(VecDeque::new()),
            failures: Mutex::new(VecDeque::new()),
        });
        (service, call_rx)
    }

    fn script_delays(&self, delays: impl IntoIterator<Item = Duration>) {
        self.delays.lock().unwrap().extend(delays);
    }

    fn script_failures(&self, failures: impl IntoIterator<Item = bool>) {
        self.failures.lock().unwrap().extend(failures);
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn payload_for(params: &TransformParameters) -> Vec<u8> {
        format!(
            "render {}x{} {} q{}",
            params.target_width, params.target_height, params.format, params.quality
        )
        .into_bytes()
    }
}

#[async_trait]
impl TransformService for ScriptedService {
    async fn transform(
        &self,
        _image: &SourceImage,
        params: &TransformParameters,
    ) -> StudioResult<TransformOutput> {
        let delay = self.delays.lock().unwrap().pop_front().unwrap_or_default();
        let fail = self.failures.lock().unwrap().pop_front().unwrap_or(false);
        self.calls.lock().unwrap().push(params.clone());
        self.call_tx.send(params.clone()).ok();

        if !delay.is_zero() {
            sleep(delay).await;
        }
        if fail {
            return Err(StudioError::service("simulated processing failure"));
        }
        let payload = Self::payload_for(params);
        Ok(TransformOutput {
            byte_size: payload.len() as u64,
            bytes: Bytes::from(payload),
            width: params.target_width,
            height: params.target_height,
            format: params.format,
        })
    }

    async fn download(
        &self,
        _image: &SourceImage,
        params: &TransformParameters,
    ) -> StudioResult<Bytes> {
        Ok(Bytes::from(Self::payload_for(params)))
    }
}

fn session_with(service: Arc<ScriptedService>) -> EditSession {
    let source = SourceImage::new(Bytes::from_static(b"source bytes"), 4000, 3000, "image/jpeg")
        .expect("valid source");
    EditSession::new(source, service, SessionConfig::default())
}

/// Waits (on the paused clock) until no request is awaiting resolution.
async fn until_idle(session: &EditSession) {
    while session.is_processing() {
        sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test(start_paused = true)]
async fn initial_render_populates_the_comparison() {
    let (service, mut calls) = ScriptedService::new();
    let session = session_with(Arc::clone(&service));

    let params = calls.recv().await.unwrap();
    assert_eq!(params.target_width, 4000);
    assert_eq!(params.target_height, 3000);
    assert_eq!(params.format, ImageFormat::JPEG);
    until_idle(&session).await;

    let view = session.view().unwrap();
    assert_eq!(&view.original.bytes[..], b"source bytes");
    let processed = view.processed.expect("initial render applied");
    assert_eq!(&processed.view.bytes[..], b"render 4000x3000 jpeg q80");
    assert_eq!(processed.byte_size, processed.view.bytes.len() as u64);
    assert_eq!((processed.width, processed.height), (4000, 3000));
    assert!(session.last_error().is_none());

    session.close();
}

#[tokio::test(start_paused = true)]
async fn burst_of_changes_dispatches_once_with_last_parameters() {
    let (service, mut calls) = ScriptedService::new();
    let session = session_with(Arc::clone(&service));

    // All inside one quiet period, merging with the initial render too.
    session.set_width(2000).unwrap();
    session.set_quality(50).unwrap();
    session.set_format(ImageFormat::WebP).unwrap();

    let params = calls.recv().await.unwrap();
    assert_eq!(params.target_width, 2000);
    assert_eq!(params.target_height, 1500); // derived under the lock
    assert_eq!(params.quality, 50);
    assert_eq!(params.format, ImageFormat::WebP);
    until_idle(&session).await;

    // A long idle stretch produces nothing further.
    sleep(Duration::from_secs(5)).await;
    assert_eq!(service.call_count(), 1);

    let processed = session.view().unwrap().processed.unwrap();
    assert_eq!(&processed.view.bytes[..], b"render 2000x1500 webp q50");

    session.close();
}

#[tokio::test(start_paused = true)]
async fn settled_changes_dispatch_separately() {
    let (service, mut calls) = ScriptedService::new();
    let session = session_with(Arc::clone(&service));

    let first = calls.recv().await.unwrap();
    assert_eq!(first.target_width, 4000);
    until_idle(&session).await;

    session.set_width(3000).unwrap();
    let second = calls.recv().await.unwrap();
    assert_eq!(second.target_width, 3000);
    assert_eq!(second.target_height, 2250);
    until_idle(&session).await;

    assert_eq!(service.call_count(), 2);
    session.close();
}

#[tokio::test(start_paused = true)]
async fn stale_response_does_not_overwrite_newer_result() {
    let (service, mut calls) = ScriptedService::new();
    // First request takes 10s to come back; the second returns in 1s.
    service.script_delays([Duration::from_secs(10), Duration::from_secs(1)]);
    let session = session_with(Arc::clone(&service));

    let first = calls.recv().await.unwrap();
    assert_eq!(first.target_width, 4000);

    // Parameter change while the first request is in flight.
    session.set_width(2000).unwrap();
    let second = calls.recv().await.unwrap();
    assert_eq!(second.target_width, 2000);

    // Both responses have resolved once the session is idle; only the
    // newer one may be visible.
    until_idle(&session).await;
    assert_eq!(service.call_count(), 2);
    let processed = session.view().unwrap().processed.unwrap();
    assert_eq!(&processed.view.bytes[..], b"render 2000x1500 jpeg q80");
    assert!(session.last_error().is_none());

    // Original + current processed; the discarded response left nothing.
    assert_eq!(session.resources().live(), 2);
    session.close();
}

#[tokio::test(start_paused = true)]
async fn failure_keeps_previous_result_and_raises_banner() {
    let (service, mut calls) = ScriptedService::new();
    service.script_failures([false, true]);
    let session = session_with(Arc::clone(&service));

    calls.recv().await.unwrap();
    until_idle(&session).await;
    let good = session.view().unwrap().processed.unwrap();
    assert_eq!(&good.view.bytes[..], b"render 4000x3000 jpeg q80");

    session.set_quality(30).unwrap();
    calls.recv().await.unwrap();
    until_idle(&session).await;

    // The failed reprocess never blanks the comparison.
    let still_good = session.view().unwrap().processed.unwrap();
    assert_eq!(&still_good.view.bytes[..], b"render 4000x3000 jpeg q80");
    let banner = session.last_error().expect("error surfaced");
    assert!(banner.contains("simulated processing failure"));

    // Dismissing clears the single error slot.
    assert!(session.take_error().is_some());
    assert!(session.last_error().is_none());

    session.close();
}

#[tokio::test(start_paused = true)]
async fn recovery_clears_the_banner() {
    let (service, mut calls) = ScriptedService::new();
    service.script_failures([true, false]);
    let session = session_with(Arc::clone(&service));

    calls.recv().await.unwrap();
    until_idle(&session).await;
    assert!(session.last_error().is_some());
    assert!(session.view().unwrap().processed.is_none());

    session.set_quality(60).unwrap();
    calls.recv().await.unwrap();
    until_idle(&session).await;

    assert!(session.last_error().is_none());
    assert!(session.view().unwrap().processed.is_some());

    session.close();
}

#[tokio::test(start_paused = true)]
async fn rejected_input_schedules_nothing() {
    let (service, mut calls) = ScriptedService::new();
    let session = session_with(Arc::clone(&service));

    calls.recv().await.unwrap();
    until_idle(&session).await;

    assert!(session.set_width(0).is_err());
    assert!(session.set_width(10_001).is_err());
    assert_eq!(session.params().target_width, 4000);

    sleep(Duration::from_secs(5)).await;
    assert_eq!(service.call_count(), 1);

    session.close();
}

#[tokio::test(start_paused = true)]
async fn download_is_independent_of_the_preview_protocol() {
    let (service, mut calls) = ScriptedService::new();
    // Keep a preview request in flight while downloading.
    service.script_delays([Duration::from_secs(30)]);
    let session = session_with(Arc::clone(&service));
    calls.recv().await.unwrap();
    assert!(session.is_processing());

    let file = session.download().await.unwrap();
    assert_eq!(&file[..], b"render 4000x3000 jpeg q80");

    // Format override wins for the saved file only.
    let webp = session.download_as(Some(ImageFormat::WebP)).await.unwrap();
    assert_eq!(&webp[..], b"render 4000x3000 webp q80");
    assert_eq!(session.params().format, ImageFormat::JPEG);

    session.close();
}

#[tokio::test(start_paused = true)]
async fn resource_audit_is_clean_after_close() {
    let (service, mut calls) = ScriptedService::new();
    let session = session_with(Arc::clone(&service));
    let resources = session.resources();

    // Three applied renders: each supersedes (and revokes) the previous.
    calls.recv().await.unwrap();
    until_idle(&session).await;
    session.set_width(2000).unwrap();
    calls.recv().await.unwrap();
    until_idle(&session).await;
    session.set_width(1000).unwrap();
    calls.recv().await.unwrap();
    until_idle(&session).await;

    assert_eq!(service.call_count(), 3);
    assert_eq!(resources.live(), 2);

    session.close();
    assert_eq!(resources.live(), 0);
}
