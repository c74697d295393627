//! Parameter store: validated setters with one batched notification per call.

use tokio::sync::watch;
use tracing::debug;
use crate::core::aspect::AspectRatio;
use crate::core::types::{MAX_DIMENSION, MIN_DIMENSION, SourceImage, TransformParameters};
use crate::utils::{ImageFormat, StudioResult, ValidationError};

/// Initial quality applied to a fresh session.
pub const DEFAULT_QUALITY: u32 = 80;

/// Holds the current [`TransformParameters`] for one session.
///
/// Every setter either fully applies or rejects: validation runs first,
/// the paired dimension is derived when the aspect ratio is locked, the
/// PNG invariant is enforced, and subscribers get at most one
/// notification per call, and none when the effective parameters did not
/// change.
pub struct ParameterStore {
    ratio: AspectRatio,
    params: TransformParameters,
    /// Format selected before the most recent background-removal enable;
    /// restored on disable.
    saved_format: Option<ImageFormat>,
    tx: watch::Sender<TransformParameters>,
}

impl ParameterStore {
    /// Seeds parameters from the source's native dimensions and format.
    pub fn new(source: &SourceImage) -> Self {
        let ratio = AspectRatio::new(source.native_width(), source.native_height());
        let params = TransformParameters {
            target_width: source.native_width(),
            target_height: source.native_height(),
            format: source.format(),
            quality: DEFAULT_QUALITY,
            keep_aspect_ratio: true,
            remove_background: false,
        };
        let (tx, _) = watch::channel(params.clone());
        Self {
            ratio,
            params,
            saved_format: None,
            tx,
        }
    }

    /// Receiver for settled-parameter scheduling. Coalesces to the latest
    /// snapshot by construction.
    pub fn subscribe(&self) -> watch::Receiver<TransformParameters> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> TransformParameters {
        self.params.clone()
    }

    pub fn aspect(&self) -> AspectRatio {
        self.ratio
    }

    /// Width-derived scale readout in percent (informational).
    pub fn scale_percent(&self) -> u32 {
        self.ratio.scale_for_width(self.params.target_width)
    }

    /// Publishes the current parameters iff they differ from the last
    /// published snapshot, so a call that lands on the same effective
    /// state schedules nothing downstream.
    fn publish(&self) {
        self.tx.send_if_modified(|current| {
            if *current != self.params {
                *current = self.params.clone();
                true
            } else {
                false
            }
        });
    }

    fn validate_dimension(value: u32) -> Result<(), ValidationError> {
        if (MIN_DIMENSION..=MAX_DIMENSION).contains(&value) {
            Ok(())
        } else {
            Err(ValidationError::Dimension(value))
        }
    }

    /// Sets the target width; derives the height when locked.
    pub fn set_width(&mut self, width: u32) -> StudioResult<()> {
        Self::validate_dimension(width)?;
        self.params.target_width = width;
        if self.params.keep_aspect_ratio {
            self.params.target_height = self.ratio.height_for_width(width);
        }
        self.publish();
        Ok(())
    }

    /// Sets the target height; derives the width when locked.
    pub fn set_height(&mut self, height: u32) -> StudioResult<()> {
        Self::validate_dimension(height)?;
        self.params.target_height = height;
        if self.params.keep_aspect_ratio {
            self.params.target_width = self.ratio.width_for_height(height);
        }
        self.publish();
        Ok(())
    }

    /// Scales both dimensions uniformly from the native size.
    pub fn set_scale(&mut self, percent: u32) -> StudioResult<()> {
        if !(1..=100).contains(&percent) {
            return Err(ValidationError::Scale(percent).into());
        }
        let (width, height) = self.ratio.dimensions_for_scale(percent);
        self.params.target_width = width;
        self.params.target_height = height;
        self.publish();
        Ok(())
    }

    pub fn set_quality(&mut self, quality: u32) -> StudioResult<()> {
        if !(1..=100).contains(&quality) {
            return Err(ValidationError::Quality(quality).into());
        }
        self.params.quality = quality;
        self.publish();
        Ok(())
    }

    /// Selects the output format.
    ///
    /// While background removal is active the output stays PNG; the
    /// selection only retargets what a later disable restores to, and no
    /// notification fires since the effective parameters are unchanged.
    pub fn set_format(&mut self, format: ImageFormat) -> StudioResult<()> {
        if self.params.remove_background {
            debug!("Format {} deferred until background removal is disabled", format);
            self.saved_format = Some(format);
            return Ok(());
        }
        self.params.format = format;
        self.publish();
        Ok(())
    }

    /// Toggles background removal.
    ///
    /// Enabling snapshots the selected format and forces PNG (alpha needs
    /// a lossless encoding); disabling restores the snapshot.
    pub fn set_remove_background(&mut self, enabled: bool) -> StudioResult<()> {
        if enabled == self.params.remove_background {
            return Ok(());
        }
        if enabled {
            self.saved_format = Some(self.params.format);
            self.params.format = ImageFormat::PNG;
        } else if let Some(saved) = self.saved_format.take() {
            self.params.format = saved;
        }
        self.params.remove_background = enabled;
        self.publish();
        Ok(())
    }

    /// The lock applies to subsequent edits; the current pair is kept.
    pub fn set_keep_aspect_ratio(&mut self, locked: bool) -> StudioResult<()> {
        self.params.keep_aspect_ratio = locked;
        self.publish();
        Ok(())
    }

    /// Restores native dimensions (scale 100%); format, quality, and the
    /// background-removal flag keep their values.
    pub fn reset(&mut self) -> StudioResult<()> {
        self.params.target_width = self.ratio.native_width();
        self.params.target_height = self.ratio.native_height();
        self.publish();
        Ok(())
    }
}
