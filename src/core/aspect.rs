//! Pure dimension derivations for a locked aspect ratio.
//!
//! All functions here are pure and testable without any I/O or images.
//! Rounding is `f64::round` in every direction; the width→height→width
//! round trip must land within one pixel, otherwise rapid focus toggling
//! between the two inputs oscillates the pair.

use crate::core::types::{MAX_DIMENSION, MIN_DIMENSION};

/// Native dimension pair an editing session derives against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectRatio {
    native_width: u32,
    native_height: u32,
}

impl AspectRatio {
    /// Both dimensions must be non-zero; enforced by [`SourceImage`]
    /// construction upstream.
    ///
    /// [`SourceImage`]: crate::core::SourceImage
    pub fn new(native_width: u32, native_height: u32) -> Self {
        debug_assert!(native_width > 0 && native_height > 0);
        Self {
            native_width,
            native_height,
        }
    }

    pub fn native_width(&self) -> u32 {
        self.native_width
    }

    pub fn native_height(&self) -> u32 {
        self.native_height
    }

    fn ratio(&self) -> f64 {
        f64::from(self.native_width) / f64::from(self.native_height)
    }

    /// Height paired with `width` under the native ratio.
    pub fn height_for_width(&self, width: u32) -> u32 {
        clamp_derived((f64::from(width) / self.ratio()).round())
    }

    /// Width paired with `height` under the native ratio.
    pub fn width_for_height(&self, height: u32) -> u32 {
        clamp_derived((f64::from(height) * self.ratio()).round())
    }

    /// Dimension pair for a uniform scale percentage of the native size.
    pub fn dimensions_for_scale(&self, percent: u32) -> (u32, u32) {
        let factor = f64::from(percent) / 100.0;
        (
            clamp_derived((f64::from(self.native_width) * factor).round()),
            clamp_derived((f64::from(self.native_height) * factor).round()),
        )
    }

    /// Width-derived scale readout in percent.
    ///
    /// Informational only: an unlocked pair has no single scale value, so
    /// the displayed scale is defined from the width.
    pub fn scale_for_width(&self, width: u32) -> u32 {
        (f64::from(width) / f64::from(self.native_width) * 100.0).round() as u32
    }
}

/// Derived values are clamped into the accepted range; only user-supplied
/// values get rejected outright.
fn clamp_derived(value: f64) -> u32 {
    (value as u32).clamp(MIN_DIMENSION, MAX_DIMENSION)
}
