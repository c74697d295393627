//! Trailing-edge debounce of parameter changes.
//!
//! Coalesces bursts of parameter notifications into a single settled
//! snapshot after a quiet period. Only the trailing edge fires: every
//! change inside the quiet period re-arms the timer, and the emitted
//! value is whatever the channel holds at fire time, never the snapshot
//! from when the timer was armed.

use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;

#[derive(Debug, Clone)]
pub struct DebounceConfig {
    /// Minimum idle time after the last change before a dispatch
    pub quiet_period: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            quiet_period: Duration::from_millis(500),
        }
    }
}

/// Debouncer over a watch channel.
///
/// The watch channel already coalesces overlapping writes to the latest
/// value, so the debouncer only has to decide *when* to look.
pub struct Debouncer<T> {
    rx: watch::Receiver<T>,
    config: DebounceConfig,
}

impl<T: Clone> Debouncer<T> {
    pub fn new(rx: watch::Receiver<T>, config: DebounceConfig) -> Self {
        Self { rx, config }
    }

    /// Marks the channel's current value as pending, so the next
    /// [`settled`](Self::settled) call emits it after one quiet period
    /// even without a fresh change. Used to schedule a session's initial
    /// render.
    pub fn prime(&mut self) {
        self.rx.mark_changed();
    }

    /// Waits for the next settled snapshot.
    ///
    /// Returns `None` once the sender is gone and no change is pending.
    pub async fn settled(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        loop {
            match timeout(self.config.quiet_period, self.rx.changed()).await {
                // Another change inside the quiet period re-arms the timer.
                Ok(Ok(())) => continue,
                // Sender gone: emit what had settled; the next call ends the loop.
                Ok(Err(_)) => break,
                // Quiet period elapsed.
                Err(_) => break,
            }
        }
        Some(self.rx.borrow_and_update().clone())
    }
}
