//! Busy-indicator and progress-callback trait for exports.
//!
//! Inject an [`Arc<dyn ExportProgressCallback>`] via
//! [`crate::config::ExportConfigBuilder::progress_callback`] to be told when
//! an export starts doing real work and when it is over.
//!
//! The callback is the busy indicator: `on_busy_start` fires only once the
//! cheap checks (non-empty, valid) have passed, and `on_busy_end` fires
//! exactly once afterwards on every exit path, success or failure. The
//! latter is guaranteed by [`BusyGuard`], which calls it from `Drop`.
//!
//! # Example
//!
//! ```rust
//! use cards2docx::{ExportProgressCallback, ExportConfig};
//! use std::sync::{Arc, atomic::{AtomicBool, Ordering}};
//!
//! struct Spinner {
//!     busy: AtomicBool,
//! }
//!
//! impl ExportProgressCallback for Spinner {
//!     fn on_busy_start(&self, _total_cards: usize) {
//!         self.busy.store(true, Ordering::SeqCst);
//!     }
//!     fn on_busy_end(&self, _success: bool) {
//!         self.busy.store(false, Ordering::SeqCst);
//!     }
//! }
//!
//! let spinner = Arc::new(Spinner { busy: AtomicBool::new(false) });
//!
//! let config = ExportConfig::builder()
//!     .progress_callback(spinner as Arc<dyn ExportProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the export driver as it works through the cards.
///
/// Implementations must be `Send + Sync`: packing runs on a blocking
/// thread and the callback may be shared with it. All methods have default
/// no-op implementations so callers only override what they care about.
pub trait ExportProgressCallback: Send + Sync {
    /// Show the busy indicator. Called once per export, after validation.
    ///
    /// # Arguments
    /// * `total_cards` — number of cards that will be written
    fn on_busy_start(&self, total_cards: usize) {
        let _ = total_cards;
    }

    /// Called after a card's blocks have been added to the content tree.
    ///
    /// # Arguments
    /// * `position` — 1-indexed card position
    /// * `total`    — total cards
    fn on_card_assembled(&self, position: usize, total: usize) {
        let _ = (position, total);
    }

    /// Called when a card's photo had to be left out of the document.
    ///
    /// # Arguments
    /// * `position` — 1-indexed card position
    /// * `error`    — human-readable reason
    fn on_image_skipped(&self, position: usize, error: &str) {
        let _ = (position, error);
    }

    /// Called once the packer has produced the document.
    ///
    /// # Arguments
    /// * `bytes` — size of the packed document
    fn on_packed(&self, bytes: usize) {
        let _ = bytes;
    }

    /// Hide the busy indicator. Called exactly once for every
    /// `on_busy_start`, whatever the outcome.
    fn on_busy_end(&self, success: bool) {
        let _ = success;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ExportProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExportConfig`].
pub type ProgressCallback = Arc<dyn ExportProgressCallback>;

/// Keeps the busy indicator up for as long as it lives.
///
/// Created after validation passes; dropping it (normally, by early return
/// through `?`, or by unwinding) hides the indicator.
pub(crate) struct BusyGuard<'a> {
    callback: Option<&'a dyn ExportProgressCallback>,
    success: bool,
}

impl<'a> BusyGuard<'a> {
    pub(crate) fn start(callback: Option<&'a ProgressCallback>, total_cards: usize) -> Self {
        let callback = callback.map(|cb| &**cb);
        if let Some(cb) = callback {
            cb.on_busy_start(total_cards);
        }
        Self {
            callback,
            success: false,
        }
    }

    pub(crate) fn succeed(mut self) {
        self.success = true;
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        if let Some(cb) = self.callback {
            cb.on_busy_end(self.success);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        ends: AtomicUsize,
        assembled: AtomicUsize,
        skipped: AtomicUsize,
        last_success: AtomicBool,
        packed: Mutex<Option<usize>>,
    }

    impl ExportProgressCallback for TrackingCallback {
        fn on_busy_start(&self, _total_cards: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_card_assembled(&self, _position: usize, _total: usize) {
            self.assembled.fetch_add(1, Ordering::SeqCst);
        }

        fn on_image_skipped(&self, _position: usize, _error: &str) {
            self.skipped.fetch_add(1, Ordering::SeqCst);
        }

        fn on_packed(&self, bytes: usize) {
            *self.packed.lock().unwrap() = Some(bytes);
        }

        fn on_busy_end(&self, success: bool) {
            self.ends.fetch_add(1, Ordering::SeqCst);
            self.last_success.store(success, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_busy_start(5);
        cb.on_card_assembled(1, 5);
        cb.on_image_skipped(2, "bad jpeg");
        cb.on_packed(1024);
        cb.on_busy_end(true);
    }

    #[test]
    fn guard_reports_failure_when_dropped_early() {
        let tracker = Arc::new(TrackingCallback::default());
        let cb: ProgressCallback = tracker.clone();
        {
            let _guard = BusyGuard::start(Some(&cb), 3);
            assert_eq!(tracker.starts.load(Ordering::SeqCst), 1);
            assert_eq!(tracker.ends.load(Ordering::SeqCst), 0);
        }
        assert_eq!(tracker.ends.load(Ordering::SeqCst), 1);
        assert!(!tracker.last_success.load(Ordering::SeqCst));
    }

    #[test]
    fn guard_reports_success() {
        let tracker = Arc::new(TrackingCallback::default());
        let cb: ProgressCallback = tracker.clone();
        let guard = BusyGuard::start(Some(&cb), 1);
        tracker.on_card_assembled(1, 1);
        tracker.on_packed(2048);
        guard.succeed();
        assert_eq!(tracker.ends.load(Ordering::SeqCst), 1);
        assert!(tracker.last_success.load(Ordering::SeqCst));
        assert_eq!(tracker.assembled.load(Ordering::SeqCst), 1);
        assert_eq!(*tracker.packed.lock().unwrap(), Some(2048));
        assert_eq!(tracker.skipped.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn guard_without_callback_is_inert() {
        let guard = BusyGuard::start(None, 10);
        guard.succeed();
    }
}
