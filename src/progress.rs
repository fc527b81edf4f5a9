//! Observer trait for capture events.
//!
//! Inject an [`Arc<dyn CaptureObserver>`] via
//! [`crate::capture::Capturer::with_observer`] to hear when a capture starts,
//! finishes, or fails. A host shows the failure notice from
//! [`CaptureObserver::on_capture_failed`]; it is delivered exactly once per
//! failed capture.
//!
//! # Example
//!
//! ```rust
//! use vintage_newsprint::{CaptureObserver, Capturer, SavedArtifact};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingObserver {
//!     saved: AtomicUsize,
//! }
//!
//! impl CaptureObserver for CountingObserver {
//!     fn on_capture_complete(&self, saved: &SavedArtifact) {
//!         self.saved.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("saved {} ({} bytes)", saved.file_name, saved.bytes);
//!     }
//! }
//!
//! let capturer = Capturer::new()
//!     .with_observer(Arc::new(CountingObserver { saved: AtomicUsize::new(0) }));
//! assert!(!capturer.is_busy());
//! ```

use crate::output::SavedArtifact;
use std::sync::Arc;

/// Called by [`crate::capture::Capturer`] around each capture.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait CaptureObserver: Send + Sync {
    /// Called once the capture gate is held, before the surface is touched.
    fn on_capture_start(&self) {}

    /// Called after the artifact has been handed to the save trigger.
    fn on_capture_complete(&self, saved: &SavedArtifact) {
        let _ = saved;
    }

    /// Called once when a capture fails, with the notice to show the user.
    fn on_capture_failed(&self, notice: &str) {
        let _ = notice;
    }
}

/// A no-op implementation for callers that don't need events.
///
/// This is the default when no observer is configured.
pub struct NoopObserver;

impl CaptureObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::capture::Capturer`].
pub type ObserverRef = Arc<dyn CaptureObserver>;
