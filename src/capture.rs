//! Capture orchestration: snapshot → normalize → rasterise → encode → restore.
//!
//! [`capture`] turns a [`Surface`] into a [`CapturedArtifact`]. While it
//! runs, the surface is laid out at the canonical geometry (identity
//! transform, 550 px wide, no margin) so the export never depends on how the
//! page happens to be displayed. A [`GeometryOverride`] guard puts the
//! previous geometry back on every exit path: success, `?` return, panic
//! unwind, or the future being dropped mid-await.
//!
//! [`Capturer`] wraps a capture with the host-side concerns: one capture at
//! a time, observer events, and handing the artifact to a [`SaveTrigger`].

use crate::config::CaptureOptions;
use crate::error::CaptureError;
use crate::output::{CapturedArtifact, SavedArtifact};
use crate::pipeline::encode::{encode_png, suggested_file_name};
use crate::pipeline::rasterize::rasterize;
use crate::progress::{NoopObserver, ObserverRef};
use crate::save::{DownloadAnchor, SaveTrigger};
use crate::surface::{Geometry, GeometryOverride, Surface};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Capture `surface` as a PNG artifact.
///
/// The surface's geometry is identical before and after the call, whatever
/// the outcome.
pub async fn capture<S: Surface + ?Sized>(
    surface: &mut S,
    options: &CaptureOptions,
) -> Result<CapturedArtifact, CaptureError> {
    options.validate()?;

    let guard = GeometryOverride::apply(surface, Geometry::canonical());
    let geometry = guard.geometry();
    let list = guard.layout();
    let name = guard.suggested_name().map(str::to_owned);
    info!(
        "Capturing {}x{} px layout at scale {}",
        list.width, list.height, options.scale
    );

    let bitmap = rasterize(list, geometry, options).await?;
    let png = encode_png(&bitmap)?;
    let file_name = suggested_file_name(&options.file_prefix, name.as_deref(), &options.default_name);

    let restored = guard.restore();
    debug!(?restored, "Capture finished, geometry restored");

    Ok(CapturedArtifact::new(
        png,
        bitmap.width(),
        bitmap.height(),
        file_name,
    ))
}

/// "Capture in progress" flag shared by everything that can start a capture.
#[derive(Debug, Default)]
pub struct CaptureGate {
    busy: AtomicBool,
}

impl CaptureGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the gate, or `None` if a capture is already running.
    pub fn try_acquire(&self) -> Option<CaptureTicket<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CaptureTicket { gate: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Held for the duration of one capture; releases the gate on drop.
#[derive(Debug)]
pub struct CaptureTicket<'a> {
    gate: &'a CaptureGate,
}

impl Drop for CaptureTicket<'_> {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}

/// Runs captures one at a time and saves the result.
pub struct Capturer {
    gate: CaptureGate,
    observer: ObserverRef,
}

impl Default for Capturer {
    fn default() -> Self {
        Self::new()
    }
}

impl Capturer {
    pub fn new() -> Self {
        Self {
            gate: CaptureGate::new(),
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: ObserverRef) -> Self {
        self.observer = observer;
        self
    }

    /// Whether a capture is currently running.
    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    /// Capture `surface` and deliver it through `trigger`.
    ///
    /// A request made while another capture runs is rejected with
    /// [`CaptureError::CaptureInProgress`] and produces no observer events.
    /// Any other failure is reported to the observer exactly once.
    pub async fn download<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        options: &CaptureOptions,
        trigger: &dyn SaveTrigger,
    ) -> Result<SavedArtifact, CaptureError> {
        let Some(_ticket) = self.gate.try_acquire() else {
            warn!("Capture requested while another is running; ignored");
            return Err(CaptureError::CaptureInProgress);
        };

        let started = Instant::now();
        self.observer.on_capture_start();

        let result = match capture(surface, options).await {
            Ok(artifact) => save(&artifact, trigger, started),
            Err(e) => Err(e),
        };

        match &result {
            Ok(saved) => {
                info!(
                    "Captured {} ({}x{} px, {} bytes) in {} ms",
                    saved.file_name, saved.width, saved.height, saved.bytes, saved.duration_ms
                );
                self.observer.on_capture_complete(saved);
            }
            Err(e) => {
                debug!("Capture failed: {}", e);
                self.observer.on_capture_failed(e.user_notice());
            }
        }
        result
    }
}

fn save(
    artifact: &CapturedArtifact,
    trigger: &dyn SaveTrigger,
    started: Instant,
) -> Result<SavedArtifact, CaptureError> {
    let anchor = DownloadAnchor::for_artifact(artifact);
    let mut saved = trigger.activate(&anchor)?;
    drop(anchor);

    saved.width = artifact.width();
    saved.height = artifact.height();
    saved.duration_ms = started.elapsed().as_millis() as u64;
    Ok(saved)
}
