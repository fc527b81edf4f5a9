//! # vintage-newsprint
//!
//! Compose a 1971-style Bengali front page and export it as a PNG.
//!
//! ## What it does
//!
//! A user supplies a headline, reporter name, location and optionally a
//! photo. The photo is turned grayscale and tinted sepia, the page is laid
//! out like the front of a wartime broadsheet, and a capture rasterises the
//! page at a fixed, display-independent geometry into a PNG download named
//! after the reporter.
//!
//! Text is shaped with rustybuzz and drawn with rusttype. Noto Sans is
//! bundled; Bengali needs a system face (found through fontdb) or a font
//! file passed to [`FontBook::with_file`]. Characters no face covers are
//! drawn as boxes holding their code point.
//!
//! ## Pipeline Overview
//!
//! ```text
//! photo (path / URL / bytes)
//!  │
//!  ├─ 1. Input       read the file or download it, recording its origin
//!  ├─ 2. Preprocess  grayscale → sepia overlay (failure → placeholder)
//!  │
//! NewspaperSurface (headline, reporter, location, date, photo)
//!  │
//!  ├─ 3. Normalize   snapshot geometry, apply identity / 550 px / no margin
//!  ├─ 4. Rasterize   display list → RGBA at `scale` (spawn_blocking)
//!  ├─ 5. Encode      PNG + `<prefix>-<reporter>.png`
//!  ├─ 6. Restore     guard drop puts the snapshot back, on every path
//!  └─ 7. Save        download anchor → SaveTrigger
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vintage_newsprint::{
//!     CaptureOptions, Capturer, DirectoryDownloads, NewspaperSurface,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut page = NewspaperSurface::new();
//!     page.set_headline("বিজয় অর্জিত হয়েছে");
//!     page.set_reporter(Some("রহিম"));
//!
//!     let options = CaptureOptions::default();
//!     let saved = Capturer::new()
//!         .download(&mut page, &options, &DirectoryDownloads::new("."))
//!         .await?;
//!     eprintln!("saved {} ({} bytes)", saved.location, saved.bytes);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `newsprint` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! vintage-newsprint = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod capture;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod raster;
pub mod save;
pub mod surface;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use capture::{capture, CaptureGate, CaptureTicket, Capturer};
pub use config::{CaptureOptions, CaptureOptionsBuilder, CrossOriginMode};
pub use error::{CaptureError, FontError, InputError, PreprocessError, CAPTURE_FAILED_NOTICE};
pub use output::{CapturedArtifact, SavedArtifact};
pub use pipeline::input::{resolve_upload, Upload};
pub use pipeline::preprocess::{prepare_photo, transform};
pub use progress::{CaptureObserver, NoopObserver, ObserverRef};
pub use raster::{ImageOrigin, RasterImage};
pub use save::{DirectoryDownloads, DownloadAnchor, MemoryDownloads, SaveTrigger};
pub use surface::display::{Color, DisplayList, DrawOp, Rect};
pub use surface::font::{FontBook, FontFace, GlyphRun, ShapedText};
pub use surface::newspaper::{DateMode, NewspaperSurface};
pub use surface::{Geometry, GeometryOverride, Surface, Transform};
