//! Pipeline stages for photo preparation and front-page export.
//!
//! Each submodule implements exactly one transformation step and is tested
//! on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ preprocess ──▶ (surface layout) ──▶ rasterize ──▶ encode
//! (path/URL)  (grayscale+sepia)                 (RGBA bitmap)  (PNG, name)
//! ```
//!
//! 1. [`input`]     : read the photo from disk or download it, recording its
//!    origin
//! 2. [`preprocess`]: decode and apply the vintage look; failures become
//!    "no photo"
//! 3. [`rasterize`] : paint a display list into a bitmap; runs in
//!    `spawn_blocking`
//! 4. [`encode`]    : PNG bytes, data-URI and sanitized file name

pub mod encode;
pub mod input;
pub mod preprocess;
pub mod rasterize;
