//! Error types for the vintage-newsprint library.
//!
//! Three error types mirror the three ways a front page can go wrong:
//!
//! * [`InputError`]: the photo the user pointed at could not be fetched
//!   (missing file, failed download). Recovered locally: the page shows the
//!   placeholder instead of a photo.
//!
//! * [`PreprocessError`]: the photo bytes were fetched but could not be
//!   turned into pixels, or there were no bytes at all. Also recovered
//!   locally with the placeholder.
//!
//! * [`CaptureError`]: the page could not be rasterised, encoded or saved.
//!   Terminal for that one capture invocation; the user sees a single notice
//!   and may retry.
//!
//! Photo failures never block a capture: a page without a photo is a valid
//! page. [`FontError`] is raised while building a font book, before any
//! page exists.

use std::path::PathBuf;
use thiserror::Error;

/// Human-readable notice shown once for any failed capture.
pub const CAPTURE_FAILED_NOTICE: &str =
    "দুঃখিত, ডাউনলোড করা যাচ্ছে না। দয়া করে আবার চেষ্টা করুন।";

/// Failures while resolving a photo path or URL to bytes.
#[derive(Debug, Error)]
pub enum InputError {
    /// Photo file was not found at the given path.
    #[error("Photo not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a usable path or URL.
    #[error("Invalid photo source '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },
}

/// Failures of the photo preprocessor.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PreprocessError {
    /// No image bytes were supplied.
    #[error("No image supplied")]
    EmptyInput,

    /// The bytes are not a decodable image (corrupt or unsupported container).
    #[error("Image could not be decoded: {detail}")]
    Decode { detail: String },
}

/// Failures loading a font file.
#[derive(Debug, Error)]
pub enum FontError {
    /// The font file could not be read.
    #[error("Cannot read font '{path}': {reason}")]
    Unreadable { path: PathBuf, reason: String },

    /// The bytes are not a font face the shaper understands.
    #[error("'{name}' is not a usable font: {reason}")]
    Unsupported { name: String, reason: String },
}

/// Failures of a single capture invocation.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The surface laid out to nothing.
    #[error("Surface has zero area ({width}x{height} px)")]
    EmptySurface { width: u32, height: u32 },

    /// The requested bitmap exceeds the maximum canvas side.
    #[error("Canvas of {width}x{height} px exceeds the {max} px side limit\nLower the capture scale.")]
    CanvasTooLarge { width: u32, height: u32, max: u32 },

    /// A cross-origin image would taint the bitmap and may not be read back.
    #[error("Cross-origin image '{url}' taints the canvas and cannot be exported")]
    TaintedImage { url: String },

    /// Drawing the display list failed (unparseable font, glyph outside
    /// its face).
    #[error("Rasterisation failed: {detail}")]
    Rasterisation { detail: String },

    /// PNG encoding of the bitmap failed.
    #[error("PNG encoding failed: {detail}")]
    Encode { detail: String },

    /// Capture options failed validation.
    #[error("Invalid capture options: {0}")]
    InvalidOptions(String),

    /// Another capture is still running on the same capturer.
    #[error("A capture is already in progress")]
    CaptureInProgress,

    /// The save trigger could not deliver the artifact.
    #[error("Failed to save '{file_name}': {reason}")]
    SaveFailed { file_name: String, reason: String },

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CaptureError {
    /// The single notice a user sees for this failure.
    pub fn user_notice(&self) -> &'static str {
        CAPTURE_FAILED_NOTICE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_too_large_display() {
        let e = CaptureError::CanvasTooLarge {
            width: 20000,
            height: 100,
            max: 16384,
        };
        let msg = e.to_string();
        assert!(msg.contains("20000x100"), "got: {msg}");
        assert!(msg.contains("16384"));
    }

    #[test]
    fn tainted_display_names_url() {
        let e = CaptureError::TaintedImage {
            url: "https://cdn.example.com/a.jpg".into(),
        };
        assert!(e.to_string().contains("cdn.example.com"));
    }

    #[test]
    fn every_capture_error_shares_one_notice() {
        let a = CaptureError::CaptureInProgress;
        let b = CaptureError::Internal("boom".into());
        assert_eq!(a.user_notice(), b.user_notice());
        assert!(!a.user_notice().is_empty());
    }

    #[test]
    fn decode_error_display() {
        let e = PreprocessError::Decode {
            detail: "bad magic".into(),
        };
        assert!(e.to_string().contains("bad magic"));
    }

    #[test]
    fn font_error_display_names_the_file() {
        let e = FontError::Unreadable {
            path: PathBuf::from("/fonts/Kalpurush.ttf"),
            reason: "No such file or directory".into(),
        };
        assert!(e.to_string().contains("Kalpurush.ttf"));
    }

    #[test]
    fn download_timeout_display() {
        let e = InputError::DownloadTimeout {
            url: "https://x.test/p.png".into(),
            secs: 30,
        };
        assert!(e.to_string().contains("30s"));
    }
}
