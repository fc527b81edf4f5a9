//! Image encoding: `RgbaImage` → PNG bytes, data-URI and file name.
//!
//! PNG is lossless, so the grayscale photo and the thin column rules of the
//! front page survive without JPEG ringing. The data-URI form is what the
//! download anchor carries.

use crate::config::{DEFAULT_FILE_PREFIX, DEFAULT_NAME_TOKEN};
use crate::error::CaptureError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, RgbaImage};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Cursor;
use tracing::debug;

/// MIME type of every exported artifact.
pub const PNG_MIME: &str = "image/png";

/// Longest sanitized name, in characters.
pub const MAX_NAME_CHARS: usize = 64;

/// Encode a rasterised page as PNG.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, CaptureError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| CaptureError::Encode {
            detail: e.to_string(),
        })?;
    debug!(
        "Encoded {}x{} bitmap → {} bytes PNG",
        img.width(),
        img.height(),
        buf.len()
    );
    Ok(buf)
}

/// Wrap PNG bytes in a `data:image/png;base64,…` URI.
pub fn data_uri(png: &[u8]) -> String {
    format!("data:{};base64,{}", PNG_MIME, STANDARD.encode(png))
}

// Path separators, characters reserved on common filesystems, and controls.
static RE_UNSAFE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[/\\:*?"<>|\x00-\x1f\x7f]"#).expect("valid regex"));
static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Make a user-entered name safe to use inside a file name.
///
/// Returns `None` when nothing usable is left.
pub fn sanitize_name(name: &str) -> Option<String> {
    let cleaned = RE_WHITESPACE.replace_all(name.trim(), "-");
    let cleaned = RE_UNSAFE.replace_all(&cleaned, "_");
    let trimmed: String = cleaned
        .trim_matches(|c| c == '.' || c == '-')
        .chars()
        .take(MAX_NAME_CHARS)
        .collect();
    let trimmed = trimmed.trim_end_matches(['.', '-']);
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// `<prefix>-<name>.png`, falling back to `default` when `name` is blank.
///
/// Every part goes through [`sanitize_name`]; a part with nothing usable
/// left falls back to the built-in prefix or name token.
pub fn suggested_file_name(prefix: &str, name: Option<&str>, default: &str) -> String {
    let prefix = sanitize_name(prefix).unwrap_or_else(|| DEFAULT_FILE_PREFIX.to_string());
    let name = name
        .and_then(sanitize_name)
        .or_else(|| sanitize_name(default))
        .unwrap_or_else(|| DEFAULT_NAME_TOKEN.to_string());
    format!("{}-{}.png", prefix, name)
}
