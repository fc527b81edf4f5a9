//! Output types produced by a capture.

use crate::pipeline::encode::data_uri;
use serde::Serialize;
use std::sync::Arc;

/// An encoded front page, ready to be saved.
///
/// The PNG bytes are shared, never mutated after encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedArtifact {
    png: Arc<[u8]>,
    width: u32,
    height: u32,
    file_name: String,
}

impl CapturedArtifact {
    pub fn new(png: Vec<u8>, width: u32, height: u32, file_name: String) -> Self {
        Self {
            png: png.into(),
            width,
            height,
            file_name,
        }
    }

    pub fn png(&self) -> &[u8] {
        &self.png
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Suggested download name, `<prefix>-<name>.png`.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// `data:image/png;base64,…` form of the PNG.
    pub fn to_data_uri(&self) -> String {
        data_uri(&self.png)
    }
}

/// What a save trigger delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedArtifact {
    /// Path or other locator of the saved file.
    pub location: String,
    pub file_name: String,
    /// Size of the saved PNG in bytes.
    pub bytes: usize,
    pub width: u32,
    pub height: u32,
    /// Wall-clock time from capture start to saved file.
    pub duration_ms: u64,
}

impl SavedArtifact {
    /// A save record without pixel size or timing; the capturer fills those in.
    pub fn new(location: impl Into<String>, file_name: impl Into<String>, bytes: usize) -> Self {
        Self {
            location: location.into(),
            file_name: file_name.into(),
            bytes,
            width: 0,
            height: 0,
            duration_ms: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_carries_png_bytes() {
        let a = CapturedArtifact::new(vec![1, 2, 3], 1, 1, "BijoyBarta-71.png".into());
        assert_eq!(a.to_data_uri(), "data:image/png;base64,AQID");
        assert_eq!(a.png(), &[1, 2, 3]);
    }

    #[test]
    fn saved_artifact_serializes() {
        let mut s = SavedArtifact::new("/tmp/BijoyBarta-71.png", "BijoyBarta-71.png", 42);
        s.width = 1650;
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["bytes"], 42);
        assert_eq!(json["width"], 1650);
        assert_eq!(json["file_name"], "BijoyBarta-71.png");
    }
}
