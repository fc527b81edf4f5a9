//! Save trigger: hand an artifact to whatever stores downloads.
//!
//! A capture never writes files itself. It builds a [`DownloadAnchor`]
//! (suggested file name plus a `data:` URI), activates it once through a
//! [`SaveTrigger`], and drops it. The trigger decides where the bytes go.

use crate::error::CaptureError;
use crate::output::{CapturedArtifact, SavedArtifact};
use crate::pipeline::encode::PNG_MIME;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// A transient download link: file name plus data-URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadAnchor {
    pub download: String,
    pub href: String,
}

impl DownloadAnchor {
    pub fn for_artifact(artifact: &CapturedArtifact) -> Self {
        Self {
            download: artifact.file_name().to_string(),
            href: artifact.to_data_uri(),
        }
    }

    /// Decode the `href` back into PNG bytes.
    pub fn decode_href(&self) -> Result<Vec<u8>, CaptureError> {
        let prefix = format!("data:{};base64,", PNG_MIME);
        let payload = self
            .href
            .strip_prefix(&prefix)
            .ok_or_else(|| self.failed("href is not a base64 PNG data URI"))?;
        STANDARD
            .decode(payload)
            .map_err(|e| self.failed(&e.to_string()))
    }

    fn failed(&self, reason: &str) -> CaptureError {
        CaptureError::SaveFailed {
            file_name: self.download.clone(),
            reason: reason.to_string(),
        }
    }
}

/// Receives activated download anchors.
pub trait SaveTrigger: Send + Sync {
    /// Deliver one download. Called at most once per successful capture.
    fn activate(&self, anchor: &DownloadAnchor) -> Result<SavedArtifact, CaptureError>;
}

/// Writes downloads into a directory.
///
/// Each file is written to a temporary file in the same directory and then
/// renamed into place, so a reader never sees a half-written PNG. An existing
/// file with the same name is replaced.
#[derive(Debug, Clone)]
pub struct DirectoryDownloads {
    dir: PathBuf,
}

impl DirectoryDownloads {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SaveTrigger for DirectoryDownloads {
    fn activate(&self, anchor: &DownloadAnchor) -> Result<SavedArtifact, CaptureError> {
        let bytes = anchor.decode_href()?;
        let io_err = |e: std::io::Error| anchor.failed(&e.to_string());

        std::fs::create_dir_all(&self.dir).map_err(io_err)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        tmp.write_all(&bytes).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;

        let target = self.dir.join(&anchor.download);
        tmp.persist(&target).map_err(|e| io_err(e.error))?;

        info!("Saved {} ({} bytes)", target.display(), bytes.len());
        Ok(SavedArtifact::new(
            target.display().to_string(),
            anchor.download.clone(),
            bytes.len(),
        ))
    }
}

/// Keeps downloads in memory.
#[derive(Debug, Default)]
pub struct MemoryDownloads {
    files: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemoryDownloads {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything saved so far, in order.
    pub fn files(&self) -> Vec<(String, Vec<u8>)> {
        self.files
            .lock()
            .map(|f| f.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn len(&self) -> usize {
        self.files().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SaveTrigger for MemoryDownloads {
    fn activate(&self, anchor: &DownloadAnchor) -> Result<SavedArtifact, CaptureError> {
        let bytes = anchor.decode_href()?;
        let len = bytes.len();
        let mut files = self
            .files
            .lock()
            .map_err(|_| CaptureError::Internal("download store poisoned".into()))?;
        files.push((anchor.download.clone(), bytes));
        debug!("Kept {} in memory ({} bytes)", anchor.download, len);
        Ok(SavedArtifact::new(
            format!("memory:{}", anchor.download),
            anchor.download.clone(),
            len,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> CapturedArtifact {
        CapturedArtifact::new(b"\x89PNG fake".to_vec(), 3, 2, "BijoyBarta-71.png".into())
    }

    #[test]
    fn anchor_round_trips_bytes() {
        let anchor = DownloadAnchor::for_artifact(&artifact());
        assert_eq!(anchor.download, "BijoyBarta-71.png");
        assert!(anchor.href.starts_with("data:image/png;base64,"));
        assert_eq!(anchor.decode_href().unwrap(), b"\x89PNG fake");
    }

    #[test]
    fn foreign_href_is_rejected() {
        let anchor = DownloadAnchor {
            download: "x.png".into(),
            href: "https://example.com/x.png".into(),
        };
        assert!(matches!(
            anchor.decode_href(),
            Err(CaptureError::SaveFailed { .. })
        ));
    }

    #[test]
    fn directory_downloads_write_file() {
        let dir = tempfile::tempdir().unwrap();
        let trigger = DirectoryDownloads::new(dir.path().join("out"));
        let saved = trigger
            .activate(&DownloadAnchor::for_artifact(&artifact()))
            .unwrap();
        let path = dir.path().join("out").join("BijoyBarta-71.png");
        assert_eq!(std::fs::read(&path).unwrap(), b"\x89PNG fake");
        assert_eq!(saved.bytes, 9);
        assert_eq!(saved.location, path.display().to_string());
        // only the final file remains; the temporary was renamed
        assert_eq!(std::fs::read_dir(dir.path().join("out")).unwrap().count(), 1);
    }

    #[test]
    fn memory_downloads_keep_order() {
        let mem = MemoryDownloads::new();
        assert!(mem.is_empty());
        mem.activate(&DownloadAnchor::for_artifact(&artifact())).unwrap();
        let files = mem.files();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].0, "BijoyBarta-71.png");
    }
}
