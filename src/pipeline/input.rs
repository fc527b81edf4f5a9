//! Input resolution: turn a user-supplied photo path or URL into bytes.
//!
//! A local file is read as-is and tagged [`ImageOrigin::Local`]. A URL is
//! downloaded and tagged [`ImageOrigin::Remote`], recording whether the
//! server sent `Access-Control-Allow-Origin`; the rasteriser decides later
//! whether that photo may end up in an exported bitmap.

use crate::error::InputError;
use crate::raster::ImageOrigin;
use std::path::PathBuf;
use tracing::{debug, info};

/// Raw photo bytes plus where they came from.
#[derive(Debug, Clone)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub origin: ImageOrigin,
    /// File name or URL, for log lines.
    pub label: String,
}

impl Upload {
    /// Wrap bytes the caller already holds (e.g. from a file picker).
    pub fn local(bytes: Vec<u8>, label: impl Into<String>) -> Self {
        Self {
            bytes,
            origin: ImageOrigin::Local,
            label: label.into(),
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to photo bytes.
///
/// If the input is a URL, download it. If the input is a local file,
/// validate it exists and is readable.
pub async fn resolve_upload(input: &str, timeout_secs: u64) -> Result<Upload, InputError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(InputError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(input).await
    }
}

async fn read_local(path_str: &str) -> Result<Upload, InputError> {
    let path = PathBuf::from(path_str);

    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => InputError::PermissionDenied { path: path.clone() },
        _ => InputError::FileNotFound { path: path.clone() },
    })?;

    debug!("Read local photo: {} ({} bytes)", path.display(), bytes.len());
    Ok(Upload::local(bytes, path.display().to_string()))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<Upload, InputError> {
    info!("Downloading photo from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| InputError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            InputError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            InputError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(InputError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let cors_granted = response
        .headers()
        .contains_key(reqwest::header::ACCESS_CONTROL_ALLOW_ORIGIN);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| InputError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!(
        "Downloaded {} bytes (CORS {})",
        bytes.len(),
        if cors_granted { "granted" } else { "not granted" }
    );

    Ok(Upload {
        bytes: bytes.to_vec(),
        origin: ImageOrigin::Remote {
            url: url.to_string(),
            cors_granted,
        },
        label: url.to_string(),
    })
}
