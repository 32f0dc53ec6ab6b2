use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use super::{extension_for, Artifact};
use crate::error::ArtifactError;

/// Everything a host needs to offer the recording as a file
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub file_name: String,
    pub url: String,
    pub mime_type: String,
    pub artifact: Arc<Artifact>,
}

impl DownloadRequest {
    pub fn new(prefix: &str, url: &str, artifact: Arc<Artifact>, at: DateTime<Utc>) -> Self {
        Self {
            file_name: download_file_name(prefix, artifact.mime_type(), at),
            url: url.to_string(),
            mime_type: artifact.mime_type().to_string(),
            artifact,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.artifact.size_bytes()
    }

    /// Write the artifact into `dir` under `file_name`
    pub fn save_into(&self, dir: impl AsRef<Path>) -> Result<PathBuf, ArtifactError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let path = dir.join(&self.file_name);
        std::fs::write(&path, self.artifact.bytes())?;

        info!(
            "Saved recording to {} ({} bytes)",
            path.display(),
            self.artifact.size_bytes()
        );
        Ok(path)
    }
}

/// `<prefix>-<UTC timestamp>.<ext>`, with a timestamp safe for file names
pub fn download_file_name(prefix: &str, mime_type: &str, at: DateTime<Utc>) -> String {
    format!(
        "{}-{}.{}",
        prefix,
        at.format("%Y-%m-%dT%H-%M-%S%.3fZ"),
        extension_for(mime_type)
    )
}
