//! Recorded output and its transient handles
//!
//! - `Artifact`: the immutable media assembled from a session's chunks
//! - `ArtifactStore`: registry mapping `blob:` URLs to artifacts
//! - `DownloadRequest`: what a host needs to hand the artifact to the user

mod download;
mod store;

pub use download::{download_file_name, DownloadRequest};
pub use store::{ArtifactHandle, ArtifactStore};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::encoder::Chunk;

/// Final, immutable recording
#[derive(Debug)]
pub struct Artifact {
    bytes: Vec<u8>,
    mime_type: String,
    created_at: DateTime<Utc>,
}

impl Artifact {
    /// Concatenate chunks in delivery order
    pub fn assemble(chunks: &[Chunk], mime_type: &str) -> Self {
        let total: usize = chunks.iter().map(Chunk::len).sum();
        let mut bytes = Vec::with_capacity(total);
        for chunk in chunks {
            bytes.extend_from_slice(chunk.as_bytes());
        }

        Self {
            bytes,
            mime_type: mime_type.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn info(&self) -> ArtifactInfo {
        ArtifactInfo {
            size_bytes: self.size_bytes(),
            mime_type: self.mime_type.clone(),
            created_at: self.created_at,
        }
    }
}

/// Artifact metadata exposed in session snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactInfo {
    pub size_bytes: u64,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
}

/// File extension for a media type (`video/webm;codecs=vp9` -> `webm`)
pub fn extension_for(mime_type: &str) -> &str {
    let essence = mime_type.split(';').next().unwrap_or(mime_type).trim();
    match essence {
        "video/webm" | "audio/webm" => "webm",
        "video/mp4" | "audio/mp4" => "mp4",
        "video/x-matroska" => "mkv",
        "video/ogg" | "audio/ogg" => "ogg",
        _ => "bin",
    }
}
