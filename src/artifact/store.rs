use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use super::Artifact;
use crate::error::ArtifactError;

const URL_SCHEME: &str = "blob:screen-recorder/";

/// Transient reference to a registered artifact
///
/// Not `Clone`: the owner revokes it by value, so a handle cannot be
/// revoked twice or used after revocation.
#[derive(Debug, PartialEq, Eq)]
pub struct ArtifactHandle {
    url: String,
}

impl ArtifactHandle {
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Registry of live artifact URLs
#[derive(Debug, Default)]
pub struct ArtifactStore {
    entries: Mutex<HashMap<String, Arc<Artifact>>>,
    created: AtomicUsize,
    revoked: AtomicUsize,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an artifact and mint a URL for it
    pub fn register(&self, artifact: Arc<Artifact>) -> ArtifactHandle {
        let url = format!("{}{}", URL_SCHEME, uuid::Uuid::new_v4());
        let size = artifact.size_bytes();

        self.entries.lock().insert(url.clone(), artifact);
        self.created.fetch_add(1, Ordering::SeqCst);

        info!("Registered artifact {} ({} bytes)", url, size);
        ArtifactHandle { url }
    }

    pub fn resolve(&self, url: &str) -> Option<Arc<Artifact>> {
        self.entries.lock().get(url).cloned()
    }

    /// Release a handle; the URL stops resolving
    pub fn revoke(&self, handle: ArtifactHandle) -> Result<(), ArtifactError> {
        let removed = self.entries.lock().remove(&handle.url);
        match removed {
            Some(_) => {
                self.revoked.fetch_add(1, Ordering::SeqCst);
                debug!("Revoked artifact {}", handle.url);
                Ok(())
            }
            None => Err(ArtifactError::UnknownHandle(handle.url)),
        }
    }

    /// URLs registered and not yet revoked
    pub fn outstanding(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn revoked_count(&self) -> usize {
        self.revoked.load(Ordering::SeqCst)
    }
}
