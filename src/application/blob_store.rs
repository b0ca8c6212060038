//! Process-local object URLs for finished recordings

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use tracing::debug;
use uuid::Uuid;

use crate::domain::recording::RecordingBlob;

/// Prefix of every URL minted by the store
pub const URL_PREFIX: &str = "blob:voicenote/";

/// Registry mapping object URLs to recording blobs.
/// Cloning yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct BlobStore {
    entries: Arc<StdMutex<HashMap<String, RecordingBlob>>>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, RecordingBlob>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register `blob` and mint a URL that resolves to it until revoked
    pub fn create_url(&self, blob: RecordingBlob) -> ObjectUrl {
        let url = format!("{}{}", URL_PREFIX, Uuid::new_v4());
        self.entries().insert(url.clone(), blob);
        debug!(%url, "object url created");
        ObjectUrl {
            url,
            store: self.clone(),
            revoked: false,
        }
    }

    /// Resolve a URL to its blob
    pub fn fetch(&self, url: &str) -> Option<RecordingBlob> {
        self.entries().get(url).cloned()
    }

    /// Number of URLs currently resolvable
    pub fn live_count(&self) -> usize {
        self.entries().len()
    }

    fn revoke(&self, url: &str) -> bool {
        self.entries().remove(url).is_some()
    }
}

/// Owned object URL, revoked exactly once (explicitly or on drop)
pub struct ObjectUrl {
    url: String,
    store: BlobStore,
    revoked: bool,
}

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked
    }

    /// Release the URL. Later calls are no-ops.
    pub fn revoke(&mut self) {
        if self.revoked {
            return;
        }
        self.revoked = true;
        if self.store.revoke(&self.url) {
            debug!(url = %self.url, "object url revoked");
        }
    }
}

impl fmt::Debug for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectUrl")
            .field("url", &self.url)
            .field("revoked", &self.revoked)
            .finish()
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        self.revoke();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recording::AudioMimeType;

    fn blob() -> RecordingBlob {
        RecordingBlob::new(vec![1, 2, 3], AudioMimeType::Wav)
    }

    #[test]
    fn url_resolves_until_revoked() {
        let store = BlobStore::new();
        let mut url = store.create_url(blob());
        assert!(url.as_str().starts_with(URL_PREFIX));
        assert_eq!(store.fetch(url.as_str()).unwrap().data(), &[1, 2, 3]);

        url.revoke();
        assert!(store.fetch(url.as_str()).is_none());
        assert!(url.is_revoked());
    }

    #[test]
    fn drop_revokes() {
        let store = BlobStore::new();
        let url = store.create_url(blob());
        let key = url.as_str().to_string();
        assert_eq!(store.live_count(), 1);
        drop(url);
        assert_eq!(store.live_count(), 0);
        assert!(store.fetch(&key).is_none());
    }

    #[test]
    fn revoke_twice_is_noop() {
        let store = BlobStore::new();
        let mut first = store.create_url(blob());
        let second = store.create_url(blob());
        first.revoke();
        first.revoke();
        drop(first);
        assert_eq!(store.live_count(), 1);
        assert!(store.fetch(second.as_str()).is_some());
    }

    #[test]
    fn urls_are_unique() {
        let store = BlobStore::new();
        let a = store.create_url(blob());
        let b = store.create_url(blob());
        assert_ne!(a.as_str(), b.as_str());
    }
}
