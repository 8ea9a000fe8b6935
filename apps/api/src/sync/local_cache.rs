//! Local durable cache: a single entry under a fixed key holding the JSON document.
//!
//! The cache is a mirror, never authoritative outside of load time. Writes that
//! fail are logged and swallowed; the in-memory document stays correct.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::models::resume::ResumeDocument;
use crate::sync::SyncError;

/// The one key every mirror write overwrites.
pub const CACHE_KEY: &str = "resumeData";

#[async_trait]
pub trait LocalCache: Send + Sync {
    /// Returns the raw cached value, or `None` if nothing was ever written.
    async fn read(&self) -> Result<Option<String>, SyncError>;
    async fn write(&self, value: &str) -> Result<(), SyncError>;
}

/// File-backed cache: `<dir>/resumeData.json`.
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{CACHE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LocalCache for FileCache {
    async fn read(&self) -> Result<Option<String>, SyncError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, value: &str) -> Result<(), SyncError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, value).await?;
        Ok(())
    }
}

/// Serializes `document` and overwrites the cache entry. Never fails the caller.
pub async fn mirror(cache: &dyn LocalCache, document: &ResumeDocument) {
    let raw = match serde_json::to_string(document) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Local mirror skipped, document did not serialize: {e}");
            return;
        }
    };
    match cache.write(&raw).await {
        Ok(()) => debug!("Mirrored {} bytes to local cache", raw.len()),
        Err(e) => warn!("Local mirror failed: {e}"),
    }
}

/// Reads the cached document. Missing, unreadable, or unparseable entries yield `None`.
pub async fn load_cached(cache: &dyn LocalCache) -> Option<ResumeDocument> {
    let raw = match cache.read().await {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!("Local cache unreadable: {e}");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(doc) => Some(doc),
        Err(e) => {
            warn!("Local cache entry ignored, not a resume document: {e}");
            None
        }
    }
}

#[cfg(test)]
pub mod memory {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// In-memory cache with write-failure injection.
    #[derive(Default)]
    pub struct MemoryCache {
        value: Mutex<Option<String>>,
        pub fail_writes: AtomicBool,
        pub writes: AtomicUsize,
    }

    impl MemoryCache {
        pub fn holding(document: &ResumeDocument) -> Self {
            let cache = Self::default();
            *cache.value.lock().unwrap() = Some(serde_json::to_string(document).unwrap());
            cache
        }

        pub fn raw(&self) -> Option<String> {
            self.value.lock().unwrap().clone()
        }

        pub fn set_raw(&self, raw: &str) {
            *self.value.lock().unwrap() = Some(raw.to_string());
        }

        pub fn document(&self) -> Option<ResumeDocument> {
            self.raw().map(|raw| serde_json::from_str(&raw).unwrap())
        }
    }

    #[async_trait]
    impl LocalCache for MemoryCache {
        async fn read(&self) -> Result<Option<String>, SyncError> {
            Ok(self.raw())
        }

        async fn write(&self, value: &str) -> Result<(), SyncError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(SyncError::Cache("quota exceeded".to_string()));
            }
            self.writes.fetch_add(1, Ordering::SeqCst);
            *self.value.lock().unwrap() = Some(value.to_string());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::memory::MemoryCache;
    use super::*;

    #[tokio::test]
    async fn test_file_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("nested"));
        assert!(load_cached(&cache).await.is_none());

        let mut doc = ResumeDocument::skeleton();
        doc.personal_info.full_name = "Alex".to_string();
        mirror(&cache, &doc).await;

        assert!(cache.path().ends_with("resumeData.json"));
        assert_eq!(load_cached(&cache).await, Some(doc));
    }

    #[tokio::test]
    async fn test_mirror_overwrites_single_entry() {
        let cache = MemoryCache::default();
        let mut doc = ResumeDocument::skeleton();
        mirror(&cache, &doc).await;
        doc.personal_info.summary = "Builder".to_string();
        mirror(&cache, &doc).await;
        assert_eq!(cache.document(), Some(doc));
        assert_eq!(cache.writes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_mirror_swallows_write_failure() {
        let cache = MemoryCache::default();
        cache.fail_writes.store(true, Ordering::SeqCst);
        mirror(&cache, &ResumeDocument::skeleton()).await;
        assert!(cache.raw().is_none());
    }

    #[tokio::test]
    async fn test_garbage_entry_is_treated_as_absent() {
        let cache = MemoryCache::default();
        cache.set_raw("{not json");
        assert!(load_cached(&cache).await.is_none());
    }
}
