//! Editing sessions, one per owner identity.
//!
//! The authentication collaborator supplies the owner as the `x-owner-id` header.
//! Requests without it share one anonymous, local-cache-only session. Sign-in
//! hands that session over to the owner; sign-out closes the owner's session.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tokio::sync::{Mutex, OnceCell};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::store::DocumentStore;
use crate::sync::local_cache::FileCache;
use crate::sync::remote::RemoteStore;
use crate::sync::{SyncConfig, Synchronizer};

pub const OWNER_HEADER: &str = "x-owner-id";

/// The authenticated owner of a request, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner(pub Option<Uuid>);

#[async_trait]
impl<S> FromRequestParts<S> for Owner
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(OWNER_HEADER) else {
            return Ok(Owner(None));
        };
        value
            .to_str()
            .ok()
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .map(|id| Owner(Some(id)))
            .ok_or(AppError::Unauthorized)
    }
}

pub struct Session {
    pub store: Arc<DocumentStore>,
    pub sync: Synchronizer,
}

/// A session slot. Initialized once, outside the registry lock.
type SessionSlot = Arc<OnceCell<Arc<Session>>>;

pub struct SessionRegistry {
    sessions: Mutex<HashMap<Option<Uuid>, SessionSlot>>,
    remote: Arc<dyn RemoteStore>,
    cache_root: PathBuf,
    sync_config: SyncConfig,
}

impl SessionRegistry {
    pub fn new(remote: Arc<dyn RemoteStore>, cache_root: PathBuf, sync_config: SyncConfig) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            remote,
            cache_root,
            sync_config,
        }
    }

    /// Returns the owner's session, loading it on first use. Only callers for
    /// the same owner wait on that load.
    pub async fn open(&self, owner: Option<Uuid>) -> Arc<Session> {
        let slot = self.slot(owner).await;
        let session = slot.get_or_init(|| self.start(owner)).await.clone();
        session
    }

    /// Signs `owner` in. An open anonymous session is handed over to the owner:
    /// its local mirror moves to the owner's cache, then its synchronizer loads
    /// the owner's saved row or keeps the guest draft when there is none.
    /// Otherwise behaves like `open`.
    pub async fn sign_in(&self, owner: Uuid) -> Arc<Session> {
        let (slot, guest) = {
            let mut sessions = self.sessions.lock().await;
            if let Some(slot) = sessions.get(&Some(owner)) {
                let slot = slot.clone();
                drop(sessions);
                let session = slot.get_or_init(|| self.start(Some(owner))).await.clone();
                return session;
            }
            let slot = SessionSlot::default();
            sessions.insert(Some(owner), slot.clone());
            (slot, sessions.remove(&None))
        };

        let session = slot
            .get_or_init(|| async {
                let Some(guest) = guest else {
                    return self.start(Some(owner)).await;
                };
                let session = guest.get_or_init(|| self.start(None)).await.clone();
                let cache = Arc::new(FileCache::new(self.cache_dir(Some(owner))));
                session.sync.set_owner_with_cache(Some(owner), cache).await;
                info!("Signed in {owner}; guest session handed over");
                session
            })
            .await
            .clone();
        session
    }

    /// Tears down the owner's session. Returns whether one was open.
    pub async fn close(&self, owner: Option<Uuid>) -> bool {
        let removed = self.sessions.lock().await.remove(&owner);
        match removed.and_then(|slot| slot.get().cloned()) {
            Some(session) => {
                // Sign-out does not wait for an in-flight save.
                let _ = session.sync.shutdown();
                info!("Closed editing session for {}", describe(owner));
                true
            }
            None => false,
        }
    }

    /// Closes every session and waits for in-flight saves to finish.
    pub async fn close_all(&self) {
        let slots: Vec<_> = self.sessions.lock().await.drain().collect();
        for (owner, slot) in slots {
            let Some(session) = slot.get() else {
                continue;
            };
            if let Some(worker) = session.sync.shutdown() {
                if let Err(e) = worker.await {
                    warn!("Save worker for {} ended abnormally: {e}", describe(owner));
                }
            }
        }
    }

    async fn slot(&self, owner: Option<Uuid>) -> SessionSlot {
        self.sessions
            .lock()
            .await
            .entry(owner)
            .or_default()
            .clone()
    }

    /// Builds a session and runs its initial load.
    async fn start(&self, owner: Option<Uuid>) -> Arc<Session> {
        let store = Arc::new(DocumentStore::new());
        let cache = Arc::new(FileCache::new(self.cache_dir(owner)));
        let cache_path = cache.path().to_path_buf();
        let sync = Synchronizer::new(
            store.clone(),
            cache,
            self.remote.clone(),
            self.sync_config.clone(),
        );
        sync.initialize(owner).await;

        info!(
            "Opened editing session for {} (cache {})",
            describe(owner),
            cache_path.display()
        );
        Arc::new(Session { store, sync })
    }

    fn cache_dir(&self, owner: Option<Uuid>) -> PathBuf {
        match owner {
            Some(id) => self.cache_root.join(id.to_string()),
            None => self.cache_root.join("anonymous"),
        }
    }
}

fn describe(owner: Option<Uuid>) -> String {
    owner.map_or_else(|| "anonymous".to_string(), |id| id.to_string())
}
