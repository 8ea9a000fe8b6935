//! Persistence synchronizer. Keeps the local cache and the remote store
//! eventually consistent with the Document Store without blocking mutations.
//!
//! Lifecycle: `initialize` loads (remote for an owner, local cache otherwise) and
//! starts the background tasks; `set_owner` reacts to identity transitions;
//! `shutdown` (or drop) stops future timer firings and the local mirror. In-flight
//! saves are never aborted.
//!
//! State machine:
//! `Idle → LoadingRemote → (Loaded | LoadFailed) → Idle`
//! `Idle → Saving → (Saved | SaveFailed) → Idle`
//!
//! The autosave timer pushes unconditionally every interval. There is no dirty
//! check; the snapshot `revision` is informational only.

pub mod coordinator;
pub mod handlers;
pub mod local_cache;
pub mod remote;

use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::resume::{ResumeDocument, ResumeTemplate};
use crate::models::row::ResumeRow;
use crate::store::DocumentStore;
use coordinator::{spawn_save_worker, SaveRequest, SaveSender};
use local_cache::LocalCache;
use remote::RemoteStore;

pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Error)]
pub enum SyncError {
    #[error("No authenticated owner")]
    NoOwner,

    #[error("Remote store error: {0}")]
    Remote(String),

    #[error("Local cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Synchronizer is shut down")]
    Closed,
}

impl From<sqlx::Error> for SyncError {
    fn from(e: sqlx::Error) -> Self {
        SyncError::Remote(e.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        SyncError::Remote(e.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(e: std::io::Error) -> Self {
        SyncError::Cache(e.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        SyncError::Serialization(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Idle,
    LoadingRemote,
    Loaded,
    LoadFailed,
    Saving,
    Saved,
    SaveFailed,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    pub state: SyncState,
    pub owner: Option<Uuid>,
    pub last_saved_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub autosave_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            autosave_interval: DEFAULT_AUTOSAVE_INTERVAL,
        }
    }
}

/// State shared between the synchronizer handle and its background tasks.
/// Holds read access to the store only through snapshots and load-time replacement.
pub(crate) struct SyncShared {
    store: Arc<DocumentStore>,
    cache: RwLock<Arc<dyn LocalCache>>,
    remote: Arc<dyn RemoteStore>,
    owner: watch::Sender<Option<Uuid>>,
    status: watch::Sender<SyncStatus>,
}

impl SyncShared {
    fn cache(&self) -> Arc<dyn LocalCache> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn transition(&self, state: SyncState) {
        self.status.send_modify(|s| s.state = state);
    }

    fn record_error(&self, state: SyncState, message: String) {
        self.status.send_modify(|s| {
            s.state = state;
            s.last_error = Some(message);
        });
    }

    /// Upserts the current snapshot for the current owner.
    pub(crate) async fn push_remote(&self) -> Result<(), SyncError> {
        let owner = (*self.owner.borrow()).ok_or(SyncError::NoOwner)?;
        let snapshot = self.store.snapshot();
        let row = ResumeRow::new(owner, &snapshot.document, snapshot.template)?;

        self.transition(SyncState::Saving);
        let result = self.remote.upsert(&row).await;
        match &result {
            Ok(()) => {
                debug!("Saved revision {} for {owner}", snapshot.revision);
                self.status.send_modify(|s| {
                    s.state = SyncState::Saved;
                    s.last_saved_at = Some(row.updated_at);
                    s.last_error = None;
                });
            }
            Err(e) => self.record_error(SyncState::SaveFailed, e.to_string()),
        }
        self.transition(SyncState::Idle);
        result
    }

    /// Loads the document for `owner`. Errors are logged, never returned.
    async fn load(&self, owner: Option<Uuid>, previous: Option<Uuid>) {
        let Some(owner) = owner else {
            self.restore_local().await;
            return;
        };

        self.transition(SyncState::LoadingRemote);
        match self.remote.fetch_latest(owner).await {
            Ok(Some(row)) => match row.document() {
                Ok(document) => {
                    let snapshot = self.store.replace(document, row.template());
                    info!(
                        "Loaded resume for {owner} saved at {} (revision {})",
                        row.updated_at, snapshot.revision
                    );
                    self.transition(SyncState::Loaded);
                }
                Err(e) => {
                    warn!("Remote row for {owner} is not a resume document: {e}");
                    self.restore_local().await;
                    self.record_error(SyncState::LoadFailed, e.to_string());
                }
            },
            Ok(None) => {
                // Another owner's document must not carry over into this account.
                if previous.is_some() {
                    self.store.replace(ResumeDocument::skeleton(), ResumeTemplate::default());
                }
                info!("No saved resume for {owner}; keeping the current document");
                self.transition(SyncState::Loaded);
            }
            Err(e) => {
                warn!("Remote load failed for {owner}: {e}");
                self.restore_local().await;
                self.record_error(SyncState::LoadFailed, e.to_string());
            }
        }
        self.transition(SyncState::Idle);
    }

    /// Local cache if present, default skeleton otherwise.
    async fn restore_local(&self) {
        match local_cache::load_cached(self.cache().as_ref()).await {
            Some(document) => {
                info!("Restored resume from local cache");
                self.store.replace_document(document);
            }
            None => {
                debug!("No local cache entry; using defaults");
                self.store.replace_document(ResumeDocument::skeleton());
            }
        }
    }
}

struct SyncTasks {
    save_tx: SaveSender,
    worker: JoinHandle<()>,
    mirror: JoinHandle<()>,
    autosave: Option<JoinHandle<()>>,
}

pub struct Synchronizer {
    shared: Arc<SyncShared>,
    config: SyncConfig,
    tasks: Mutex<Option<SyncTasks>>,
}

impl Synchronizer {
    pub fn new(
        store: Arc<DocumentStore>,
        cache: Arc<dyn LocalCache>,
        remote: Arc<dyn RemoteStore>,
        config: SyncConfig,
    ) -> Self {
        let (owner, _) = watch::channel(None);
        let (status, _) = watch::channel(SyncStatus {
            state: SyncState::Idle,
            owner: None,
            last_saved_at: None,
            last_error: None,
        });
        Self {
            shared: Arc::new(SyncShared {
                store,
                cache: RwLock::new(cache),
                remote,
                owner,
                status,
            }),
            config,
            tasks: Mutex::new(None),
        }
    }

    /// Loads the initial document and starts the mirror, save worker and
    /// (for an authenticated owner) the autosave timer.
    pub async fn initialize(&self, owner: Option<Uuid>) {
        self.start_background();
        self.switch_owner(owner).await;
    }

    /// Reacts to an identity transition: present → remote load, absent → local fallback.
    pub async fn set_owner(&self, owner: Option<Uuid>) {
        if *self.shared.owner.borrow() == owner {
            return;
        }
        self.switch_owner(owner).await;
    }

    /// Like `set_owner`, but first points the local mirror at `cache`, so no
    /// snapshot loaded for the new owner reaches the previous owner's cache.
    pub async fn set_owner_with_cache(&self, owner: Option<Uuid>, cache: Arc<dyn LocalCache>) {
        *self
            .shared
            .cache
            .write()
            .unwrap_or_else(PoisonError::into_inner) = cache;
        self.set_owner(owner).await;
    }

    async fn switch_owner(&self, owner: Option<Uuid>) {
        let previous = *self.shared.owner.borrow();
        info!("Synchronizer owner: {previous:?} → {owner:?}");

        self.stop_autosave();
        self.shared.load(owner, previous).await;
        self.shared.owner.send_replace(owner);
        self.shared.status.send_modify(|s| s.owner = owner);

        if owner.is_some() {
            self.start_autosave();
        }
    }

    /// User-invoked save. Overlapping calls share one upsert of the latest state.
    pub async fn save_now(&self) -> Result<(), SyncError> {
        let save_tx = self
            .lock_tasks()
            .as_ref()
            .map(|t| t.save_tx.clone())
            .ok_or(SyncError::Closed)?;
        let (request, reply) = SaveRequest::explicit();
        save_tx.send(request).map_err(|_| SyncError::Closed)?;
        reply.await.map_err(|_| SyncError::Closed)?
    }

    pub fn owner(&self) -> Option<Uuid> {
        *self.shared.owner.borrow()
    }

    pub fn status(&self) -> SyncStatus {
        self.shared.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.shared.status.subscribe()
    }

    /// Stops the timer and the mirror. The save worker finishes any in-flight
    /// upsert and then exits; await the returned handle to wait for it.
    pub fn shutdown(&self) -> Option<JoinHandle<()>> {
        let tasks = self.lock_tasks().take()?;
        tasks.mirror.abort();
        if let Some(autosave) = tasks.autosave {
            autosave.abort();
        }
        info!("Synchronizer shut down");
        Some(tasks.worker)
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, Option<SyncTasks>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start_background(&self) {
        let mut tasks = self.lock_tasks();
        if tasks.is_some() {
            return;
        }
        let mirror = spawn_mirror(self.shared.clone());
        let (save_tx, worker) = spawn_save_worker(self.shared.clone());
        *tasks = Some(SyncTasks {
            save_tx,
            worker,
            mirror,
            autosave: None,
        });
    }

    fn start_autosave(&self) {
        let mut tasks = self.lock_tasks();
        if let Some(tasks) = tasks.as_mut() {
            let handle = spawn_autosave(tasks.save_tx.clone(), self.config.autosave_interval);
            if let Some(old) = tasks.autosave.replace(handle) {
                old.abort();
            }
            debug!(
                "Autosave every {}s",
                self.config.autosave_interval.as_secs()
            );
        }
    }

    fn stop_autosave(&self) {
        if let Some(handle) = self.lock_tasks().as_mut().and_then(|t| t.autosave.take()) {
            handle.abort();
        }
    }
}

impl Drop for Synchronizer {
    fn drop(&mut self) {
        // Dropping the handle detaches the worker.
        let _ = self.shutdown();
    }
}

/// Overwrites the local cache with every published snapshot.
fn spawn_mirror(shared: Arc<SyncShared>) -> JoinHandle<()> {
    let mut rx = shared.store.subscribe();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();
            let cache = shared.cache();
            local_cache::mirror(cache.as_ref(), &snapshot.document).await;
        }
    })
}

/// Fires a periodic save request every `period`, whether or not anything changed.
fn spawn_autosave(save_tx: SaveSender, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            debug!("Autosave tick");
            if save_tx.send(SaveRequest::periodic()).is_err() {
                break;
            }
        }
    })
}
