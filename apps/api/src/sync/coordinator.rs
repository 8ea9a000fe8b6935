//! Single-flight save coordinator.
//!
//! Save requests from any trigger go through one channel to one worker. While an
//! upsert is in flight, new requests queue; when it finishes, every queued request
//! is collapsed into one upsert of the then-current snapshot. At most one call is
//! in flight and at most one more represents everything that arrived meanwhile.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::sync::{SyncError, SyncShared};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTrigger {
    /// User-invoked; the outcome is returned to the caller.
    Explicit,
    /// Autosave timer; the outcome is only logged.
    Periodic,
}

pub(crate) struct SaveRequest {
    trigger: SaveTrigger,
    reply: Option<oneshot::Sender<Result<(), SyncError>>>,
}

impl SaveRequest {
    pub(crate) fn periodic() -> Self {
        Self {
            trigger: SaveTrigger::Periodic,
            reply: None,
        }
    }

    pub(crate) fn explicit() -> (Self, oneshot::Receiver<Result<(), SyncError>>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                trigger: SaveTrigger::Explicit,
                reply: Some(tx),
            },
            rx,
        )
    }
}

pub(crate) type SaveSender = mpsc::UnboundedSender<SaveRequest>;

/// Spawns the save worker. It exits once every sender is dropped and the
/// in-flight upsert, if any, has completed.
pub(crate) fn spawn_save_worker(shared: Arc<SyncShared>) -> (SaveSender, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<SaveRequest>();

    let handle = tokio::spawn(async move {
        while let Some(first) = rx.recv().await {
            let mut batch = vec![first];
            while let Ok(next) = rx.try_recv() {
                batch.push(next);
            }
            if batch.len() > 1 {
                debug!("Collapsed {} save requests into one upsert", batch.len());
            }

            let result = shared.push_remote().await;

            let mut periodic = false;
            for request in batch {
                periodic |= request.trigger == SaveTrigger::Periodic;
                if let Some(reply) = request.reply {
                    // The caller may have gone away; nothing to do then.
                    let _ = reply.send(result.clone());
                }
            }
            if periodic {
                if let Err(e) = &result {
                    warn!("Periodic save failed, will try again on the next tick: {e}");
                }
            }
        }
        debug!("Save worker stopped");
    });

    (tx, handle)
}
