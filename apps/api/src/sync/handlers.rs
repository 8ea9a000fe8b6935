use axum::{extract::State, http::StatusCode, Json};

use crate::errors::AppError;
use crate::session::Owner;
use crate::state::AppState;
use crate::store::ResumeSnapshot;
use crate::sync::SyncStatus;

/// POST /api/v1/resume/save
/// Pushes the latest snapshot to the remote store and reports the resulting status.
pub async fn handle_save(
    State(state): State<AppState>,
    owner: Owner,
) -> Result<Json<SyncStatus>, AppError> {
    let session = state.sessions.open(owner.0).await;
    session.sync.save_now().await?;
    Ok(Json(session.sync.status()))
}

/// GET /api/v1/resume/sync
pub async fn handle_sync_status(
    State(state): State<AppState>,
    owner: Owner,
) -> Result<Json<SyncStatus>, AppError> {
    let session = state.sessions.open(owner.0).await;
    Ok(Json(session.sync.status()))
}

/// POST /api/v1/session
/// Signs the owner in. A guest draft carries over unless the owner has a saved résumé.
pub async fn handle_sign_in(
    State(state): State<AppState>,
    owner: Owner,
) -> Result<Json<ResumeSnapshot>, AppError> {
    let owner = owner.0.ok_or(AppError::Unauthorized)?;
    let session = state.sessions.sign_in(owner).await;
    Ok(Json(ResumeSnapshot::clone(&session.store.snapshot())))
}

/// DELETE /api/v1/session
/// Signs the owner out: the session's timer and mirror stop, in-flight saves finish.
pub async fn handle_sign_out(
    State(state): State<AppState>,
    owner: Owner,
) -> Result<StatusCode, AppError> {
    let owner = owner.0.ok_or(AppError::Unauthorized)?;
    state.sessions.close(Some(owner)).await;
    Ok(StatusCode::NO_CONTENT)
}
