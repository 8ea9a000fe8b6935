use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::resume::{
    EducationPatch, ExperiencePatch, PersonalInfoPatch, ProjectPatch, ResumeTemplate, SkillPatch,
};
use crate::session::Owner;
use crate::state::AppState;
use crate::store::{Answered, DocumentStore, ResumeSnapshot};

type SnapshotResult = Result<Json<ResumeSnapshot>, AppError>;

#[derive(Serialize)]
pub struct AddedItem {
    pub id: String,
    pub snapshot: ResumeSnapshot,
}

#[derive(Deserialize)]
pub struct BulletBody {
    pub value: String,
}

#[derive(Deserialize)]
pub struct TemplateBody {
    pub template: ResumeTemplate,
}

/// The confirmation collaborator's answer.
#[derive(Deserialize)]
pub struct ResetBody {
    pub confirm: bool,
}

#[derive(Serialize)]
pub struct ResetResponse {
    pub reset: bool,
    pub snapshot: ResumeSnapshot,
}

fn view(snapshot: Arc<ResumeSnapshot>) -> Json<ResumeSnapshot> {
    Json(ResumeSnapshot::clone(&snapshot))
}

async fn store_for(state: &AppState, owner: Owner) -> Arc<DocumentStore> {
    state.sessions.open(owner.0).await.store.clone()
}

fn added(store: &DocumentStore, id: String) -> Json<AddedItem> {
    Json(AddedItem {
        id,
        snapshot: ResumeSnapshot::clone(&store.snapshot()),
    })
}

/// GET /api/v1/resume
pub async fn handle_get_resume(State(state): State<AppState>, owner: Owner) -> SnapshotResult {
    Ok(view(store_for(&state, owner).await.snapshot()))
}

/// PATCH /api/v1/resume/personal-info
pub async fn handle_update_personal_info(
    State(state): State<AppState>,
    owner: Owner,
    Json(patch): Json<PersonalInfoPatch>,
) -> SnapshotResult {
    Ok(view(store_for(&state, owner).await.update_personal_info(patch)))
}

// ── Education ───────────────────────────────────────────────────────────────

/// POST /api/v1/resume/education
pub async fn handle_add_education(
    State(state): State<AppState>,
    owner: Owner,
) -> Result<Json<AddedItem>, AppError> {
    let store = store_for(&state, owner).await;
    let id = store.add_education();
    Ok(added(&store, id))
}

/// PATCH /api/v1/resume/education/:id
pub async fn handle_update_education(
    State(state): State<AppState>,
    owner: Owner,
    Path(id): Path<String>,
    Json(patch): Json<EducationPatch>,
) -> SnapshotResult {
    Ok(view(store_for(&state, owner).await.update_education(&id, patch)))
}

/// DELETE /api/v1/resume/education/:id
pub async fn handle_remove_education(
    State(state): State<AppState>,
    owner: Owner,
    Path(id): Path<String>,
) -> SnapshotResult {
    Ok(view(store_for(&state, owner).await.remove_education(&id)))
}

// ── Experience ──────────────────────────────────────────────────────────────

/// POST /api/v1/resume/experience
pub async fn handle_add_experience(
    State(state): State<AppState>,
    owner: Owner,
) -> Result<Json<AddedItem>, AppError> {
    let store = store_for(&state, owner).await;
    let id = store.add_experience();
    Ok(added(&store, id))
}

/// PATCH /api/v1/resume/experience/:id
pub async fn handle_update_experience(
    State(state): State<AppState>,
    owner: Owner,
    Path(id): Path<String>,
    Json(patch): Json<ExperiencePatch>,
) -> SnapshotResult {
    Ok(view(store_for(&state, owner).await.update_experience(&id, patch)))
}

/// DELETE /api/v1/resume/experience/:id
pub async fn handle_remove_experience(
    State(state): State<AppState>,
    owner: Owner,
    Path(id): Path<String>,
) -> SnapshotResult {
    Ok(view(store_for(&state, owner).await.remove_experience(&id)))
}

/// POST /api/v1/resume/experience/:id/bullets
pub async fn handle_add_bullet(
    State(state): State<AppState>,
    owner: Owner,
    Path(id): Path<String>,
) -> SnapshotResult {
    Ok(view(store_for(&state, owner).await.add_bullet_to_experience(&id)))
}

/// PUT /api/v1/resume/experience/:id/bullets/:index
pub async fn handle_update_bullet(
    State(state): State<AppState>,
    owner: Owner,
    Path((id, index)): Path<(String, usize)>,
    Json(body): Json<BulletBody>,
) -> SnapshotResult {
    let store = store_for(&state, owner).await;
    Ok(view(store.update_bullet_in_experience(&id, index, body.value)))
}

/// DELETE /api/v1/resume/experience/:id/bullets/:index
pub async fn handle_remove_bullet(
    State(state): State<AppState>,
    owner: Owner,
    Path((id, index)): Path<(String, usize)>,
) -> SnapshotResult {
    let store = store_for(&state, owner).await;
    Ok(view(store.remove_bullet_from_experience(&id, index)))
}

// ── Skills ──────────────────────────────────────────────────────────────────

/// POST /api/v1/resume/skills
pub async fn handle_add_skill(
    State(state): State<AppState>,
    owner: Owner,
) -> Result<Json<AddedItem>, AppError> {
    let store = store_for(&state, owner).await;
    let id = store.add_skill();
    Ok(added(&store, id))
}

/// PATCH /api/v1/resume/skills/:id
pub async fn handle_update_skill(
    State(state): State<AppState>,
    owner: Owner,
    Path(id): Path<String>,
    Json(patch): Json<SkillPatch>,
) -> SnapshotResult {
    Ok(view(store_for(&state, owner).await.update_skill(&id, patch)))
}

/// DELETE /api/v1/resume/skills/:id
pub async fn handle_remove_skill(
    State(state): State<AppState>,
    owner: Owner,
    Path(id): Path<String>,
) -> SnapshotResult {
    Ok(view(store_for(&state, owner).await.remove_skill(&id)))
}

// ── Projects ────────────────────────────────────────────────────────────────

/// POST /api/v1/resume/projects
pub async fn handle_add_project(
    State(state): State<AppState>,
    owner: Owner,
) -> Result<Json<AddedItem>, AppError> {
    let store = store_for(&state, owner).await;
    let id = store.add_project();
    Ok(added(&store, id))
}

/// PATCH /api/v1/resume/projects/:id
pub async fn handle_update_project(
    State(state): State<AppState>,
    owner: Owner,
    Path(id): Path<String>,
    Json(patch): Json<ProjectPatch>,
) -> SnapshotResult {
    Ok(view(store_for(&state, owner).await.update_project(&id, patch)))
}

/// DELETE /api/v1/resume/projects/:id
pub async fn handle_remove_project(
    State(state): State<AppState>,
    owner: Owner,
    Path(id): Path<String>,
) -> SnapshotResult {
    Ok(view(store_for(&state, owner).await.remove_project(&id)))
}

// ── Whole document ──────────────────────────────────────────────────────────

/// PUT /api/v1/resume/template
pub async fn handle_set_template(
    State(state): State<AppState>,
    owner: Owner,
    Json(body): Json<TemplateBody>,
) -> SnapshotResult {
    Ok(view(store_for(&state, owner).await.set_selected_template(body.template)))
}

/// POST /api/v1/resume/reset
pub async fn handle_reset(
    State(state): State<AppState>,
    owner: Owner,
    Json(body): Json<ResetBody>,
) -> Result<Json<ResetResponse>, AppError> {
    let store = store_for(&state, owner).await;
    let reset = store.reset_resume_data(&Answered(body.confirm));
    Ok(Json(ResetResponse {
        reset,
        snapshot: ResumeSnapshot::clone(&store.snapshot()),
    }))
}
