use axum::{
    extract::{Query, State},
    response::Html,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::resume::ResumeTemplate;
use crate::render::render;
use crate::session::Owner;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PreviewQuery {
    /// Overrides the selected template for this render only.
    pub template: Option<ResumeTemplate>,
}

/// GET /api/v1/resume/preview
pub async fn handle_preview(
    State(state): State<AppState>,
    owner: Owner,
    Query(query): Query<PreviewQuery>,
) -> Result<Html<String>, AppError> {
    let snapshot = state.sessions.open(owner.0).await.store.snapshot();
    let template = query.template.unwrap_or(snapshot.template);
    Ok(Html(render(&snapshot.document, template).html))
}
