use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::export::{export_to_pdf, PdfOptions};
use crate::models::resume::ResumeTemplate;
use crate::render::render;
use crate::session::Owner;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    pub file_name: Option<String>,
}

#[derive(Serialize)]
pub struct ExportAccepted {
    pub file: String,
    pub template: ResumeTemplate,
}

/// POST /api/v1/resume/export
/// Queues a PDF export of the current preview. The result is only logged.
pub async fn handle_export(
    State(state): State<AppState>,
    owner: Owner,
    Query(query): Query<ExportQuery>,
) -> Result<(StatusCode, Json<ExportAccepted>), AppError> {
    let snapshot = state.sessions.open(owner.0).await.store.snapshot();
    let rendered = render(&snapshot.document, snapshot.template);
    let options = query
        .file_name
        .as_deref()
        .map(PdfOptions::named)
        .unwrap_or_default();

    let accepted = ExportAccepted {
        file: options.output_file(),
        template: rendered.template,
    };
    export_to_pdf(state.rasterizer.clone(), rendered, options);
    Ok((StatusCode::ACCEPTED, Json(accepted)))
}
