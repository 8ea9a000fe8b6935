use std::sync::Arc;

use crate::export::PdfRasterizer;
use crate::session::SessionRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// One editing session (document store + synchronizer) per owner.
    pub sessions: Arc<SessionRegistry>,
    pub rasterizer: Arc<dyn PdfRasterizer>,
}
