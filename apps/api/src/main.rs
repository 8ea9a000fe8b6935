mod config;
mod db;
mod errors;
mod export;
mod ids;
mod models;
mod render;
mod routes;
mod session;
mod state;
mod store;
mod sync;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::{Config, RemoteBackend};
use crate::db::{create_pool, run_migrations};
use crate::export::CommandRasterizer;
use crate::routes::build_router;
use crate::session::SessionRegistry;
use crate::state::AppState;
use crate::sync::remote::{PgRemoteStore, RemoteStore, RestRemoteStore};
use crate::sync::SyncConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Vitae API v{}", env!("CARGO_PKG_VERSION"));

    // Remote résumé table
    let remote: Arc<dyn RemoteStore> = match &config.remote {
        RemoteBackend::Postgres { database_url } => {
            let db = create_pool(database_url).await?;
            run_migrations(&db).await?;
            Arc::new(PgRemoteStore::new(db))
        }
        RemoteBackend::Rest { base_url, api_key } => {
            info!("Using hosted row API at {base_url}");
            Arc::new(RestRemoteStore::new(base_url.clone(), api_key.clone())?)
        }
    };

    let rasterizer = Arc::new(CommandRasterizer::new(
        config.pdf_command.clone(),
        config.export_dir.clone(),
    ));
    info!(
        "PDF exports via `{}` into {}",
        config.pdf_command,
        config.export_dir.display()
    );

    let sessions = Arc::new(SessionRegistry::new(
        remote,
        config.cache_dir.clone(),
        SyncConfig {
            autosave_interval: config.autosave_interval,
        },
    ));

    let state = AppState {
        sessions: sessions.clone(),
        rasterizer,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop timers and mirrors; in-flight saves run to completion.
    sessions.close_all().await;
    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
