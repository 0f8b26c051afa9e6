//! Rollcall -- face-verified attendance for video meetings.
//!
//! This crate provides the roster normalizer, the per-target capture
//! session, the host auto-trigger, attendance persistence and CSV export,
//! plus the HTTP API that exposes them.

pub mod api;
pub mod attendance;
pub mod capture;
pub mod config;
pub mod export;
pub mod meeting;
pub mod roster;
pub mod scheduler;
pub mod simulate;
pub mod storage;
pub mod transport;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::attendance::SimulatedVerifier;
use crate::capture::SimulatedCamera;
use crate::config::RollcallConfig;
use crate::meeting::{MeetingDeps, MeetingRegistry};

/// Start the Rollcall daemon: storage, meeting registry, and API server.
pub async fn serve(config: RollcallConfig) -> Result<()> {
    let db_path = config.storage.db_path.clone();
    tracing::info!(db_path = %db_path.display(), "Initializing database");
    let pool = storage::open_pool(&db_path)?;

    let verifier = SimulatedVerifier::new(config.attendance.failure_threshold);
    let deps = MeetingDeps {
        pool,
        device: Arc::new(SimulatedCamera::new()),
        verifier: Arc::new(verifier),
        config: Arc::new(config),
    };
    let bind = deps.config.server.bind.clone();
    let app = api::router(api::state::AppState::new(MeetingRegistry::new(deps)));

    let addr: std::net::SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid bind address: {bind}"))?;
    tracing::info!(%addr, "Rollcall listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Rollcall stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
