//! Health and status handlers

use crate::api::state::AppState;
use axum::{extract::State, Json};
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub version: String,
    pub uptime: String,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime: state.uptime(),
    })
}

/// Daemon status response
#[derive(Debug, Serialize)]
pub struct DaemonStatusResponse {
    pub status: String,
    pub version: String,
    pub uptime: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub stats: PoolStats,
}

/// Pool statistics
#[derive(Debug, Serialize)]
pub struct PoolStats {
    pub gifts: usize,
    pub persons: usize,
    pub onboarded_persons: usize,
    pub active_notifications: usize,
    pub fulfilled_notifications: usize,
}

/// Daemon status endpoint
pub async fn daemon_status(State(state): State<AppState>) -> Json<DaemonStatusResponse> {
    let persons = state.ctx.ledger.persons().await;
    let onboarded = persons.iter().filter(|person| person.onboarded).count();
    let counts = state.ctx.registry.counts().await;
    let gifts = state.ctx.ledger.catalog().await.len();

    Json(DaemonStatusResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime: state.uptime(),
        started_at: state.started_at,
        stats: PoolStats {
            gifts,
            persons: persons.len(),
            onboarded_persons: onboarded,
            active_notifications: counts.active,
            fulfilled_notifications: counts.fulfilled,
        },
    })
}
