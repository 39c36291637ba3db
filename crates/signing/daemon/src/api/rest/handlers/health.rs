//! Health and status handlers

use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{extract::State, Json};
use serde::Serialize;
use signing_types::{ProcessFilter, ProcessStatus};

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
    pub stats: DaemonStats,
}

/// Process counts by status
#[derive(Debug, Default, Serialize)]
pub struct DaemonStats {
    pub total_processes: usize,
    pub draft: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub rejected: usize,
    pub expired: usize,
}

/// Daemon status endpoint
pub async fn daemon_status(State(state): State<AppState>) -> ApiResult<Json<DaemonStatusResponse>> {
    let processes = state.engine.list_processes(&ProcessFilter::default()).await?;

    let mut stats = DaemonStats {
        total_processes: processes.len(),
        ..Default::default()
    };
    for process in &processes {
        match process.status {
            ProcessStatus::Draft => stats.draft += 1,
            ProcessStatus::InProgress => stats.in_progress += 1,
            ProcessStatus::Completed => stats.completed += 1,
            ProcessStatus::Rejected => stats.rejected += 1,
            ProcessStatus::Expired => stats.expired += 1,
        }
    }

    Ok(Json(DaemonStatusResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime: state.uptime(),
        started_at: state.started_at,
        stats,
    }))
}
