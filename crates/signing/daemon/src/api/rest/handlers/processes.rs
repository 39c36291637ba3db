//! Signing process handlers

use crate::api::rest::payloads::{CreateProcessRequest, CreateProcessResponse, StatusResponse};
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use signing_types::{
    AuditEvent, DocumentId, ProcessFilter, ProcessId, ProcessStatus, ProcessStatusView,
    SignerSlot, SigningProcess, VerificationResult,
};

/// List processes query params
#[derive(Debug, Deserialize)]
pub struct ListProcessesQuery {
    pub status: Option<ProcessStatus>,
    pub document_id: Option<String>,
    pub limit: Option<usize>,
}

/// Create a process and open it for signing
pub async fn create_process(
    State(state): State<AppState>,
    Json(request): Json<CreateProcessRequest>,
) -> ApiResult<(StatusCode, Json<CreateProcessResponse>)> {
    let metadata = request.metadata();
    let document = request.document.into_input()?;

    let process_id = state
        .engine
        .create_process(document, request.signers, request.mode, request.due_at, metadata)
        .await?;
    let process = state.engine.get_process(&process_id).await?;
    let status = state.engine.get_status(&process_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateProcessResponse {
            process_id,
            document_id: process.document_id,
            status,
        }),
    ))
}

/// List processes, newest first
pub async fn list_processes(
    State(state): State<AppState>,
    Query(query): Query<ListProcessesQuery>,
) -> ApiResult<Json<Vec<SigningProcess>>> {
    let filter = ProcessFilter {
        status: query.status,
        document_id: query.document_id.map(DocumentId::new),
        limit: query.limit,
    };
    Ok(Json(state.engine.list_processes(&filter).await?))
}

/// Status, progress and eligible slots
pub async fn get_process_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProcessStatusView>> {
    Ok(Json(state.engine.get_status(&ProcessId::new(id)).await?))
}

/// All slots in sequence order
pub async fn list_slots(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<SignerSlot>>> {
    Ok(Json(state.engine.get_slots(&ProcessId::new(id)).await?))
}

/// Expire the process if it is overdue at server time
pub async fn evaluate_expiry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let process_id = ProcessId::new(id);
    let status = state
        .engine
        .evaluate_expiry(&process_id, chrono::Utc::now())
        .await?;
    Ok(Json(StatusResponse {
        process_id,
        slot_id: None,
        status,
    }))
}

/// Replay the integrity chain
pub async fn verify_process(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<VerificationResult>> {
    Ok(Json(state.engine.verify(&ProcessId::new(id)).await?))
}

/// Hash-linked audit trail in append order
pub async fn get_audit_trail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<AuditEvent>>> {
    Ok(Json(state.engine.audit_trail(&ProcessId::new(id)).await?))
}
