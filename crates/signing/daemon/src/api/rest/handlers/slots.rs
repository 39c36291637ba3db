//! Slot commit and reject handlers

use crate::api::rest::payloads::{CommitSlotRequest, RejectSlotRequest, StatusResponse};
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use signing_engine::CommitRequest;
use signing_types::{ProcessId, SlotCommitResult, SlotId};

const IDEMPOTENCY_HEADER: &str = "idempotency-key";

/// Commit an artifact into a slot
pub async fn commit_slot(
    State(state): State<AppState>,
    Path((id, slot)): Path<(String, String)>,
    headers: HeaderMap,
    Json(request): Json<CommitSlotRequest>,
) -> ApiResult<Json<SlotCommitResult>> {
    let key = request.idempotency_key.or_else(|| {
        headers
            .get(IDEMPOTENCY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    });

    let mut commit = CommitRequest::new(request.actor, request.candidate.into_candidate()?);
    if let Some(key) = key {
        commit = commit.with_idempotency_key(key);
    }

    let result = state
        .engine
        .commit_slot(&ProcessId::new(id), &SlotId::new(slot), commit)
        .await?;
    Ok(Json(result))
}

/// Refuse a slot; a mandatory refusal rejects the process
pub async fn reject_slot(
    State(state): State<AppState>,
    Path((id, slot)): Path<(String, String)>,
    Json(request): Json<RejectSlotRequest>,
) -> ApiResult<Json<StatusResponse>> {
    let process_id = ProcessId::new(id);
    let slot_id = SlotId::new(slot);
    let status = state
        .engine
        .reject_slot(&process_id, &slot_id, request.reason)
        .await?;
    Ok(Json(StatusResponse {
        process_id,
        slot_id: Some(slot_id),
        status,
    }))
}
