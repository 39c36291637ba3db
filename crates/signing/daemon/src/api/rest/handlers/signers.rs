//! Signer inbox handlers

use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Path, State},
    Json,
};
use signing_types::{SignerId, SignerTask};

/// Slots this signer can act on right now
pub async fn signer_tasks(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<SignerTask>>> {
    Ok(Json(state.engine.tasks_for_signer(&SignerId::new(id)).await?))
}
