use axum::extract::State;
use serde::Serialize;

use crate::db::AppState;
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::middleware::RequestContext;
use crate::nonce::NonceAction;

#[derive(Debug, Serialize)]
pub struct NonceResponse {
    pub action: String,
    pub nonce: String,
}

/// Issue an anti-forgery token for one admin action, bound to the caller.
pub async fn issue_nonce(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(action): Path<String>,
) -> Result<Json<NonceResponse>> {
    let action: NonceAction = action
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Unknown nonce action: {}", action)))?;

    let nonce = state.nonce_key.create(action, &ctx.operator_id)?;

    Ok(Json(NonceResponse {
        action: action.as_ref().to_string(),
        nonce,
    }))
}
