use axum::extract::State;
use serde::Serialize;

use crate::db::AppState;
use crate::error::Result;
use crate::extractors::Json;
use crate::middleware::RequestContext;
use crate::nonce::NonceAction;
use crate::sync::SyncResult;

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub message: String,
    #[serde(flatten)]
    pub result: SyncResult,
    pub last_sync: Option<i64>,
}

/// Pull every license from checkoutkeys.com into the local store.
pub async fn sync_licenses(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<SyncResponse>> {
    ctx.authorize(&state.nonce_key, NonceAction::Sync)?;

    tracing::info!("Operator {} started a license sync", ctx.operator_id);
    let result = state.sync.run().await?;

    Ok(Json(SyncResponse {
        message: format!(
            "Successfully synced {} licenses from checkoutkeys.com",
            result.count
        ),
        last_sync: state.settings.last_sync(),
        result,
    }))
}
