mod licenses;
mod nonce;
mod settings;
mod sync;

pub use licenses::*;
pub use nonce::*;
pub use settings::*;
pub use sync::*;

use axum::{
    Json, Router, middleware,
    routing::{get, post},
};
use serde::Serialize;

use crate::db::AppState;
use crate::middleware::{operator_context, require_manage};

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router() -> Router<AppState> {
    let manage = Router::new()
        .route("/admin/sync", post(sync_licenses))
        .route("/admin/licenses/toggle", post(toggle_license))
        .route("/admin/settings", post(save_settings))
        .route("/admin/settings/validate", post(validate_api_key))
        .layer(middleware::from_fn(require_manage));

    let view = Router::new()
        .route("/admin/nonce/{action}", get(issue_nonce))
        .route("/admin/licenses", get(list_licenses))
        .route("/admin/licenses/{license_key}", get(get_license))
        .route("/admin/stats", get(license_stats))
        .layer(middleware::from_fn(operator_context));

    Router::new()
        .route("/health", get(health))
        .merge(manage)
        .merge(view)
}
