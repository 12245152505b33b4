use axum::extract::State;
use serde::Deserialize;

use crate::db::{AppState, queries};
use crate::error::{OptionExt, Result, msg};
use crate::extractors::{Json, Path, Query};
use crate::middleware::RequestContext;
use crate::models::{License, LicenseStats, LicenseStatus};
use crate::nonce::NonceAction;
use crate::pagination::{Paginated, PaginationQuery};
use crate::toggle::ToggleOutcome;
use crate::util::days_before;

/// Window for the "recent" dashboard counter.
const RECENT_DAYS: i64 = 30;

#[derive(Debug, Deserialize)]
pub struct LicenseQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// Filter by customer email (exact match)
    pub email: Option<String>,
}

impl LicenseQuery {
    fn pagination(&self) -> PaginationQuery {
        PaginationQuery {
            limit: self.limit,
            offset: self.offset,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub license_key: String,
    #[serde(alias = "toggle_action")]
    pub action: String,
}

/// List licenses, newest first.
pub async fn list_licenses(
    State(state): State<AppState>,
    Query(query): Query<LicenseQuery>,
) -> Result<Json<Paginated<License>>> {
    let conn = state.db.get()?;
    let pagination = query.pagination();
    let limit = pagination.limit();
    let offset = pagination.offset();

    if let Some(email) = query.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        let licenses = queries::get_licenses_by_email(&conn, email)?;
        return Ok(Json(Paginated::from_all(licenses, limit, offset)));
    }

    let licenses = queries::list_licenses_paginated(&conn, limit, offset)?;
    let total = queries::count_licenses(&conn)?;

    Ok(Json(Paginated::new(licenses, total, limit, offset)))
}

pub async fn get_license(
    State(state): State<AppState>,
    Path(license_key): Path<String>,
) -> Result<Json<License>> {
    let conn = state.db.get()?;
    let license = queries::get_license_by_key(&conn, &license_key)?
        .or_not_found(msg::LICENSE_NOT_FOUND)?;
    Ok(Json(license))
}

/// Dashboard counters.
pub async fn license_stats(State(state): State<AppState>) -> Result<Json<LicenseStats>> {
    let conn = state.db.get()?;
    let now = queries::now();

    let total = queries::count_licenses(&conn)?;
    let active = queries::count_licenses_by_status(&conn, LicenseStatus::Active)?;
    let inactive = queries::count_licenses_by_status(&conn, LicenseStatus::Inactive)?;
    let recent = queries::count_licenses_created_since(&conn, days_before(now, RECENT_DAYS))?;

    Ok(Json(LicenseStats {
        total,
        active,
        inactive,
        recent,
        last_sync: state.settings.last_sync(),
        configured: state.settings.api_key().is_some(),
    }))
}

/// Activate or deactivate a license on checkoutkeys.com and mirror the result.
pub async fn toggle_license(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(input): Json<ToggleRequest>,
) -> Result<Json<ToggleOutcome>> {
    ctx.authorize(&state.nonce_key, NonceAction::Toggle)?;

    let outcome = state.toggle.toggle(&input.license_key, &input.action).await?;
    tracing::info!(
        "Operator {} set license {} to {}",
        ctx.operator_id,
        input.license_key.trim(),
        outcome.new_status.as_ref()
    );

    Ok(Json(outcome))
}
