use axum::extract::State;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::db::AppState;
use crate::error::{AppError, Result, msg};
use crate::extractors::Json;
use crate::middleware::RequestContext;
use crate::nonce::NonceAction;
use crate::remote::RemoteClient;

#[derive(Debug, Deserialize)]
pub struct SaveSettingsRequest {
    #[serde(default)]
    pub api_key: String,
    pub api_url: Option<String>,
    pub debug_mode: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub message: String,
    pub configured: bool,
    pub api_url: String,
    pub debug_mode: bool,
}

#[derive(Debug, Deserialize)]
pub struct ValidateKeyRequest {
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateKeyResponse {
    pub valid: bool,
    pub message: String,
}

/// Normalize an API base URL: absolute http(s), no trailing slash.
pub fn normalize_api_url(raw: &str) -> Result<String> {
    let url = Url::parse(raw.trim()).map_err(|_| AppError::BadRequest(msg::INVALID_API_URL.into()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(AppError::BadRequest(msg::INVALID_API_URL.into()));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Save API credentials. A non-empty key must pass a live check first;
/// an empty key clears the stored one.
pub async fn save_settings(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(input): Json<SaveSettingsRequest>,
) -> Result<Json<SettingsResponse>> {
    ctx.authorize(&state.nonce_key, NonceAction::Settings)?;

    let api_url = match input.api_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        Some(raw) => normalize_api_url(raw)?,
        None => state.settings.api_url(),
    };
    let api_key = input.api_key.trim();

    if !api_key.is_empty() {
        let client = RemoteClient::new(state.http_client.clone(), &api_url, api_key)
            .with_debug(state.settings.debug_mode());
        if !client.validate_api_key(state.timeouts.validate).await? {
            return Err(AppError::BadRequest(format!(
                "{}. Settings not saved.",
                msg::INVALID_API_KEY
            )));
        }
    }

    state.settings.save_credentials(api_key, &api_url);
    if let Some(debug_mode) = input.debug_mode {
        state.settings.set_debug_mode(debug_mode);
    }

    tracing::info!("Operator {} updated API settings", ctx.operator_id);

    let configured = state.settings.api_key().is_some();
    Ok(Json(SettingsResponse {
        message: if configured {
            "Settings saved. API key verified.".into()
        } else {
            "Settings saved. API key cleared.".into()
        },
        configured,
        api_url: state.settings.api_url(),
        debug_mode: state.settings.debug_mode(),
    }))
}

/// Check a candidate API key against the configured API URL without saving it.
pub async fn validate_api_key(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(input): Json<ValidateKeyRequest>,
) -> Result<Json<ValidateKeyResponse>> {
    ctx.authorize(&state.nonce_key, NonceAction::ValidateKey)?;

    let api_key = input.api_key.trim();
    if api_key.is_empty() {
        return Err(AppError::BadRequest("API key is required".into()));
    }

    let client = RemoteClient::new(state.http_client.clone(), &state.settings.api_url(), api_key)
        .with_debug(state.settings.debug_mode());
    if !client.validate_api_key(state.timeouts.validate).await? {
        return Err(AppError::BadRequest(msg::INVALID_API_KEY.into()));
    }

    Ok(Json(ValidateKeyResponse {
        valid: true,
        message: "API key is valid".into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_api_url() {
        assert_eq!(
            normalize_api_url("https://checkoutkeys.com/api/").unwrap(),
            "https://checkoutkeys.com/api"
        );
        assert_eq!(normalize_api_url(" http://127.0.0.1:9000 ").unwrap(), "http://127.0.0.1:9000");
        assert!(normalize_api_url("checkoutkeys.com/api").is_err());
        assert!(normalize_api_url("ftp://checkoutkeys.com").is_err());
    }
}
