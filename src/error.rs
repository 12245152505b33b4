use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// User-facing error messages shared between handlers and the core.
pub mod msg {
    pub const NOT_CONFIGURED: &str = "API key not configured";
    pub const INVALID_ACTION: &str = "Invalid action";
    pub const INVALID_API_KEY: &str = "Invalid API key";
    pub const INVALID_API_URL: &str = "API URL must be an absolute http(s) URL";
    pub const INVALID_NONCE: &str = "Invalid or expired security token";
    pub const INSUFFICIENT_PRIVILEGE: &str = "Insufficient privileges";
    pub const LICENSE_EXISTS: &str = "License key already exists";
    pub const LICENSE_NOT_FOUND: &str = "License not found";
    pub const MISSING_LICENSES_FIELD: &str = "Response is missing the licenses collection";
    pub const INVALID_REQUEST_BODY: &str = "Invalid request body";
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The remote API cannot be called because credentials are missing.
    #[error("Not configured: {0}")]
    NotConfigured(String),

    /// The remote API could not be reached (connection failure or timeout).
    #[error("Connection error: {0}")]
    Transport(String),

    /// The remote API answered with something other than 200.
    #[error("Remote API returned status {status}")]
    RemoteRejected { status: u16, body: String },

    /// The remote API answered 200 but the body has the wrong shape.
    #[error("Malformed response: {0}")]
    MalformedPayload(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AppError::Transport(format!("request timed out: {}", e))
        } else {
            AppError::Transport(e.to_string())
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("JSON rejection: {}", rejection.body_text());
        AppError::BadRequest(msg::INVALID_REQUEST_BODY.into())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found", Some(msg.clone())),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad request", Some(msg.clone())),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized", None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "Forbidden", Some(msg.clone())),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "Conflict", Some(msg.clone())),
            AppError::NotConfigured(msg) => {
                (StatusCode::PRECONDITION_FAILED, "Not configured", Some(msg.clone()))
            }
            AppError::Transport(msg) => {
                tracing::warn!("Remote API unreachable: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Remote API unreachable",
                    Some(format!("Connection error: {}", msg)),
                )
            }
            AppError::RemoteRejected { status, body } => {
                tracing::warn!("Remote API rejected request: status {} - {}", status, body);
                (
                    StatusCode::BAD_GATEWAY,
                    "Remote API error",
                    Some(format!("Remote API returned status {}", status)),
                )
            }
            AppError::MalformedPayload(msg) => {
                tracing::warn!("Malformed remote response: {}", msg);
                (StatusCode::BAD_GATEWAY, "Invalid response from API", Some(msg.clone()))
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Json(e) => {
                tracing::error!("JSON error: {}", e);
                (StatusCode::BAD_REQUEST, "Invalid JSON", Some(e.to_string()))
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Convert `Option<T>` lookups into `NotFound` errors.
pub trait OptionExt<T> {
    fn or_not_found(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| AppError::NotFound(msg.to_string()))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
