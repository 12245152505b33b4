//! Error to HTTP response mapping

use axum::{http::StatusCode, response::IntoResponse};
use serde_json::Value;

use checkoutkeys::error::{AppError, OptionExt, msg};

async fn render(err: AppError) -> (StatusCode, Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_not_configured_is_412() {
    let (status, body) = render(AppError::NotConfigured(msg::NOT_CONFIGURED.into())).await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    assert_eq!(body["details"], msg::NOT_CONFIGURED);
}

#[tokio::test]
async fn test_remote_failures_are_bad_gateway() {
    let (status, body) = render(AppError::Transport("request timed out".into())).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["details"].as_str().unwrap().starts_with("Connection error"));

    let (status, body) = render(AppError::RemoteRejected {
        status: 403,
        body: "{\"error\":\"forbidden\"}".into(),
    })
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["details"], "Remote API returned status 403");

    let (status, _) = render(AppError::MalformedPayload(msg::MISSING_LICENSES_FIELD.into())).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_conflict_and_client_errors() {
    assert_eq!(render(AppError::Conflict(msg::LICENSE_EXISTS.into())).await.0, StatusCode::CONFLICT);
    assert_eq!(render(AppError::Unauthorized).await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(render(AppError::Forbidden(msg::INVALID_NONCE.into())).await.0, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_internal_errors_hide_details() {
    let (status, body) = render(AppError::Internal("secret path /var/db".into())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.get("details").is_none());
}

#[test]
fn test_or_not_found() {
    let missing: Option<i64> = None;
    assert!(matches!(
        missing.or_not_found(msg::LICENSE_NOT_FOUND),
        Err(AppError::NotFound(m)) if m == msg::LICENSE_NOT_FOUND
    ));
    assert_eq!(Some(3).or_not_found("x").unwrap(), 3);
}
