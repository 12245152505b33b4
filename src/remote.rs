//! HTTP client for the checkoutkeys.com license API.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, Result, msg};
use crate::settings::SettingsStore;
use crate::toggle::ToggleAction;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ActivateDeactivateRequest<'a> {
    license_key: &'a str,
    action: &'a str,
}

#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: Client,
    base_url: String,
    api_key: String,
    debug: bool,
}

impl RemoteClient {
    pub fn new(http: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            debug: false,
        }
    }

    /// Build a client from the current settings.
    ///
    /// Fails with `NotConfigured` when no API key is stored, so callers never
    /// reach the network without credentials.
    pub fn from_settings(http: &Client, settings: &dyn SettingsStore) -> Result<Self> {
        let api_key = settings
            .api_key()
            .ok_or_else(|| AppError::NotConfigured(msg::NOT_CONFIGURED.into()))?;
        Ok(Self::new(http.clone(), &settings.api_url(), &api_key).with_debug(settings.debug_mode()))
    }

    /// Log full response bodies at `info` instead of `debug`.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn log_response(&self, operation: &str, status: StatusCode, body: &str) {
        if self.debug {
            tracing::info!(operation, status = status.as_u16(), body, "Remote API response");
        } else {
            tracing::debug!(operation, status = status.as_u16(), "Remote API response");
        }
    }

    /// GET /licenses and return the raw records of the `licenses` collection.
    pub async fn fetch_licenses(&self, timeout: Duration) -> Result<Vec<Value>> {
        let response = self
            .http
            .get(self.url("/licenses"))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        self.log_response("fetch_licenses", status, &body);

        if status != StatusCode::OK {
            return Err(AppError::RemoteRejected {
                status: status.as_u16(),
                body,
            });
        }

        parse_collection(&body)
    }

    /// POST /licensekeys/activateDeactivate. Only HTTP 200 counts as success.
    pub async fn activate_deactivate(
        &self,
        license_key: &str,
        action: ToggleAction,
        timeout: Duration,
    ) -> Result<()> {
        let request = ActivateDeactivateRequest {
            license_key,
            action: action.as_ref(),
        };

        let response = self
            .http
            .post(self.url("/licensekeys/activateDeactivate"))
            .header("x-api-key", self.api_key.as_str())
            .json(&request)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        self.log_response("activate_deactivate", status, &body);

        if status != StatusCode::OK {
            return Err(AppError::RemoteRejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    /// Check that the API key is accepted by the remote API.
    ///
    /// Any non-200 status or a body without a `licenses` collection means the
    /// key is invalid. A transport failure is an error, not a verdict.
    pub async fn validate_api_key(&self, timeout: Duration) -> Result<bool> {
        let response = self
            .http
            .get(self.url("/licenses"))
            .header("x-api-key", self.api_key.as_str())
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::debug!("API key validation rejected with status {}", status);
            return Ok(false);
        }

        let body = response.text().await?;
        Ok(parse_collection(&body).is_ok())
    }
}

/// Extract the `licenses` array from a response body.
///
/// A body that is not JSON, or lacks the collection, is a distinct error and
/// never reads as an empty collection.
pub fn parse_collection(body: &str) -> Result<Vec<Value>> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| AppError::MalformedPayload(format!("Response is not valid JSON: {}", e)))?;

    let Value::Object(mut map) = value else {
        return Err(AppError::MalformedPayload(
            "Response is not a JSON object".into(),
        ));
    };

    match map.remove("licenses") {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(AppError::MalformedPayload(
            "The licenses field is not an array".into(),
        )),
        None => Err(AppError::MalformedPayload(msg::MISSING_LICENSES_FIELD.into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_collection_ok() {
        let items = parse_collection(r#"{"licenses":[{"key":"A"},{"key":"B"}]}"#).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_parse_collection_empty_array_is_valid() {
        assert!(parse_collection(r#"{"licenses":[]}"#).unwrap().is_empty());
    }

    #[test]
    fn test_parse_collection_missing_field() {
        let err = parse_collection("{}").unwrap_err();
        assert!(matches!(err, AppError::MalformedPayload(_)));
    }

    #[test]
    fn test_parse_collection_wrong_shapes() {
        assert!(matches!(
            parse_collection(r#"{"licenses":{"key":"A"}}"#),
            Err(AppError::MalformedPayload(_))
        ));
        assert!(matches!(parse_collection("[]"), Err(AppError::MalformedPayload(_))));
        assert!(matches!(
            parse_collection("<html>oops</html>"),
            Err(AppError::MalformedPayload(_))
        ));
    }
}
