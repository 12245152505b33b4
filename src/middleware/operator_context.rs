use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use crate::error::{AppError, Result, msg};
use crate::nonce::{NonceAction, NonceKey};
use crate::util::header_str;

pub const OPERATOR_ID_HEADER: &str = "x-operator-id";
pub const PRIVILEGE_HEADER: &str = "x-operator-privilege";
pub const NONCE_HEADER: &str = "x-checkoutkeys-nonce";

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Privilege {
    #[default]
    View,
    Manage,
}

/// Identity of the administrator behind a request, as vouched for by the host.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub operator_id: String,
    pub privilege: Privilege,
    /// Anti-forgery token supplied with the request, if any
    pub nonce: Option<String>,
}

impl RequestContext {
    pub fn new(operator_id: impl Into<String>, privilege: Privilege) -> Self {
        Self {
            operator_id: operator_id.into(),
            privilege,
            nonce: None,
        }
    }

    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Build the context from request headers. A missing operator id is
    /// unauthenticated; a missing privilege header means read-only.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self> {
        let operator_id = header_str(headers, OPERATOR_ID_HEADER).ok_or(AppError::Unauthorized)?;

        let privilege = match header_str(headers, PRIVILEGE_HEADER) {
            Some(raw) => raw.parse().map_err(|_| AppError::Unauthorized)?,
            None => Privilege::View,
        };

        let mut ctx = Self::new(operator_id, privilege);
        if let Some(nonce) = header_str(headers, NONCE_HEADER) {
            ctx = ctx.with_nonce(nonce);
        }
        Ok(ctx)
    }

    pub fn require_manage(&self) -> Result<()> {
        if self.privilege != Privilege::Manage {
            return Err(AppError::Forbidden(msg::INSUFFICIENT_PRIVILEGE.into()));
        }
        Ok(())
    }

    /// Check the request's anti-forgery token against `action`.
    pub fn verify_nonce(&self, key: &NonceKey, action: NonceAction) -> Result<()> {
        let nonce = self
            .nonce
            .as_deref()
            .ok_or_else(|| AppError::Forbidden(msg::INVALID_NONCE.into()))?;

        if !key.verify(action, &self.operator_id, nonce)? {
            tracing::warn!(
                "Rejected {} request from operator {}: bad nonce",
                action.as_ref(),
                self.operator_id
            );
            return Err(AppError::Forbidden(msg::INVALID_NONCE.into()));
        }
        Ok(())
    }

    /// Privilege first, then the token. Both are checked before any work.
    pub fn authorize(&self, key: &NonceKey, action: NonceAction) -> Result<()> {
        self.require_manage()?;
        self.verify_nonce(key, action)
    }
}

fn context_from_request(request: &Request) -> std::result::Result<RequestContext, StatusCode> {
    RequestContext::from_headers(request.headers()).map_err(|_| StatusCode::UNAUTHORIZED)
}

pub async fn operator_context(mut request: Request, next: Next) -> std::result::Result<Response, StatusCode> {
    let ctx = context_from_request(&request)?;

    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

pub async fn require_manage(mut request: Request, next: Next) -> std::result::Result<Response, StatusCode> {
    let ctx = context_from_request(&request)?;

    if ctx.privilege != Privilege::Manage {
        return Err(StatusCode::FORBIDDEN);
    }

    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_from_headers() {
        let ctx = RequestContext::from_headers(&headers(&[
            (OPERATOR_ID_HEADER, "admin-1"),
            (PRIVILEGE_HEADER, "Manage"),
            (NONCE_HEADER, "abc"),
        ]))
        .unwrap();
        assert_eq!(ctx.operator_id, "admin-1");
        assert_eq!(ctx.privilege, Privilege::Manage);
        assert_eq!(ctx.nonce.as_deref(), Some("abc"));
    }

    #[test]
    fn test_missing_operator_is_unauthorized() {
        let result = RequestContext::from_headers(&headers(&[(PRIVILEGE_HEADER, "manage")]));
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_privilege_defaults_to_view() {
        let ctx = RequestContext::from_headers(&headers(&[(OPERATOR_ID_HEADER, "viewer")])).unwrap();
        assert_eq!(ctx.privilege, Privilege::View);
        assert!(matches!(ctx.require_manage(), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_unknown_privilege_rejected() {
        let result = RequestContext::from_headers(&headers(&[
            (OPERATOR_ID_HEADER, "admin-1"),
            (PRIVILEGE_HEADER, "root"),
        ]));
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_authorize() {
        let key = NonceKey::generate();
        let nonce = key.create(NonceAction::Sync, "admin-1").unwrap();

        let ctx = RequestContext::new("admin-1", Privilege::Manage).with_nonce(nonce.clone());
        assert!(ctx.authorize(&key, NonceAction::Sync).is_ok());
        assert!(ctx.authorize(&key, NonceAction::Toggle).is_err());

        let viewer = RequestContext::new("admin-1", Privilege::View).with_nonce(nonce);
        assert!(matches!(
            viewer.authorize(&key, NonceAction::Sync),
            Err(AppError::Forbidden(m)) if m == msg::INSUFFICIENT_PRIVILEGE
        ));

        let no_nonce = RequestContext::new("admin-1", Privilege::Manage);
        assert!(matches!(
            no_nonce.authorize(&key, NonceAction::Sync),
            Err(AppError::Forbidden(m)) if m == msg::INVALID_NONCE
        ));
    }
}
