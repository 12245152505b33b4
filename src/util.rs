//! Shared helpers.

use axum::http::HeaderMap;

pub const SECONDS_PER_DAY: i64 = 86400;

/// A header value as trimmed text, or None if missing, non-ASCII or blank.
pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Unix timestamp `days` days before `now`.
pub fn days_before(now: i64, days: i64) -> i64 {
    now - days * SECONDS_PER_DAY
}
