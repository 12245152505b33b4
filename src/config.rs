use std::env;
use std::time::Duration;

use crate::nonce::NonceKey;
use crate::settings::DEFAULT_API_URL;

/// Per-call limits for requests to the remote API.
///
/// Validation checks are interactive and stay short; a full collection sync
/// can legitimately take tens of seconds.
#[derive(Debug, Clone, Copy)]
pub struct RemoteTimeouts {
    pub sync: Duration,
    pub toggle: Duration,
    pub validate: Duration,
}

impl Default for RemoteTimeouts {
    fn default() -> Self {
        Self {
            sync: Duration::from_secs(30),
            toggle: Duration::from_secs(30),
            validate: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    /// Initial API key for the settings store (empty = not configured)
    pub api_key: String,
    pub api_url: String,
    pub debug_mode: bool,
    pub nonce_key: NonceKey,
    pub timeouts: RemoteTimeouts,
    /// Period of the background sync; `None` leaves syncing to operators and cron
    pub sync_interval: Option<Duration>,
}

fn secs_from_env(name: &str, default: Duration) -> Duration {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|&secs| secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(default)
}

fn flag_from_env(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let nonce_key = match env::var("CHECKOUTKEYS_NONCE_SECRET") {
            Ok(hex_secret) => NonceKey::from_hex(&hex_secret).unwrap_or_else(|e| {
                tracing::warn!("Ignoring CHECKOUTKEYS_NONCE_SECRET ({}), using a random key", e);
                NonceKey::generate()
            }),
            Err(_) => NonceKey::generate(),
        };

        let defaults = RemoteTimeouts::default();

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "checkoutkeys.db".to_string()),
            api_key: env::var("CHECKOUTKEYS_API_KEY").unwrap_or_default(),
            api_url: env::var("CHECKOUTKEYS_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            debug_mode: flag_from_env("CHECKOUTKEYS_DEBUG"),
            nonce_key,
            timeouts: RemoteTimeouts {
                sync: secs_from_env("SYNC_TIMEOUT_SECS", defaults.sync),
                toggle: secs_from_env("TOGGLE_TIMEOUT_SECS", defaults.toggle),
                validate: secs_from_env("VALIDATE_TIMEOUT_SECS", defaults.validate),
            },
            sync_interval: env::var("SYNC_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|&secs| secs > 0)
                .map(Duration::from_secs),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
