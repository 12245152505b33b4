//! Key-value settings consulted by the sync engine and toggle adapter.
//!
//! Persistence belongs to the host; the service only needs `get`/`set`.
//! `MemorySettings` is seeded from the environment at start-up.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::config::Config;

pub const DEFAULT_API_URL: &str = "https://checkoutkeys.com/api";

/// Setting keys
pub mod keys {
    pub const API_KEY: &str = "checkoutkeys_api_key";
    pub const API_URL: &str = "checkoutkeys_api_url";
    pub const DEBUG_MODE: &str = "checkoutkeys_debug_mode";
    pub const LAST_SYNC: &str = "checkoutkeys_last_sync";
}

pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str);

    fn remove(&self, key: &str);

    /// The configured API key, `None` when missing or blank.
    fn api_key(&self) -> Option<String> {
        self.get(keys::API_KEY)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }

    /// Base URL of the remote API without a trailing slash.
    fn api_url(&self) -> String {
        self.get(keys::API_URL)
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    fn debug_mode(&self) -> bool {
        self.get(keys::DEBUG_MODE)
            .is_some_and(|v| matches!(v.as_str(), "1" | "true"))
    }

    fn set_debug_mode(&self, enabled: bool) {
        self.set(keys::DEBUG_MODE, if enabled { "1" } else { "0" });
    }

    /// Unix timestamp of the last completed sync.
    fn last_sync(&self) -> Option<i64> {
        self.get(keys::LAST_SYNC).and_then(|v| v.parse().ok())
    }

    fn record_sync(&self, at: i64) {
        self.set(keys::LAST_SYNC, &at.to_string());
    }

    /// Store the API key and URL together. An empty key clears it.
    fn save_credentials(&self, api_key: &str, api_url: &str) {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            self.remove(keys::API_KEY);
        } else {
            self.set(keys::API_KEY, api_key);
        }
        self.set(keys::API_URL, api_url.trim());
    }
}

#[derive(Default)]
pub struct MemorySettings {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        let settings = Self::new();
        settings.save_credentials(&config.api_key, &config.api_url);
        settings.set_debug_mode(config.debug_mode);
        settings
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut values) = self.values.write() {
            values.insert(key.to_string(), value.to_string());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut values) = self.values.write() {
            values.remove(key);
        }
    }
}
