mod from_row;
mod schema;
pub mod queries;

pub use from_row::{FromRow, LICENSE_COLS};
pub use schema::init_db;

use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::nonce::NonceKey;
use crate::settings::SettingsStore;
use crate::sync::SyncEngine;
use crate::toggle::ToggleAdapter;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state, built once at start-up and handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// License store pool
    pub db: DbPool,
    /// Key-value settings (API key, API URL, debug flag, last sync)
    pub settings: Arc<dyn SettingsStore>,
    pub sync: SyncEngine,
    pub toggle: ToggleAdapter,
    /// Secret for anti-forgery tokens on admin actions
    pub nonce_key: NonceKey,
    /// Shared client for ad-hoc remote calls (API key validation)
    pub http_client: reqwest::Client,
    pub timeouts: crate::config::RemoteTimeouts,
}

impl AppState {
    pub fn new(
        db: DbPool,
        settings: Arc<dyn SettingsStore>,
        http_client: reqwest::Client,
        timeouts: crate::config::RemoteTimeouts,
        nonce_key: NonceKey,
    ) -> Self {
        Self {
            sync: SyncEngine::new(db.clone(), settings.clone(), http_client.clone(), timeouts),
            toggle: ToggleAdapter::new(db.clone(), settings.clone(), http_client.clone(), timeouts),
            db,
            settings,
            nonce_key,
            http_client,
            timeouts,
        }
    }
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager)
}
