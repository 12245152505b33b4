//! Test utilities and fixtures for checkoutkeys integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

pub use checkoutkeys::config::RemoteTimeouts;
pub use checkoutkeys::db::{AppState, DbPool, init_db, queries};
pub use checkoutkeys::models::*;
pub use checkoutkeys::nonce::{NonceAction, NonceKey};
pub use checkoutkeys::settings::{MemorySettings, SettingsStore};

pub const TEST_API_KEY: &str = "ck_test_0123456789";
pub const TEST_OPERATOR: &str = "admin-1";

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Single-connection pool over one in-memory database.
///
/// Every in-memory connection is its own database, so the pool must never
/// open a second one.
pub fn test_pool() -> DbPool {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }
    pool
}

/// Deterministic nonce key (testing only)
pub fn test_nonce_key() -> NonceKey {
    NonceKey::from_bytes([7u8; 32])
}

pub fn test_timeouts() -> RemoteTimeouts {
    RemoteTimeouts {
        sync: Duration::from_secs(2),
        toggle: Duration::from_secs(2),
        validate: Duration::from_secs(2),
    }
}

/// Settings pointing at `api_url`. An empty `api_key` leaves the service unconfigured.
pub fn test_settings(api_url: &str, api_key: &str) -> Arc<MemorySettings> {
    let settings = MemorySettings::new();
    settings.save_credentials(api_key, api_url);
    Arc::new(settings)
}

pub fn test_state(api_url: &str, api_key: &str) -> AppState {
    AppState::new(
        test_pool(),
        test_settings(api_url, api_key),
        reqwest::Client::new(),
        test_timeouts(),
        test_nonce_key(),
    )
}

pub fn new_license(key: &str, email: Option<&str>, created_at: i64) -> NewLicense {
    NewLicense {
        license_key: key.to_string(),
        customer_email: email.map(String::from),
        status: LicenseStatus::Active,
        activation_count: 0,
        max_activations: 1,
        activated_domains: String::new(),
        created_at: Some(created_at),
        updated_at: Some(created_at),
        email_sent_at: None,
    }
}

/// Insert a license and return the stored row.
pub fn create_test_license(
    conn: &Connection,
    key: &str,
    email: Option<&str>,
    status: LicenseStatus,
) -> License {
    let mut input = new_license(key, email, queries::now());
    input.status = status;
    queries::create_license(conn, &input).expect("Failed to create test license");
    queries::get_license_by_key(conn, key)
        .expect("Failed to load test license")
        .expect("Test license missing after insert")
}

pub fn license_count(conn: &Connection) -> i64 {
    queries::count_licenses(conn).unwrap()
}
