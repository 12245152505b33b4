//! License synchronization: pull the remote collection and upsert it locally.
//!
//! Remote records are untrusted JSON. `normalize_license` turns each one into a
//! typed `NormalizedLicense` (or a per-record error), and `reconcile` upserts the
//! normalized records by license key. Remote state overwrites every mutable
//! column; the key itself never changes.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use reqwest::Client;
use rusqlite::Connection;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::RemoteTimeouts;
use crate::db::{DbPool, queries};
use crate::error::Result;
use crate::models::{LicenseStatus, NewLicense, UpdateLicense};
use crate::remote::RemoteClient;
use crate::settings::SettingsStore;

const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// A remote record after normalization. Every field satisfies the table's invariants.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedLicense {
    pub license_key: String,
    pub customer_email: Option<String>,
    pub status: LicenseStatus,
    pub max_activations: i64,
    pub created_at: Option<i64>,
    /// Whether the remote sent `created_at` at all. The clock fallback only
    /// applies on insert; an existing row keeps its creation time.
    pub created_at_supplied: bool,
    pub updated_at: Option<i64>,
    pub email_sent_at: Option<i64>,
}

impl NormalizedLicense {
    fn to_new(&self) -> NewLicense {
        NewLicense {
            license_key: self.license_key.clone(),
            customer_email: self.customer_email.clone(),
            status: self.status,
            activation_count: 0,
            max_activations: self.max_activations,
            activated_domains: String::new(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            email_sent_at: self.email_sent_at,
        }
    }

    /// Mutable remote fields. `activation_count` and `activated_domains` are
    /// local bookkeeping and stay as they are; `created_at` is only rewritten
    /// when the remote sent it. `updated_at` is stamped by the store.
    fn to_update(&self) -> UpdateLicense {
        UpdateLicense {
            customer_email: Some(self.customer_email.clone()),
            status: Some(self.status),
            max_activations: Some(self.max_activations),
            created_at: self.created_at_supplied.then_some(self.created_at),
            email_sent_at: Some(self.email_sent_at),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncResult {
    /// Records reconciled into the store
    pub count: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Records that could not be reconciled, with the reason
    pub errors: Vec<String>,
}

/// Parse a remote timestamp into unix seconds. Unparseable input yields `None`.
///
/// Date-times without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp());
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.and_utc().timestamp());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
}

/// `None` when the field is absent or JSON null, otherwise the parsed value
/// (which is itself `None` for empty or invalid input).
fn timestamp_field(record: &Map<String, Value>, name: &str) -> Option<Option<i64>> {
    match record.get(name) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(parse_timestamp(s)),
        Some(Value::Number(n)) => Some(n.as_i64().filter(|&ts| ts > 0)),
        Some(_) => Some(None),
    }
}

fn text_field(record: &Map<String, Value>, name: &str) -> Option<String> {
    let text = match record.get(name)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Seat limit: a positive integer, 1 when absent or unusable.
fn seat_limit(value: Option<&Value>) -> i64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.filter(|&n| n >= 1).unwrap_or(1)
}

/// Normalize one raw remote record.
///
/// Only a missing license key is fatal for the record; every other field
/// falls back to a default. `now` fills `created_at`/`updated_at` when the
/// remote omits them entirely.
pub fn normalize_license(raw: &Value, now: i64) -> std::result::Result<NormalizedLicense, String> {
    let record = raw
        .as_object()
        .ok_or_else(|| "record is not a JSON object".to_string())?;

    let license_key = text_field(record, "key")
        .or_else(|| text_field(record, "license_key"))
        .ok_or_else(|| "missing license key".to_string())?;

    let customer_email = text_field(record, "email").or_else(|| text_field(record, "customer_email"));

    let status = record
        .get("status")
        .and_then(Value::as_str)
        .and_then(|s| s.trim().parse::<LicenseStatus>().ok())
        .unwrap_or_default();

    let remote_created_at = timestamp_field(record, "created_at");

    Ok(NormalizedLicense {
        license_key,
        customer_email,
        status,
        max_activations: seat_limit(record.get("max_activations")),
        created_at: remote_created_at.unwrap_or(Some(now)),
        created_at_supplied: remote_created_at.is_some(),
        updated_at: timestamp_field(record, "updated_at").unwrap_or(Some(now)),
        email_sent_at: timestamp_field(record, "email_sent_at").flatten(),
    })
}

/// Upsert every usable record by license key.
///
/// Bad records are skipped and reported in `errors`. A store failure aborts
/// the batch; rows already written stay written.
pub fn reconcile(conn: &Connection, records: &[Value], now: i64) -> Result<SyncResult> {
    let mut result = SyncResult::default();

    for (index, raw) in records.iter().enumerate() {
        let license = match normalize_license(raw, now) {
            Ok(license) => license,
            Err(reason) => {
                tracing::warn!("Skipping remote license record {}: {}", index, reason);
                result.errors.push(format!("record {}: {}", index, reason));
                continue;
            }
        };

        if queries::get_license_by_key(conn, &license.license_key)?.is_some() {
            queries::update_license_at(conn, &license.license_key, &license.to_update(), now)?;
            result.updated += 1;
        } else {
            queries::create_license(conn, &license.to_new())?;
            result.inserted += 1;
        }
        result.count += 1;
    }

    Ok(result)
}

/// Pulls the remote collection and reconciles it into the license store.
#[derive(Clone)]
pub struct SyncEngine {
    db: DbPool,
    settings: Arc<dyn SettingsStore>,
    http: Client,
    timeouts: RemoteTimeouts,
}

impl SyncEngine {
    pub fn new(
        db: DbPool,
        settings: Arc<dyn SettingsStore>,
        http: Client,
        timeouts: RemoteTimeouts,
    ) -> Self {
        Self {
            db,
            settings,
            http,
            timeouts,
        }
    }

    /// Full sync: check configuration, fetch, validate the payload, reconcile.
    ///
    /// Nothing is written unless the remote answered 200 with a `licenses`
    /// collection.
    pub async fn run(&self) -> Result<SyncResult> {
        let client = RemoteClient::from_settings(&self.http, self.settings.as_ref())?;
        tracing::info!("Syncing licenses from {}", client.base_url());

        let records = client.fetch_licenses(self.timeouts.sync).await?;
        self.apply(&records)
    }

    /// Reconcile an already fetched collection and record the sync time.
    pub fn apply(&self, records: &[Value]) -> Result<SyncResult> {
        let conn = self.db.get()?;
        let result = reconcile(&conn, records, queries::now())?;

        self.settings.record_sync(queries::now());
        tracing::info!(
            count = result.count,
            inserted = result.inserted,
            updated = result.updated,
            skipped = result.errors.len(),
            "License sync complete"
        );

        Ok(result)
    }
}
