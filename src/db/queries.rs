use chrono::Utc;
use rusqlite::{Connection, params, types::Value};

use crate::error::{AppError, Result, msg};
use crate::models::*;

use super::from_row::{LICENSE_COLS, query_all, query_one};

pub fn now() -> i64 {
    Utc::now().timestamp()
}

/// Builder for dynamic UPDATE statements with optional fields.
/// Combines multiple field updates into a single query.
struct UpdateBuilder {
    table: &'static str,
    key_column: &'static str,
    key: String,
    fields: Vec<(&'static str, Value)>,
    updated_at: Option<i64>,
}

impl UpdateBuilder {
    fn new(table: &'static str, key_column: &'static str, key: &str) -> Self {
        Self {
            table,
            key_column,
            key: key.to_string(),
            fields: Vec::new(),
            updated_at: None,
        }
    }

    /// Always write `updated_at = at`, even when no other field is set.
    fn with_updated_at(mut self, at: i64) -> Self {
        self.updated_at = Some(at);
        self
    }

    fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    fn set_opt<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Set a column to an explicit value (including NULL).
    /// Use this for Option<T> where Some(v) = set to v, None = set to NULL.
    fn set_nullable<V: Into<Value>>(mut self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.fields.push((column, v.into())),
            None => self.fields.push((column, Value::Null)),
        }
        self
    }

    /// Like `set_nullable`, but skipped entirely when the outer option is `None`.
    fn set_opt_nullable<V: Into<Value>>(
        self,
        column: &'static str,
        value: Option<Option<V>>,
    ) -> Self {
        match value {
            Some(inner) => self.set_nullable(column, inner),
            None => self,
        }
    }

    fn execute(mut self, conn: &Connection) -> Result<bool> {
        if let Some(at) = self.updated_at {
            self.fields.push(("updated_at", at.into()));
        }
        if self.fields.is_empty() {
            return Ok(false);
        }
        let sets: Vec<String> = self
            .fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        values.push(self.key.into());
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            self.table,
            sets.join(", "),
            self.key_column
        );
        let affected = conn.execute(&sql, rusqlite::params_from_iter(values))?;
        Ok(affected > 0)
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

// ============ Licenses ============

/// Insert a license row and return its generated id.
///
/// The unique index on `license_key` is the only integrity guard: inserting
/// an existing key fails with `Conflict` and never overwrites.
pub fn create_license(conn: &Connection, input: &NewLicense) -> Result<i64> {
    let result = conn.execute(
        "INSERT INTO licenses (license_key, customer_email, status, activation_count, max_activations,
                               activated_domains, created_at, updated_at, email_sent_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            &input.license_key,
            &input.customer_email,
            input.status.as_ref(),
            input.activation_count,
            input.max_activations,
            &input.activated_domains,
            input.created_at,
            input.updated_at,
            input.email_sent_at,
        ],
    );

    match result {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(e) if is_unique_violation(&e) => {
            tracing::warn!("Duplicate license key on insert: {}", input.license_key);
            Err(AppError::Conflict(msg::LICENSE_EXISTS.into()))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn get_license_by_key(conn: &Connection, license_key: &str) -> Result<Option<License>> {
    query_one(
        conn,
        &format!("SELECT {} FROM licenses WHERE license_key = ?1", LICENSE_COLS),
        &[&license_key],
    )
}

/// Update the supplied fields of the license with this key and refresh `updated_at`.
///
/// Returns `false` when no row has this key; that is not an error.
pub fn update_license(conn: &Connection, license_key: &str, input: &UpdateLicense) -> Result<bool> {
    update_license_at(conn, license_key, input, now())
}

/// `update_license` with `updated_at` stamped from the caller's clock.
pub fn update_license_at(
    conn: &Connection,
    license_key: &str,
    input: &UpdateLicense,
    now: i64,
) -> Result<bool> {
    UpdateBuilder::new("licenses", "license_key", license_key)
        .with_updated_at(now)
        .set_opt_nullable("customer_email", input.customer_email.clone())
        .set_opt("status", input.status.map(|s| s.as_ref().to_string()))
        .set_opt("activation_count", input.activation_count)
        .set_opt("max_activations", input.max_activations)
        .set_opt("activated_domains", input.activated_domains.clone())
        .set_opt_nullable("created_at", input.created_at)
        .set_opt_nullable("email_sent_at", input.email_sent_at)
        .execute(conn)
}

/// Newest first. Rows without `created_at` sort last.
pub fn list_licenses_paginated(conn: &Connection, limit: i64, offset: i64) -> Result<Vec<License>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM licenses ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
            LICENSE_COLS
        ),
        &[&limit, &offset],
    )
}

pub fn get_licenses_by_email(conn: &Connection, email: &str) -> Result<Vec<License>> {
    let email = email.trim();
    query_all(
        conn,
        &format!(
            "SELECT {} FROM licenses WHERE customer_email = ?1 ORDER BY created_at DESC, id DESC",
            LICENSE_COLS
        ),
        &[&email],
    )
}

pub fn count_licenses(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM licenses", [], |row| row.get(0))
        .map_err(Into::into)
}

pub fn count_licenses_by_status(conn: &Connection, status: LicenseStatus) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM licenses WHERE status = ?1",
        params![status.as_ref()],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

pub fn count_licenses_created_since(conn: &Connection, since: i64) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM licenses WHERE created_at >= ?1",
        params![since],
        |row| row.get(0),
    )
    .map_err(Into::into)
}
