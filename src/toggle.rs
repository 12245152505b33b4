//! Remote activation toggle.
//!
//! The remote API is authoritative: the local status only changes after the
//! remote call returned 200.

use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use crate::config::RemoteTimeouts;
use crate::db::{DbPool, queries};
use crate::error::{AppError, Result, msg};
use crate::models::{LicenseStatus, UpdateLicense};
use crate::remote::RemoteClient;
use crate::settings::SettingsStore;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ToggleAction {
    Activate,
    Deactivate,
}

impl ToggleAction {
    /// Parse a caller-supplied action. Anything but `activate`/`deactivate` is rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        raw.trim()
            .parse()
            .map_err(|_| AppError::BadRequest(msg::INVALID_ACTION.into()))
    }

    pub fn target_status(self) -> LicenseStatus {
        match self {
            ToggleAction::Activate => LicenseStatus::Active,
            ToggleAction::Deactivate => LicenseStatus::Inactive,
        }
    }

    /// The action that would undo this one.
    pub fn inverse(self) -> Self {
        match self {
            ToggleAction::Activate => ToggleAction::Deactivate,
            ToggleAction::Deactivate => ToggleAction::Activate,
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            ToggleAction::Activate => "activated",
            ToggleAction::Deactivate => "deactivated",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToggleOutcome {
    pub message: String,
    pub new_status: LicenseStatus,
    /// What the UI should offer next
    pub new_action: ToggleAction,
}

#[derive(Clone)]
pub struct ToggleAdapter {
    db: DbPool,
    settings: Arc<dyn SettingsStore>,
    http: Client,
    timeouts: RemoteTimeouts,
}

impl ToggleAdapter {
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

    /// Forward an activate/deactivate request and mirror the result locally.
    ///
    /// A key the store does not know is still forwarded; the local update then
    /// touches no row.
    pub async fn toggle(&self, license_key: &str, action: &str) -> Result<ToggleOutcome> {
        let action = ToggleAction::parse(action)?;
        let license_key = license_key.trim();
        if license_key.is_empty() {
            return Err(AppError::BadRequest("License key is required".into()));
        }

        let client = RemoteClient::from_settings(&self.http, self.settings.as_ref())?;
        client
            .activate_deactivate(license_key, action, self.timeouts.toggle)
            .await?;

        let new_status = action.target_status();
        let conn = self.db.get()?;
        if !queries::update_license(&conn, license_key, &UpdateLicense::status(new_status))? {
            tracing::warn!(
                "License {} was {} remotely but is not in the local store",
                license_key,
                action.past_tense()
            );
        }

        tracing::info!("License {} {}", license_key, action.past_tense());

        Ok(ToggleOutcome {
            message: format!("License key successfully {}", action.past_tense()),
            new_status,
            new_action: action.inverse(),
        })
    }
}
