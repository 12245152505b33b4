use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LicenseStatus {
    #[default]
    Active,
    Inactive,
}

/// A license key mirrored from checkoutkeys.com.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub id: i64,
    pub license_key: String,
    pub customer_email: Option<String>,
    pub status: LicenseStatus,
    pub activation_count: i64,
    pub max_activations: i64,
    /// Serialized list of domains; free-form, maintained locally
    pub activated_domains: String,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    pub email_sent_at: Option<i64>,
}

/// Full row for an insert. `license_key` is fixed from here on.
#[derive(Debug, Clone)]
pub struct NewLicense {
    pub license_key: String,
    pub customer_email: Option<String>,
    pub status: LicenseStatus,
    pub activation_count: i64,
    pub max_activations: i64,
    pub activated_domains: String,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    pub email_sent_at: Option<i64>,
}

/// Partial update keyed by license key. `None` leaves a column untouched;
/// for nullable columns `Some(None)` writes NULL.
///
/// There is deliberately no `license_key` field.
#[derive(Debug, Clone, Default)]
pub struct UpdateLicense {
    pub customer_email: Option<Option<String>>,
    pub status: Option<LicenseStatus>,
    pub activation_count: Option<i64>,
    pub max_activations: Option<i64>,
    pub activated_domains: Option<String>,
    pub created_at: Option<Option<i64>>,
    pub email_sent_at: Option<Option<i64>>,
}

impl UpdateLicense {
    pub fn status(status: LicenseStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

/// Counts shown on the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct LicenseStats {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    /// Licenses created in the last 30 days
    pub recent: i64,
    /// Unix timestamp of the last successful sync
    pub last_sync: Option<i64>,
    /// Whether an API key is present in settings
    pub configured: bool,
}
