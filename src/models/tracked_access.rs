use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel stored for descriptive fields that could not be determined
pub const UNKNOWN: &str = "N/A";

/// One stored access record per (tracking_id, recipient_email) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedAccess {
    pub tracking_id: String,
    pub recipient_email: String,
    pub accessed_at: DateTime<Utc>,
    pub email_subject: String,
    pub ip_address: String,
    pub user_agent: String,
    pub operating_system: String,
}

/// Metadata derived from a single hit on a tracking link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessVisit {
    pub tracking_id: String,
    pub recipient_email: String,
    pub email_subject: Option<String>,
    pub accessed_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub operating_system: String,
}

fn or_unknown(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(UNKNOWN)
        .to_string()
}

impl AccessVisit {
    /// Record created on the first access of a pair
    pub fn into_record(self) -> TrackedAccess {
        TrackedAccess {
            email_subject: or_unknown(self.email_subject.as_deref()),
            ip_address: or_unknown(self.ip_address.as_deref()),
            user_agent: or_unknown(self.user_agent.as_deref()),
            operating_system: or_unknown(Some(self.operating_system.as_str())),
            tracking_id: self.tracking_id,
            recipient_email: self.recipient_email,
            accessed_at: self.accessed_at,
        }
    }

    /// Overwrite the per-access fields of an existing record.
    /// The subject stays as captured on first access.
    pub fn apply_to(&self, record: &mut TrackedAccess) {
        record.accessed_at = self.accessed_at;
        record.ip_address = or_unknown(self.ip_address.as_deref());
        record.user_agent = or_unknown(self.user_agent.as_deref());
        record.operating_system = or_unknown(Some(self.operating_system.as_str()));
    }
}
