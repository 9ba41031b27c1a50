use chrono::{DateTime, Utc};

use crate::helpers::time::seconds_between;

pub const UNKNOWN_ISSUER: &str = "unknown";

/// Normalized view of one token's claims.
///
/// The relative durations (`seconds_until_expiry`, `seconds_since_issued`) are
/// not stored; they are computed against the clock passed in at publication time.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimRecord {
    pub issuer: String,
    pub algorithm: String,
    pub subject: String,
    pub audience: String,
    pub id: String,
    pub expires_at: DateTime<Utc>,
    pub issued_at: DateTime<Utc>,
    pub scopes: Vec<String>,
    pub roles: Vec<String>,
    pub name: String,
    pub email: String,
}

impl ClaimRecord {
    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> f64 {
        seconds_between(now, self.expires_at)
    }

    pub fn seconds_since_issued(&self, now: DateTime<Utc>) -> f64 {
        seconds_between(self.issued_at, now)
    }

    pub fn expiration_timestamp(&self) -> f64 {
        self.expires_at.timestamp() as f64
    }

    pub fn issued_at_timestamp(&self) -> f64 {
        self.issued_at.timestamp() as f64
    }

    /// Scopes with the empty-set case replaced by a single `""` entry.
    pub fn normalized_scopes(&self) -> Vec<&str> {
        normalize(&self.scopes)
    }

    /// Roles with the empty-set case replaced by a single `""` entry.
    pub fn normalized_roles(&self) -> Vec<&str> {
        normalize(&self.roles)
    }
}

fn normalize(values: &[String]) -> Vec<&str> {
    if values.is_empty() {
        vec![""]
    } else {
        values.iter().map(String::as_str).collect()
    }
}
