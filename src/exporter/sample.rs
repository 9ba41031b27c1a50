use chrono::{DateTime, Utc};

use crate::cluster::SecretRef;
use crate::jwt::ClaimRecord;

/// Label values of one claim time series, in `CLAIM_LABELS` order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SampleLabels {
    pub algorithm: String,
    pub audience: String,
    pub subject: String,
    pub id: String,
    pub scope: String,
    pub issuer: String,
    pub secret_key: String,
    pub secret_name: String,
    pub secret_namespace: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl SampleLabels {
    pub fn values(&self) -> [&str; 12] {
        [
            &self.algorithm,
            &self.audience,
            &self.subject,
            &self.id,
            &self.scope,
            &self.issuer,
            &self.secret_key,
            &self.secret_name,
            &self.secret_namespace,
            &self.name,
            &self.email,
            &self.role,
        ]
    }
}

/// One label tuple and its four measured values.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub labels: SampleLabels,
    pub expires_in_seconds: f64,
    pub expiration_timestamp: f64,
    pub issued_at_timestamp: f64,
    pub issued_since_seconds: f64,
}

impl MetricSample {
    pub fn new(
        claim: &ClaimRecord,
        secret: &SecretRef,
        scope: &str,
        role: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            labels: SampleLabels {
                algorithm: claim.algorithm.to_owned(),
                audience: claim.audience.to_owned(),
                subject: claim.subject.to_owned(),
                id: claim.id.to_owned(),
                scope: scope.to_owned(),
                issuer: claim.issuer.to_owned(),
                secret_key: secret.key.to_owned(),
                secret_name: secret.name.to_owned(),
                secret_namespace: secret.namespace.to_owned(),
                name: claim.name.to_owned(),
                email: claim.email.to_owned(),
                role: role.to_owned(),
            },
            expires_in_seconds: claim.seconds_until_expiry(now),
            expiration_timestamp: claim.expiration_timestamp(),
            issued_at_timestamp: claim.issued_at_timestamp(),
            issued_since_seconds: claim.seconds_since_issued(now),
        }
    }
}
