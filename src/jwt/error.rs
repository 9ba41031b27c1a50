use std::fmt;

use thiserror::Error;

/// Timestamp claims every exported token must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampClaim {
    ExpiresAt,
    IssuedAt,
}

impl TimestampClaim {
    pub fn claim_name(&self) -> &'static str {
        match self {
            TimestampClaim::ExpiresAt => "exp",
            TimestampClaim::IssuedAt => "iat",
        }
    }
}

impl fmt::Display for TimestampClaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.claim_name())
    }
}

/// Reasons a secret value cannot be turned into a claim record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The compact serialization could not be decoded.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("token header has no 'alg'")]
    MissingAlgorithm,

    #[error("token has no valid '{0}' timestamp")]
    MissingTimestamp(TimestampClaim),

    /// A required string claim is absent or not a string.
    #[error("token has no string claim '{0}'")]
    MissingClaim(&'static str),
}

impl ExtractionError {
    /// Short, stable reason used in logs.
    pub fn reason(&self) -> &'static str {
        match self {
            ExtractionError::MalformedToken(_) => "malformed_token",
            ExtractionError::MissingAlgorithm => "missing_algorithm",
            ExtractionError::MissingTimestamp(_) => "missing_timestamp",
            ExtractionError::MissingClaim(_) => "missing_claim",
        }
    }
}
