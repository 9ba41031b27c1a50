//! Unverified JWT decoding into normalized claim records.

pub mod claims;
pub mod error;
pub mod extractor;

pub use claims::ClaimRecord;
pub use error::{ExtractionError, TimestampClaim};
pub use extractor::extract;
