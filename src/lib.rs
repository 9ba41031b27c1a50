//! # JWT Exporter Library
//!
//! Scans cluster secrets for JWTs on a fixed interval and publishes their
//! claims (expiry, issuer, subject, audience, scopes, roles) as prometheus
//! gauges.
//!
//! Modules:
//! - `config`: exporter configuration, loading and validation
//! - `cluster`: namespace/secret discovery over the Kubernetes API
//! - `jwt`: unverified claim extraction
//! - `exporter`: claim records to gauge samples
//! - `checker`: the periodic reconciliation loop
//! - `observability` / `server`: metrics state and the scrape endpoint

pub mod checker;
pub mod cluster;
pub mod config;
pub mod exporter;
pub mod helpers;
pub mod jwt;
pub mod observability;
pub mod server;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::config::settings::ExporterConfig;
pub use crate::jwt::extract;
