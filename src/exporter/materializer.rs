use std::sync::Arc;

use tracing::debug;

use crate::cluster::SecretRef;
use crate::config::settings::PublishMode;
use crate::exporter::sample::MetricSample;
use crate::helpers::time;
use crate::jwt::{self, ClaimRecord, ExtractionError};
use crate::observability::metrics::Metrics;

/// Turns claim records into claim gauge samples.
///
/// In `Incremental` mode writes go straight to the shared gauges. In `Snapshot`
/// mode they are staged and only become visible on [`Materializer::commit`].
pub struct Materializer {
    metrics: Arc<Metrics>,
    mode: PublishMode,
    staged: Vec<MetricSample>,
}

impl Materializer {
    pub fn new(metrics: Arc<Metrics>, mode: PublishMode) -> Self {
        Self {
            metrics,
            mode,
            staged: Vec::new(),
        }
    }

    /// Clear the previous cycle. Call once per cycle, before any `materialize`.
    pub fn reset(&mut self) {
        match self.mode {
            PublishMode::Incremental => self.metrics.reset_claim_gauges(),
            PublishMode::Snapshot => self.staged.clear(),
        }
    }

    /// Write one sample per (scope, role) pair; returns the number of label tuples.
    pub fn materialize(&mut self, claim: &ClaimRecord, secret: &SecretRef) -> usize {
        let now = time::now();
        let mut written = 0;

        for scope in claim.normalized_scopes() {
            for role in claim.normalized_roles() {
                let sample = MetricSample::new(claim, secret, scope, role, now);
                match self.mode {
                    PublishMode::Incremental => self.metrics.write_sample(&sample),
                    PublishMode::Snapshot => self.staged.push(sample),
                }
                written += 1;
            }
        }

        debug!(
            secret_name = %secret.name,
            secret_namespace = %secret.namespace,
            samples = written,
            "claims materialized"
        );
        written
    }

    /// Extract the token's claims and materialize them.
    pub fn export(&mut self, token: &[u8], secret: &SecretRef) -> Result<usize, ExtractionError> {
        let claim = jwt::extract(token)?;
        Ok(self.materialize(&claim, secret))
    }

    /// Publish the staged cycle; returns the number of label tuples now visible.
    ///
    /// A no-op in `Incremental` mode, where samples are already published.
    pub async fn commit(&mut self) -> usize {
        match self.mode {
            PublishMode::Incremental => 0,
            PublishMode::Snapshot => {
                let _guard = self.metrics.publish_lock.write().await;
                self.metrics.reset_claim_gauges();
                let published = self.staged.len();
                for sample in self.staged.drain(..) {
                    self.metrics.write_sample(&sample);
                }
                published
            }
        }
    }
}
