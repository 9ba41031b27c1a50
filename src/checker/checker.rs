use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::cluster::{SecretBlob, SecretRef, SecretSource};
use crate::config::settings::ExporterConfig;
use crate::exporter::Materializer;
use crate::helpers::time::get_instant;
use crate::observability::metrics::Metrics;

/// Outcome of one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub namespaces: usize,
    pub secrets: usize,
    /// secrets whose token produced samples
    pub exported: usize,
    pub samples: usize,
    pub errors: u64,
}

/// Periodic secret checker: discover → extract → materialize.
pub struct Checker<S> {
    period: Duration,
    label_selectors: Vec<String>,
    annotation_key: String,
    source: S,
    metrics: Arc<Metrics>,
    materializer: Materializer,
}

impl<S: SecretSource> Checker<S> {
    pub fn new(config: &ExporterConfig, source: S, metrics: Arc<Metrics>) -> Self {
        Self {
            period: config.polling_interval,
            label_selectors: config.label_selectors.clone(),
            annotation_key: config.annotation_key.clone(),
            source,
            materializer: Materializer::new(metrics.clone(), config.publish_mode),
            metrics,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Poll forever. The first cycle starts immediately; ticks missed while a
    /// cycle runs collapse into one and the schedule then resumes.
    pub async fn run(mut self) -> Result<()> {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            self.run_cycle().await;
        }
    }

    /// One full reconciliation. Failures are counted and skipped, never fatal.
    pub async fn run_cycle(&mut self) -> CycleReport {
        info!("Begin periodic check");
        let start = get_instant();
        let mut report = CycleReport::default();

        self.materializer.reset();

        let secrets = self.discover(&mut report).await;
        report.secrets = secrets.len();

        for secret in &secrets {
            self.check_secret(secret, &mut report);
        }

        let published = self.materializer.commit().await;
        if published > 0 {
            debug!(published, "snapshot published");
        }

        info!(
            namespaces = report.namespaces,
            secrets = report.secrets,
            exported = report.exported,
            samples = report.samples,
            errors = report.errors,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "periodic check finished"
        );
        report
    }

    /// List namespaces, then the selected secrets of each, once per secret.
    async fn discover(&self, report: &mut CycleReport) -> Vec<SecretBlob> {
        let namespaces = match self.source.list_namespaces().await {
            Ok(namespaces) => namespaces,
            Err(e) => {
                error!(error = %e, "Error requesting namespaces");
                self.record_error(report);
                Vec::new()
            }
        };
        report.namespaces = namespaces.len();

        let selectors: Vec<Option<&str>> = if self.label_selectors.is_empty() {
            vec![None]
        } else {
            self.label_selectors.iter().map(|s| Some(s.as_str())).collect()
        };

        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut secrets = Vec::new();

        for namespace in &namespaces {
            debug!(namespace = %namespace, "Adding namespace to check");
            for selector in &selectors {
                match self.source.list_secrets(namespace, *selector).await {
                    Ok(listed) => {
                        for secret in listed {
                            if seen.insert((secret.namespace.clone(), secret.name.clone())) {
                                secrets.push(secret);
                            }
                        }
                    }
                    Err(e) => {
                        error!(
                            namespace = %namespace,
                            label_selector = selector.unwrap_or_default(),
                            error = %e,
                            "Error requesting secrets"
                        );
                        self.record_error(report);
                    }
                }
            }
        }
        secrets
    }

    fn check_secret(&mut self, secret: &SecretBlob, report: &mut CycleReport) {
        info!(
            secret_name = %secret.name,
            secret_namespace = %secret.namespace,
            "Reviewing secret"
        );

        let key = secret.annotated_key(&self.annotation_key);
        let secret_ref = SecretRef::new(&secret.namespace, &secret.name, key);

        match self.materializer.export(secret.value(key), &secret_ref) {
            Ok(samples) => {
                report.exported += 1;
                report.samples += samples;
                info!(
                    secret_name = %secret.name,
                    secret_namespace = %secret.namespace,
                    samples,
                    "Metrics exported for secret"
                );
            }
            Err(e) => {
                error!(
                    secret_name = %secret.name,
                    secret_namespace = %secret.namespace,
                    secret_key = %key,
                    reason = e.reason(),
                    error = %e,
                    "Error exporting metrics for secret"
                );
                self.record_error(report);
            }
        }
    }

    fn record_error(&self, report: &mut CycleReport) {
        self.metrics.error_total.inc();
        report.errors += 1;
    }
}
