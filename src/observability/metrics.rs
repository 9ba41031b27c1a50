use std::sync::Arc;

use anyhow::Result;
use prometheus::core::Collector;
use prometheus::{Gauge, GaugeVec, IntCounter, IntGauge, Opts, Registry};
use tokio::sync::RwLock;
use tracing::info;

use crate::exporter::sample::MetricSample;
use crate::utils::constants::METRICS_NAMESPACE;

/// Label schema shared by the four claim gauges.
pub const CLAIM_LABELS: [&str; 12] = [
    "algorithm",
    "audience",
    "subject",
    "id",
    "scope",
    "issuer",
    "secret_key",
    "secret_name",
    "secret_namespace",
    "name",
    "email",
    "role",
];

/// Process-wide metrics state.
///
/// Built once at startup and shared by `Arc` between the reconciliation loop
/// (the only writer of claim gauges) and the HTTP scrape handler.
pub struct Metrics {
    pub registry: Registry,

    // Claim gauges
    pub expires_in_seconds: GaugeVec,
    pub expiration_timestamp: GaugeVec,
    pub issued_at_timestamp: GaugeVec,
    pub issued_since_seconds: GaugeVec,

    pub error_total: IntCounter,
    pub up: IntGauge,

    // === Service resource metrics ===
    pub process_cpu_usage: Gauge,
    pub process_memory_usage: IntGauge,
    pub process_virtual_memory: IntGauge,
    pub process_open_fds: IntGauge,
    pub process_threads: IntGauge,
    pub process_start_time: IntGauge,
    pub process_uptime: IntGauge,

    /// Scrapes gather under the read side; snapshot publication writes under the write side.
    pub publish_lock: RwLock<()>,
}

impl Metrics {
    pub fn new() -> Result<Arc<Self>> {
        info!("Initializing Metrics ...");
        let registry = Registry::new_custom(Some(METRICS_NAMESPACE.into()), None)?;

        let metrics = Arc::new(Self {
            expires_in_seconds: claim_gauge("jwt_expires_in_seconds", "Number of seconds until the JWT expires.")?,
            expiration_timestamp: claim_gauge("jwt_expiration_timestamp", "Timestamp of when the JWT expires.")?,
            issued_at_timestamp: claim_gauge("jwt_issued_at_timestamp", "Timestamp of when the JWT was issued.")?,
            issued_since_seconds: claim_gauge("jwt_issued_since_seconds", "Number of seconds since the JWT was issued.")?,

            error_total: IntCounter::new("error_total", "JWT Exporter Errors")?,
            up: IntGauge::new("up", "1 if the scrape endpoint is serving")?,

            process_cpu_usage: Gauge::new("process_cpu_usage_percent", "CPU usage % of this process")?,
            process_memory_usage: IntGauge::new("process_memory_usage_bytes", "Resident memory used by this process")?,
            process_virtual_memory: IntGauge::new("process_virtual_memory_bytes", "Virtual memory used by this process")?,
            process_open_fds: IntGauge::new("process_open_fds", "Number of open file descriptors")?,
            process_threads: IntGauge::new("process_threads", "Thread count of this process")?,
            process_start_time: IntGauge::new("process_start_time_seconds", "Process start time (UNIX seconds)")?,
            process_uptime: IntGauge::new("process_uptime_seconds", "Process uptime seconds")?,

            publish_lock: RwLock::new(()),
            registry,
        });

        // Register all metrics in the registry
        let collectors: Vec<Box<dyn Collector>> = vec![
            Box::new(metrics.expires_in_seconds.clone()),
            Box::new(metrics.expiration_timestamp.clone()),
            Box::new(metrics.issued_at_timestamp.clone()),
            Box::new(metrics.issued_since_seconds.clone()),
            Box::new(metrics.error_total.clone()),
            Box::new(metrics.up.clone()),
            Box::new(metrics.process_cpu_usage.clone()),
            Box::new(metrics.process_memory_usage.clone()),
            Box::new(metrics.process_virtual_memory.clone()),
            Box::new(metrics.process_open_fds.clone()),
            Box::new(metrics.process_threads.clone()),
            Box::new(metrics.process_start_time.clone()),
            Box::new(metrics.process_uptime.clone()),
        ];
        for collector in collectors {
            metrics.registry.register(collector)?;
        }

        Ok(metrics)
    }

    /// Drop every published claim sample.
    pub fn reset_claim_gauges(&self) {
        self.expires_in_seconds.reset();
        self.expiration_timestamp.reset();
        self.issued_at_timestamp.reset();
        self.issued_since_seconds.reset();
    }

    /// Set the four claim gauges of one label tuple.
    pub fn write_sample(&self, sample: &MetricSample) {
        let labels = sample.labels.values();
        self.expires_in_seconds.with_label_values(&labels).set(sample.expires_in_seconds);
        self.expiration_timestamp.with_label_values(&labels).set(sample.expiration_timestamp);
        self.issued_at_timestamp.with_label_values(&labels).set(sample.issued_at_timestamp);
        self.issued_since_seconds.with_label_values(&labels).set(sample.issued_since_seconds);
    }
}

fn claim_gauge(name: &str, help: &str) -> Result<GaugeVec> {
    Ok(GaugeVec::new(Opts::new(name, help), &CLAIM_LABELS)?)
}
