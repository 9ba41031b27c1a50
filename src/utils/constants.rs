//! Shared constants and defaults

pub const DEFAULT_CONFIG_PATH: &str = "/config/config.yaml";
pub const DEFAULT_LISTEN_ADDRESS: &str = ":8080";
pub const DEFAULT_LABEL_SELECTOR: &str = "monitor.jwt.io/monitoring=true";
pub const DEFAULT_POLLING_INTERVAL_SECS: u64 = 3600;
pub const DEFAULT_ANNOTATION_KEY: &str = "jwt-exporter/secret-key";
pub const DEFAULT_METRICS_PATH: &str = "/metrics";
pub const HEALTH_PATH: &str = "/healthz";

pub const METRICS_NAMESPACE: &str = "jwt_exporter";
pub const PROCESS_METRICS_INTERVAL_SECS: u64 = 5;

// In-cluster service account
pub const SERVICE_ACCOUNT_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";
pub const SERVICE_ACCOUNT_CA_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";
pub const KUBERNETES_SERVICE_HOST_ENV: &str = "KUBERNETES_SERVICE_HOST";
pub const KUBERNETES_SERVICE_PORT_ENV: &str = "KUBERNETES_SERVICE_PORT";
