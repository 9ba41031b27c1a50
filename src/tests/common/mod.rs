// tests/common/mod.rs
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use http::StatusCode;
use prometheus::{Encoder, TextEncoder};
use reqwest::Client;
use serde_json::Value;

use crate::cluster::{ClusterError, SecretBlob, SecretSource};
use crate::observability::metrics::Metrics;

pub const ANNOTATION_KEY: &str = "jwt-exporter/secret-key";
pub const EXPIRES_IN: &str = "jwt_exporter_jwt_expires_in_seconds";
pub const EXPIRATION_TS: &str = "jwt_exporter_jwt_expiration_timestamp";
pub const ISSUED_AT_TS: &str = "jwt_exporter_jwt_issued_at_timestamp";
pub const ISSUED_SINCE: &str = "jwt_exporter_jwt_issued_since_seconds";
pub const ERROR_TOTAL: &str = "jwt_exporter_error_total";

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

/// Unsigned compact token; the signature segment is junk on purpose.
pub fn encode_token(header: &Value, claims: &Value) -> String {
    format!(
        "{}.{}.c2lnbmF0dXJl",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(claims.to_string())
    )
}

pub fn token_with(claims: Value) -> String {
    encode_token(&json!({"alg": "RS256", "typ": "JWT"}), &claims)
}

/// Claims with every required field, issued now and expiring in `ttl` seconds.
pub fn base_claims(ttl: i64) -> Value {
    let now = Utc::now().timestamp();
    json!({
        "iss": "https://issuer.example.com",
        "sub": "service-a",
        "aud": "api.example.com",
        "jti": "token-1",
        "iat": now,
        "exp": now + ttl,
    })
}

/// `base_claims` with extra fields merged in.
pub fn claims_with(ttl: i64, extra: Value) -> Value {
    let mut claims = base_claims(ttl);
    if let (Some(target), Some(source)) = (claims.as_object_mut(), extra.as_object()) {
        for (k, v) in source {
            target.insert(k.clone(), v.clone());
        }
    }
    claims
}

pub fn secret(namespace: &str, name: &str, key: &str, value: &str) -> SecretBlob {
    SecretBlob {
        name: name.to_owned(),
        namespace: namespace.to_owned(),
        annotations: HashMap::from([(ANNOTATION_KEY.to_owned(), key.to_owned())]),
        data: HashMap::from([(key.to_owned(), value.as_bytes().to_vec())]),
    }
}

/// Render the registry in the text exposition format.
pub fn render(metrics: &Metrics) -> String {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&metrics.registry.gather(), &mut buffer)
        .expect("encode metrics");
    String::from_utf8(buffer).expect("utf8 metrics")
}

/// Sample lines of one labelled metric.
pub fn series(text: &str, metric: &str) -> Vec<String> {
    let prefix = format!("{}{{", metric);
    text.lines()
        .filter(|line| line.starts_with(&prefix))
        .map(str::to_owned)
        .collect()
}

/// Value of the first sample line containing every fragment.
pub fn sample_value(text: &str, metric: &str, fragments: &[&str]) -> Option<f64> {
    series(text, metric)
        .into_iter()
        .find(|line| fragments.iter().all(|f| line.contains(f)))
        .and_then(|line| line.rsplit(' ').next().and_then(|v| v.parse().ok()))
}

/// In-memory secret source. A secret is listed for a selector when that
/// selector is in its match list; an unfiltered list returns every secret.
#[derive(Default)]
pub struct FakeSecretSource {
    pub namespaces: Vec<String>,
    pub fail_namespaces: bool,
    pub failing_namespaces: Vec<String>,
    pub secrets: HashMap<String, Vec<(Vec<String>, SecretBlob)>>,
    pub calls: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeSecretSource {
    pub fn with_namespaces(namespaces: &[&str]) -> Self {
        Self {
            namespaces: namespaces.iter().map(|ns| ns.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn add(&mut self, selectors: &[&str], secret: SecretBlob) {
        self.secrets
            .entry(secret.namespace.clone())
            .or_default()
            .push((selectors.iter().map(|s| s.to_string()).collect(), secret));
    }

    pub fn recorded_calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl SecretSource for FakeSecretSource {
    async fn list_namespaces(&self) -> Result<Vec<String>, ClusterError> {
        if self.fail_namespaces {
            return Err(ClusterError::Status {
                url: "/api/v1/namespaces".to_owned(),
                status: StatusCode::FORBIDDEN,
                message: "namespaces is forbidden".to_owned(),
            });
        }
        Ok(self.namespaces.clone())
    }

    async fn list_secrets(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<SecretBlob>, ClusterError> {
        self.calls
            .lock()
            .unwrap()
            .push((namespace.to_owned(), label_selector.map(str::to_owned)));

        if self.failing_namespaces.iter().any(|ns| ns == namespace) {
            return Err(ClusterError::Status {
                url: format!("/api/v1/namespaces/{}/secrets", namespace),
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "etcdserver: request timed out".to_owned(),
            });
        }

        Ok(self
            .secrets
            .get(namespace)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(selectors, _)| match label_selector {
                        Some(selector) => selectors.iter().any(|s| s == selector),
                        None => true,
                    })
                    .map(|(_, secret)| secret.clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}
