use std::collections::HashMap;

use base64::Engine;
use http::header::ACCEPT;
use reqwest::{Certificate, Client, Identity};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cluster::error::ClusterError;
use crate::cluster::kubeconfig::{self, BearerToken, ClusterCredentials};
use crate::cluster::{SecretBlob, SecretSource};

/// page size of list calls
const LIST_LIMIT: &str = "500";

/// Minimal Kubernetes REST client for namespace and secret listing.
#[derive(Clone)]
pub struct KubeClient {
    client: Client,
    server: String,
    bearer_token: Option<BearerToken>,
    basic_auth: Option<(String, String)>,
}

/// ================================
/// API objects (only the fields we read)
/// ================================
#[derive(Debug, Deserialize)]
struct ObjectList<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    metadata: ListMeta,
}

#[derive(Debug, Default, Deserialize)]
struct ListMeta {
    #[serde(rename = "continue", default)]
    continue_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ObjectMeta {
    #[serde(default)]
    name: String,
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    annotations: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct Namespace {
    #[serde(default)]
    metadata: ObjectMeta,
}

#[derive(Debug, Deserialize)]
struct Secret {
    #[serde(default)]
    metadata: ObjectMeta,
    /// values are base64 encoded
    #[serde(default)]
    data: Option<HashMap<String, String>>,
}

impl KubeClient {
    pub fn new(credentials: ClusterCredentials) -> Result<Self, ClusterError> {
        let mut builder = Client::builder().use_rustls_tls();

        if let Some(ca_pem) = &credentials.ca_pem {
            let certificates = Certificate::from_pem_bundle(ca_pem)
                .map_err(|e| ClusterError::Credentials(format!("invalid CA certificate: {}", e)))?;
            for certificate in certificates {
                builder = builder.add_root_certificate(certificate);
            }
        }
        if let Some(identity_pem) = &credentials.identity_pem {
            let identity = Identity::from_pem(identity_pem)
                .map_err(|e| ClusterError::Credentials(format!("invalid client certificate: {}", e)))?;
            builder = builder.identity(identity);
        }
        if credentials.insecure_skip_tls_verify {
            warn!(server = %credentials.server, "TLS verification of the API server is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| ClusterError::Credentials(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            server: credentials.server.trim_end_matches('/').to_owned(),
            bearer_token: credentials.bearer_token,
            basic_auth: credentials.basic_auth,
        })
    }

    /// Credentials from a kubeconfig file, or in-cluster when the path is empty.
    pub fn from_kubeconfig(kubeconfig_path: &str) -> Result<Self, ClusterError> {
        Self::new(kubeconfig::load(kubeconfig_path)?)
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClusterError> {
        let url = format!("{}{}", self.server, path);

        let mut request = self
            .client
            .get(&url)
            .query(query)
            .header(ACCEPT, "application/json");
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token.resolve()?);
        } else if let Some((username, password)) = &self.basic_auth {
            request = request.basic_auth(username, Some(password));
        }

        let response = request.send().await.map_err(|source| ClusterError::Request {
            url: url.to_owned(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClusterError::Status {
                url,
                status,
                message: status_message(&body),
            });
        }

        let body = response.bytes().await.map_err(|source| ClusterError::Request {
            url: url.to_owned(),
            source,
        })?;
        serde_json::from_slice(&body).map_err(|e| ClusterError::Decode {
            url,
            message: e.to_string(),
        })
    }

    /// Follow `metadata.continue` until the list is exhausted.
    async fn list_all<T: DeserializeOwned>(
        &self,
        path: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<T>, ClusterError> {
        let mut items = Vec::new();
        let mut continue_token: Option<String> = None;

        loop {
            let mut query = vec![("limit", LIST_LIMIT.to_owned())];
            if let Some(selector) = label_selector {
                query.push(("labelSelector", selector.to_owned()));
            }
            if let Some(token) = &continue_token {
                query.push(("continue", token.to_owned()));
            }

            let page: ObjectList<T> = self.get_json(path, &query).await?;
            items.extend(page.items);

            match page.metadata.continue_token.filter(|t| !t.is_empty()) {
                Some(token) => continue_token = Some(token),
                None => break,
            }
        }
        Ok(items)
    }
}

impl SecretSource for KubeClient {
    async fn list_namespaces(&self) -> Result<Vec<String>, ClusterError> {
        let namespaces: Vec<Namespace> = self.list_all("/api/v1/namespaces", None).await?;
        Ok(namespaces
            .into_iter()
            .map(|ns| ns.metadata.name)
            .filter(|name| !name.is_empty())
            .collect())
    }

    async fn list_secrets(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<SecretBlob>, ClusterError> {
        let path = format!("/api/v1/namespaces/{}/secrets", namespace);
        let secrets: Vec<Secret> = self.list_all(&path, label_selector).await?;
        debug!(namespace, total = secrets.len(), "secrets listed");

        Ok(secrets
            .into_iter()
            .map(|secret| into_blob(secret, namespace))
            .collect())
    }
}

fn into_blob(secret: Secret, namespace: &str) -> SecretBlob {
    let name = secret.metadata.name;
    let data = secret
        .data
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| {
            match base64::engine::general_purpose::STANDARD.decode(value.as_bytes()) {
                Ok(bytes) => Some((key, bytes)),
                Err(e) => {
                    warn!(secret_name = %name, key = %key, error = %e, "secret value is not valid base64, skipping key");
                    None
                }
            }
        })
        .collect();

    SecretBlob {
        namespace: secret
            .metadata
            .namespace
            .unwrap_or_else(|| namespace.to_owned()),
        annotations: secret.metadata.annotations.unwrap_or_default(),
        data,
        name,
    }
}

/// Prefer the `message` of a Kubernetes `Status` body.
fn status_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_owned))
        .unwrap_or_else(|| body.chars().take(256).collect())
}
