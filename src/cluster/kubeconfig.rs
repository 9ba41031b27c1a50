//! Cluster credentials from a kubeconfig file or the in-cluster service account.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use serde::Deserialize;
use tracing::{info, warn};

use crate::cluster::error::ClusterError;
use crate::utils::constants::{
    KUBERNETES_SERVICE_HOST_ENV, KUBERNETES_SERVICE_PORT_ENV, SERVICE_ACCOUNT_CA_PATH,
    SERVICE_ACCOUNT_TOKEN_PATH,
};

/// Bearer token, either inline or read from a file on every request.
#[derive(Clone, PartialEq, Eq)]
pub enum BearerToken {
    Static(String),
    File(PathBuf),
}

impl BearerToken {
    pub fn resolve(&self) -> Result<String, ClusterError> {
        match self {
            BearerToken::Static(token) => Ok(token.to_owned()),
            BearerToken::File(path) => fs::read_to_string(path)
                .map(|token| token.trim().to_owned())
                .map_err(|source| ClusterError::Io {
                    path: path.display().to_string(),
                    source,
                }),
        }
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BearerToken::Static(_) => f.write_str("Static(<redacted>)"),
            BearerToken::File(path) => f.debug_tuple("File").field(path).finish(),
        }
    }
}

/// Everything needed to talk to one API server.
#[derive(Clone, Default)]
pub struct ClusterCredentials {
    pub server: String,
    pub ca_pem: Option<Vec<u8>>,
    /// client certificate followed by its private key, PEM
    pub identity_pem: Option<Vec<u8>>,
    pub bearer_token: Option<BearerToken>,
    pub basic_auth: Option<(String, String)>,
    pub insecure_skip_tls_verify: bool,
}

impl fmt::Debug for ClusterCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterCredentials")
            .field("server", &self.server)
            .field("ca_pem", &self.ca_pem.is_some())
            .field("identity_pem", &self.identity_pem.is_some())
            .field("bearer_token", &self.bearer_token)
            .field("basic_auth", &self.basic_auth.as_ref().map(|(user, _)| user))
            .field("insecure_skip_tls_verify", &self.insecure_skip_tls_verify)
            .finish()
    }
}

/// ================================
/// kubeconfig file layout
/// ================================
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Kubeconfig {
    #[serde(default)]
    clusters: Vec<NamedCluster>,
    #[serde(default)]
    users: Vec<NamedUser>,
    #[serde(default)]
    contexts: Vec<NamedContext>,
    #[serde(default)]
    current_context: String,
}

#[derive(Debug, Deserialize)]
struct NamedCluster {
    name: String,
    cluster: ClusterEntry,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ClusterEntry {
    server: String,
    certificate_authority: Option<String>,
    certificate_authority_data: Option<String>,
    #[serde(default)]
    insecure_skip_tls_verify: bool,
}

#[derive(Debug, Deserialize)]
struct NamedUser {
    name: String,
    #[serde(default)]
    user: UserEntry,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct UserEntry {
    token: Option<String>,
    #[serde(rename = "tokenFile")]
    token_file: Option<String>,
    client_certificate: Option<String>,
    client_certificate_data: Option<String>,
    client_key: Option<String>,
    client_key_data: Option<String>,
    username: Option<String>,
    password: Option<String>,
    exec: Option<serde_yaml::Value>,
    auth_provider: Option<serde_yaml::Value>,
}

#[derive(Debug, Deserialize)]
struct NamedContext {
    name: String,
    context: ContextEntry,
}

#[derive(Debug, Deserialize)]
struct ContextEntry {
    cluster: String,
    #[serde(default)]
    user: String,
}

/// Load credentials: an empty path selects the in-cluster service account.
pub fn load(kubeconfig_path: &str) -> Result<ClusterCredentials, ClusterError> {
    if kubeconfig_path.is_empty() {
        info!("no kubeconfig_path configured, using in-cluster credentials");
        return in_cluster();
    }
    from_kubeconfig_file(Path::new(kubeconfig_path))
}

pub fn from_kubeconfig_file(path: &Path) -> Result<ClusterCredentials, ClusterError> {
    let content = fs::read_to_string(path).map_err(|source| ClusterError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    from_kubeconfig_str(&content, base_dir)
}

/// Resolve the current context of a kubeconfig document.
///
/// Relative file references are resolved against `base_dir`.
pub fn from_kubeconfig_str(content: &str, base_dir: &Path) -> Result<ClusterCredentials, ClusterError> {
    let kubeconfig: Kubeconfig = serde_yaml::from_str(content)
        .map_err(|e| ClusterError::Credentials(format!("invalid kubeconfig: {}", e)))?;

    let context = kubeconfig
        .contexts
        .iter()
        .find(|c| c.name == kubeconfig.current_context)
        .or_else(|| match kubeconfig.current_context.is_empty() {
            true => kubeconfig.contexts.first(),
            false => None,
        })
        .ok_or_else(|| {
            ClusterError::Credentials(format!(
                "context '{}' not found in kubeconfig",
                kubeconfig.current_context
            ))
        })?;

    let cluster = kubeconfig
        .clusters
        .iter()
        .find(|c| c.name == context.context.cluster)
        .map(|c| &c.cluster)
        .ok_or_else(|| {
            ClusterError::Credentials(format!(
                "cluster '{}' of context '{}' not found",
                context.context.cluster, context.name
            ))
        })?;

    let user = kubeconfig
        .users
        .iter()
        .find(|u| u.name == context.context.user)
        .map(|u| &u.user);
    if user.is_none() && !context.context.user.is_empty() {
        return Err(ClusterError::Credentials(format!(
            "user '{}' of context '{}' not found",
            context.context.user, context.name
        )));
    }

    if cluster.server.trim().is_empty() {
        return Err(ClusterError::Credentials(format!(
            "cluster '{}' has no server",
            context.context.cluster
        )));
    }

    let mut credentials = ClusterCredentials {
        server: cluster.server.trim_end_matches('/').to_owned(),
        ca_pem: inline_or_file(
            cluster.certificate_authority_data.as_deref(),
            cluster.certificate_authority.as_deref(),
            base_dir,
        )?,
        insecure_skip_tls_verify: cluster.insecure_skip_tls_verify,
        ..ClusterCredentials::default()
    };

    if let Some(user) = user {
        if user.exec.is_some() || user.auth_provider.is_some() {
            return Err(ClusterError::Credentials(format!(
                "user '{}' relies on an exec or auth-provider plugin, which is not supported",
                context.context.user
            )));
        }

        let cert = inline_or_file(
            user.client_certificate_data.as_deref(),
            user.client_certificate.as_deref(),
            base_dir,
        )?;
        let key = inline_or_file(user.client_key_data.as_deref(), user.client_key.as_deref(), base_dir)?;
        credentials.identity_pem = match (cert, key) {
            (Some(mut cert), Some(key)) => {
                if !cert.ends_with(b"\n") {
                    cert.push(b'\n');
                }
                cert.extend_from_slice(&key);
                Some(cert)
            }
            (None, None) => None,
            _ => {
                return Err(ClusterError::Credentials(format!(
                    "user '{}' must set both a client certificate and a client key",
                    context.context.user
                )))
            }
        };

        credentials.bearer_token = match (&user.token, &user.token_file) {
            (Some(token), _) if !token.is_empty() => Some(BearerToken::Static(token.to_owned())),
            (_, Some(file)) => Some(BearerToken::File(resolve_path(file, base_dir))),
            _ => None,
        };

        if let (Some(username), Some(password)) = (&user.username, &user.password) {
            credentials.basic_auth = Some((username.to_owned(), password.to_owned()));
        }
    }

    info!(
        context = %context.name,
        server = %credentials.server,
        "kubeconfig loaded"
    );
    Ok(credentials)
}

/// Service account mounted into the pod.
pub fn in_cluster() -> Result<ClusterCredentials, ClusterError> {
    let host = std::env::var(KUBERNETES_SERVICE_HOST_ENV).map_err(|_| {
        ClusterError::Credentials(format!(
            "no kubeconfig_path configured and {} is not set (not running in a cluster)",
            KUBERNETES_SERVICE_HOST_ENV
        ))
    })?;
    let port = std::env::var(KUBERNETES_SERVICE_PORT_ENV).unwrap_or_else(|_| "443".to_owned());
    in_cluster_with(&host, &port, Path::new(SERVICE_ACCOUNT_TOKEN_PATH), Path::new(SERVICE_ACCOUNT_CA_PATH))
}

pub fn in_cluster_with(
    host: &str,
    port: &str,
    token_path: &Path,
    ca_path: &Path,
) -> Result<ClusterCredentials, ClusterError> {
    // fail early rather than on the first request
    let token = BearerToken::File(token_path.to_path_buf());
    token.resolve()?;

    let ca_pem = match fs::read(ca_path) {
        Ok(pem) => Some(pem),
        Err(e) => {
            warn!(path = %ca_path.display(), error = %e, "cannot read service account CA, using system roots");
            None
        }
    };

    let host = if host.contains(':') && !host.starts_with('[') {
        format!("[{}]", host)
    } else {
        host.to_owned()
    };

    Ok(ClusterCredentials {
        server: format!("https://{}:{}", host, port),
        ca_pem,
        bearer_token: Some(token),
        ..ClusterCredentials::default()
    })
}

fn inline_or_file(data: Option<&str>, file: Option<&str>, base_dir: &Path) -> Result<Option<Vec<u8>>, ClusterError> {
    if let Some(data) = data.filter(|d| !d.trim().is_empty()) {
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(data.trim())
            .map_err(|e| ClusterError::Credentials(format!("invalid base64 in kubeconfig: {}", e)))?;
        return Ok(Some(decoded));
    }
    match file.filter(|f| !f.is_empty()) {
        Some(file) => {
            let path = resolve_path(file, base_dir);
            fs::read(&path).map(Some).map_err(|source| ClusterError::Io {
                path: path.display().to_string(),
                source,
            })
        }
        None => Ok(None),
    }
}

fn resolve_path(file: &str, base_dir: &Path) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
