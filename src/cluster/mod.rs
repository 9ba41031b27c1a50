//! Cluster secret source
//!
//! Defines the discovery interface the reconciliation loop consumes and the
//! Kubernetes REST implementation of it.

use std::collections::HashMap;
use std::future::Future;

pub mod client;
pub mod error;
pub mod kubeconfig;

pub use client::KubeClient;
pub use error::ClusterError;

/// A secret as returned by the cluster, with decoded data values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretBlob {
    pub name: String,
    pub namespace: String,
    pub annotations: HashMap<String, String>,
    pub data: HashMap<String, Vec<u8>>,
}

impl SecretBlob {
    /// Data key named by the annotation, empty when the annotation is missing.
    pub fn annotated_key(&self, annotation_key: &str) -> &str {
        self.annotations
            .get(annotation_key)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Data value under `key`, empty when absent.
    pub fn value(&self, key: &str) -> &[u8] {
        self.data.get(key).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Where a token was read from; used for labels and logs only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretRef {
    pub namespace: String,
    pub name: String,
    /// data key holding the token
    pub key: String,
}

impl SecretRef {
    pub fn new(namespace: &str, name: &str, key: &str) -> Self {
        Self {
            namespace: namespace.to_owned(),
            name: name.to_owned(),
            key: key.to_owned(),
        }
    }
}

pub trait SecretSource {
    fn list_namespaces(&self) -> impl Future<Output = Result<Vec<String>, ClusterError>> + Send;

    /// `None` lists every secret of the namespace.
    fn list_secrets(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> impl Future<Output = Result<Vec<SecretBlob>, ClusterError>> + Send;
}
