//! Error types for the Kubernetes access layer.

use std::path::PathBuf;

use kube::config::{InClusterError, KubeconfigError};
use thiserror::Error;

/// Errors that can occur while resolving the cluster connection at startup.
///
/// All of these are fatal: the server cannot run without a connection.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load kubeconfig from KUBECONFIG_DATA")]
    InlineConfig(#[source] KubeconfigError),

    #[error("KUBERNETES_TOKEN is required when KUBERNETES_SERVER is set")]
    TokenMissing,

    #[error("failed to read CA certificate from {path}")]
    CaCertRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build in-cluster configuration")]
    InCluster(#[source] InClusterError),

    #[error("failed to load kubeconfig")]
    Kubeconfig(#[from] KubeconfigError),

    #[error(transparent)]
    Kube(#[from] kube::Error),
}

/// Errors surfaced by individual access-layer operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed manifest input. Reported before any cluster call is made.
    #[error("failed to parse resource manifest: {0}")]
    ManifestParse(String),

    #[error("resource kind is required: provide it as a parameter or include it in the manifest")]
    KindMissing,

    #[error("resource name is required in manifest")]
    NameMissing,

    /// The kind did not match anything in cluster discovery. Never cached:
    /// a later call will run discovery again.
    #[error("resource kind `{0}` not found in cluster discovery")]
    KindNotFound(String),

    #[error("resource kind `{kind}` does not support rollout restart (no spec.template)")]
    RolloutUnsupported { kind: String },

    #[error("failed to build API request")]
    Request(#[from] http::Error),

    #[error("failed to serialize response")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Kube(#[from] kube::Error),
}

/// Whether a kube error is an API 404. The create-or-update protocol
/// depends on telling not-found apart from every other patch failure.
pub fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(ae) if ae.code == 404)
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Kube(e) if is_not_found(e))
    }
}
