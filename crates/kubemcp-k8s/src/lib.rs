//! Kubernetes access layer: connection resolution, kind discovery with
//! caching, dynamic resource CRUD, pod logs, metrics and cluster reads.

use std::path::Path;

use kube::Client;

pub mod cluster;
pub mod config;
pub mod discovery;
pub mod dynamic;
pub mod error;
pub mod logs;
pub mod metrics;

pub use config::ConnectionEnv;
pub use discovery::{ApiResourceInfo, KindCoordinate};
pub use dynamic::{ApplyOutcome, ResourceSummary};
pub use error::{ConfigError, Error};

use discovery::KindCache;

/// Shared handle to one cluster.
///
/// Wraps the kube client together with the kind resolution cache; all
/// operations hang off this type. Cloned cheaply into tool handlers.
pub struct KubeClient {
    client: Client,
    kinds: KindCache,
}

impl KubeClient {
    /// Resolve the connection configuration and connect.
    pub async fn connect(
        env: &ConnectionEnv,
        kubeconfig_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let config = config::resolve_config(env, kubeconfig_path).await?;
        tracing::info!(cluster = %config.cluster_url, "connected to cluster");
        let client = Client::try_from(config)?;
        Ok(Self::with_client(client))
    }

    /// Wrap an already-built client. Used by tests that point the client
    /// at a mock API server.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            kinds: KindCache::default(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Resolve a kind through the process-lifetime cache.
    pub async fn resolve_kind(&self, kind: &str) -> Result<KindCoordinate, Error> {
        self.kinds.resolve(&self.client, kind).await
    }
}
