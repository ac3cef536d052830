//! Cluster connection resolution.
//!
//! Builds a single `kube::Config` from one of four credential sources,
//! checked in priority order:
//!
//! 1. Inline kubeconfig content from `KUBECONFIG_DATA`
//! 2. API server URL and bearer token from `KUBERNETES_SERVER` / `KUBERNETES_TOKEN`
//! 3. In-cluster service account credentials
//! 4. A kubeconfig file (explicit path, `$KUBECONFIG`, or `~/.kube/config`)
//!
//! Resolution runs once at startup; a failure here is fatal.

use std::path::Path;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use kube::Config;
use kube::config::{
    AuthInfo, Cluster, Context, KubeConfigOptions, Kubeconfig, NamedAuthInfo, NamedCluster,
    NamedContext,
};

use crate::error::ConfigError;

/// Well-known service account token path used to detect in-cluster execution.
const SERVICE_ACCOUNT_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

/// Snapshot of the environment variables consulted during connection
/// resolution. Read from the process environment exactly once; tests
/// construct it directly.
#[derive(Debug, Default, Clone)]
pub struct ConnectionEnv {
    pub kubeconfig_data: Option<String>,
    pub server: Option<String>,
    pub token: Option<String>,
    pub ca_cert: Option<String>,
    pub ca_cert_path: Option<String>,
    pub insecure: bool,
}

impl ConnectionEnv {
    /// Capture the connection-related environment variables.
    pub fn from_process() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            kubeconfig_data: var("KUBECONFIG_DATA"),
            server: var("KUBERNETES_SERVER"),
            token: var("KUBERNETES_TOKEN"),
            ca_cert: var("KUBERNETES_CA_CERT"),
            ca_cert_path: var("KUBERNETES_CA_CERT_PATH"),
            insecure: var("KUBERNETES_INSECURE").as_deref() == Some("true"),
        }
    }
}

/// Resolve the cluster connection configuration.
///
/// `kubeconfig_path` is an explicit file override for the lowest-priority
/// source; the higher-priority environment sources win regardless.
pub async fn resolve_config(
    env: &ConnectionEnv,
    kubeconfig_path: Option<&Path>,
) -> Result<Config, ConfigError> {
    // Source 1: full kubeconfig content supplied inline.
    if let Some(data) = &env.kubeconfig_data {
        tracing::debug!("building connection from inline kubeconfig data");
        let kubeconfig = Kubeconfig::from_yaml(data).map_err(ConfigError::InlineConfig)?;
        let config =
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?;
        return Ok(config);
    }

    // Source 2: explicit server URL plus bearer token.
    if let Some(server) = &env.server {
        let token = env.token.as_deref().ok_or(ConfigError::TokenMissing)?;
        tracing::debug!(server = %server, "building connection from server URL and token");

        let ca_data = match (&env.ca_cert, &env.ca_cert_path) {
            (Some(pem), _) => Some(pem.clone().into_bytes()),
            (None, Some(path)) => {
                let bytes = std::fs::read(path).map_err(|source| ConfigError::CaCertRead {
                    path: path.into(),
                    source,
                })?;
                Some(bytes)
            }
            (None, None) => None,
        };

        let kubeconfig = token_kubeconfig(server, token, ca_data.as_deref(), env.insecure);
        let config =
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?;
        return Ok(config);
    }

    // Source 3: in-cluster service account.
    if Path::new(SERVICE_ACCOUNT_TOKEN_PATH).exists() {
        tracing::debug!("building in-cluster connection from service account");
        return Config::incluster().map_err(ConfigError::InCluster);
    }

    // Source 4: kubeconfig file. `Kubeconfig::read` honors $KUBECONFIG
    // and falls back to ~/.kube/config.
    let kubeconfig = match kubeconfig_path {
        Some(path) => Kubeconfig::read_from(path)?,
        None => Kubeconfig::read()?,
    };
    let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?;
    Ok(config)
}

/// Build an in-memory kubeconfig for token-based authentication against a
/// fixed API server.
fn token_kubeconfig(
    server: &str,
    token: &str,
    ca_pem: Option<&[u8]>,
    insecure: bool,
) -> Kubeconfig {
    let cluster_name = "cluster";
    let user_name = "user";
    let context_name = "default";

    Kubeconfig {
        clusters: vec![NamedCluster {
            name: cluster_name.to_string(),
            cluster: Some(Cluster {
                server: Some(server.to_string()),
                certificate_authority_data: ca_pem.map(|pem| BASE64.encode(pem)),
                insecure_skip_tls_verify: insecure.then_some(true),
                ..Default::default()
            }),
        }],
        auth_infos: vec![NamedAuthInfo {
            name: user_name.to_string(),
            auth_info: Some(AuthInfo {
                token: Some(token.to_string().into()),
                ..Default::default()
            }),
        }],
        contexts: vec![NamedContext {
            name: context_name.to_string(),
            context: Some(Context {
                cluster: cluster_name.to_string(),
                user: Some(user_name.to_string()),
                ..Default::default()
            }),
        }],
        current_context: Some(context_name.to_string()),
        ..Default::default()
    }
}
