//! Request parameter types for the tool surface.
//!
//! Field casing follows the wire names the tools have always used, which
//! are not uniform (`Kind` vs `kind`, `Name` vs `name`); serde renames
//! keep the Rust side consistent.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetApiResourcesRequest {
    /// Include namespace scoped resources
    #[serde(rename = "includeNamespaceScoped", default)]
    pub include_namespace_scoped: Option<bool>,
    /// Include cluster scoped resources
    #[serde(rename = "includeClusterScoped", default)]
    pub include_cluster_scoped: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListResourcesRequest {
    /// The type of resource to list
    #[serde(rename = "Kind")]
    pub kind: String,
    /// The namespace to list resources in
    #[serde(default)]
    pub namespace: Option<String>,
    /// A label selector to filter resources
    #[serde(rename = "labelSelector", default)]
    pub label_selector: Option<String>,
    /// A field selector to filter resources
    #[serde(rename = "fieldSelector", default)]
    pub field_selector: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetResourceRequest {
    /// The type of resource to get
    pub kind: String,
    /// The name of the resource to get
    pub name: String,
    /// The namespace of the resource
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DescribeResourceRequest {
    /// The type of resource to describe
    #[serde(rename = "Kind")]
    pub kind: String,
    /// The name of the resource to describe
    pub name: String,
    /// The namespace of the resource
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetPodsLogsRequest {
    /// The name of the pod to get logs from
    #[serde(rename = "Name")]
    pub name: String,
    /// The name of the container to get logs from
    #[serde(rename = "containerName", default)]
    pub container_name: Option<String>,
    /// The namespace of the pod
    pub namespace: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetNodeMetricsRequest {
    /// The name of the node to get resource usage from
    #[serde(rename = "Name")]
    pub name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetPodMetricsRequest {
    /// The namespace of the pod
    pub namespace: String,
    /// The name of the pod
    #[serde(rename = "podName")]
    pub pod_name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetEventsRequest {
    /// The namespace to get events from
    #[serde(default)]
    pub namespace: Option<String>,
    /// A label selector to filter events
    #[serde(rename = "labelSelector", default)]
    pub label_selector: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetIngressesRequest {
    /// The host to get ingresses from
    pub host: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateResourceRequest {
    /// The type of resource to create
    pub kind: String,
    /// The namespace of the resource
    #[serde(default)]
    pub namespace: Option<String>,
    /// The JSON manifest of the resource to create or update
    pub manifest: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateResourceYamlRequest {
    /// The type of resource to create (inferred from the manifest when omitted)
    #[serde(default)]
    pub kind: Option<String>,
    /// The namespace of the resource (overrides the manifest namespace when provided)
    #[serde(default)]
    pub namespace: Option<String>,
    /// The YAML manifest of the resource to create or update
    #[serde(rename = "yamlManifest")]
    pub yaml_manifest: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteResourceRequest {
    /// The type of resource to delete
    pub kind: String,
    /// The name of the resource to delete
    pub name: String,
    /// The namespace of the resource
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RolloutRestartRequest {
    /// The type of resource to restart (e.g., Deployment, DaemonSet)
    pub kind: String,
    /// The name of the resource
    pub name: String,
    /// The namespace of the resource
    pub namespace: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct HelmInstallRequest {
    /// Name of the Helm release
    #[serde(rename = "releaseName")]
    pub release_name: String,
    /// Name or path of the Helm chart
    #[serde(rename = "chartName")]
    pub chart_name: String,
    /// Kubernetes namespace for the release
    #[serde(default)]
    pub namespace: Option<String>,
    /// Helm repository URL
    #[serde(rename = "repoURL", default)]
    pub repo_url: Option<String>,
    /// Values to override in the chart
    #[serde(default)]
    pub values: Option<Value>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct HelmUpgradeRequest {
    /// Name of the Helm release to upgrade
    #[serde(rename = "releaseName")]
    pub release_name: String,
    /// Name or path of the Helm chart
    #[serde(rename = "chartName")]
    pub chart_name: String,
    /// Kubernetes namespace of the release
    pub namespace: String,
    /// Values to override in the chart
    pub values: Value,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct HelmUninstallRequest {
    /// Name of the Helm release to uninstall
    #[serde(rename = "releaseName")]
    pub release_name: String,
    /// Kubernetes namespace of the release
    pub namespace: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct HelmListRequest {
    /// Kubernetes namespace to list releases from (empty for all namespaces)
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct HelmReleaseRequest {
    /// Name of the Helm release
    #[serde(rename = "releaseName")]
    pub release_name: String,
    /// Kubernetes namespace of the release
    pub namespace: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct HelmRollbackRequest {
    /// Name of the Helm release to rollback
    #[serde(rename = "releaseName")]
    pub release_name: String,
    /// Kubernetes namespace of the release
    pub namespace: String,
    /// Revision number to rollback to (0 for previous)
    pub revision: u32,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct HelmRepoAddRequest {
    /// Name of the Helm repository
    #[serde(rename = "repoName")]
    pub repo_name: String,
    /// URL of the Helm repository
    #[serde(rename = "repoURL")]
    pub repo_url: String,
}
