//! MCP tool surface over the Kubernetes and Helm clients.
//!
//! The tool set is assembled from four routers (Kubernetes/Helm, each
//! split into read and write halves) so that `--read-only`, `--no-k8s`
//! and `--no-helm` can drop whole groups without touching the handlers.

mod params;

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo,
};
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use serde::Serialize;

use kubemcp_helm::{HelmClient, HelmError};
use kubemcp_k8s::{Error as K8sError, KubeClient};

use params::*;

#[derive(Clone)]
pub struct KubemcpServer {
    k8s: Option<Arc<KubeClient>>,
    helm: Option<Arc<HelmClient>>,
    tool_router: ToolRouter<Self>,
}

impl KubemcpServer {
    pub fn new(
        k8s: Option<Arc<KubeClient>>,
        helm: Option<Arc<HelmClient>>,
        read_only: bool,
    ) -> Self {
        let mut tool_router = ToolRouter::default();
        if k8s.is_some() {
            tool_router = tool_router + Self::k8s_read_router();
            if !read_only {
                tool_router = tool_router + Self::k8s_write_router();
            }
        }
        if helm.is_some() {
            tool_router = tool_router + Self::helm_read_router();
            if !read_only {
                tool_router = tool_router + Self::helm_write_router();
            }
        }
        Self {
            k8s,
            helm,
            tool_router,
        }
    }

    fn k8s(&self) -> Result<&KubeClient, McpError> {
        self.k8s
            .as_deref()
            .ok_or_else(|| McpError::internal_error("kubernetes support is disabled", None))
    }

    fn helm(&self) -> Result<&HelmClient, McpError> {
        self.helm
            .as_deref()
            .ok_or_else(|| McpError::internal_error("helm support is disabled", None))
    }
}

fn k8s_error(err: K8sError) -> McpError {
    match &err {
        K8sError::ManifestParse(_) | K8sError::KindMissing | K8sError::NameMissing => {
            McpError::invalid_params(err.to_string(), None)
        }
        _ => McpError::internal_error(err.to_string(), None),
    }
}

fn helm_error(err: HelmError) -> McpError {
    McpError::internal_error(err.to_string(), None)
}

fn json_result(value: &impl Serialize) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| McpError::internal_error(err.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

fn text_result(text: impl Into<String>) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(text.into())]))
}

#[tool_router(router = k8s_read_router)]
impl KubemcpServer {
    #[tool(
        name = "getAPIResources",
        description = "Get all supported API resource types in the cluster"
    )]
    async fn get_api_resources(
        &self,
        Parameters(req): Parameters<GetApiResourcesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let resources = self
            .k8s()?
            .api_resources(
                req.include_namespace_scoped.unwrap_or(true),
                req.include_cluster_scoped.unwrap_or(true),
            )
            .await
            .map_err(k8s_error)?;
        json_result(&resources)
    }

    #[tool(name = "listResources", description = "List all instances of a resource type")]
    async fn list_resources(
        &self,
        Parameters(req): Parameters<ListResourcesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let resources = self
            .k8s()?
            .list_resources(
                &req.kind,
                req.namespace.as_deref(),
                req.label_selector.as_deref(),
                req.field_selector.as_deref(),
            )
            .await
            .map_err(k8s_error)?;
        json_result(&resources)
    }

    #[tool(
        name = "getResource",
        description = "Get detailed information about a specific resource"
    )]
    async fn get_resource(
        &self,
        Parameters(req): Parameters<GetResourceRequest>,
    ) -> Result<CallToolResult, McpError> {
        let resource = self
            .k8s()?
            .get_resource(&req.kind, &req.name, req.namespace.as_deref())
            .await
            .map_err(k8s_error)?;
        json_result(&resource)
    }

    #[tool(
        name = "describeResource",
        description = "Describe a resource, returning its full manifest"
    )]
    async fn describe_resource(
        &self,
        Parameters(req): Parameters<DescribeResourceRequest>,
    ) -> Result<CallToolResult, McpError> {
        let resource = self
            .k8s()?
            .describe_resource(&req.kind, &req.name, req.namespace.as_deref())
            .await
            .map_err(k8s_error)?;
        json_result(&resource)
    }

    #[tool(
        name = "getPodsLogs",
        description = "Get logs from a pod, aggregating all containers when none is specified"
    )]
    async fn get_pods_logs(
        &self,
        Parameters(req): Parameters<GetPodsLogsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let logs = self
            .k8s()?
            .pod_logs(&req.namespace, &req.name, req.container_name.as_deref())
            .await
            .map_err(k8s_error)?;
        text_result(logs)
    }

    #[tool(
        name = "getNodeMetrics",
        description = "Get CPU and memory usage for a specific node"
    )]
    async fn get_node_metrics(
        &self,
        Parameters(req): Parameters<GetNodeMetricsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let metrics = self.k8s()?.node_metrics(&req.name).await.map_err(k8s_error)?;
        json_result(&metrics)
    }

    #[tool(
        name = "getPodMetrics",
        description = "Get CPU and memory usage for a specific pod"
    )]
    async fn get_pod_metrics(
        &self,
        Parameters(req): Parameters<GetPodMetricsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let metrics = self
            .k8s()?
            .pod_metrics(&req.namespace, &req.pod_name)
            .await
            .map_err(k8s_error)?;
        json_result(&metrics)
    }

    #[tool(
        name = "getEvents",
        description = "Get events from a namespace, or the whole cluster when omitted"
    )]
    async fn get_events(
        &self,
        Parameters(req): Parameters<GetEventsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let events = self
            .k8s()?
            .get_events(req.namespace.as_deref(), req.label_selector.as_deref())
            .await
            .map_err(k8s_error)?;
        json_result(&events)
    }

    #[tool(
        name = "getIngresses",
        description = "Get ingress routing entries, filtered by host"
    )]
    async fn get_ingresses(
        &self,
        Parameters(req): Parameters<GetIngressesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let host = (!req.host.is_empty()).then_some(req.host.as_str());
        let ingresses = self.k8s()?.get_ingresses(host).await.map_err(k8s_error)?;
        json_result(&ingresses)
    }
}

#[tool_router(router = k8s_write_router)]
impl KubemcpServer {
    #[tool(
        name = "createResource",
        description = "Create or update a resource from a JSON manifest"
    )]
    async fn create_resource(
        &self,
        Parameters(req): Parameters<CreateResourceRequest>,
    ) -> Result<CallToolResult, McpError> {
        let namespace = req.namespace.as_deref().unwrap_or("default");
        let outcome = self
            .k8s()?
            .create_or_update_resource_json(namespace, &req.manifest, Some(&req.kind))
            .await
            .map_err(k8s_error)?;
        tracing::info!(kind = %req.kind, verb = outcome.verb(), "applied resource");
        json_result(outcome.resource())
    }

    #[tool(
        name = "createResourceYAML",
        description = "Create or update a resource from a YAML manifest"
    )]
    async fn create_resource_yaml(
        &self,
        Parameters(req): Parameters<CreateResourceYamlRequest>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self
            .k8s()?
            .create_or_update_resource_yaml(
                req.namespace.as_deref(),
                &req.yaml_manifest,
                req.kind.as_deref(),
            )
            .await
            .map_err(k8s_error)?;
        tracing::info!(verb = outcome.verb(), "applied resource from YAML");
        json_result(outcome.resource())
    }

    #[tool(name = "deleteResource", description = "Delete a specific resource")]
    async fn delete_resource(
        &self,
        Parameters(req): Parameters<DeleteResourceRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.k8s()?
            .delete_resource(&req.kind, &req.name, req.namespace.as_deref())
            .await
            .map_err(k8s_error)?;
        text_result(format!("{} {} deleted", req.kind, req.name))
    }

    #[tool(
        name = "rolloutRestart",
        description = "Restart a workload by stamping its pod template annotation"
    )]
    async fn rollout_restart(
        &self,
        Parameters(req): Parameters<RolloutRestartRequest>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .k8s()?
            .rollout_restart(&req.kind, &req.name, &req.namespace)
            .await
            .map_err(k8s_error)?;
        json_result(&result)
    }
}

#[tool_router(router = helm_read_router)]
impl KubemcpServer {
    #[tool(name = "helmList", description = "List Helm releases")]
    async fn helm_list(
        &self,
        Parameters(req): Parameters<HelmListRequest>,
    ) -> Result<CallToolResult, McpError> {
        let releases = self
            .helm()?
            .list_releases(req.namespace.as_deref())
            .await
            .map_err(helm_error)?;
        json_result(&releases)
    }

    #[tool(name = "helmGet", description = "Get the status of a Helm release")]
    async fn helm_get(
        &self,
        Parameters(req): Parameters<HelmReleaseRequest>,
    ) -> Result<CallToolResult, McpError> {
        let release = self
            .helm()?
            .get_release(&req.namespace, &req.release_name)
            .await
            .map_err(helm_error)?;
        json_result(&release)
    }

    #[tool(name = "helmHistory", description = "Get the revision history of a Helm release")]
    async fn helm_history(
        &self,
        Parameters(req): Parameters<HelmReleaseRequest>,
    ) -> Result<CallToolResult, McpError> {
        let history = self
            .helm()?
            .release_history(&req.namespace, &req.release_name)
            .await
            .map_err(helm_error)?;
        json_result(&history)
    }

    #[tool(name = "helmRepoList", description = "List configured Helm repositories")]
    async fn helm_repo_list(&self) -> Result<CallToolResult, McpError> {
        let repos = self.helm()?.repo_list().await.map_err(helm_error)?;
        json_result(&repos)
    }
}

#[tool_router(router = helm_write_router)]
impl KubemcpServer {
    #[tool(name = "helmInstall", description = "Install a Helm chart")]
    async fn helm_install(
        &self,
        Parameters(req): Parameters<HelmInstallRequest>,
    ) -> Result<CallToolResult, McpError> {
        let release = self
            .helm()?
            .install_chart(
                req.namespace.as_deref(),
                &req.release_name,
                &req.chart_name,
                req.repo_url.as_deref(),
                req.values.as_ref(),
            )
            .await
            .map_err(helm_error)?;
        json_result(&release)
    }

    #[tool(name = "helmUpgrade", description = "Upgrade a Helm release")]
    async fn helm_upgrade(
        &self,
        Parameters(req): Parameters<HelmUpgradeRequest>,
    ) -> Result<CallToolResult, McpError> {
        let release = self
            .helm()?
            .upgrade_chart(
                &req.namespace,
                &req.release_name,
                &req.chart_name,
                Some(&req.values),
            )
            .await
            .map_err(helm_error)?;
        json_result(&release)
    }

    #[tool(name = "helmUninstall", description = "Uninstall a Helm release")]
    async fn helm_uninstall(
        &self,
        Parameters(req): Parameters<HelmUninstallRequest>,
    ) -> Result<CallToolResult, McpError> {
        let message = self
            .helm()?
            .uninstall_chart(&req.namespace, &req.release_name)
            .await
            .map_err(helm_error)?;
        text_result(message)
    }

    #[tool(name = "helmRollback", description = "Rollback a Helm release to a previous revision")]
    async fn helm_rollback(
        &self,
        Parameters(req): Parameters<HelmRollbackRequest>,
    ) -> Result<CallToolResult, McpError> {
        let message = self
            .helm()?
            .rollback_release(&req.namespace, &req.release_name, req.revision)
            .await
            .map_err(helm_error)?;
        text_result(message)
    }

    #[tool(name = "helmRepoAdd", description = "Add a Helm chart repository")]
    async fn helm_repo_add(
        &self,
        Parameters(req): Parameters<HelmRepoAddRequest>,
    ) -> Result<CallToolResult, McpError> {
        let message = self
            .helm()?
            .repo_add(&req.repo_name, &req.repo_url)
            .await
            .map_err(helm_error)?;
        text_result(message)
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for KubemcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Kubernetes and Helm operations: inspect, create, update and delete \
                 cluster resources, read pod logs and metrics, and manage Helm releases."
                    .to_string(),
            ),
            ..Default::default()
        }
    }
}
