//! Pod log retrieval with multi-container aggregation.

use k8s_openapi::api::core::v1::Pod;
use kube::Api;
use kube::api::LogParams;

use crate::KubeClient;
use crate::error::Error;

/// Every fetch tails the same fixed number of lines.
const LOG_TAIL_LINES: i64 = 100;

/// Log fetch result for one container, with the failure already rendered
/// to text so one broken container cannot sink the others.
type ContainerLogs = (String, Result<String, String>);

impl KubeClient {
    /// Fetch logs for a pod.
    ///
    /// With an explicit container the fetch targets it directly. Without
    /// one, a single-container pod returns that container's logs bare,
    /// and a multi-container pod returns every container's logs wrapped
    /// in per-container header sections. A container whose fetch fails
    /// contributes an error marker section instead of failing the call.
    pub async fn pod_logs(
        &self,
        namespace: &str,
        pod_name: &str,
        container: Option<&str>,
    ) -> Result<String, Error> {
        let pods: Api<Pod> = Api::namespaced(self.client().clone(), namespace);

        if let Some(container) = container.filter(|c| !c.is_empty()) {
            return Ok(pods.logs(pod_name, &log_params(Some(container))).await?);
        }

        // No container given: inspect the pod to decide the policy.
        let pod = pods.get(pod_name).await?;
        let containers: Vec<String> = pod
            .spec
            .map(|spec| spec.containers.into_iter().map(|c| c.name).collect())
            .unwrap_or_default();

        if containers.len() == 1 {
            return Ok(pods.logs(pod_name, &log_params(None)).await?);
        }

        let mut sections: Vec<ContainerLogs> = Vec::with_capacity(containers.len());
        for name in containers {
            let result = pods
                .logs(pod_name, &log_params(Some(&name)))
                .await
                .map_err(|err| err.to_string());
            sections.push((name, result));
        }
        Ok(render_log_sections(&sections))
    }
}

fn log_params(container: Option<&str>) -> LogParams {
    LogParams {
        tail_lines: Some(LOG_TAIL_LINES),
        container: container.map(str::to_string),
        ..Default::default()
    }
}

/// Concatenate per-container results into one annotated text block.
fn render_log_sections(sections: &[ContainerLogs]) -> String {
    let mut out = String::new();
    for (name, result) in sections {
        match result {
            Ok(logs) => {
                out.push_str(&format!("\n--- Logs for container {name} ---\n"));
                out.push_str(logs);
            }
            Err(err) => {
                out.push_str(&format!(
                    "\n--- Error getting logs for container {name}: {err} ---\n"
                ));
            }
        }
    }
    out
}
