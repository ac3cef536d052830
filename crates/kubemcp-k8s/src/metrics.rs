//! Resource usage reads from the metrics.k8s.io aggregated API.
//!
//! There is no typed client for the metrics API in this stack, so the
//! reads go through raw GET requests and the responses are projected
//! down to the few fields callers care about. Availability depends on
//! metrics-server being installed; without it the API returns 404 and
//! the error is passed through untouched.

use http::Request;
use serde_json::{Value, json};

use crate::KubeClient;
use crate::error::Error;

const METRICS_API_BASE: &str = "/apis/metrics.k8s.io/v1beta1";

impl KubeClient {
    /// CPU and memory usage for one pod, per container.
    pub async fn pod_metrics(&self, namespace: &str, pod_name: &str) -> Result<Value, Error> {
        let path = format!("{METRICS_API_BASE}/namespaces/{namespace}/pods/{pod_name}");
        let raw: Value = self
            .client()
            .request(Request::get(path).body(Vec::new())?)
            .await?;
        Ok(project_pod_metrics(pod_name, namespace, &raw))
    }

    /// CPU and memory usage for one node.
    pub async fn node_metrics(&self, node_name: &str) -> Result<Value, Error> {
        let path = format!("{METRICS_API_BASE}/nodes/{node_name}");
        let raw: Value = self
            .client()
            .request(Request::get(path).body(Vec::new())?)
            .await?;
        Ok(project_node_metrics(node_name, &raw))
    }
}

fn project_pod_metrics(pod_name: &str, namespace: &str, raw: &Value) -> Value {
    let containers: Vec<Value> = raw
        .get("containers")
        .and_then(Value::as_array)
        .map(|containers| {
            containers
                .iter()
                .map(|container| {
                    json!({
                        "name": container.get("name").cloned().unwrap_or_default(),
                        "cpu": container.pointer("/usage/cpu").cloned().unwrap_or_default(),
                        "memory": container.pointer("/usage/memory").cloned().unwrap_or_default(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    json!({
        "podName": pod_name,
        "namespace": namespace,
        "timestamp": raw.get("timestamp").cloned().unwrap_or_default(),
        "window": raw.get("window").cloned().unwrap_or_default(),
        "containers": containers,
    })
}

fn project_node_metrics(node_name: &str, raw: &Value) -> Value {
    json!({
        "nodeName": node_name,
        "timestamp": raw.get("timestamp").cloned().unwrap_or_default(),
        "window": raw.get("window").cloned().unwrap_or_default(),
        "usage": {
            "cpu": raw.pointer("/usage/cpu").cloned().unwrap_or_default(),
            "memory": raw.pointer("/usage/memory").cloned().unwrap_or_default(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pod_projection_keeps_per_container_usage() {
        let raw = json!({
            "metadata": {"name": "web-0", "namespace": "apps"},
            "timestamp": "2026-08-27T10:00:00Z",
            "window": "30s",
            "containers": [
                {"name": "app", "usage": {"cpu": "250m", "memory": "128Mi"}},
                {"name": "sidecar", "usage": {"cpu": "10m", "memory": "16Mi"}}
            ]
        });

        let projected = project_pod_metrics("web-0", "apps", &raw);
        assert_eq!(projected["podName"], "web-0");
        assert_eq!(projected["namespace"], "apps");
        assert_eq!(projected["window"], "30s");
        assert_eq!(projected["containers"][0]["name"], "app");
        assert_eq!(projected["containers"][0]["cpu"], "250m");
        assert_eq!(projected["containers"][1]["memory"], "16Mi");
    }

    #[test]
    fn node_projection_flattens_usage() {
        let raw = json!({
            "metadata": {"name": "node-1"},
            "timestamp": "2026-08-27T10:00:00Z",
            "window": "20s",
            "usage": {"cpu": "2", "memory": "4Gi"}
        });

        let projected = project_node_metrics("node-1", &raw);
        assert_eq!(projected["nodeName"], "node-1");
        assert_eq!(projected["usage"]["cpu"], "2");
        assert_eq!(projected["usage"]["memory"], "4Gi");
    }

    #[test]
    fn missing_fields_project_to_null() {
        let projected = project_pod_metrics("p", "ns", &json!({}));
        assert_eq!(projected["containers"], json!([]));
        assert_eq!(projected["window"], Value::Null);
    }
}
