//! In-process mock API server for integration tests.
//!
//! Serves legacy discovery plus stateful CRUD over a shared resource map,
//! enough to exercise kind resolution, the patch-then-create protocol and
//! the typed reads. PATCH against a missing object returns 404, matching
//! a real API server; create-or-update relies on that. Log and metrics
//! endpoints are not modeled here; tests mount priority overrides for
//! them.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use kube::config::{
    AuthInfo, Cluster, Context, KubeConfigOptions, Kubeconfig, NamedAuthInfo, NamedCluster,
    NamedContext,
};
use parking_lot::RwLock;
use serde_json::{Value, json};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use kubemcp_k8s::KubeClient;

type SharedResources = Arc<RwLock<HashMap<(String, String), Value>>>;

/// Discovery table served by the mock: core v1 plus two groups, with
/// subresource entries present so resolution has to skip them.
fn core_resources() -> Value {
    json!([
        {"name": "pods", "singularName": "pod", "namespaced": true, "kind": "Pod",
         "verbs": ["get", "list", "create", "patch", "delete"]},
        {"name": "pods/log", "singularName": "", "namespaced": true, "kind": "Pod",
         "verbs": ["get"]},
        {"name": "configmaps", "singularName": "configmap", "namespaced": true,
         "kind": "ConfigMap", "verbs": ["get", "list", "create", "patch", "delete"]},
        {"name": "events", "singularName": "event", "namespaced": true, "kind": "Event",
         "verbs": ["get", "list"]},
        {"name": "namespaces", "singularName": "namespace", "namespaced": false,
         "kind": "Namespace", "verbs": ["get", "list", "create"]},
    ])
}

fn group_resources() -> Vec<(&'static str, Value)> {
    vec![
        (
            "apps/v1",
            json!([
                {"name": "deployments", "singularName": "deployment", "namespaced": true,
                 "kind": "Deployment", "verbs": ["get", "list", "create", "patch", "delete"]},
                {"name": "deployments/scale", "singularName": "", "namespaced": true,
                 "kind": "Scale", "verbs": ["get", "patch"]},
            ]),
        ),
        (
            "networking.k8s.io/v1",
            json!([
                {"name": "ingresses", "singularName": "ingress", "namespaced": true,
                 "kind": "Ingress", "verbs": ["get", "list"]},
            ]),
        ),
        (
            "example.com/v1",
            json!([
                {"name": "widgets", "singularName": "widget", "namespaced": true,
                 "kind": "Widget", "verbs": ["get", "list", "create", "patch", "delete"]},
            ]),
        ),
    ]
}

pub struct MockCluster {
    pub server: MockServer,
    resources: SharedResources,
}

impl MockCluster {
    pub async fn start() -> Self {
        Self::start_with(Vec::new()).await
    }

    /// Start the server seeded with the given manifests. The `default`
    /// namespace always exists.
    pub async fn start_with(seed: Vec<Value>) -> Self {
        let server = MockServer::start().await;

        let mut resources: HashMap<(String, String), Value> = HashMap::new();
        resources.insert(
            ("/api/v1/namespaces".to_string(), "default".to_string()),
            json!({"apiVersion": "v1", "kind": "Namespace", "metadata": {"name": "default"}}),
        );
        for manifest in seed {
            let (api_path, name) =
                storage_key(&manifest).expect("seed manifest must have apiVersion/kind/name");
            resources.insert((api_path, name), manifest);
        }
        let resources: SharedResources = Arc::new(RwLock::new(resources));

        mount_discovery(&server).await;
        mount_crud(&server, &resources).await;

        Self { server, resources }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Kubeconfig document pointing at this server.
    pub fn kubeconfig(&self) -> Kubeconfig {
        Kubeconfig {
            clusters: vec![NamedCluster {
                name: "mock".to_string(),
                cluster: Some(Cluster {
                    server: Some(self.uri()),
                    insecure_skip_tls_verify: Some(true),
                    ..Default::default()
                }),
            }],
            auth_infos: vec![NamedAuthInfo {
                name: "tester".to_string(),
                auth_info: Some(AuthInfo::default()),
            }],
            contexts: vec![NamedContext {
                name: "mock".to_string(),
                context: Some(Context {
                    cluster: "mock".to_string(),
                    user: Some("tester".to_string()),
                    namespace: Some("default".to_string()),
                    ..Default::default()
                }),
            }],
            current_context: Some("mock".to_string()),
            ..Default::default()
        }
    }

    pub async fn kube_client(&self) -> KubeClient {
        let config =
            kube::Config::from_custom_kubeconfig(self.kubeconfig(), &KubeConfigOptions::default())
                .await
                .expect("mock kubeconfig");
        KubeClient::with_client(kube::Client::try_from(config).expect("mock client"))
    }

    /// Stored object, if any.
    pub fn stored(&self, api_path: &str, name: &str) -> Option<Value> {
        self.resources
            .read()
            .get(&(api_path.to_string(), name.to_string()))
            .cloned()
    }

    /// Number of core discovery listings served so far; every full
    /// discovery walk fetches `/api/v1` exactly once.
    pub async fn discovery_walks(&self) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|req| req.method.as_str() == "GET" && req.url.path() == "/api/v1")
            .count()
    }

    /// Requests matching a method and exact path.
    pub async fn requests(&self, wanted_method: &str, wanted_path: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|req| {
                req.method.as_str() == wanted_method && req.url.path() == wanted_path
            })
            .count()
    }
}

/// Derive the collection path and name a manifest is stored under.
fn storage_key(manifest: &Value) -> Option<(String, String)> {
    let api_version = manifest.get("apiVersion")?.as_str()?;
    let kind = manifest.get("kind")?.as_str()?;
    let name = manifest.pointer("/metadata/name")?.as_str()?.to_string();
    let namespace = manifest
        .pointer("/metadata/namespace")
        .and_then(Value::as_str);

    let plural_for = |resources: &Value| -> Option<(String, bool)> {
        resources.as_array()?.iter().find_map(|r| {
            (r["kind"] == kind && !r["name"].as_str()?.contains('/'))
                .then(|| (r["name"].as_str().unwrap().to_string(), r["namespaced"] == true))
        })
    };

    let (prefix, plural, namespaced) = if api_version.contains('/') {
        let resources = group_resources()
            .into_iter()
            .find(|(gv, _)| *gv == api_version)?
            .1;
        let (plural, namespaced) = plural_for(&resources)?;
        (format!("/apis/{api_version}"), plural, namespaced)
    } else {
        let (plural, namespaced) = plural_for(&core_resources())?;
        (format!("/api/{api_version}"), plural, namespaced)
    };

    let api_path = if namespaced {
        format!(
            "{prefix}/namespaces/{}/{plural}",
            namespace.unwrap_or("default")
        )
    } else {
        format!("{prefix}/{plural}")
    };
    Some((api_path, name))
}

async fn mount_discovery(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "APIVersions",
            "versions": ["v1"],
            "serverAddressByClientCIDRs": []
        })))
        .mount(server)
        .await;

    let groups: Vec<Value> = group_resources()
        .iter()
        .map(|(gv, _)| {
            let (group, version) = gv.split_once('/').unwrap();
            json!({
                "name": group,
                "versions": [{"groupVersion": gv, "version": version}],
                "preferredVersion": {"groupVersion": gv, "version": version}
            })
        })
        .collect();

    Mock::given(method("GET"))
        .and(path("/apis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "APIGroupList",
            "apiVersion": "v1",
            "groups": groups
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "APIResourceList",
            "apiVersion": "v1",
            "groupVersion": "v1",
            "resources": core_resources()
        })))
        .mount(server)
        .await;

    for (gv, resources) in group_resources() {
        Mock::given(method("GET"))
            .and(path(format!("/apis/{gv}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "APIResourceList",
                "apiVersion": "v1",
                "groupVersion": gv,
                "resources": resources
            })))
            .mount(server)
            .await;
    }
}

fn not_found() -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Failure",
        "message": "not found",
        "reason": "NotFound",
        "code": 404
    }))
}

async fn mount_crud(server: &MockServer, resources: &SharedResources) {
    let patch_resources = Arc::clone(resources);
    Mock::given(method("PATCH"))
        .and(path_regex(r"^/api(s)?/.*"))
        .respond_with(move |req: &Request| {
            let (api_path, name) = split_resource_path(req.url.path());
            let patch: Value = serde_json::from_slice(&req.body).unwrap_or(Value::Null);

            let mut resources = patch_resources.write();
            match resources.get(&(api_path.clone(), name.clone())) {
                Some(existing) => {
                    let merged = merge_json(existing.clone(), patch);
                    resources.insert((api_path, name), merged.clone());
                    ResponseTemplate::new(200).set_body_json(merged)
                }
                None => not_found(),
            }
        })
        .mount(server)
        .await;

    let post_resources = Arc::clone(resources);
    Mock::given(method("POST"))
        .and(path_regex(r"^/api(s)?/.*"))
        .respond_with(move |req: &Request| {
            let body: Value = serde_json::from_slice(&req.body).unwrap_or(Value::Null);
            let name = body
                .pointer("/metadata/name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            if name.is_empty() {
                return ResponseTemplate::new(422);
            }
            post_resources
                .write()
                .insert((req.url.path().to_string(), name), body.clone());
            ResponseTemplate::new(201).set_body_json(body)
        })
        .mount(server)
        .await;

    let delete_resources = Arc::clone(resources);
    Mock::given(method("DELETE"))
        .and(path_regex(r"^/api(s)?/.*"))
        .respond_with(move |req: &Request| {
            let (api_path, name) = split_resource_path(req.url.path());
            match delete_resources.write().remove(&(api_path, name)) {
                Some(removed) => ResponseTemplate::new(200).set_body_json(removed),
                None => not_found(),
            }
        })
        .mount(server)
        .await;

    let get_resources = Arc::clone(resources);
    Mock::given(method("GET"))
        .and(path_regex(r"^/api(s)?/.*"))
        .respond_with(move |req: &Request| {
            let path_str = req.url.path();
            let resources = get_resources.read();

            let (api_path, name) = split_resource_path(path_str);
            if !name.is_empty()
                && let Some(resource) = resources.get(&(api_path, name.clone()))
            {
                return ResponseTemplate::new(200).set_body_json(resource.clone());
            }

            // Namespaced list under the exact collection path.
            let items: Vec<Value> = resources
                .iter()
                .filter(|((stored_path, _), _)| stored_path == path_str)
                .map(|(_, v)| v.clone())
                .collect();
            if !items.is_empty() {
                return list_response(items);
            }

            // Cluster-wide list spanning all namespaces.
            let items: Vec<Value> = resources
                .iter()
                .filter(|((stored_path, _), _)| {
                    cluster_wide_path(stored_path).as_deref() == Some(path_str)
                })
                .map(|(_, v)| v.clone())
                .collect();
            if !items.is_empty() {
                return list_response(items);
            }

            if !name.is_empty() {
                return not_found();
            }
            list_response(Vec::new())
        })
        .mount(server)
        .await;
}

fn list_response(items: Vec<Value>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "kind": "List",
        "apiVersion": "v1",
        "metadata": {"resourceVersion": "1"},
        "items": items
    }))
}

/// Split `/api/v1/namespaces/default/pods/web` into the collection path
/// and the trailing object name.
fn split_resource_path(path: &str) -> (String, String) {
    let path = path.trim_end_matches('/');
    match path.rfind('/') {
        Some(idx) => (path[..idx].to_string(), path[idx + 1..].to_string()),
        None => (path.to_string(), String::new()),
    }
}

/// Rewrite `/api/v1/namespaces/<ns>/pods` as `/api/v1/pods`.
fn cluster_wide_path(path: &str) -> Option<String> {
    let idx = path.find("/namespaces/")?;
    let after = &path[idx + "/namespaces/".len()..];
    let slash = after.find('/')?;
    Some(format!("{}{}", &path[..idx], &after[slash..]))
}

/// Recursive merge-patch: objects merge key-wise, null deletes, anything
/// else replaces.
fn merge_json(base: Value, patch: Value) -> Value {
    match (base, patch) {
        (Value::Object(mut base_map), Value::Object(patch_map)) => {
            for (key, value) in patch_map {
                if value.is_null() {
                    base_map.remove(&key);
                } else {
                    let entry = base_map.remove(&key).unwrap_or(Value::Null);
                    base_map.insert(key, merge_json(entry, value));
                }
            }
            Value::Object(base_map)
        }
        (_, patch) => patch,
    }
}
