//! Typed convenience reads that do not go through the dynamic layer.

use chrono::SecondsFormat;
use k8s_openapi::api::core::v1::Event;
use k8s_openapi::api::networking::v1::Ingress;
use kube::Api;
use kube::api::ListParams;
use serde_json::{Value, json};

use crate::KubeClient;
use crate::error::Error;

impl KubeClient {
    /// List events in one namespace, or cluster-wide when none is given.
    pub async fn get_events(
        &self,
        namespace: Option<&str>,
        label_selector: Option<&str>,
    ) -> Result<Vec<Value>, Error> {
        let api: Api<Event> = match namespace.filter(|ns| !ns.is_empty()) {
            Some(ns) => Api::namespaced(self.client().clone(), ns),
            None => Api::all(self.client().clone()),
        };
        let mut params = ListParams::default();
        if let Some(selector) = label_selector.filter(|s| !s.is_empty()) {
            params = params.labels(selector);
        }
        let events = api.list(&params).await?;
        Ok(events.items.iter().map(project_event).collect())
    }

    /// List ingress routing entries, optionally filtered to rules whose
    /// host matches exactly.
    pub async fn get_ingresses(&self, host: Option<&str>) -> Result<Vec<Value>, Error> {
        let api: Api<Ingress> = Api::all(self.client().clone());
        let ingresses = api.list(&ListParams::default()).await?;
        Ok(ingresses
            .items
            .iter()
            .filter_map(|ingress| project_ingress(ingress, host))
            .collect())
    }
}

fn project_event(event: &Event) -> Value {
    let time = |t: &Option<k8s_openapi::apimachinery::pkg::apis::meta::v1::Time>| {
        t.as_ref()
            .map(|t| t.0.to_rfc3339_opts(SecondsFormat::Secs, true))
    };
    json!({
        "name": event.metadata.name,
        "namespace": event.metadata.namespace,
        "reason": event.reason,
        "message": event.message,
        "source": event.source.as_ref().and_then(|s| s.component.clone()),
        "type": event.type_,
        "count": event.count,
        "firstTime": time(&event.first_timestamp),
        "lastTime": time(&event.last_timestamp),
    })
}

/// Project one ingress to its matching paths and backend services.
/// Returns `None` when a host filter is set and no rule matches it.
fn project_ingress(ingress: &Ingress, host: Option<&str>) -> Option<Value> {
    let mut paths = Vec::new();
    let mut backend_services = Vec::new();
    let mut matched = false;

    let rules = ingress.spec.as_ref().and_then(|s| s.rules.as_ref());
    for rule in rules.into_iter().flatten() {
        if let Some(wanted) = host
            && rule.host.as_deref() != Some(wanted)
        {
            continue;
        }
        matched = true;
        let http_paths = rule.http.as_ref().map(|http| &http.paths);
        for path in http_paths.into_iter().flatten() {
            if let Some(p) = &path.path {
                paths.push(p.clone());
            }
            if let Some(service) = &path.backend.service {
                backend_services.push(service.name.clone());
            }
        }
    }

    matched.then(|| {
        json!({
            "name": ingress.metadata.name,
            "namespace": ingress.metadata.namespace,
            "paths": paths,
            "backendServices": backend_services,
        })
    })
}
