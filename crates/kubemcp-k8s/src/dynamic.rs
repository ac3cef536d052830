//! Generic resource operations over dynamic (untyped) API clients.
//!
//! Every operation here takes a bare kind name, resolves it through the
//! kind cache, and talks to the server with `Api<DynamicObject>` so that
//! built-in types and CRDs go through the same code path.

use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use k8s_openapi::api::core::v1::Namespace;
use kube::api::{
    Api, DeleteParams, DynamicObject, ListParams, ObjectMeta, Patch, PatchParams, PostParams,
};
use serde::Serialize;
use serde_json::Value;

use crate::KubeClient;
use crate::discovery::KindCoordinate;
use crate::error::{Error, is_not_found};

const RESTARTED_AT_ANNOTATION: &str = "kubectl.kubernetes.io/restartedAt";

/// How a create-or-update call landed on the server.
#[derive(Debug)]
pub enum ApplyOutcome {
    /// The object existed and was merge-patched.
    Patched(DynamicObject),
    /// The patch hit a 404 and the object was created instead.
    Created(DynamicObject),
}

impl ApplyOutcome {
    pub fn resource(&self) -> &DynamicObject {
        match self {
            ApplyOutcome::Patched(obj) | ApplyOutcome::Created(obj) => obj,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            ApplyOutcome::Patched(_) => "patched",
            ApplyOutcome::Created(_) => "created",
        }
    }
}

/// Compact row returned by list operations.
#[derive(Debug, Serialize)]
pub struct ResourceSummary {
    pub name: String,
    pub kind: String,
    pub namespace: Option<String>,
    pub labels: BTreeMap<String, String>,
}

impl KubeClient {
    /// Fetch a single resource as its full unstructured content.
    pub async fn get_resource(
        &self,
        kind: &str,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<Value, Error> {
        let coordinate = self.resolve_kind(kind).await?;
        let api = self.dynamic_api(&coordinate, namespace);
        let obj = api.get(name).await?;
        Ok(serde_json::to_value(&obj)?)
    }

    /// Same payload as [`KubeClient::get_resource`]; kept as a separate
    /// operation so the two tool surfaces can diverge later.
    pub async fn describe_resource(
        &self,
        kind: &str,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<Value, Error> {
        self.get_resource(kind, name, namespace).await
    }

    /// List instances of a kind, optionally filtered by namespace and
    /// label/field selectors.
    pub async fn list_resources(
        &self,
        kind: &str,
        namespace: Option<&str>,
        label_selector: Option<&str>,
        field_selector: Option<&str>,
    ) -> Result<Vec<ResourceSummary>, Error> {
        let coordinate = self.resolve_kind(kind).await?;
        let api = self.dynamic_api(&coordinate, namespace);

        let mut params = ListParams::default();
        if let Some(selector) = label_selector {
            params = params.labels(selector);
        }
        if let Some(selector) = field_selector {
            params = params.fields(selector);
        }

        let list = api.list(&params).await?;
        Ok(list
            .items
            .into_iter()
            .map(|item| summarize(item, &coordinate.resource.kind))
            .collect())
    }

    /// Create or update a resource from a JSON manifest.
    ///
    /// The target namespace always comes from the `namespace` argument
    /// (the manifest's own namespace is overwritten), and is created with
    /// its well-known name label if it does not exist yet. The manifest
    /// must carry `metadata.name`.
    pub async fn create_or_update_resource_json(
        &self,
        namespace: &str,
        manifest_json: &str,
        kind: Option<&str>,
    ) -> Result<ApplyOutcome, Error> {
        let mut manifest: Value = serde_json::from_str(manifest_json)
            .map_err(|err| Error::ManifestParse(err.to_string()))?;

        let kind = manifest_kind(&manifest, kind)?;
        let coordinate = self.resolve_kind(&kind).await?;

        self.ensure_namespace(namespace).await?;
        set_manifest_namespace(&mut manifest, namespace);

        self.apply(&coordinate, manifest).await
    }

    /// Create or update a resource from a YAML manifest.
    ///
    /// Unlike the JSON variant, the namespace argument is an optional
    /// override of the manifest's own namespace, and a missing namespace
    /// is not created.
    pub async fn create_or_update_resource_yaml(
        &self,
        namespace: Option<&str>,
        manifest_yaml: &str,
        kind: Option<&str>,
    ) -> Result<ApplyOutcome, Error> {
        let mut manifest: Value = serde_yaml::from_str(manifest_yaml)
            .map_err(|err| Error::ManifestParse(err.to_string()))?;

        let kind = manifest_kind(&manifest, kind)?;
        let coordinate = self.resolve_kind(&kind).await?;

        if let Some(namespace) = namespace {
            set_manifest_namespace(&mut manifest, namespace);
        }

        self.apply(&coordinate, manifest).await
    }

    /// Delete a resource by kind and name.
    pub async fn delete_resource(
        &self,
        kind: &str,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<(), Error> {
        let coordinate = self.resolve_kind(kind).await?;
        let api = self.dynamic_api(&coordinate, namespace);
        api.delete(name, &DeleteParams::default()).await?;
        Ok(())
    }

    /// Trigger a rolling restart by stamping the pod template's
    /// restartedAt annotation, the same way kubectl does.
    ///
    /// The check that the kind actually has a pod template runs on the
    /// patch result, after the server has accepted the patch.
    pub async fn rollout_restart(
        &self,
        kind: &str,
        name: &str,
        namespace: &str,
    ) -> Result<Value, Error> {
        let coordinate = self.resolve_kind(kind).await?;
        let api = self.dynamic_api(&coordinate, Some(namespace));

        let patch = restart_patch(&Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
        let result = api
            .patch(name, &PatchParams::default(), &Patch::Strategic(&patch))
            .await?;

        let content = serde_json::to_value(&result)?;
        if content.pointer("/spec/template").is_none() {
            return Err(Error::RolloutUnsupported {
                kind: kind.to_string(),
            });
        }
        Ok(content)
    }

    /// Merge-patch the object; on 404, create it instead.
    ///
    /// A namespaced create needs a concrete namespace, so a manifest
    /// without one targets `default` here.
    async fn apply(
        &self,
        coordinate: &KindCoordinate,
        manifest: Value,
    ) -> Result<ApplyOutcome, Error> {
        let name = manifest_name(&manifest)?.to_string();
        let namespace = manifest_namespace(&manifest).unwrap_or("default").to_string();
        let api = self.dynamic_api(coordinate, Some(&namespace));

        match api
            .patch(&name, &PatchParams::default(), &Patch::Merge(&manifest))
            .await
        {
            Ok(obj) => Ok(ApplyOutcome::Patched(obj)),
            Err(err) if is_not_found(&err) => {
                tracing::debug!(name = %name, kind = %coordinate.resource.kind,
                    "patch target missing, creating");
                let obj: DynamicObject = serde_json::from_value(manifest)
                    .map_err(|err| Error::ManifestParse(err.to_string()))?;
                let created = api.create(&PostParams::default(), &obj).await?;
                Ok(ApplyOutcome::Created(created))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Create the namespace if it does not exist.
    async fn ensure_namespace(&self, namespace: &str) -> Result<(), Error> {
        let api: Api<Namespace> = Api::all(self.client().clone());
        match api.get(namespace).await {
            Ok(_) => Ok(()),
            Err(err) if is_not_found(&err) => {
                tracing::info!(namespace, "namespace does not exist, creating it");
                let ns = Namespace {
                    metadata: ObjectMeta {
                        name: Some(namespace.to_string()),
                        labels: Some(BTreeMap::from([(
                            "kubernetes.io/metadata.name".to_string(),
                            namespace.to_string(),
                        )])),
                        ..Default::default()
                    },
                    ..Default::default()
                };
                api.create(&PostParams::default(), &ns).await?;
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Build a dynamic API handle scoped per the kind's discovery result.
    /// An absent or empty namespace means a cluster-scoped call even for
    /// namespaced kinds, so lists span all namespaces.
    pub(crate) fn dynamic_api(
        &self,
        coordinate: &KindCoordinate,
        namespace: Option<&str>,
    ) -> Api<DynamicObject> {
        match namespace.filter(|ns| !ns.is_empty()) {
            Some(ns) if coordinate.namespaced => {
                Api::namespaced_with(self.client().clone(), ns, &coordinate.resource)
            }
            _ => Api::all_with(self.client().clone(), &coordinate.resource),
        }
    }
}

fn summarize(item: DynamicObject, kind: &str) -> ResourceSummary {
    ResourceSummary {
        name: item.metadata.name.clone().unwrap_or_default(),
        kind: item
            .types
            .as_ref()
            .map(|t| t.kind.clone())
            .unwrap_or_else(|| kind.to_string()),
        namespace: item.metadata.namespace.clone(),
        labels: item.metadata.labels.clone().unwrap_or_default(),
    }
}

/// Kind precedence: explicit parameter first, then the manifest's own
/// `kind` field.
fn manifest_kind(manifest: &Value, explicit: Option<&str>) -> Result<String, Error> {
    if let Some(kind) = explicit.filter(|k| !k.is_empty()) {
        return Ok(kind.to_string());
    }
    manifest
        .get("kind")
        .and_then(Value::as_str)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .ok_or(Error::KindMissing)
}

fn manifest_name(manifest: &Value) -> Result<&str, Error> {
    manifest
        .pointer("/metadata/name")
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .ok_or(Error::NameMissing)
}

fn manifest_namespace(manifest: &Value) -> Option<&str> {
    manifest
        .pointer("/metadata/namespace")
        .and_then(Value::as_str)
        .filter(|ns| !ns.is_empty())
}

fn set_manifest_namespace(manifest: &mut Value, namespace: &str) {
    if !manifest.get("metadata").is_some_and(Value::is_object) {
        manifest["metadata"] = serde_json::json!({});
    }
    manifest["metadata"]["namespace"] = Value::String(namespace.to_string());
}

fn restart_patch(timestamp: &str) -> Value {
    serde_json::json!({
        "spec": {
            "template": {
                "metadata": {
                    "annotations": { RESTARTED_AT_ANNOTATION: timestamp }
                }
            }
        }
    })
}
