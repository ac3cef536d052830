//! Kind name to API coordinate resolution.
//!
//! Tools address resources by bare kind (`Pod`, `Deployment`, CRD kinds).
//! The API server addresses them by group, version and plural resource
//! name. This module walks server discovery to map one onto the other and
//! caches successful lookups for the lifetime of the process.

use std::collections::HashMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::APIResourceList;
use kube::Client;
use kube::core::ApiResource;
use parking_lot::RwLock;
use serde::Serialize;

use crate::KubeClient;
use crate::error::Error;

/// Everything needed to build a dynamic API client for one kind.
#[derive(Debug, Clone)]
pub struct KindCoordinate {
    pub resource: ApiResource,
    pub namespaced: bool,
}

/// Lazy kind lookup cache.
///
/// Reads take the lock briefly; a miss runs a full discovery walk outside
/// the lock and inserts the result. Only successful resolutions are
/// cached, so a kind that appears later (a CRD installed after startup)
/// is found on the next call. Entries are never invalidated.
#[derive(Default)]
pub struct KindCache {
    kinds: RwLock<HashMap<String, KindCoordinate>>,
}

impl KindCache {
    pub async fn resolve(&self, client: &Client, kind: &str) -> Result<KindCoordinate, Error> {
        if let Some(hit) = self.kinds.read().get(kind) {
            return Ok(hit.clone());
        }

        tracing::debug!(kind, "kind not cached, running discovery");
        let lists = server_preferred_resources(client).await?;
        let coordinate =
            find_kind(&lists, kind).ok_or_else(|| Error::KindNotFound(kind.to_string()))?;
        self.kinds
            .write()
            .insert(kind.to_string(), coordinate.clone());
        Ok(coordinate)
    }

    #[cfg(test)]
    fn cached(&self, kind: &str) -> Option<KindCoordinate> {
        self.kinds.read().get(kind).cloned()
    }
}

/// One entry in the `api_resources` listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResourceInfo {
    pub name: String,
    pub singular_name: String,
    pub namespaced: bool,
    pub kind: String,
    pub group: String,
    pub version: String,
    pub verbs: Vec<String>,
}

impl KubeClient {
    /// List the API resource types the cluster serves, optionally filtered
    /// by scope.
    pub async fn api_resources(
        &self,
        include_namespace_scoped: bool,
        include_cluster_scoped: bool,
    ) -> Result<Vec<ApiResourceInfo>, Error> {
        let lists = server_preferred_resources(self.client()).await?;
        Ok(collect_api_resources(
            &lists,
            include_namespace_scoped,
            include_cluster_scoped,
        ))
    }
}

/// Fetch the preferred resource list of every served API group.
///
/// A group whose resource listing fails is logged and skipped rather than
/// failing the whole walk; stale APIService registrations routinely make
/// individual groups undiscoverable on otherwise healthy clusters.
async fn server_preferred_resources(client: &Client) -> Result<Vec<APIResourceList>, Error> {
    let mut lists = Vec::new();

    let core = client.list_core_api_versions().await?;
    for version in &core.versions {
        match client.list_core_api_resources(version).await {
            Ok(list) => lists.push(list),
            Err(err) => {
                tracing::warn!(%version, error = %err, "skipping undiscoverable core API version")
            }
        }
    }

    let groups = client.list_api_groups().await?;
    for group in &groups.groups {
        let Some(gv) = group
            .preferred_version
            .as_ref()
            .or_else(|| group.versions.first())
        else {
            continue;
        };
        match client.list_api_group_resources(&gv.group_version).await {
            Ok(list) => lists.push(list),
            Err(err) => {
                tracing::warn!(group_version = %gv.group_version, error = %err,
                    "skipping undiscoverable API group")
            }
        }
    }

    Ok(lists)
}

/// Scan discovery output for the first resource whose kind matches.
///
/// Group lists are scanned in server order, so a kind served by several
/// groups resolves to the first one. Subresources (`pods/log`,
/// `deployments/scale`) carry their parent's kind and must be skipped.
fn find_kind(lists: &[APIResourceList], kind: &str) -> Option<KindCoordinate> {
    for list in lists {
        let (group, version) = split_group_version(&list.group_version);
        for resource in &list.resources {
            if resource.name.contains('/') {
                continue;
            }
            if resource.kind == kind {
                return Some(KindCoordinate {
                    resource: ApiResource {
                        group: group.to_string(),
                        version: version.to_string(),
                        api_version: list.group_version.clone(),
                        kind: resource.kind.clone(),
                        plural: resource.name.clone(),
                    },
                    namespaced: resource.namespaced,
                });
            }
        }
    }
    None
}

fn collect_api_resources(
    lists: &[APIResourceList],
    include_namespace_scoped: bool,
    include_cluster_scoped: bool,
) -> Vec<ApiResourceInfo> {
    let mut out = Vec::new();
    for list in lists {
        let (group, version) = split_group_version(&list.group_version);
        for resource in &list.resources {
            if (resource.namespaced && !include_namespace_scoped)
                || (!resource.namespaced && !include_cluster_scoped)
            {
                continue;
            }
            out.push(ApiResourceInfo {
                name: resource.name.clone(),
                singular_name: resource.singular_name.clone(),
                namespaced: resource.namespaced,
                kind: resource.kind.clone(),
                group: group.to_string(),
                version: version.to_string(),
                verbs: resource.verbs.clone(),
            });
        }
    }
    out
}

/// Split an apiVersion string. The legacy core group is written as a bare
/// version with an empty group name.
fn split_group_version(group_version: &str) -> (&str, &str) {
    match group_version.split_once('/') {
        Some((group, version)) => (group, version),
        None => ("", group_version),
    }
}
