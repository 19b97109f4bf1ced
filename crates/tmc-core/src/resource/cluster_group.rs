// ── Cluster group lifecycle ──
//
// Unscoped and synchronous: every call returns the final object, so no
// polling is involved.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tmc_api::{Endpoint, Transport};
use tracing::info;

use super::{meta_table, with_reauth};
use crate::classify::classify_by_status;
use crate::error::CoreError;
use crate::mapping::{BlockMap, fill_config_tree, fill_domain_object};
use crate::model::ClusterGroup;
use crate::path;
use crate::tree::Block;

const COLLECTION: &str = "v1alpha1/clustergroups";

static TABLE: LazyLock<BlockMap> = LazyLock::new(|| {
    BlockMap::new()
        .field("name", path!(fullName.name))
        .block("meta", meta_table())
});

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Request<'a> {
    cluster_group: &'a ClusterGroup,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Response {
    cluster_group: ClusterGroup,
}

fn identity(tree: &Block) -> String {
    let name = tree.get("name").and_then(Value::as_str).unwrap_or("<unnamed>");
    format!("cluster_group/{name}")
}

fn name_of(group: &ClusterGroup) -> Result<&str, CoreError> {
    group.name().ok_or_else(|| CoreError::Validation {
        message: "cluster group requires a non-empty name".into(),
    })
}

fn item(name: &str) -> Endpoint {
    Endpoint::new(COLLECTION).segment(name)
}

/// Build the request object for `tree`.
pub fn expand(tree: &Block) -> Result<ClusterGroup, CoreError> {
    let group: ClusterGroup = fill_domain_object(tree, &TABLE)?;
    name_of(&group)?;
    Ok(group)
}

pub fn flatten(group: &ClusterGroup) -> Result<Block, CoreError> {
    Ok(fill_config_tree(group, &TABLE)?)
}

pub async fn create<T: Transport>(transport: &T, tree: &Block) -> Result<Block, CoreError> {
    let resource = identity(tree);
    let result: Result<Block, CoreError> = async {
        let group = expand(tree)?;
        info!(resource = %resource, "creating cluster group");

        let endpoint = Endpoint::new(COLLECTION);
        let body = Request {
            cluster_group: &group,
        };
        let created = with_reauth(transport, || {
            transport.create::<_, Response>(&endpoint, &body)
        })
        .await?;
        flatten(&created.cluster_group)
    }
    .await;
    result.map_err(|e| e.in_resource("create", &resource))
}

/// Current remote state, or `None` when the group no longer exists.
pub async fn read<T: Transport>(transport: &T, tree: &Block) -> Result<Option<Block>, CoreError> {
    let resource = identity(tree);
    let result: Result<Option<Block>, CoreError> = async {
        let group = expand(tree)?;
        let endpoint = item(name_of(&group)?);

        match with_reauth(transport, || transport.read::<Response>(&endpoint)).await {
            Ok(found) => Ok(Some(flatten(&found.cluster_group)?)),
            Err(err) if classify_by_status(&err).is_not_found() => {
                info!(resource = %resource, "cluster group is gone, clearing state");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
    .await;
    result.map_err(|e| e.in_resource("read", &resource))
}

pub async fn update<T: Transport>(transport: &T, tree: &Block) -> Result<Block, CoreError> {
    let resource = identity(tree);
    let result: Result<Block, CoreError> = async {
        let group = expand(tree)?;
        info!(resource = %resource, "updating cluster group");

        let endpoint = item(name_of(&group)?);
        let body = Request {
            cluster_group: &group,
        };
        let updated = with_reauth(transport, || {
            transport.update::<_, Response>(&endpoint, &body)
        })
        .await?;
        flatten(&updated.cluster_group)
    }
    .await;
    result.map_err(|e| e.in_resource("update", &resource))
}

/// Delete the group. A group that is already gone counts as deleted.
pub async fn delete<T: Transport>(transport: &T, tree: &Block) -> Result<(), CoreError> {
    let resource = identity(tree);
    let result: Result<(), CoreError> = async {
        let group = expand(tree)?;
        let endpoint = item(name_of(&group)?);
        info!(resource = %resource, "deleting cluster group");

        match with_reauth(transport, || transport.delete(&endpoint)).await {
            Err(err) if classify_by_status(&err).is_not_found() => {
                info!(resource = %resource, "cluster group already gone");
                Ok(())
            }
            other => other.map_err(CoreError::from),
        }
    }
    .await;
    result.map_err(|e| e.in_resource("delete", &resource))
}
