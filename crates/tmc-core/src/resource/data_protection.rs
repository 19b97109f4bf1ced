// ── Data protection lifecycle ──
//
// Scoped to a cluster or a cluster group. The control plane accepts
// create and delete immediately but installs or removes the backup
// tooling in the background, so both operations poll until the reported
// state settles.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use tmc_api::{Endpoint, Transport};
use tracing::{debug, info};

use super::{merge, meta_table, with_reauth};
use crate::classify::classify_by_status;
use crate::error::CoreError;
use crate::mapping::{BlockMap, fill_config_tree, fill_domain_object};
use crate::model::{DataProtection, DataProtectionFullName, DataProtectionPhase};
use crate::path;
use crate::poll::{PollSettings, Probe};
use crate::scope::{ScopeKind, ScopedIdentity, flatten_scope, resolve_scope};
use crate::tree::Block;

/// Scopes a data protection object may attach to.
pub const ALLOWED_SCOPES: &[ScopeKind] = &[ScopeKind::Cluster, ScopeKind::ClusterGroup];

static TABLE: LazyLock<BlockMap> = LazyLock::new(|| {
    BlockMap::new()
        .block("meta", meta_table())
        .block(
            "spec",
            BlockMap::new()
                .field("enable_csi_snapshots", path!(spec.enableCsiSnapshots))
                .field("disable_restic", path!(spec.disableRestic))
                .field(
                    "enable_all_api_group_versions_backup",
                    path!(spec.enableAllApiGroupVersionsBackup),
                )
                .field("backup_location_names", path!(spec.backupLocationNames))
                .repeated(
                    "selector",
                    BlockMap::new()
                        .field("key", path!(spec.selector.matchExpressions.[].key))
                        .field("operator", path!(spec.selector.matchExpressions.[].operator))
                        .field("values", path!(spec.selector.matchExpressions.[].values)),
                ),
        )
        .field("phase", path!(status.phase))
        .field("phase_info", path!(status.phaseInfo))
});

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Request<'a> {
    data_protection: &'a DataProtection,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Response {
    data_protection: DataProtection,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    data_protections: Vec<DataProtection>,
}

fn resource_label(identity: &ScopedIdentity) -> String {
    format!("data_protection on {identity}")
}

/// Path of the data protection collection under the scope target.
fn collection(identity: &ScopedIdentity) -> Result<Endpoint, CoreError> {
    match identity {
        ScopedIdentity::Cluster(full) => Ok(Endpoint::new("v1alpha1/clusters")
            .segment(&full.name)
            .segment("dataprotection")),
        ScopedIdentity::ClusterGroup(full) => Ok(Endpoint::new("v1alpha1/clustergroups")
            .segment(&full.name)
            .segment("dataprotection")),
        ScopedIdentity::Workspace(_) => Err(CoreError::Validation {
            message: "data protection cannot be scoped to a workspace".into(),
        }),
    }
}

/// Collection path plus the query that pins a cluster's full name.
fn addressed(identity: &ScopedIdentity) -> Result<Endpoint, CoreError> {
    let endpoint = collection(identity)?;
    Ok(match identity {
        ScopedIdentity::Cluster(full) => endpoint
            .query_opt(
                "fullName.managementClusterName",
                Some(full.management_cluster_name.as_str()),
            )
            .query_opt(
                "fullName.provisionerName",
                Some(full.provisioner_name.as_str()),
            ),
        _ => endpoint,
    })
}

fn expand_scoped(tree: &Block) -> Result<(ScopedIdentity, DataProtection), CoreError> {
    let identity = resolve_scope(tree, ALLOWED_SCOPES)?;
    let mut object: DataProtection = fill_domain_object(tree, &TABLE)?;
    // phase and phase_info are reported by the remote, never sent.
    object.status = None;
    object.full_name = Some(DataProtectionFullName::from_scope(&identity)?);
    Ok((identity, object))
}

/// Build the request object for `tree`, including its scoped full name.
pub fn expand(tree: &Block) -> Result<DataProtection, CoreError> {
    expand_scoped(tree).map(|(_, object)| object)
}

/// Flatten a data protection object, deriving `scope` from its full name.
pub fn flatten(object: &DataProtection) -> Result<Block, CoreError> {
    let identity = object
        .full_name
        .as_ref()
        .ok_or_else(|| CoreError::Validation {
            message: "data protection object has no full name".into(),
        })?
        .scope()?;

    let mut tree = flatten_scope(&identity)?;
    merge(&mut tree, fill_config_tree(object, &TABLE)?);
    Ok(tree)
}

/// The data protection object under `endpoint`, if the list is non-empty.
async fn fetch<T: Transport>(
    transport: &T,
    endpoint: &Endpoint,
) -> Result<Option<DataProtection>, tmc_api::Error> {
    let list = with_reauth(transport, || transport.read::<ListResponse>(endpoint)).await?;
    Ok(list.data_protections.into_iter().next())
}

fn remote_failed(resource: &str, object: &DataProtection) -> CoreError {
    CoreError::RemoteFailed {
        resource: resource.to_owned(),
        phase: DataProtectionPhase::Error.to_string(),
        message: object.phase_info().unwrap_or("no details reported").to_owned(),
    }
}

/// Retry while the remote is unreachable or has not caught up yet.
fn retry_or_fail(err: tmc_api::Error) -> Probe<CoreError> {
    if err.is_transient() || classify_by_status(&err).is_not_found() {
        Probe::Retry(Some(err.into()))
    } else {
        Probe::Fatal(err.into())
    }
}

async fn probe_ready<T: Transport>(
    transport: &T,
    endpoint: &Endpoint,
    resource: &str,
) -> Probe<CoreError> {
    match fetch(transport, endpoint).await {
        Ok(Some(object)) => match object.phase() {
            Some(DataProtectionPhase::Ready) => Probe::Done,
            Some(DataProtectionPhase::Error) => Probe::Fatal(remote_failed(resource, &object)),
            phase => {
                debug!(resource, ?phase, "data protection not ready");
                Probe::Retry(None)
            }
        },
        Ok(None) => Probe::Retry(None),
        Err(err) => retry_or_fail(err),
    }
}

async fn probe_gone<T: Transport>(
    transport: &T,
    endpoint: &Endpoint,
    resource: &str,
) -> Probe<CoreError> {
    match fetch(transport, endpoint).await {
        Ok(None) => Probe::Done,
        Err(err) if classify_by_status(&err).is_not_found() => Probe::Done,
        Ok(Some(object)) if object.phase() == Some(DataProtectionPhase::Error) => {
            Probe::Fatal(remote_failed(resource, &object))
        }
        Ok(Some(object)) => {
            debug!(resource, phase = ?object.phase(), "data protection still present");
            Probe::Retry(None)
        }
        Err(err) => retry_or_fail(err),
    }
}

/// Create and wait until the remote reports `READY`.
pub async fn create<T: Transport>(
    transport: &T,
    tree: &Block,
    poll: &PollSettings,
) -> Result<Block, CoreError> {
    let (identity, object) =
        expand_scoped(tree).map_err(|e| e.in_resource("create", "data_protection"))?;
    let resource = resource_label(&identity);

    let result: Result<Block, CoreError> = async {
        let target = collection(&identity)?;
        let lookup = addressed(&identity)?;
        info!(resource = %resource, "creating data protection");

        let body = Request {
            data_protection: &object,
        };
        with_reauth(transport, || transport.create::<_, Response>(&target, &body)).await?;

        info!(resource = %resource, "waiting for data protection to become ready");
        poll.poll(|| probe_ready(transport, &lookup, &resource)).await?;

        let current = fetch(transport, &lookup)
            .await?
            .ok_or_else(|| CoreError::Gone {
                resource: resource.clone(),
            })?;
        finish(&identity, current)
    }
    .await;
    result.map_err(|e| e.in_resource("create", &resource))
}

/// Current remote state, or `None` when nothing is enabled on the scope.
pub async fn read<T: Transport>(transport: &T, tree: &Block) -> Result<Option<Block>, CoreError> {
    let (identity, _) =
        expand_scoped(tree).map_err(|e| e.in_resource("read", "data_protection"))?;
    let resource = resource_label(&identity);

    let result: Result<Option<Block>, CoreError> = async {
        let lookup = addressed(&identity)?;
        match fetch(transport, &lookup).await {
            Ok(Some(current)) => Ok(Some(finish(&identity, current)?)),
            Ok(None) => {
                info!(resource = %resource, "data protection is gone, clearing state");
                Ok(None)
            }
            Err(err) if classify_by_status(&err).is_not_found() => {
                info!(resource = %resource, "data protection is gone, clearing state");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
    .await;
    result.map_err(|e| e.in_resource("read", &resource))
}

pub async fn update<T: Transport>(transport: &T, tree: &Block) -> Result<Block, CoreError> {
    let (identity, object) =
        expand_scoped(tree).map_err(|e| e.in_resource("update", "data_protection"))?;
    let resource = resource_label(&identity);

    let result: Result<Block, CoreError> = async {
        let target = collection(&identity)?;
        info!(resource = %resource, "updating data protection");

        let body = Request {
            data_protection: &object,
        };
        let updated =
            with_reauth(transport, || transport.update::<_, Response>(&target, &body)).await?;
        finish(&identity, updated.data_protection)
    }
    .await;
    result.map_err(|e| e.in_resource("update", &resource))
}

/// Delete and wait until the remote no longer reports the object.
/// An object that is already gone counts as deleted.
pub async fn delete<T: Transport>(
    transport: &T,
    tree: &Block,
    poll: &PollSettings,
) -> Result<(), CoreError> {
    let (identity, _) =
        expand_scoped(tree).map_err(|e| e.in_resource("delete", "data_protection"))?;
    let resource = resource_label(&identity);

    let result: Result<(), CoreError> = async {
        let lookup = addressed(&identity)?;
        info!(resource = %resource, "deleting data protection");

        match with_reauth(transport, || transport.delete(&lookup)).await {
            Err(err) if classify_by_status(&err).is_not_found() => {
                info!(resource = %resource, "data protection already gone");
                return Ok(());
            }
            other => other?,
        }

        info!(resource = %resource, "waiting for data protection to be removed");
        poll.poll(|| probe_gone(transport, &lookup, &resource)).await?;
        Ok(())
    }
    .await;
    result.map_err(|e| e.in_resource("delete", &resource))
}

/// Flatten a remote object, falling back to the requested scope when the
/// response omits the full name.
fn finish(identity: &ScopedIdentity, mut object: DataProtection) -> Result<Block, CoreError> {
    if object.full_name.is_none() {
        object.full_name = Some(DataProtectionFullName::from_scope(identity)?);
    }
    flatten(&object)
}
