// ── Data protection ──
//
// Enables backup and restore (Velero) on a cluster or on every cluster of
// a cluster group. Creation and deletion are asynchronous on the control
// plane side; `status.phase` reports progress.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantNames};

use super::common::Meta;
use crate::error::CoreError;
use crate::scope::{ClusterFullName, ClusterGroupFullName, ScopedIdentity};

/// Identity of a data protection object; which fields are set depends on scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProtectionFullName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_cluster_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioner_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|s| !s.is_empty()).cloned()
}

impl DataProtectionFullName {
    pub fn from_scope(identity: &ScopedIdentity) -> Result<Self, CoreError> {
        match identity {
            ScopedIdentity::Cluster(full) => Ok(Self {
                cluster_name: Some(full.name.clone()),
                management_cluster_name: non_empty(Some(&full.management_cluster_name)),
                provisioner_name: non_empty(Some(&full.provisioner_name)),
                ..Self::default()
            }),
            ScopedIdentity::ClusterGroup(full) => Ok(Self {
                cluster_group_name: Some(full.name.clone()),
                ..Self::default()
            }),
            ScopedIdentity::Workspace(_) => Err(CoreError::Validation {
                message: "data protection cannot be scoped to a workspace".into(),
            }),
        }
    }

    /// The scope this name addresses. A cluster group name takes precedence.
    pub fn scope(&self) -> Result<ScopedIdentity, CoreError> {
        if let Some(name) = non_empty(self.cluster_group_name.as_ref()) {
            return Ok(ScopedIdentity::ClusterGroup(ClusterGroupFullName { name }));
        }
        if let Some(name) = non_empty(self.cluster_name.as_ref()) {
            return Ok(ScopedIdentity::Cluster(ClusterFullName {
                name,
                management_cluster_name: self.management_cluster_name.clone().unwrap_or_default(),
                provisioner_name: self.provisioner_name.clone().unwrap_or_default(),
            }));
        }
        Err(CoreError::Validation {
            message: "data protection full name names neither a cluster nor a cluster group"
                .into(),
        })
    }
}

/// Label selector operator (Kubernetes semantics).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    VariantNames,
)]
pub enum SelectorOperator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

impl SelectorOperator {
    pub const ALLOWED_VALUES: &'static [&'static str] = <Self as VariantNames>::VARIANTS;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSelectorRequirement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<SelectorOperator>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

/// Restricts which namespaces are backed up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_expressions: Vec<LabelSelectorRequirement>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProtectionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_csi_snapshots: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_restic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_all_api_group_versions_backup: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub backup_location_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<LabelSelector>,
}

/// Lifecycle phase reported by the control plane.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    VariantNames,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DataProtectionPhase {
    PhaseUnspecified,
    Pending,
    Creating,
    Ready,
    Error,
    Deleting,
    Updating,
}

impl DataProtectionPhase {
    pub const ALLOWED_VALUES: &'static [&'static str] = <Self as VariantNames>::VARIANTS;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProtectionStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<DataProtectionPhase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase_info: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProtection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<DataProtectionFullName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<DataProtectionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DataProtectionStatus>,
}

impl DataProtection {
    pub fn phase(&self) -> Option<DataProtectionPhase> {
        self.status.as_ref().and_then(|status| status.phase)
    }

    pub fn phase_info(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|status| status.phase_info.as_deref())
    }
}
