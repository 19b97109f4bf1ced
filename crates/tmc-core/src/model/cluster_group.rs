// ── Cluster group ──

use serde::{Deserialize, Serialize};

use super::common::Meta;
use crate::scope::ClusterGroupFullName;

/// A named set of clusters that policies and data protection can target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<ClusterGroupFullName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl ClusterGroup {
    pub fn name(&self) -> Option<&str> {
        self.full_name
            .as_ref()
            .map(|full| full.name.as_str())
            .filter(|name| !name.is_empty())
    }
}
