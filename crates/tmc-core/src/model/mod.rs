// ── Domain model ──
//
// Typed mirrors of the control plane resources, shaped exactly like the
// REST payloads (camelCase JSON). Every field is optional so a partially
// populated configuration tree can still produce a request object.

pub mod cluster_group;
pub mod common;
pub mod data_protection;

pub use cluster_group::ClusterGroup;
pub use common::Meta;
pub use data_protection::{
    DataProtection, DataProtectionFullName, DataProtectionPhase, DataProtectionSpec,
    DataProtectionStatus, LabelSelector, LabelSelectorRequirement, SelectorOperator,
};
