// ── Scope resolver ──
//
// Scoped resources declare where they attach through a single `scope`
// block holding exactly one of several mutually exclusive child blocks.
// In memory that choice is a sum type; the tree keeps the list-of-blocks
// shape the configuration tool expects.

use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr, VariantNames};
use thiserror::Error;

use crate::mapping::{BlockMap, MappingError, fill_config_tree, fill_domain_object};
use crate::path;
use crate::tree::{Block, single_block};

/// Tree key of the scope block.
pub const SCOPE_KEY: &str = "scope";

/// The mutually exclusive scope shapes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
    VariantNames,
)]
#[strum(serialize_all = "snake_case")]
pub enum ScopeKind {
    Cluster,
    ClusterGroup,
    Workspace,
}

impl ScopeKind {
    pub const ALLOWED_VALUES: &'static [&'static str] = <Self as VariantNames>::VARIANTS;

    /// Tree key of this scope's child block.
    pub fn key(self) -> &'static str {
        self.into()
    }

    fn table(self) -> &'static BlockMap {
        match self {
            Self::Cluster => &CLUSTER_TABLE,
            Self::ClusterGroup | Self::Workspace => &NAME_ONLY_TABLE,
        }
    }
}

// ── Identity payloads ───────────────────────────────────────────────

/// Identity of a cluster attached to the control plane.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterFullName {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub management_cluster_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub provisioner_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterGroupFullName {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkspaceFullName {
    #[serde(default)]
    pub name: String,
}

static CLUSTER_TABLE: LazyLock<BlockMap> = LazyLock::new(|| {
    BlockMap::new()
        .field("name", path!(name))
        .field("management_cluster_name", path!(managementClusterName))
        .field("provisioner_name", path!(provisionerName))
});

static NAME_ONLY_TABLE: LazyLock<BlockMap> =
    LazyLock::new(|| BlockMap::new().field("name", path!(name)));

/// Which scope a resource instance is attached to, with that scope's identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScopedIdentity {
    Cluster(ClusterFullName),
    ClusterGroup(ClusterGroupFullName),
    Workspace(WorkspaceFullName),
}

impl ScopedIdentity {
    pub fn kind(&self) -> ScopeKind {
        match self {
            Self::Cluster(_) => ScopeKind::Cluster,
            Self::ClusterGroup(_) => ScopeKind::ClusterGroup,
            Self::Workspace(_) => ScopeKind::Workspace,
        }
    }

    /// Name of the scope target (cluster, group, or workspace name).
    pub fn name(&self) -> &str {
        match self {
            Self::Cluster(full) => &full.name,
            Self::ClusterGroup(full) => &full.name,
            Self::Workspace(full) => &full.name,
        }
    }

    fn payload(&self) -> Result<Block, MappingError> {
        let table = self.kind().table();
        match self {
            Self::Cluster(full) => fill_config_tree(full, table),
            Self::ClusterGroup(full) => fill_config_tree(full, table),
            Self::Workspace(full) => fill_config_tree(full, table),
        }
    }
}

impl fmt::Display for ScopedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cluster(full) => {
                write!(f, "cluster/{}", full.name)?;
                if !full.management_cluster_name.is_empty() {
                    write!(f, " (management cluster {}", full.management_cluster_name)?;
                    if !full.provisioner_name.is_empty() {
                        write!(f, ", provisioner {}", full.provisioner_name)?;
                    }
                    f.write_str(")")?;
                }
                Ok(())
            }
            Self::ClusterGroup(full) => write!(f, "cluster_group/{}", full.name),
            Self::Workspace(full) => write!(f, "workspace/{}", full.name),
        }
    }
}

// ── Errors ──────────────────────────────────────────────────────────

fn join_kinds(kinds: &[ScopeKind]) -> String {
    kinds
        .iter()
        .map(|kind| kind.key())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The tree's scope block does not name exactly one supported scope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("no valid scope block found; one of [{}] is required", join_kinds(.allowed))]
    Missing { allowed: Vec<ScopeKind> },

    #[error(
        "more than one scope block found ({}); exactly one of [{}] is required",
        join_kinds(.found),
        join_kinds(.allowed)
    )]
    Multiple {
        allowed: Vec<ScopeKind>,
        found: Vec<ScopeKind>,
    },

    #[error("scope block '{kind}' requires a non-empty name")]
    MissingName { kind: ScopeKind },

    #[error(transparent)]
    Mapping(#[from] MappingError),
}

// ── Resolve / flatten ───────────────────────────────────────────────

fn is_populated(block: &Block) -> bool {
    block.values().any(|value| match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    })
}

/// Extract the scoped identity from `tree`, accepting only `allowed` kinds.
///
/// Every known scope kind is counted, not just the allowed ones, so a tree
/// naming a supported and an unsupported scope is rejected as ambiguous.
pub fn resolve_scope(tree: &Block, allowed: &[ScopeKind]) -> Result<ScopedIdentity, ScopeError> {
    let scope = match tree.get(SCOPE_KEY) {
        Some(value) => single_block(SCOPE_KEY, value)?,
        None => None,
    };
    let Some(scope) = scope else {
        return Err(ScopeError::Missing {
            allowed: allowed.to_vec(),
        });
    };

    let mut present = Vec::new();
    for kind in ScopeKind::iter() {
        let Some(value) = scope.get(kind.key()) else {
            continue;
        };
        if let Some(block) = single_block(kind.key(), value)? {
            if is_populated(block) {
                present.push((kind, block));
            }
        }
    }

    match present.as_slice() {
        [] => Err(ScopeError::Missing {
            allowed: allowed.to_vec(),
        }),
        [(kind, block)] if allowed.contains(kind) => build_identity(*kind, block),
        [_] => Err(ScopeError::Missing {
            allowed: allowed.to_vec(),
        }),
        many => Err(ScopeError::Multiple {
            allowed: allowed.to_vec(),
            found: many.iter().map(|(kind, _)| *kind).collect(),
        }),
    }
}

fn build_identity(kind: ScopeKind, block: &Block) -> Result<ScopedIdentity, ScopeError> {
    let table = kind.table();
    let identity = match kind {
        ScopeKind::Cluster => ScopedIdentity::Cluster(fill_domain_object(block, table)?),
        ScopeKind::ClusterGroup => ScopedIdentity::ClusterGroup(fill_domain_object(block, table)?),
        ScopeKind::Workspace => ScopedIdentity::Workspace(fill_domain_object(block, table)?),
    };
    if identity.name().is_empty() {
        return Err(ScopeError::MissingName { kind });
    }
    Ok(identity)
}

/// Rebuild the `scope` tree fragment for `identity`.
///
/// The result holds only the populated scope kind:
/// `{ "scope": [ { "<kind>": [ { ... } ] } ] }`.
pub fn flatten_scope(identity: &ScopedIdentity) -> Result<Block, ScopeError> {
    let mut choice = Block::new();
    choice.insert(
        identity.kind().key().to_owned(),
        Value::Array(vec![Value::Object(identity.payload()?)]),
    );

    let mut fragment = Block::new();
    fragment.insert(
        SCOPE_KEY.to_owned(),
        Value::Array(vec![Value::Object(choice)]),
    );
    Ok(fragment)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    const CLUSTER_OR_GROUP: &[ScopeKind] = &[ScopeKind::Cluster, ScopeKind::ClusterGroup];

    fn tree(value: Value) -> Block {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn resolves_cluster_scope_and_flattens_back() {
        let input = tree(json!({ "scope": [{ "cluster": [{ "name": "c1" }] }] }));

        let identity = resolve_scope(&input, CLUSTER_OR_GROUP).unwrap();
        assert_eq!(identity.kind(), ScopeKind::Cluster);
        assert_eq!(identity.name(), "c1");

        assert_eq!(flatten_scope(&identity).unwrap(), input);
    }

    #[test]
    fn resolves_full_cluster_identity() {
        let input = tree(json!({
            "scope": [{
                "cluster": [{
                    "name": "c1",
                    "management_cluster_name": "attached",
                    "provisioner_name": "attached"
                }],
                "cluster_group": []
            }]
        }));

        let identity = resolve_scope(&input, CLUSTER_OR_GROUP).unwrap();
        assert_eq!(
            identity,
            ScopedIdentity::Cluster(ClusterFullName {
                name: "c1".into(),
                management_cluster_name: "attached".into(),
                provisioner_name: "attached".into(),
            })
        );
        assert_eq!(
            identity.to_string(),
            "cluster/c1 (management cluster attached, provisioner attached)"
        );
    }

    #[test]
    fn resolves_cluster_group_scope() {
        let input = tree(json!({ "scope": { "cluster_group": { "name": "g1" } } }));
        let identity = resolve_scope(&input, CLUSTER_OR_GROUP).unwrap();
        assert_eq!(
            identity,
            ScopedIdentity::ClusterGroup(ClusterGroupFullName { name: "g1".into() })
        );
    }

    #[test]
    fn two_populated_scopes_are_rejected() {
        let input = tree(json!({
            "scope": [{
                "cluster": [{ "name": "c1" }],
                "cluster_group": [{ "name": "g1" }]
            }]
        }));
        let err = resolve_scope(&input, CLUSTER_OR_GROUP).unwrap_err();
        assert!(matches!(err, ScopeError::Multiple { .. }));
        assert!(err.to_string().starts_with("more than one scope block found"));
    }

    #[test]
    fn unsupported_scope_counts_toward_exclusivity() {
        let input = tree(json!({
            "scope": [{
                "cluster": [{ "name": "c1" }],
                "workspace": [{ "name": "w1" }]
            }]
        }));
        assert!(matches!(
            resolve_scope(&input, CLUSTER_OR_GROUP),
            Err(ScopeError::Multiple { .. })
        ));
    }

    #[test]
    fn missing_or_empty_scope_is_rejected() {
        for input in [
            json!({}),
            json!({ "scope": [] }),
            json!({ "scope": [{}] }),
            json!({ "scope": [{ "cluster": [], "cluster_group": [{}] }] }),
            json!({ "scope": [{ "cluster": [{ "name": "" }] }] }),
        ] {
            let err = resolve_scope(&tree(input.clone()), CLUSTER_OR_GROUP).unwrap_err();
            assert!(matches!(err, ScopeError::Missing { .. }), "{input}: {err:?}");
        }
    }

    #[test]
    fn single_unsupported_scope_is_rejected() {
        let input = tree(json!({ "scope": [{ "workspace": [{ "name": "w1" }] }] }));
        let err = resolve_scope(&input, CLUSTER_OR_GROUP).unwrap_err();
        assert_eq!(
            err.to_string(),
            "no valid scope block found; one of [cluster, cluster_group] is required"
        );
    }

    #[test]
    fn scope_without_name_is_rejected() {
        let input = tree(json!({
            "scope": [{ "cluster": [{ "management_cluster_name": "attached" }] }]
        }));
        assert_eq!(
            resolve_scope(&input, CLUSTER_OR_GROUP),
            Err(ScopeError::MissingName {
                kind: ScopeKind::Cluster
            })
        );
    }

    #[test]
    fn malformed_scope_is_a_mapping_error() {
        let input = tree(json!({ "scope": [{ "cluster": [{ "name": 42 }] }] }));
        assert!(matches!(
            resolve_scope(&input, CLUSTER_OR_GROUP),
            Err(ScopeError::Mapping(MappingError::SchemaMismatch { .. }))
        ));
    }

    #[test]
    fn allowed_values_are_compile_time() {
        assert_eq!(
            ScopeKind::ALLOWED_VALUES,
            &["cluster", "cluster_group", "workspace"]
        );
    }
}
