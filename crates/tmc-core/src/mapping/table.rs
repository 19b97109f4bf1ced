// ── Block mapping tables ──
//
// A `BlockMap` declares, per configuration-tree key, where that key lives in
// the domain object. Tables are built once (usually in a `LazyLock`) and
// drive both conversion directions.

use super::MappingError;
use super::path::Path;

/// What a single tree key maps to.
#[derive(Debug, Clone)]
pub enum Mapping {
    /// A scalar (or opaque list/map) value stored at the path.
    Field(Path),
    /// A singular nested block (tree list of length 0 or 1).
    Block(BlockMap),
    /// A repeated block: the template is matched index by index against the
    /// tree list and the domain object's collection.
    Repeated(BlockMap),
}

/// Ordered table from tree key to [`Mapping`].
#[derive(Debug, Clone, Default)]
pub struct BlockMap {
    entries: Vec<(&'static str, Mapping)>,
    anchor: Option<Path>,
}

impl BlockMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `key` to a leaf value at `path`.
    pub fn field(mut self, key: &'static str, path: Path) -> Self {
        self.entries.push((key, Mapping::Field(path)));
        self
    }

    /// Map `key` to a singular nested block.
    pub fn block(mut self, key: &'static str, nested: BlockMap) -> Self {
        self.entries.push((key, Mapping::Block(nested)));
        self
    }

    /// Map `key` to a repeated block described by `template`.
    pub fn repeated(mut self, key: &'static str, template: BlockMap) -> Self {
        self.entries.push((key, Mapping::Repeated(template)));
        self
    }

    /// Pin the object location this block corresponds to.
    ///
    /// Without an explicit anchor it is derived from the leaf paths: the
    /// common prefix of their parents. A repeated template's anchor names the
    /// element, e.g. `spec.rules.[]`.
    pub fn anchored(mut self, anchor: Path) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &Mapping)> {
        self.entries.iter().map(|(key, mapping)| (*key, mapping))
    }

    fn collect_leaves(&self, out: &mut Vec<Path>) {
        for (_, mapping) in &self.entries {
            match mapping {
                Mapping::Field(path) => out.push(*path),
                Mapping::Block(nested) | Mapping::Repeated(nested) => nested.collect_leaves(out),
            }
        }
    }

    fn leaf_parent_prefix(&self) -> Option<Path> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
            .iter()
            .map(Path::parent)
            .reduce(|a, b| a.common_prefix(&b))
    }

    /// Object location of a singular block nested `depth` repeated blocks deep.
    ///
    /// [`Path::ROOT`] means the block has no object of its own.
    pub(crate) fn block_anchor(&self, depth: usize) -> Path {
        if let Some(anchor) = self.anchor {
            return anchor;
        }
        let Some(prefix) = self.leaf_parent_prefix() else {
            return Path::ROOT;
        };
        match prefix.marker_position(depth) {
            Some(pos) => prefix.prefix(pos),
            None => prefix,
        }
    }

    /// Object location of one element of a repeated block, ending with the
    /// element marker bound at `depth`.
    pub(crate) fn element_anchor(&self, key: &str, depth: usize) -> Result<Path, MappingError> {
        if let Some(anchor) = self.anchor {
            return if anchor.ends_with_marker() && anchor.marker_count() == depth + 1 {
                Ok(anchor)
            } else {
                Err(MappingError::InvalidTable {
                    key: key.to_owned(),
                    reason: format!("anchor {anchor} must end with element marker #{}", depth + 1),
                })
            };
        }
        let prefix = self.leaf_parent_prefix().unwrap_or(Path::ROOT);
        match prefix.marker_position(depth) {
            Some(pos) => Ok(prefix.prefix(pos + 1)),
            None => Err(MappingError::InvalidTable {
                key: key.to_owned(),
                reason: format!("leaf paths share no element marker (common prefix {prefix})"),
            }),
        }
    }

    /// Check every leaf path and anchor in the table.
    ///
    /// Leaves must be non-root and carry exactly one element marker per
    /// enclosing repeated block.
    pub fn validate(&self) -> Result<(), MappingError> {
        self.validate_at(0)
    }

    fn validate_at(&self, depth: usize) -> Result<(), MappingError> {
        for (key, mapping) in &self.entries {
            match mapping {
                Mapping::Field(path) => {
                    if path.is_root() {
                        return Err(MappingError::InvalidTable {
                            key: (*key).to_owned(),
                            reason: "leaf path is empty".into(),
                        });
                    }
                    if path.marker_count() != depth {
                        return Err(MappingError::MarkerBinding {
                            path: path.to_string(),
                            markers: path.marker_count(),
                            bound: depth,
                        });
                    }
                }
                Mapping::Block(nested) => nested.validate_at(depth)?,
                Mapping::Repeated(template) => {
                    template.validate_at(depth + 1)?;
                    template.element_anchor(key, depth)?;
                }
            }
        }
        Ok(())
    }
}
