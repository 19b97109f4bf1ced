// ── Tree ↔ object converters ──
//
// `fill_domain_object` expands a configuration tree into a fresh domain
// object; `fill_config_tree` flattens a domain object back into a tree.
// Both walk the same `BlockMap`, binding element markers to the index of
// each repeated block being visited.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::trace;

use super::accessor;
use super::table::{BlockMap, Mapping};
use super::MappingError;
use crate::tree::{Block, block_list, single_block};

/// Build a new domain object from `tree` as described by `table`.
///
/// Tree keys the table does not mention are ignored. Leaf values are
/// passed through unchanged; whether they fit the target field's type is
/// decided when the assembled object is decoded, so a string never turns
/// into a number implicitly.
pub fn fill_domain_object<T>(tree: &Block, table: &BlockMap) -> Result<T, MappingError>
where
    T: DeserializeOwned,
{
    table.validate()?;

    let mut object = Value::Object(Map::new());
    expand_block(tree, table, &mut object, &mut Vec::new())?;
    trace!(target_type = std::any::type_name::<T>(), "expanded configuration tree");

    serde_json::from_value(object).map_err(|e| MappingError::SchemaMismatch {
        location: std::any::type_name::<T>().into(),
        reason: e.to_string(),
    })
}

fn expand_block(
    tree: &Block,
    table: &BlockMap,
    object: &mut Value,
    indices: &mut Vec<usize>,
) -> Result<(), MappingError> {
    for (key, mapping) in table.entries() {
        let Some(value) = tree.get(key) else {
            continue;
        };

        match mapping {
            Mapping::Field(path) => {
                if !value.is_null() {
                    accessor::set(object, *path, indices, value.clone())?;
                }
            }
            Mapping::Block(nested) => {
                let Some(inner) = single_block(key, value)? else {
                    continue;
                };
                let anchor = nested.block_anchor(indices.len());
                if !anchor.is_root() {
                    accessor::ensure_object(object, anchor, indices)?;
                }
                expand_block(inner, nested, object, indices)?;
            }
            Mapping::Repeated(template) => {
                let elements = block_list(key, value)?;
                if elements.is_empty() {
                    continue;
                }
                let anchor = template.element_anchor(key, indices.len())?;
                for (i, element) in elements.into_iter().enumerate() {
                    indices.push(i);
                    let result = accessor::ensure_object(object, anchor, indices)
                        .and_then(|()| expand_block(element, template, object, indices));
                    indices.pop();
                    result?;
                }
            }
        }
    }
    Ok(())
}

/// Flatten `object` into a configuration tree as described by `table`.
///
/// Absent leaves are omitted. A singular block whose object is absent
/// becomes an empty list, never a list holding one empty block; a repeated
/// block yields one tree element per populated collection element.
pub fn fill_config_tree<T>(object: &T, table: &BlockMap) -> Result<Block, MappingError>
where
    T: Serialize,
{
    table.validate()?;

    let root = serde_json::to_value(object).map_err(|e| MappingError::SchemaMismatch {
        location: std::any::type_name::<T>().into(),
        reason: e.to_string(),
    })?;
    flatten_block(&root, table, &mut Vec::new())
}

fn flatten_block(
    root: &Value,
    table: &BlockMap,
    indices: &mut Vec<usize>,
) -> Result<Block, MappingError> {
    let mut out = Block::new();

    for (key, mapping) in table.entries() {
        match mapping {
            Mapping::Field(path) => {
                if let Some(value) = accessor::get(root, *path, indices)? {
                    out.insert(key.to_owned(), value.clone());
                }
            }
            Mapping::Block(nested) => {
                let anchor = nested.block_anchor(indices.len());
                let present = anchor.is_root() || accessor::get(root, anchor, indices)?.is_some();
                let list = if present {
                    vec![Value::Object(flatten_block(root, nested, indices)?)]
                } else {
                    Vec::new()
                };
                out.insert(key.to_owned(), Value::Array(list));
            }
            Mapping::Repeated(template) => {
                let anchor = template.element_anchor(key, indices.len())?;
                let collection = anchor.parent();
                let populated: Vec<usize> = match accessor::get(root, collection, indices)? {
                    None => Vec::new(),
                    Some(Value::Array(items)) => items
                        .iter()
                        .enumerate()
                        .filter(|(_, item)| !item.is_null())
                        .map(|(i, _)| i)
                        .collect(),
                    Some(other) => {
                        return Err(MappingError::SchemaMismatch {
                            location: collection.render(indices),
                            reason: format!("expected list, found {}", accessor::kind_of(other)),
                        });
                    }
                };

                let mut list = Vec::with_capacity(populated.len());
                for i in populated {
                    indices.push(i);
                    let element = flatten_block(root, template, indices);
                    indices.pop();
                    list.push(Value::Object(element?));
                }
                out.insert(key.to_owned(), Value::Array(list));
            }
        }
    }

    Ok(out)
}
