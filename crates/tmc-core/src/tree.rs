// ── Configuration tree ──
//
// The declarative tool hands each operation an ordered, dynamically typed
// tree. Nested blocks arrive as lists of maps; a singular block is a list of
// length 0 (absent) or 1 (present).

use serde_json::{Map, Value};

use crate::mapping::MappingError;
use crate::mapping::accessor::kind_of;

/// One node of the configuration tree.
pub type Block = Map<String, Value>;

/// Read a singular block stored under `key`.
///
/// Accepts a list of length 0 or 1, a bare map, or null. Anything else,
/// including a list with several elements, is a schema mismatch.
pub fn single_block<'a>(key: &str, value: &'a Value) -> Result<Option<&'a Block>, MappingError> {
    match value {
        Value::Null => Ok(None),
        Value::Object(block) => Ok(Some(block)),
        Value::Array(items) => match items.as_slice() {
            [] | [Value::Null] => Ok(None),
            [Value::Object(block)] => Ok(Some(block)),
            [other] => Err(MappingError::SchemaMismatch {
                location: key.to_owned(),
                reason: format!("expected block, found {}", kind_of(other)),
            }),
            many => Err(MappingError::SchemaMismatch {
                location: key.to_owned(),
                reason: format!("singular block has {} elements", many.len()),
            }),
        },
        other => Err(MappingError::SchemaMismatch {
            location: key.to_owned(),
            reason: format!("expected block list, found {}", kind_of(other)),
        }),
    }
}

/// Read a repeated block stored under `key`. Null counts as empty.
pub fn block_list<'a>(key: &str, value: &'a Value) -> Result<Vec<&'a Block>, MappingError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(block) => Ok(block),
                other => Err(MappingError::SchemaMismatch {
                    location: format!("{key}[{i}]"),
                    reason: format!("expected block, found {}", kind_of(other)),
                }),
            })
            .collect(),
        other => Err(MappingError::SchemaMismatch {
            location: key.to_owned(),
            reason: format!("expected block list, found {}", kind_of(other)),
        }),
    }
}
