// ── Field accessor ──
//
// Reads and writes values inside a domain object's JSON shape by `Path`.
// Reads treat any absent intermediate as "no value"; writes allocate
// missing objects and grow missing array slots. A segment that meets a
// value of the wrong shape (a field step on a string, an element step on
// an object) is a schema mismatch.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::MappingError;
use super::path::{Path, Segment};

/// Short JSON type name used in mismatch messages.
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

fn mismatch(path: Path, indices: &[usize], expected: &str, found: &Value) -> MappingError {
    MappingError::SchemaMismatch {
        location: path.render(indices),
        reason: format!("expected {expected}, found {}", kind_of(found)),
    }
}

fn unbound(path: Path, indices: &[usize]) -> MappingError {
    MappingError::MarkerBinding {
        path: path.to_string(),
        markers: path.marker_count(),
        bound: indices.len(),
    }
}

/// Read the value at `path`, binding element markers to `indices` in order.
///
/// Returns `Ok(None)` when any step along the way is absent or null.
pub fn get<'a>(
    root: &'a Value,
    path: Path,
    indices: &[usize],
) -> Result<Option<&'a Value>, MappingError> {
    let mut cursor = root;
    let mut bound = indices.iter();

    for segment in path.segments() {
        if cursor.is_null() {
            return Ok(None);
        }
        cursor = match segment {
            Segment::Field(name) => match cursor {
                Value::Object(map) => match map.get(*name) {
                    Some(next) => next,
                    None => return Ok(None),
                },
                other => return Err(mismatch(path, indices, "object", other)),
            },
            Segment::Element => {
                let index = *bound.next().ok_or_else(|| unbound(path, indices))?;
                match cursor {
                    Value::Array(items) => match items.get(index) {
                        Some(next) => next,
                        None => return Ok(None),
                    },
                    other => return Err(mismatch(path, indices, "list", other)),
                }
            }
        };
    }

    Ok(if cursor.is_null() { None } else { Some(cursor) })
}

/// Walk to the slot at `path`, creating intermediates. The returned slot is
/// `Null` if nothing was stored there yet.
fn slot_mut<'a>(
    root: &'a mut Value,
    path: Path,
    indices: &[usize],
) -> Result<&'a mut Value, MappingError> {
    let mut cursor = root;
    let mut bound = indices.iter();

    for segment in path.segments() {
        cursor = match segment {
            Segment::Field(name) => {
                if cursor.is_null() {
                    *cursor = Value::Object(Map::new());
                }
                match cursor {
                    Value::Object(map) => map.entry(*name).or_insert(Value::Null),
                    other => return Err(mismatch(path, indices, "object", other)),
                }
            }
            Segment::Element => {
                let index = *bound.next().ok_or_else(|| unbound(path, indices))?;
                if cursor.is_null() {
                    *cursor = Value::Array(Vec::new());
                }
                match cursor {
                    Value::Array(items) => {
                        if items.len() <= index {
                            items.resize(index + 1, Value::Null);
                        }
                        &mut items[index]
                    }
                    other => return Err(mismatch(path, indices, "list", other)),
                }
            }
        };
    }

    Ok(cursor)
}

/// Write `value` at `path`, allocating any missing intermediate containers.
pub fn set(
    root: &mut Value,
    path: Path,
    indices: &[usize],
    value: Value,
) -> Result<(), MappingError> {
    *slot_mut(root, path, indices)? = value;
    Ok(())
}

/// Make sure an object exists at `path` without touching an existing one.
pub fn ensure_object(root: &mut Value, path: Path, indices: &[usize]) -> Result<(), MappingError> {
    let slot = slot_mut(root, path, indices)?;
    if slot.is_null() {
        *slot = Value::Object(Map::new());
    }
    if slot.is_object() {
        Ok(())
    } else {
        Err(mismatch(path, indices, "object", slot))
    }
}

// ── Typed helpers ────────────────────────────────────────────────────

fn to_value<T: Serialize>(object: &T) -> Result<Value, MappingError> {
    serde_json::to_value(object).map_err(|e| MappingError::SchemaMismatch {
        location: std::any::type_name::<T>().into(),
        reason: e.to_string(),
    })
}

/// Typed read: the value at `path` decoded as `V`, or `V::default()` when absent.
pub fn get_field<T, V>(object: &T, path: Path, indices: &[usize]) -> Result<V, MappingError>
where
    T: Serialize,
    V: DeserializeOwned + Default,
{
    let root = to_value(object)?;
    match get(&root, path, indices)? {
        Some(value) => {
            serde_json::from_value(value.clone()).map_err(|e| MappingError::SchemaMismatch {
                location: path.render(indices),
                reason: e.to_string(),
            })
        }
        None => Ok(V::default()),
    }
}

/// Typed write. On error `object` is left untouched.
pub fn set_field<T, V>(
    object: &mut T,
    path: Path,
    indices: &[usize],
    value: &V,
) -> Result<(), MappingError>
where
    T: Serialize + DeserializeOwned,
    V: Serialize,
{
    let mut root = to_value(&*object)?;
    set(&mut root, path, indices, to_value(value)?)?;
    *object = serde_json::from_value(root).map_err(|e| MappingError::SchemaMismatch {
        location: path.render(indices),
        reason: e.to_string(),
    })?;
    Ok(())
}
