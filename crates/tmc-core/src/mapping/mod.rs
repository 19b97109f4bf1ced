// ── Schema ↔ struct mapping ──
//
// Path language, field accessor, block mapping tables, and the two
// converters built on them. Mapping tables are data, so the read direction
// and the write direction can never drift apart.

pub mod accessor;
pub mod convert;
pub mod path;
pub mod table;

use thiserror::Error;

pub use convert::{fill_config_tree, fill_domain_object};
pub use path::{Path, Segment};
pub use table::{BlockMap, Mapping};

/// Failure while converting between a configuration tree and a domain object.
///
/// Always fatal: a conversion either completes or produces nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// A location holds a value whose shape disagrees with the expected one.
    #[error("schema mismatch at {location}: {reason}")]
    SchemaMismatch { location: String, reason: String },

    /// A path's element markers do not line up with the enclosing repeated blocks.
    #[error("path {path} has {markers} element marker(s) but {bound} enclosing repeated block(s)")]
    MarkerBinding {
        path: String,
        markers: usize,
        bound: usize,
    },

    /// The mapping table itself is malformed.
    #[error("invalid mapping for '{key}': {reason}")]
    InvalidTable { key: String, reason: String },
}
