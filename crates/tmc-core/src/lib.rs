// tmc-core: Configuration-tree mapping, scope resolution, and convergence
// polling shared by every resource of the provider.

pub mod classify;
pub mod error;
pub mod mapping;
pub mod model;
pub mod poll;
pub mod resource;
pub mod scope;
pub mod tree;

// ── Primary re-exports ──────────────────────────────────────────────
pub use classify::{ErrorKind, classify_by_status};
pub use error::CoreError;
pub use mapping::{
    BlockMap, Mapping, MappingError, Path, Segment, fill_config_tree, fill_domain_object,
};
pub use poll::{PollError, PollSettings, Probe, poll_until};
pub use resource::{Lifecycle, ResourceKind};
pub use scope::{
    ClusterFullName, ClusterGroupFullName, ScopeError, ScopeKind, ScopedIdentity,
    WorkspaceFullName, flatten_scope, resolve_scope,
};
pub use tree::Block;

// Transport types consumers need to build a client without depending on
// tmc-api directly.
pub use tmc_api::{
    ClientConfig, Credentials, Endpoint, Error as TransportError, TlsMode, TmcClient, Transport,
    TransportConfig,
};
