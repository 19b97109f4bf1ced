// ── Resource lifecycle ──
//
// Glue between the configuration tree and the control plane. Each
// operation runs in a fixed order: resolve scope, expand the tree into a
// request object, call the transport (polling where the remote is
// asynchronous), then flatten the result back into a tree.

pub mod cluster_group;
pub mod data_protection;

use std::future::Future;

use strum::{Display, EnumString, VariantNames};
use tmc_api::Transport;
use tracing::warn;

use crate::classify::{ErrorKind, classify_by_status};
use crate::error::CoreError;
use crate::mapping::BlockMap;
use crate::path;
use crate::poll::PollSettings;
use crate::tree::Block;

/// Resources this provider manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, VariantNames)]
#[strum(serialize_all = "snake_case")]
pub enum ResourceKind {
    ClusterGroup,
    DataProtection,
}

impl ResourceKind {
    pub const ALLOWED_VALUES: &'static [&'static str] = <Self as VariantNames>::VARIANTS;

    /// Expand `tree` into the resource's request object, as JSON.
    pub fn expand(self, tree: &Block) -> Result<serde_json::Value, CoreError> {
        let value = match self {
            Self::ClusterGroup => serde_json::to_value(cluster_group::expand(tree)?),
            Self::DataProtection => serde_json::to_value(data_protection::expand(tree)?),
        };
        value.map_err(|e| CoreError::Validation {
            message: format!("cannot encode {self}: {e}"),
        })
    }

    /// Flatten a JSON-encoded resource object into its configuration tree.
    pub fn flatten(self, object: serde_json::Value) -> Result<Block, CoreError> {
        fn decode<T: serde::de::DeserializeOwned>(
            kind: ResourceKind,
            object: serde_json::Value,
        ) -> Result<T, CoreError> {
            serde_json::from_value(object).map_err(|e| CoreError::Validation {
                message: format!("not a valid {kind} object: {e}"),
            })
        }

        match self {
            Self::ClusterGroup => cluster_group::flatten(&decode(self, object)?),
            Self::DataProtection => data_protection::flatten(&decode(self, object)?),
        }
    }
}

/// Runs lifecycle operations for any [`ResourceKind`] over one transport.
pub struct Lifecycle<'a, T> {
    transport: &'a T,
    poll: PollSettings,
}

impl<'a, T: Transport> Lifecycle<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self {
            transport,
            poll: PollSettings::default(),
        }
    }

    pub fn with_poll(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    pub async fn create(&self, kind: ResourceKind, tree: &Block) -> Result<Block, CoreError> {
        match kind {
            ResourceKind::ClusterGroup => cluster_group::create(self.transport, tree).await,
            ResourceKind::DataProtection => {
                data_protection::create(self.transport, tree, &self.poll).await
            }
        }
    }

    /// `Ok(None)` means the resource no longer exists remotely.
    pub async fn read(&self, kind: ResourceKind, tree: &Block) -> Result<Option<Block>, CoreError> {
        match kind {
            ResourceKind::ClusterGroup => cluster_group::read(self.transport, tree).await,
            ResourceKind::DataProtection => data_protection::read(self.transport, tree).await,
        }
    }

    pub async fn update(&self, kind: ResourceKind, tree: &Block) -> Result<Block, CoreError> {
        match kind {
            ResourceKind::ClusterGroup => cluster_group::update(self.transport, tree).await,
            ResourceKind::DataProtection => data_protection::update(self.transport, tree).await,
        }
    }

    pub async fn delete(&self, kind: ResourceKind, tree: &Block) -> Result<(), CoreError> {
        match kind {
            ResourceKind::ClusterGroup => cluster_group::delete(self.transport, tree).await,
            ResourceKind::DataProtection => {
                data_protection::delete(self.transport, tree, &self.poll).await
            }
        }
    }
}

// ── Shared helpers ──────────────────────────────────────────────────

/// The `meta` block shared by every resource.
pub(crate) fn meta_table() -> BlockMap {
    BlockMap::new()
        .field("description", path!(meta.description))
        .field("labels", path!(meta.labels))
        .field("annotations", path!(meta.annotations))
        .field("uid", path!(meta.uid))
        .field("resource_version", path!(meta.resourceVersion))
}

/// Run a transport call; on Unauthorized refresh credentials and retry once.
pub(crate) async fn with_reauth<T, F, Fut, R>(
    transport: &T,
    mut call: F,
) -> Result<R, tmc_api::Error>
where
    T: Transport,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<R, tmc_api::Error>>,
{
    match call().await {
        Err(err) if classify_by_status(&err) == ErrorKind::Unauthorized => {
            warn!(error = %err, "credentials rejected, refreshing and retrying once");
            transport.refresh_credentials().await?;
            call().await
        }
        other => other,
    }
}

/// Copy every key of `fragment` into `tree`, replacing existing keys.
pub(crate) fn merge(tree: &mut Block, fragment: Block) {
    for (key, value) in fragment {
        tree.insert(key, value);
    }
}
