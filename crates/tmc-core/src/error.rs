// ── Core error types ──
//
// Everything a lifecycle operation can fail with. Transport errors keep
// their status code so the classifier can still see it after wrapping;
// `Resource` attaches the identity of the instance being operated on.

use std::time::Duration;

use thiserror::Error;
use tmc_api::{HttpStatusCode, StatusCode};

use crate::classify::{ErrorKind, classify_by_status};
use crate::mapping::MappingError;
use crate::poll::PollError;
use crate::scope::ScopeError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Remote ───────────────────────────────────────────────────────
    #[error(transparent)]
    Transport(#[from] tmc_api::Error),

    /// The remote reported a terminal failure state for the resource.
    #[error("{resource} entered phase {phase}: {message}")]
    RemoteFailed {
        resource: String,
        phase: String,
        message: String,
    },

    /// The resource vanished between two calls that expected it.
    #[error("{resource} no longer exists")]
    Gone { resource: String },

    // ── Local validation ─────────────────────────────────────────────
    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error("Validation failed: {message}")]
    Validation { message: String },

    // ── Convergence ──────────────────────────────────────────────────
    #[error(
        "timed out after {timeout:?} waiting for convergence: {}",
        .last_error.as_ref().map_or_else(|| "still not converged".to_owned(), ToString::to_string)
    )]
    PollTimeout {
        timeout: Duration,
        #[source]
        last_error: Option<Box<CoreError>>,
    },

    // ── Context ──────────────────────────────────────────────────────
    #[error("{operation} {resource}: {source}")]
    Resource {
        operation: &'static str,
        resource: String,
        #[source]
        source: Box<CoreError>,
    },
}

impl CoreError {
    /// Wrap `self` with the lifecycle operation and resource identity.
    pub fn in_resource(self, operation: &'static str, resource: impl ToString) -> Self {
        Self::Resource {
            operation,
            resource: resource.to_string(),
            source: Box::new(self),
        }
    }

    /// Semantic kind of the underlying failure.
    pub fn kind(&self) -> ErrorKind {
        classify_by_status(self)
    }

    /// Innermost error, skipping resource context.
    pub fn root(&self) -> &CoreError {
        match self {
            Self::Resource { source, .. } => source.root(),
            other => other,
        }
    }

    /// Errors caused by the configuration itself, never worth retrying.
    pub fn is_validation(&self) -> bool {
        matches!(
            self.root(),
            Self::Mapping(_) | Self::Scope(_) | Self::Validation { .. }
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.root(), Self::PollTimeout { .. })
    }
}

impl HttpStatusCode for CoreError {
    fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Transport(err) => err.status_code(),
            Self::Resource { source, .. } => source.status_code(),
            Self::Gone { .. } => Some(StatusCode::NOT_FOUND),
            Self::PollTimeout { .. }
            | Self::RemoteFailed { .. }
            | Self::Mapping(_)
            | Self::Scope(_)
            | Self::Validation { .. } => None,
        }
    }
}

impl From<PollError<CoreError>> for CoreError {
    fn from(err: PollError<CoreError>) -> Self {
        match err {
            PollError::Failed(inner) => inner,
            PollError::Timeout {
                timeout,
                last_error,
                ..
            } => Self::PollTimeout {
                timeout,
                last_error: last_error.map(Box::new),
            },
        }
    }
}
