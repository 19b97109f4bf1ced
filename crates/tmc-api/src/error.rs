use thiserror::Error;

use crate::status::HttpStatusCode;

/// Top-level error type for the `tmc-api` crate.
///
/// Covers every failure mode of the control plane client:
/// credential exchange, transport, API responses, and payload decoding.
/// `tmc-core` classifies these by status code before deciding to retry.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The API token could not be exchanged for an access token.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A path segment that cannot address a resource (empty, `.` or `..`).
    #[error("Invalid path segment {segment:?}")]
    InvalidSegment { segment: String },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Control plane ───────────────────────────────────────────────
    /// Non-success response from the control plane.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        message: String,
        /// gRPC-gateway status code carried in the error body, if any.
        code: Option<i64>,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON (de)serialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => matches!(status, 429 | 502..=504),
            _ => false,
        }
    }
}

impl HttpStatusCode for Error {
    fn status_code(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::Transport(e) => e.status(),
            Self::Api { status, .. } => reqwest::StatusCode::from_u16(*status).ok(),
            Self::Authentication { .. }
            | Self::InvalidUrl(_)
            | Self::InvalidSegment { .. }
            | Self::Tls(_)
            | Self::Deserialization { .. } => None,
        }
    }
}
