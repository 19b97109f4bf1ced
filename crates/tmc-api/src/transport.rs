// Shared transport configuration and the CRUD capability consumed by tmc-core.
//
// `TransportConfig` builds the reqwest::Client used by `TmcClient`;
// `Transport` is the opaque create/read/update/delete surface that the
// resource lifecycle glue talks to, so it can be swapped in tests.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Error;

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (`INSECURE_ALLOW_UNVERIFIED_SSL`).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            user_agent: concat!("tmc-provider/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str());

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

// ── Endpoint ────────────────────────────────────────────────────────

/// A control plane location: path segments relative to the API root plus
/// query pairs.
///
/// Segments are kept apart until the URL is built, so a name taken from
/// configuration always lands in exactly one percent-encoded segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
}

impl Endpoint {
    /// Start from a fixed, slash-separated route such as `v1alpha1/clustergroups`.
    pub fn new(route: &str) -> Self {
        Self {
            segments: route
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect(),
            query: Vec::new(),
        }
    }

    /// Append one segment verbatim; `/`, `?` and `#` inside it are escaped.
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Append a query parameter.
    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_owned(), value.into()));
        self
    }

    /// Append a query parameter only when a non-empty value is present.
    pub fn query_opt(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => self.query(key, v),
            _ => self,
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.segments.join("/"))?;
        for (i, (k, v)) in self.query.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{k}={v}")?;
        }
        Ok(())
    }
}

// ── Transport capability ────────────────────────────────────────────

/// Synchronous-per-call CRUD surface of the control plane.
///
/// Callers treat it as opaque: retries, auth headers, and URL joining are
/// the implementor's business. The only thing a caller inspects is the
/// returned [`Error`].
pub trait Transport: Send + Sync {
    fn create<B, R>(
        &self,
        endpoint: &Endpoint,
        body: &B,
    ) -> impl Future<Output = Result<R, Error>> + Send
    where
        B: Serialize + Sync,
        R: DeserializeOwned + Send;

    fn read<R>(&self, endpoint: &Endpoint) -> impl Future<Output = Result<R, Error>> + Send
    where
        R: DeserializeOwned + Send;

    fn update<B, R>(
        &self,
        endpoint: &Endpoint,
        body: &B,
    ) -> impl Future<Output = Result<R, Error>> + Send
    where
        B: Serialize + Sync,
        R: DeserializeOwned + Send;

    fn delete(&self, endpoint: &Endpoint) -> impl Future<Output = Result<(), Error>> + Send;

    /// Discard any cached credentials and obtain fresh ones.
    fn refresh_credentials(&self) -> impl Future<Output = Result<(), Error>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_renders_query_in_order() {
        let ep = Endpoint::new("v1alpha1/clusters/c1/dataprotection")
            .query("fullName.managementClusterName", "attached")
            .query_opt("fullName.provisionerName", Some("attached"))
            .query_opt("ignored", None)
            .query_opt("empty", Some(""));

        assert_eq!(
            ep.to_string(),
            "v1alpha1/clusters/c1/dataprotection?fullName.managementClusterName=attached&fullName.provisionerName=attached"
        );
    }

    #[test]
    fn default_transport_uses_system_roots() {
        let config = TransportConfig::default();
        assert!(matches!(config.tls, TlsMode::System));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("tmc-provider/"));
    }
}
