// Async HTTP client for the Tanzu Mission Control REST API.
//
// Base path: the organization endpoint root (e.g. https://org.tmc.cloud.vmware.com/)
// Auth: `Authorization: Bearer <access token>`

use reqwest::Method;
use reqwest::header::AUTHORIZATION;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::{Credentials, TokenSource};
use crate::error::Error;
use crate::transport::{Endpoint, Transport, TransportConfig};

// ── Error response shape (gRPC gateway) ──────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<i64>,
}

/// Everything needed to construct a [`TmcClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Organization endpoint root, e.g. `https://org.tmc.cloud.vmware.com`.
    pub endpoint: Url,
    pub credentials: Credentials,
    pub transport: TransportConfig,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the control plane REST API.
pub struct TmcClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: TokenSource,
}

impl TmcClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a [`ClientConfig`].
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        let http = config.transport.build_client()?;
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(config.endpoint.as_str())?,
            tokens: TokenSource::new(config.credentials.clone()),
        })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(
        base_url: &str,
        http: reqwest::Client,
        credentials: Credentials,
    ) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
            tokens: TokenSource::new(credentials),
        })
    }

    /// The normalized API root (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    // ── URL builder ──────────────────────────────────────────────────

    fn url(&self, endpoint: &Endpoint) -> Result<Url, Error> {
        if let Some(bad) = endpoint
            .segments
            .iter()
            .find(|s| matches!(s.as_str(), "" | "." | ".."))
        {
            return Err(Error::InvalidSegment {
                segment: bad.clone(),
            });
        }

        let mut full = self.base_url.clone();
        full.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(&endpoint.segments);
        Ok(full)
    }

    // ── Request plumbing ─────────────────────────────────────────────

    async fn send<B: Serialize + Sync>(
        &self,
        method: Method,
        endpoint: &Endpoint,
        body: Option<&B>,
    ) -> Result<reqwest::Response, Error> {
        let url = self.url(endpoint)?;
        debug!(%method, %url, query = ?endpoint.query, "control plane request");

        let token = self.tokens.bearer(&self.http).await?;
        let mut req = self
            .http
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", token.expose_secret()))
            .query(&endpoint.query);
        if let Some(body) = body {
            req = req.json(body);
        }

        Ok(req.send().await?)
    }

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();

        match serde_json::from_str::<ErrorResponse>(&raw) {
            Ok(err) => Error::Api {
                status: status.as_u16(),
                message: err
                    .message
                    .or(err.error)
                    .unwrap_or_else(|| status.to_string()),
                code: err.code,
            },
            Err(_) => Error::Api {
                status: status.as_u16(),
                message: if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                },
                code: None,
            },
        }
    }
}

impl Transport for TmcClient {
    async fn create<B, R>(&self, endpoint: &Endpoint, body: &B) -> Result<R, Error>
    where
        B: Serialize + Sync,
        R: DeserializeOwned + Send,
    {
        let resp = self.send(Method::POST, endpoint, Some(body)).await?;
        Self::handle_response(resp).await
    }

    async fn read<R>(&self, endpoint: &Endpoint) -> Result<R, Error>
    where
        R: DeserializeOwned + Send,
    {
        let resp = self.send::<()>(Method::GET, endpoint, None).await?;
        Self::handle_response(resp).await
    }

    async fn update<B, R>(&self, endpoint: &Endpoint, body: &B) -> Result<R, Error>
    where
        B: Serialize + Sync,
        R: DeserializeOwned + Send,
    {
        let resp = self.send(Method::PUT, endpoint, Some(body)).await?;
        Self::handle_response(resp).await
    }

    async fn delete(&self, endpoint: &Endpoint) -> Result<(), Error> {
        let resp = self.send::<()>(Method::DELETE, endpoint, None).await?;
        Self::handle_empty(resp).await
    }

    async fn refresh_credentials(&self) -> Result<(), Error> {
        self.tokens.refresh(&self.http).await.map(|_| ())
    }
}
