use std::sync::Arc;

use arc_swap::ArcSwapOption;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::Error;

/// Path of the CSP endpoint that trades an API token for an access token.
const AUTHORIZE_PATH: &str = "csp/gateway/am/api/auth/api-tokens/authorize";

/// Credentials for authenticating with the control plane.
///
/// Each variant carries the secret material needed for its auth flow.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// A ready-to-use bearer token (self-managed deployments, tests).
    AccessToken(SecretString),

    /// A long-lived VMware Cloud Services API token, exchanged at
    /// `csp_url` for short-lived access tokens.
    ApiToken { token: SecretString, csp_url: Url },
}

#[derive(Deserialize)]
struct AuthorizeResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Caches the bearer token derived from [`Credentials`].
///
/// The cached value is swapped atomically, so concurrent readers never
/// block on a refresh in progress.
pub(crate) struct TokenSource {
    credentials: Credentials,
    cached: ArcSwapOption<SecretString>,
}

impl TokenSource {
    pub(crate) fn new(credentials: Credentials) -> Self {
        let cached = match &credentials {
            Credentials::AccessToken(token) => Some(Arc::new(token.clone())),
            Credentials::ApiToken { .. } => None,
        };
        Self {
            credentials,
            cached: ArcSwapOption::from(cached),
        }
    }

    /// Current bearer token, exchanging the API token on first use.
    pub(crate) async fn bearer(&self, http: &reqwest::Client) -> Result<Arc<SecretString>, Error> {
        if let Some(token) = self.cached.load_full() {
            return Ok(token);
        }
        self.refresh(http).await
    }

    /// Drop the cached token and obtain a new one.
    ///
    /// A static access token cannot be refreshed; it is simply re-installed.
    pub(crate) async fn refresh(&self, http: &reqwest::Client) -> Result<Arc<SecretString>, Error> {
        let token = match &self.credentials {
            Credentials::AccessToken(token) => Arc::new(token.clone()),
            Credentials::ApiToken { token, csp_url } => {
                Arc::new(exchange_api_token(http, csp_url, token).await?)
            }
        };
        self.cached.store(Some(Arc::clone(&token)));
        Ok(token)
    }
}

async fn exchange_api_token(
    http: &reqwest::Client,
    csp_url: &Url,
    api_token: &SecretString,
) -> Result<SecretString, Error> {
    let url = csp_url.join(AUTHORIZE_PATH)?;
    debug!(url = %url, "exchanging API token for access token");

    let resp = http
        .post(url)
        .form(&[("refresh_token", api_token.expose_secret())])
        .send()
        .await?;

    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(Error::Authentication {
            message: format!("token exchange rejected (HTTP {}): {body}", status.as_u16()),
        });
    }

    let parsed: AuthorizeResponse =
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("invalid authorize response: {e}"),
            body: String::new(),
        })?;
    debug!(expires_in = ?parsed.expires_in, "access token issued");

    Ok(SecretString::from(parsed.access_token))
}
