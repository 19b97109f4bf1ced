//! Provider configuration for the TMC tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! an environment-only fallback, and translation to
//! `tmc_core::ClientConfig` and `tmc_core::PollSettings`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use tmc_core::{ClientConfig, Credentials, PollSettings, TlsMode, TransportConfig};

/// CSP endpoint used when a profile does not name one.
pub const DEFAULT_CSP_ENDPOINT: &str = "https://console.cloud.vmware.com";

/// Environment variables honoured in environment-only mode.
pub const ENV_ENDPOINT: &str = "TMC_ENDPOINT";
pub const ENV_CSP_ENDPOINT: &str = "VMW_CLOUD_ENDPOINT";
pub const ENV_API_TOKEN: &str = "VMW_CLOUD_API_TOKEN";
pub const ENV_INSECURE: &str = "INSECURE_ALLOW_UNVERIFIED_SSL";

const KEYRING_SERVICE: &str = "tmc";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found in config")]
    UnknownProfile { name: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named control plane profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    /// Per-request timeout, seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Bound on asynchronous create/delete waits. Zero means probe once.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,

    #[serde(default)]
    pub insecure: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            poll_interval_secs: default_poll_interval(),
            poll_timeout_secs: default_poll_timeout(),
            insecure: false,
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_poll_interval() -> u64 {
    5
}
fn default_poll_timeout() -> u64 {
    30 * 60
}

/// A named control plane profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Control plane host or URL (e.g., "myorg.tmc.cloud.vmware.com").
    pub endpoint: String,

    /// CSP host or URL used to exchange the API token.
    pub csp_endpoint: Option<String>,

    /// API token (plaintext; prefer keyring or env var).
    pub api_token: Option<String>,

    /// Environment variable name containing the API token.
    pub api_token_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override request timeout.
    pub timeout: Option<u64>,

    /// Override poll interval.
    pub poll_interval_secs: Option<u64>,

    /// Override poll timeout.
    pub poll_timeout_secs: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "tmc-provider", "tmc").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("tmc");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from `path` + `TMC_*` environment variables.
///
/// Nested keys use a double underscore: `TMC_DEFAULTS__POLL_TIMEOUT_SECS`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("TMC_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Profile selection ───────────────────────────────────────────────

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Build a profile purely from the environment, if `TMC_ENDPOINT` is set.
pub fn profile_from_env() -> Option<Profile> {
    let endpoint = non_empty_env(ENV_ENDPOINT)?;
    let insecure = non_empty_env(ENV_INSECURE)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"));

    Some(Profile {
        endpoint,
        csp_endpoint: non_empty_env(ENV_CSP_ENDPOINT),
        insecure,
        ..Profile::default()
    })
}

/// Pick the profile named `requested`, else the default profile, else the
/// environment-only profile.
pub fn select_profile(
    config: &Config,
    requested: Option<&str>,
) -> Result<(String, Profile), ConfigError> {
    let name = requested
        .map(str::to_owned)
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into());

    if let Some(profile) = config.profiles.get(&name) {
        return Ok((name, profile.clone()));
    }
    if requested.is_none() {
        if let Some(profile) = profile_from_env() {
            debug!("no profile configured, using environment");
            return Ok(("env".into(), profile));
        }
    }
    Err(ConfigError::UnknownProfile { name })
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the API token from the credential chain:
/// `api_token_env` → `VMW_CLOUD_API_TOKEN` → system keyring → plaintext.
pub fn resolve_api_token(
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's api_token_env → env var lookup
    if let Some(ref env_name) = profile.api_token_env {
        if let Some(val) = non_empty_env(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. Well-known env var
    if let Some(val) = non_empty_env(ENV_API_TOKEN) {
        return Ok(SecretString::from(val));
    }

    // 3. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/api-token")) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 4. Plaintext in config
    if let Some(ref token) = profile.api_token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Accept bare hosts as well as URLs; bare hosts get `https://`.
fn parse_endpoint(field: &str, raw: &str) -> Result<url::Url, ConfigError> {
    let raw = raw.trim();
    let candidate = if raw.contains("://") {
        raw.to_owned()
    } else {
        format!("https://{raw}")
    };
    candidate.parse().map_err(|_| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {raw}"),
    })
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `ClientConfig` from a profile, with global defaults filling gaps.
pub fn profile_to_client_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ClientConfig, ConfigError> {
    if profile.endpoint.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "endpoint".into(),
            reason: "must not be empty".into(),
        });
    }
    let endpoint = parse_endpoint("endpoint", &profile.endpoint)?;
    let csp_url = parse_endpoint(
        "csp_endpoint",
        profile
            .csp_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_CSP_ENDPOINT),
    )?;

    let token = resolve_api_token(profile, profile_name)?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    let transport = TransportConfig {
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        ..TransportConfig::default()
    };

    Ok(ClientConfig {
        endpoint,
        credentials: Credentials::ApiToken { token, csp_url },
        transport,
    })
}

/// Poll cadence and bound for asynchronous lifecycle operations.
pub fn poll_settings(profile: &Profile, defaults: &Defaults) -> PollSettings {
    PollSettings::new(
        Duration::from_secs(profile.poll_interval_secs.unwrap_or(defaults.poll_interval_secs)),
        Duration::from_secs(profile.poll_timeout_secs.unwrap_or(defaults.poll_timeout_secs)),
    )
}
