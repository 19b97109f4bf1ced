//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a distinct exit code per failure class.

use miette::Diagnostic;
use thiserror::Error;

use tmc_config::ConfigError;
use tmc_core::{CoreError, ErrorKind, TransportError};

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the control plane")]
    #[diagnostic(
        code(tmc::connection_failed),
        help("Check the profile endpoint and your network, or raise the request timeout.")
    )]
    ConnectionFailed {
        #[source]
        source: Box<CoreError>,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(tmc::auth_failed),
        help(
            "Verify the API token for this profile.\n\
             Set VMW_CLOUD_API_TOKEN, or api_token_env in the profile."
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(tmc::no_credentials),
        help(
            "Store a token in the system keyring under service 'tmc', account '{profile}/api-token',\n\
             or set VMW_CLOUD_API_TOKEN."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(tmc::not_found),
        help("The resource no longer exists remotely; create it again to restore it.")
    )]
    NotFound { message: String },

    #[error("{message}")]
    #[diagnostic(code(tmc::conflict))]
    Conflict { message: String },

    #[error("{message}")]
    #[diagnostic(code(tmc::remote))]
    Remote {
        message: String,
        #[source]
        source: Box<CoreError>,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid {field}: {reason}")]
    #[diagnostic(code(tmc::validation))]
    Validation { field: String, reason: String },

    #[error("Could not parse {path} as JSON or YAML")]
    #[diagnostic(
        code(tmc::input),
        help("The input must be a single mapping (object) at the top level.")
    )]
    Input {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(tmc::profile_not_found),
        help(
            "Add a [profiles.{name}] table to {path},\n\
             or set TMC_ENDPOINT to run without a config file."
        )
    )]
    ProfileNotFound { name: String, path: String },

    #[error(transparent)]
    #[diagnostic(code(tmc::config))]
    Config(ConfigError),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(tmc::timeout),
        help("Raise the wait with --poll-timeout, or poll_timeout_secs in the profile.")
    )]
    Timeout { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render output: {0}")]
    #[diagnostic(code(tmc::output))]
    Output(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::Input { .. } | Self::ProfileNotFound { .. } => {
                exit_code::USAGE
            }
            Self::Remote { .. } | Self::Config(_) | Self::Io(_) | Self::Output(_) => {
                exit_code::GENERAL
            }
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        if err.is_validation() {
            return Self::Validation {
                field: "configuration".into(),
                reason: err.to_string(),
            };
        }
        if err.is_timeout() {
            return Self::Timeout {
                message: err.to_string(),
            };
        }
        let (auth_message, unreachable) = match err.root() {
            CoreError::Transport(TransportError::Authentication { message }) => {
                (Some(message.clone()), false)
            }
            CoreError::Transport(TransportError::Transport(_) | TransportError::Tls(_)) => {
                (None, true)
            }
            _ => (None, false),
        };
        if let Some(message) = auth_message {
            return Self::AuthFailed { message };
        }
        if unreachable {
            return Self::ConnectionFailed {
                source: Box::new(err),
            };
        }

        match err.kind() {
            ErrorKind::Unauthorized => Self::AuthFailed {
                message: err.to_string(),
            },
            ErrorKind::Conflict | ErrorKind::PreconditionFailed => Self::Conflict {
                message: err.to_string(),
            },
            ErrorKind::NotFound => Self::NotFound {
                message: err.to_string(),
            },
            ErrorKind::Unknown => Self::Remote {
                message: err.to_string(),
                source: Box::new(err),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                path: tmc_config::config_path().display().to_string(),
            },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}
