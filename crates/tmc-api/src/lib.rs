// tmc-api: Async Rust client for the Tanzu Mission Control REST API

pub mod auth;
pub mod client;
pub mod error;
pub mod status;
pub mod transport;

pub use auth::Credentials;
pub use client::{ClientConfig, TmcClient};
pub use error::Error;
pub use status::HttpStatusCode;
pub use transport::{Endpoint, TlsMode, Transport, TransportConfig};

/// Re-exported so consumers can name status codes without a direct `reqwest` dependency.
pub use reqwest::StatusCode;
