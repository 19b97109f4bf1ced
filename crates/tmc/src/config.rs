//! Resolves the active profile into a client and poll settings.
//!
//! All file and credential handling lives in `tmc-config`; this module
//! only applies the command-line overrides on top.

use std::time::Duration;

use tracing::debug;

use tmc_config::Config;
use tmc_core::{PollSettings, TmcClient};

use crate::cli::GlobalOpts;
use crate::error::CliError;

fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let config = match global.config {
        Some(ref path) => tmc_config::load_config_from(path)?,
        None => tmc_config::load_config()?,
    };
    Ok(config)
}

/// Build the control plane client and the poll settings for one run.
pub fn connect(global: &GlobalOpts) -> Result<(TmcClient, PollSettings), CliError> {
    let config = load(global)?;
    let (name, profile) = tmc_config::select_profile(&config, global.profile.as_deref())?;
    debug!(profile = %name, endpoint = %profile.endpoint, "using profile");

    let client_config = tmc_config::profile_to_client_config(&profile, &name, &config.defaults)?;
    let client = TmcClient::new(&client_config).map_err(tmc_core::CoreError::from)?;

    let mut poll = tmc_config::poll_settings(&profile, &config.defaults);
    if let Some(secs) = global.poll_interval {
        poll.interval = Duration::from_secs(secs);
    }
    if let Some(secs) = global.poll_timeout {
        poll.timeout = Duration::from_secs(secs);
    }
    Ok((client, poll))
}
