#![allow(clippy::unwrap_used)]
// Config loading and credential resolution, isolated with figment's Jail
// (private working directory and environment per test).

use std::path::Path;
use std::time::Duration;

use figment::Jail;
use pretty_assertions::assert_eq;
use secrecy::ExposeSecret;

use tmc_config::{
    Config, ConfigError, Defaults, Profile, load_config_from, poll_settings,
    profile_to_client_config, resolve_api_token, select_profile,
};
use tmc_core::{Credentials, TlsMode};

const SAMPLE: &str = r#"
default_profile = "prod"

[defaults]
poll_interval_secs = 10
poll_timeout_secs = 600

[profiles.prod]
endpoint = "myorg.tmc.cloud.vmware.com"
api_token = "plaintext-token"
timeout = 45

[profiles.lab]
endpoint = "https://tmc.lab.internal"
csp_endpoint = "https://csp.lab.internal"
api_token_env = "LAB_TMC_TOKEN"
ca_cert = "/etc/ssl/lab-ca.pem"
poll_timeout_secs = 0
"#;

#[test]
fn test_loads_profiles_and_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", SAMPLE)?;

        let config = load_config_from(Path::new("config.toml")).unwrap();
        assert_eq!(config.default_profile.as_deref(), Some("prod"));
        assert_eq!(config.defaults.poll_interval_secs, 10);
        assert_eq!(config.defaults.timeout, 30);
        assert_eq!(config.profiles.len(), 2);
        assert_eq!(config.profiles["prod"].timeout, Some(45));
        Ok(())
    });
}

#[test]
fn test_env_overrides_file() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", SAMPLE)?;
        jail.set_env("TMC_DEFAULT_PROFILE", "lab");
        jail.set_env("TMC_DEFAULTS__POLL_TIMEOUT_SECS", "60");

        let config = load_config_from(Path::new("config.toml")).unwrap();
        assert_eq!(config.default_profile.as_deref(), Some("lab"));
        assert_eq!(config.defaults.poll_timeout_secs, 60);
        Ok(())
    });
}

#[test]
fn test_missing_file_yields_defaults() {
    Jail::expect_with(|_jail| {
        let config = load_config_from(Path::new("absent.toml")).unwrap();
        assert_eq!(config.default_profile.as_deref(), Some("default"));
        assert_eq!(config.defaults, Defaults::default());
        assert!(config.profiles.is_empty());
        Ok(())
    });
}

#[test]
fn test_profile_env_var_wins_over_plaintext() {
    Jail::expect_with(|jail| {
        jail.set_env("LAB_TMC_TOKEN", "from-profile-env");
        jail.set_env("VMW_CLOUD_API_TOKEN", "from-well-known-env");

        let profile = Profile {
            api_token_env: Some("LAB_TMC_TOKEN".into()),
            api_token: Some("plaintext".into()),
            ..Profile::default()
        };
        let token = resolve_api_token(&profile, "lab").unwrap();
        assert_eq!(token.expose_secret(), "from-profile-env");
        Ok(())
    });
}

#[test]
fn test_well_known_env_var_is_second() {
    Jail::expect_with(|jail| {
        jail.set_env("VMW_CLOUD_API_TOKEN", "from-well-known-env");

        let profile = Profile {
            api_token_env: Some("UNSET_TOKEN_VAR".into()),
            api_token: Some("plaintext".into()),
            ..Profile::default()
        };
        let token = resolve_api_token(&profile, "lab").unwrap();
        assert_eq!(token.expose_secret(), "from-well-known-env");
        Ok(())
    });
}

#[test]
fn test_selects_environment_profile_without_config() {
    Jail::expect_with(|jail| {
        jail.set_env("TMC_ENDPOINT", "myorg.tmc.cloud.vmware.com");
        jail.set_env("VMW_CLOUD_ENDPOINT", "console.cloud.vmware.com");
        jail.set_env("INSECURE_ALLOW_UNVERIFIED_SSL", "true");

        let (name, profile) = select_profile(&Config::default(), None).unwrap();
        assert_eq!(name, "env");
        assert_eq!(profile.endpoint, "myorg.tmc.cloud.vmware.com");
        assert_eq!(profile.insecure, Some(true));

        let missing = select_profile(&Config::default(), Some("prod"));
        assert!(matches!(missing, Err(ConfigError::UnknownProfile { .. })));
        Ok(())
    });
}

#[test]
fn test_builds_client_config() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", SAMPLE)?;
        jail.set_env("LAB_TMC_TOKEN", "lab-token");
        let config = load_config_from(Path::new("config.toml")).unwrap();

        let (name, lab) = select_profile(&config, Some("lab")).unwrap();
        let client = profile_to_client_config(&lab, &name, &config.defaults).unwrap();
        assert_eq!(client.endpoint.as_str(), "https://tmc.lab.internal/");
        assert!(matches!(client.transport.tls, TlsMode::CustomCa(_)));
        match client.credentials {
            Credentials::ApiToken { token, csp_url } => {
                assert_eq!(token.expose_secret(), "lab-token");
                assert_eq!(csp_url.as_str(), "https://csp.lab.internal/");
            }
            Credentials::AccessToken(_) => panic!("expected API token credentials"),
        }

        let settings = poll_settings(&lab, &config.defaults);
        assert_eq!(settings.interval, Duration::from_secs(10));
        assert_eq!(settings.timeout, Duration::ZERO);

        let (name, prod) = select_profile(&config, None).unwrap();
        let client = profile_to_client_config(&prod, &name, &config.defaults).unwrap();
        assert_eq!(client.endpoint.as_str(), "https://myorg.tmc.cloud.vmware.com/");
        assert_eq!(client.transport.timeout, Duration::from_secs(45));
        Ok(())
    });
}

#[test]
fn test_empty_endpoint_is_rejected() {
    let err = profile_to_client_config(&Profile::default(), "x", &Defaults::default()).unwrap_err();
    assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "endpoint"));
}
