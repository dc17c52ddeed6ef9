//! CLI configuration — thin wrapper around `flexit_config` shared types.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--username, --password, --api-url, ...).

use std::time::Duration;

use secrecy::SecretString;

use flexit_core::{FlexitConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use flexit_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Translate a `Profile` + global flags into a `FlexitConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<FlexitConfig, CliError> {
    let merged = Profile {
        username: global.username.clone().or_else(|| profile.username.clone()),
        password: global.password.clone().or_else(|| profile.password.clone()),
        api_key: global.api_key.clone().or_else(|| profile.api_key.clone()),
        api_url: global.api_url.clone().or_else(|| profile.api_url.clone()),
        insecure: Some(global.insecure || profile.insecure.unwrap_or(false)),
        timeout: global.timeout.or(profile.timeout),
        ..profile.clone()
    };

    let mut cfg = flexit_config::profile_to_config(&merged, profile_name, defaults)?;

    // Explicit flags beat keyring entries found by the shared chain.
    if let Some(ref pw) = global.password {
        cfg.password = SecretString::from(pw.clone());
    }
    if let Some(ref key) = global.api_key {
        cfg.api_key = Some(SecretString::from(key.clone()));
    }
    Ok(cfg)
}

/// Build a `FlexitConfig` from flags / env vars alone (no profile on disk).
pub fn config_from_flags(
    global: &GlobalOpts,
    profile_name: &str,
) -> Result<FlexitConfig, CliError> {
    let (Some(username), Some(password)) = (global.username.clone(), global.password.clone())
    else {
        if global.username.is_some() {
            return Err(CliError::NoCredentials {
                profile: profile_name.into(),
            });
        }
        return Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        });
    };

    let defaults = FlexitConfig::default();
    let tls = if global.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(FlexitConfig {
        api_url: global.api_url.clone().unwrap_or(defaults.api_url),
        username,
        password: SecretString::from(password),
        api_key: global.api_key.clone().map(SecretString::from),
        tls,
        timeout: global.timeout.map_or(defaults.timeout, Duration::from_secs),
        ..FlexitConfig::default()
    })
}
