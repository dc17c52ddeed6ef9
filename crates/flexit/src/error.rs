//! CLI error types with miette diagnostics.
//!
//! Maps `FlexitError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use flexit_config::ConfigError;
use flexit_core::{FlexitError, Mode};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const REJECTED: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the Flexit cloud at {url}")]
    #[diagnostic(
        code(flexit::connection_failed),
        help(
            "Check your network connection.\n\
             Run with -vv to see each request."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request timed out")]
    #[diagnostic(
        code(flexit::timeout),
        help("Increase the timeout with --timeout or try again later.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(flexit::auth_failed),
        help(
            "Verify the e-mail and password you use in the Flexit GO app.\n\
             Run: flexit config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(flexit::no_credentials),
        help(
            "Configure credentials with: flexit config init\n\
             Or set FLEXIT_USERNAME and FLEXIT_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({code}): {message}")]
    #[diagnostic(code(flexit::api_error))]
    ApiError { code: String, message: String },

    #[error("The unit rejected the change to {path}: {message}")]
    #[diagnostic(
        code(flexit::write_rejected),
        help("The value may be outside what the unit accepts in its current state.")
    )]
    WriteRejected { path: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Unknown mode '{name}'")]
    #[diagnostic(code(flexit::invalid_mode), help("Valid modes: {valid}"))]
    InvalidMode { name: String, valid: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(flexit::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(flexit::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: flexit config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(flexit::no_config),
        help(
            "Create one with: flexit config init\n\
             Expected at: {path}\n\
             Or pass --username and --password."
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(flexit::config))]
    Config(Box<figment::Error>),

    #[error("Keyring error: {0}")]
    #[diagnostic(code(flexit::keyring))]
    Keyring(#[from] keyring::Error),

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Timeout => exit_code::TIMEOUT,
            Self::WriteRejected { .. } => exit_code::REJECTED,
            Self::InvalidMode { .. } | Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Fill in the active profile name on auth failures.
    pub fn with_profile(self, name: &str) -> Self {
        match self {
            Self::AuthFailed { message, .. } => Self::AuthFailed {
                profile: name.to_owned(),
                message,
            },
            other => other,
        }
    }
}

// ── FlexitError → CliError mapping ───────────────────────────────────

impl From<FlexitError> for CliError {
    fn from(err: FlexitError) -> Self {
        match err {
            FlexitError::NotReady(inner) => CliError::from(*inner),

            FlexitError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            FlexitError::Auth { message } => CliError::AuthFailed {
                profile: "default".into(),
                message,
            },

            FlexitError::Timeout => CliError::Timeout,

            FlexitError::Api { message, status } => CliError::ApiError {
                code: status.map_or_else(|| "api".into(), |s| s.to_string()),
                message,
            },

            FlexitError::ApiWrite { path, message } => CliError::WriteRejected { path, message },

            FlexitError::InvalidMode { name } => CliError::InvalidMode {
                name,
                valid: Mode::names().join(", "),
            },

            FlexitError::InvalidSetpoint { value, min, max } => CliError::Validation {
                field: "temperature".into(),
                reason: format!("{value} °C is outside {min}..={max} °C"),
            },

            FlexitError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Serialization(e) => CliError::Validation {
                field: "config".into(),
                reason: e.to_string(),
            },
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Keyring(e) => CliError::Keyring(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}
