// ── Runtime session configuration ──
//
// These types describe *how* to talk to the Flexit cloud. They carry
// credential data and connection tuning, but never touch disk.
// The CLI constructs a `FlexitConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (intercepting debug proxies only).
    DangerAcceptInvalid,
}

/// Configuration for one Flexit cloud session.
///
/// Built by the CLI, passed to [`Flexit`](crate::Flexit); core never reads
/// config files.
#[derive(Debug, Clone)]
pub struct FlexitConfig {
    /// Device name reported through [`DeviceIdentity`](crate::DeviceIdentity).
    pub name: String,
    /// API root (defaults to `https://api.climatixic.com`).
    pub api_url: String,
    pub username: String,
    pub password: SecretString,
    /// `Ocp-Apim-Subscription-Key` override; `None` uses the app default.
    pub api_key: Option<SecretString>,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Subtracted from the server-reported token lifetime.
    pub token_margin: Duration,
    /// Background refresh period. Zero disables the refresh task.
    pub update_interval: Duration,
}

pub const DEFAULT_DEVICE_NAME: &str = "Flexit";

/// Default polling period.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(30 * 60);

impl FlexitConfig {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
            ..Self::default()
        }
    }
}

impl Default for FlexitConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_DEVICE_NAME.to_owned(),
            api_url: flexit_api::API_URL.to_owned(),
            username: String::new(),
            password: SecretString::from(String::new()),
            api_key: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(10),
            token_margin: Duration::from_secs(60),
            update_interval: DEFAULT_UPDATE_INTERVAL,
        }
    }
}
