// ── Core error types ──
//
// Host-facing errors from flexit-core. Callers match on one kind and never
// see reqwest or serde failures directly. The `From<flexit_api::Error>` impl
// translates transport-layer errors into these variants.

use thiserror::Error;

/// Unified error type surfaced to the host.
#[derive(Debug, Clone, Error)]
pub enum FlexitError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to Flexit cloud at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Request to Flexit cloud timed out")]
    Timeout,

    /// Initial setup failed; the session was never started.
    #[error("Flexit session not ready: {0}")]
    NotReady(Box<FlexitError>),

    // ── API errors ───────────────────────────────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    #[error("Write to {path} rejected: {message}")]
    ApiWrite { path: String, message: String },

    // ── Validation errors ────────────────────────────────────────────
    #[error("Invalid mode: {name}")]
    InvalidMode { name: String },

    #[error("Setpoint {value} °C outside allowed range {min}..={max} °C")]
    InvalidSetpoint { value: f64, min: f64, max: f64 },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl FlexitError {
    /// The underlying cause, looking through `NotReady`.
    pub fn root(&self) -> &FlexitError {
        match self {
            Self::NotReady(inner) => inner.root(),
            other => other,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self.root(), Self::Auth { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<flexit_api::Error> for FlexitError {
    fn from(err: flexit_api::Error) -> Self {
        match err {
            flexit_api::Error::Authentication { message } => FlexitError::Auth { message },
            flexit_api::Error::NoPlant => FlexitError::Api {
                message: "no plant registered for this account".into(),
                status: None,
            },
            flexit_api::Error::Api { status, message } => FlexitError::Api {
                message,
                status: Some(status),
            },
            flexit_api::Error::Write {
                path,
                status,
                message,
            } => FlexitError::ApiWrite {
                path,
                message: format!("HTTP {status}: {message}"),
            },
            flexit_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    FlexitError::Timeout
                } else if e.is_connect() {
                    FlexitError::ConnectionFailed {
                        url: e
                            .url()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    FlexitError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            flexit_api::Error::InvalidUrl(e) => FlexitError::Config {
                message: format!("Invalid URL: {e}"),
            },
            flexit_api::Error::Tls(msg) => FlexitError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            flexit_api::Error::Deserialization { message, body: _ } => FlexitError::Api {
                message: format!("unexpected response: {message}"),
                status: None,
            },
        }
    }
}
