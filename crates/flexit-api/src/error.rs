use thiserror::Error;

/// Top-level error type for the `flexit-api` crate.
///
/// Covers every failure mode of the Climatix IC surface: token
/// acquisition, plant lookup, batched reads, single-point writes and the
/// transport underneath. `flexit-core` maps these into host-facing errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Token endpoint rejected the credentials or returned garbage.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Plant ───────────────────────────────────────────────────────
    /// The account has no plant registered.
    #[error("No plant registered for this account")]
    NoPlant,

    // ── Data points ─────────────────────────────────────────────────
    /// Non-2xx from a read endpoint (after the single 401 retry).
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Non-2xx from the write endpoint (after the single 401 retry).
    #[error("Write to {path} rejected (HTTP {status}): {message}")]
    Write {
        path: String,
        status: u16,
        message: String,
    },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying later.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } | Self::Write { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } | Self::Write { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Trim a response body to a short preview for error messages.
pub(crate) fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
