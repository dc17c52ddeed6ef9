// Token authentication
//
// Password-grant login against `{API_URL}/Token`. The resulting bearer token
// carries its own expiry; callers check freshness before every request and
// re-authenticate lazily. There is no background refresh timer.

use chrono::{DateTime, TimeDelta, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{Error, preview};

/// Subscription key baked into the Flexit GO app, used when none is configured.
pub const DEFAULT_SUBSCRIPTION_KEY: &str = "c3fc1f14ce8747588212eda5ae3b439e";

/// Default safety margin (seconds) subtracted from the server-reported token lifetime.
pub const DEFAULT_TOKEN_MARGIN_SECS: i64 = 60;

/// Account credentials for the Flexit cloud.
///
/// Immutable for the life of a session. `api_key` selects the
/// `Ocp-Apim-Subscription-Key` header value; `None` means the app default.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    pub api_key: Option<SecretString>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: SecretString) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// The subscription key to send, falling back to the app default.
    pub fn subscription_key(&self) -> &str {
        self.api_key
            .as_ref()
            .map_or(DEFAULT_SUBSCRIPTION_KEY, |key| key.expose_secret())
    }
}

/// A bearer token plus the instant after which it must not be used.
///
/// Replaced wholesale on refresh, never partially updated.
#[derive(Debug, Clone)]
pub struct Token {
    access_token: SecretString,
    expires_at: DateTime<Utc>,
}

impl Token {
    pub fn new(access_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token: SecretString::from(access_token.into()),
            expires_at,
        }
    }

    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// A token is usable while its (margin-adjusted) expiry lies ahead of `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}

/// `POST /Token` response body.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Obtains bearer tokens via the password grant.
#[derive(Debug, Clone)]
pub struct Authenticator {
    http: reqwest::Client,
    token_url: Url,
    username: String,
    password: SecretString,
    margin: TimeDelta,
}

impl Authenticator {
    /// `http` must already carry the subscription key default header.
    pub fn new(http: reqwest::Client, base_url: &Url, credentials: &Credentials) -> Result<Self, Error> {
        Ok(Self {
            http,
            token_url: base_url.join("Token")?,
            username: credentials.username.clone(),
            password: credentials.password.clone(),
            margin: TimeDelta::seconds(DEFAULT_TOKEN_MARGIN_SECS),
        })
    }

    /// Override the safety margin subtracted from the token lifetime.
    pub fn with_margin(mut self, margin: TimeDelta) -> Self {
        self.margin = margin;
        self
    }

    /// Log in with the password grant and return a fresh token.
    ///
    /// `expires_at = now + expires_in - margin`.
    pub async fn authenticate(&self) -> Result<Token, Error> {
        debug!("requesting token at {}", self.token_url);

        let form = [
            ("grant_type", "password"),
            ("username", self.username.as_str()),
            ("password", self.password.expose_secret()),
        ];

        let resp = self
            .http
            .post(self.token_url.clone())
            .form(&form)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(Error::Authentication {
                message: format!("token request failed (HTTP {status}): {}", preview(&body)),
            });
        }

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| Error::Authentication {
                message: format!("malformed token response: {e}"),
            })?;

        if parsed.access_token.is_empty() {
            return Err(Error::Authentication {
                message: "token response carried an empty access_token".into(),
            });
        }

        let lifetime = TimeDelta::seconds(parsed.expires_in.max(0));
        let expires_at = Utc::now() + lifetime - self.margin;
        debug!(%expires_at, "token acquired");

        Ok(Token::new(parsed.access_token, expires_at))
    }

    /// Return `token` untouched while it is fresh, otherwise log in again.
    pub async fn ensure_valid(&self, token: Token) -> Result<Token, Error> {
        if token.is_valid() {
            return Ok(token);
        }
        debug!("token expired, re-authenticating");
        self.authenticate().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_token_is_invalid() {
        let token = Token::new("t", Utc::now() - TimeDelta::seconds(1));
        assert!(!token.is_valid());
    }

    #[test]
    fn token_valid_until_expiry() {
        let now = Utc::now();
        let token = Token::new("t", now + TimeDelta::seconds(30));
        assert!(token.is_valid_at(now));
        assert!(!token.is_valid_at(now + TimeDelta::seconds(30)));
    }

    #[test]
    fn subscription_key_falls_back_to_default() {
        let creds = Credentials::new("user", SecretString::from("pw".to_owned()));
        assert_eq!(creds.subscription_key(), DEFAULT_SUBSCRIPTION_KEY);

        let creds = creds.with_api_key(SecretString::from("custom".to_owned()));
        assert_eq!(creds.subscription_key(), "custom");
    }

    #[test]
    fn token_debug_redacts_secret() {
        let token = Token::new("super-secret", Utc::now());
        assert!(!format!("{token:?}").contains("super-secret"));
    }
}
