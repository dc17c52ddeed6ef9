// Climatix IC HTTP client
//
// Wraps `reqwest::Client` with bearer-token management, plant resolution
// and the batched data point endpoints. Every authenticated request goes
// through `send_authorized`, which checks token freshness first and retries
// exactly once after a 401.

use std::time::Duration;

use chrono::TimeDelta;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};
use url::Url;

use crate::auth::{Authenticator, Credentials, Token};
use crate::error::{Error, preview};
use crate::models::{
    DeviceInfo, PlantsResponse, PointMap, PointValue, ValuesResponse, WriteRequest, build_filter,
};
use crate::points;
use crate::transport::{SUBSCRIPTION_KEY_HEADER, TransportConfig};

/// Production API root.
pub const API_URL: &str = "https://api.climatixic.com";

/// Async client for the Flexit cloud (Climatix IC) API.
///
/// Owns the HTTP session, the current bearer token and the cached plant id.
/// Methods take `&self`; the token sits behind an async mutex so a login is
/// never raced by a second one.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    auth: Authenticator,
    token: Mutex<Option<Token>>,
    plant_id: OnceCell<String>,
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client for `base_url` (usually [`API_URL`]).
    ///
    /// Injects the `Ocp-Apim-Subscription-Key` header on every request.
    pub fn new(
        base_url: &str,
        credentials: &Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(credentials.subscription_key()).map_err(|e| {
            Error::Authentication {
                message: format!("invalid subscription key header value: {e}"),
            }
        })?;
        key.set_sensitive(true);
        headers.insert(SUBSCRIPTION_KEY_HEADER, key);

        let http = transport.build_client_with_headers(headers)?;
        Self::with_client(base_url, http, credentials)
    }

    /// Wrap an existing `reqwest::Client` (caller manages default headers).
    pub fn with_client(
        base_url: &str,
        http: reqwest::Client,
        credentials: &Credentials,
    ) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        let auth = Authenticator::new(http.clone(), &base_url, credentials)?;
        Ok(Self {
            http,
            base_url,
            auth,
            token: Mutex::new(None),
            plant_id: OnceCell::new(),
        })
    }

    /// Override the safety margin subtracted from token lifetimes.
    pub fn with_token_margin(mut self, margin: Duration) -> Self {
        let margin = TimeDelta::from_std(margin).unwrap_or(TimeDelta::zero());
        self.auth = self.auth.with_margin(margin);
        self
    }

    /// Ensure the base URL ends with `/` so relative joins append.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.auth
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── Token management ─────────────────────────────────────────────

    /// Current token, logging in first if none is cached or it has expired.
    pub async fn token(&self) -> Result<Token, Error> {
        let mut guard = self.token.lock().await;
        let token = match guard.take() {
            Some(current) => self.auth.ensure_valid(current).await?,
            None => self.auth.authenticate().await?,
        };
        *guard = Some(token.clone());
        Ok(token)
    }

    /// Drop the cached token and log in again unconditionally.
    async fn reauthenticate(&self) -> Result<Token, Error> {
        let mut guard = self.token.lock().await;
        *guard = None;
        let token = self.auth.authenticate().await?;
        *guard = Some(token.clone());
        Ok(token)
    }

    /// Send an authenticated request built by `build`.
    ///
    /// A 401 triggers one forced re-login and one resend; whatever the second
    /// attempt returns is handed back, including another 401.
    async fn send_authorized<F>(&self, build: F) -> Result<reqwest::Response, Error>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let token = self.token().await?;
        let resp = build(&self.http)
            .bearer_auth(token.access_token())
            .send()
            .await?;

        if resp.status() != StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }

        debug!("request rejected with 401, re-authenticating once");
        let token = self.reauthenticate().await?;
        let resp = build(&self.http)
            .bearer_auth(token.access_token())
            .send()
            .await?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            warn!("request still unauthorized after re-authentication");
        }
        Ok(resp)
    }

    /// Authenticated GET, decoding a JSON body or mapping non-2xx to `Error::Api`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        debug!("GET {url}");
        let resp = self
            .send_authorized(|http| http.get(url.clone()).query(params))
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: preview(&body).to_owned(),
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }

    // ── Plant ────────────────────────────────────────────────────────

    /// The account's plant id: first entry of `GET /Plants`.
    ///
    /// Resolved once, then served from cache for the life of the client.
    pub async fn resolve_plant(&self) -> Result<String, Error> {
        self.plant_id
            .get_or_try_init(|| async {
                let url = self.url("Plants")?;
                debug!("resolving plant");
                let resp: PlantsResponse = self.get_json(url, &[]).await?;
                let plant = resp.into_plants().into_iter().next().ok_or(Error::NoPlant)?;
                debug!(plant_id = %plant.id, "plant resolved");
                Ok::<_, Error>(plant.id)
            })
            .await
            .cloned()
    }

    /// Cached plant id, if [`resolve_plant`](Self::resolve_plant) has succeeded.
    pub fn plant_id(&self) -> Option<&str> {
        self.plant_id.get().map(String::as_str)
    }

    // ── Data points ──────────────────────────────────────────────────

    /// Read `paths` in one batched request.
    ///
    /// `GET /DataPoints/Values?filterId=[{"DataPoints":"<plant><path>"},...]`
    pub async fn fetch_points(&self, plant_id: &str, paths: &[&str]) -> Result<PointMap, Error> {
        let url = self.url("DataPoints/Values")?;
        let filter = build_filter(plant_id, paths);
        debug!(count = paths.len(), "fetching data points");

        let resp: ValuesResponse = self.get_json(url, &[("filterId", filter)]).await?;
        Ok(resp.into_points(plant_id))
    }

    /// Write a single point.
    ///
    /// `PUT /DataPoints/<escaped plant+path>` with `{"Value": "<value>"}`.
    pub async fn write_point(
        &self,
        plant_id: &str,
        path: &str,
        value: &PointValue,
    ) -> Result<(), Error> {
        let id = points::point_id(plant_id, path);
        let escaped: String = url::form_urlencoded::byte_serialize(id.as_bytes()).collect();
        let url = self.url(&format!("DataPoints/{escaped}"))?;
        let body = WriteRequest {
            value: value.to_string(),
        };
        debug!("PUT {url}");

        let resp = self
            .send_authorized(|http| http.put(url.clone()).json(&body))
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let text = resp.text().await.unwrap_or_default();
        Err(Error::Write {
            path: path.to_owned(),
            status: status.as_u16(),
            message: preview(&text).to_owned(),
        })
    }

    /// Read the device metadata points and collect them into [`DeviceInfo`].
    pub async fn fetch_device_info(&self, plant_id: &str) -> Result<DeviceInfo, Error> {
        let points = self
            .fetch_points(plant_id, points::DEVICE_INFO_POINTS)
            .await?;
        Ok(DeviceInfo::from_points(&points))
    }
}
