// ── Flexit session ──
//
// Lifecycle management for one Flexit cloud account: authentication,
// plant lookup, periodic refresh and writes. Readers observe snapshots
// through watch channels and never block on the network.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OnceCell, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use flexit_api::points;
use flexit_api::transport::{TlsMode, TransportConfig};
use flexit_api::{ApiClient, Credentials, DeviceInfo, PointValue};

use crate::config::{FlexitConfig, TlsVerification};
use crate::error::FlexitError;
use crate::model::{DeviceIdentity, DeviceState, Mode};

/// Lowest setpoint the unit accepts, °C.
pub const MIN_SETPOINT: f64 = 10.0;
/// Highest setpoint the unit accepts, °C.
pub const MAX_SETPOINT: f64 = 30.0;

// ── ConnectionState ──────────────────────────────────────────────

/// Session state observable by consumers.
///
/// `Uninitialized → Authenticating → Resolving → Ready ⇄ Refreshing`,
/// with `Failed` when initial setup does not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Uninitialized,
    Authenticating,
    Resolving,
    Ready,
    Refreshing,
    Failed,
}

// ── Flexit ───────────────────────────────────────────────────────

/// The main entry point for hosts.
///
/// Cheaply cloneable via `Arc<FlexitInner>`. Owns the API client, the
/// latest [`DeviceState`] and [`DeviceInfo`] snapshots, and the optional
/// background refresh task.
#[derive(Clone)]
pub struct Flexit {
    inner: Arc<FlexitInner>,
}

struct FlexitInner {
    config: FlexitConfig,
    client: OnceCell<ApiClient>,
    connection_state: watch::Sender<ConnectionState>,
    state: watch::Sender<Arc<DeviceState>>,
    device_info: watch::Sender<Arc<DeviceInfo>>,
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
    /// Cause of the last failed `connect()`, replayed while `Failed`.
    setup_error: Mutex<Option<FlexitError>>,
    cancel: CancellationToken,
    /// Child token for the current refresh task; replaced on shutdown so
    /// a later `spawn_refresh` starts clean.
    cancel_child: Mutex<CancellationToken>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Flexit {
    /// Create a session from configuration. Does NOT connect; call
    /// [`connect()`](Self::connect) to authenticate and load the first snapshot.
    pub fn new(config: FlexitConfig) -> Self {
        let (connection_state, _) = watch::channel(ConnectionState::Uninitialized);
        let (state, _) = watch::channel(Arc::new(DeviceState::default()));
        let (device_info, _) = watch::channel(Arc::new(DeviceInfo::default()));
        let (last_refresh, _) = watch::channel(None);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(FlexitInner {
                config,
                client: OnceCell::new(),
                connection_state,
                state,
                device_info,
                last_refresh,
                setup_error: Mutex::new(None),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &FlexitConfig {
        &self.inner.config
    }

    /// The API client, built on first use.
    async fn client(&self) -> Result<&ApiClient, FlexitError> {
        self.inner
            .client
            .get_or_try_init(|| async { build_client(&self.inner.config) })
            .await
    }

    /// A session whose setup failed does no further work until `connect()`
    /// succeeds again.
    async fn ensure_usable(&self) -> Result<(), FlexitError> {
        if *self.inner.connection_state.borrow() != ConnectionState::Failed {
            return Ok(());
        }
        let cause = self
            .inner
            .setup_error
            .lock()
            .await
            .clone()
            .unwrap_or_else(|| FlexitError::Config {
                message: "setup failed".into(),
            });
        Err(FlexitError::NotReady(Box::new(cause)))
    }

    async fn plant(&self) -> Result<(&ApiClient, String), FlexitError> {
        let client = self.client().await?;
        let plant_id = client.resolve_plant().await?;
        Ok((client, plant_id))
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Authenticate, resolve the plant, then load device info and the
    /// first point snapshot.
    ///
    /// Any failure leaves the session `Failed` and is returned wrapped in
    /// [`FlexitError::NotReady`]. While `Failed`, refreshes and writes are
    /// refused with the same error until a later `connect()` succeeds. Spawns the refresh task when the
    /// configured update interval is non-zero.
    pub async fn connect(&self) -> Result<(), FlexitError> {
        match self.setup().await {
            Ok(plant_id) => {
                self.inner
                    .connection_state
                    .send_replace(ConnectionState::Ready);
                info!(%plant_id, "connected to Flexit cloud");
            }
            Err(e) => {
                *self.inner.setup_error.lock().await = Some(e.clone());
                self.inner
                    .connection_state
                    .send_replace(ConnectionState::Failed);
                warn!(error = %e, "Flexit setup failed");
                return Err(FlexitError::NotReady(Box::new(e)));
            }
        }

        let interval = self.inner.config.update_interval;
        if !interval.is_zero() {
            self.spawn_refresh(interval).await;
        }
        Ok(())
    }

    async fn setup(&self) -> Result<String, FlexitError> {
        self.inner
            .connection_state
            .send_replace(ConnectionState::Authenticating);
        let client = self.client().await?;
        client.token().await?;

        self.inner
            .connection_state
            .send_replace(ConnectionState::Resolving);
        let plant_id = client.resolve_plant().await?;

        self.update_device_info().await?;
        self.update_data().await?;
        Ok(plant_id)
    }

    /// Start the periodic refresh task. A zero interval is ignored.
    pub async fn spawn_refresh(&self, interval: Duration) {
        if interval.is_zero() {
            debug!("refresh interval is zero, not spawning refresh task");
            return;
        }
        let cancel = self.inner.cancel_child.lock().await.clone();
        let handle = tokio::spawn(refresh_task(self.clone(), interval, cancel));
        self.inner.task_handles.lock().await.push(handle);
        debug!(?interval, "refresh task spawned");
    }

    /// Stop background tasks and wait for them to finish.
    ///
    /// An in-flight refresh is dropped; its result is never published.
    pub async fn shutdown(&self) {
        {
            let mut child = self.inner.cancel_child.lock().await;
            child.cancel();
            *child = self.inner.cancel.child_token();
        }

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        self.inner
            .connection_state
            .send_replace(ConnectionState::Uninitialized);
        debug!("Flexit session shut down");
    }

    /// One-shot: connect, run closure, shut down.
    ///
    /// The refresh task is never spawned since a single command needs only
    /// one snapshot.
    pub async fn oneshot<F, Fut, T>(config: FlexitConfig, f: F) -> Result<T, FlexitError>
    where
        F: FnOnce(Flexit) -> Fut,
        Fut: std::future::Future<Output = Result<T, FlexitError>>,
    {
        let mut cfg = config;
        cfg.update_interval = Duration::ZERO;

        let flexit = Flexit::new(cfg);
        flexit.connect().await?;
        let result = f(flexit.clone()).await;
        flexit.shutdown().await;
        result
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Re-read device metadata and publish it.
    pub async fn update_device_info(&self) -> Result<Arc<DeviceInfo>, FlexitError> {
        self.ensure_usable().await?;
        let (client, plant_id) = self.plant().await?;
        let info = Arc::new(client.fetch_device_info(&plant_id).await?);
        self.inner.device_info.send_replace(Arc::clone(&info));
        debug!(model = ?info.model_name, "device info updated");
        Ok(info)
    }

    /// Fetch the sensor points and publish a new [`DeviceState`].
    ///
    /// On failure the previous snapshot stays in place and the error is
    /// returned to the caller.
    pub async fn update_data(&self) -> Result<Arc<DeviceState>, FlexitError> {
        self.ensure_usable().await?;
        let (client, plant_id) = self.plant().await?;

        self.inner.connection_state.send_if_modified(|s| {
            let ready = *s == ConnectionState::Ready;
            if ready {
                *s = ConnectionState::Refreshing;
            }
            ready
        });

        let result = client.fetch_points(&plant_id, points::SENSOR_POINTS).await;

        self.inner.connection_state.send_if_modified(|s| {
            let refreshing = *s == ConnectionState::Refreshing;
            if refreshing {
                *s = ConnectionState::Ready;
            }
            refreshing
        });

        let snapshot = Arc::new(DeviceState::from_points(&result?));
        self.inner.state.send_replace(Arc::clone(&snapshot));
        self.inner.last_refresh.send_replace(Some(Utc::now()));
        debug!(mode = ?snapshot.mode(), "device state updated");
        Ok(snapshot)
    }

    // ── Writes ───────────────────────────────────────────────────

    /// Request a ventilation mode by name. Returns the code written.
    ///
    /// Unknown names fail with [`FlexitError::InvalidMode`] before any
    /// request is made. The cached snapshot is not touched; the next
    /// refresh reports the new mode.
    pub async fn set_mode(&self, name: &str) -> Result<u8, FlexitError> {
        self.ensure_usable().await?;
        let code = Mode::code_of(name)?;
        let (client, plant_id) = self.plant().await?;
        client
            .write_point(&plant_id, points::MODE_PUT, &PointValue::from(code))
            .await?;
        info!(mode = name, code, "mode set");
        Ok(code)
    }

    pub async fn set_home_temperature(&self, celsius: f64) -> Result<(), FlexitError> {
        self.write_setpoint(points::HOME_AIR_TEMPERATURE, celsius)
            .await
    }

    pub async fn set_away_temperature(&self, celsius: f64) -> Result<(), FlexitError> {
        self.write_setpoint(points::AWAY_AIR_TEMPERATURE, celsius)
            .await
    }

    async fn write_setpoint(&self, path: &str, celsius: f64) -> Result<(), FlexitError> {
        self.ensure_usable().await?;
        if !celsius.is_finite() || !(MIN_SETPOINT..=MAX_SETPOINT).contains(&celsius) {
            return Err(FlexitError::InvalidSetpoint {
                value: celsius,
                min: MIN_SETPOINT,
                max: MAX_SETPOINT,
            });
        }
        let (client, plant_id) = self.plant().await?;
        client
            .write_point(&plant_id, path, &PointValue::from(celsius))
            .await?;
        info!(path, celsius, "setpoint written");
        Ok(())
    }

    // ── State observation ────────────────────────────────────────

    /// Latest snapshot. Empty until the first successful fetch.
    pub fn state(&self) -> Arc<DeviceState> {
        Arc::clone(&self.inner.state.borrow())
    }

    /// Subscribe to snapshot replacements.
    pub fn subscribe(&self) -> watch::Receiver<Arc<DeviceState>> {
        self.inner.state.subscribe()
    }

    pub fn device_info(&self) -> Arc<DeviceInfo> {
        Arc::clone(&self.inner.device_info.borrow())
    }

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// When the current snapshot was fetched.
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.inner.last_refresh.borrow()
    }

    /// Resolved plant id, once known.
    pub fn plant_id(&self) -> Option<String> {
        self.inner
            .client
            .get()
            .and_then(ApiClient::plant_id)
            .map(str::to_owned)
    }

    /// Registry identity for host entities, named after the configured
    /// device name and keyed by the plant id.
    pub fn identity(&self) -> DeviceIdentity {
        let unique_id = self.plant_id().unwrap_or_default();
        DeviceIdentity::new(
            self.inner.config.name.clone(),
            unique_id,
            &self.device_info(),
        )
    }
}

// ── Helpers ──────────────────────────────────────────────────────

fn build_transport(config: &FlexitConfig) -> TransportConfig {
    TransportConfig {
        tls: match &config.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        },
        timeout: config.timeout,
    }
}

fn build_client(config: &FlexitConfig) -> Result<ApiClient, FlexitError> {
    let mut credentials = Credentials::new(config.username.clone(), config.password.clone());
    if let Some(key) = &config.api_key {
        credentials = credentials.with_api_key(key.clone());
    }
    let client = ApiClient::new(&config.api_url, &credentials, &build_transport(config))?
        .with_token_margin(config.token_margin);
    Ok(client)
}

/// Periodically refresh the device state.
///
/// Each refresh is raced against cancellation so shutdown never waits on
/// a slow request.
async fn refresh_task(flexit: Flexit, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    result = flexit.update_data() => {
                        if let Err(e) = result {
                            warn!(error = %e, "periodic refresh failed");
                        }
                    }
                }
            }
        }
    }
    debug!("refresh task stopped");
}
