//! Polling coordinator between `flexit-api` and hosts (CLI, home automation).
//!
//! - **[`Flexit`]**: session facade. [`connect()`](Flexit::connect)
//!   authenticates, resolves the plant and loads the first snapshot;
//!   [`spawn_refresh()`](Flexit::spawn_refresh) keeps it current in the
//!   background. [`Flexit::oneshot()`](Flexit::oneshot) serves single CLI
//!   invocations.
//!
//! - **[`DeviceState`]**: immutable snapshot of the last point fetch,
//!   replaced wholesale and handed to readers through a `watch` channel.
//!
//! - **[`Mode`]**: ventilation mode names and their device codes.

pub mod config;
pub mod controller;
pub mod error;
pub mod model;

pub use config::{DEFAULT_DEVICE_NAME, DEFAULT_UPDATE_INTERVAL, FlexitConfig, TlsVerification};
pub use controller::{ConnectionState, Flexit, MAX_SETPOINT, MIN_SETPOINT};
pub use error::FlexitError;
pub use model::{DeviceIdentity, DeviceState, MANUFACTURER, Mode, ReportedMode};

pub use flexit_api::DeviceInfo;
