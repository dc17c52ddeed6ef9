// flexit-api: Async Rust client for the Flexit / Climatix IC cloud API

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod points;
pub mod transport;

pub use auth::{Authenticator, Credentials, DEFAULT_SUBSCRIPTION_KEY, Token};
pub use client::{API_URL, ApiClient};
pub use error::Error;
pub use models::{DataPoint, DeviceInfo, Plant, PointMap, PointValue};
pub use transport::{TlsMode, TransportConfig};
