// ── Domain model ──

pub mod identity;
pub mod mode;
pub mod state;

pub use identity::{DeviceIdentity, MANUFACTURER};
pub use mode::{Mode, ReportedMode};
pub use state::DeviceState;
