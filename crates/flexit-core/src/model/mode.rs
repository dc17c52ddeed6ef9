// ── Ventilation mode ──
//
// The unit reports its mode as a small integer on one point and accepts
// the requested mode on another. Names are what the host and users see.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoEnumIterator};

use crate::error::FlexitError;

/// Operating profile of the ventilation unit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Mode {
    Away,
    Home,
    High,
    #[serde(rename = "Cooker hood")]
    #[strum(serialize = "Cooker hood", serialize = "CookerHood", serialize = "cooker_hood")]
    CookerHood,
}

impl Mode {
    /// Device-level code written to the mode point.
    pub fn code(self) -> u8 {
        match self {
            Self::Away => 1,
            Self::Home => 2,
            Self::High => 3,
            Self::CookerHood => 4,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::iter().find(|mode| i64::from(mode.code()) == code)
    }

    /// Human name as shown to users.
    pub fn name(self) -> &'static str {
        match self {
            Self::Away => "Away",
            Self::Home => "Home",
            Self::High => "High",
            Self::CookerHood => "Cooker hood",
        }
    }

    /// Name → code. Unknown names are rejected.
    pub fn code_of(name: &str) -> Result<u8, FlexitError> {
        name.trim()
            .parse::<Self>()
            .map(Self::code)
            .map_err(|_| FlexitError::InvalidMode {
                name: name.to_owned(),
            })
    }

    /// Code → name, `None` for codes the firmware may add later.
    pub fn name_of(code: i64) -> Option<&'static str> {
        Self::from_code(code).map(Self::name)
    }

    /// All selectable names, in code order.
    pub fn names() -> Vec<&'static str> {
        Self::iter().map(Self::name).collect()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Mode as read back from the unit. Unrecognised codes are kept, not rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReportedMode {
    Known(Mode),
    Unknown(i64),
}

impl ReportedMode {
    pub fn from_code(code: i64) -> Self {
        Mode::from_code(code).map_or(Self::Unknown(code), Self::Known)
    }
}

impl fmt::Display for ReportedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(mode) => mode.fmt(f),
            Self::Unknown(code) => write!(f, "Unknown ({code})"),
        }
    }
}
