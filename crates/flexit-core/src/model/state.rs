// ── Device state snapshot ──
//
// Built from one batched read and never mutated afterwards. A refresh
// produces a new snapshot that replaces the old one wholesale.

use flexit_api::points;
use flexit_api::{PointMap, PointValue};
use serde::Serialize;

use super::mode::ReportedMode;

/// Typed view of the last successful point fetch.
///
/// Every field is optional: a point that was missing from the response or
/// could not be coerced reads as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceState {
    home_temperature: Option<f64>,
    away_temperature: Option<f64>,
    room_temperature: Option<f64>,
    outside_temperature: Option<f64>,
    supply_temperature: Option<f64>,
    extract_temperature: Option<f64>,
    exhaust_temperature: Option<f64>,
    mode: Option<ReportedMode>,
    filter_operating_time: Option<u32>,
    filter_time_for_exchange: Option<u32>,
    heater_enabled: Option<bool>,
}

fn raw<'a>(map: &'a PointMap, path: &str) -> Option<&'a PointValue> {
    map.get(path).and_then(|p| p.value.as_ref())
}

/// Reading scaled by the path's registered divisor.
fn scaled(map: &PointMap, path: &str) -> Option<f64> {
    let divisor = points::divisor(path)?;
    raw(map, path)?
        .as_f64()
        .filter(|v| v.is_finite())
        .map(|v| v / divisor)
}

fn hours(map: &PointMap, path: &str) -> Option<u32> {
    let value = scaled(map, path)?;
    #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
    let rounded = value.round() as i64;
    u32::try_from(rounded).ok()
}

impl DeviceState {
    /// Decode a batched read. Pure: never fails, never touches prior state.
    pub fn from_points(map: &PointMap) -> Self {
        Self {
            home_temperature: scaled(map, points::HOME_AIR_TEMPERATURE),
            away_temperature: scaled(map, points::AWAY_AIR_TEMPERATURE),
            room_temperature: scaled(map, points::ROOM_TEMPERATURE),
            outside_temperature: scaled(map, points::OUTSIDE_AIR_TEMPERATURE),
            supply_temperature: scaled(map, points::SUPPLY_AIR_TEMPERATURE),
            extract_temperature: scaled(map, points::EXTRACT_AIR_TEMPERATURE),
            exhaust_temperature: scaled(map, points::EXHAUST_AIR_TEMPERATURE),
            mode: raw(map, points::MODE)
                .and_then(PointValue::as_i64)
                .map(ReportedMode::from_code),
            filter_operating_time: hours(map, points::FILTER_OPERATING_TIME),
            filter_time_for_exchange: hours(map, points::FILTER_TIME_FOR_EXCHANGE),
            heater_enabled: raw(map, points::HEATER).and_then(PointValue::as_bool),
        }
    }

    pub fn home_temperature(&self) -> Option<f64> {
        self.home_temperature
    }

    pub fn away_temperature(&self) -> Option<f64> {
        self.away_temperature
    }

    pub fn room_temperature(&self) -> Option<f64> {
        self.room_temperature
    }

    pub fn outside_temperature(&self) -> Option<f64> {
        self.outside_temperature
    }

    pub fn supply_temperature(&self) -> Option<f64> {
        self.supply_temperature
    }

    pub fn extract_temperature(&self) -> Option<f64> {
        self.extract_temperature
    }

    pub fn exhaust_temperature(&self) -> Option<f64> {
        self.exhaust_temperature
    }

    pub fn mode(&self) -> Option<ReportedMode> {
        self.mode
    }

    /// Hours the current filter has been in service.
    pub fn filter_operating_time(&self) -> Option<u32> {
        self.filter_operating_time
    }

    /// Hours remaining until the filter should be exchanged.
    pub fn filter_time_for_exchange(&self) -> Option<u32> {
        self.filter_time_for_exchange
    }

    pub fn heater_enabled(&self) -> Option<bool> {
        self.heater_enabled
    }

    /// `true` once the exchange countdown has run out.
    pub fn filter_exchange_due(&self) -> Option<bool> {
        self.filter_time_for_exchange.map(|remaining| remaining == 0)
    }

    /// `true` for a snapshot no fetch has populated yet.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
