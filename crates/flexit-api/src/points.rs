// Point path registry
//
// Climatix addresses every device register with an opaque path suffix that
// is appended to the plant id. These strings are a compatibility contract
// with the unit firmware and must stay byte-exact.

// ── Sensor / control points ──────────────────────────────────────────

pub const HOME_AIR_TEMPERATURE: &str = ";1!0020007CA000055";
pub const AWAY_AIR_TEMPERATURE: &str = ";1!0020007C1000055";
pub const ROOM_TEMPERATURE: &str = ";1!00000004B000055";
/// Current ventilation mode (read).
pub const MODE: &str = ";1!013000169000055";
/// Requested ventilation mode (write).
pub const MODE_PUT: &str = ";1!01300002A000055";
pub const OUTSIDE_AIR_TEMPERATURE: &str = ";1!000000001000055";
pub const SUPPLY_AIR_TEMPERATURE: &str = ";1!000000004000055";
pub const EXTRACT_AIR_TEMPERATURE: &str = ";1!00000003B000055";
pub const EXHAUST_AIR_TEMPERATURE: &str = ";1!00000000B000055";
pub const HEATER: &str = ";1!0050001BD000055";
pub const FILTER_OPERATING_TIME: &str = ";1!00200011D000055";
pub const FILTER_TIME_FOR_EXCHANGE: &str = ";1!00200011E000055";

// ── Device metadata points ───────────────────────────────────────────

pub const APPLICATION_SOFTWARE_VERSION: &str = ";0!0083FFFFF00000C";
pub const DEVICE_DESCRIPTION: &str = ";0!0083FFFFF00001C";
pub const MODEL_NAME: &str = ";0!0083FFFFF000046";
pub const MODEL_INFORMATION: &str = ";0!0083FFFFF0012DB";
pub const SERIAL_NUMBER: &str = ";0!0083FFFFF0013EC";
pub const FIRMWARE_REVISION: &str = ";0!0083FFFFF00002C";
pub const LAST_RESTART_REASON: &str = ";0!0083FFFFF0000C4";
pub const OFFLINE_ONLINE: &str = ";0!Online";
pub const SYSTEM_STATUS: &str = ";0!0083FFFFF000070";
pub const BACNET_MAC: &str = ";0!108000000001313";
pub const DEVICE_FEATURES: &str = ";0!0083FFFFF0013F4";

/// Points read on every poll cycle.
pub const SENSOR_POINTS: &[&str] = &[
    MODE,
    OUTSIDE_AIR_TEMPERATURE,
    SUPPLY_AIR_TEMPERATURE,
    EXTRACT_AIR_TEMPERATURE,
    EXHAUST_AIR_TEMPERATURE,
    HOME_AIR_TEMPERATURE,
    AWAY_AIR_TEMPERATURE,
    ROOM_TEMPERATURE,
    FILTER_OPERATING_TIME,
    FILTER_TIME_FOR_EXCHANGE,
    HEATER,
];

/// Points read for device identity, fetched at setup only.
pub const DEVICE_INFO_POINTS: &[&str] = &[
    APPLICATION_SOFTWARE_VERSION,
    DEVICE_DESCRIPTION,
    MODEL_NAME,
    MODEL_INFORMATION,
    SERIAL_NUMBER,
    FIRMWARE_REVISION,
    OFFLINE_ONLINE,
    SYSTEM_STATUS,
    LAST_RESTART_REASON,
];

/// Divisor turning the raw reading of a numeric point into its unit.
///
/// The Climatix gateway already reports engineering units (°C, hours), so
/// every known numeric point is listed here with a divisor of 1. Adding a
/// point that reports in tenths means adding an arm here, not changing a
/// global constant. Non-numeric points return `None`.
pub fn divisor(path: &str) -> Option<f64> {
    match path {
        HOME_AIR_TEMPERATURE
        | AWAY_AIR_TEMPERATURE
        | ROOM_TEMPERATURE
        | OUTSIDE_AIR_TEMPERATURE
        | SUPPLY_AIR_TEMPERATURE
        | EXTRACT_AIR_TEMPERATURE
        | EXHAUST_AIR_TEMPERATURE
        | FILTER_OPERATING_TIME
        | FILTER_TIME_FOR_EXCHANGE => Some(1.0),
        _ => None,
    }
}

/// Full point id as the API expects it: plant id followed by the path.
pub fn point_id(plant_id: &str, path: &str) -> String {
    format!("{plant_id}{path}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_numeric_sensor_point_has_a_divisor() {
        for path in SENSOR_POINTS {
            if [MODE, HEATER].contains(path) {
                assert!(divisor(path).is_none(), "{path} is not numeric");
            } else {
                assert!(divisor(path).is_some(), "{path} missing divisor");
            }
        }
    }

    #[test]
    fn point_id_prefixes_plant() {
        assert_eq!(point_id("P1", MODE), "P1;1!013000169000055");
    }

    #[test]
    fn read_and_write_mode_paths_differ() {
        assert_ne!(MODE, MODE_PUT);
    }
}
