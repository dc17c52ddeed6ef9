// ── Device identity ──
//
// Registry metadata a host attaches to every entity of one unit.

use flexit_api::DeviceInfo;
use serde::Serialize;

pub const MANUFACTURER: &str = "Flexit";

/// Host-facing description of the unit, derived from [`DeviceInfo`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceIdentity {
    pub name: String,
    pub manufacturer: &'static str,
    pub model: String,
    pub sw_version: String,
    /// `(namespace, value)` pairs; the first one is the host-assigned unique id.
    pub identifiers: Vec<(String, String)>,
}

impl DeviceIdentity {
    pub fn new(name: impl Into<String>, unique_id: impl Into<String>, info: &DeviceInfo) -> Self {
        let or_empty = |v: Option<&str>| v.unwrap_or_default().to_owned();
        Self {
            name: name.into(),
            manufacturer: MANUFACTURER,
            model: or_empty(info.model_name.as_deref()),
            sw_version: or_empty(info.fw.as_deref()),
            identifiers: vec![
                ("flexit".into(), unique_id.into()),
                ("modelInfo".into(), or_empty(info.model_info.as_deref())),
                ("serialInfo".into(), or_empty(info.serial_info.as_deref())),
                (
                    "applicationSoftwareVersion".into(),
                    or_empty(info.application_software_version.as_deref()),
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_become_empty_strings() {
        let info = DeviceInfo {
            model_name: Some("Nordic S3".into()),
            ..DeviceInfo::default()
        };
        let id = DeviceIdentity::new("Living room", "PLANT1", &info);

        assert_eq!(id.manufacturer, "Flexit");
        assert_eq!(id.model, "Nordic S3");
        assert_eq!(id.sw_version, "");
        assert_eq!(id.identifiers[0], ("flexit".to_owned(), "PLANT1".to_owned()));
        assert_eq!(id.identifiers[2].1, "");
    }
}
