// Wire types for the Climatix IC API
//
// Responses come in two shapes depending on the gateway revision: a flat
// array of `{path, value}` entries, or a map keyed by point id whose values
// nest the reading one level deeper. Both are accepted and normalised into
// `DataPoint`s keyed by bare path.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::points;

// ── Values ───────────────────────────────────────────────────────────

/// Raw value of a data point as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl PointValue {
    /// Numeric view. Text is parsed, booleans map to 0/1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        }
    }

    /// Integer view. Fractional or out-of-range readings are `None`.
    #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
    pub fn as_i64(&self) -> Option<i64> {
        const LIMIT: f64 = 9_007_199_254_740_992.0; // 2^53
        self.as_f64()
            .filter(|n| n.is_finite() && n.fract() == 0.0 && n.abs() <= LIMIT)
            .map(|n| n as i64)
    }

    /// Binary view: non-zero numbers and the usual "on" spellings are `true`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Number(n) => Some(*n != 0.0),
            Self::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "active" => Some(true),
                "0" | "false" | "off" | "inactive" => Some(false),
                other => other.parse::<f64>().ok().map(|n| n != 0.0),
            },
        }
    }

    pub fn as_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PointValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for PointValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u8> for PointValue {
    fn from(value: u8) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for PointValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// A single reading, keyed by its bare path (plant prefix stripped).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPoint {
    pub path: String,
    pub value: Option<PointValue>,
}

/// Batched read result: bare path → reading.
pub type PointMap = HashMap<String, DataPoint>;

// ── Plants ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Plant {
    #[serde(alias = "Id", alias = "plantId")]
    pub id: String,
}

/// `GET /Plants` accepts either a bare array or the `{items: [...]}` envelope.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum PlantsResponse {
    List(Vec<Plant>),
    Envelope {
        #[serde(alias = "Items")]
        items: Vec<Plant>,
    },
}

impl PlantsResponse {
    pub(crate) fn into_plants(self) -> Vec<Plant> {
        match self {
            Self::List(plants) | Self::Envelope { items: plants } => plants,
        }
    }
}

// ── Batched reads ────────────────────────────────────────────────────

/// One element of the filter query: `{"DataPoints": "<plant><path>"}`.
#[derive(Serialize)]
struct FilterEntry {
    #[serde(rename = "DataPoints")]
    data_points: String,
}

/// Build the `filterId` query value selecting `paths` for `plant_id`.
pub(crate) fn build_filter(plant_id: &str, paths: &[&str]) -> String {
    let entries: Vec<FilterEntry> = paths
        .iter()
        .map(|path| FilterEntry {
            data_points: points::point_id(plant_id, path),
        })
        .collect();
    // Serializing a Vec of plain structs cannot fail.
    serde_json::to_string(&entries).unwrap_or_default()
}

#[derive(Deserialize)]
pub(crate) struct ListEntry {
    #[serde(alias = "pointId", alias = "PointId", alias = "Path", alias = "id")]
    path: String,
    #[serde(default, alias = "Value")]
    value: Option<ValueField>,
}

#[derive(Deserialize)]
pub(crate) struct MapEntry {
    #[serde(default, alias = "Value")]
    value: Option<ValueField>,
}

/// The reading is either given directly or wrapped in another `{value}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ValueField {
    Plain(PointValue),
    Wrapped {
        #[serde(default, alias = "Value")]
        value: Option<PointValue>,
    },
}

impl ValueField {
    fn into_value(self) -> Option<PointValue> {
        match self {
            Self::Plain(v) => Some(v),
            Self::Wrapped { value } => value,
        }
    }
}

/// `GET /DataPoints/Values` response in either supported shape.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum ValuesResponse {
    List(Vec<ListEntry>),
    Map {
        #[serde(alias = "Values")]
        values: HashMap<String, MapEntry>,
    },
}

impl ValuesResponse {
    /// Normalise into a [`PointMap`], stripping the plant prefix from ids.
    pub(crate) fn into_points(self, plant_id: &str) -> PointMap {
        let entries: Vec<(String, Option<PointValue>)> = match self {
            Self::List(list) => list
                .into_iter()
                .map(|e| (e.path, e.value.and_then(ValueField::into_value)))
                .collect(),
            Self::Map { values } => values
                .into_iter()
                .map(|(id, e)| (id, e.value.and_then(ValueField::into_value)))
                .collect(),
        };

        entries
            .into_iter()
            .map(|(id, value)| {
                let path = id.strip_prefix(plant_id).unwrap_or(&id).to_owned();
                (path.clone(), DataPoint { path, value })
            })
            .collect()
    }
}

// ── Writes ───────────────────────────────────────────────────────────

/// `PUT /DataPoints/<id>` body. The gateway wants the value as a string.
#[derive(Debug, Serialize)]
pub(crate) struct WriteRequest {
    #[serde(rename = "Value")]
    pub value: String,
}

// ── Device info ──────────────────────────────────────────────────────

/// Identity and health metadata of the ventilation unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub model_name: Option<String>,
    pub model_info: Option<String>,
    pub serial_info: Option<String>,
    pub application_software_version: Option<String>,
    pub fw: Option<String>,
    pub description: Option<String>,
    pub online_status: Option<String>,
    pub system_status: Option<String>,
    pub last_restart_reason: Option<String>,
}

impl DeviceInfo {
    /// Pick the device-info fields out of a batched read. Missing points stay `None`.
    pub fn from_points(map: &PointMap) -> Self {
        let text = |path: &str| {
            map.get(path)
                .and_then(|p| p.value.as_ref())
                .map(PointValue::as_text)
        };
        Self {
            model_name: text(points::MODEL_NAME),
            model_info: text(points::MODEL_INFORMATION),
            serial_info: text(points::SERIAL_NUMBER),
            application_software_version: text(points::APPLICATION_SOFTWARE_VERSION),
            fw: text(points::FIRMWARE_REVISION),
            description: text(points::DEVICE_DESCRIPTION),
            online_status: text(points::OFFLINE_ONLINE),
            system_status: text(points::SYSTEM_STATUS),
            last_restart_reason: text(points::LAST_RESTART_REASON),
        }
    }
}
