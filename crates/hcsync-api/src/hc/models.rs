// Home Center REST API response types
//
// Models for the controller's JSON API. Fields use `#[serde(default)]`
// liberally because firmware versions disagree about field presence, and
// catch-all `extra` maps keep undocumented properties available.

use serde::{Deserialize, Deserializer, Serialize};

// ── Reference data ───────────────────────────────────────────────────

/// Device object from `GET /api/devices`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HcDevice {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub device_type: String,
    #[serde(rename = "roomID", default)]
    pub room_id: Option<u64>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Room object from `GET /api/rooms`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HcRoom {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "sectionID", default)]
    pub section_id: Option<u64>,
}

/// Section object from `GET /api/sections`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HcSection {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

// ── Refresh states (long poll) ───────────────────────────────────────

/// Response of `GET /api/refreshStates?last={token}`.
///
/// `changes` is optional here so the caller can tell a malformed poll
/// (key absent) from a quiet one (empty list).
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshStates {
    #[serde(default)]
    pub changes: Option<Vec<serde_json::Map<String, serde_json::Value>>>,
    /// Opaque continuation token for the next poll.
    #[serde(default)]
    pub last: Option<serde_json::Value>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

// ── Panel events ─────────────────────────────────────────────────────

/// Entry from `GET /api/panels/event`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HcEvent {
    pub id: u64,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(rename = "deviceID", default)]
    pub device_id: Option<u64>,
    #[serde(rename = "deviceType", default)]
    pub device_type: Option<String>,
    #[serde(rename = "propertyName", default)]
    pub property_name: Option<String>,
    #[serde(rename = "newValue", default)]
    pub new_value: Option<serde_json::Value>,
    /// Nested payload carried by `DEVICE_EVENT` entries.
    #[serde(default)]
    pub event: Option<HcEventPayload>,
    #[serde(default)]
    pub timestamp: i64,
}

/// Nested `event` object of a `DEVICE_EVENT` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HcEventPayload {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

// ── Energy ───────────────────────────────────────────────────────────

/// Aggregate from `GET /api/energy/{from}/{to}/compare/devices/power/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyCompare {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(rename = "kWh", default)]
    pub kwh: Option<f64>,
    #[serde(rename = "W", default)]
    pub watts: Option<f64>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub avg: Option<f64>,
}

/// Some endpoints answer with a bare object, others with a one-element list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }
}

// ── Weather ──────────────────────────────────────────────────────────

/// Response of `GET /api/weather`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Weather {
    #[serde(deserialize_with = "lenient::number")]
    pub temperature: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub humidity: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub wind: f64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub temperature_unit: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub wind_unit: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub weather_condition: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub condition_code: String,
}

// ── Diagnostics ──────────────────────────────────────────────────────

/// Response of `GET /api/diagnostics`.
#[derive(Debug, Clone, Deserialize)]
pub struct Diagnostics {
    pub memory: MemoryUsage,
    /// Storage kind (`"internal"`, `"external"`, ...) to its volumes.
    #[serde(default)]
    pub storage: std::collections::BTreeMap<String, Vec<StorageUsage>>,
    #[serde(rename = "cpuLoad", default)]
    pub cpu_load: Vec<CpuLoad>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemoryUsage {
    #[serde(deserialize_with = "lenient::integer")]
    pub free: i64,
    #[serde(deserialize_with = "lenient::integer")]
    pub cache: i64,
    #[serde(deserialize_with = "lenient::integer")]
    pub buffers: i64,
    #[serde(deserialize_with = "lenient::integer")]
    pub used: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageUsage {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::number")]
    pub used: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CpuLoad {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub user: String,
    #[serde(deserialize_with = "lenient::integer")]
    pub nice: i64,
    #[serde(deserialize_with = "lenient::integer")]
    pub system: i64,
    #[serde(deserialize_with = "lenient::integer")]
    pub idle: i64,
}

// ── Lenient scalar decoding ──────────────────────────────────────────

/// The controller serializes numbers as JSON strings on some firmware.
mod lenient {
    use serde::de::Error as _;

    use super::{Deserialize, Deserializer};

    pub(super) fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        match serde_json::Value::deserialize(d)? {
            serde_json::Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| D::Error::custom("number out of range")),
            serde_json::Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("expected a number, got '{s}'"))),
            other => Err(D::Error::custom(format!("expected a number, got {other}"))),
        }
    }

    pub(super) fn integer<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        match serde_json::Value::deserialize(d)? {
            serde_json::Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().and_then(float_to_i64))
                .ok_or_else(|| D::Error::custom("integer out of range")),
            serde_json::Value::String(s) => {
                let trimmed = s.trim();
                trimmed
                    .parse::<i64>()
                    .ok()
                    .or_else(|| trimmed.parse::<f64>().ok().and_then(float_to_i64))
                    .ok_or_else(|| D::Error::custom(format!("expected an integer, got '{s}'")))
            }
            other => Err(D::Error::custom(format!("expected an integer, got {other}"))),
        }
    }

    pub(super) fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(match serde_json::Value::deserialize(d)? {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        })
    }

    #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
    fn float_to_i64(f: f64) -> Option<i64> {
        (f.is_finite() && f.abs() < 9.2e18).then(|| f.trunc() as i64)
    }
}
