// ── Raw telemetry records ──
//
// What the fetch loop hands to the orchestrator: one variant per stream
// shape, carrying values still in their raw JSON form.

use serde_json::{Map, Value};

use super::ids::DeviceId;

/// A single unprocessed telemetry record.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    Change(StateChange),
    Event(PanelEvent),
    ConsumptionSample(ConsumptionSample),
    /// A refreshStates entry with no usable device id.
    Unidentified(Map<String, Value>),
}

impl RawRecord {
    /// Event id for id-ordered records.
    pub fn event_id(&self) -> Option<u64> {
        match self {
            Self::Event(event) => Some(event.id),
            Self::Change(_) | Self::ConsumptionSample(_) | Self::Unidentified(_) => None,
        }
    }

    /// Wrap one entry of a refreshStates `changes` list.
    pub fn change(properties: Map<String, Value>, timestamp: i64) -> Self {
        match device_id_of(&properties) {
            Some(device_id) => Self::Change(StateChange {
                device_id,
                properties,
                timestamp,
            }),
            None => Self::Unidentified(properties),
        }
    }
}

// ── State changes ────────────────────────────────────────────────────

/// One entry of a refreshStates `changes` list: a device id plus the
/// properties that changed, keyed by property name.
#[derive(Debug, Clone, PartialEq)]
pub struct StateChange {
    pub device_id: DeviceId,
    pub properties: Map<String, Value>,
    pub timestamp: i64,
}

impl StateChange {
    /// Split a raw change object into its device id and properties.
    ///
    /// Returns `None` when the object has no usable `id`. The `id` key
    /// itself stays in `properties`; the point builder excludes it.
    pub fn from_map(properties: Map<String, Value>, timestamp: i64) -> Option<Self> {
        let device_id = device_id_of(&properties)?;
        Some(Self {
            device_id,
            properties,
            timestamp,
        })
    }
}

fn device_id_of(properties: &Map<String, Value>) -> Option<DeviceId> {
    let id = match properties.get("id")? {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    Some(DeviceId(id))
}

/// Result of one refreshStates poll.
#[derive(Debug, Clone, PartialEq)]
pub struct StatePoll {
    /// `None` when the response had no `changes` key at all.
    pub changes: Option<Vec<Map<String, Value>>>,
    /// Continuation token for the next poll.
    pub last: Option<String>,
    pub timestamp: Option<i64>,
}

// ── Panel events ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct PanelEvent {
    pub id: u64,
    pub device_id: Option<DeviceId>,
    pub device_type: Option<String>,
    pub kind: EventKind,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// `DEVICE_PROPERTY_CHANGED`, or `DEVICE_EVENT` wrapping a
    /// `DevicePropertyUpdatedEvent`.
    PropertyChanged { property: String, new_value: Value },
    /// Anything else; carries the event type for logging.
    Unrecognized(String),
}

// ── Consumption ──────────────────────────────────────────────────────

/// Energy/power aggregate of one device over one window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnergyAggregate {
    pub energy_kwh: Option<f64>,
    pub power_current: Option<f64>,
    pub power_min: Option<f64>,
    pub power_max: Option<f64>,
    pub power_avg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConsumptionSample {
    pub device_id: DeviceId,
    pub aggregate: EnergyAggregate,
    /// Midpoint of the queried window.
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn change_id_may_be_number_or_string() {
        let numeric = StateChange::from_map(object(json!({ "id": 12, "value": "true" })), 5);
        let stringly = StateChange::from_map(object(json!({ "id": "13", "value": 1 })), 5);
        assert_eq!(numeric.map(|c| c.device_id), Some(DeviceId(12)));
        assert_eq!(stringly.map(|c| c.device_id), Some(DeviceId(13)));
    }

    #[test]
    fn change_without_id_is_rejected() {
        assert!(StateChange::from_map(object(json!({ "value": 1 })), 5).is_none());
        assert!(StateChange::from_map(object(json!({ "id": null })), 5).is_none());
    }

    #[test]
    fn change_without_id_is_kept_as_unidentified() {
        let record = RawRecord::change(object(json!({ "value": 2 })), 5);
        assert!(matches!(record, RawRecord::Unidentified(ref map) if map.contains_key("value")));
        assert!(matches!(
            RawRecord::change(object(json!({ "id": 7, "value": 2 })), 5),
            RawRecord::Change(StateChange { device_id: DeviceId(7), .. })
        ));
    }
}
