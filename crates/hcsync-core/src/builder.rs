// ── Point builder ──
//
// Turns raw records into canonical points: picks the fields, coerces their
// values and attaches the device's location tags. Records that carry
// nothing writable come back as `None` and are counted as skipped.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::model::{
    CanonicalPoint, ConsumptionSample, EventKind, FieldValue, PanelEvent, RawRecord, StateChange,
};
use crate::reference::{ReferenceIndex, SENTINEL};

/// Bookkeeping properties never written as fields.
pub const EXCLUDED_KEYS: [&str; 4] = ["id", "log", "logTemp", "lastBreached"];

pub const CONSUMPTION_MEASUREMENT: &str = "consumption";

pub struct PointBuilder;

impl PointBuilder {
    pub fn build(record: &RawRecord, index: &ReferenceIndex) -> Option<CanonicalPoint> {
        match record {
            RawRecord::Event(event) => Self::event(event, index),
            RawRecord::Change(change) => Self::state_change(change, index),
            RawRecord::ConsumptionSample(sample) => Self::consumption(sample, index),
            RawRecord::Unidentified(_) => None,
        }
    }

    fn event(event: &PanelEvent, index: &ReferenceIndex) -> Option<CanonicalPoint> {
        let EventKind::PropertyChanged {
            property,
            new_value,
        } = &event.kind
        else {
            return None;
        };

        let fields = collect_fields([(property.as_str(), new_value)]);
        if fields.is_empty() {
            return None;
        }

        let placement = index.resolve(event.device_id);
        // The event's own type wins; it is what the controller reported at
        // the time, even if the device was since removed.
        let device_type = event
            .device_type
            .clone()
            .unwrap_or_else(|| placement.device_type.clone());

        let mut tags = placement.location_tags();
        tags.insert("device_type".into(), device_type.clone());

        Some(CanonicalPoint {
            measurement: format!("panels.event.{device_type}"),
            tags,
            fields,
            timestamp: event.timestamp,
        })
    }

    fn state_change(change: &StateChange, index: &ReferenceIndex) -> Option<CanonicalPoint> {
        let fields = collect_fields(change.properties.iter().map(|(k, v)| (k.as_str(), v)));
        if fields.is_empty() {
            return None;
        }

        let placement = index.resolve(Some(change.device_id));
        let mut tags = placement.location_tags();
        tags.insert("device_type".into(), placement.device_type.clone());

        Some(CanonicalPoint {
            measurement: format!("refreshStates.{}", placement.device_type),
            tags,
            fields,
            timestamp: change.timestamp,
        })
    }

    fn consumption(sample: &ConsumptionSample, index: &ReferenceIndex) -> Option<CanonicalPoint> {
        let aggregate = &sample.aggregate;
        let point = CanonicalPoint::new(CONSUMPTION_MEASUREMENT, sample.timestamp)
            .field_opt("consumption", aggregate.energy_kwh.map(FieldValue::Float))
            .field_opt("powerCurrent", aggregate.power_current.map(FieldValue::Float))
            .field_opt("powerMin", aggregate.power_min.map(FieldValue::Float))
            .field_opt("powerMax", aggregate.power_max.map(FieldValue::Float))
            .field_opt("powerAvg", aggregate.power_avg.map(FieldValue::Float));
        if point.fields.is_empty() {
            return None;
        }

        Some(CanonicalPoint {
            tags: index.resolve(Some(sample.device_id)).location_tags(),
            ..point
        })
    }
}

fn collect_fields<'v>(
    properties: impl IntoIterator<Item = (&'v str, &'v Value)>,
) -> BTreeMap<String, FieldValue> {
    properties
        .into_iter()
        .filter(|(key, _)| !EXCLUDED_KEYS.contains(key))
        .filter_map(|(key, value)| coerce(value).map(|v| (key.to_owned(), v)))
        .collect()
}

/// Coerce one raw value into a field value.
///
/// Boolean-like values become `1.0` / `0.0` so they chart as numbers.
/// Everything else keeps its original form: numbers stay numbers, strings
/// stay strings (`"42.5"` is not parsed), and arrays/objects become their
/// JSON text. `null` has no field representation.
pub fn coerce(value: &Value) -> Option<FieldValue> {
    match value {
        Value::Null => None,
        Value::Bool(true) => Some(FieldValue::Float(1.0)),
        Value::Bool(false) => Some(FieldValue::Float(0.0)),
        Value::String(s) if s == "true" => Some(FieldValue::Float(1.0)),
        Value::String(s) if s == "false" => Some(FieldValue::Float(0.0)),
        Value::String(s) => Some(FieldValue::Text(s.clone())),
        Value::Number(n) => n
            .as_i64()
            .map(FieldValue::Integer)
            .or_else(|| n.as_f64().map(FieldValue::Float)),
        Value::Array(_) | Value::Object(_) => Some(FieldValue::Text(value.to_string())),
    }
}

/// Tag value for a possibly-empty controller string.
pub(crate) fn tag_value(value: &str) -> String {
    if value.is_empty() {
        SENTINEL.to_owned()
    } else {
        value.to_owned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::{DeviceId, EnergyAggregate};
    use crate::testing::sample_index;

    fn property_event(device: u64, property: &str, value: Value) -> RawRecord {
        RawRecord::Event(PanelEvent {
            id: 5,
            device_id: Some(DeviceId(device)),
            device_type: Some("com.fibaro.binarySwitch".into()),
            kind: EventKind::PropertyChanged {
                property: property.into(),
                new_value: value,
            },
            timestamp: 1000,
        })
    }

    fn change(value: Value) -> RawRecord {
        let Value::Object(properties) = value else {
            panic!("change must be an object");
        };
        StateChange::from_map(properties, 2000)
            .map(RawRecord::Change)
            .unwrap()
    }

    #[test]
    fn coercion_rules() {
        assert_eq!(coerce(&json!("true")), Some(FieldValue::Float(1.0)));
        assert_eq!(coerce(&json!(false)), Some(FieldValue::Float(0.0)));
        assert_eq!(coerce(&json!("42.5")), Some(FieldValue::Text("42.5".into())));
        assert_eq!(coerce(&json!(42.5)), Some(FieldValue::Float(42.5)));
        assert_eq!(coerce(&json!(7)), Some(FieldValue::Integer(7)));
        assert_eq!(coerce(&json!("Armed")), Some(FieldValue::Text("Armed".into())));
        assert_eq!(coerce(&json!([1, 2])), Some(FieldValue::Text("[1,2]".into())));
        assert_eq!(coerce(&Value::Null), None);
    }

    #[test]
    fn event_for_device_without_room() {
        let point = PointBuilder::build(&property_event(1, "power", json!("true")), &sample_index())
            .unwrap();

        assert_eq!(point.measurement, "panels.event.com.fibaro.binarySwitch");
        assert_eq!(point.timestamp, 1000);
        assert_eq!(point.fields["power"], FieldValue::Float(1.0));
        assert_eq!(point.tags["device_id"], "1");
        assert_eq!(point.tags["device_name"], "Wall plug");
        assert_eq!(point.tags["room_name"], SENTINEL);
        assert_eq!(point.tags["room_id"], SENTINEL);
        assert_eq!(point.tags["section_name"], SENTINEL);
        assert_eq!(point.tags["section_id"], SENTINEL);
    }

    #[test]
    fn unrecognized_event_is_skipped() {
        let record = RawRecord::Event(PanelEvent {
            id: 9,
            device_id: None,
            device_type: None,
            kind: EventKind::Unrecognized("SCENE_STARTED".into()),
            timestamp: 1,
        });
        assert_eq!(PointBuilder::build(&record, &sample_index()), None);
    }

    #[test]
    fn event_on_excluded_or_null_property_is_dropped() {
        let index = sample_index();
        assert_eq!(
            PointBuilder::build(&property_event(10, "log", json!("x")), &index),
            None
        );
        assert_eq!(
            PointBuilder::build(&property_event(10, "value", Value::Null), &index),
            None
        );
    }

    #[test]
    fn state_change_excludes_bookkeeping_keys() {
        let record = change(json!({
            "id": 10, "value": "false", "log": "", "logTemp": "", "lastBreached": 1,
            "power": 12.5, "mode": "heat"
        }));
        let point = PointBuilder::build(&record, &sample_index()).unwrap();

        assert_eq!(point.measurement, "refreshStates.com.fibaro.binarySwitch");
        assert_eq!(
            point.fields.keys().collect::<Vec<_>>(),
            vec!["mode", "power", "value"]
        );
        assert_eq!(point.fields["value"], FieldValue::Float(0.0));
        assert_eq!(point.tags["room_name"], "Kitchen");
        assert_eq!(point.tags["section_name"], "Ground floor");
        assert_eq!(point.timestamp, 2000);
    }

    #[test]
    fn state_change_with_only_bookkeeping_is_dropped() {
        let record = change(json!({ "id": 10, "log": "started", "lastBreached": 17 }));
        assert_eq!(PointBuilder::build(&record, &sample_index()), None);
    }

    #[test]
    fn state_change_for_unknown_device_uses_sentinels() {
        let record = change(json!({ "id": 777, "value": 1 }));
        let point = PointBuilder::build(&record, &sample_index()).unwrap();
        assert_eq!(point.measurement, "refreshStates.None");
        assert_eq!(point.tags["device_id"], "777");
        assert_eq!(point.tags["device_type"], SENTINEL);
    }

    #[test]
    fn tag_sets_are_fixed_per_measurement_kind() {
        let index = sample_index();
        let event = PointBuilder::build(&property_event(500, "value", json!(1)), &index).unwrap();
        let state = PointBuilder::build(&change(json!({ "id": 10, "value": 1 })), &index).unwrap();
        let consumption = PointBuilder::build(
            &RawRecord::ConsumptionSample(ConsumptionSample {
                device_id: DeviceId(11),
                aggregate: EnergyAggregate {
                    energy_kwh: Some(0.1),
                    ..EnergyAggregate::default()
                },
                timestamp: 30,
            }),
            &index,
        )
        .unwrap();

        let keys = |p: &CanonicalPoint| p.tags.keys().cloned().collect::<Vec<_>>();
        assert_eq!(keys(&event), keys(&state));
        assert_eq!(keys(&event).len(), 7);
        assert_eq!(
            keys(&consumption),
            keys(&event)
                .into_iter()
                .filter(|k| k != "device_type")
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn consumption_fields_and_missing_aggregates() {
        let index = sample_index();
        let full = RawRecord::ConsumptionSample(ConsumptionSample {
            device_id: DeviceId(10),
            aggregate: EnergyAggregate {
                energy_kwh: Some(0.25),
                power_current: Some(120.0),
                power_min: None,
                power_max: Some(900.0),
                power_avg: Some(15.0),
            },
            timestamp: 1030,
        });
        let point = PointBuilder::build(&full, &index).unwrap();
        assert_eq!(point.measurement, CONSUMPTION_MEASUREMENT);
        assert_eq!(
            point.fields.keys().collect::<Vec<_>>(),
            vec!["consumption", "powerAvg", "powerCurrent", "powerMax"]
        );

        let empty = RawRecord::ConsumptionSample(ConsumptionSample {
            device_id: DeviceId(10),
            aggregate: EnergyAggregate::default(),
            timestamp: 1030,
        });
        assert_eq!(PointBuilder::build(&empty, &index), None);
    }

    #[test]
    fn empty_tag_values_become_sentinel() {
        assert_eq!(tag_value(""), SENTINEL);
        assert_eq!(tag_value("km/h"), "km/h");
    }
}
