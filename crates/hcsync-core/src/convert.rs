// ── API-to-domain type conversions ──
//
// Bridges raw `hcsync_api` response types into canonical domain types, and
// canonical points back into the wire form of the InfluxDB client.

use hcsync_api::hc::models::{
    Diagnostics as ApiDiagnostics, EnergyCompare, HcDevice, HcEvent, HcRoom, HcSection,
    RefreshStates, Weather as ApiWeather,
};
use hcsync_api::influx;

use crate::model::{
    CanonicalPoint, CpuStats, Device, DeviceId, Diagnostics, EnergyAggregate, EventKind,
    FieldValue, MemoryStats, PanelEvent, Room, RoomId, Section, SectionId, StatePoll,
    StorageVolume, Weather,
};

const PROPERTY_CHANGED: &str = "DEVICE_PROPERTY_CHANGED";
const DEVICE_EVENT: &str = "DEVICE_EVENT";
const PROPERTY_UPDATED: &str = "DevicePropertyUpdatedEvent";

// ── Reference data ───────────────────────────────────────────────────

impl From<HcDevice> for Device {
    fn from(d: HcDevice) -> Self {
        Device {
            id: DeviceId(d.id),
            name: d.name,
            device_type: d.device_type,
            room_id: d.room_id.map(RoomId),
        }
    }
}

impl From<HcRoom> for Room {
    fn from(r: HcRoom) -> Self {
        Room {
            id: RoomId(r.id),
            name: r.name,
            section_id: r.section_id.map(SectionId),
        }
    }
}

impl From<HcSection> for Section {
    fn from(s: HcSection) -> Self {
        Section {
            id: SectionId(s.id),
            name: s.name,
        }
    }
}

// ── Events ───────────────────────────────────────────────────────────

impl From<HcEvent> for PanelEvent {
    fn from(e: HcEvent) -> Self {
        let kind = event_kind(&e);
        PanelEvent {
            id: e.id,
            device_id: e.device_id.map(DeviceId),
            device_type: e.device_type.filter(|t| !t.is_empty()),
            kind,
            timestamp: e.timestamp,
        }
    }
}

/// Recognize the two event shapes that carry a property change.
fn event_kind(e: &HcEvent) -> EventKind {
    match e.event_type.as_str() {
        PROPERTY_CHANGED => match &e.property_name {
            Some(property) => EventKind::PropertyChanged {
                property: property.clone(),
                new_value: e.new_value.clone().unwrap_or_default(),
            },
            None => EventKind::Unrecognized(e.event_type.clone()),
        },
        DEVICE_EVENT => {
            let payload = e.event.as_ref().filter(|p| p.kind == PROPERTY_UPDATED);
            let property = payload
                .and_then(|p| p.data.get("property"))
                .and_then(serde_json::Value::as_str);
            match (payload, property) {
                (Some(payload), Some(property)) => EventKind::PropertyChanged {
                    property: property.to_owned(),
                    new_value: payload.data.get("newValue").cloned().unwrap_or_default(),
                },
                _ => EventKind::Unrecognized(format!(
                    "{DEVICE_EVENT}/{}",
                    e.event.as_ref().map_or("?", |p| p.kind.as_str())
                )),
            }
        }
        other => EventKind::Unrecognized(other.to_owned()),
    }
}

// ── Refresh states ───────────────────────────────────────────────────

impl From<RefreshStates> for StatePoll {
    fn from(r: RefreshStates) -> Self {
        let last = r.last.and_then(|v| match v {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        StatePoll {
            changes: r.changes,
            last,
            timestamp: r.timestamp,
        }
    }
}

// ── Energy ───────────────────────────────────────────────────────────

impl From<EnergyCompare> for EnergyAggregate {
    fn from(e: EnergyCompare) -> Self {
        EnergyAggregate {
            energy_kwh: e.kwh,
            power_current: e.watts,
            power_min: e.min,
            power_max: e.max,
            power_avg: e.avg,
        }
    }
}

// ── Snapshots ────────────────────────────────────────────────────────

impl From<ApiWeather> for Weather {
    fn from(w: ApiWeather) -> Self {
        Weather {
            temperature: w.temperature,
            humidity: w.humidity,
            wind: w.wind,
            temperature_unit: w.temperature_unit,
            wind_unit: w.wind_unit,
            condition: w.weather_condition,
            condition_code: w.condition_code,
        }
    }
}

impl From<ApiDiagnostics> for Diagnostics {
    fn from(d: ApiDiagnostics) -> Self {
        let storage = d
            .storage
            .into_iter()
            .flat_map(|(kind, volumes)| {
                volumes.into_iter().map(move |v| StorageVolume {
                    kind: kind.clone(),
                    name: v.name,
                    used: v.used,
                })
            })
            .collect();
        let cpus = d
            .cpu_load
            .into_iter()
            .map(|c| CpuStats {
                name: c.name,
                user: c.user,
                nice: c.nice,
                system: c.system,
                idle: c.idle,
            })
            .collect();

        Diagnostics {
            memory: MemoryStats {
                free: d.memory.free,
                cache: d.memory.cache,
                buffers: d.memory.buffers,
                used: d.memory.used,
            },
            storage,
            cpus,
        }
    }
}

// ── Points ───────────────────────────────────────────────────────────

impl From<&CanonicalPoint> for influx::Point {
    fn from(p: &CanonicalPoint) -> Self {
        influx::Point {
            measurement: p.measurement.clone(),
            tags: p.tags.clone(),
            fields: p
                .fields
                .iter()
                .map(|(k, v)| (k.clone(), v.into()))
                .collect(),
            timestamp: Some(p.timestamp),
        }
    }
}

impl From<&FieldValue> for influx::FieldValue {
    fn from(v: &FieldValue) -> Self {
        match v {
            FieldValue::Float(f) => influx::FieldValue::Float(*f),
            FieldValue::Integer(i) => influx::FieldValue::Integer(*i),
            FieldValue::Text(s) => influx::FieldValue::String(s.clone()),
        }
    }
}
