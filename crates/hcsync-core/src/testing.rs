// In-memory fakes shared by the unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::{Value, json};

use crate::error::CoreError;
use crate::model::{
    CanonicalPoint, Device, DeviceId, Diagnostics, EnergyAggregate, EventKind, PanelEvent, Room,
    RoomId, Section, SectionId, StatePoll, Weather,
};
use crate::reference::ReferenceIndex;
use crate::sink::{PointSink, Precision};
use crate::source::TelemetrySource;

fn devices() -> Vec<Device> {
    vec![
        Device {
            id: DeviceId(1),
            name: "Wall plug".into(),
            device_type: "com.fibaro.FGWP102".into(),
            room_id: None,
        },
        Device {
            id: DeviceId(10),
            name: "Boiler".into(),
            device_type: "com.fibaro.binarySwitch".into(),
            room_id: Some(RoomId(3)),
        },
        Device {
            id: DeviceId(11),
            name: "Orphan".into(),
            device_type: "com.fibaro.motionSensor".into(),
            room_id: Some(RoomId(99)),
        },
    ]
}

fn rooms() -> Vec<Room> {
    vec![Room {
        id: RoomId(3),
        name: "Kitchen".into(),
        section_id: Some(SectionId(7)),
    }]
}

fn sections() -> Vec<Section> {
    vec![Section {
        id: SectionId(7),
        name: "Ground floor".into(),
    }]
}

/// Devices 1 (no room), 10 (Kitchen / Ground floor) and 11 (dangling room).
pub fn sample_index() -> ReferenceIndex {
    ReferenceIndex::new(devices(), rooms(), sections())
}

pub fn property_event(
    id: u64,
    device: u64,
    property: &str,
    value: Value,
    timestamp: i64,
) -> PanelEvent {
    PanelEvent {
        id,
        device_id: Some(DeviceId(device)),
        device_type: Some("com.fibaro.binarySwitch".into()),
        kind: EventKind::PropertyChanged {
            property: property.into(),
            new_value: value,
        },
        timestamp,
    }
}

fn injected(what: &str) -> CoreError {
    CoreError::Api {
        message: format!("injected {what} failure"),
        status: Some(500),
    }
}

// ── Source ───────────────────────────────────────────────────────────

#[derive(Default)]
struct SourceState {
    devices: Vec<Device>,
    rooms: Vec<Room>,
    sections: Vec<Section>,
    failing_listing: Option<String>,
    events: Vec<PanelEvent>,
    fail_events: bool,
    event_calls: usize,
    consumption: HashMap<DeviceId, EnergyAggregate>,
    windows: Vec<(u64, i64, i64)>,
    poll: Option<StatePoll>,
    polled: Vec<String>,
    weather: Option<Weather>,
    diagnostics: Option<Diagnostics>,
}

/// Controller fake. The event log pages like Home Center: newest first,
/// backwards from `from + limit - 1`.
#[derive(Default)]
pub struct FakeSource {
    state: Mutex<SourceState>,
}

impl FakeSource {
    pub fn with_reference() -> Self {
        let source = Self::default();
        {
            let mut state = source.state.lock().unwrap();
            state.devices = devices();
            state.rooms = rooms();
            state.sections = sections();
        }
        source
    }

    pub fn with_events(ids: impl IntoIterator<Item = u64>) -> Self {
        let source = Self::with_reference();
        source.push_property_events(ids);
        source
    }

    pub fn push_raw_events(&self, events: impl IntoIterator<Item = PanelEvent>) {
        self.state.lock().unwrap().events.extend(events);
    }

    /// `value` changes on device 10; the timestamp equals the id.
    pub fn push_property_events(&self, ids: impl IntoIterator<Item = u64>) {
        self.push_raw_events(ids.into_iter().map(|id| {
            property_event(id, 10, "value", json!(id), i64::try_from(id).unwrap())
        }));
    }

    pub fn push_events(&self, ids: impl IntoIterator<Item = u64>) {
        self.push_property_events(ids);
    }

    pub fn push_unrecognized_events(&self, ids: impl IntoIterator<Item = u64>) {
        self.push_raw_events(ids.into_iter().map(|id| PanelEvent {
            id,
            device_id: None,
            device_type: None,
            kind: EventKind::Unrecognized("SCENE_STARTED".into()),
            timestamp: 0,
        }));
    }

    pub fn fail_events(&self) {
        self.state.lock().unwrap().fail_events = true;
    }

    pub fn fail_listing(&self, listing: &str) {
        self.state.lock().unwrap().failing_listing = Some(listing.to_owned());
    }

    /// Number of `list_events` calls (the boundary probe is not counted).
    pub fn event_calls(&self) -> usize {
        self.state.lock().unwrap().event_calls
    }

    pub fn set_consumption(&self, device: DeviceId, aggregate: EnergyAggregate) {
        self.state
            .lock()
            .unwrap()
            .consumption
            .insert(device, aggregate);
    }

    /// Every requested `(device, from, to)` window, in order.
    pub fn windows(&self) -> Vec<(u64, i64, i64)> {
        self.state.lock().unwrap().windows.clone()
    }

    pub fn set_poll(&self, changes: Option<Vec<Value>>, last: Option<&str>, timestamp: Option<i64>) {
        let changes = changes.map(|list| {
            list.into_iter()
                .filter_map(|v| match v {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect()
        });
        self.state.lock().unwrap().poll = Some(StatePoll {
            changes,
            last: last.map(str::to_owned),
            timestamp,
        });
    }

    pub fn polled_tokens(&self) -> Vec<String> {
        self.state.lock().unwrap().polled.clone()
    }

    pub fn set_weather(&self, weather: Weather) {
        self.state.lock().unwrap().weather = Some(weather);
    }

    pub fn set_diagnostics(&self, diagnostics: Diagnostics) {
        self.state.lock().unwrap().diagnostics = Some(diagnostics);
    }

    fn listing<T: Clone>(
        &self,
        name: &str,
        pick: impl Fn(&SourceState) -> &Vec<T>,
    ) -> Result<Vec<T>, CoreError> {
        let state = self.state.lock().unwrap();
        if state.failing_listing.as_deref() == Some(name) {
            return Err(injected(name));
        }
        Ok(pick(&state).clone())
    }
}

impl TelemetrySource for FakeSource {
    async fn list_devices(&self) -> Result<Vec<Device>, CoreError> {
        self.listing("devices", |s| &s.devices)
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, CoreError> {
        self.listing("rooms", |s| &s.rooms)
    }

    async fn list_sections(&self) -> Result<Vec<Section>, CoreError> {
        self.listing("sections", |s| &s.sections)
    }

    async fn refresh_states(&self, last: &str) -> Result<StatePoll, CoreError> {
        let mut state = self.state.lock().unwrap();
        state.polled.push(last.to_owned());
        state.poll.clone().ok_or_else(|| injected("refreshStates"))
    }

    async fn newest_event_id(&self) -> Result<Option<u64>, CoreError> {
        Ok(self.state.lock().unwrap().events.iter().map(|e| e.id).max())
    }

    async fn list_events(&self, from: u64, limit: u32) -> Result<Vec<PanelEvent>, CoreError> {
        let mut state = self.state.lock().unwrap();
        state.event_calls += 1;
        if state.fail_events {
            return Err(injected("events"));
        }
        let start_from = from + u64::from(limit) - 1;
        let mut page: Vec<PanelEvent> = state
            .events
            .iter()
            .filter(|e| e.id <= start_from)
            .cloned()
            .collect();
        page.sort_by(|a, b| b.id.cmp(&a.id));
        page.truncate(usize::try_from(limit).unwrap());
        Ok(page)
    }

    async fn consumption(
        &self,
        device: DeviceId,
        from: i64,
        to: i64,
    ) -> Result<Option<EnergyAggregate>, CoreError> {
        let mut state = self.state.lock().unwrap();
        state.windows.push((device.0, from, to));
        Ok(state.consumption.get(&device).copied())
    }

    async fn weather(&self) -> Result<Weather, CoreError> {
        self.state
            .lock()
            .unwrap()
            .weather
            .clone()
            .ok_or_else(|| injected("weather"))
    }

    async fn diagnostics(&self) -> Result<Diagnostics, CoreError> {
        self.state
            .lock()
            .unwrap()
            .diagnostics
            .clone()
            .ok_or_else(|| injected("diagnostics"))
    }
}

// ── Sink ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct SinkState {
    points: Vec<CanonicalPoint>,
    write_calls: usize,
    fail_after: Option<usize>,
}

#[derive(Default)]
pub struct FakeSink {
    state: Mutex<SinkState>,
}

impl FakeSink {
    /// Accept `successes` writes, then reject every later one.
    pub fn fail_after(&self, successes: usize) {
        self.state.lock().unwrap().fail_after = Some(successes);
    }

    pub fn points(&self) -> Vec<CanonicalPoint> {
        self.state.lock().unwrap().points.clone()
    }

    /// Write attempts, failed ones included.
    pub fn write_calls(&self) -> usize {
        self.state.lock().unwrap().write_calls
    }
}

impl PointSink for FakeSink {
    async fn write_points(
        &self,
        points: &[CanonicalPoint],
        precision: Precision,
    ) -> Result<(), CoreError> {
        assert_eq!(precision, Precision::Seconds);
        assert!(!points.is_empty(), "empty batches must not be written");

        let mut state = self.state.lock().unwrap();
        state.write_calls += 1;
        if state.fail_after.is_some_and(|n| state.write_calls > n) {
            return Err(CoreError::SinkWrite {
                reason: "injected write failure".into(),
            });
        }
        state.points.extend_from_slice(points);
        Ok(())
    }
}
