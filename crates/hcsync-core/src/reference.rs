// ── Reference data ──
//
// The device → room → section graph every telemetry record is joined
// against. Loaded once per run, then only read.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::error::CoreError;
use crate::model::{Device, DeviceId, Room, RoomId, Section, SectionId};
use crate::source::TelemetrySource;

/// Tag value used for every level of the graph that cannot be resolved.
pub const SENTINEL: &str = "None";

/// Immutable lookup tables for one run.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    devices: HashMap<DeviceId, Device>,
    rooms: HashMap<RoomId, Room>,
    sections: HashMap<SectionId, Section>,
}

impl ReferenceIndex {
    pub fn new(devices: Vec<Device>, rooms: Vec<Room>, sections: Vec<Section>) -> Self {
        Self {
            devices: devices.into_iter().map(|d| (d.id, d)).collect(),
            rooms: rooms.into_iter().map(|r| (r.id, r)).collect(),
            sections: sections.into_iter().map(|s| (s.id, s)).collect(),
        }
    }

    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(&id)
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(&id)
    }

    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.get(&id)
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Walk device → room → section, substituting [`SENTINEL`] for every
    /// level that is missing. Never fails.
    pub fn resolve(&self, device_id: Option<DeviceId>) -> Placement {
        let device = device_id.and_then(|id| self.device(id));
        let room = device.and_then(|d| d.room_id).and_then(|id| self.room(id));
        let section = room
            .and_then(|r| r.section_id)
            .and_then(|id| self.section(id));

        Placement {
            device_id: device_id.map_or_else(|| SENTINEL.into(), |id| id.to_string()),
            device_name: device.map_or_else(|| SENTINEL.into(), |d| d.name.clone()),
            device_type: device.map_or_else(|| SENTINEL.into(), |d| d.device_type.clone()),
            room_name: room.map_or_else(|| SENTINEL.into(), |r| r.name.clone()),
            room_id: room.map_or_else(|| SENTINEL.into(), |r| r.id.to_string()),
            section_name: section.map_or_else(|| SENTINEL.into(), |s| s.name.clone()),
            section_id: section.map_or_else(|| SENTINEL.into(), |s| s.id.to_string()),
        }
    }
}

/// Resolved location of a device, already rendered as tag values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub device_id: String,
    pub device_name: String,
    pub device_type: String,
    pub room_name: String,
    pub room_id: String,
    pub section_name: String,
    pub section_id: String,
}

impl Placement {
    /// Location tags shared by every device-scoped measurement, without
    /// `device_type`.
    pub fn location_tags(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("device_id".to_owned(), self.device_id.clone()),
            ("device_name".to_owned(), self.device_name.clone()),
            ("room_name".to_owned(), self.room_name.clone()),
            ("room_id".to_owned(), self.room_id.clone()),
            ("section_name".to_owned(), self.section_name.clone()),
            ("section_id".to_owned(), self.section_id.clone()),
        ])
    }
}

// ── Loader ───────────────────────────────────────────────────────────

/// Fetches the three reference listings from a [`TelemetrySource`].
pub struct ReferenceDataCache<'a, S> {
    source: &'a S,
}

impl<'a, S: TelemetrySource> ReferenceDataCache<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Load devices, rooms and sections. Any failing listing aborts the
    /// load with [`CoreError::ReferenceLoad`].
    pub async fn load(&self) -> Result<ReferenceIndex, CoreError> {
        let devices = self
            .source
            .list_devices()
            .await
            .map_err(|e| reference_error("devices", &e))?;
        let rooms = self
            .source
            .list_rooms()
            .await
            .map_err(|e| reference_error("rooms", &e))?;
        let sections = self
            .source
            .list_sections()
            .await
            .map_err(|e| reference_error("sections", &e))?;

        debug!(
            devices = devices.len(),
            rooms = rooms.len(),
            sections = sections.len(),
            "reference data loaded"
        );
        Ok(ReferenceIndex::new(devices, rooms, sections))
    }
}

fn reference_error(listing: &str, err: &CoreError) -> CoreError {
    CoreError::ReferenceLoad {
        listing: listing.into(),
        reason: err.to_string(),
    }
}
