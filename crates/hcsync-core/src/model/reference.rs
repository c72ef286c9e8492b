// ── Reference entities ──

use serde::{Deserialize, Serialize};

use super::ids::{DeviceId, RoomId, SectionId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    /// Controller type string, e.g. `com.fibaro.binarySwitch`.
    pub device_type: String,
    pub room_id: Option<RoomId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub section_id: Option<SectionId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub name: String,
}
