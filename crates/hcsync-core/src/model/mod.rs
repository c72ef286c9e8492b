// ── Domain model ──
//
// Canonical, transport-independent types the sync engine works with.
// `convert` builds them from hcsync-api payloads; everything downstream
// (fetch loop, point builder, orchestrator) only sees these.

pub mod cursor;
pub mod ids;
pub mod point;
pub mod record;
pub mod reference;
pub mod system;

// ── Re-exports ──────────────────────────────────────────────────────

pub use cursor::{Cursor, StreamKey, StreamKind};
pub use ids::{DeviceId, RoomId, SectionId};
pub use point::{CanonicalPoint, FieldValue};
pub use record::{
    ConsumptionSample, EnergyAggregate, EventKind, PanelEvent, RawRecord, StateChange, StatePoll,
};
pub use reference::{Device, Room, Section};
pub use system::{CpuStats, Diagnostics, MemoryStats, StorageVolume, Weather};
