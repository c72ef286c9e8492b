//! Incremental sync engine between a Home Center controller and InfluxDB.
//!
//! Streams (the panel event log, per-device energy windows and the
//! `refreshStates` change feed) are pulled in budgeted batches, joined
//! against the device/room/section graph, turned into canonical points
//! and written before their cursor advances. A rerun resumes from the
//! stored cursors.
//!
//! The engine talks to the outside world only through [`TelemetrySource`],
//! [`PointSink`] and [`CursorStore`].

pub mod builder;
pub mod config;
pub mod convert;
pub mod cursor;
pub mod error;
pub mod fetch;
pub mod model;
pub mod reference;
pub mod sink;
pub mod snapshot;
pub mod source;
pub mod sync;

#[cfg(test)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use builder::PointBuilder;
pub use config::{
    HcConnection, InfluxConnection, StorageConfig, StorageKind, SyncConfig, TlsVerification,
};
pub use cursor::{CursorStore, CursorTracker, FileStore, MemoryStore, NullStore};
pub use error::{CoreError, StoreError};
pub use fetch::{CallBudget, FetchLoop, StopReason, StreamSpec};
pub use reference::{Placement, ReferenceDataCache, ReferenceIndex, SENTINEL};
pub use sink::{InfluxSink, LogSink, PointSink, Precision};
pub use snapshot::SnapshotSync;
pub use source::{HcSource, TelemetrySource};
pub use sync::{
    ConsumptionParams, EventParams, Outcome, RunReport, StreamReport, StreamRequest, SyncObserver,
    SyncOrchestrator, SyncPhase,
};

pub use model::{
    CanonicalPoint, Cursor, DeviceId, FieldValue, RawRecord, StreamKey, StreamKind,
};
