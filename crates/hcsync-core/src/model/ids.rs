// ── Controller identifiers ──
//
// Home Center numbers devices, rooms and sections independently, so each
// gets its own newtype to keep them from being mixed up in lookups.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

numeric_id!(
    /// Device id (`deviceID` / `id` in controller payloads).
    DeviceId
);
numeric_id!(
    /// Room id (`roomID`).
    RoomId
);
numeric_id!(
    /// Section id (`sectionID`).
    SectionId
);
