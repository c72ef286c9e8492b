// ── Cursor persistence ──
//
// `CursorStore` is the raw key/value seam (file, null, memory);
// `CursorTracker` layers typed cursors on top of it. Ordering of writes is
// the orchestrator's job, not the tracker's.

mod file;
mod memory;

use tracing::trace;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::{CoreError, StoreError};
use crate::model::{Cursor, StreamKey, StreamKind};

/// Durable string storage keyed by stream.
///
/// `store` must not return before the value is durable.
pub trait CursorStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn store(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// A store that remembers nothing. Every run starts from scratch.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore;

impl CursorStore for NullStore {
    fn load(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    fn store(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Typed view over a [`CursorStore`].
pub struct CursorTracker {
    store: Box<dyn CursorStore>,
}

impl CursorTracker {
    pub fn new(store: impl CursorStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    pub fn from_boxed(store: Box<dyn CursorStore>) -> Self {
        Self { store }
    }

    /// Load the cursor for `key`, parsed as `kind`.
    ///
    /// A value that does not parse is reported rather than silently
    /// treated as absent, since that would restart the stream.
    pub fn get(&self, key: &StreamKey, kind: StreamKind) -> Result<Option<Cursor>, CoreError> {
        let Some(raw) = self.store.load(key.as_str())? else {
            return Ok(None);
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        Cursor::parse(kind, &raw)
            .map(Some)
            .ok_or_else(|| CoreError::CorruptCursor {
                key: key.to_string(),
                value: raw.trim().to_owned(),
            })
    }

    pub fn set(&self, key: &StreamKey, cursor: &Cursor) -> Result<(), CoreError> {
        trace!(stream = %key, %cursor, "storing cursor");
        self.store.store(key.as_str(), &cursor.to_string())?;
        Ok(())
    }
}

impl std::fmt::Debug for CursorTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorTracker").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_typed_cursors() {
        let tracker = CursorTracker::new(MemoryStore::new());
        let key = StreamKey::events();

        assert_eq!(tracker.get(&key, StreamKind::IdOffset).unwrap(), None);
        tracker.set(&key, &Cursor::EventId(5)).unwrap();
        assert_eq!(
            tracker.get(&key, StreamKind::IdOffset).unwrap(),
            Some(Cursor::EventId(5))
        );
    }

    #[test]
    fn unparsable_value_is_corrupt() {
        let store = MemoryStore::new();
        store.store("events", "five").unwrap();
        let tracker = CursorTracker::new(store);

        let err = tracker
            .get(&StreamKey::events(), StreamKind::IdOffset)
            .unwrap_err();
        assert!(matches!(err, CoreError::CorruptCursor { ref value, .. } if value == "five"));
    }

    #[test]
    fn blank_value_counts_as_absent() {
        let store = MemoryStore::new();
        store.store("refreshStates", "\n").unwrap();
        let tracker = CursorTracker::new(store);

        assert_eq!(
            tracker
                .get(&StreamKey::state_changes(), StreamKind::Token)
                .unwrap(),
            None
        );
    }

    #[test]
    fn null_store_forgets_everything() {
        let tracker = CursorTracker::new(NullStore);
        tracker
            .set(&StreamKey::events(), &Cursor::EventId(9))
            .unwrap();
        assert_eq!(
            tracker
                .get(&StreamKey::events(), StreamKind::IdOffset)
                .unwrap(),
            None
        );
    }
}
