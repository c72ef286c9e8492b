use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::cursor::CursorStore;
use crate::error::StoreError;

/// In-process store for tests and dry runs.
///
/// Clones share the same map, so a caller can keep a handle after giving
/// one to a [`CursorTracker`](crate::cursor::CursorTracker).
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value for `key`, bypassing the trait.
    pub fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

impl CursorStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.get(key))
    }

    fn store(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}
