// ── Canonical time-series point ──

use std::collections::BTreeMap;

/// A field value after coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    Text(String),
}

/// Sink-agnostic point: measurement, sorted tags, sorted fields and a
/// Unix-seconds timestamp.
///
/// Never constructed with an empty field set by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalPoint {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, FieldValue>,
    pub timestamp: i64,
}

impl CanonicalPoint {
    pub fn new(measurement: impl Into<String>, timestamp: i64) -> Self {
        Self {
            measurement: measurement.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            timestamp,
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Add `key` only when a value is present.
    pub fn field_opt(self, key: impl Into<String>, value: Option<FieldValue>) -> Self {
        match value {
            Some(value) => self.field(key, value),
            None => self,
        }
    }
}
