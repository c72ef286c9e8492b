// InfluxDB line protocol encoding
//
// `measurement,tag=v,... field=v,... timestamp` with the escaping rules of
// the 1.x write endpoint.

use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Timestamp precision of a write request (`precision=` query parameter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    #[default]
    Seconds,
    Minutes,
    Hours,
}

impl Precision {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nanoseconds => "n",
            Self::Microseconds => "u",
            Self::Milliseconds => "ms",
            Self::Seconds => "s",
            Self::Minutes => "m",
            Self::Hours => "h",
        }
    }
}

/// A single line-protocol field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    Boolean(bool),
    String(String),
}

/// One point in wire form. Tags and fields are sorted by key.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, FieldValue>,
    pub timestamp: Option<i64>,
}

impl Point {
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            timestamp: None,
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

    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Encode as one line of line protocol.
    ///
    /// Returns `None` when no field survives encoding (non-finite floats
    /// are unrepresentable). Tags with empty values are omitted since the
    /// server rejects them.
    pub fn to_line(&self) -> Option<String> {
        let mut fields = String::new();
        for (key, value) in &self.fields {
            let encoded = match value {
                FieldValue::Float(f) if !f.is_finite() => continue,
                FieldValue::Float(f) => f.to_string(),
                FieldValue::Integer(i) => format!("{i}i"),
                FieldValue::Boolean(b) => b.to_string(),
                FieldValue::String(s) => format!("\"{}\"", escape_string_field(s)),
            };
            if !fields.is_empty() {
                fields.push(',');
            }
            let _ = write!(fields, "{}={encoded}", escape_key(key));
        }
        if fields.is_empty() {
            return None;
        }

        let mut line = escape_measurement(&self.measurement);
        for (key, value) in &self.tags {
            if value.is_empty() {
                continue;
            }
            let _ = write!(line, ",{}={}", escape_key(key), escape_key(value));
        }
        line.push(' ');
        line.push_str(&fields);
        if let Some(ts) = self.timestamp {
            let _ = write!(line, " {ts}");
        }
        Some(line)
    }
}

fn escape_measurement(s: &str) -> String {
    escape(s, &[',', ' '])
}

/// Tag keys, tag values and field keys share one escaping rule.
fn escape_key(s: &str) -> String {
    escape(s, &[',', '=', ' '])
}

fn escape_string_field(s: &str) -> String {
    escape(s, &['"', '\\'])
}

fn escape(s: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    #[test]
    fn encodes_tags_fields_and_timestamp() {
        let point = Point::new("panels.event.com.fibaro.binarySwitch")
            .tag("device_id", "1")
            .tag("room_name", "Living room")
            .field("power", FieldValue::Float(1.0))
            .field("mode", FieldValue::String("heat".into()))
            .timestamp(1000);

        assert_snapshot!(
            point.to_line().unwrap(),
            @r#"panels.event.com.fibaro.binarySwitch,device_id=1,room_name=Living\ room mode="heat",power=1 1000"#
        );
    }

    #[test]
    fn escapes_special_characters() {
        let point = Point::new("my measurement,x")
            .tag("k=1", "a,b")
            .field("say", FieldValue::String(r#"he said "hi" \o/"#.into()))
            .field("n", FieldValue::Integer(-3))
            .field("ok", FieldValue::Boolean(true));

        assert_snapshot!(
            point.to_line().unwrap(),
            @r#"my\ measurement\,x,k\=1=a\,b n=-3i,ok=true,say="he said \"hi\" \\o/""#
        );
    }

    #[test]
    fn drops_empty_tags_and_non_finite_fields() {
        let point = Point::new("m")
            .tag("empty", "")
            .field("nan", FieldValue::Float(f64::NAN))
            .field("v", FieldValue::Float(42.5));
        assert_eq!(point.to_line().as_deref(), Some("m v=42.5"));

        let only_nan = Point::new("m").field("nan", FieldValue::Float(f64::NAN));
        assert_eq!(only_nan.to_line(), None);
    }

    #[test]
    fn precision_query_values() {
        assert_eq!(Precision::Seconds.as_str(), "s");
        assert_eq!(Precision::Milliseconds.as_str(), "ms");
        assert_eq!(Precision::default(), Precision::Seconds);
    }
}
