// ── Stream cursors ──
//
// A cursor is the only state that outlives a run. It is persisted as a
// plain string under a stream key, so directories written by earlier
// releases keep working.

use std::fmt;

use strum::Display;

use super::ids::DeviceId;

/// How a stream is paginated, and therefore what its cursor means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum StreamKind {
    /// Ordered by event id; cursor is the last processed id.
    IdOffset,
    /// Fixed-size time windows; cursor is the last window end.
    TimeWindow,
    /// Opaque continuation token issued by the source.
    Token,
}

/// Resume position of one stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cursor {
    EventId(u64),
    WindowEnd(i64),
    Token(String),
}

impl Cursor {
    /// Parse a stored value as a cursor of `kind`.
    ///
    /// Surrounding whitespace is ignored. Returns `None` for values that do
    /// not fit the kind, including empty tokens.
    pub fn parse(kind: StreamKind, raw: &str) -> Option<Self> {
        let raw = raw.trim();
        match kind {
            StreamKind::IdOffset => raw.parse().ok().map(Self::EventId),
            StreamKind::TimeWindow => raw.parse().ok().map(Self::WindowEnd),
            StreamKind::Token if raw.is_empty() => None,
            StreamKind::Token => Some(Self::Token(raw.to_owned())),
        }
    }

    pub fn kind(&self) -> StreamKind {
        match self {
            Self::EventId(_) => StreamKind::IdOffset,
            Self::WindowEnd(_) => StreamKind::TimeWindow,
            Self::Token(_) => StreamKind::Token,
        }
    }

    /// Combine a proposed cursor with the current one without moving
    /// ordered cursors backwards. Tokens are opaque and always replaced.
    #[must_use]
    pub fn at_least(self, current: Option<&Cursor>) -> Self {
        match (self, current) {
            (Self::EventId(next), Some(Self::EventId(cur))) => Self::EventId(next.max(*cur)),
            (Self::WindowEnd(next), Some(Self::WindowEnd(cur))) => Self::WindowEnd(next.max(*cur)),
            (next, _) => next,
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EventId(id) => write!(f, "{id}"),
            Self::WindowEnd(ts) => write!(f, "{ts}"),
            Self::Token(token) => f.write_str(token),
        }
    }
}

/// Name a cursor is stored under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamKey(String);

impl StreamKey {
    pub const EVENTS: &'static str = "events";
    pub const STATE_CHANGES: &'static str = "refreshStates";

    pub fn events() -> Self {
        Self(Self::EVENTS.into())
    }

    pub fn state_changes() -> Self {
        Self(Self::STATE_CHANGES.into())
    }

    pub fn consumption(device: DeviceId) -> Self {
        Self(format!("consumption_{device}"))
    }

    /// Key for a stream that keeps no cursor (snapshots).
    pub fn named(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
