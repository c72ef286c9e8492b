// ── Snapshot syncs ──
//
// Weather and diagnostics are point-in-time readings: one fetch, one
// write, no cursor. They report through the same `StreamReport` as the
// incremental streams.

use tracing::{info, warn};

use crate::builder::tag_value;
use crate::error::CoreError;
use crate::fetch::StopReason;
use crate::model::{CanonicalPoint, Diagnostics, FieldValue, StreamKey, Weather};
use crate::sink::{PointSink, Precision};
use crate::source::TelemetrySource;
use crate::sync::{Outcome, StreamReport};

pub const WEATHER_STREAM: &str = "weather";
pub const DIAGNOSTICS_STREAM: &str = "diagnostics";

pub struct SnapshotSync<'a, S, K> {
    source: &'a S,
    sink: &'a K,
    now: i64,
}

impl<'a, S: TelemetrySource, K: PointSink> SnapshotSync<'a, S, K> {
    pub fn new(source: &'a S, sink: &'a K) -> Self {
        Self {
            source,
            sink,
            now: chrono::Utc::now().timestamp(),
        }
    }

    /// Pin the timestamp written on every point.
    pub fn at(mut self, now: i64) -> Self {
        self.now = now;
        self
    }

    pub async fn weather(&self) -> StreamReport {
        let fetched = self.source.weather().await;
        let now = self.now;
        self.write(WEATHER_STREAM, fetched.map(|w| vec![weather_point(&w, now)]))
            .await
    }

    pub async fn diagnostics(&self) -> StreamReport {
        let fetched = self.source.diagnostics().await;
        let now = self.now;
        self.write(
            DIAGNOSTICS_STREAM,
            fetched.map(|d| diagnostics_points(&d, now)),
        )
        .await
    }

    async fn write(
        &self,
        stream: &str,
        fetched: Result<Vec<CanonicalPoint>, CoreError>,
    ) -> StreamReport {
        let mut report = StreamReport::new(StreamKey::named(stream));
        report.calls = 1;

        let points = match fetched {
            Ok(points) => points,
            Err(err) => {
                report.outcome = Outcome::Failed(CoreError::Fetch {
                    stream: stream.to_owned(),
                    reason: err.to_string(),
                });
                warn!(stream, "snapshot fetch failed");
                return report;
            }
        };
        report.found = points.len();

        if let Err(err) = self.sink.write_points(&points, Precision::Seconds).await {
            report.skipped = points.len();
            report.outcome = Outcome::Failed(match err {
                CoreError::SinkWrite { .. } => err,
                other => CoreError::SinkWrite {
                    reason: other.to_string(),
                },
            });
            warn!(stream, "snapshot write failed");
            return report;
        }

        report.inserted = points.len();
        report.outcome = Outcome::Done(StopReason::CaughtUp);
        info!(stream, inserted = report.inserted, "snapshot written");
        report
    }
}

/// `weather` measurement with units and condition as tags.
pub fn weather_point(weather: &Weather, timestamp: i64) -> CanonicalPoint {
    CanonicalPoint::new("weather", timestamp)
        .tag("temperatureUnit", tag_value(&weather.temperature_unit))
        .tag("windUnit", tag_value(&weather.wind_unit))
        .tag("weatherCondition", tag_value(&weather.condition))
        .tag("conditionCode", tag_value(&weather.condition_code))
        .field("temperature", FieldValue::Float(weather.temperature))
        .field("humidity", FieldValue::Float(weather.humidity))
        .field("wind", FieldValue::Float(weather.wind))
}

/// One `system.memory` point, one `system.storage` point per volume and
/// one `system.cpuLoad` point per CPU.
pub fn diagnostics_points(diagnostics: &Diagnostics, timestamp: i64) -> Vec<CanonicalPoint> {
    let memory = diagnostics.memory;
    let mut points = vec![
        CanonicalPoint::new("system.memory", timestamp)
            .field("free", FieldValue::Integer(memory.free))
            .field("cache", FieldValue::Integer(memory.cache))
            .field("buffers", FieldValue::Integer(memory.buffers))
            .field("used", FieldValue::Integer(memory.used)),
    ];

    points.extend(diagnostics.storage.iter().map(|volume| {
        CanonicalPoint::new("system.storage", timestamp)
            .tag("type", tag_value(&volume.kind))
            .tag("name", tag_value(&volume.name))
            .field("used", FieldValue::Float(volume.used))
    }));

    points.extend(diagnostics.cpus.iter().map(|cpu| {
        CanonicalPoint::new("system.cpuLoad", timestamp)
            .tag("name", tag_value(&cpu.name))
            .tag("user", tag_value(&cpu.user))
            .field("nice", FieldValue::Integer(cpu.nice))
            .field("system", FieldValue::Integer(cpu.system))
            .field("idle", FieldValue::Integer(cpu.idle))
    }));

    points
}
