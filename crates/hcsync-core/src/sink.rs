// ── Time-series sink ──
//
// Where built points go. One `write_points` call is all-or-nothing from
// the engine's point of view.

use std::future::Future;

use hcsync_api::influx::{self, InfluxClient};
pub use hcsync_api::Precision;
use tracing::info;

use crate::error::CoreError;
use crate::model::CanonicalPoint;

pub trait PointSink: Send + Sync {
    fn write_points(
        &self,
        points: &[CanonicalPoint],
        precision: Precision,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// [`PointSink`] writing to an InfluxDB 1.x database.
pub struct InfluxSink {
    client: InfluxClient,
}

impl InfluxSink {
    pub fn new(client: InfluxClient) -> Self {
        Self { client }
    }
}

impl PointSink for InfluxSink {
    async fn write_points(
        &self,
        points: &[CanonicalPoint],
        precision: Precision,
    ) -> Result<(), CoreError> {
        let wire: Vec<influx::Point> = points.iter().map(influx::Point::from).collect();
        self.client
            .write_points(&wire, precision)
            .await
            .map_err(|e| CoreError::SinkWrite {
                reason: CoreError::from(e).to_string(),
            })
    }
}

/// [`PointSink`] that only logs the line protocol it would have sent.
/// Used for `--dry-run`.
#[derive(Debug, Default)]
pub struct LogSink;

impl PointSink for LogSink {
    async fn write_points(
        &self,
        points: &[CanonicalPoint],
        _precision: Precision,
    ) -> Result<(), CoreError> {
        for point in points {
            if let Some(line) = influx::Point::from(point).to_line() {
                info!(target: "hcsync::dry_run", "{line}");
            }
        }
        Ok(())
    }
}
