// ── Sync orchestrator ──
//
// Runs one stream at a time through
// Init → LoadingReference → Fetching → Deduplicating → Building → Writing
// → AdvancingCursor → (Fetching | Done | Failed).
//
// Every call is awaited in order; nothing is spawned. The cursor is stored
// only after the sink accepted the batch, so a crash in between re-sends
// that batch on the next run rather than losing it.

use strum::Display;
use tracing::{debug, info, warn};

use crate::builder::PointBuilder;
use crate::cursor::CursorTracker;
use crate::error::CoreError;
use crate::fetch::{Batch, CallBudget, FetchLoop, Step, StopReason, StreamSpec};
use crate::model::{CanonicalPoint, Cursor, DeviceId, StreamKey};
use crate::reference::{ReferenceDataCache, ReferenceIndex};
use crate::sink::{PointSink, Precision};
use crate::source::TelemetrySource;

// ── Run parameters ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventParams {
    /// Page size of each events request.
    pub limit: u32,
    pub max_calls: u32,
}

impl Default for EventParams {
    fn default() -> Self {
        Self {
            limit: 25,
            max_calls: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumptionParams {
    pub devices: Vec<DeviceId>,
    /// Window length in seconds.
    pub span: i64,
    /// Calls per device.
    pub max_calls: u32,
    /// Starting point for devices without a stored cursor.
    pub start_timestamp: i64,
}

impl Default for ConsumptionParams {
    fn default() -> Self {
        Self {
            devices: Vec::new(),
            span: 60,
            max_calls: 3,
            // 2020-01-01T00:00:00Z
            start_timestamp: 1_577_836_800,
        }
    }
}

/// What `run` should sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamRequest {
    Events(EventParams),
    Consumption(ConsumptionParams),
    StateChanges,
}

// ── Reports ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum SyncPhase {
    Init,
    LoadingReference,
    Fetching,
    Deduplicating,
    Building,
    Writing,
    AdvancingCursor,
    Done,
    Failed,
}

#[derive(Debug)]
pub enum Outcome {
    Done(StopReason),
    Failed(CoreError),
}

/// Counters and end state of one stream.
#[derive(Debug)]
pub struct StreamReport {
    pub stream: StreamKey,
    /// Records returned by the source.
    pub found: usize,
    /// Records that produced no point: duplicates and unrecognized shapes.
    pub skipped: usize,
    /// Points accepted by the sink.
    pub inserted: usize,
    /// Fetch calls spent.
    pub calls: u32,
    pub outcome: Outcome,
    /// Cursor stored when the stream ended.
    pub final_cursor: Option<Cursor>,
}

impl StreamReport {
    pub fn new(stream: StreamKey) -> Self {
        Self {
            stream,
            found: 0,
            skipped: 0,
            inserted: 0,
            calls: 0,
            outcome: Outcome::Done(StopReason::CaughtUp),
            final_cursor: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed(_))
    }

    pub fn error(&self) -> Option<&CoreError> {
        match &self.outcome {
            Outcome::Failed(err) => Some(err),
            Outcome::Done(_) => None,
        }
    }
}

/// Reports of every stream processed by one run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub streams: Vec<StreamReport>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        !self.streams.iter().any(StreamReport::is_failed)
    }

    /// The first failed stream's error, in processing order.
    pub fn first_error(&self) -> Option<&CoreError> {
        self.streams.iter().find_map(StreamReport::error)
    }

    pub fn inserted(&self) -> usize {
        self.streams.iter().map(|s| s.inserted).sum()
    }
}

// ── Observer ─────────────────────────────────────────────────────────

/// Progress hooks. All methods default to no-ops.
pub trait SyncObserver: Send + Sync {
    fn on_stream_start(&self, _stream: &StreamKey) {}

    /// Called after each batch with the counters so far.
    fn on_batch(&self, _report: &StreamReport) {}

    fn on_stream_end(&self, _report: &StreamReport) {}
}

struct NoopObserver;

impl SyncObserver for NoopObserver {}

// ── Orchestrator ─────────────────────────────────────────────────────

pub struct SyncOrchestrator<'a, S, K> {
    source: &'a S,
    sink: &'a K,
    tracker: &'a CursorTracker,
    observer: &'a dyn SyncObserver,
    now: i64,
}

impl<'a, S: TelemetrySource, K: PointSink> SyncOrchestrator<'a, S, K> {
    pub fn new(source: &'a S, sink: &'a K, tracker: &'a CursorTracker) -> Self {
        Self {
            source,
            sink,
            tracker,
            observer: &NoopObserver,
            now: chrono::Utc::now().timestamp(),
        }
    }

    /// Pin the run's "now" (Unix seconds).
    pub fn at(mut self, now: i64) -> Self {
        self.now = now;
        self
    }

    pub fn with_observer(mut self, observer: &'a dyn SyncObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Load reference data once, then sync the requested streams.
    ///
    /// Fails only when reference data cannot be loaded; stream failures
    /// are recorded in the report.
    pub async fn run(&self, request: &StreamRequest) -> Result<RunReport, CoreError> {
        phase(None, SyncPhase::LoadingReference);
        let index = ReferenceDataCache::new(self.source).load().await?;

        let streams = match request {
            StreamRequest::Events(params) => vec![self.sync_events(&index, params).await],
            StreamRequest::Consumption(params) => self.sync_consumption(&index, params).await,
            StreamRequest::StateChanges => vec![self.sync_state_changes(&index).await],
        };
        Ok(RunReport { streams })
    }

    pub async fn sync_events(&self, index: &ReferenceIndex, params: &EventParams) -> StreamReport {
        let spec = StreamSpec::Events {
            limit: params.limit,
        };
        self.drive(index, &spec, CallBudget::new(params.max_calls))
            .await
    }

    /// One stream per device, in the order given.
    pub async fn sync_consumption(
        &self,
        index: &ReferenceIndex,
        params: &ConsumptionParams,
    ) -> Vec<StreamReport> {
        let mut reports = Vec::with_capacity(params.devices.len());
        for &device in &params.devices {
            let spec = StreamSpec::Consumption {
                device,
                span: params.span,
                start: params.start_timestamp,
            };
            reports.push(
                self.drive(index, &spec, CallBudget::new(params.max_calls))
                    .await,
            );
        }
        reports
    }

    /// A single refreshStates poll.
    pub async fn sync_state_changes(&self, index: &ReferenceIndex) -> StreamReport {
        self.drive(index, &StreamSpec::StateChanges, CallBudget::new(1))
            .await
    }

    async fn drive(
        &self,
        index: &ReferenceIndex,
        spec: &StreamSpec,
        budget: CallBudget,
    ) -> StreamReport {
        let key = spec.key();
        let mut report = StreamReport::new(key.clone());
        self.observer.on_stream_start(&key);
        phase(Some(&key), SyncPhase::Init);

        let outcome = match self.tracker.get(&key, spec.kind()) {
            Ok(cursor) => {
                debug!(stream = %key, cursor = ?cursor, "resuming");
                report.final_cursor = cursor;
                let fetch = FetchLoop::new(
                    self.source,
                    spec,
                    report.final_cursor.as_ref(),
                    budget,
                    self.now,
                );
                self.pump(index, fetch, &mut report).await
            }
            Err(err) => Outcome::Failed(err),
        };
        report.outcome = outcome;

        match &report.outcome {
            Outcome::Done(reason) => {
                phase(Some(&key), SyncPhase::Done);
                info!(
                    stream = %key,
                    found = report.found,
                    skipped = report.skipped,
                    inserted = report.inserted,
                    calls = report.calls,
                    %reason,
                    "stream done"
                );
            }
            Outcome::Failed(err) => {
                phase(Some(&key), SyncPhase::Failed);
                warn!(stream = %key, error = %err, inserted = report.inserted, "stream failed");
            }
        }
        self.observer.on_stream_end(&report);
        report
    }

    /// Fetch and commit batches until the loop stops or something fails.
    async fn pump(
        &self,
        index: &ReferenceIndex,
        mut fetch: FetchLoop<'a, S>,
        report: &mut StreamReport,
    ) -> Outcome {
        let key = report.stream.clone();
        loop {
            phase(Some(&key), SyncPhase::Fetching);
            let step = fetch.next_batch().await;
            report.calls = fetch.calls();
            let batch = match step {
                Ok(Step::Batch(batch)) => batch,
                Ok(Step::Stop(reason)) => {
                    if reason == StopReason::EmptyBatch {
                        warn!(stream = %key, "poll returned no changes");
                    }
                    return Outcome::Done(reason);
                }
                Err(err) => return Outcome::Failed(err),
            };

            if let Err(err) = self.commit(index, batch, report).await {
                return Outcome::Failed(err);
            }
            self.observer.on_batch(report);
        }
    }

    /// Deduplicate, build, write, then advance the cursor for one batch.
    async fn commit(
        &self,
        index: &ReferenceIndex,
        batch: Batch,
        report: &mut StreamReport,
    ) -> Result<(), CoreError> {
        let key = report.stream.clone();
        report.found += batch.records.len();

        phase(Some(&key), SyncPhase::Deduplicating);
        let floor = match report.final_cursor {
            Some(Cursor::EventId(id)) => Some(id),
            _ => None,
        };
        let fresh: Vec<_> = batch
            .records
            .iter()
            .filter(|r| match (floor, r.event_id()) {
                (Some(floor), Some(id)) => id > floor,
                _ => true,
            })
            .collect();

        phase(Some(&key), SyncPhase::Building);
        let points: Vec<CanonicalPoint> = fresh
            .into_iter()
            .filter_map(|r| PointBuilder::build(r, index))
            .collect();
        report.skipped += batch.records.len() - points.len();

        if !points.is_empty() {
            phase(Some(&key), SyncPhase::Writing);
            self.sink
                .write_points(&points, Precision::Seconds)
                .await
                .map_err(|err| match err {
                    CoreError::SinkWrite { .. } => err,
                    other => CoreError::SinkWrite {
                        reason: other.to_string(),
                    },
                })?;
            report.inserted += points.len();
        }

        phase(Some(&key), SyncPhase::AdvancingCursor);
        if let Some(next) = batch.advance_to {
            let next = next.at_least(report.final_cursor.as_ref());
            if report.final_cursor.as_ref() != Some(&next) {
                self.tracker.set(&key, &next)?;
                report.final_cursor = Some(next);
            }
        }
        Ok(())
    }
}

fn phase(stream: Option<&StreamKey>, phase: SyncPhase) {
    match stream {
        Some(stream) => debug!(%stream, %phase, "phase"),
        None => debug!(%phase, "phase"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::cursor::{CursorStore, MemoryStore};
    use crate::model::{EnergyAggregate, FieldValue};
    use crate::reference::SENTINEL;
    use crate::testing::{FakeSink, FakeSource, property_event, sample_index};

    struct Fixture {
        source: FakeSource,
        sink: FakeSink,
        store: MemoryStore,
        tracker: CursorTracker,
    }

    impl Fixture {
        fn new(source: FakeSource) -> Self {
            let store = MemoryStore::new();
            Self {
                source,
                sink: FakeSink::default(),
                tracker: CursorTracker::new(store.clone()),
                store,
            }
        }

        fn orchestrator(&self) -> SyncOrchestrator<'_, FakeSource, FakeSink> {
            SyncOrchestrator::new(&self.source, &self.sink, &self.tracker).at(1_000_000)
        }

        async fn events(&self, limit: u32, max_calls: u32) -> StreamReport {
            let request = StreamRequest::Events(EventParams { limit, max_calls });
            let mut run = self.orchestrator().run(&request).await.unwrap();
            run.streams.remove(0)
        }
    }

    #[tokio::test]
    async fn end_to_end_single_event() {
        let source = FakeSource::with_reference();
        source.push_raw_events([property_event(5, 1, "power", json!("true"), 1000)]);
        let fx = Fixture::new(source);

        let report = fx.events(25, 1).await;

        let written = fx.sink.points();
        assert_eq!(written.len(), 1);
        let point = &written[0];
        assert_eq!(point.timestamp, 1000);
        assert_eq!(point.fields["power"], FieldValue::Float(1.0));
        assert_eq!(point.tags["device_id"], "1");
        assert_eq!(point.tags["device_name"], "Wall plug");
        assert_eq!(point.tags["room_name"], SENTINEL);
        assert_eq!(point.tags["room_id"], SENTINEL);

        assert_eq!(fx.store.get("events").as_deref(), Some("5"));
        assert_eq!((report.found, report.skipped, report.inserted), (1, 0, 1));
        assert!(matches!(report.outcome, Outcome::Done(StopReason::CaughtUp)));
    }

    #[tokio::test]
    async fn repeated_runs_forward_every_event_once() {
        let source = FakeSource::with_reference();
        source.push_property_events(1..=23);
        let fx = Fixture::new(source);

        let mut runs = 0;
        loop {
            let report = fx.events(4, 2).await;
            runs += 1;
            assert!(!report.is_failed());
            if matches!(report.outcome, Outcome::Done(StopReason::CaughtUp)) {
                break;
            }
            assert!(runs < 10, "never caught up");
        }

        let mut ids: Vec<i64> = fx.sink.points().iter().map(|p| p.timestamp).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=23).collect::<Vec<i64>>());
        assert_eq!(fx.store.get("events").as_deref(), Some("23"));
    }

    #[tokio::test]
    async fn rerun_without_new_data_writes_nothing() {
        let source = FakeSource::with_reference();
        source.push_property_events(1..=3);
        let fx = Fixture::new(source);

        fx.events(10, 1).await;
        let writes = fx.sink.write_calls();

        let second = fx.events(10, 1).await;
        assert_eq!(fx.sink.write_calls(), writes);
        assert_eq!(second.found, 0);
        assert_eq!(second.calls, 0);
    }

    #[tokio::test]
    async fn cursor_never_decreases_across_runs() {
        let source = FakeSource::with_reference();
        source.push_property_events(1..=12);
        let fx = Fixture::new(source);

        let mut last = 0_u64;
        for _ in 0..5 {
            fx.events(3, 1).await;
            let stored: u64 = fx.store.get("events").unwrap().parse().unwrap();
            assert!(stored >= last);
            last = stored;
        }
        assert_eq!(last, 12);
    }

    #[tokio::test]
    async fn overlapping_page_is_deduplicated() {
        let source = FakeSource::with_reference();
        source.push_property_events(1..=5);
        let fx = Fixture::new(source);
        fx.store.store("events", "3").unwrap();

        // Paging back from 5 with limit 3 returns 3, 4 and 5.
        let report = fx.events(3, 1).await;

        let timestamps: Vec<i64> = fx.sink.points().iter().map(|p| p.timestamp).collect();
        assert_eq!(timestamps, vec![4, 5]);
        assert_eq!((report.found, report.skipped, report.inserted), (3, 1, 2));
    }

    #[tokio::test]
    async fn unrecognized_events_still_advance_cursor() {
        let source = FakeSource::with_reference();
        source.push_unrecognized_events(1..=3);
        let fx = Fixture::new(source);

        let report = fx.events(10, 1).await;

        assert_eq!(fx.sink.write_calls(), 0);
        assert_eq!(report.skipped, 3);
        assert_eq!(fx.store.get("events").as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn failed_write_keeps_cursor_and_earlier_batches() {
        let source = FakeSource::with_reference();
        source.push_property_events(1..=6);
        let fx = Fixture::new(source);
        fx.sink.fail_after(1);

        let report = fx.events(3, 3).await;

        assert!(matches!(
            report.outcome,
            Outcome::Failed(CoreError::SinkWrite { .. })
        ));
        assert_eq!(report.inserted, 3);
        assert_eq!(fx.store.get("events").as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn fetch_failure_ends_stream() {
        let source = FakeSource::with_reference();
        source.push_property_events(1..=3);
        source.fail_events();
        let fx = Fixture::new(source);

        let report = fx.events(10, 1).await;

        assert!(matches!(report.outcome, Outcome::Failed(CoreError::Fetch { .. })));
        assert_eq!(fx.store.get("events"), None);
    }

    #[tokio::test]
    async fn corrupt_cursor_fails_stream_without_fetching() {
        let source = FakeSource::with_reference();
        source.push_property_events(1..=3);
        let fx = Fixture::new(source);
        fx.store.store("events", "not-a-number").unwrap();

        let report = fx.events(10, 1).await;

        assert!(matches!(
            report.outcome,
            Outcome::Failed(CoreError::CorruptCursor { .. })
        ));
        assert_eq!(fx.source.event_calls(), 0);
    }

    #[tokio::test]
    async fn reference_failure_aborts_run() {
        let source = FakeSource::with_reference();
        source.push_property_events(1..=3);
        source.fail_listing("sections");
        let fx = Fixture::new(source);

        let err = fx
            .orchestrator()
            .run(&StreamRequest::Events(EventParams::default()))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::ReferenceLoad { .. }));
        assert_eq!(fx.sink.write_calls(), 0);
        assert_eq!(fx.source.event_calls(), 0);
    }

    #[tokio::test]
    async fn consumption_runs_each_device_independently() {
        let source = FakeSource::with_reference();
        source.set_consumption(
            DeviceId(10),
            EnergyAggregate {
                energy_kwh: Some(0.5),
                power_current: Some(30.0),
                ..EnergyAggregate::default()
            },
        );
        let fx = Fixture::new(source);
        // Device 11 is already caught up; device 10 is not.
        fx.store.store("consumption_11", "999990").unwrap();

        let params = ConsumptionParams {
            devices: vec![DeviceId(11), DeviceId(10)],
            span: 60,
            max_calls: 3,
            start_timestamp: 999_000,
        };
        let run = fx
            .orchestrator()
            .run(&StreamRequest::Consumption(params))
            .await
            .unwrap();

        assert_eq!(run.streams.len(), 2);
        assert!(matches!(
            run.streams[0].outcome,
            Outcome::Done(StopReason::CaughtUp)
        ));
        assert_eq!(run.streams[0].calls, 0);
        assert!(matches!(
            run.streams[1].outcome,
            Outcome::Done(StopReason::BudgetExhausted)
        ));
        assert_eq!(run.streams[1].inserted, 3);
        assert_eq!(fx.store.get("consumption_10").as_deref(), Some("999180"));
        assert_eq!(fx.store.get("consumption_11").as_deref(), Some("999990"));

        let first = &fx.sink.points()[0];
        assert_eq!(first.measurement, "consumption");
        assert_eq!(first.timestamp, 999_030);
        assert!(!first.tags.contains_key("device_type"));
    }

    #[tokio::test]
    async fn empty_consumption_windows_advance_without_writes() {
        let fx = Fixture::new(FakeSource::with_reference());
        let params = ConsumptionParams {
            devices: vec![DeviceId(10)],
            span: 60,
            max_calls: 2,
            start_timestamp: 0,
        };

        let report = fx
            .orchestrator()
            .sync_consumption(&sample_index(), &params)
            .await
            .remove(0);

        assert_eq!(fx.sink.write_calls(), 0);
        assert_eq!(report.calls, 2);
        assert_eq!(fx.store.get("consumption_10").as_deref(), Some("120"));
    }

    #[tokio::test]
    async fn state_changes_store_token_after_write() {
        let source = FakeSource::with_reference();
        source.set_poll(
            Some(vec![
                json!({ "id": 10, "value": "true", "log": "" }),
                json!({ "id": 11, "log": "only bookkeeping" }),
            ]),
            Some("4242"),
            Some(1_700_000_000),
        );
        let fx = Fixture::new(source);

        let run = fx
            .orchestrator()
            .run(&StreamRequest::StateChanges)
            .await
            .unwrap();
        let report = &run.streams[0];

        assert_eq!((report.found, report.skipped, report.inserted), (2, 1, 1));
        assert_eq!(fx.store.get("refreshStates").as_deref(), Some("4242"));
        assert_eq!(fx.sink.points()[0].timestamp, 1_700_000_000);
        assert!(matches!(report.outcome, Outcome::Done(StopReason::CaughtUp)));
    }

    #[tokio::test]
    async fn change_without_device_id_counts_as_skipped() {
        let source = FakeSource::with_reference();
        source.set_poll(
            Some(vec![json!({ "id": 10, "value": 1 }), json!({ "value": 2 })]),
            Some("500"),
            None,
        );
        let fx = Fixture::new(source);

        let report = fx.orchestrator().sync_state_changes(&sample_index()).await;

        assert_eq!((report.found, report.skipped, report.inserted), (2, 1, 1));
        assert_eq!(fx.sink.points().len(), 1);
        assert_eq!(fx.store.get("refreshStates").as_deref(), Some("500"));
    }

    #[tokio::test]
    async fn empty_poll_reports_empty_batch() {
        let source = FakeSource::with_reference();
        source.set_poll(Some(Vec::new()), Some("12"), None);
        let fx = Fixture::new(source);
        fx.store.store("refreshStates", "11").unwrap();

        let report = fx.orchestrator().sync_state_changes(&sample_index()).await;

        assert!(matches!(report.outcome, Outcome::Done(StopReason::EmptyBatch)));
        assert_eq!(fx.source.polled_tokens(), vec!["11".to_owned()]);
        assert_eq!(fx.store.get("refreshStates").as_deref(), Some("12"));
        assert_eq!(fx.sink.write_calls(), 0);
    }

    #[tokio::test]
    async fn failed_state_write_keeps_old_token() {
        let source = FakeSource::with_reference();
        source.set_poll(Some(vec![json!({ "id": 10, "value": 1 })]), Some("13"), None);
        let fx = Fixture::new(source);
        fx.store.store("refreshStates", "12").unwrap();
        fx.sink.fail_after(0);

        let report = fx.orchestrator().sync_state_changes(&sample_index()).await;

        assert!(report.is_failed());
        assert_eq!(fx.store.get("refreshStates").as_deref(), Some("12"));
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl SyncObserver for Recorder {
        fn on_stream_start(&self, stream: &StreamKey) {
            self.events.lock().unwrap().push(format!("start {stream}"));
        }

        fn on_batch(&self, report: &StreamReport) {
            self.events
                .lock()
                .unwrap()
                .push(format!("batch {}", report.inserted));
        }

        fn on_stream_end(&self, report: &StreamReport) {
            self.events
                .lock()
                .unwrap()
                .push(format!("end {}", report.stream));
        }
    }

    #[tokio::test]
    async fn observer_sees_each_batch() {
        let source = FakeSource::with_reference();
        source.push_property_events(1..=4);
        let fx = Fixture::new(source);
        let recorder = Recorder::default();

        fx.orchestrator()
            .with_observer(&recorder)
            .sync_events(
                &sample_index(),
                &EventParams {
                    limit: 2,
                    max_calls: 5,
                },
            )
            .await;

        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec!["start events", "batch 2", "batch 4", "end events"]
        );
    }
}
