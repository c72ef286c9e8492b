// ── Paginated fetch loop ──
//
// Pull-based: the orchestrator calls `next_batch()` until it gets a
// `Step::Stop`. One strategy per `StreamKind`; every page or window
// request spends one unit of the run's call budget.

use strum::Display;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::{ConsumptionSample, Cursor, DeviceId, RawRecord, StreamKey, StreamKind};
use crate::source::TelemetrySource;

/// Token used for the very first refreshStates poll.
pub const INITIAL_TOKEN: &str = "1";

/// Why a stream stopped producing batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum StopReason {
    /// The per-run call budget ran out; more data may remain.
    BudgetExhausted,
    /// Nothing newer than the run's boundary is left.
    CaughtUp,
    /// A token poll returned no changes.
    EmptyBatch,
}

/// Maximum number of fetch calls for one stream in one run.
#[derive(Debug, Clone, Copy)]
pub struct CallBudget {
    remaining: u32,
    used: u32,
}

impl CallBudget {
    pub fn new(max_calls: u32) -> Self {
        Self {
            remaining: max_calls,
            used: 0,
        }
    }

    /// Spend one call. Returns `false` when nothing is left.
    pub fn try_spend(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.used += 1;
        true
    }

    pub fn used(&self) -> u32 {
        self.used
    }
}

/// Records from one fetch call plus the position they move the stream to.
///
/// `records` may be empty; the cursor still advances past the queried
/// range.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub records: Vec<RawRecord>,
    pub advance_to: Option<Cursor>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Batch(Batch),
    Stop(StopReason),
}

/// Stream parameters, one variant per pagination strategy.
#[derive(Debug, Clone)]
pub enum StreamSpec {
    /// Panel events paged by id.
    Events { limit: u32 },
    /// Consumption windows of `span` seconds for one device. `start` is
    /// used only when no cursor exists.
    Consumption {
        device: DeviceId,
        span: i64,
        start: i64,
    },
    /// refreshStates long-poll.
    StateChanges,
}

impl StreamSpec {
    pub fn kind(&self) -> StreamKind {
        match self {
            Self::Events { .. } => StreamKind::IdOffset,
            Self::Consumption { .. } => StreamKind::TimeWindow,
            Self::StateChanges => StreamKind::Token,
        }
    }

    pub fn key(&self) -> StreamKey {
        match self {
            Self::Events { .. } => StreamKey::events(),
            Self::Consumption { device, .. } => StreamKey::consumption(*device),
            Self::StateChanges => StreamKey::state_changes(),
        }
    }
}

enum Strategy {
    IdOffset {
        limit: u32,
        position: u64,
        /// Newest id at the time of the first call. Outer `None` means not
        /// probed yet.
        boundary: Option<Option<u64>>,
    },
    TimeWindow {
        device: DeviceId,
        span: i64,
        position: i64,
    },
    Token {
        token: Option<String>,
    },
}

/// Drives one stream from its stored cursor to a stop condition.
pub struct FetchLoop<'a, S> {
    source: &'a S,
    key: StreamKey,
    strategy: Strategy,
    budget: CallBudget,
    /// Run-wide "now" (Unix seconds).
    now: i64,
    finished: Option<StopReason>,
}

impl<'a, S: TelemetrySource> FetchLoop<'a, S> {
    /// Build the loop for `spec`, resuming after `cursor`.
    ///
    /// A cursor of the wrong kind is ignored.
    pub fn new(
        source: &'a S,
        spec: &StreamSpec,
        cursor: Option<&Cursor>,
        budget: CallBudget,
        now: i64,
    ) -> Self {
        let strategy = match *spec {
            StreamSpec::Events { limit } => Strategy::IdOffset {
                limit: limit.max(1),
                position: match cursor {
                    Some(Cursor::EventId(id)) => *id,
                    _ => 0,
                },
                boundary: None,
            },
            StreamSpec::Consumption {
                device,
                span,
                start,
            } => Strategy::TimeWindow {
                device,
                span: span.max(1),
                position: match cursor {
                    Some(Cursor::WindowEnd(end)) => *end,
                    _ => start,
                },
            },
            StreamSpec::StateChanges => Strategy::Token {
                token: match cursor {
                    Some(Cursor::Token(token)) => Some(token.clone()),
                    _ => None,
                },
            },
        };

        Self {
            source,
            key: spec.key(),
            strategy,
            budget,
            now,
            finished: None,
        }
    }

    /// Number of fetch calls spent so far.
    pub fn calls(&self) -> u32 {
        self.budget.used()
    }

    pub async fn next_batch(&mut self) -> Result<Step, CoreError> {
        if let Some(reason) = self.finished {
            return Ok(Step::Stop(reason));
        }
        match self.strategy {
            Strategy::IdOffset { .. } => self.next_events_page().await,
            Strategy::TimeWindow { .. } => self.next_window().await,
            Strategy::Token { .. } => self.poll_token().await,
        }
    }

    fn stop(&mut self, reason: StopReason) -> Step {
        self.finished = Some(reason);
        Step::Stop(reason)
    }

    fn fetch_error(&self, err: &CoreError) -> CoreError {
        CoreError::Fetch {
            stream: self.key.to_string(),
            reason: err.to_string(),
        }
    }

    // ── Id-offset ────────────────────────────────────────────────────

    async fn next_events_page(&mut self) -> Result<Step, CoreError> {
        let Strategy::IdOffset {
            limit,
            position,
            boundary,
        } = self.strategy
        else {
            return Ok(self.stop(StopReason::CaughtUp));
        };

        let boundary = if let Some(probed) = boundary {
            probed
        } else {
            let probed = self
                .source
                .newest_event_id()
                .await
                .map_err(|e| self.fetch_error(&e))?;
            debug!(stream = %self.key, boundary = ?probed, "captured event boundary");
            if let Strategy::IdOffset { boundary, .. } = &mut self.strategy {
                *boundary = Some(probed);
            }
            probed
        };

        let Some(boundary) = boundary else {
            return Ok(self.stop(StopReason::CaughtUp));
        };
        if position >= boundary {
            return Ok(self.stop(StopReason::CaughtUp));
        }
        if !self.budget.try_spend() {
            return Ok(self.stop(StopReason::BudgetExhausted));
        }

        let from = position + 1;
        let to = from.saturating_add(u64::from(limit) - 1);
        debug!(stream = %self.key, from, limit, "fetching events page");

        let mut page = self
            .source
            .list_events(from, limit)
            .await
            .map_err(|e| self.fetch_error(&e))?;
        page.sort_by_key(|e| e.id);

        // An empty page, or one holding only already-seen ids, still moves
        // the cursor past the queried range, clamped to the boundary.
        let advance = match page.last().map(|e| e.id) {
            Some(newest) if newest > position => newest,
            _ => to.min(boundary),
        };

        if let Strategy::IdOffset { position, .. } = &mut self.strategy {
            *position = advance;
        }
        if advance >= boundary {
            self.finished = Some(StopReason::CaughtUp);
        }

        Ok(Step::Batch(Batch {
            records: page.into_iter().map(RawRecord::Event).collect(),
            advance_to: Some(Cursor::EventId(advance)),
        }))
    }

    // ── Time-window ──────────────────────────────────────────────────

    async fn next_window(&mut self) -> Result<Step, CoreError> {
        let Strategy::TimeWindow {
            device,
            span,
            position,
        } = self.strategy
        else {
            return Ok(self.stop(StopReason::CaughtUp));
        };

        let (Some(from), Some(to)) = (position.checked_add(1), position.checked_add(span)) else {
            return Ok(self.stop(StopReason::CaughtUp));
        };
        // Never read an interval that has not fully elapsed.
        if to > self.now {
            return Ok(self.stop(StopReason::CaughtUp));
        }
        if !self.budget.try_spend() {
            return Ok(self.stop(StopReason::BudgetExhausted));
        }

        debug!(stream = %self.key, from, to, "fetching consumption window");
        let aggregate = self
            .source
            .consumption(device, from, to)
            .await
            .map_err(|e| self.fetch_error(&e))?;

        if let Strategy::TimeWindow { position, .. } = &mut self.strategy {
            *position = to;
        }

        let records = match aggregate {
            Some(aggregate) => vec![RawRecord::ConsumptionSample(ConsumptionSample {
                device_id: device,
                aggregate,
                timestamp: from + (to - from) / 2,
            })],
            None => {
                debug!(stream = %self.key, from, to, "window holds no data");
                Vec::new()
            }
        };

        Ok(Step::Batch(Batch {
            records,
            advance_to: Some(Cursor::WindowEnd(to)),
        }))
    }

    // ── Token ────────────────────────────────────────────────────────

    async fn poll_token(&mut self) -> Result<Step, CoreError> {
        let Strategy::Token { token } = &self.strategy else {
            return Ok(self.stop(StopReason::CaughtUp));
        };
        let last = token.clone().unwrap_or_else(|| INITIAL_TOKEN.to_owned());

        if !self.budget.try_spend() {
            return Ok(self.stop(StopReason::BudgetExhausted));
        }

        debug!(stream = %self.key, last = %last, "polling state changes");
        let poll = self
            .source
            .refresh_states(&last)
            .await
            .map_err(|e| self.fetch_error(&e))?;

        let Some(changes) = poll.changes else {
            return Err(CoreError::Fetch {
                stream: self.key.to_string(),
                reason: "response has no 'changes' list".into(),
            });
        };
        if poll.last.is_none() {
            warn!(stream = %self.key, "poll returned no continuation token");
        }

        let timestamp = poll.timestamp.unwrap_or(self.now);
        // A single poll per run: the next call reports why we stopped.
        self.finished = Some(if changes.is_empty() {
            StopReason::EmptyBatch
        } else {
            StopReason::CaughtUp
        });

        let records = changes
            .into_iter()
            .map(|change| RawRecord::change(change, timestamp))
            .collect();

        Ok(Step::Batch(Batch {
            records,
            advance_to: poll.last.map(Cursor::Token),
        }))
    }
}
