//! Command dispatch: config file -> engine wiring -> summary output.

pub mod config_cmd;
pub mod snapshot;
pub mod sync;

use hcsync_config::{Overrides, config_path, load_config, to_sync_config};
use hcsync_core::{
    CanonicalPoint, CoreError, CursorTracker, DeviceId, HcSource, InfluxSink, LogSink,
    MemoryStore, Outcome, PointSink, Precision, StreamReport,
};
use tracing::debug;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;
use crate::output;

/// Sink chosen at startup: InfluxDB, or the log for `--dry-run`.
pub enum Sink {
    Influx(InfluxSink),
    Log(LogSink),
}

impl PointSink for Sink {
    async fn write_points(
        &self,
        points: &[CanonicalPoint],
        precision: Precision,
    ) -> Result<(), CoreError> {
        match self {
            Self::Influx(sink) => sink.write_points(points, precision).await,
            Self::Log(sink) => sink.write_points(points, precision).await,
        }
    }
}

/// Everything a sync command needs, built from the config file.
pub struct Runtime {
    pub source: HcSource,
    pub sink: Sink,
    pub tracker: CursorTracker,
    pub consumption_devices: Vec<DeviceId>,
}

impl Runtime {
    pub fn connect(global: &GlobalOpts) -> Result<Self, CliError> {
        let path = config_path(global.config.as_deref());
        let file = load_config(&path).map_err(|e| CliError::from_config(e, &path))?;
        let config = to_sync_config(
            &file,
            Overrides {
                insecure: global.insecure,
                timeout: global.timeout,
            },
        )
        .map_err(|e| CliError::from_config(e, &path))?;

        let (sink, tracker) = if global.dry_run {
            debug!("dry run: logging points, keeping cursors in memory");
            (Sink::Log(LogSink), CursorTracker::new(MemoryStore::new()))
        } else {
            let store = config.storage.open().map_err(CoreError::from)?;
            (
                Sink::Influx(config.influx.sink()?),
                CursorTracker::from_boxed(store),
            )
        };

        Ok(Self {
            source: config.hc.source()?,
            sink,
            tracker,
            consumption_devices: config.consumption_devices,
        })
    }
}

/// Print the summary, then turn the first failed stream into the error
/// the process exits with.
pub fn finish(reports: Vec<StreamReport>, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(global.color);
    output::print_output(&output::render_summary(&reports, color), global.quiet);

    let failure = reports.into_iter().find_map(|r| match r.outcome {
        Outcome::Failed(err) => Some(err),
        Outcome::Done(_) => None,
    });
    failure.map_or(Ok(()), |err| Err(err.into()))
}

/// Dispatch a controller-bound command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let runtime = Runtime::connect(global)?;
    match cmd {
        Command::Events(args) => sync::events(&runtime, &args, global).await,
        Command::Consumption(args) => sync::consumption(&runtime, &args, global).await,
        Command::RefreshStates => sync::refresh_states(&runtime, global).await,
        Command::Weather => snapshot::weather(&runtime, global).await,
        Command::Diagnostics => snapshot::diagnostics(&runtime, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Usage {
            message: "command does not talk to the controller".into(),
            hint: None,
        }),
    }
}
