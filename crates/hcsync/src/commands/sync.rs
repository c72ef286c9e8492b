//! Incremental stream commands: events, consumption, refresh-states.

use hcsync_core::{ConsumptionParams, DeviceId, EventParams, StreamRequest, SyncOrchestrator};
use tracing::debug;

use super::{Runtime, finish};
use crate::cli::{ConsumptionArgs, EventsArgs, GlobalOpts};
use crate::error::CliError;
use crate::output::Progress;

async fn run(
    runtime: &Runtime,
    request: &StreamRequest,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    debug!(request = ?request, "starting sync");
    let progress = Progress::new(global.quiet);
    let result = SyncOrchestrator::new(&runtime.source, &runtime.sink, &runtime.tracker)
        .with_observer(&progress)
        .run(request)
        .await;
    progress.finish();

    finish(result?.streams, global)
}

pub async fn events(
    runtime: &Runtime,
    args: &EventsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let params = EventParams {
        limit: args.limit,
        max_calls: args.max_calls,
    };
    run(runtime, &StreamRequest::Events(params), global).await
}

pub async fn consumption(
    runtime: &Runtime,
    args: &ConsumptionArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let devices: Vec<DeviceId> = if args.devices.is_empty() {
        runtime.consumption_devices.clone()
    } else {
        args.devices.iter().copied().map(DeviceId).collect()
    };
    if devices.is_empty() {
        return Err(CliError::Usage {
            message: "no devices to poll for consumption".into(),
            hint: Some("Pass --device <ID> or list them in [consumption].devices.".into()),
        });
    }

    let params = ConsumptionParams {
        devices,
        span: args.span,
        max_calls: args.max_calls,
        start_timestamp: args.start_timestamp,
    };
    run(runtime, &StreamRequest::Consumption(params), global).await
}

pub async fn refresh_states(runtime: &Runtime, global: &GlobalOpts) -> Result<(), CliError> {
    run(runtime, &StreamRequest::StateChanges, global).await
}
