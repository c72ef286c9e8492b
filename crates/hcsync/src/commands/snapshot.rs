//! Snapshot commands: weather and diagnostics.

use hcsync_core::SnapshotSync;

use super::{Runtime, finish};
use crate::cli::GlobalOpts;
use crate::error::CliError;

pub async fn weather(runtime: &Runtime, global: &GlobalOpts) -> Result<(), CliError> {
    let report = SnapshotSync::new(&runtime.source, &runtime.sink)
        .weather()
        .await;
    finish(vec![report], global)
}

pub async fn diagnostics(runtime: &Runtime, global: &GlobalOpts) -> Result<(), CliError> {
    let report = SnapshotSync::new(&runtime.source, &runtime.sink)
        .diagnostics()
        .await;
    finish(vec![report], global)
}
