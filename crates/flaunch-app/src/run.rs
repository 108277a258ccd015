//! Launch orchestration entry point
//!
//! Control flow: flags → debugging configuration → device resolution (with
//! concurrent capability probes) → validation gate → branch on the machine
//! flag → either protocol handoff or strategy selection + supervision.

use flaunch_core::prelude::*;
use flaunch_daemon::{DeviceResolver, ProtocolClient};

use crate::machine::run_machine;
use crate::options::RunOptions;
use crate::runner::Runner;
use crate::signal::AppStartedSignal;
use crate::strategy::RunnerKind;
use crate::supervisor::{launch_labels, supervise, LaunchResult, Reporter};
use crate::validator::validate_devices;

/// Execute one launch invocation to completion.
///
/// Exactly one [`LaunchResult`] is produced per invocation, or the invocation
/// aborts with a fatal error before any session is started.
pub async fn run_app<R, C>(
    options: RunOptions,
    resolver: &R,
    protocol: Option<&C>,
    reporter: &dyn Reporter,
) -> Result<LaunchResult>
where
    R: DeviceResolver,
    C: ProtocolClient,
{
    let debugging = options.debugging_options();

    let devices = resolver.resolve_target_devices().await?.unwrap_or_default();
    let kind = RunnerKind::select(options.build_mode, options.use_hot_reload);

    validate_devices(
        &devices,
        &options,
        resolver.has_requested_all_devices(),
        kind,
    )?;

    if options.machine {
        let client = protocol.ok_or_else(|| {
            Error::config("machine mode requires a protocol server connection")
        })?;
        return run_machine(&devices, &options, client, reporter).await;
    }

    info!(
        "Launching with the {} strategy on {} device(s)",
        kind.label(),
        devices.len()
    );

    let labels = launch_labels(kind, options.build_mode, &devices);
    let signal = AppStartedSignal::new();
    let route = options.route.clone();
    let should_build = options.should_build();

    let mut runner = Runner::new(kind, devices, &options, debugging);
    supervise(
        &mut runner,
        &signal,
        route.as_deref(),
        should_build,
        labels,
        reporter,
    )
    .await
}
