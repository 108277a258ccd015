//! Control-protocol session handoff
//!
//! The alternate launch path: instead of driving a runner, session startup is
//! delegated to an external protocol server's app domain and the orchestrator
//! waits for the session's externally reported completion. Mutually exclusive
//! with the runner path for any given invocation, and limited to exactly one
//! target device.

use chrono::Local;

use flaunch_core::prelude::*;
use flaunch_daemon::{ProtocolClient, StartAppRequest, TargetDevice};

use crate::options::RunOptions;
use crate::strategy::RunnerKind;
use crate::supervisor::{LaunchResult, Reporter};

/// Label identifying the protocol-handoff mode in launch results
const MACHINE_LABEL: &str = "machine";

/// Hand the session off to the protocol server and await its completion.
///
/// Handoff success is treated as "started": the timestamp is recorded
/// immediately, since this path has no separate app-started signal.
pub async fn run_machine<C: ProtocolClient>(
    devices: &[TargetDevice],
    options: &RunOptions,
    client: &C,
    reporter: &dyn Reporter,
) -> Result<LaunchResult> {
    if devices.len() != 1 {
        return Err(Error::unsupported(
            "the machine interface supports exactly one target device",
        ));
    }
    let device = &devices[0];

    let request = StartAppRequest {
        device_id: device.id.clone(),
        project_root: options.project_root.clone(),
        target: options.target.clone(),
        route: options.route.clone(),
        debugging: options.debugging_options(),
        enable_hot_reload: RunnerKind::select(options.build_mode, options.use_hot_reload)
            == RunnerKind::Hot,
        packages_file: options.packages_file.clone(),
        output_dill: options.output_dill.clone(),
        ipv6: options.ipv6,
    };

    let handle = client.start_app(&request).await.map_err(|err| match err {
        already @ Error::LaunchFailed { .. } => already,
        other => Error::launch_failed(other.to_string()),
    })?;

    let started_at = Some(Local::now());
    info!(
        "Session {} handed off to protocol server on {}",
        handle.app_id(),
        device.display_name()
    );

    let exit_code = handle.wait_for_completion().await?;
    let result = LaunchResult {
        exit_code,
        started_at,
        label_parts: vec![MACHINE_LABEL.to_string()],
    };
    reporter.report(&result);

    if exit_code != 0 {
        return Err(Error::SessionExitFailure { code: exit_code });
    }
    Ok(result)
}
