//! Session supervision and result mapping
//!
//! The supervisor owns the Starting → Running → Terminated lifecycle of one
//! session: Running is entered when the app-started signal fires, Terminated
//! when the session's run call returns. Its wait is bounded by the run call,
//! never by the signal — a session that dies before starting still
//! terminates the invocation cleanly, with `started_at` absent.

use chrono::{DateTime, Local};

use flaunch_core::prelude::*;
use flaunch_core::BuildMode;
use flaunch_daemon::TargetDevice;

use crate::runner::AppSession;
use crate::signal::AppStartedSignal;
use crate::strategy::RunnerKind;

/// Uniform outcome of one launch invocation
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchResult {
    /// The session's real exit code (0 on success)
    pub exit_code: i32,

    /// When the app reached a runnable state; absent if it never did.
    /// This is the signal's fire time, not the time the run call returned,
    /// so downstream duration metrics measure time-to-interactive.
    pub started_at: Option<DateTime<Local>>,

    /// Ordered description of the launch for the reporting sink
    pub label_parts: Vec<String>,
}

impl LaunchResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn label(&self) -> String {
        self.label_parts.join("-")
    }
}

/// Reporting sink for launch timing/analytics
pub trait Reporter {
    fn report(&self, result: &LaunchResult);
}

/// Default sink: structured log output only
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, result: &LaunchResult) {
        info!(
            exit_code = result.exit_code,
            started_at = ?result.started_at,
            label = %result.label(),
            "launch finished"
        );
    }
}

/// Session lifecycle phase tracked by the supervisor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Starting,
    Running,
    Terminated,
}

/// Label parts describing this launch: reload kind, build mode, platform
/// kind (or "multiple"), and "emulator" for a single local emulator.
pub fn launch_labels(kind: RunnerKind, mode: BuildMode, devices: &[TargetDevice]) -> Vec<String> {
    let mut parts = vec![kind.label().to_string(), mode.name().to_string()];

    if let [device] = devices {
        parts.push(device.platform.name().to_string());
        if device.emulator {
            parts.push("emulator".to_string());
        }
    } else {
        parts.push("multiple".to_string());
    }

    parts
}

/// Run a session to completion and map its exit code to an invocation result.
///
/// The produced [`LaunchResult`] always reaches the reporter, carrying the
/// session's real exit code; a nonzero code then fails the invocation with
/// [`Error::SessionExitFailure`] so the process exits with that same code.
pub async fn supervise<S: AppSession>(
    session: &mut S,
    signal: &AppStartedSignal,
    route: Option<&str>,
    should_build: bool,
    label_parts: Vec<String>,
    reporter: &dyn Reporter,
) -> Result<LaunchResult> {
    let mut phase = SessionPhase::Starting;
    let mut started = signal.subscribe();

    let run = session.run(signal, route, should_build);
    tokio::pin!(run);

    let exit_code = loop {
        tokio::select! {
            code = &mut run => break code?,
            changed = started.wait_for(|slot| slot.is_some()),
                if phase == SessionPhase::Starting =>
            {
                if changed.is_ok() {
                    phase = SessionPhase::Running;
                    info!("Session is running");
                }
            }
        }
    };
    debug!("Session terminated (was {:?})", phase);

    let result = LaunchResult {
        exit_code,
        started_at: signal.started_at(),
        label_parts,
    };
    reporter.report(&result);

    if exit_code != 0 {
        return Err(Error::SessionExitFailure { code: exit_code });
    }
    Ok(result)
}
