//! Live-reload and one-shot runner sessions
//!
//! Both strategies spawn one `flutter run --machine` process per validated
//! device and drive its event stream: `app.started` events count down toward
//! firing the app-started signal, responses are routed to the request
//! tracker, and the dedicated wait task's exit event ends the session with
//! the real exit code.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use serde::Serialize;
use serde_json::json;
use tokio::sync::mpsc;

use flaunch_core::prelude::*;
use flaunch_core::DebuggingOptions;
use flaunch_daemon::{
    parse_daemon_message, AppProcess, DaemonMessage, ProcessEvent, RequestTracker, TargetDevice,
};

use crate::options::RunOptions;
use crate::signal::AppStartedSignal;
use crate::strategy::{DeviceRunConfig, RunnerKind};

/// How long a benchmark full restart may take before it is abandoned
const BENCHMARK_RESTART_TIMEOUT: Duration = Duration::from_secs(120);

/// Common session contract for both execution strategies
#[allow(async_fn_in_trait)]
pub trait AppSession {
    /// Run the session to completion (or until startup when not resident),
    /// returning the session's exit code.
    async fn run(
        &mut self,
        signal: &AppStartedSignal,
        route: Option<&str>,
        should_build: bool,
    ) -> Result<i32>;
}

/// Live-reload session
pub struct HotRunner {
    devices: Vec<DeviceRunConfig>,
    options: RunOptions,
    debugging: DebuggingOptions,
}

/// One-shot session
pub struct ColdRunner {
    devices: Vec<DeviceRunConfig>,
    options: RunOptions,
    debugging: DebuggingOptions,
}

impl AppSession for HotRunner {
    async fn run(
        &mut self,
        signal: &AppStartedSignal,
        route: Option<&str>,
        should_build: bool,
    ) -> Result<i32> {
        launch(
            &self.devices,
            &self.options,
            &self.debugging,
            RunnerKind::Hot,
            signal,
            route,
            should_build,
        )
        .await
    }
}

impl AppSession for ColdRunner {
    async fn run(
        &mut self,
        signal: &AppStartedSignal,
        route: Option<&str>,
        should_build: bool,
    ) -> Result<i32> {
        launch(
            &self.devices,
            &self.options,
            &self.debugging,
            RunnerKind::Cold,
            signal,
            route,
            should_build,
        )
        .await
    }
}

/// The session selected for this invocation, fixed at construction time
pub enum Runner {
    Hot(HotRunner),
    Cold(ColdRunner),
}

impl Runner {
    /// Build the chosen strategy from the validated device list
    pub fn new(
        kind: RunnerKind,
        devices: Vec<TargetDevice>,
        options: &RunOptions,
        debugging: DebuggingOptions,
    ) -> Self {
        let devices: Vec<DeviceRunConfig> = devices
            .into_iter()
            .map(|device| DeviceRunConfig::for_options(device, options))
            .collect();

        match kind {
            RunnerKind::Hot => Runner::Hot(HotRunner {
                devices,
                options: options.clone(),
                debugging,
            }),
            RunnerKind::Cold => Runner::Cold(ColdRunner {
                devices,
                options: options.clone(),
                debugging,
            }),
        }
    }

    pub fn kind(&self) -> RunnerKind {
        match self {
            Runner::Hot(_) => RunnerKind::Hot,
            Runner::Cold(_) => RunnerKind::Cold,
        }
    }
}

impl AppSession for Runner {
    async fn run(
        &mut self,
        signal: &AppStartedSignal,
        route: Option<&str>,
        should_build: bool,
    ) -> Result<i32> {
        match self {
            Runner::Hot(runner) => runner.run(signal, route, should_build).await,
            Runner::Cold(runner) => runner.run(signal, route, should_build).await,
        }
    }
}

/// Shared per-invocation state threaded into each device loop
#[derive(Clone)]
struct DriveContext {
    signal: AppStartedSignal,
    started: Arc<AtomicUsize>,
    total: usize,
    benchmark: Option<BenchmarkContext>,
}

#[derive(Clone)]
struct BenchmarkContext {
    done: Arc<AtomicBool>,
    project_root: PathBuf,
    launched_at: Instant,
}

/// Spawn one process per device and supervise them to completion
async fn launch(
    devices: &[DeviceRunConfig],
    options: &RunOptions,
    debugging: &DebuggingOptions,
    kind: RunnerKind,
    signal: &AppStartedSignal,
    route: Option<&str>,
    should_build: bool,
) -> Result<i32> {
    let context = DriveContext {
        signal: signal.clone(),
        started: Arc::new(AtomicUsize::new(0)),
        total: devices.len(),
        benchmark: (kind == RunnerKind::Hot && options.benchmark).then(|| BenchmarkContext {
            done: Arc::new(AtomicBool::new(false)),
            project_root: options.project_root.clone(),
            launched_at: Instant::now(),
        }),
    };

    // Processes stay alive in this scope for the whole launch; the drive
    // loops only hold channel halves.
    let mut processes = Vec::with_capacity(devices.len());
    let mut drives = Vec::with_capacity(devices.len());
    for config in devices {
        let args = config.run_args(options, debugging, kind, route, should_build);
        let (event_tx, event_rx) = mpsc::channel(256);
        let process = AppProcess::spawn(&options.project_root, args, event_tx)?;
        drives.push(drive_device(
            config.device.clone(),
            process.stdin_sender(),
            event_rx,
            context.clone(),
        ));
        processes.push(process);
    }

    if options.stay_resident {
        return Ok(aggregate_exit_codes(join_all(drives).await));
    }

    // Not resident: the session is done once every device reports started.
    tokio::select! {
        codes = join_all(drives) => Ok(aggregate_exit_codes(codes)),
        _ = signal.wait() => {
            info!("All devices started; exiting without staying resident");
            Ok(0)
        }
    }
}

/// First nonzero device exit code wins; all-zero means success
fn aggregate_exit_codes(codes: Vec<i32>) -> i32 {
    codes.into_iter().find(|&code| code != 0).unwrap_or(0)
}

/// Drive one device's event stream until its process exits
async fn drive_device(
    device: TargetDevice,
    stdin: mpsc::Sender<String>,
    mut events: mpsc::Receiver<ProcessEvent>,
    context: DriveContext,
) -> i32 {
    let tracker = Arc::new(RequestTracker::new());
    let mut app_id: Option<String> = None;

    while let Some(event) = events.recv().await {
        match event {
            ProcessEvent::Stdout(line) => match parse_daemon_message(&line) {
                Some(DaemonMessage::AppStart(start)) => {
                    debug!(
                        "Session {} starting on {} (restart supported: {})",
                        start.app_id, start.device_id, start.supports_restart
                    );
                    app_id = Some(start.app_id);
                }
                Some(DaemonMessage::AppStarted(_)) => {
                    let count = context.started.fetch_add(1, Ordering::SeqCst) + 1;
                    info!(
                        "Application started on {} ({}/{})",
                        device.display_name(),
                        count,
                        context.total
                    );
                    if count == context.total {
                        context.signal.fire();
                    }
                    if let Some(bench) = &context.benchmark {
                        if !bench.done.swap(true, Ordering::SeqCst) {
                            tokio::spawn(run_benchmark(
                                stdin.clone(),
                                Arc::clone(&tracker),
                                app_id.clone().unwrap_or_default(),
                                bench.project_root.clone(),
                                bench.launched_at.elapsed(),
                            ));
                        }
                    }
                }
                Some(DaemonMessage::AppStop(stop)) => {
                    if let Some(error) = &stop.error {
                        warn!("Session {} stopped with error: {}", stop.app_id, error);
                    } else {
                        debug!("Session {} stopped", stop.app_id);
                    }
                }
                Some(DaemonMessage::Response { id, result, error }) => {
                    if let Some(id) = id.as_u64() {
                        tracker.handle_response(id, result, error);
                    }
                }
                Some(DaemonMessage::Unknown { event, .. }) => {
                    trace!("machine event: {}", event);
                }
                None => debug!("flutter: {}", line),
            },
            ProcessEvent::Stderr(line) => {
                if !line.trim().is_empty() {
                    warn!("flutter: {}", line);
                }
            }
            ProcessEvent::Exited { code } => {
                let code = code.unwrap_or(1);
                info!(
                    "Session on {} terminated with exit code {}",
                    device.display_name(),
                    code
                );
                return code;
            }
        }
    }

    warn!(
        "Event channel for {} closed before the process exited",
        device.display_name()
    );
    1
}

#[derive(Debug, Serialize)]
struct BenchmarkReport {
    time_to_started_ms: u64,
    full_restart_ms: Option<u64>,
}

/// Measure a full restart and record timings into the project's build dir
async fn run_benchmark(
    stdin: mpsc::Sender<String>,
    tracker: Arc<RequestTracker>,
    app_id: String,
    project_root: PathBuf,
    time_to_started: Duration,
) {
    let restart_begin = Instant::now();
    let (id, response_rx) = tracker.register();
    let payload = json!({
        "id": id,
        "method": "app.restart",
        "params": { "appId": app_id, "fullRestart": true, "pause": false },
    });

    if stdin.send(format!("[{}]", payload)).await.is_err() {
        warn!("Benchmark restart could not be sent");
        return;
    }

    let full_restart = match tokio::time::timeout(BENCHMARK_RESTART_TIMEOUT, response_rx).await {
        Ok(Ok(response)) if response.success => Some(restart_begin.elapsed()),
        _ => {
            warn!("Benchmark restart did not complete");
            None
        }
    };

    let report = BenchmarkReport {
        time_to_started_ms: time_to_started.as_millis() as u64,
        full_restart_ms: full_restart.map(|d| d.as_millis() as u64),
    };

    match write_benchmark_report(&project_root, &report) {
        Ok(path) => info!("Benchmark results written to {}", path.display()),
        Err(e) => warn!("Failed to write benchmark results: {}", e),
    }
}

fn write_benchmark_report(project_root: &std::path::Path, report: &BenchmarkReport) -> Result<PathBuf> {
    let build_dir = project_root.join("build");
    std::fs::create_dir_all(&build_dir)?;

    let path = build_dir.join("flaunch_benchmark.json");
    std::fs::write(&path, serde_json::to_string_pretty(report)?)?;
    Ok(path)
}
