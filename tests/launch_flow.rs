//! Launch flow integration tests
//!
//! Drives the orchestrator end-to-end through its public surface with
//! scripted collaborators: a fake device resolver, a scripted protocol
//! client, and stub sessions. No Flutter SDK is required.
//!
//! Run with: cargo test --test launch_flow

use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::oneshot;

use flaunch_app::{
    launch_labels, run_app, supervise, AppSession, AppStartedSignal, LaunchResult, Reporter,
    RunOptions, RunnerKind,
};
use flaunch_core::{BuildMode, Error, Result};
use flaunch_daemon::{
    AppHandle, DeviceResolver, ProtocolClient, StartAppRequest, TargetDevice, TargetPlatform,
};

// ─────────────────────────────────────────────────────────
// Test Data Helpers
// ─────────────────────────────────────────────────────────

/// Create a physical test device with full capabilities
fn physical_device(id: &str, platform: TargetPlatform) -> TargetDevice {
    TargetDevice {
        id: id.to_string(),
        name: format!("Device {}", id),
        emulator: false,
        supports_hardware_rendering: true,
        supports_hot_reload: true,
        platform,
    }
}

/// Create a local-emulator test device
fn emulator_device(id: &str, hardware_rendering: bool) -> TargetDevice {
    TargetDevice {
        id: id.to_string(),
        name: format!("Emulator {}", id),
        emulator: true,
        supports_hardware_rendering: hardware_rendering,
        supports_hot_reload: true,
        platform: TargetPlatform::Android,
    }
}

/// Resolver returning a scripted device list
struct FakeResolver {
    devices: Option<Vec<TargetDevice>>,
    all_requested: bool,
}

impl FakeResolver {
    fn with_devices(devices: Vec<TargetDevice>) -> Self {
        Self {
            devices: Some(devices),
            all_requested: false,
        }
    }

    fn empty() -> Self {
        Self {
            devices: None,
            all_requested: false,
        }
    }
}

impl DeviceResolver for FakeResolver {
    fn has_requested_all_devices(&self) -> bool {
        self.all_requested
    }

    async fn resolve_target_devices(&self) -> Result<Option<Vec<TargetDevice>>> {
        Ok(self.devices.clone())
    }
}

/// Reporter capturing every result it receives
#[derive(Default)]
struct RecordingReporter {
    results: Mutex<Vec<LaunchResult>>,
}

impl Reporter for RecordingReporter {
    fn report(&self, result: &LaunchResult) {
        self.results.lock().unwrap().push(result.clone());
    }
}

/// Protocol client scripted to fail startup or complete with a fixed code
struct ScriptedClient {
    start_error: Option<String>,
    completion_code: i32,
}

impl ProtocolClient for ScriptedClient {
    async fn start_app(&self, _request: &StartAppRequest) -> Result<AppHandle> {
        if let Some(message) = &self.start_error {
            return Err(Error::process(message.clone()));
        }
        let (tx, rx) = oneshot::channel();
        tx.send(self.completion_code).unwrap();
        Ok(AppHandle::new("it-session", rx))
    }
}

/// Session stand-in that optionally reaches the running state before exiting
struct ScriptedSession {
    exit_code: i32,
    reaches_running: bool,
}

impl AppSession for ScriptedSession {
    async fn run(
        &mut self,
        signal: &AppStartedSignal,
        _route: Option<&str>,
        _should_build: bool,
    ) -> Result<i32> {
        if self.reaches_running {
            signal.fire();
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        Ok(self.exit_code)
    }
}

// ─────────────────────────────────────────────────────────
// Supervised Session Flow
// ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_hot_debug_launch_produces_success_result() {
    let options = RunOptions::default();
    let devices = vec![physical_device("pixel-7", TargetPlatform::Android)];
    let kind = RunnerKind::select(options.build_mode, options.use_hot_reload);
    assert_eq!(kind, RunnerKind::Hot);

    let mut session = ScriptedSession {
        exit_code: 0,
        reaches_running: true,
    };
    let signal = AppStartedSignal::new();
    let reporter = RecordingReporter::default();
    let labels = launch_labels(kind, options.build_mode, &devices);

    let result = supervise(&mut session, &signal, None, true, labels, &reporter)
        .await
        .unwrap();

    assert!(result.success());
    assert_eq!(result.label(), "hot-debug-android");
    assert!(result.started_at.is_some());
    assert_eq!(result.started_at, signal.started_at());
}

#[tokio::test]
async fn test_failed_session_reaches_reporter_with_real_code() {
    let mut session = ScriptedSession {
        exit_code: 66,
        reaches_running: true,
    };
    let signal = AppStartedSignal::new();
    let reporter = RecordingReporter::default();

    let err = supervise(&mut session, &signal, None, true, vec![], &reporter)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::SessionExitFailure { code: 66 }));
    assert_eq!(err.exit_status(), 66);

    let reported = reporter.results.lock().unwrap();
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].exit_code, 66);
    // It started before failing, so the timestamp is present
    assert!(reported[0].started_at.is_some());
}

#[tokio::test]
async fn test_session_dying_before_start_leaves_no_timestamp() {
    let mut session = ScriptedSession {
        exit_code: 1,
        reaches_running: false,
    };
    let signal = AppStartedSignal::new();
    let reporter = RecordingReporter::default();

    let err = supervise(&mut session, &signal, None, true, vec![], &reporter)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::SessionExitFailure { code: 1 }));
    let reported = reporter.results.lock().unwrap();
    assert!(reported[0].started_at.is_none());
}

// ─────────────────────────────────────────────────────────
// Orchestrator Entry Point
// ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_empty_resolution_aborts_before_any_session() {
    let reporter = RecordingReporter::default();

    let err = run_app::<_, ScriptedClient>(
        RunOptions::default(),
        &FakeResolver::empty(),
        None,
        &reporter,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::NoDevicesFound));
    assert!(reporter.results.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_release_on_emulator_fails_validation() {
    let resolver = FakeResolver::with_devices(vec![emulator_device("emulator-5554", false)]);
    let options = RunOptions {
        build_mode: BuildMode::Release,
        use_hot_reload: false,
        ..RunOptions::default()
    };
    let reporter = RecordingReporter::default();

    let err = run_app::<_, ScriptedClient>(options, &resolver, None, &reporter)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ModeNotSupportedOnEmulator { .. }));
    assert!(reporter.results.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_all_devices_with_prebuilt_binary_rejected() {
    let resolver = FakeResolver {
        devices: Some(vec![physical_device("a", TargetPlatform::Android)]),
        all_requested: true,
    };
    let options = RunOptions {
        application_binary: Some("build/app.apk".into()),
        ..RunOptions::default()
    };
    let reporter = RecordingReporter::default();

    let err = run_app::<_, ScriptedClient>(options, &resolver, None, &reporter)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UnsupportedCombination { .. }));
}

// ─────────────────────────────────────────────────────────
// Machine-Protocol Handoff
// ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_machine_handoff_success() {
    let resolver = FakeResolver::with_devices(vec![physical_device("a", TargetPlatform::Ios)]);
    let options = RunOptions {
        machine: true,
        ..RunOptions::default()
    };
    let client = ScriptedClient {
        start_error: None,
        completion_code: 0,
    };
    let reporter = RecordingReporter::default();

    let result = run_app(options, &resolver, Some(&client), &reporter)
        .await
        .unwrap();

    assert!(result.success());
    assert_eq!(result.label_parts, vec!["machine"]);
    // Handoff success counts as started on this path
    assert!(result.started_at.is_some());
}

#[tokio::test]
async fn test_machine_handoff_failure_surfaces_server_message() {
    let resolver = FakeResolver::with_devices(vec![physical_device("a", TargetPlatform::Ios)]);
    let options = RunOptions {
        machine: true,
        ..RunOptions::default()
    };
    let client = ScriptedClient {
        start_error: Some("Unable to locate a development device".into()),
        completion_code: 0,
    };
    let reporter = RecordingReporter::default();

    let err = run_app(options, &resolver, Some(&client), &reporter)
        .await
        .unwrap_err();

    match &err {
        Error::LaunchFailed { message } => {
            assert!(message.contains("Unable to locate a development device"));
        }
        other => panic!("expected LaunchFailed, got {:?}", other),
    }
    assert_ne!(err.exit_status(), 0);
    assert!(reporter.results.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_machine_handoff_rejects_multiple_devices() {
    let resolver = FakeResolver::with_devices(vec![
        physical_device("a", TargetPlatform::Ios),
        physical_device("b", TargetPlatform::Android),
    ]);
    let options = RunOptions {
        machine: true,
        ..RunOptions::default()
    };
    let client = ScriptedClient {
        start_error: None,
        completion_code: 0,
    };
    let reporter = RecordingReporter::default();

    let err = run_app(options, &resolver, Some(&client), &reporter)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UnsupportedCombination { .. }));
    assert!(reporter.results.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_machine_session_failure_propagates_reported_code() {
    let resolver = FakeResolver::with_devices(vec![physical_device("a", TargetPlatform::Ios)]);
    let options = RunOptions {
        machine: true,
        ..RunOptions::default()
    };
    let client = ScriptedClient {
        start_error: None,
        completion_code: 9,
    };
    let reporter = RecordingReporter::default();

    let err = run_app(options, &resolver, Some(&client), &reporter)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::SessionExitFailure { code: 9 }));
    assert_eq!(err.exit_status(), 9);

    let reported = reporter.results.lock().unwrap();
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].exit_code, 9);
}
