//! Machine-protocol client: request tracking and session handoff
//!
//! In machine mode the orchestrator does not drive a runner itself; it hands
//! session startup to a protocol server's app domain and waits for that
//! session's externally reported completion. The client here speaks the
//! bracketed JSON-RPC framing over a spawned server process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};

use flaunch_core::prelude::*;
use flaunch_core::DebuggingOptions;

use crate::process::{AppProcess, ProcessEvent};
use crate::protocol::{parse_daemon_message, DaemonMessage};

/// How long the server may take to acknowledge app.start (includes a build)
const START_APP_TIMEOUT: Duration = Duration::from_secs(300);

/// Global request ID counter
static REQUEST_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generate a unique request ID
pub fn next_request_id() -> u64 {
    REQUEST_ID_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Response to a tracked request
#[derive(Debug, Clone)]
pub struct CommandResponse {
    pub id: u64,
    pub success: bool,
    pub result: Option<Value>,
    pub error: Option<String>,
}

impl CommandResponse {
    pub fn from_daemon_response(id: u64, result: Option<Value>, error: Option<Value>) -> Self {
        Self {
            id,
            success: error.is_none(),
            result,
            error: error.map(|e| match e {
                Value::String(s) => s,
                other => other.to_string(),
            }),
        }
    }
}

/// Matches responses to pending requests by id
#[derive(Default)]
pub struct RequestTracker {
    pending: Mutex<HashMap<u64, oneshot::Sender<CommandResponse>>>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pending request, returning its id and response receiver
    pub fn register(&self) -> (u64, oneshot::Receiver<CommandResponse>) {
        let id = next_request_id();
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .expect("request tracker lock poisoned")
            .insert(id, tx);
        (id, rx)
    }

    /// Route an incoming response to its pending request.
    ///
    /// Returns true if the response was matched.
    pub fn handle_response(&self, id: u64, result: Option<Value>, error: Option<Value>) -> bool {
        let sender = self
            .pending
            .lock()
            .expect("request tracker lock poisoned")
            .remove(&id);
        match sender {
            Some(tx) => {
                let _ = tx.send(CommandResponse::from_daemon_response(id, result, error));
                true
            }
            None => false,
        }
    }

    /// Drop every pending request (e.g., when the server process dies).
    ///
    /// Receivers observe the closed channel and fail their waits.
    pub fn cancel_all(&self) {
        self.pending
            .lock()
            .expect("request tracker lock poisoned")
            .clear();
    }

    pub fn pending_count(&self) -> usize {
        self.pending
            .lock()
            .expect("request tracker lock poisoned")
            .len()
    }
}

/// Configuration surface handed to the server's start-application operation
#[derive(Debug, Clone)]
pub struct StartAppRequest {
    pub device_id: String,
    pub project_root: PathBuf,
    pub target: PathBuf,
    pub route: Option<String>,
    pub debugging: DebuggingOptions,
    pub enable_hot_reload: bool,
    pub packages_file: Option<PathBuf>,
    pub output_dill: Option<PathBuf>,
    pub ipv6: bool,
}

impl StartAppRequest {
    /// JSON parameters for the app.start request
    fn to_params(&self) -> Value {
        json!({
            "deviceId": self.device_id,
            "projectDirectory": self.project_root,
            "targetFile": self.target,
            "route": self.route,
            "mode": self.debugging.build_mode.name(),
            "startPaused": self.debugging.start_paused,
            "useTestFonts": self.debugging.use_test_fonts,
            "enableSoftwareRendering": self.debugging.enable_software_rendering,
            "traceSkia": self.debugging.trace_skia,
            "observatoryPort": self.debugging.observatory_port,
            "enableHotReload": self.enable_hot_reload,
            "packagesFilePath": self.packages_file,
            "dillOutputPath": self.output_dill,
            "ipv6": self.ipv6,
        })
    }
}

/// Handle to a session whose lifecycle is owned by the protocol server
pub struct AppHandle {
    app_id: String,
    completion: oneshot::Receiver<i32>,
}

impl AppHandle {
    pub fn new(app_id: impl Into<String>, completion: oneshot::Receiver<i32>) -> Self {
        Self {
            app_id: app_id.into(),
            completion,
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Wait for the delegated session to report completion
    pub async fn wait_for_completion(self) -> Result<i32> {
        self.completion
            .await
            .map_err(|_| Error::protocol("session ended without reporting completion"))
    }
}

/// Control-protocol server contract for session handoff
#[allow(async_fn_in_trait)]
pub trait ProtocolClient {
    /// Delegate session startup to the server's app domain
    async fn start_app(&self, request: &StartAppRequest) -> Result<AppHandle>;
}

/// Client speaking the machine protocol to a spawned server process
pub struct MachineClient {
    process: AppProcess,
    tracker: Arc<RequestTracker>,
    completions: Arc<Mutex<HashMap<String, oneshot::Sender<i32>>>>,
}

impl MachineClient {
    /// Spawn the protocol server (`flutter daemon`) and wire its streams
    pub fn connect(project_root: &Path) -> Result<Self> {
        let (event_tx, event_rx) = mpsc::channel(256);
        let process = AppProcess::spawn(project_root, vec!["daemon".to_string()], event_tx)?;

        let tracker = Arc::new(RequestTracker::new());
        let completions: Arc<Mutex<HashMap<String, oneshot::Sender<i32>>>> =
            Arc::new(Mutex::new(HashMap::new()));

        tokio::spawn(Self::event_loop(
            event_rx,
            Arc::clone(&tracker),
            Arc::clone(&completions),
        ));

        Ok(Self {
            process,
            tracker,
            completions,
        })
    }

    async fn event_loop(
        mut events: mpsc::Receiver<ProcessEvent>,
        tracker: Arc<RequestTracker>,
        completions: Arc<Mutex<HashMap<String, oneshot::Sender<i32>>>>,
    ) {
        while let Some(event) = events.recv().await {
            match event {
                ProcessEvent::Stdout(line) => route_line(&line, &tracker, &completions),
                ProcessEvent::Stderr(line) => warn!("protocol server: {}", line),
                ProcessEvent::Exited { code } => {
                    warn!("protocol server exited with code {:?}", code);
                    // Dropping the senders fails every outstanding wait
                    tracker.cancel_all();
                    completions
                        .lock()
                        .expect("completion map lock poisoned")
                        .clear();
                    break;
                }
            }
        }
    }
}

/// Route one line of server output to response and completion waiters
fn route_line(
    line: &str,
    tracker: &RequestTracker,
    completions: &Mutex<HashMap<String, oneshot::Sender<i32>>>,
) {
    match parse_daemon_message(line) {
        Some(DaemonMessage::Response { id, result, error }) => {
            if let Some(id) = id.as_u64() {
                if !tracker.handle_response(id, result, error) {
                    debug!("Unmatched response #{}", id);
                }
            }
        }
        Some(DaemonMessage::AppStop(stop)) => {
            let sender = completions
                .lock()
                .expect("completion map lock poisoned")
                .remove(&stop.app_id);
            match sender {
                Some(tx) => {
                    let _ = tx.send(stop.result_code());
                }
                None => debug!("app.stop for unknown session {}", stop.app_id),
            }
        }
        Some(other) => trace!("protocol server message: {:?}", other),
        None => debug!("protocol server: {}", line),
    }
}

impl ProtocolClient for MachineClient {
    async fn start_app(&self, request: &StartAppRequest) -> Result<AppHandle> {
        let (id, response_rx) = self.tracker.register();
        let payload = json!({
            "id": id,
            "method": "app.start",
            "params": request.to_params(),
        });

        self.process.send_json(&payload.to_string()).await?;

        let response = match tokio::time::timeout(START_APP_TIMEOUT, response_rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(Error::protocol("protocol server connection lost")),
            Err(_) => {
                return Err(Error::process(format!(
                    "app.start timed out after {:?}",
                    START_APP_TIMEOUT
                )))
            }
        };

        if !response.success {
            let message = response
                .error
                .unwrap_or_else(|| "unknown launch error".to_string());
            return Err(Error::LaunchFailed { message });
        }

        let app_id = response
            .result
            .as_ref()
            .and_then(|r| r.get("appId"))
            .and_then(Value::as_str)
            .ok_or_else(|| Error::protocol("app.start response missing appId"))?
            .to_string();

        let (tx, rx) = oneshot::channel();
        self.completions
            .lock()
            .expect("completion map lock poisoned")
            .insert(app_id.clone(), tx);

        info!("Session {} handed off to protocol server", app_id);
        Ok(AppHandle::new(app_id, rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flaunch_core::BuildMode;

    #[test]
    fn test_request_id_uniqueness() {
        let id1 = next_request_id();
        let id2 = next_request_id();

        assert_ne!(id1, id2);
        assert!(id2 > id1);
    }

    #[test]
    fn test_tracker_register_and_handle() {
        let tracker = RequestTracker::new();
        let (id, rx) = tracker.register();

        assert_eq!(tracker.pending_count(), 1);
        assert!(tracker.handle_response(id, Some(json!({"appId": "a"})), None));
        assert_eq!(tracker.pending_count(), 0);

        let response = rx.blocking_recv().unwrap();
        assert!(response.success);
        assert_eq!(response.result.unwrap()["appId"], "a");
    }

    #[test]
    fn test_tracker_unmatched_response() {
        let tracker = RequestTracker::new();
        assert!(!tracker.handle_response(9999, None, None));
    }

    #[test]
    fn test_tracker_error_response() {
        let tracker = RequestTracker::new();
        let (id, rx) = tracker.register();

        tracker.handle_response(id, None, Some(json!("No device connected")));

        let response = rx.blocking_recv().unwrap();
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("No device connected"));
    }

    #[test]
    fn test_tracker_cancel_all_fails_waiters() {
        let tracker = RequestTracker::new();
        let (_id, rx) = tracker.register();

        tracker.cancel_all();

        assert_eq!(tracker.pending_count(), 0);
        assert!(rx.blocking_recv().is_err());
    }

    #[test]
    fn test_start_app_request_params() {
        let request = StartAppRequest {
            device_id: "emulator-5554".into(),
            project_root: PathBuf::from("/proj"),
            target: PathBuf::from("lib/main.dart"),
            route: Some("/settings".into()),
            debugging: DebuggingOptions {
                start_paused: true,
                ..DebuggingOptions::enabled(BuildMode::Debug)
            },
            enable_hot_reload: true,
            packages_file: None,
            output_dill: Some(PathBuf::from("build/app.dill")),
            ipv6: true,
        };

        let params = request.to_params();
        assert_eq!(params["deviceId"], "emulator-5554");
        assert_eq!(params["mode"], "debug");
        assert_eq!(params["startPaused"], true);
        assert_eq!(params["route"], "/settings");
        assert_eq!(params["enableHotReload"], true);
        assert_eq!(params["ipv6"], true);
        assert!(params["packagesFilePath"].is_null());
    }

    #[tokio::test]
    async fn test_app_handle_completion() {
        let (tx, rx) = oneshot::channel();
        let handle = AppHandle::new("session-1", rx);
        assert_eq!(handle.app_id(), "session-1");

        tx.send(0).unwrap();
        assert_eq!(handle.wait_for_completion().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_app_handle_dropped_sender_is_error() {
        let (tx, rx) = oneshot::channel::<i32>();
        drop(tx);

        let handle = AppHandle::new("session-1", rx);
        assert!(handle.wait_for_completion().await.is_err());
    }

    #[test]
    fn test_route_line_matches_response() {
        let tracker = RequestTracker::new();
        let completions = Mutex::new(HashMap::new());
        let (id, rx) = tracker.register();

        let line = format!(r#"[{{"id":{},"result":{{"appId":"abc"}}}}]"#, id);
        route_line(&line, &tracker, &completions);

        let response = rx.blocking_recv().unwrap();
        assert!(response.success);
    }

    #[test]
    fn test_route_line_completes_session() {
        let tracker = RequestTracker::new();
        let completions = Mutex::new(HashMap::new());

        let (tx, rx) = oneshot::channel();
        completions.lock().unwrap().insert("abc".to_string(), tx);

        route_line(
            r#"[{"event":"app.stop","params":{"appId":"abc","exitCode":5}}]"#,
            &tracker,
            &completions,
        );

        assert_eq!(rx.blocking_recv().unwrap(), 5);
    }
}
