//! JSON-RPC protocol handling for the `--machine` interface
//!
//! The machine interface wraps every message in `[...]` for resilience.
//! Events flow from the tool unsolicited; responses are matched to requests
//! by id (see [`crate::client::RequestTracker`]).

use serde::{Deserialize, Serialize};

/// App start event - when a session begins launching
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStart {
    pub app_id: String,
    pub device_id: String,
    #[serde(default)]
    pub supports_restart: bool,
}

/// App started event - when the app has reached a runnable state
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStarted {
    pub app_id: String,
}

/// App stop event - session completion, with the session's result when known
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStop {
    pub app_id: String,
    #[serde(default)]
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub error: Option<String>,
}

impl AppStop {
    /// Session result reported by this event.
    ///
    /// An explicit exit code wins; otherwise an error message means failure.
    pub fn result_code(&self) -> i32 {
        match (self.exit_code, &self.error) {
            (Some(code), _) => code,
            (None, Some(_)) => 1,
            (None, None) => 0,
        }
    }
}

/// Fully typed machine-interface message
#[derive(Debug, Clone)]
pub enum DaemonMessage {
    AppStart(AppStart),
    AppStarted(AppStarted),
    AppStop(AppStop),
    Response {
        id: serde_json::Value,
        result: Option<serde_json::Value>,
        error: Option<serde_json::Value>,
    },
    Unknown {
        event: String,
        params: serde_json::Value,
    },
}

/// A raw message (before parsing into typed events)
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawMessage {
    Response {
        id: serde_json::Value,
        #[serde(default)]
        result: Option<serde_json::Value>,
        #[serde(default)]
        error: Option<serde_json::Value>,
    },
    Event {
        event: String,
        params: serde_json::Value,
    },
}

/// Strip the outer brackets from a machine-interface line
///
/// Returns the inner content if brackets are present.
pub(crate) fn strip_brackets(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        Some(&trimmed[1..trimmed.len() - 1])
    } else {
        None
    }
}

/// Parses one line of machine-interface output.
///
/// Accepts both bracketed lines (e.g., `[{...}]`) and raw JSON objects.
/// Returns `None` for lines that are not valid protocol messages (plain
/// diagnostic output is routed elsewhere).
pub fn parse_daemon_message(line: &str) -> Option<DaemonMessage> {
    let json = strip_brackets(line).unwrap_or(line);

    let raw: RawMessage = serde_json::from_str(json).ok()?;
    Some(match raw {
        RawMessage::Event { event, params } => parse_event(&event, params),
        RawMessage::Response { id, result, error } => DaemonMessage::Response { id, result, error },
    })
}

/// Parse an event by name and parameters
fn parse_event(event: &str, params: serde_json::Value) -> DaemonMessage {
    match event {
        "app.start" => serde_json::from_value(params.clone())
            .map(DaemonMessage::AppStart)
            .unwrap_or_else(|_| unknown_event(event, params)),
        "app.started" => serde_json::from_value(params.clone())
            .map(DaemonMessage::AppStarted)
            .unwrap_or_else(|_| unknown_event(event, params)),
        "app.stop" => serde_json::from_value(params.clone())
            .map(DaemonMessage::AppStop)
            .unwrap_or_else(|_| unknown_event(event, params)),
        _ => unknown_event(event, params),
    }
}

fn unknown_event(event: &str, params: serde_json::Value) -> DaemonMessage {
    DaemonMessage::Unknown {
        event: event.to_string(),
        params,
    }
}
