//! Application error types with rich context

use std::path::PathBuf;
use thiserror::Error;

use crate::build_mode::BuildMode;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Flutter/Process Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Flutter SDK not found. Ensure 'flutter' is in your PATH.")]
    FlutterNotFound,

    #[error("No Flutter project found in: {path}")]
    NoProject { path: PathBuf },

    #[error("Failed to spawn Flutter process: {reason}")]
    ProcessSpawn { reason: String },

    #[error("Flutter process error: {message}")]
    Process { message: String },

    #[error("Daemon protocol error: {message}")]
    Protocol { message: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ─────────────────────────────────────────────────────────────
    // Channel/Communication Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Channel send error: {message}")]
    ChannelSend { message: String },

    // ─────────────────────────────────────────────────────────────
    // Launch Validation Errors
    // ─────────────────────────────────────────────────────────────
    #[error("No target devices found. Attach a device or start an emulator.")]
    NoDevicesFound,

    #[error("Unsupported combination: {reason}")]
    UnsupportedCombination { reason: String },

    #[error("{mode} mode is not supported on emulators")]
    ModeNotSupportedOnEmulator { mode: BuildMode },

    #[error("Hot reload is not supported by device: {device}")]
    ReloadUnsupported { device: String },

    #[error("Invalid flag combination: {reason}")]
    InvalidFlagCombination { reason: String },

    // ─────────────────────────────────────────────────────────────
    // Launch Outcome Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Application launch failed: {message}")]
    LaunchFailed { message: String },

    #[error("Application session exited with code {code}")]
    SessionExitFailure { code: i32 },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn process(message: impl Into<String>) -> Self {
        Self::Process {
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn channel_send(message: impl Into<String>) -> Self {
        Self::ChannelSend {
            message: message.into(),
        }
    }

    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::UnsupportedCombination {
            reason: reason.into(),
        }
    }

    pub fn invalid_flags(reason: impl Into<String>) -> Self {
        Self::InvalidFlagCombination {
            reason: reason.into(),
        }
    }

    pub fn launch_failed(message: impl Into<String>) -> Self {
        Self::LaunchFailed {
            message: message.into(),
        }
    }

    /// Process exit status for this error.
    ///
    /// A failed session propagates its own exit code verbatim; every other
    /// error carries no structured code and maps to a generic failure status.
    pub fn exit_status(&self) -> i32 {
        match self {
            Error::SessionExitFailure { code } => *code,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = Error::launch_failed("device disconnected");
        assert_eq!(
            err.to_string(),
            "Application launch failed: device disconnected"
        );

        let err = Error::FlutterNotFound;
        assert!(err.to_string().contains("Flutter SDK not found"));

        let err = Error::ModeNotSupportedOnEmulator {
            mode: BuildMode::Release,
        };
        assert_eq!(err.to_string(), "release mode is not supported on emulators");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_session_exit_failure_propagates_code() {
        let err = Error::SessionExitFailure { code: 42 };
        assert_eq!(err.exit_status(), 42);
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_generic_exit_status() {
        assert_eq!(Error::NoDevicesFound.exit_status(), 1);
        assert_eq!(Error::launch_failed("boom").exit_status(), 1);
        assert_eq!(
            Error::ReloadUnsupported {
                device: "web-server".into()
            }
            .exit_status(),
            1
        );
    }

    #[test]
    fn test_reload_unsupported_names_device() {
        let err = Error::ReloadUnsupported {
            device: "iPhone 15 Pro".into(),
        };
        assert!(err.to_string().contains("iPhone 15 Pro"));
    }

    #[test]
    fn test_error_constructors() {
        let _ = Error::process("test");
        let _ = Error::protocol("test");
        let _ = Error::config("test");
        let _ = Error::channel_send("test");
        let _ = Error::unsupported("test");
        let _ = Error::invalid_flags("test");
    }
}
