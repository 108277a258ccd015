//! Debugging session configuration
//!
//! A [`DebuggingOptions`] value is derived once per invocation from the build
//! mode and the raw run flags, then passed by reference into every component
//! that needs it. Release-like builds always get the `disabled` shape: the
//! interactive fields are zeroed at construction and never resurface.

use crate::build_mode::BuildMode;

/// Immutable debugging configuration for one launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebuggingOptions {
    pub build_mode: BuildMode,

    /// Whether an interactive debugging surface exists at all.
    /// `false` exactly when the build mode is release-like.
    pub debugging_enabled: bool,

    pub start_paused: bool,
    pub use_test_fonts: bool,
    pub enable_software_rendering: bool,
    pub skia_deterministic_rendering: bool,
    pub trace_skia: bool,
    pub observatory_port: Option<u16>,
}

impl DebuggingOptions {
    /// Interactive configuration with all flags at their defaults.
    ///
    /// Callers fill individual flags with struct-update syntax:
    /// `DebuggingOptions { start_paused: true, ..DebuggingOptions::enabled(mode) }`
    pub fn enabled(build_mode: BuildMode) -> Self {
        Self {
            build_mode,
            debugging_enabled: true,
            start_paused: false,
            use_test_fonts: false,
            enable_software_rendering: false,
            skia_deterministic_rendering: false,
            trace_skia: false,
            observatory_port: None,
        }
    }

    /// Non-interactive configuration for release-like builds.
    ///
    /// Carries no interactive-only fields regardless of what was requested.
    pub fn disabled(build_mode: BuildMode) -> Self {
        Self {
            debugging_enabled: false,
            ..Self::enabled(build_mode)
        }
    }

    /// Flags this configuration contributes to a `flutter run` invocation.
    ///
    /// A disabled configuration contributes nothing.
    pub fn to_run_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if !self.debugging_enabled {
            return args;
        }
        if self.start_paused {
            args.push("--start-paused".to_string());
        }
        if self.use_test_fonts {
            args.push("--use-test-fonts".to_string());
        }
        if self.enable_software_rendering {
            args.push("--enable-software-rendering".to_string());
        }
        if self.skia_deterministic_rendering {
            args.push("--skia-deterministic-rendering".to_string());
        }
        if self.trace_skia {
            args.push("--trace-skia".to_string());
        }
        if let Some(port) = self.observatory_port {
            args.push(format!("--observatory-port={}", port));
        }
        args
    }
}
