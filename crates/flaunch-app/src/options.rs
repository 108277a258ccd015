//! Immutable run configuration
//!
//! All flag values are parsed once into a [`RunOptions`] value and passed by
//! reference into each component; nothing reads a shared parser result after
//! construction.

use std::path::PathBuf;

use flaunch_core::{BuildMode, DebuggingOptions};

/// Default application entry point, relative to the project root
pub const DEFAULT_TARGET: &str = "lib/main.dart";

/// Parsed configuration for one launch invocation
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub build_mode: BuildMode,

    /// Project root the tool operates in
    pub project_root: PathBuf,

    /// Application entry file, relative to the project root
    pub target: PathBuf,

    /// Initial route pushed when the app starts
    pub route: Option<String>,

    /// Live reload requested (default true; only effective in debug mode)
    pub use_hot_reload: bool,

    /// Hand the session off to a protocol server instead of running it
    pub machine: bool,

    /// Build before running (`--no-build` clears this)
    pub build: bool,

    /// Launch a pre-built application binary instead of building
    pub application_binary: Option<PathBuf>,

    /// Keep the process alive for the lifetime of the app session
    pub stay_resident: bool,

    // ─────────────────────────────────────────────────────────
    // Per-device build options
    // ─────────────────────────────────────────────────────────
    pub track_widget_creation: bool,
    pub output_dill: Option<PathBuf>,
    pub packages_file: Option<PathBuf>,
    pub filesystem_roots: Vec<String>,
    pub filesystem_scheme: Option<String>,
    pub view_filter: Option<String>,
    pub ipv6: bool,

    // ─────────────────────────────────────────────────────────
    // Debugging flags (ignored in release-like modes)
    // ─────────────────────────────────────────────────────────
    pub start_paused: bool,
    pub use_test_fonts: bool,
    pub enable_software_rendering: bool,
    pub skia_deterministic_rendering: bool,
    pub trace_skia: bool,
    pub observatory_port: Option<u16>,

    // ─────────────────────────────────────────────────────────
    // Strategy-specific flags
    // ─────────────────────────────────────────────────────────
    /// One-shot only: trace application startup
    pub trace_startup: bool,

    /// Live-reload only: measure and record launch/restart timings
    pub benchmark: bool,

    /// Live-reload only: save a compilation training trace
    pub save_compilation_trace: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            build_mode: BuildMode::Debug,
            project_root: PathBuf::from("."),
            target: PathBuf::from(DEFAULT_TARGET),
            route: None,
            use_hot_reload: true,
            machine: false,
            build: true,
            application_binary: None,
            stay_resident: true,
            track_widget_creation: false,
            output_dill: None,
            packages_file: None,
            filesystem_roots: Vec::new(),
            filesystem_scheme: None,
            view_filter: None,
            ipv6: false,
            start_paused: false,
            use_test_fonts: false,
            enable_software_rendering: false,
            skia_deterministic_rendering: false,
            trace_skia: false,
            observatory_port: None,
            trace_startup: false,
            benchmark: false,
            save_compilation_trace: false,
        }
    }
}

impl RunOptions {
    /// Derive the debugging configuration for this invocation.
    ///
    /// Release-like modes get the disabled shape regardless of what the
    /// interactive flags say; the flags are ignored, not rejected.
    pub fn debugging_options(&self) -> DebuggingOptions {
        if self.build_mode.is_release() {
            return DebuggingOptions::disabled(self.build_mode);
        }
        DebuggingOptions {
            start_paused: self.start_paused,
            use_test_fonts: self.use_test_fonts,
            enable_software_rendering: self.enable_software_rendering,
            skia_deterministic_rendering: self.skia_deterministic_rendering,
            trace_skia: self.trace_skia,
            observatory_port: self.observatory_port,
            ..DebuggingOptions::enabled(self.build_mode)
        }
    }

    /// Whether the session should build before running.
    ///
    /// A pre-built application binary always suppresses the build.
    pub fn should_build(&self) -> bool {
        self.application_binary.is_none() && self.build
    }
}
