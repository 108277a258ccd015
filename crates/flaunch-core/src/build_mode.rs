//! Build mode classification
//!
//! The build mode decides which debugging features are meaningful, whether a
//! device class can run the produced artifact, and which execution strategy
//! is eligible. `DynamicProfile` is the instrumented profile variant used for
//! compilation-trace training runs.

use serde::{Deserialize, Serialize};

/// Compilation mode requested for a launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildMode {
    #[default]
    Debug,
    Profile,
    DynamicProfile,
    Release,
}

impl BuildMode {
    /// Canonical lowercase name, used in launch result labels
    pub fn name(&self) -> &'static str {
        match self {
            BuildMode::Debug => "debug",
            BuildMode::Profile => "profile",
            BuildMode::DynamicProfile => "dynamic-profile",
            BuildMode::Release => "release",
        }
    }

    /// Command-line arguments selecting this mode on `flutter run`
    pub fn as_args(&self) -> &'static [&'static str] {
        match self {
            BuildMode::Debug => &["--debug"],
            BuildMode::Profile => &["--profile"],
            BuildMode::DynamicProfile => &["--profile", "--dynamic"],
            BuildMode::Release => &["--release"],
        }
    }

    /// Release-like modes carry no interactive debugging surface
    pub fn is_release(&self) -> bool {
        matches!(self, BuildMode::Release)
    }

    /// Emulators run JIT code only, so anything but debug is rejected there
    pub fn supports_emulator(&self) -> bool {
        matches!(self, BuildMode::Debug)
    }

    /// Compilation-trace training needs an interpretable (JIT/instrumented) build
    pub fn supports_compilation_trace(&self) -> bool {
        matches!(self, BuildMode::Debug | BuildMode::DynamicProfile)
    }

    /// All modes, in declaration order (used by exhaustive tests)
    pub fn all() -> &'static [BuildMode] {
        &[
            BuildMode::Debug,
            BuildMode::Profile,
            BuildMode::DynamicProfile,
            BuildMode::Release,
        ]
    }
}

impl std::fmt::Display for BuildMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
