//! # flaunch-core - Core Domain Types
//!
//! Foundation crate for flaunch. Provides the build-mode classification, the
//! debugging configuration value, the error taxonomy, and logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on
//! external crates (serde, chrono, thiserror, tracing).
//!
//! ## Public API
//!
//! - [`BuildMode`] - Compilation mode (debug, profile, dynamic-profile, release)
//! - [`DebuggingOptions`] - Immutable per-launch debugging configuration
//! - [`Error`] / [`Result`] - Error taxonomy with process exit-status mapping
//! - [`logging::init()`] - File-backed tracing setup
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use flaunch_core::prelude::*;
//! ```

pub mod build_mode;
pub mod debugging;
pub mod error;
pub mod logging;

/// Prelude for common imports used throughout all flaunch crates
pub mod prelude {
    pub use super::error::{Error, Result};
    pub use tracing::{debug, error, info, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use build_mode::BuildMode;
pub use debugging::DebuggingOptions;
pub use error::{Error, Result};
