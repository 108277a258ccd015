//! # flaunch-app - Launch Orchestration
//!
//! The orchestrator core: given the resolved target devices and a requested
//! run mode, validate feasibility, derive the debugging configuration, select
//! an execution strategy (live-reload vs. one-shot) or hand off to the
//! machine protocol, and supervise the session to a uniform result.
//!
//! Depends on [`flaunch_core`] for domain types and [`flaunch_daemon`] for
//! device discovery and process/protocol plumbing.

pub mod config;
pub mod machine;
pub mod options;
pub mod run;
pub mod runner;
pub mod signal;
pub mod strategy;
pub mod supervisor;
pub mod validator;

// Re-export primary types
pub use config::{load_launch_defaults, LaunchDefaults};
pub use machine::run_machine;
pub use options::{RunOptions, DEFAULT_TARGET};
pub use run::run_app;
pub use runner::{AppSession, ColdRunner, HotRunner, Runner};
pub use signal::AppStartedSignal;
pub use strategy::{DeviceRunConfig, RunnerKind};
pub use supervisor::{launch_labels, supervise, LaunchResult, LogReporter, Reporter, SessionPhase};
pub use validator::validate_devices;
