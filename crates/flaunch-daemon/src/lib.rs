//! # flaunch-daemon - Flutter Process and Protocol Plumbing
//!
//! Manages Flutter child processes, JSON-RPC communication (`--machine`
//! mode), target-device discovery, and the machine-protocol session handoff.
//!
//! Depends on [`flaunch_core`] for domain types and error handling.
//!
//! ## Public API
//!
//! ### Device Discovery
//! - [`TargetDevice`] - Attached device with resolved capabilities
//! - [`DeviceResolver`] - Discovery collaborator contract
//! - [`FlutterDeviceResolver`] - Discovery via `flutter devices --machine`
//!
//! ### Process Management
//! - [`AppProcess`] - Spawn and manage `flutter` child processes
//! - [`ProcessEvent`] - Stdout/stderr/exit events from a managed process
//!
//! ### Protocol
//! - [`parse_daemon_message()`] - Parse a line of `--machine` output
//! - [`RequestTracker`] - Track pending request/response pairs
//! - [`ProtocolClient`] / [`MachineClient`] - Session handoff to a protocol server

pub mod client;
pub mod devices;
pub mod process;
pub mod protocol;
pub mod sdk;

// Public API re-exports
pub use client::{
    next_request_id, AppHandle, CommandResponse, MachineClient, ProtocolClient, RequestTracker,
    StartAppRequest,
};
pub use devices::{
    resolve_capabilities, DeviceCapabilities, DeviceEntry, DeviceResolver, FlutterDeviceResolver,
    TargetDevice, TargetPlatform,
};
pub use process::{AppProcess, ProcessEvent};
pub use protocol::{parse_daemon_message, AppStart, AppStarted, AppStop, DaemonMessage};
pub use sdk::ensure_flutter_available;
