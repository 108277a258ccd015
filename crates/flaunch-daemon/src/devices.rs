//! Target device discovery and capability resolution
//!
//! Raw device entries come from `flutter devices --machine`. Capability
//! attributes (`is_local_emulator`, `supports_hardware_rendering`,
//! `target_platform`) are queried asynchronously per device and joined
//! concurrently across the list, so validation never observes a
//! half-resolved device.

use std::process::Stdio;
use std::time::Duration;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio::time::timeout;

use flaunch_core::prelude::*;

/// Default timeout for flutter devices command
const DEVICES_TIMEOUT: Duration = Duration::from_secs(30);

/// Specifier that selects every attached device
const ALL_DEVICES_SPECIFIER: &str = "all";

fn default_true() -> bool {
    true
}

/// Target platform kind reported by the tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetPlatform {
    Android,
    Ios,
    MacOs,
    Windows,
    Linux,
    Web,
    Fuchsia,
    Unknown,
}

impl TargetPlatform {
    /// Classify a raw platform identifier (e.g. "android-arm64", "web-javascript")
    pub fn from_identifier(identifier: &str) -> Self {
        match identifier {
            p if p.starts_with("android") => TargetPlatform::Android,
            p if p.starts_with("ios") => TargetPlatform::Ios,
            "macos" | "darwin" => TargetPlatform::MacOs,
            "windows" => TargetPlatform::Windows,
            "linux" => TargetPlatform::Linux,
            "chrome" | "web-javascript" => TargetPlatform::Web,
            "fuchsia" => TargetPlatform::Fuchsia,
            _ => TargetPlatform::Unknown,
        }
    }

    /// Lowercase name used in launch result labels
    pub fn name(&self) -> &'static str {
        match self {
            TargetPlatform::Android => "android",
            TargetPlatform::Ios => "ios",
            TargetPlatform::MacOs => "macos",
            TargetPlatform::Windows => "windows",
            TargetPlatform::Linux => "linux",
            TargetPlatform::Web => "web",
            TargetPlatform::Fuchsia => "fuchsia",
            TargetPlatform::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Capability block from `flutter devices --machine`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCapabilities {
    #[serde(default = "default_true")]
    pub hot_reload: bool,

    #[serde(default = "default_true")]
    pub hardware_rendering: bool,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            hot_reload: true,
            hardware_rendering: true,
        }
    }
}

/// A raw device entry as reported by the tool, before capability resolution
///
/// Note: `flutter devices --machine` uses `targetPlatform` while the daemon
/// uses `platform`; both spellings are accepted.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceEntry {
    /// Unique device identifier
    pub id: String,

    /// Human-readable device name
    pub name: String,

    /// Platform identifier (e.g., "ios", "android-arm64", "web-javascript")
    #[serde(alias = "targetPlatform")]
    pub platform: String,

    /// Whether this is an emulator/simulator
    #[serde(default)]
    pub emulator: bool,

    #[serde(default)]
    pub capabilities: DeviceCapabilities,
}

impl DeviceEntry {
    /// Whether this device is a locally hosted emulator.
    ///
    /// Async like the other capability queries; backends that need a daemon
    /// round-trip answer here without changing callers.
    pub async fn is_local_emulator(&self) -> bool {
        self.emulator
    }

    /// Whether the device can render with GPU acceleration
    pub async fn supports_hardware_rendering(&self) -> bool {
        self.capabilities.hardware_rendering
    }

    /// Platform kind for this device
    pub async fn target_platform(&self) -> TargetPlatform {
        TargetPlatform::from_identifier(&self.platform)
    }

    /// Resolve every async capability of this entry into a [`TargetDevice`]
    pub async fn resolve(&self) -> TargetDevice {
        let (emulator, hardware_rendering, platform) = tokio::join!(
            self.is_local_emulator(),
            self.supports_hardware_rendering(),
            self.target_platform(),
        );

        TargetDevice {
            id: self.id.clone(),
            name: self.name.clone(),
            emulator,
            supports_hardware_rendering: hardware_rendering,
            supports_hot_reload: self.capabilities.hot_reload,
            platform,
        }
    }

    /// Check if this device matches a device specifier
    ///
    /// The specifier can be an exact device ID, a case-insensitive partial
    /// name match, or a platform prefix (e.g., "ios", "android").
    pub fn matches(&self, specifier: &str) -> bool {
        let spec_lower = specifier.to_lowercase();

        if self.id.to_lowercase() == spec_lower {
            return true;
        }
        if self.name.to_lowercase().contains(&spec_lower) {
            return true;
        }
        self.platform.to_lowercase().starts_with(&spec_lower)
    }
}

/// An attached device with all capability queries resolved
#[derive(Debug, Clone, PartialEq)]
pub struct TargetDevice {
    pub id: String,
    pub name: String,
    pub emulator: bool,
    pub supports_hardware_rendering: bool,
    pub supports_hot_reload: bool,
    pub platform: TargetPlatform,
}

impl TargetDevice {
    /// Display string, annotating emulators
    pub fn display_name(&self) -> String {
        if self.emulator {
            format!("{} (emulator)", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// Resolve raw entries concurrently into fully probed target devices
pub async fn resolve_capabilities(entries: &[DeviceEntry]) -> Vec<TargetDevice> {
    join_all(entries.iter().map(|entry| entry.resolve())).await
}

/// Device-discovery collaborator contract
#[allow(async_fn_in_trait)]
pub trait DeviceResolver {
    /// Whether the user explicitly asked to target every attached device.
    ///
    /// This is about the *request*, not the resolved list size: resolution
    /// happening to return many devices does not make this true.
    fn has_requested_all_devices(&self) -> bool;

    /// Resolve the requested device set, or `None` when nothing matched
    async fn resolve_target_devices(&self) -> Result<Option<Vec<TargetDevice>>>;
}

/// Discovers devices by shelling out to `flutter devices --machine`
#[derive(Debug, Clone)]
pub struct FlutterDeviceResolver {
    specifier: Option<String>,
    timeout: Duration,
}

impl FlutterDeviceResolver {
    pub fn new(specifier: Option<String>) -> Self {
        Self {
            specifier,
            timeout: DEVICES_TIMEOUT,
        }
    }

    pub fn with_timeout(specifier: Option<String>, timeout: Duration) -> Self {
        Self { specifier, timeout }
    }

    /// Filter discovered entries against the requested specifier
    fn select<'a>(&self, entries: &'a [DeviceEntry]) -> Vec<&'a DeviceEntry> {
        match self.specifier.as_deref() {
            None | Some(ALL_DEVICES_SPECIFIER) => entries.iter().collect(),
            Some(spec) => entries.iter().filter(|entry| entry.matches(spec)).collect(),
        }
    }
}

impl DeviceResolver for FlutterDeviceResolver {
    fn has_requested_all_devices(&self) -> bool {
        self.specifier.as_deref() == Some(ALL_DEVICES_SPECIFIER)
    }

    async fn resolve_target_devices(&self) -> Result<Option<Vec<TargetDevice>>> {
        info!("Discovering target devices...");

        let output = timeout(self.timeout, run_flutter_devices())
            .await
            .map_err(|_| Error::process("Device discovery timed out"))??;

        let entries = parse_devices_output(&output)?;
        let selected = self.select(&entries);
        if selected.is_empty() {
            warn!(
                "No devices matched specifier {:?} ({} attached)",
                self.specifier,
                entries.len()
            );
            return Ok(None);
        }

        let devices =
            resolve_capabilities(&selected.into_iter().cloned().collect::<Vec<_>>()).await;
        info!("Resolved {} target device(s)", devices.len());
        Ok(Some(devices))
    }
}

/// Run flutter devices command, returning raw stdout
async fn run_flutter_devices() -> Result<String> {
    let output = Command::new("flutter")
        .args(["devices", "--machine"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FlutterNotFound
            } else {
                Error::process(format!("Failed to run flutter devices: {}", e))
            }
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if !stderr.is_empty() {
        debug!("flutter devices stderr: {}", stderr);
    }

    // Be lenient with exit codes - flutter devices may fail for non-critical
    // reasons (e.g., adb not found) but still output valid devices
    if !output.status.success() && !(stdout.contains('[') && stdout.contains(']')) {
        return Err(Error::process(format!(
            "flutter devices failed with exit code {:?}: {}",
            output.status.code(),
            stderr
        )));
    }

    Ok(stdout)
}

/// Parse the JSON output from flutter devices --machine
///
/// The output might have non-JSON lines (like "Downloading..." messages), so
/// the JSON array is located by bracket scanning first.
fn parse_devices_output(output: &str) -> Result<Vec<DeviceEntry>> {
    let json_start = output.find('[');
    let json_end = output.rfind(']');

    let json_str = match (json_start, json_end) {
        (Some(start), Some(end)) if end > start => &output[start..=end],
        _ => {
            warn!("No JSON array found in flutter devices output");
            return Ok(Vec::new());
        }
    };

    let entries: Vec<DeviceEntry> = serde_json::from_str(json_str)
        .map_err(|e| Error::protocol(format!("Failed to parse device list: {}", e)))?;

    Ok(entries)
}
