//! Device validation gate
//!
//! A pure gate over the resolved device set: checks run eagerly, in a fixed
//! order, and the first applicable failure aborts the invocation. No check
//! mutates anything.

use flaunch_core::prelude::*;
use flaunch_daemon::TargetDevice;

use crate::options::RunOptions;
use crate::strategy::RunnerKind;

/// Validate the resolved device set against the requested launch.
///
/// `all_devices_requested` reflects the user's explicit request, not the size
/// of the resolved list; the two are deliberately distinct conditions.
pub fn validate_devices(
    devices: &[TargetDevice],
    options: &RunOptions,
    all_devices_requested: bool,
    strategy: RunnerKind,
) -> Result<()> {
    if devices.is_empty() {
        return Err(Error::NoDevicesFound);
    }

    if all_devices_requested && options.application_binary.is_some() {
        return Err(Error::unsupported(
            "cannot launch a pre-built application binary on all devices",
        ));
    }

    for device in devices {
        if !device.emulator {
            continue;
        }
        if device.supports_hardware_rendering {
            // Advisory only: name the renderer this emulator will use
            if options.enable_software_rendering {
                info!(
                    "Using software rendering with device {}. If you notice graphics artifacts, \
                     consider enabling hardware rendering with \"--no-enable-software-rendering\".",
                    device.display_name()
                );
            } else {
                info!(
                    "Using hardware rendering with device {}. If you notice graphics artifacts, \
                     consider enabling software rendering with \"--enable-software-rendering\".",
                    device.display_name()
                );
            }
        }
        if !options.build_mode.supports_emulator() {
            return Err(Error::ModeNotSupportedOnEmulator {
                mode: options.build_mode,
            });
        }
    }

    if strategy == RunnerKind::Hot {
        if let Some(device) = devices.iter().find(|d| !d.supports_hot_reload) {
            return Err(Error::ReloadUnsupported {
                device: device.name.clone(),
            });
        }
    }

    if options.save_compilation_trace && !options.build_mode.supports_compilation_trace() {
        return Err(Error::invalid_flags(format!(
            "--train is not supported in {} mode",
            options.build_mode
        )));
    }

    Ok(())
}
