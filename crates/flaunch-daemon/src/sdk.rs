//! Flutter SDK availability checking
//!
//! A cheap probe run once at startup, so a missing SDK produces one friendly
//! error instead of a spawn failure deep inside a launch.

use std::process::Stdio;
use tokio::process::Command;

use flaunch_core::prelude::*;

/// Verify that the `flutter` binary is runnable
pub async fn ensure_flutter_available() -> Result<()> {
    let status = Command::new("flutter")
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match status {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => {
            warn!("flutter --version exited with {:?}", status.code());
            // A failing version check still means the binary exists
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::FlutterNotFound),
        Err(e) => Err(Error::process(format!(
            "Failed to run flutter --version: {}",
            e
        ))),
    }
}
