//! Per-project launch defaults (.flaunch/launch.toml)
//!
//! Optional TOML file providing defaults for the most common flags; values
//! given on the command line always win. A missing file is not an error.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use flaunch_core::prelude::*;
use flaunch_core::BuildMode;

const FLAUNCH_DIR: &str = ".flaunch";
const LAUNCH_FILENAME: &str = "launch.toml";

/// Launch defaults read from the project configuration file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LaunchDefaults {
    /// Target device ID, platform prefix, or "all"
    #[serde(default)]
    pub device: Option<String>,

    /// Build mode: debug, profile, dynamic-profile, or release
    #[serde(default)]
    pub mode: Option<BuildMode>,

    /// Entry point relative to the project root
    #[serde(default)]
    pub target: Option<PathBuf>,

    /// Initial route
    #[serde(default)]
    pub route: Option<String>,
}

/// Load launch defaults for a project, if any are configured
pub fn load_launch_defaults(project_root: &Path) -> Result<LaunchDefaults> {
    let path = project_root.join(FLAUNCH_DIR).join(LAUNCH_FILENAME);
    if !path.exists() {
        return Ok(LaunchDefaults::default());
    }

    let content = std::fs::read_to_string(&path)?;
    let defaults: LaunchDefaults = toml::from_str(&content)
        .map_err(|e| Error::config(format!("invalid {}: {}", path.display(), e)))?;

    debug!("Loaded launch defaults from {}", path.display());
    Ok(defaults)
}
