//! Execution strategy selection and per-device build options
//!
//! Strategy choice is a total function: live reload is selected exactly when
//! the reload flag is on AND the build mode is debug; every other combination
//! falls through to the one-shot strategy. The choice is made once per
//! invocation and never switched mid-session.

use flaunch_core::{BuildMode, DebuggingOptions};
use flaunch_daemon::TargetDevice;

use crate::options::RunOptions;

/// The two mutually exclusive execution strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerKind {
    /// Live-reload session: keeps the app updatable without a full restart
    Hot,
    /// One-shot session: build, launch, run to completion
    Cold,
}

impl RunnerKind {
    /// Select the strategy for a (mode, reload-flag) pair
    pub fn select(mode: BuildMode, use_hot_reload: bool) -> Self {
        if use_hot_reload && mode == BuildMode::Debug {
            RunnerKind::Hot
        } else {
            RunnerKind::Cold
        }
    }

    /// Label used in launch results ("hot" / "cold")
    pub fn label(&self) -> &'static str {
        match self {
            RunnerKind::Hot => "hot",
            RunnerKind::Cold => "cold",
        }
    }
}

/// One validated device wrapped with its per-device build options
#[derive(Debug, Clone)]
pub struct DeviceRunConfig {
    pub device: TargetDevice,
    pub track_widget_creation: bool,
    pub output_dill: Option<std::path::PathBuf>,
    pub filesystem_roots: Vec<String>,
    pub filesystem_scheme: Option<String>,
    pub view_filter: Option<String>,
}

impl DeviceRunConfig {
    pub fn for_options(device: TargetDevice, options: &RunOptions) -> Self {
        Self {
            device,
            track_widget_creation: options.track_widget_creation,
            output_dill: options.output_dill.clone(),
            filesystem_roots: options.filesystem_roots.clone(),
            filesystem_scheme: options.filesystem_scheme.clone(),
            view_filter: options.view_filter.clone(),
        }
    }

    /// Build the complete `flutter run --machine` argument vector for this device
    pub fn run_args(
        &self,
        options: &RunOptions,
        debugging: &DebuggingOptions,
        kind: RunnerKind,
        route: Option<&str>,
        should_build: bool,
    ) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "run".into(),
            "--machine".into(),
            "-d".into(),
            self.device.id.clone(),
        ];

        args.extend(debugging.build_mode.as_args().iter().map(|s| s.to_string()));
        args.extend(debugging.to_run_args());

        args.push(format!("--target={}", options.target.display()));

        match kind {
            RunnerKind::Hot => {
                args.push("--hot".into());
                if options.benchmark {
                    args.push("--benchmark".into());
                }
                if options.save_compilation_trace {
                    args.push("--train".into());
                }
            }
            RunnerKind::Cold => {
                args.push("--no-hot".into());
                if options.trace_startup {
                    args.push("--trace-startup".into());
                }
            }
        }

        if self.track_widget_creation {
            args.push("--track-widget-creation".into());
        }
        if let Some(dill) = &self.output_dill {
            args.push(format!("--output-dill={}", dill.display()));
        }
        for root in &self.filesystem_roots {
            args.push(format!("--filesystem-root={}", root));
        }
        if let Some(scheme) = &self.filesystem_scheme {
            args.push(format!("--filesystem-scheme={}", scheme));
        }
        if let Some(filter) = &self.view_filter {
            args.push(format!("--view-filter={}", filter));
        }
        if let Some(packages) = &options.packages_file {
            args.push(format!("--packages={}", packages.display()));
        }
        if let Some(binary) = &options.application_binary {
            args.push(format!("--use-application-binary={}", binary.display()));
        }
        if !should_build {
            args.push("--no-build".into());
        }
        if options.ipv6 {
            args.push("--ipv6".into());
        }
        if let Some(route) = route {
            args.push(format!("--route={}", route));
        }

        args
    }
}
