//! flaunch - a headless launch orchestrator for Flutter apps
//!
//! This is the binary entry point. All logic lives in the workspace crates.

use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use flaunch_app::{load_launch_defaults, run_app, LaunchDefaults, LogReporter, RunOptions};
use flaunch_core::BuildMode;
use flaunch_daemon::{ensure_flutter_available, FlutterDeviceResolver, MachineClient};

/// flaunch - a headless launch orchestrator for Flutter apps
#[derive(Parser, Debug)]
#[command(name = "flaunch")]
#[command(about = "Launch a Flutter app on attached devices", long_about = None)]
#[command(group(ArgGroup::new("mode").args(["debug", "profile", "dynamic_profile", "release"])))]
struct Args {
    /// Path to the Flutter project
    #[arg(value_name = "PATH")]
    path: Option<PathBuf>,

    /// Target device ID, platform prefix, or "all"
    #[arg(short = 'd', long)]
    device: Option<String>,

    /// Build in debug mode (default)
    #[arg(long)]
    debug: bool,

    /// Build in profile mode
    #[arg(long)]
    profile: bool,

    /// Build in instrumented profile mode (for --train)
    #[arg(long)]
    dynamic_profile: bool,

    /// Build in release mode
    #[arg(long)]
    release: bool,

    /// Application entry file, relative to the project root
    #[arg(short = 't', long)]
    target: Option<PathBuf>,

    /// Route to push when the app starts
    #[arg(long)]
    route: Option<String>,

    /// Disable live reload (a one-shot session is used instead)
    #[arg(long)]
    no_hot: bool,

    /// Hand the session off to a protocol server (machine interface)
    #[arg(long)]
    machine: bool,

    /// Do not build before running
    #[arg(long)]
    no_build: bool,

    /// Launch a pre-built application binary
    #[arg(long, value_name = "BINARY")]
    use_application_binary: Option<PathBuf>,

    /// Exit once the app has started instead of staying resident
    #[arg(long)]
    no_resident: bool,

    /// Track widget creation locations
    #[arg(long)]
    track_widget_creation: bool,

    /// Write the compiled kernel output to this path
    #[arg(long, value_name = "PATH")]
    output_dill: Option<PathBuf>,

    /// Path to the package configuration file
    #[arg(long, value_name = "FILE")]
    packages: Option<PathBuf>,

    /// Filesystem root for the compiler (repeatable)
    #[arg(long = "filesystem-root", value_name = "PATH")]
    filesystem_roots: Vec<String>,

    /// Filesystem scheme for the compiler
    #[arg(long)]
    filesystem_scheme: Option<String>,

    /// Restrict launched views to this filter
    #[arg(long)]
    view_filter: Option<String>,

    /// Prefer dual-stack (IPv6) networking for tool connections
    #[arg(long)]
    ipv6: bool,

    /// Pause app execution until a debugger attaches
    #[arg(long)]
    start_paused: bool,

    /// Render text with a font standardized over all platforms
    #[arg(long)]
    use_test_fonts: bool,

    /// Force software rendering on emulators
    #[arg(long)]
    enable_software_rendering: bool,

    /// Make Skia rendering deterministic
    #[arg(long)]
    skia_deterministic_rendering: bool,

    /// Trace Skia calls
    #[arg(long)]
    trace_skia: bool,

    /// Port for the observatory debugger connection
    #[arg(long)]
    observatory_port: Option<u16>,

    /// Trace application startup (one-shot sessions only)
    #[arg(long)]
    trace_startup: bool,

    /// Measure and record launch/restart timings (live reload only)
    #[arg(long)]
    benchmark: bool,

    /// Save a compilation training trace (live reload only)
    #[arg(long = "train")]
    save_compilation_trace: bool,
}

impl Args {
    fn build_mode(&self, default: Option<BuildMode>) -> BuildMode {
        if self.release {
            BuildMode::Release
        } else if self.dynamic_profile {
            BuildMode::DynamicProfile
        } else if self.profile {
            BuildMode::Profile
        } else if self.debug {
            BuildMode::Debug
        } else {
            default.unwrap_or_default()
        }
    }

    /// Assemble the immutable run configuration, with CLI flags taking
    /// precedence over the project's launch defaults.
    fn into_options(self, defaults: &LaunchDefaults, project_root: PathBuf) -> RunOptions {
        let base = RunOptions::default();
        RunOptions {
            build_mode: self.build_mode(defaults.mode),
            target: self
                .target
                .or_else(|| defaults.target.clone())
                .unwrap_or(base.target),
            route: self.route.or_else(|| defaults.route.clone()),
            project_root,
            use_hot_reload: !self.no_hot,
            machine: self.machine,
            build: !self.no_build,
            application_binary: self.use_application_binary,
            stay_resident: !self.no_resident,
            track_widget_creation: self.track_widget_creation,
            output_dill: self.output_dill,
            packages_file: self.packages,
            filesystem_roots: self.filesystem_roots,
            filesystem_scheme: self.filesystem_scheme,
            view_filter: self.view_filter,
            ipv6: self.ipv6,
            start_paused: self.start_paused,
            use_test_fonts: self.use_test_fonts,
            enable_software_rendering: self.enable_software_rendering,
            skia_deterministic_rendering: self.skia_deterministic_rendering,
            trace_skia: self.trace_skia,
            observatory_port: self.observatory_port,
            trace_startup: self.trace_startup,
            benchmark: self.benchmark,
            save_compilation_trace: self.save_compilation_trace,
        }
    }
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    flaunch_core::logging::init()?;

    let args = Args::parse();

    let project_root = args
        .path
        .clone()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let defaults = load_launch_defaults(&project_root)?;
    let specifier = args.device.clone().or_else(|| defaults.device.clone());
    let options = args.into_options(&defaults, project_root);

    ensure_flutter_available().await?;

    let resolver = FlutterDeviceResolver::new(specifier);
    let reporter = LogReporter;

    // The protocol server is only spawned on the handoff path
    let client = if options.machine {
        Some(MachineClient::connect(&options.project_root)?)
    } else {
        None
    };

    match run_app(options, &resolver, client.as_ref(), &reporter).await {
        Ok(result) => {
            match result.started_at {
                Some(started_at) => eprintln!(
                    "✅ Application started at {} ({})",
                    started_at.format("%H:%M:%S%.3f"),
                    result.label()
                ),
                None => eprintln!("✅ Session finished ({})", result.label()),
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("launch failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(e.exit_status());
        }
    }
}
