//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use extforge::ModeOverrides;

/// extforge - builds CMake-based native Python extensions
#[derive(Parser)]
#[command(name = "extforge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to extforge.toml (defaults to searching upward from cwd)
    #[arg(long, global = true, value_name = "PATH", env = "EXTFORGE_MANIFEST")]
    pub manifest_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build native extensions with CMake
    BuildExt(BuildExtArgs),

    /// Build extensions in place and install the project in development mode
    Develop(DevelopArgs),

    /// Remove build artifacts
    Clean(CleanArgs),
}

/// Variant and feature selection shared by build commands.
#[derive(Args)]
pub struct ModeArgs {
    /// Build the Debug variant (takes precedence over --release-with-debug-info)
    #[arg(short, long)]
    pub debug: bool,

    /// Build the RelWithDebInfo variant
    #[arg(long, alias = "rel-with-debug-info")]
    pub release_with_debug_info: bool,

    /// Compile in the native diagnostic dialog
    #[arg(long, overrides_with = "no_show_diagnostic_dialog")]
    pub show_diagnostic_dialog: bool,

    /// Leave out the diagnostic dialog even if config enables it
    #[arg(long, overrides_with = "show_diagnostic_dialog")]
    pub no_show_diagnostic_dialog: bool,

    /// Launch the frame capture tool on startup
    #[arg(long, overrides_with = "no_start_capture_tool")]
    pub start_capture_tool: bool,

    /// Don't launch the capture tool even if config enables it
    #[arg(long, overrides_with = "start_capture_tool")]
    pub no_start_capture_tool: bool,
}

impl ModeArgs {
    pub fn overrides(&self) -> ModeOverrides {
        ModeOverrides {
            debug: self.debug.then_some(true),
            release_with_debug_info: self.release_with_debug_info.then_some(true),
            show_diagnostic_dialog: toggle(
                self.show_diagnostic_dialog,
                self.no_show_diagnostic_dialog,
            ),
            start_capture_tool: toggle(self.start_capture_tool, self.no_start_capture_tool),
        }
    }
}

fn toggle(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

#[derive(Args)]
pub struct BuildExtArgs {
    #[command(flatten)]
    pub mode: ModeArgs,

    /// Write modules into the source tree
    #[arg(short, long)]
    pub inplace: bool,

    /// Print the build plan as JSON (no build)
    #[arg(long)]
    pub plan: bool,

    /// Number of parallel jobs for the build phase
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Args)]
pub struct DevelopArgs {
    #[command(flatten)]
    pub mode: ModeArgs,

    /// Don't install dependencies
    #[arg(long)]
    pub no_deps: bool,

    /// Show what would be installed without writing the link file
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Source to install before linking (requirement or path)
    #[arg(long, value_name = "SOURCE")]
    pub bootstrap: Option<String>,

    /// Number of parallel jobs for the build phase
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Also remove the .egg-info metadata directory
    #[arg(long)]
    pub all: bool,
}
