//! CMake driver for native extension projects.
//!
//! Runs CMake's two-phase protocol for one extension at a time: configure
//! the build tree with the resolved parameters, then build the configured
//! variant. The build phase takes the [`Configured`] token returned by a
//! successful configure, so it cannot run first or for another variant.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use crate::builder::resolve::ResolvedBuild;
use crate::core::errors::{BuildError, Phase};
use crate::core::mode::BuildVariant;
use crate::core::target::BuildTarget;
use crate::util::process::{CommandRunner, ProcessBuilder};

/// Settings shared by every extension built in one run.
#[derive(Debug, Clone)]
pub struct CMakeSettings {
    /// CMake executable
    pub cmake: PathBuf,
    /// Interpreter passed as `PYTHON_EXECUTABLE`
    pub python: PathBuf,
    /// Prefix for project-specific variables (`<PREFIX>_ARTIFACT_NAME`)
    pub var_prefix: String,
    /// Generator passed as `-G`
    pub generator: Option<String>,
    /// Parallel jobs for the build phase
    pub jobs: Option<usize>,
}

/// A build tree that configured successfully for one variant.
#[derive(Debug)]
#[must_use = "a configured build tree does nothing until compiled"]
pub struct Configured<'t> {
    target: &'t BuildTarget,
    work_dir: PathBuf,
    variant: BuildVariant,
}

/// CMake build driver.
pub struct CMakeDriver<R> {
    settings: CMakeSettings,
    runner: R,
}

impl<R: CommandRunner> CMakeDriver<R> {
    /// Create a driver running commands through `runner`.
    pub fn new(settings: CMakeSettings, runner: R) -> Self {
        CMakeDriver { settings, runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// The configure-phase command for a target.
    pub fn configure_command(
        &self,
        target: &BuildTarget,
        resolved: &ResolvedBuild,
        work_dir: &Path,
    ) -> ProcessBuilder {
        let variant = resolved.mode.variant;
        let out_dir = &resolved.location.dir;
        let prefix = &self.settings.var_prefix;

        let mut cmd = ProcessBuilder::new(&self.settings.cmake)
            .arg(&target.source_dir)
            .arg(define("CMAKE_LIBRARY_OUTPUT_DIRECTORY", out_dir))
            .arg(define(
                &format!("CMAKE_LIBRARY_OUTPUT_DIRECTORY_{}", variant.config_suffix()),
                out_dir,
            ))
            .arg(format!("-DCMAKE_BUILD_TYPE={}", variant))
            .arg(define("PYTHON_EXECUTABLE", &self.settings.python))
            .arg(format!(
                "-D{}_ARTIFACT_NAME={}",
                prefix, resolved.location.base_name
            ))
            .arg(format!(
                "-D{}_ARTIFACT_SUFFIX={}",
                prefix, resolved.location.suffix
            ))
            .args(resolved.mode.feature_args(prefix));

        if let Some(ref generator) = self.settings.generator {
            cmd = cmd.arg("-G").arg(generator);
        }

        cmd.args(&resolved.platform_args).cwd(work_dir)
    }

    /// The build-phase command for a configured variant.
    pub fn build_command(&self, variant: BuildVariant, work_dir: &Path) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(&self.settings.cmake)
            .args(["--build", "."])
            .arg("--config")
            .arg(variant.as_str());

        // Compilation units build concurrently inside CMake's native tool
        cmd = cmd.arg("--parallel");
        if let Some(jobs) = self.settings.jobs {
            cmd = cmd.arg(jobs.to_string());
        }

        cmd.cwd(work_dir)
    }

    /// Run the configure phase in the target's working directory.
    pub fn configure<'t>(
        &mut self,
        target: &'t BuildTarget,
        resolved: &ResolvedBuild,
        build_temp: &Path,
    ) -> Result<Configured<'t>, BuildError> {
        let work_dir = target.work_dir(build_temp);
        std::fs::create_dir_all(&work_dir).map_err(|source| BuildError::WorkDir {
            dir: work_dir.clone(),
            source,
        })?;

        if !is_cmake_project(&target.source_dir) {
            tracing::warn!(
                "no CMakeLists.txt in {}; configure will likely fail",
                target.source_dir.display()
            );
        }

        tracing::info!("Configuring `{}` ({})", target.name, resolved.mode.variant);
        let cmd = self.configure_command(target, resolved, &work_dir);
        self.run_phase(target, Phase::Configure, &cmd)?;

        Ok(Configured {
            target,
            work_dir,
            variant: resolved.mode.variant,
        })
    }

    /// Run the build phase for a configured tree.
    pub fn compile(&mut self, configured: Configured<'_>) -> Result<(), BuildError> {
        tracing::info!(
            "Building `{}` ({})",
            configured.target.name,
            configured.variant
        );
        let cmd = self.build_command(configured.variant, &configured.work_dir);
        self.run_phase(configured.target, Phase::Build, &cmd)
    }

    /// Configure then build one target, returning the artifact path.
    pub fn build(
        &mut self,
        target: &BuildTarget,
        resolved: &ResolvedBuild,
        build_temp: &Path,
    ) -> Result<PathBuf, BuildError> {
        let configured = self.configure(target, resolved, build_temp)?;
        self.compile(configured)?;
        Ok(resolved.location.path())
    }

    fn run_phase(
        &mut self,
        target: &BuildTarget,
        phase: Phase,
        cmd: &ProcessBuilder,
    ) -> Result<(), BuildError> {
        tracing::debug!("{}: {}", phase, cmd.display_command());

        let status = self.runner.run(cmd).map_err(|source| BuildError::Spawn {
            target: target.name.clone(),
            phase,
            source,
        })?;

        if !status.success() {
            return Err(BuildError::BuildFailure {
                target: target.name.clone(),
                phase,
                exit_code: status.code(),
            });
        }

        Ok(())
    }
}

/// A `-D<name>=<value>` cache entry that keeps path bytes intact.
fn define(name: &str, value: impl AsRef<OsStr>) -> OsString {
    let mut arg = OsString::from(format!("-D{}=", name));
    arg.push(value);
    arg
}

/// Check if a directory contains a CMake project.
pub fn is_cmake_project(dir: &Path) -> bool {
    dir.join("CMakeLists.txt").exists()
}
