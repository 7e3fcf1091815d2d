//! Implementation of `extforge build-ext`.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::builder::cmake::{CMakeDriver, CMakeSettings};
use crate::builder::plan::{BuildPlan, PlannedTarget};
use crate::builder::resolve::{resolve, ResolvedBuild};
use crate::core::errors::{BuildError, Phase};
use crate::core::manifest::Project;
use crate::core::mode::ModeFlags;
use crate::core::platform::PlatformInfo;
use crate::core::runtime::RuntimeInfo;
use crate::core::target::BuildTarget;
use crate::util::config::Config;
use crate::util::process::{find_cmake, CommandRunner, ProcessBuilder, ProcessStatus};

/// Options for the build-ext command.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildExtOptions {
    /// Variant and feature flags
    pub flags: ModeFlags,

    /// Write modules into the source tree instead of the build directory
    pub inplace: bool,
}

/// A module produced by the external build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltExtension {
    pub target: String,
    pub path: PathBuf,
}

/// Everything needed to build a project's extensions.
#[derive(Debug, Clone)]
pub struct BuildContext<'a> {
    pub project: &'a Project,
    pub runtime: &'a RuntimeInfo,
    pub platform: PlatformInfo,
    pub build_dir: PathBuf,
    pub settings: CMakeSettings,
    cmake_found: bool,
}

impl<'a> BuildContext<'a> {
    /// Create a build context from the project, interpreter and config.
    pub fn new(project: &'a Project, runtime: &'a RuntimeInfo, config: &Config) -> Self {
        let located = find_cmake(config.build.cmake.as_deref());
        let cmake_found = located.is_some();
        let cmake = located
            .or_else(|| config.build.cmake.clone())
            .unwrap_or_else(|| PathBuf::from("cmake"));

        let platform = PlatformInfo::host()
            .with_pointer_width(runtime.pointer_width())
            .with_arch_override(config.build.architecture.clone());

        BuildContext {
            project,
            runtime,
            platform,
            build_dir: config.build_dir(project.root()),
            settings: CMakeSettings {
                cmake,
                python: runtime.executable.clone(),
                var_prefix: project.manifest().cmake_prefix(),
                generator: config.build.generator.clone(),
                jobs: config.build.jobs,
            },
            cmake_found,
        }
    }

    /// Use a specific platform instead of the host.
    pub fn with_platform(mut self, platform: PlatformInfo) -> Self {
        self.platform = platform;
        self
    }

    /// Fail early when CMake is not installed.
    pub fn require_cmake(&self) -> Result<()> {
        if !self.cmake_found {
            bail!(
                "CMake not found\n\
                 \n\
                 CMake is required to build native extensions.\n\
                 Install CMake and ensure it's in your PATH, or set `build.cmake` in config."
            );
        }
        Ok(())
    }

    /// Parent of every per-target CMake build tree.
    pub fn build_temp(&self) -> PathBuf {
        self.build_dir.join("temp")
    }

    /// Staging directory for non-inplace builds.
    pub fn build_lib(&self) -> PathBuf {
        self.build_dir.join("lib")
    }

    /// Full path the packaging host expects a module at.
    pub fn artifact_path(&self, target: &BuildTarget, inplace: bool) -> PathBuf {
        let base = if inplace {
            self.project.package_root()
        } else {
            self.build_lib()
        };
        target.module_path(&base, &self.runtime.ext_suffix)
    }

    /// Resolve every target up front, before any subprocess runs.
    pub fn resolve_all(
        &self,
        opts: &BuildExtOptions,
    ) -> Result<Vec<(BuildTarget, ResolvedBuild)>, BuildError> {
        self.project
            .targets()
            .into_iter()
            .map(|target| -> Result<_, BuildError> {
                let path = self.artifact_path(&target, opts.inplace);
                let resolved = resolve(&opts.flags, &self.platform, &path)?;
                Ok((target, resolved))
            })
            .collect()
    }
}

/// Build every extension, in declaration order.
pub fn build_ext<R: CommandRunner>(
    ctx: &BuildContext<'_>,
    opts: &BuildExtOptions,
    runner: R,
) -> Result<Vec<BuiltExtension>, BuildError> {
    build_ext_with(ctx, opts, runner, |_, _| {})
}

/// Build every extension, reporting each phase before it starts.
///
/// The first failure aborts the remaining targets.
pub fn build_ext_with<R, F>(
    ctx: &BuildContext<'_>,
    opts: &BuildExtOptions,
    runner: R,
    mut on_phase: F,
) -> Result<Vec<BuiltExtension>, BuildError>
where
    R: CommandRunner,
    F: FnMut(&BuildTarget, Phase),
{
    let resolved = ctx.resolve_all(opts)?;
    if resolved.is_empty() {
        tracing::warn!("no [[extension]] targets declared; nothing to build");
        return Ok(Vec::new());
    }

    let build_temp = ctx.build_temp();
    let mut driver = CMakeDriver::new(ctx.settings.clone(), runner);
    let mut built = Vec::with_capacity(resolved.len());

    for (target, build) in &resolved {
        on_phase(target, Phase::Configure);
        let configured = driver.configure(target, build, &build_temp)?;
        on_phase(target, Phase::Build);
        driver.compile(configured)?;

        let path = build.location.path();
        tracing::debug!("built `{}` -> {}", target.name, path.display());
        built.push(BuiltExtension {
            target: target.name.clone(),
            path,
        });
    }

    Ok(built)
}

/// Describe the commands `build_ext` would run, without running them.
pub fn plan(ctx: &BuildContext<'_>, opts: &BuildExtOptions) -> Result<BuildPlan, BuildError> {
    let build_temp = ctx.build_temp();
    // Only used to render commands
    let driver = CMakeDriver::new(ctx.settings.clone(), NoopRunner);

    let targets = ctx
        .resolve_all(opts)?
        .into_iter()
        .map(|(target, build)| {
            let work_dir = target.work_dir(&build_temp);
            let configure = driver.configure_command(&target, &build, &work_dir);
            let compile = driver.build_command(build.mode.variant, &work_dir);
            PlannedTarget {
                variant: build.mode.variant,
                features: build
                    .mode
                    .features
                    .iter()
                    .filter(|(_, enabled)| **enabled)
                    .map(|(feature, _)| *feature)
                    .collect(),
                artifact: build.location.path(),
                configure: command_line(configure.get_program(), configure.get_args()),
                build: command_line(compile.get_program(), compile.get_args()),
                work_dir,
                name: target.name,
            }
        })
        .collect();

    Ok(BuildPlan::new(targets))
}

fn command_line(program: &Path, args: &[OsString]) -> Vec<String> {
    std::iter::once(program.display().to_string())
        .chain(args.iter().map(|a| a.to_string_lossy().into_owned()))
        .collect()
}

struct NoopRunner;

impl CommandRunner for NoopRunner {
    fn run(&mut self, cmd: &ProcessBuilder) -> io::Result<ProcessStatus> {
        Err(io::Error::other(format!(
            "planning never runs commands: {}",
            cmd.display_command()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mode::BuildVariant;
    use crate::core::platform::OsFamily;
    use crate::test_support::{manifests, runtime, MockRunner, ProjectFixture};
    use tempfile::TempDir;

    fn linux() -> PlatformInfo {
        PlatformInfo::new(OsFamily::Linux, "x86_64", 64)
    }

    #[test]
    fn test_artifact_paths() {
        let tmp = TempDir::new().unwrap();
        let project = ProjectFixture::extension("cells").load(tmp.path());
        let rt = runtime(None);
        let ctx = BuildContext::new(&project, &rt, &Config::default());
        let target = &project.targets()[0];

        assert_eq!(
            ctx.artifact_path(target, true),
            project
                .root()
                .join("cells/native.cpython-311-x86_64-linux-gnu.so")
        );
        assert_eq!(
            ctx.artifact_path(target, false),
            project
                .root()
                .join("build/lib/cells/native.cpython-311-x86_64-linux-gnu.so")
        );
    }

    #[test]
    fn test_build_ext_inplace() {
        let tmp = TempDir::new().unwrap();
        let project = ProjectFixture::extension("cells").load(tmp.path());
        let rt = runtime(None);
        let ctx = BuildContext::new(&project, &rt, &Config::default()).with_platform(linux());
        let mut runner = MockRunner::new();

        let opts = BuildExtOptions {
            inplace: true,
            ..Default::default()
        };
        let built = build_ext(&ctx, &opts, &mut runner).unwrap();

        assert_eq!(built.len(), 1);
        assert_eq!(built[0].target, "cells.native");
        let pkg_dir = project.root().join("cells");
        assert!(runner.calls()[0].contains(&format!(
            "-DCMAKE_LIBRARY_OUTPUT_DIRECTORY={}",
            pkg_dir.display()
        )));
        assert!(runner.calls()[0].contains("-DCELLS_ARTIFACT_NAME=native"));
        let work_dir = project.root().join("build/temp/cells.native");
        assert_eq!(runner.cwds()[0].as_deref(), Some(work_dir.as_path()));
        assert_eq!(runner.cwds()[1].as_deref(), Some(work_dir.as_path()));
    }

    #[test]
    fn test_failed_build_aborts_remaining_targets() {
        let tmp = TempDir::new().unwrap();
        let project = ProjectFixture::extension("multi")
            .with_manifest(manifests::two_extensions("multi"))
            .load(tmp.path());
        let rt = runtime(None);
        let ctx = BuildContext::new(&project, &rt, &Config::default()).with_platform(linux());
        let mut runner = MockRunner::new();
        runner.fail_when("--build", 1);

        let err = build_ext(&ctx, &BuildExtOptions::default(), &mut runner).unwrap_err();

        assert_eq!(err.phase(), Some(Phase::Build));
        assert_eq!(runner.calls().len(), 2);
        assert_eq!(runner.count_containing("-DMULTI_ARTIFACT_NAME=second"), 0);
    }

    #[test]
    fn test_targets_built_in_order() {
        let tmp = TempDir::new().unwrap();
        let project = ProjectFixture::extension("multi")
            .with_manifest(manifests::two_extensions("multi"))
            .load(tmp.path());
        let rt = runtime(None);
        let ctx = BuildContext::new(&project, &rt, &Config::default()).with_platform(linux());
        let mut runner = MockRunner::new();
        let mut phases = Vec::new();

        build_ext_with(&ctx, &BuildExtOptions::default(), &mut runner, |t, p| {
            phases.push((t.name.clone(), p))
        })
        .unwrap();

        assert_eq!(
            phases,
            vec![
                ("multi.first".to_string(), Phase::Configure),
                ("multi.first".to_string(), Phase::Build),
                ("multi.second".to_string(), Phase::Configure),
                ("multi.second".to_string(), Phase::Build),
            ]
        );
        assert_eq!(runner.calls().len(), 4);
    }

    #[test]
    fn test_plan_runs_nothing() {
        let tmp = TempDir::new().unwrap();
        let project = ProjectFixture::extension("cells").load(tmp.path());
        let rt = runtime(None);
        let ctx = BuildContext::new(&project, &rt, &Config::default()).with_platform(linux());
        let opts = BuildExtOptions {
            flags: ModeFlags {
                release_with_debug_info: true,
                show_diagnostic_dialog: true,
                ..Default::default()
            },
            inplace: false,
        };

        let plan = plan(&ctx, &opts).unwrap();

        assert_eq!(plan.targets.len(), 1);
        let target = &plan.targets[0];
        assert_eq!(target.variant, BuildVariant::RelWithDebInfo);
        assert_eq!(target.build[1..4], ["--build", ".", "--config"]);
        assert!(target
            .configure
            .iter()
            .any(|a| a == "-DCELLS_SHOW_DIAGNOSTIC_DIALOG=ON"));
        assert!(!project.root().join("build").exists());
    }
}
