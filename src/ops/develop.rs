//! Implementation of `extforge develop`.
//!
//! Builds every extension in place and then makes the source tree
//! importable through an editable install:
//!
//! 1. regenerate package metadata
//! 2. build extensions into the source tree (Debug or RelWithDebInfo)
//! 3. install a pending bootstrap source, once
//! 4. register namespace packages
//! 5. write the `.egg-link` pointer file (skipped on dry runs)
//! 6. post-process the distribution (path entry, dependencies)
//!
//! Steps 3-6 are bookkeeping. [`DevelopInstaller::finish_install`] runs
//! them alone, so retrying after a bookkeeping failure never rebuilds.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::errors::{DevelopError, Phase};
use crate::core::mode::ModeFlags;
use crate::ops::build_ext::{build_ext_with, BuildContext, BuildExtOptions, BuiltExtension};
use crate::util::process::CommandRunner;

/// Packaging-host operations sequenced around the in-place build.
pub trait Lifecycle {
    /// Rewrite the project's `.egg-info` metadata.
    fn regenerate_metadata(&mut self) -> anyhow::Result<()>;

    /// Install a bootstrap source (a requirement or a path).
    fn install_bootstrap(&mut self, source: &str) -> anyhow::Result<()>;

    /// Make namespace packages importable from the source tree.
    fn install_namespaces(&mut self) -> anyhow::Result<()>;

    /// Add the source tree to the import path and optionally install
    /// dependencies.
    fn process_distribution(&mut self, install_deps: bool) -> anyhow::Result<()>;
}

impl<L: Lifecycle + ?Sized> Lifecycle for &mut L {
    fn regenerate_metadata(&mut self) -> anyhow::Result<()> {
        (**self).regenerate_metadata()
    }

    fn install_bootstrap(&mut self, source: &str) -> anyhow::Result<()> {
        (**self).install_bootstrap(source)
    }

    fn install_namespaces(&mut self) -> anyhow::Result<()> {
        (**self).install_namespaces()
    }

    fn process_distribution(&mut self, install_deps: bool) -> anyhow::Result<()> {
        (**self).process_distribution(install_deps)
    }
}

/// Progress of one develop invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevelopState {
    Unconfigured,
    Configuring,
    Building,
    Succeeded,
    Linking,
    Done,
    Failed,
}

impl fmt::Display for DevelopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DevelopState::Unconfigured => "unconfigured",
            DevelopState::Configuring => "configuring",
            DevelopState::Building => "building",
            DevelopState::Succeeded => "succeeded",
            DevelopState::Linking => "linking",
            DevelopState::Done => "done",
            DevelopState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Options for the develop command.
#[derive(Debug, Clone, Copy, Default)]
pub struct DevelopOptions {
    pub flags: ModeFlags,

    /// Skip installing `install-requires`
    pub no_deps: bool,

    /// Report what would be linked without writing the link file
    pub dry_run: bool,
}

impl DevelopOptions {
    /// Flags for the in-place build.
    ///
    /// Develop builds always carry debug info: `debug` selects Debug, and
    /// RelWithDebInfo is implied otherwise.
    pub fn build_flags(&self) -> ModeFlags {
        let mut flags = self.flags;
        if !flags.debug {
            flags.release_with_debug_info = true;
        }
        flags
    }
}

/// Pointer file that makes the runtime import from the source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditableLink {
    /// Location of the `.egg-link` file
    pub path: PathBuf,
    /// Directory holding the built packages (the egg base)
    pub egg_path: PathBuf,
    /// Project root
    pub project_root: PathBuf,
}

impl EditableLink {
    /// The link for distribution `dist_name` in `install_dir`.
    pub fn new(
        install_dir: &Path,
        dist_name: &str,
        egg_path: PathBuf,
        project_root: PathBuf,
    ) -> Self {
        EditableLink {
            path: install_dir.join(format!("{}.egg-link", dist_name)),
            egg_path,
            project_root,
        }
    }

    /// Egg path and project root, one per line.
    pub fn contents(&self) -> String {
        format!(
            "{}\n{}",
            self.egg_path.display(),
            self.project_root.display()
        )
    }

    /// Write the link file.
    pub fn write(&self) -> Result<(), DevelopError> {
        std::fs::write(&self.path, self.contents()).map_err(|source| {
            DevelopError::LinkWriteFailure {
                path: self.path.clone(),
                source,
            }
        })
    }
}

/// Development install adapter.
#[derive(Debug)]
pub struct DevelopInstaller<L> {
    lifecycle: L,
    pending_bootstrap: Option<String>,
    state: DevelopState,
    /// Set once every extension built in place
    built: bool,
}

impl<L: Lifecycle> DevelopInstaller<L> {
    pub fn new(lifecycle: L) -> Self {
        DevelopInstaller {
            lifecycle,
            pending_bootstrap: None,
            state: DevelopState::Unconfigured,
            built: false,
        }
    }

    /// Queue a bootstrap source to install on the next develop run.
    pub fn with_bootstrap(mut self, source: impl Into<String>) -> Self {
        self.pending_bootstrap = Some(source.into());
        self
    }

    pub fn state(&self) -> DevelopState {
        self.state
    }

    pub fn pending_bootstrap(&self) -> Option<&str> {
        self.pending_bootstrap.as_deref()
    }

    pub fn lifecycle(&self) -> &L {
        &self.lifecycle
    }

    /// The editable link for a build context.
    pub fn link_for(ctx: &BuildContext<'_>) -> Result<EditableLink, DevelopError> {
        let install_dir = ctx
            .runtime
            .purelib
            .as_deref()
            .ok_or(DevelopError::InstallDirUnknown)?;
        Ok(EditableLink::new(
            install_dir,
            &ctx.project.manifest().filename_safe_name(),
            ctx.project.package_root(),
            ctx.project.root().to_path_buf(),
        ))
    }

    /// Build in place and register the editable install.
    pub fn install_for_development<R: CommandRunner>(
        &mut self,
        ctx: &BuildContext<'_>,
        opts: &DevelopOptions,
        runner: R,
    ) -> Result<Vec<BuiltExtension>, DevelopError> {
        self.state = DevelopState::Unconfigured;
        self.built = false;
        let link = self.fail_on_err(Self::link_for(ctx))?;

        let metadata = self.lifecycle.regenerate_metadata();
        self.fail_on_err(metadata.map_err(|source| DevelopError::Lifecycle {
            step: "metadata regeneration",
            source,
        }))?;

        let build_opts = BuildExtOptions {
            flags: opts.build_flags(),
            inplace: true,
        };
        let mut state = self.state;
        let built = build_ext_with(ctx, &build_opts, runner, |target, phase| {
            tracing::debug!("{}: {} phase", target.name, phase);
            state = match phase {
                Phase::Configure => DevelopState::Configuring,
                Phase::Build => DevelopState::Building,
            };
        });
        self.state = state;
        let built = self.fail_on_err(built.map_err(DevelopError::from))?;
        self.state = DevelopState::Succeeded;
        self.built = true;

        self.finish_install(&link, opts)?;
        Ok(built)
    }

    /// Run the bookkeeping steps that follow a successful build.
    ///
    /// Fails with [`DevelopError::NotBuilt`] unless the last
    /// [`install_for_development`](Self::install_for_development) got past
    /// its build.
    pub fn finish_install(
        &mut self,
        link: &EditableLink,
        opts: &DevelopOptions,
    ) -> Result<(), DevelopError> {
        if !self.built {
            return Err(DevelopError::NotBuilt { state: self.state.to_string() });
        }
        self.state = DevelopState::Linking;

        if let Some(source) = self.pending_bootstrap.clone() {
            tracing::info!("Installing bootstrap source {}", source);
            let installed = self.lifecycle.install_bootstrap(&source);
            let installed = installed.map_err(|e| DevelopError::BootstrapInstallFailure {
                source_spec: source,
                source: e,
            });
            self.fail_on_err(installed)?;
            if !opts.dry_run {
                self.pending_bootstrap = None;
            }
        }

        let namespaces = self.lifecycle.install_namespaces();
        self.fail_on_err(namespaces.map_err(|source| DevelopError::Lifecycle {
            step: "namespace registration",
            source,
        }))?;

        tracing::info!(
            "Creating {} (link to {})",
            link.path.display(),
            link.egg_path.display()
        );
        if !opts.dry_run {
            self.fail_on_err(link.write())?;
        }

        let processed = self.lifecycle.process_distribution(!opts.no_deps);
        self.fail_on_err(processed.map_err(|source| DevelopError::Lifecycle {
            step: "distribution post-processing",
            source,
        }))?;

        self.state = DevelopState::Done;
        Ok(())
    }

    fn fail_on_err<T>(&mut self, result: Result<T, DevelopError>) -> Result<T, DevelopError> {
        if result.is_err() {
            self.state = DevelopState::Failed;
        }
        result
    }
}
