//! `extforge develop` command

use anyhow::Result;

use crate::cli::{DevelopArgs, GlobalArgs};
use extforge::core::RuntimeInfo;
use extforge::ops::build_ext::BuildContext;
use extforge::ops::develop::{DevelopInstaller, DevelopOptions};
use extforge::ops::egg_info::EggLifecycle;
use extforge::util::process::SystemRunner;

pub fn execute(global: &GlobalArgs, args: DevelopArgs) -> Result<()> {
    let (project, mut config) = super::load_project(global)?;

    if args.jobs.is_some() {
        config.build.jobs = args.jobs;
    }

    let runtime = RuntimeInfo::resolve(&config.python)?;
    let ctx = BuildContext::new(&project, &runtime, &config);
    ctx.require_cmake()?;

    let lifecycle = EggLifecycle::new(
        &project,
        runtime.executable.clone(),
        runtime.install_dir()?.to_path_buf(),
        SystemRunner,
    )
    .dry_run(args.dry_run);

    let mut installer = DevelopInstaller::new(lifecycle);
    if let Some(source) = args.bootstrap {
        installer = installer.with_bootstrap(source);
    }

    let opts = DevelopOptions {
        flags: config.default_flags().with_overrides(args.mode.overrides()),
        no_deps: args.no_deps,
        dry_run: args.dry_run,
    };

    let built = match installer.install_for_development(&ctx, &opts, SystemRunner) {
        Ok(built) => built,
        Err(e) => {
            tracing::debug!("develop stopped in state `{}`", installer.state());
            return Err(e.into());
        }
    };

    for ext in &built {
        eprintln!("    Finished `{}` -> {}", ext.target, ext.path.display());
    }
    if args.dry_run {
        eprintln!("    Dry run: editable link not written");
    }

    Ok(())
}
