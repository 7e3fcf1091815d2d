//! `extforge build-ext` command

use anyhow::Result;

use crate::cli::{BuildExtArgs, GlobalArgs};
use extforge::core::RuntimeInfo;
use extforge::ops::build_ext::{build_ext, plan, BuildContext, BuildExtOptions};
use extforge::util::process::SystemRunner;

pub fn execute(global: &GlobalArgs, args: BuildExtArgs) -> Result<()> {
    let (project, mut config) = super::load_project(global)?;

    // Jobs: CLI > config > None (CMake decides)
    if args.jobs.is_some() {
        config.build.jobs = args.jobs;
    }

    let runtime = RuntimeInfo::resolve(&config.python)?;
    let ctx = BuildContext::new(&project, &runtime, &config);

    let opts = BuildExtOptions {
        flags: config.default_flags().with_overrides(args.mode.overrides()),
        inplace: args.inplace,
    };

    if args.plan {
        println!("{}", plan(&ctx, &opts)?.to_json()?);
        return Ok(());
    }

    ctx.require_cmake()?;
    let built = build_ext(&ctx, &opts, SystemRunner)?;

    for ext in &built {
        eprintln!("    Finished `{}` -> {}", ext.target, ext.path.display());
    }

    Ok(())
}
