//! `extforge clean` command

use anyhow::Result;

use crate::cli::{CleanArgs, GlobalArgs};
use extforge::util::fs::remove_dir_all_if_exists;

pub fn execute(global: &GlobalArgs, args: CleanArgs) -> Result<()> {
    let (project, config) = super::load_project(global)?;

    let build_dir = config.build_dir(project.root());
    remove_dir_all_if_exists(&build_dir)?;
    eprintln!("     Removed {}", build_dir.display());

    if args.all {
        let egg_info = project.egg_info_dir();
        remove_dir_all_if_exists(&egg_info)?;
        eprintln!("     Removed {}", egg_info.display());
    }

    Ok(())
}
