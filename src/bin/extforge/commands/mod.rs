//! Command implementations

pub mod build_ext;
pub mod clean;
pub mod develop;

use anyhow::Result;

use crate::cli::GlobalArgs;
use extforge::util::{Config, GlobalContext};
use extforge::Project;

/// Locate and load the project and its merged configuration.
pub fn load_project(global: &GlobalArgs) -> Result<(Project, Config)> {
    let ctx = GlobalContext::new()?;

    let manifest_path = match global.manifest_path {
        Some(ref path) => path.clone(),
        None => ctx.find_manifest()?,
    };
    let project = Project::load(&manifest_path)?;
    let config = ctx.load_config(project.root());

    tracing::debug!("project root: {}", project.root().display());
    Ok((project, config))
}
