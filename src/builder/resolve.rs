//! Build variant and output path resolution.
//!
//! Turns lifecycle mode flags, the target platform and the artifact path the
//! packaging host expects into everything the CMake driver needs. No I/O.

use std::path::Path;

use serde::Serialize;

use crate::core::artifact::ArtifactLocation;
use crate::core::errors::ResolveError;
use crate::core::mode::{BuildMode, ModeFlags};
use crate::core::platform::PlatformInfo;

/// Fully resolved parameters for one extension build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedBuild {
    pub mode: BuildMode,
    pub location: ArtifactLocation,
    pub platform_args: Vec<String>,
}

/// Resolve build parameters for one extension.
pub fn resolve(
    flags: &ModeFlags,
    platform: &PlatformInfo,
    artifact_path: &Path,
) -> Result<ResolvedBuild, ResolveError> {
    let location = ArtifactLocation::from_path(artifact_path)?;
    let mode = BuildMode::from_flags(flags);
    let platform_args = platform.configure_args();

    tracing::debug!(
        "resolved {} ({}) -> {}",
        location.file_name(),
        mode.variant,
        location.dir.display()
    );

    Ok(ResolvedBuild {
        mode,
        location,
        platform_args,
    })
}
