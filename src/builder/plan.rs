//! Machine-readable build plan.
//!
//! `extforge build-ext --plan` prints this instead of running CMake. The
//! schema is stable: fields may be added but not renamed or removed.

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use crate::core::mode::{BuildVariant, Feature};

/// Every command the driver would run, per target, in order.
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    pub version: u32,
    pub targets: Vec<PlannedTarget>,
}

/// Planned invocations for one extension.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedTarget {
    pub name: String,
    pub variant: BuildVariant,
    pub features: Vec<Feature>,
    pub artifact: PathBuf,
    pub work_dir: PathBuf,
    pub configure: Vec<String>,
    pub build: Vec<String>,
}

impl BuildPlan {
    pub const VERSION: u32 = 1;

    pub fn new(targets: Vec<PlannedTarget>) -> Self {
        BuildPlan {
            version: Self::VERSION,
            targets,
        }
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
