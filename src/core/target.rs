//! Native extension targets.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// One native extension module to produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildTarget {
    /// Dotted module path (`cellmodeller5.native`)
    pub name: String,
    /// Absolute path of the CMake project root
    pub source_dir: PathBuf,
}

impl BuildTarget {
    pub fn new(name: impl Into<String>, source_dir: impl Into<PathBuf>) -> Self {
        BuildTarget {
            name: name.into(),
            source_dir: source_dir.into(),
        }
    }

    /// Module name without its package (`native`).
    pub fn module_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Path the packaging host expects the module at, under `base`.
    ///
    /// Package components become directories; the module file gets the
    /// interpreter's extension suffix.
    pub fn module_path(&self, base: &Path, ext_suffix: &str) -> PathBuf {
        let mut path = base.to_path_buf();
        let mut parts = self.name.split('.').peekable();
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                path.push(part);
            } else {
                path.push(format!("{}{}", part, ext_suffix));
            }
        }
        path
    }

    /// Private working directory for this target's CMake build tree.
    pub fn work_dir(&self, build_temp: &Path) -> PathBuf {
        build_temp.join(&self.name)
    }
}
