//! Output location of a built extension module.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::errors::ResolveError;

/// Where the external build must place an extension, and under what name.
///
/// Derived from the full path the packaging host expects the module at.
/// Both output-directory variables passed to CMake point at `dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactLocation {
    /// Directory the module is written to
    pub dir: PathBuf,
    /// File name up to the first dot (`native`)
    pub base_name: String,
    /// Everything from the first dot on (`.cpython-311-x86_64-linux-gnu.so`)
    pub suffix: String,
}

impl ArtifactLocation {
    /// Split a requested artifact path into directory, base name and suffix.
    ///
    /// The suffix starts at the first dot so that multi-part ABI tags stay
    /// together.
    pub fn from_path(path: &Path) -> Result<Self, ResolveError> {
        let malformed = || ResolveError::MalformedArtifactPath {
            path: path.to_path_buf(),
        };

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(malformed)?;

        let dot = file_name.find('.').ok_or_else(malformed)?;
        let (base_name, suffix) = file_name.split_at(dot);
        if base_name.is_empty() || suffix.len() == 1 {
            return Err(malformed());
        }

        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Ok(ArtifactLocation {
            dir,
            base_name: base_name.to_string(),
            suffix: suffix.to_string(),
        })
    }

    /// The module's file name.
    pub fn file_name(&self) -> String {
        format!("{}{}", self.base_name, self.suffix)
    }

    /// Full path of the module.
    pub fn path(&self) -> PathBuf {
        self.dir.join(self.file_name())
    }
}
