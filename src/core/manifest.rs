//! `extforge.toml` manifest parsing and schema.
//!
//! The manifest declares the Python distribution (name, version, packages,
//! requirements), its static package data, and the CMake-built extension
//! modules that belong to it:
//!
//! ```toml
//! [package]
//! name = "cellmodeller5"
//! version = "1.0"
//! packages = ["cellmodeller5", "cellmodeller5.shaders"]
//! install-requires = ["numpy"]
//! cmake-prefix = "CELLMODELLER"
//!
//! [package-data]
//! cellmodeller5 = ["shaders/*.glsl"]
//!
//! [[extension]]
//! name = "cellmodeller5.native"
//! source-dir = "."
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::core::target::BuildTarget;

/// Canonical manifest file name.
pub const MANIFEST_NAME: &str = "extforge.toml";

/// Parsed manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Manifest {
    pub package: PackageSection,

    /// Package name -> glob patterns relative to that package's directory
    #[serde(default)]
    pub package_data: BTreeMap<String, Vec<String>>,

    #[serde(default, rename = "extension")]
    pub extensions: Vec<ExtensionSpec>,
}

/// The `[package]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackageSection {
    pub name: String,

    pub version: String,

    /// Importable packages shipped by this distribution
    #[serde(default)]
    pub packages: Vec<String>,

    /// Directory containing the top-level packages, relative to the manifest
    #[serde(default = "default_package_root")]
    pub package_root: PathBuf,

    #[serde(default)]
    pub install_requires: Vec<String>,

    #[serde(default)]
    pub namespace_packages: Vec<String>,

    /// Prefix for project-specific CMake variables (defaults to the
    /// uppercased distribution name)
    #[serde(default)]
    pub cmake_prefix: Option<String>,
}

fn default_package_root() -> PathBuf {
    PathBuf::from(".")
}

/// One `[[extension]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExtensionSpec {
    /// Dotted module path
    pub name: String,

    /// CMake project root, relative to the manifest
    #[serde(default = "default_package_root")]
    pub source_dir: PathBuf,
}

impl Manifest {
    /// Parse a manifest from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(contents)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Load and validate a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse manifest: {}", path.display()))
    }

    fn validate(&self) -> Result<()> {
        if self.package.name.trim().is_empty() {
            bail!("`package.name` must not be empty");
        }
        if self.package.version.trim().is_empty() {
            bail!("`package.version` must not be empty");
        }

        for ext in &self.extensions {
            if !is_dotted_identifier(&ext.name) {
                bail!(
                    "invalid extension name `{}`: expected a dotted module path",
                    ext.name
                );
            }
        }

        for pkg in self.package.namespace_packages.iter().chain(&self.package.packages) {
            if !is_dotted_identifier(pkg) {
                bail!("invalid package name `{}`", pkg);
            }
        }

        if let Some(ref prefix) = self.package.cmake_prefix {
            if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                bail!("invalid cmake-prefix `{}`", prefix);
            }
        }

        Ok(())
    }

    /// Prefix used for `<PREFIX>_ARTIFACT_NAME` and feature variables.
    pub fn cmake_prefix(&self) -> String {
        match self.package.cmake_prefix {
            Some(ref prefix) => prefix.clone(),
            None => self
                .package
                .name
                .chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() {
                        c.to_ascii_uppercase()
                    } else {
                        '_'
                    }
                })
                .collect(),
        }
    }

    /// Distribution name as used in metadata file names.
    pub fn filename_safe_name(&self) -> String {
        self.package
            .name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '_' })
            .collect()
    }
}

fn is_dotted_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
                && chars.all(|c| c.is_alphanumeric() || c == '_')
        })
}

/// A manifest together with the directory it was loaded from.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    manifest: Manifest,
}

impl Project {
    /// Load the project whose manifest is at `manifest_path`.
    pub fn load(manifest_path: &Path) -> Result<Self> {
        let manifest = Manifest::load(manifest_path)?;
        let root = match manifest_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let root = std::path::absolute(&root)
            .with_context(|| format!("failed to resolve project root: {}", root.display()))?;
        Ok(Project { root, manifest })
    }

    /// Create a project from an already parsed manifest.
    pub fn new(root: PathBuf, manifest: Manifest) -> Self {
        Project { root, manifest }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Absolute directory holding the top-level packages (the egg base).
    pub fn package_root(&self) -> PathBuf {
        let root = &self.manifest.package.package_root;
        if root == Path::new(".") {
            self.root.clone()
        } else {
            self.root.join(root)
        }
    }

    /// Directory of a dotted package within the source tree.
    pub fn package_dir(&self, package: &str) -> PathBuf {
        let mut dir = self.package_root();
        dir.extend(package.split('.'));
        dir
    }

    /// Extension targets with absolute source directories.
    pub fn targets(&self) -> Vec<BuildTarget> {
        self.manifest
            .extensions
            .iter()
            .map(|ext| {
                let source_dir = if ext.source_dir == Path::new(".") {
                    self.root.clone()
                } else {
                    self.root.join(&ext.source_dir)
                };
                BuildTarget::new(ext.name.clone(), source_dir)
            })
            .collect()
    }

    /// The `<name>.egg-info` metadata directory.
    pub fn egg_info_dir(&self) -> PathBuf {
        self.package_root()
            .join(format!("{}.egg-info", self.manifest.filename_safe_name()))
    }
}
