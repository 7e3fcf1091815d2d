//! Test fixtures for creating sample extension projects.

use std::path::{Path, PathBuf};

use crate::core::manifest::{Manifest, Project, MANIFEST_NAME};
use crate::core::runtime::RuntimeInfo;

/// A sample project to be written to disk.
#[derive(Debug, Clone)]
pub struct ProjectFixture {
    /// Distribution name
    pub name: String,
    /// Manifest content
    pub manifest: String,
}

impl ProjectFixture {
    /// A single-extension project with package data and one requirement.
    pub fn extension(name: impl Into<String>) -> Self {
        let name = name.into();
        let manifest = manifests::extension(&name, &["numpy"]);
        ProjectFixture { name, manifest }
    }

    /// Replace the manifest content.
    pub fn with_manifest(mut self, manifest: impl Into<String>) -> Self {
        self.manifest = manifest.into();
        self
    }

    /// Write the project under `base_path`, returning its root.
    pub fn write_to(&self, base_path: &Path) -> std::io::Result<PathBuf> {
        let root = base_path.join(&self.name);
        let pkg = root.join(&self.name);
        std::fs::create_dir_all(pkg.join("shaders"))?;
        std::fs::write(root.join(MANIFEST_NAME), &self.manifest)?;
        std::fs::write(root.join("CMakeLists.txt"), sources::cmake_lists(&self.name))?;
        std::fs::write(pkg.join("__init__.py"), "")?;
        std::fs::write(pkg.join("shaders/draw.glsl"), "void main() {}\n")?;
        Ok(root)
    }

    /// Write the project and load it.
    pub fn load(&self, base_path: &Path) -> Project {
        let root = self.write_to(base_path).expect("failed to write fixture");
        let manifest = Manifest::parse(&self.manifest).expect("fixture manifest is valid");
        Project::new(root, manifest)
    }
}

/// Runtime facts for a 64-bit CPython 3.11 on Linux.
pub fn runtime(install_dir: Option<&Path>) -> RuntimeInfo {
    RuntimeInfo {
        executable: PathBuf::from("/usr/bin/python3"),
        ext_suffix: ".cpython-311-x86_64-linux-gnu.so".to_string(),
        purelib: install_dir.map(Path::to_path_buf),
        is_64bit: true,
    }
}

/// Sample manifest contents.
pub mod manifests {
    /// A manifest with one extension `<name>.native`.
    pub fn extension(name: &str, requires: &[&str]) -> String {
        let requires: Vec<String> = requires.iter().map(|r| format!("\"{}\"", r)).collect();
        format!(
            r#"[package]
name = "{name}"
version = "1.0"
packages = ["{name}", "{name}.shaders"]
install-requires = [{requires}]

[package-data]
{name} = ["shaders/*.glsl"]

[[extension]]
name = "{name}.native"
"#,
            name = name,
            requires = requires.join(", ")
        )
    }

    /// A manifest with two extensions and a namespace package.
    pub fn two_extensions(name: &str) -> String {
        format!(
            r#"[package]
name = "{name}"
version = "2.0"
packages = ["{name}"]
namespace-packages = ["{name}"]

[[extension]]
name = "{name}.first"

[[extension]]
name = "{name}.second"
"#,
            name = name
        )
    }
}

/// Sample source files.
pub mod sources {
    /// A CMakeLists.txt that names its module from the passed variables.
    pub fn cmake_lists(name: &str) -> String {
        format!(
            "cmake_minimum_required(VERSION 3.15)\n\
             project({name} CXX)\n\
             add_library(native MODULE interface.cpp)\n",
            name = name
        )
    }
}
