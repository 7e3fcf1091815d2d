//! Configuration file support for extforge.
//!
//! extforge reads two configuration file locations:
//! - Global: `~/.extforge/config.toml` - User-wide defaults
//! - Project: `.extforge/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::mode::ModeFlags;

/// extforge configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build settings
    pub build: BuildConfig,

    /// Interpreter settings
    pub python: PythonConfig,

    /// Default feature toggles
    pub features: FeatureConfig,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildConfig {
    /// CMake executable (name on PATH or absolute path)
    pub cmake: Option<PathBuf>,

    /// CMake generator passed as `-G`
    pub generator: Option<String>,

    /// Parallel jobs for the build phase (None = let CMake decide)
    pub jobs: Option<usize>,

    /// Build directory, relative to the project root (default: `build`)
    pub build_dir: Option<PathBuf>,

    /// Explicit generator platform passed as `-A` where one is required
    pub architecture: Option<String>,
}

/// Interpreter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PythonConfig {
    /// Interpreter executable (default: `python3` on PATH)
    pub executable: Option<PathBuf>,

    /// Extension module suffix; skips probing the interpreter when set
    pub ext_suffix: Option<String>,

    /// Site-packages directory for editable installs
    pub install_dir: Option<PathBuf>,

    /// Interpreter pointer width in bits
    pub pointer_width: Option<u32>,
}

/// Feature toggles enabled by default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FeatureConfig {
    pub show_diagnostic_dialog: bool,
    pub start_capture_tool: bool,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        // Build settings
        if other.build.cmake.is_some() {
            self.build.cmake = other.build.cmake;
        }
        if other.build.generator.is_some() {
            self.build.generator = other.build.generator;
        }
        if other.build.jobs.is_some() {
            self.build.jobs = other.build.jobs;
        }
        if other.build.build_dir.is_some() {
            self.build.build_dir = other.build.build_dir;
        }
        if other.build.architecture.is_some() {
            self.build.architecture = other.build.architecture;
        }

        // Python settings
        if other.python.executable.is_some() {
            self.python.executable = other.python.executable;
        }
        if other.python.ext_suffix.is_some() {
            self.python.ext_suffix = other.python.ext_suffix;
        }
        if other.python.install_dir.is_some() {
            self.python.install_dir = other.python.install_dir;
        }
        if other.python.pointer_width.is_some() {
            self.python.pointer_width = other.python.pointer_width;
        }

        // Feature defaults only ever switch on
        if other.features.show_diagnostic_dialog {
            self.features.show_diagnostic_dialog = true;
        }
        if other.features.start_capture_tool {
            self.features.start_capture_tool = true;
        }
    }

    /// Feature defaults as mode flags.
    pub fn default_flags(&self) -> ModeFlags {
        ModeFlags {
            show_diagnostic_dialog: self.features.show_diagnostic_dialog,
            start_capture_tool: self.features.start_capture_tool,
            ..Default::default()
        }
    }

    /// Build directory for a project rooted at `root`.
    pub fn build_dir(&self, root: &Path) -> PathBuf {
        match self.build.build_dir {
            Some(ref dir) => root.join(dir),
            None => root.join("build"),
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.extforge/config.toml)
/// 2. Global config (~/.extforge/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        config.merge(Config::load_or_default(global_path));
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global extforge config directory (~/.extforge).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".extforge"))
}

/// Get the project config path (.extforge/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".extforge").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_config() {
        let config: Config = toml::from_str(
            r#"
[build]
cmake = "/opt/cmake/bin/cmake"
generator = "Ninja"
jobs = 8

[python]
ext-suffix = ".so"
install-dir = "/tmp/site"

[features]
show-diagnostic-dialog = true
"#,
        )
        .unwrap();

        assert_eq!(config.build.cmake, Some(PathBuf::from("/opt/cmake/bin/cmake")));
        assert_eq!(config.build.generator.as_deref(), Some("Ninja"));
        assert_eq!(config.build.jobs, Some(8));
        assert_eq!(config.python.ext_suffix.as_deref(), Some(".so"));
        assert!(config.features.show_diagnostic_dialog);
        assert!(!config.features.start_capture_tool);
    }

    #[test]
    fn test_project_overrides_global() {
        let tmp = TempDir::new().unwrap();
        let global = tmp.path().join("global.toml");
        let project = tmp.path().join("project.toml");

        std::fs::write(&global, "[build]\njobs = 2\ngenerator = \"Ninja\"\n").unwrap();
        std::fs::write(&project, "[build]\njobs = 16\n").unwrap();

        let config = load_config(&global, &project);
        assert_eq!(config.build.jobs, Some(16));
        assert_eq!(config.build.generator.as_deref(), Some("Ninja"));
    }

    #[test]
    fn test_invalid_config_falls_back() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[build\njobs = ").unwrap();

        let config = Config::load_or_default(&path);
        assert!(config.build.jobs.is_none());
    }

    #[test]
    fn test_default_flags() {
        let mut config = Config::default();
        config.features.start_capture_tool = true;

        let flags = config.default_flags();
        assert!(flags.start_capture_tool);
        assert!(!flags.debug);
    }

    #[test]
    fn test_build_dir() {
        let mut config = Config::default();
        assert_eq!(config.build_dir(Path::new("/p")), PathBuf::from("/p/build"));

        config.build.build_dir = Some(PathBuf::from("out"));
        assert_eq!(config.build_dir(Path::new("/p")), PathBuf::from("/p/out"));
    }
}
