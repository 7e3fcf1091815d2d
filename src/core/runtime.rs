//! Python interpreter discovery and probing.
//!
//! The extension suffix, the site-packages directory and the interpreter's
//! pointer width all come from the interpreter the extension is built for.
//! Values set in config override the probed ones.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::util::config::PythonConfig;
use crate::util::process::{find_executable, ProcessBuilder};

/// Script run by the interpreter to describe itself as JSON.
const PROBE_SCRIPT: &str = "\
import json, sys, sysconfig
print(json.dumps({
    'executable': sys.executable,
    'ext_suffix': sysconfig.get_config_var('EXT_SUFFIX') or sysconfig.get_config_var('SO'),
    'purelib': sysconfig.get_paths()['purelib'],
    'is_64bit': sys.maxsize > 2**32,
}))";

/// Facts about the target interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeInfo {
    /// Interpreter executable, passed to CMake so it finds matching headers
    pub executable: PathBuf,
    /// Extension module suffix (`.cpython-311-x86_64-linux-gnu.so`)
    pub ext_suffix: String,
    /// Site-packages directory editable links are written to
    pub purelib: Option<PathBuf>,
    pub is_64bit: bool,
}

impl RuntimeInfo {
    /// Parse the probe script's output.
    pub fn from_json(json: &str) -> Result<Self> {
        let info: RuntimeInfo =
            serde_json::from_str(json.trim()).context("invalid interpreter probe output")?;
        if info.ext_suffix.is_empty() {
            bail!("interpreter reported an empty extension suffix");
        }
        Ok(info)
    }

    /// Run the probe script with the given interpreter.
    pub fn probe(python: &Path) -> Result<Self> {
        tracing::debug!("probing interpreter {}", python.display());
        let output = ProcessBuilder::new(python)
            .args(["-c", PROBE_SCRIPT])
            .exec_and_check()
            .with_context(|| format!("failed to query interpreter `{}`", python.display()))?;
        Self::from_json(&String::from_utf8_lossy(&output.stdout))
    }

    /// Resolve runtime facts from config, probing only what config leaves out.
    pub fn resolve(config: &PythonConfig) -> Result<Self> {
        let executable = match config.executable {
            Some(ref exe) => exe.clone(),
            None => find_python().ok_or_else(|| {
                anyhow::anyhow!(
                    "Python interpreter not found\n\
                     \n\
                     Set `python.executable` in .extforge/config.toml or put `python3` on PATH."
                )
            })?,
        };

        let mut info = match config.ext_suffix {
            Some(ref suffix) => RuntimeInfo {
                executable,
                ext_suffix: suffix.clone(),
                purelib: None,
                is_64bit: cfg!(target_pointer_width = "64"),
            },
            None => Self::probe(&executable)?,
        };

        if config.install_dir.is_some() {
            info.purelib = config.install_dir.clone();
        }
        if let Some(width) = config.pointer_width {
            info.is_64bit = width == 64;
        }

        Ok(info)
    }

    pub fn pointer_width(&self) -> u32 {
        if self.is_64bit {
            64
        } else {
            32
        }
    }

    /// Site-packages directory, or an error if it could not be determined.
    pub fn install_dir(&self) -> Result<&Path> {
        self.purelib.as_deref().ok_or_else(|| {
            anyhow::anyhow!("install directory unknown; set `python.install-dir` in config")
        })
    }
}

/// Find a Python 3 interpreter on PATH.
pub fn find_python() -> Option<PathBuf> {
    ["python3", "python"]
        .iter()
        .find_map(|name| find_executable(name))
}
