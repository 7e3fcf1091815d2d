//! Error types for variant resolution, external builds and develop installs.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Error while resolving build parameters.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("malformed artifact path `{}`: file name has no `<name>.<suffix>` form", path.display())]
    MalformedArtifactPath { path: PathBuf },
}

/// Phase of the external build tool's two-phase protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Configure,
    Build,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Configure => write!(f, "configure"),
            Phase::Build => write!(f, "build"),
        }
    }
}

/// Error raised by the external build driver.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{phase} phase failed for `{target}` ({})", describe_exit(.exit_code))]
    BuildFailure {
        target: String,
        phase: Phase,
        exit_code: Option<i32>,
    },

    #[error("failed to launch {phase} phase for `{target}`")]
    Spawn {
        target: String,
        phase: Phase,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create build directory {}", dir.display())]
    WorkDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl BuildError {
    /// The phase that failed, if the failure came from a subprocess.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            BuildError::BuildFailure { phase, .. } | BuildError::Spawn { phase, .. } => {
                Some(*phase)
            }
            _ => None,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// Error raised by the development install adapter.
#[derive(Debug, Error)]
pub enum DevelopError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("failed to install bootstrap source `{source_spec}`")]
    BootstrapInstallFailure {
        source_spec: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to write editable link {}", path.display())]
    LinkWriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot link before the extensions are built (installer is {state})")]
    NotBuilt { state: String },

    #[error("install directory unknown; set `python.install-dir` in .extforge/config.toml")]
    InstallDirUnknown,

    #[error("{step} failed")]
    Lifecycle {
        step: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_failure_names_phase_and_code() {
        let err = BuildError::BuildFailure {
            target: "pkg.native".to_string(),
            phase: Phase::Configure,
            exit_code: Some(2),
        };
        assert_eq!(
            err.to_string(),
            "configure phase failed for `pkg.native` (exit code 2)"
        );
        assert_eq!(err.phase(), Some(Phase::Configure));
    }

    #[test]
    fn test_build_failure_without_code() {
        let err = BuildError::BuildFailure {
            target: "pkg.native".to_string(),
            phase: Phase::Build,
            exit_code: None,
        };
        assert!(err.to_string().contains("terminated by signal"));
    }
}
