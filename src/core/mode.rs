//! Build variants, feature toggles and the mode flags that select them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A named CMake build configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BuildVariant {
    #[default]
    Release,
    Debug,
    RelWithDebInfo,
}

impl BuildVariant {
    /// Select a variant from the requested flags.
    ///
    /// `debug` wins over `release_with_debug_info`; with neither set the
    /// variant is `Release`.
    pub fn select(debug: bool, release_with_debug_info: bool) -> Self {
        if debug {
            BuildVariant::Debug
        } else if release_with_debug_info {
            BuildVariant::RelWithDebInfo
        } else {
            BuildVariant::Release
        }
    }

    /// The CMake configuration name (`CMAKE_BUILD_TYPE`, `--config`).
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildVariant::Release => "Release",
            BuildVariant::Debug => "Debug",
            BuildVariant::RelWithDebInfo => "RelWithDebInfo",
        }
    }

    /// Suffix CMake uses for per-configuration variables (`<CONFIG>` uppercased).
    pub fn config_suffix(&self) -> String {
        self.as_str().to_uppercase()
    }
}

impl fmt::Display for BuildVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An optional diagnostic feature compiled into the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    /// Pop up a native dialog when the extension hits an internal error.
    ShowDiagnosticDialog,
    /// Launch the frame capture tool when the extension starts.
    StartCaptureTool,
}

impl Feature {
    /// Every recognized feature.
    pub const ALL: [Feature; 2] = [Feature::ShowDiagnosticDialog, Feature::StartCaptureTool];

    /// Flag name as it appears on the command line and in config files.
    pub fn name(&self) -> &'static str {
        match self {
            Feature::ShowDiagnosticDialog => "show-diagnostic-dialog",
            Feature::StartCaptureTool => "start-capture-tool",
        }
    }

    /// CMake cache variable name, without the project prefix.
    pub fn cmake_name(&self) -> &'static str {
        match self {
            Feature::ShowDiagnosticDialog => "SHOW_DIAGNOSTIC_DIALOG",
            Feature::StartCaptureTool => "START_CAPTURE_TOOL",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Every flag a lifecycle command accepts for selecting a build.
///
/// The set is closed: there is one field per recognized flag and each one
/// defaults to off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ModeFlags {
    pub debug: bool,
    pub release_with_debug_info: bool,
    pub show_diagnostic_dialog: bool,
    pub start_capture_tool: bool,
}

impl ModeFlags {
    /// Whether a given feature was requested.
    pub fn feature(&self, feature: Feature) -> bool {
        match feature {
            Feature::ShowDiagnosticDialog => self.show_diagnostic_dialog,
            Feature::StartCaptureTool => self.start_capture_tool,
        }
    }

    /// Apply explicit overrides on top of these flags.
    pub fn with_overrides(self, overrides: ModeOverrides) -> ModeFlags {
        ModeFlags {
            debug: overrides.debug.unwrap_or(self.debug),
            release_with_debug_info: overrides
                .release_with_debug_info
                .unwrap_or(self.release_with_debug_info),
            show_diagnostic_dialog: overrides
                .show_diagnostic_dialog
                .unwrap_or(self.show_diagnostic_dialog),
            start_capture_tool: overrides
                .start_capture_tool
                .unwrap_or(self.start_capture_tool),
        }
    }
}

/// Flags given explicitly on the command line.
///
/// `None` keeps the configured default; `Some(false)` turns a configured
/// feature back off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeOverrides {
    pub debug: Option<bool>,
    pub release_with_debug_info: Option<bool>,
    pub show_diagnostic_dialog: Option<bool>,
    pub start_capture_tool: Option<bool>,
}

/// Resolved options governing one build invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildMode {
    pub variant: BuildVariant,
    pub features: BTreeMap<Feature, bool>,
}

impl BuildMode {
    /// Resolve the variant and every feature toggle from the flags.
    pub fn from_flags(flags: &ModeFlags) -> Self {
        let features = Feature::ALL
            .iter()
            .map(|&feature| (feature, flags.feature(feature)))
            .collect();

        BuildMode {
            variant: BuildVariant::select(flags.debug, flags.release_with_debug_info),
            features,
        }
    }

    /// Render the feature toggles as `-D<PREFIX>_<NAME>=ON|OFF` arguments.
    pub fn feature_args(&self, prefix: &str) -> Vec<String> {
        self.features
            .iter()
            .map(|(feature, enabled)| {
                format!(
                    "-D{}_{}={}",
                    prefix,
                    feature.cmake_name(),
                    if *enabled { "ON" } else { "OFF" }
                )
            })
            .collect()
    }
}
