//! Core data structures for extforge.
//!
//! This module contains the foundational types used throughout extforge:
//! - Extension targets and the project manifest
//! - Build variants, feature toggles and mode flags
//! - Artifact locations and platform description
//! - Interpreter facts and error types

pub mod artifact;
pub mod errors;
pub mod manifest;
pub mod mode;
pub mod platform;
pub mod runtime;
pub mod target;

pub use artifact::ArtifactLocation;
pub use errors::{BuildError, DevelopError, Phase, ResolveError};
pub use manifest::{Manifest, Project, MANIFEST_NAME};
pub use mode::{BuildMode, BuildVariant, Feature, ModeFlags, ModeOverrides};
pub use platform::{OsFamily, PlatformInfo};
pub use runtime::RuntimeInfo;
pub use target::BuildTarget;
