//! High-level operations.
//!
//! This module contains the implementation of extforge commands.

pub mod build_ext;
pub mod develop;
pub mod egg_info;

pub use build_ext::{build_ext, plan, BuildContext, BuildExtOptions, BuiltExtension};
pub use develop::{DevelopInstaller, DevelopOptions, DevelopState, EditableLink, Lifecycle};
pub use egg_info::EggLifecycle;
