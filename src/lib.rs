//! extforge - builds CMake-based native Python extensions
//!
//! This crate provides the core library functionality for extforge:
//! build variant resolution, the CMake driver, and the editable
//! development install.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

/// Test utilities and mocks for extforge unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a recording fake for process execution and
/// sample project fixtures.
#[cfg(test)]
pub mod test_support;

pub use core::{BuildTarget, Manifest, ModeFlags, ModeOverrides, Project};
pub use util::context::GlobalContext;
