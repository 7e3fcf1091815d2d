//! Native extension build system.
//!
//! Resolves build parameters and drives CMake's configure/build protocol.

pub mod cmake;
pub mod plan;
pub mod resolve;

pub use cmake::{CMakeDriver, CMakeSettings, Configured};
pub use plan::BuildPlan;
pub use resolve::{resolve, ResolvedBuild};
