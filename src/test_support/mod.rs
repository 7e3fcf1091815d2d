//! Test utilities and mocks for extforge unit tests.
//!
//! Provides a recording fake for subprocess execution, so the CMake driver
//! and lifecycle steps can be tested without CMake, pip or an interpreter.
//!
//! # Example
//!
//! ```rust,ignore
//! use crate::test_support::MockRunner;
//!
//! #[test]
//! fn test_example() {
//!     let mut runner = MockRunner::new();
//!     runner.fail_when("--build", 2);
//!
//!     // Drive a build through `&mut runner`, then inspect `runner.calls()`.
//! }
//! ```

pub mod fixtures;

use std::io;

pub use fixtures::*;

use crate::util::process::{CommandRunner, ProcessBuilder, ProcessStatus};

/// Exit code returned for commands containing a substring.
#[derive(Debug, Clone)]
pub struct CommandExpectation {
    /// Substring to look for in the displayed command line.
    pub contains: String,
    /// Exit code to return when matched.
    pub exit_code: i32,
}

/// Recording command runner.
///
/// Every command is recorded in call order. Commands matching no
/// expectation succeed.
#[derive(Debug, Default)]
pub struct MockRunner {
    expectations: Vec<CommandExpectation>,
    calls: Vec<String>,
    cwds: Vec<Option<std::path::PathBuf>>,
}

impl MockRunner {
    /// Create a runner where every command succeeds.
    pub fn new() -> Self {
        MockRunner::default()
    }

    /// Make commands containing `substring` exit with `code`.
    ///
    /// The first matching expectation wins.
    pub fn fail_when(&mut self, substring: &str, code: i32) -> &mut Self {
        self.expectations.push(CommandExpectation {
            contains: substring.to_string(),
            exit_code: code,
        });
        self
    }

    /// Get all commands that were called.
    pub fn calls(&self) -> &[String] {
        &self.calls
    }

    /// Working directories of each call, in order.
    pub fn cwds(&self) -> &[Option<std::path::PathBuf>] {
        &self.cwds
    }

    /// Number of recorded calls containing `substring`.
    pub fn count_containing(&self, substring: &str) -> usize {
        self.calls.iter().filter(|c| c.contains(substring)).count()
    }
}

impl CommandRunner for MockRunner {
    fn run(&mut self, cmd: &ProcessBuilder) -> io::Result<ProcessStatus> {
        let full_cmd = cmd.display_command();
        self.calls.push(full_cmd.clone());
        self.cwds.push(cmd.get_cwd().map(|p| p.to_path_buf()));

        let code = self
            .expectations
            .iter()
            .find(|exp| full_cmd.contains(&exp.contains))
            .map_or(0, |exp| exp.exit_code);

        Ok(ProcessStatus::new(Some(code)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_runner_records_calls() {
        let mut runner = MockRunner::new();
        runner.fail_when("--build", 2);

        let ok = runner
            .run(&ProcessBuilder::new("cmake").arg("/src").cwd("/tmp/w"))
            .unwrap();
        let failed = runner
            .run(&ProcessBuilder::new("cmake").args(["--build", "."]))
            .unwrap();

        assert!(ok.success());
        assert_eq!(failed.code(), Some(2));
        assert_eq!(runner.calls(), &["cmake /src", "cmake --build ."]);
        assert_eq!(runner.cwds()[0].as_deref(), Some(std::path::Path::new("/tmp/w")));
        assert_eq!(runner.count_containing("cmake"), 2);
    }
}
