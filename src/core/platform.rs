//! Host platform description and platform-specific CMake arguments.

use std::fmt;

use serde::Serialize;

/// Operating system family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    Windows,
    Linux,
    MacOs,
    Other(String),
}

impl OsFamily {
    /// Map a `std::env::consts::OS` value to a family.
    pub fn from_os(os: &str) -> Self {
        match os {
            "windows" => OsFamily::Windows,
            "linux" => OsFamily::Linux,
            "macos" => OsFamily::MacOs,
            other => OsFamily::Other(other.to_string()),
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsFamily::Windows => write!(f, "windows"),
            OsFamily::Linux => write!(f, "linux"),
            OsFamily::MacOs => write!(f, "macos"),
            OsFamily::Other(os) => write!(f, "{}", os),
        }
    }
}

/// The platform an extension is built for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformInfo {
    /// OS family
    pub os: OsFamily,
    /// CPU architecture (x86_64, aarch64, x86, ...)
    pub arch: String,
    /// Pointer width of the target runtime, in bits
    pub pointer_width: u32,
    /// Explicit generator platform (`-A`) that replaces the resolved one
    pub arch_override: Option<String>,
}

impl PlatformInfo {
    /// Create a platform description.
    pub fn new(os: OsFamily, arch: &str, pointer_width: u32) -> Self {
        PlatformInfo {
            os,
            arch: arch.to_string(),
            pointer_width,
            arch_override: None,
        }
    }

    /// Detect the host platform.
    pub fn host() -> Self {
        let pointer_width = if cfg!(target_pointer_width = "64") { 64 } else { 32 };
        PlatformInfo::new(
            OsFamily::from_os(std::env::consts::OS),
            std::env::consts::ARCH,
            pointer_width,
        )
    }

    /// Use the given pointer width (the interpreter's, rather than ours).
    pub fn with_pointer_width(mut self, pointer_width: u32) -> Self {
        self.pointer_width = pointer_width;
        self
    }

    /// Force a specific generator platform token.
    pub fn with_arch_override(mut self, arch: Option<String>) -> Self {
        self.arch_override = arch;
        self
    }

    pub fn is_64bit(&self) -> bool {
        self.pointer_width == 64
    }

    /// Generator platform token for platforms whose generators need one.
    ///
    /// Only the Visual Studio generators on Windows take `-A`; everywhere
    /// else the toolchain already targets the host architecture.
    pub fn generator_platform(&self) -> Option<String> {
        if self.os != OsFamily::Windows {
            return None;
        }
        if let Some(ref arch) = self.arch_override {
            return Some(arch.clone());
        }
        match (self.arch.as_str(), self.is_64bit()) {
            ("aarch64", true) => Some("ARM64".to_string()),
            (_, true) => Some("x64".to_string()),
            _ => None,
        }
    }

    /// Extra configure arguments this platform requires.
    pub fn configure_args(&self) -> Vec<String> {
        match self.generator_platform() {
            Some(token) => vec!["-A".to_string(), token],
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_64bit_gets_x64() {
        let platform = PlatformInfo::new(OsFamily::Windows, "x86_64", 64);
        assert_eq!(platform.configure_args(), vec!["-A", "x64"]);
    }

    #[test]
    fn test_windows_arm64() {
        let platform = PlatformInfo::new(OsFamily::Windows, "aarch64", 64);
        assert_eq!(platform.configure_args(), vec!["-A", "ARM64"]);
    }

    #[test]
    fn test_windows_32bit_has_no_token() {
        let platform = PlatformInfo::new(OsFamily::Windows, "x86", 32);
        assert!(platform.configure_args().is_empty());
    }

    #[test]
    fn test_override_replaces_token() {
        let platform = PlatformInfo::new(OsFamily::Windows, "x86_64", 64)
            .with_arch_override(Some("Win32".to_string()));
        assert_eq!(platform.configure_args(), vec!["-A", "Win32"]);
    }

    #[test]
    fn test_non_windows_never_gets_token() {
        for os in [
            OsFamily::Linux,
            OsFamily::MacOs,
            OsFamily::Other("freebsd".to_string()),
        ] {
            for width in [32, 64] {
                let platform = PlatformInfo::new(os.clone(), "x86_64", width)
                    .with_arch_override(Some("x64".to_string()));
                assert!(platform.configure_args().is_empty(), "{} {}", os, width);
            }
        }
    }

    #[test]
    fn test_host_detection() {
        let host = PlatformInfo::host();
        assert!(host.pointer_width == 32 || host.pointer_width == 64);
        assert!(!host.arch.is_empty());
    }
}
