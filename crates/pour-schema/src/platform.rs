//! Operating system and CPU architecture.
//!
//! A release ships one archive per [`Platform`]. The names used here are the
//! ones that appear in release asset file names (`darwin`, `linux`, `arm64`,
//! `amd64`), not Rust's target names.
//!
//! # Example
//!
//! ```
//! use pour_schema::{Arch, Os, Platform};
//!
//! let p: Platform = "darwin-arm64".parse().unwrap();
//! assert_eq!(p, Platform::new(Os::Darwin, Arch::Arm64));
//! assert_eq!(p.to_string(), "darwin-arm64");
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ParseError;

/// Operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Os {
    /// macOS
    Darwin,
    /// Linux
    Linux,
    /// Windows
    Windows,
}

impl Os {
    /// Detect the host operating system.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnknownOs`] on a host family pour has no name for.
    pub fn current() -> Result<Self, ParseError> {
        std::env::consts::OS.parse()
    }

    /// Asset-name form (`darwin`, `linux`, `windows`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Darwin => "darwin",
            Self::Linux => "linux",
            Self::Windows => "windows",
        }
    }
}

impl std::fmt::Display for Os {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Os {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "darwin" | "macos" | "osx" => Ok(Self::Darwin),
            "linux" => Ok(Self::Linux),
            "windows" => Ok(Self::Windows),
            _ => Err(ParseError::UnknownOs(s.to_string())),
        }
    }
}

/// CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Arch {
    /// 64-bit ARM (Apple Silicon, Graviton, Raspberry Pi 4+)
    Arm64,
    /// `x86_64`
    Amd64,
}

impl Arch {
    /// Detect the host architecture.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnknownArch`] on anything other than arm64/amd64.
    pub fn current() -> Result<Self, ParseError> {
        std::env::consts::ARCH.parse()
    }

    /// Asset-name form (`arm64`, `amd64`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Arm64 => "arm64",
            Self::Amd64 => "amd64",
        }
    }

    /// Rust-convention architecture name (`aarch64` / `x86_64`).
    ///
    /// Matches `std::env::consts::ARCH`.
    pub fn rust_name(&self) -> &'static str {
        match self {
            Self::Arm64 => "aarch64",
            Self::Amd64 => "x86_64",
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Arch {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "arm64" | "aarch64" => Ok(Self::Arm64),
            "amd64" | "x86_64" | "x64" => Ok(Self::Amd64),
            _ => Err(ParseError::UnknownArch(s.to_string())),
        }
    }
}

/// The `(os, arch)` pair a release variant is keyed by.
///
/// Serialized as the string `"<os>-<arch>"` so it can be used as a TOML
/// table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Platform {
    /// Operating system family.
    pub os: Os,
    /// CPU architecture.
    pub arch: Arch,
}

impl Platform {
    /// Build a platform key.
    pub const fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Detect the host platform.
    ///
    /// # Errors
    ///
    /// Fails when either the OS or the architecture is unknown.
    pub fn current() -> Result<Self, ParseError> {
        Ok(Self::new(Os::current()?, Arch::current()?))
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

impl std::str::FromStr for Platform {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Split on the last separator so "x86_64" survives as an arch alias.
        let (os, arch) = s
            .rsplit_once(['-', '/'])
            .ok_or_else(|| ParseError::InvalidPlatform(s.to_string()))?;
        Ok(Self::new(os.parse()?, arch.parse()?))
    }
}

impl Serialize for Platform {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Platform {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_asset_and_rust_names() {
        assert_eq!(
            "darwin-arm64".parse::<Platform>(),
            Ok(Platform::new(Os::Darwin, Arch::Arm64))
        );
        assert_eq!(
            "macos-aarch64".parse::<Platform>(),
            Ok(Platform::new(Os::Darwin, Arch::Arm64))
        );
        assert_eq!(
            "linux-x86_64".parse::<Platform>(),
            Ok(Platform::new(Os::Linux, Arch::Amd64))
        );
        assert_eq!(
            "Linux/AMD64".parse::<Platform>(),
            Ok(Platform::new(Os::Linux, Arch::Amd64))
        );
    }

    #[test]
    fn rejects_unknown_parts() {
        assert_eq!(
            "plan9-arm64".parse::<Platform>(),
            Err(ParseError::UnknownOs("plan9".to_string()))
        );
        assert_eq!(
            "linux-riscv64".parse::<Platform>(),
            Err(ParseError::UnknownArch("riscv64".to_string()))
        );
        assert!(matches!(
            "linux".parse::<Platform>(),
            Err(ParseError::InvalidPlatform(_))
        ));
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for os in [Os::Darwin, Os::Linux, Os::Windows] {
            for arch in [Arch::Arm64, Arch::Amd64] {
                let p = Platform::new(os, arch);
                assert_eq!(p.to_string().parse::<Platform>(), Ok(p));
            }
        }
    }

    #[test]
    fn current_matches_std_consts() {
        if let Ok(p) = Platform::current() {
            assert_eq!(p.arch.rust_name(), std::env::consts::ARCH);
        }
    }

    #[test]
    fn serializes_as_table_key() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(Platform::new(Os::Linux, Arch::Arm64), 1);
        let text = toml::to_string(&map).unwrap();
        assert_eq!(text.trim(), "linux-arm64 = 1");

        let back: std::collections::BTreeMap<Platform, i32> = toml::from_str(&text).unwrap();
        assert_eq!(back, map);
    }
}
