//! Package identity and artifact format types.

use serde::{Deserialize, Deserializer, Serialize};

use crate::ParseError;

/// A package name, kept exactly as written.
///
/// The name doubles as the default binary name and the default smoke-test
/// expectation, so its case is significant.
///
/// # Example
///
/// ```
/// use pour_schema::PackageName;
///
/// let name = PackageName::new("MyTool");
/// assert_eq!(name.as_str(), "MyTool");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct PackageName(String);

impl PackageName {
    /// Create a new package name.
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    /// Get the package name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PackageName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PackageName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for PackageName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A semantic version string (`1.0.0`, `2.1.0-rc.1`).
///
/// The original text is kept verbatim because it is substituted into
/// download URLs; it is only validated, never re-rendered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    /// Parse and validate a version.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidVersion`] unless `s` is valid semver.
    /// A leading `v` is rejected: URL templates add it themselves.
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        semver::Version::parse(s).map_err(|e| ParseError::InvalidVersion {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(s.to_string()))
    }

    /// Get the version as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The parsed semver value, for ordering.
    pub fn semver(&self) -> semver::Version {
        // Validated on construction.
        semver::Version::parse(&self.0).unwrap_or_else(|_| semver::Version::new(0, 0, 0))
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

impl std::str::FromStr for Version {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Archive or binary format of a downloadable artifact.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    /// Gzip-compressed tar archive (`.tar.gz` / `.tgz`).
    #[serde(rename = "tar.gz")]
    TarGz,
    /// Uncompressed tar archive (`.tar`).
    Tar,
    /// Zip archive (`.zip`).
    Zip,
    /// Standalone executable with no archive wrapper.
    Binary,
}

impl ArtifactFormat {
    /// Infer the format from a URL or file name.
    pub fn detect(name: &str) -> Self {
        let lower = name.to_lowercase();
        // Ignore any query string on download URLs.
        let lower = lower.split(['?', '#']).next().unwrap_or_default();

        if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Self::TarGz
        } else if lower.ends_with(".tar") {
            Self::Tar
        } else if lower.ends_with(".zip") {
            Self::Zip
        } else {
            Self::Binary
        }
    }
}

impl std::fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::TarGz => "tar.gz",
            Self::Tar => "tar",
            Self::Zip => "zip",
            Self::Binary => "binary",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_requires_semver() {
        assert_eq!(Version::parse("1.0.0").unwrap().as_str(), "1.0.0");
        assert!(Version::parse("2.1.0-rc.1").is_ok());
        assert!(Version::parse("v1.0.0").is_err());
        assert!(Version::parse("1.0").is_err());
        assert!(Version::parse("").is_err());
    }

    #[test]
    fn version_orders_by_semver() {
        let a = Version::parse("1.9.0").unwrap();
        let b = Version::parse("1.10.0").unwrap();
        assert!(a.semver() < b.semver());
    }

    #[test]
    fn package_name_keeps_case_on_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            name: PackageName,
        }
        let w: Wrapper = toml::from_str("name = \"MyTool\"").unwrap();
        assert_eq!(w.name.as_str(), "MyTool");
        assert_ne!(PackageName::new("TD"), PackageName::new("td"));
    }

    #[test]
    fn detects_formats() {
        assert_eq!(
            ArtifactFormat::detect("https://x/td_1.0.0_linux_amd64.tar.gz"),
            ArtifactFormat::TarGz
        );
        assert_eq!(ArtifactFormat::detect("td.TGZ"), ArtifactFormat::TarGz);
        assert_eq!(ArtifactFormat::detect("td.tar"), ArtifactFormat::Tar);
        assert_eq!(
            ArtifactFormat::detect("https://x/td.zip?raw=1"),
            ArtifactFormat::Zip
        );
        assert_eq!(ArtifactFormat::detect("https://x/td"), ArtifactFormat::Binary);
    }
}
