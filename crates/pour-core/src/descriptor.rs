//! Release descriptor parsing
//!
//! A descriptor is the human-written TOML that says where each platform's
//! archive lives, what it must hash to, which binary to take out of it and
//! how to check that the result runs. It is loaded once, validated, and
//! never mutated: a new release replaces it wholesale via
//! [`Descriptor::supersede`].

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pour_schema::{PackageName, Platform, Sha256Digest, Version};

use crate::paths::Prefix;
use crate::resolver::{self, ResolveError, Variant};

/// The single substitution point for the release version in URL templates.
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// Errors that can occur when loading, validating or writing a descriptor.
#[derive(Error, Debug)]
pub enum DescriptorError {
    /// An I/O error occurred while reading or writing a descriptor file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML content could not be deserialized into a descriptor.
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The descriptor could not be rendered back to TOML.
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// `package.name` is empty.
    #[error("package.name must not be empty")]
    EmptyName,

    /// No `[variants.*]` tables were declared.
    #[error("descriptor declares no variants")]
    NoVariants,

    /// A URL template does not reference the release version.
    #[error("variants.{platform}.url must contain {{version}}: {url}")]
    MissingPlaceholder {
        /// Offending variant.
        platform: Platform,
        /// The template as written.
        url: String,
    },

    /// A URL template spells out the version instead of using the placeholder.
    #[error("variants.{platform}.url hard-codes version {version}; use {{version}}: {url}")]
    HardcodedVersion {
        /// Offending variant.
        platform: Platform,
        /// The literal version found in the template.
        version: Version,
        /// The template as written.
        url: String,
    },

    /// A URL template is not http(s).
    #[error("variants.{platform}.url must be http(s): {url}")]
    InvalidUrl {
        /// Offending variant.
        platform: Platform,
        /// The template as written.
        url: String,
    },

    /// `install.bin` is not a bare file name.
    #[error("install.bin must be a plain file name, got '{0}'")]
    InvalidBin(String),

    /// A superseding release did not supply a checksum for a declared variant.
    #[error("no checksum supplied for {0}")]
    MissingChecksum(Platform),

    /// A checksum was supplied for a platform the descriptor does not declare.
    #[error("checksum supplied for undeclared platform {0}")]
    UndeclaredPlatform(Platform),
}

/// Identity and provenance of the distributed tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageInfo {
    /// Tool name; also the default binary name and smoke-test expectation.
    pub name: PackageName,
    /// Release version substituted into every variant URL.
    pub version: Version,
    /// Short human-readable summary.
    #[serde(default)]
    pub description: String,
    /// Project homepage.
    #[serde(default)]
    pub homepage: String,
    /// SPDX license identifier (informational).
    #[serde(default)]
    pub license: String,
}

/// One platform's download, as written in the descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSpec {
    /// URL template containing [`VERSION_PLACEHOLDER`].
    pub url: String,
    /// Expected SHA-256 of the bytes at the rendered URL.
    pub sha256: Sha256Digest,
}

/// Where the extracted binary goes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstallSpec {
    /// File name inside the archive, installed as `<prefix>/bin/<bin>`.
    /// Defaults to the package name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin: Option<String>,
}

/// Post-install smoke test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSpec {
    /// Arguments passed to the installed binary.
    #[serde(default = "default_test_args")]
    pub args: Vec<String>,
    /// Substring the combined stdout/stderr must contain. Defaults to the
    /// package name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect: Option<String>,
    /// Required exit code.
    #[serde(default)]
    pub exit_code: i32,
    /// Upper bound on the test's run time.
    #[serde(default = "default_test_timeout")]
    pub timeout_secs: u64,
}

fn default_test_args() -> Vec<String> {
    vec!["--version".to_string()]
}

fn default_test_timeout() -> u64 {
    30
}

impl Default for TestSpec {
    fn default() -> Self {
        Self {
            args: default_test_args(),
            expect: None,
            exit_code: 0,
            timeout_secs: default_test_timeout(),
        }
    }
}

/// Post-install hints (printed, never executed)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hints {
    /// Message template shown after installation. Supports `{name}`,
    /// `{version}`, `{bin}` and `{prefix}`.
    #[serde(default)]
    pub post_install: String,
}

/// A complete release descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    /// Name, version and metadata.
    pub package: PackageInfo,
    /// Platform key to download spec.
    pub variants: BTreeMap<Platform, VariantSpec>,
    /// Install target.
    #[serde(default)]
    pub install: InstallSpec,
    /// Smoke test.
    #[serde(default)]
    pub test: TestSpec,
    /// Caveats shown to the user.
    #[serde(default)]
    pub hints: Hints,
}

impl Descriptor {
    /// Parse and validate a descriptor file on disk.
    ///
    /// # Errors
    ///
    /// Returns `DescriptorError::Io` if the file cannot be read, `Parse` if
    /// the TOML is invalid, or a validation error.
    pub fn from_file(path: &Path) -> Result<Self, DescriptorError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate a descriptor from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `DescriptorError::Parse` for malformed TOML or schema values
    /// and a validation error for semantically invalid descriptors.
    pub fn parse(content: &str) -> Result<Self, DescriptorError> {
        let descriptor: Self = toml::from_str(content)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Check the invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.package.name.is_empty() {
            return Err(DescriptorError::EmptyName);
        }
        if self.variants.is_empty() {
            return Err(DescriptorError::NoVariants);
        }

        let bin = self.bin();
        if bin.is_empty() || bin == "." || bin == ".." || bin.contains(['/', '\\']) {
            return Err(DescriptorError::InvalidBin(bin.to_string()));
        }

        for (platform, spec) in &self.variants {
            let url = &spec.url;
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(DescriptorError::InvalidUrl {
                    platform: *platform,
                    url: url.clone(),
                });
            }
            if !url.contains(VERSION_PLACEHOLDER) {
                return Err(DescriptorError::MissingPlaceholder {
                    platform: *platform,
                    url: url.clone(),
                });
            }
            if spells_out_version(url, self.package.version.as_str()) {
                return Err(DescriptorError::HardcodedVersion {
                    platform: *platform,
                    version: self.package.version.clone(),
                    url: url.clone(),
                });
            }
        }

        Ok(())
    }

    /// Select the variant for `platform`. Pure lookup, no I/O.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::UnsupportedPlatform`] when no variant is
    /// declared for `platform`.
    pub fn resolve(&self, platform: Platform) -> Result<Variant, ResolveError> {
        resolver::resolve(self, platform)
    }

    /// Every declared variant with its URL rendered for this version.
    pub fn resolved_variants(&self) -> impl Iterator<Item = Variant> + '_ {
        self.variants
            .keys()
            .filter_map(|platform| resolver::resolve(self, *platform).ok())
    }

    /// Declared platforms, in key order.
    pub fn platforms(&self) -> Vec<Platform> {
        self.variants.keys().copied().collect()
    }

    /// Substitute this release's version into a URL template.
    pub fn render_url(&self, template: &str) -> String {
        template.replace(VERSION_PLACEHOLDER, self.package.version.as_str())
    }

    /// Concrete URLs a release at `version` would fetch, per platform.
    pub fn urls_for(&self, version: &Version) -> BTreeMap<Platform, String> {
        self.variants
            .iter()
            .map(|(platform, spec)| {
                (
                    *platform,
                    spec.url.replace(VERSION_PLACEHOLDER, version.as_str()),
                )
            })
            .collect()
    }

    /// Binary file name (defaults to the package name).
    pub fn bin(&self) -> &str {
        self.install
            .bin
            .as_deref()
            .unwrap_or_else(|| self.package.name.as_str())
    }

    /// Substring the smoke test output must contain.
    pub fn expected_output(&self) -> &str {
        self.test
            .expect
            .as_deref()
            .unwrap_or_else(|| self.package.name.as_str())
    }

    /// Rendered caveats for an install into `prefix`, or `None` if the
    /// descriptor has none.
    pub fn caveats(&self, prefix: &Prefix) -> Option<String> {
        let template = self.hints.post_install.trim_end();
        if template.trim().is_empty() {
            return None;
        }

        let bin_path = prefix.bin_path(self.bin());
        Some(
            template
                .replace("{name}", self.package.name.as_str())
                .replace(VERSION_PLACEHOLDER, self.package.version.as_str())
                .replace("{bin}", &bin_path.to_string_lossy())
                .replace("{prefix}", &prefix.root().to_string_lossy()),
        )
    }

    /// Produce the descriptor for a new release.
    ///
    /// Everything but the version and checksums carries over; a checksum
    /// must be supplied for every declared variant so no stale digest can
    /// survive a version change.
    ///
    /// # Errors
    ///
    /// Returns `MissingChecksum` / `UndeclaredPlatform` when `checksums` does
    /// not cover exactly the declared platforms.
    pub fn supersede(
        &self,
        version: Version,
        checksums: &BTreeMap<Platform, Sha256Digest>,
    ) -> Result<Self, DescriptorError> {
        if let Some(extra) = checksums.keys().find(|p| !self.variants.contains_key(p)) {
            return Err(DescriptorError::UndeclaredPlatform(*extra));
        }

        let mut variants = BTreeMap::new();
        for (platform, spec) in &self.variants {
            let sha256 = checksums
                .get(platform)
                .ok_or(DescriptorError::MissingChecksum(*platform))?;
            variants.insert(
                *platform,
                VariantSpec {
                    url: spec.url.clone(),
                    sha256: sha256.clone(),
                },
            );
        }

        let next = Self {
            package: PackageInfo {
                version,
                ..self.package.clone()
            },
            variants,
            install: self.install.clone(),
            test: self.test.clone(),
            hints: self.hints.clone(),
        };
        next.validate()?;
        Ok(next)
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Returns `DescriptorError::Serialize` if rendering fails.
    pub fn to_toml(&self) -> Result<String, DescriptorError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Atomically persist this descriptor to `path`.
    ///
    /// The file is first written to a temp file next to the target, synced,
    /// and then renamed so that readers never observe a partially written
    /// descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization, writing or the rename fails.
    pub fn save(&self, path: &Path) -> Result<(), DescriptorError> {
        let content = self.to_toml()?;
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut temp = tempfile::Builder::new()
            .prefix(".pour-")
            .suffix(".toml")
            .tempfile_in(parent)?;
        temp.write_all(content.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Whether `template` writes the release version out literally in its path
/// instead of using [`VERSION_PLACEHOLDER`].
///
/// Only whole path tokens count (`/v1.0.0/`, `td_1.0.0_`, `-1.0.0.tar.gz`),
/// so digits that merely happen to match in a host, port or unrelated
/// segment are not flagged.
fn spells_out_version(template: &str, version: &str) -> bool {
    let rest = template.split_once("://").map_or(template, |(_, rest)| rest);
    let Some(path) = rest.find('/').map(|i| &rest[i..]) else {
        return false;
    };

    path.match_indices(version).any(|(start, _)| {
        let before = path[..start].chars().next_back();
        let after = path[start + version.len()..].chars().next();
        matches!(before, Some('/' | '_' | '-' | 'v'))
            && matches!(after, None | Some('/' | '_' | '-' | '.' | '?' | '#'))
    })
}
