//! Shared types for pour.
//!
//! Everything here is plain data with validation at the edges: the platform
//! key a release variant is filed under, the package identity, and the
//! checksum newtype used for integrity verification.

pub mod hash;
pub mod platform;
pub mod types;

// Re-exports
pub use hash::*;
pub use platform::*;
pub use types::*;

/// Errors produced when parsing schema values from strings.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The operating system name is not one pour knows about.
    #[error("Unknown operating system: {0}")]
    UnknownOs(String),

    /// The CPU architecture name is not one pour knows about.
    #[error("Unknown architecture: {0}")]
    UnknownArch(String),

    /// A platform key was not of the form `<os>-<arch>`.
    #[error("Invalid platform key '{0}': expected <os>-<arch>, e.g. darwin-arm64")]
    InvalidPlatform(String),

    /// A checksum string was not 64 hex characters.
    #[error("Invalid SHA256 digest '{value}': {reason}")]
    InvalidDigest {
        /// The rejected input.
        value: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A version string was not a semantic version.
    #[error("Invalid version '{value}': {reason}")]
    InvalidVersion {
        /// The rejected input.
        value: String,
        /// The semver parser's complaint.
        reason: String,
    },
}
