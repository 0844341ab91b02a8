//! Install failure taxonomy
//!
//! Each failed attempt maps to exactly one [`ErrorKind`], and each kind has a
//! stable process exit code so scripts can tell a checksum mismatch from a
//! flaky network.

use thiserror::Error;

use pour_schema::Sha256Digest;

use crate::descriptor::DescriptorError;
use crate::io::download::DownloadError;
use crate::io::extract::ExtractError;
use crate::resolver::ResolveError;
use crate::verify::VerifyError;

/// Coarse classification of an [`InstallError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No variant for the requested platform.
    UnsupportedPlatform,
    /// The artifact could not be fetched.
    Network,
    /// The artifact's digest did not match.
    Integrity,
    /// The verified artifact could not be unpacked, or lacked the binary.
    Extract,
    /// The installed binary failed its smoke test.
    Verification,
    /// Local filesystem failure while staging or placing.
    Io,
    /// The descriptor itself is unusable.
    Descriptor,
}

impl ErrorKind {
    /// Process exit code for this kind.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Io | Self::Descriptor => 1,
            Self::UnsupportedPlatform => 2,
            Self::Network => 3,
            Self::Integrity => 4,
            Self::Extract => 5,
            Self::Verification => 6,
        }
    }

    /// Short lowercase label, used in logs and `--json` output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnsupportedPlatform => "unsupported-platform",
            Self::Network => "network",
            Self::Integrity => "integrity",
            Self::Extract => "extract",
            Self::Verification => "verification",
            Self::Io => "io",
            Self::Descriptor => "descriptor",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum InstallError {
    #[error(transparent)]
    UnsupportedPlatform(#[from] ResolveError),

    #[error("Download of {url} failed: {detail}")]
    Network { url: String, detail: String },

    #[error("Checksum mismatch for {url}\n  expected: {expected}\n  actual:   {actual}")]
    Integrity {
        url: String,
        expected: Sha256Digest,
        actual: Sha256Digest,
    },

    #[error("Extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("Smoke test failed: {0}")]
    Verification(#[from] VerifyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid descriptor: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error("{context}: {message}")]
    Context {
        context: &'static str,
        message: String,
    },
}

impl InstallError {
    /// Create an error with context for better debugging.
    pub fn context(ctx: &'static str, msg: impl std::fmt::Display) -> Self {
        Self::Context {
            context: ctx,
            message: msg.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedPlatform(_) => ErrorKind::UnsupportedPlatform,
            Self::Network { .. } => ErrorKind::Network,
            Self::Integrity { .. } => ErrorKind::Integrity,
            Self::Extract(_) => ErrorKind::Extract,
            Self::Verification(_) => ErrorKind::Verification,
            Self::Io(_) | Self::Context { .. } => ErrorKind::Io,
            Self::Descriptor(_) => ErrorKind::Descriptor,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }
}

impl From<DownloadError> for InstallError {
    fn from(err: DownloadError) -> Self {
        match err {
            DownloadError::Http { url, source } => Self::Network {
                url,
                detail: source.to_string(),
            },
            DownloadError::Status { url, status } => Self::Network {
                url,
                detail: format!("HTTP {status}"),
            },
            DownloadError::HashMismatch {
                url,
                expected,
                actual,
            } => Self::Integrity {
                url,
                expected,
                actual,
            },
            DownloadError::Io(e) => Self::Io(e),
        }
    }
}
