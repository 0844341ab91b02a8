//! pour - install prebuilt binaries from release descriptors
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! # Overview
//!
//! A release descriptor is a TOML file naming one archive per platform, its
//! SHA-256, the binary inside it and a smoke test. `pour install` picks the
//! host's variant, downloads and verifies it, unpacks it, swaps the binary
//! into `<prefix>/bin` with a rename and runs the smoke test.
//!
//! # Directory Layout
//!
//! ```text
//! ~/.pour/           # or $POUR_HOME, or --prefix
//! ├── bin/           # installed binaries
//! └── tmp/           # per-attempt staging, removed afterwards
//! ```

pub mod cmd;
pub mod ui;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use pour_core::descriptor::DescriptorError;
use pour_core::paths::HOME_ENV;
use pour_core::{InstallError, Prefix, ResolveError};
use pour_schema::{Platform, Sha256Digest};

#[derive(Debug, Parser)]
#[command(name = "pour")]
#[command(author, version, about = "pour - install prebuilt binaries from release descriptors")]
pub struct Cli {
    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Download, verify and install the binary a descriptor describes
    Install {
        /// Descriptor file
        descriptor: PathBuf,
        /// Install for this platform instead of the host (e.g. linux-arm64)
        #[arg(long)]
        platform: Option<Platform>,
        /// Install prefix
        #[arg(long, env = "POUR_HOME")]
        prefix: Option<PathBuf>,
        /// Skip the post-install smoke test
        #[arg(long)]
        no_test: bool,
    },
    /// Run the smoke test against the installed binary
    Test {
        /// Descriptor file
        descriptor: PathBuf,
        /// Install prefix
        #[arg(long, env = "POUR_HOME")]
        prefix: Option<PathBuf>,
    },
    /// Show which artifact would be installed
    Resolve {
        /// Descriptor file
        descriptor: PathBuf,
        /// Resolve for this platform instead of the host
        #[arg(long)]
        platform: Option<Platform>,
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate a descriptor file
    Check {
        /// Descriptor file
        descriptor: PathBuf,
    },
    /// Print the post-install caveats
    Caveats {
        /// Descriptor file
        descriptor: PathBuf,
        /// Install prefix
        #[arg(long, env = "POUR_HOME")]
        prefix: Option<PathBuf>,
    },
    /// Rewrite a descriptor for a new release
    Bump {
        /// Descriptor file
        descriptor: PathBuf,
        /// New version (without a leading 'v')
        #[arg(long)]
        version: String,
        /// Known checksum, as PLATFORM=HEX; others are fetched and hashed
        #[arg(long = "sha256", value_parser = parse_checksum)]
        checksums: Vec<(Platform, Sha256Digest)>,
    },
    /// Compute SHA256 hash of a file (for descriptor authoring)
    Hash {
        /// Files to hash
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

fn parse_checksum(s: &str) -> Result<(Platform, Sha256Digest), String> {
    let (platform, hex) = s
        .split_once('=')
        .ok_or_else(|| format!("expected PLATFORM=HEX, got '{s}'"))?;
    let platform = platform.parse::<Platform>().map_err(|e| e.to_string())?;
    let digest = Sha256Digest::new(hex).map_err(|e| e.to_string())?;
    Ok((platform, digest))
}

/// `--prefix` (or `$POUR_HOME` via clap), else `~/.pour`.
pub fn prefix_from(arg: Option<PathBuf>) -> anyhow::Result<Prefix> {
    match arg {
        Some(root) => Ok(Prefix::new(root)),
        None => Prefix::from_env().ok_or_else(|| {
            anyhow::anyhow!("Cannot determine home directory; pass --prefix or set {HOME_ENV}")
        }),
    }
}

/// Process exit code for a failed command.
///
/// Pipeline failures keep their stage's code; everything else is 1.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<InstallError>() {
            return u8::try_from(e.exit_code()).unwrap_or(1);
        }
        if cause.downcast_ref::<ResolveError>().is_some() {
            return u8::try_from(pour_core::ErrorKind::UnsupportedPlatform.exit_code()).unwrap_or(1);
        }
        if cause.downcast_ref::<DescriptorError>().is_some() {
            return 1;
        }
    }
    1
}
