//! Command implementations

pub mod bump;
pub mod caveats;
pub mod check;
pub mod completions;
pub mod hash;
pub mod install;
pub mod resolve;

use std::path::Path;

use anyhow::{Context, Result};
use pour_core::{Descriptor, ResolveError};
use pour_schema::Platform;

/// Load and validate a descriptor file.
pub(crate) fn load(path: &Path) -> Result<Descriptor> {
    Descriptor::from_file(path)
        .with_context(|| format!("Failed to load descriptor {}", path.display()))
}

/// The explicit platform, or the host's.
pub(crate) fn target_platform(explicit: Option<Platform>) -> Result<Platform, ResolveError> {
    match explicit {
        Some(p) => Ok(p),
        None => Ok(Platform::current()?),
    }
}

pub(crate) fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(pour_core::USER_AGENT)
        .build()
        .context("Failed to build HTTP client")
}
