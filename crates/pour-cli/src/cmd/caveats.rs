//! Caveats command

use std::path::{Path, PathBuf};

use anyhow::Result;
use pour_core::Reporter;

use crate::ui::ConsoleReporter;

/// Print the rendered post-install caveats
pub fn caveats(path: &Path, prefix: Option<PathBuf>, reporter: &ConsoleReporter) -> Result<()> {
    let descriptor = super::load(path)?;
    let prefix = crate::prefix_from(prefix)?;

    match descriptor.caveats(&prefix) {
        Some(text) => println!("{text}"),
        None => reporter.info(&format!("{} has no caveats", descriptor.package.name)),
    }
    Ok(())
}
