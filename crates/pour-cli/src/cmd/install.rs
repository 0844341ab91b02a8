//! Install command

use std::path::{Path, PathBuf};

use anyhow::Result;
use pour_core::install::{self, InstallContext};
use pour_core::{InstallError, Prefix, Reporter};
use pour_schema::Platform;

use crate::ui::ConsoleReporter;

/// Install the binary described by a descriptor
pub async fn install(
    path: &Path,
    platform: Option<Platform>,
    prefix: Option<PathBuf>,
    run_test: bool,
    reporter: &ConsoleReporter,
) -> Result<()> {
    let descriptor = super::load(path)?;
    let platform = super::target_platform(platform).map_err(InstallError::from)?;
    let prefix = crate::prefix_from(prefix)?;
    let client = super::http_client()?;

    let ctx = InstallContext::new(&client, &prefix, reporter);
    let installed = install::install(&ctx, &descriptor, platform, run_test).await?;

    let verb = if installed.replaced { "Replaced" } else { "Installed" };
    reporter.success(&format!(
        "{verb} {} {} ({platform}) at {}",
        installed.name,
        installed.version,
        installed.path.display()
    ));
    if !run_test {
        reporter.warning("Smoke test skipped (--no-test)");
    }

    warn_if_not_on_path(&prefix, reporter);

    if let Some(text) = descriptor.caveats(&prefix) {
        reporter.section("Caveats");
        println!("{text}");
    }
    Ok(())
}

fn warn_if_not_on_path(prefix: &Prefix, reporter: &ConsoleReporter) {
    let bin_dir = prefix.bin_dir();
    let on_path = std::env::var_os("PATH")
        .is_some_and(|paths| std::env::split_paths(&paths).any(|p| p == bin_dir));
    if !on_path {
        reporter.info(&format!("Add {} to your PATH to use it", bin_dir.display()));
    }
}
