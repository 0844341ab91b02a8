//! Check command

use std::path::Path;

use anyhow::Result;
use pour_core::Reporter;

use crate::ui::ConsoleReporter;

/// Validate a descriptor and summarize what it declares
pub fn check(path: &Path, reporter: &ConsoleReporter) -> Result<()> {
    let descriptor = super::load(path)?;
    let pkg = &descriptor.package;

    reporter.success(&format!("{} is valid", path.display()));
    println!("  Name:     {}", pkg.name);
    println!("  Version:  {}", pkg.version);
    if !pkg.license.is_empty() {
        println!("  License:  {}", pkg.license);
    }
    println!("  Binary:   {}", descriptor.bin());
    println!(
        "  Test:     {} {}",
        descriptor.bin(),
        descriptor.test.args.join(" ")
    );
    for variant in descriptor.resolved_variants() {
        println!("  {:<14}{}", variant.platform.to_string(), variant.url);
    }

    if descriptor.hints.post_install.trim().is_empty() {
        reporter.info("No caveats defined");
    }
    Ok(())
}
