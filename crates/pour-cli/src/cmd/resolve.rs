//! Resolve command

use std::path::Path;

use anyhow::Result;
use pour_core::Prefix;
use pour_core::paths::filename_from_url;
use pour_schema::Platform;

/// Show the variant that would be installed, without touching the network
pub fn resolve(path: &Path, platform: Option<Platform>, json: bool) -> Result<()> {
    let descriptor = super::load(path)?;
    let platform = super::target_platform(platform)?;
    let variant = descriptor.resolve(platform)?;
    let target = Prefix::from_env().map(|p| p.bin_path(descriptor.bin()));

    if json {
        let value = serde_json::json!({
            "name": descriptor.package.name.as_str(),
            "version": descriptor.package.version.as_str(),
            "platform": variant.platform.to_string(),
            "url": variant.url,
            "sha256": variant.sha256.as_str(),
            "format": variant.format.to_string(),
            "bin": descriptor.bin(),
            "target": target.map(|t| t.display().to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{} {}", descriptor.package.name, descriptor.package.version);
    println!("  Platform: {}", variant.platform);
    println!("  URL:      {}", variant.url);
    println!("  File:     {}", filename_from_url(&variant.url));
    println!("  SHA256:   {}", variant.sha256);
    println!("  Format:   {}", variant.format);
    if let Some(target) = target {
        println!("  Target:   {}", target.display());
    }
    Ok(())
}
