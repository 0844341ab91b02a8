//! Bump command

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use pour_core::{InstallError, Reporter};
use pour_core::io::download::fetch_digest;
use pour_schema::{Platform, Sha256Digest, Version};

use crate::ui::ConsoleReporter;

/// Rewrite a descriptor for a new release.
///
/// Checksums not given on the command line are computed by downloading the
/// new release's artifacts. The descriptor is only rewritten once every
/// checksum is known.
pub async fn bump(
    path: &Path,
    version: &str,
    given: &[(Platform, Sha256Digest)],
    reporter: &ConsoleReporter,
) -> Result<()> {
    let descriptor = super::load(path)?;
    let version = Version::parse(version).context("Invalid --version")?;

    if version == descriptor.package.version {
        bail!("{} is already at {version}", descriptor.package.name);
    }
    if version.semver() < descriptor.package.version.semver() {
        reporter.warning(&format!(
            "{version} is older than the current {}",
            descriptor.package.version
        ));
    }

    reporter.section(&format!(
        "Bumping {} {} -> {version}",
        descriptor.package.name, descriptor.package.version
    ));

    let mut checksums: BTreeMap<Platform, Sha256Digest> = given.iter().cloned().collect();
    let urls = descriptor.urls_for(&version);
    let missing: Vec<(&Platform, &String)> = urls
        .iter()
        .filter(|(platform, _)| !checksums.contains_key(platform))
        .collect();

    if !missing.is_empty() {
        let client = super::http_client()?;
        for (platform, url) in missing {
            reporter.info(&format!("Hashing {url}"));
            let digest = fetch_digest(&client, url)
                .await
                .map_err(InstallError::from)
                .with_context(|| format!("Failed to fetch {platform} artifact"))?;
            tracing::debug!(%platform, %digest, "computed checksum");
            checksums.insert(*platform, digest);
        }
    }

    let next = descriptor.supersede(version, &checksums)?;
    next.save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    reporter.success(&format!(
        "{} now describes {} {}",
        path.display(),
        next.package.name,
        next.package.version
    ));
    Ok(())
}
