//! Installation Flow Typestate Pattern
//!
//! Models the install pipeline as a series of explicit state transitions:
//!
//! ```text
//! Release --[fetch()]--> VerifiedArtifact --[extract()]--> StagedBinary
//!         --[prepare()]--> PreparedBinary --[place()]--> InstalledBinary
//! ```
//!
//! Each state owns what the next step needs, so an archive cannot be
//! extracted before its checksum was checked and nothing reaches `bin/`
//! without passing through both. The smoke test runs against the
//! [`PreparedBinary`], which already sits executable in `bin/` under a
//! hidden name, so a binary that fails it never replaces the installed one.
//! Staging lives under `<prefix>/tmp` and is removed when the state holding
//! it is dropped, including on error.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use tempfile::{TempDir, TempPath};

use pour_schema::{PackageName, Platform, Sha256Digest, Version};

use crate::descriptor::Descriptor;
use crate::error::InstallError;
use crate::io::download::DownloadRequest;
use crate::io::extract;
use crate::paths::{Prefix, filename_from_url};
use crate::reporter::Reporter;
use crate::resolver::Variant;
use crate::verify::{SmokeOutput, SmokeTest};

/// Shared handles for one install attempt.
pub struct InstallContext<'a> {
    pub client: &'a Client,
    pub prefix: &'a Prefix,
    pub reporter: &'a dyn Reporter,
}

impl<'a> InstallContext<'a> {
    pub fn new(client: &'a Client, prefix: &'a Prefix, reporter: &'a dyn Reporter) -> Self {
        Self {
            client,
            prefix,
            reporter,
        }
    }
}

/// State 1: the variant for the target platform has been selected.
#[derive(Debug)]
pub struct Release<'d> {
    pub descriptor: &'d Descriptor,
    pub variant: Variant,
}

/// State 2: the artifact is on disk and matches its checksum.
#[derive(Debug)]
pub struct VerifiedArtifact<'d> {
    pub release: Release<'d>,
    pub archive: PathBuf,
    pub sha256: Sha256Digest,
    staging: TempDir,
}

/// State 3: the binary has been located in the unpacked artifact.
#[derive(Debug)]
pub struct StagedBinary<'d> {
    pub release: Release<'d>,
    pub sha256: Sha256Digest,
    pub binary: PathBuf,
    staging: TempDir,
}

/// State 4: the binary is executable in `bin/` under a temporary name, ready
/// to be renamed over its target. Dropping it removes the file.
#[derive(Debug)]
pub struct PreparedBinary<'d> {
    pub release: Release<'d>,
    pub sha256: Sha256Digest,
    pub target: PathBuf,
    temp: TempPath,
    staging: TempDir,
}

/// Final state: the binary is in place under the prefix.
#[derive(Debug, Clone)]
pub struct InstalledBinary {
    pub name: PackageName,
    pub version: Version,
    pub platform: Platform,
    pub path: PathBuf,
    pub sha256: Sha256Digest,
    /// Whether a previous file at `path` was replaced.
    pub replaced: bool,
    /// Smoke test result, `None` when the test was skipped.
    pub smoke: Option<SmokeOutput>,
}

impl<'d> Release<'d> {
    /// Select the variant for `platform`. No I/O.
    pub fn resolve(descriptor: &'d Descriptor, platform: Platform) -> Result<Self, InstallError> {
        let variant = descriptor.resolve(platform)?;
        tracing::debug!(%platform, url = %variant.url, format = %variant.format, "resolved variant");
        Ok(Self {
            descriptor,
            variant,
        })
    }

    fn name(&self) -> &PackageName {
        &self.descriptor.package.name
    }

    fn version(&self) -> &Version {
        &self.descriptor.package.version
    }

    /// Download the artifact into a fresh staging directory and verify it.
    ///
    /// On any failure the staging directory, and with it every downloaded
    /// byte, is removed.
    pub async fn fetch(
        self,
        ctx: &InstallContext<'_>,
    ) -> Result<VerifiedArtifact<'d>, InstallError> {
        let tmp_path = ctx.prefix.tmp_dir();
        fs::create_dir_all(&tmp_path)?;
        let staging = tempfile::Builder::new()
            .prefix("pour-")
            .tempdir_in(&tmp_path)?;

        let file_name = match filename_from_url(&self.variant.url) {
            "" => "artifact",
            name => name,
        };
        let archive = staging.path().join(file_name);

        let sha256 = DownloadRequest::new(
            ctx.client,
            self.name(),
            self.version(),
            &self.variant.url,
            &archive,
            &self.variant.sha256,
            ctx.reporter,
        )
        .execute()
        .await?;

        tracing::info!(url = %self.variant.url, %sha256, "checksum verified");
        Ok(VerifiedArtifact {
            release: self,
            archive,
            sha256,
            staging,
        })
    }
}

impl<'d> VerifiedArtifact<'d> {
    /// Unpack the artifact and locate the binary.
    pub async fn extract(self, ctx: &InstallContext<'_>) -> Result<StagedBinary<'d>, InstallError> {
        ctx.reporter
            .extracting(self.release.name(), self.release.version());

        let archive = self.archive.clone();
        let dest = self.staging.path().join("root");
        let format = self.release.variant.format;
        let bin = self.release.descriptor.bin().to_string();

        let binary = tokio::task::spawn_blocking(move || {
            let files = extract::extract(&archive, format, &dest, &bin)?;
            tracing::debug!(entries = files.len(), "extracted");
            extract::find_binary(&files, &bin).map(|f| f.absolute_path.clone())
        })
        .await
        .map_err(|e| InstallError::context("extract task", e))??;

        Ok(StagedBinary {
            release: self.release,
            sha256: self.sha256,
            binary,
            staging: self.staging,
        })
    }
}

impl<'d> StagedBinary<'d> {
    /// Copy the binary next to `<prefix>/bin/<bin>` under a temporary name
    /// and make it executable.
    pub fn prepare(self, ctx: &InstallContext<'_>) -> Result<PreparedBinary<'d>, InstallError> {
        ctx.reporter
            .installing(self.release.name(), self.release.version());

        let bin_dir = ctx.prefix.bin_dir();
        fs::create_dir_all(&bin_dir)?;
        let target = ctx.prefix.bin_path(self.release.descriptor.bin());

        let mut temp = tempfile::Builder::new()
            .prefix(".pour-")
            .tempfile_in(&bin_dir)?;
        io::copy(&mut File::open(&self.binary)?, temp.as_file_mut())?;
        temp.as_file().sync_all()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(temp.path(), fs::Permissions::from_mode(0o755))?;
        }

        // Close the write handle before anything runs it; an open one makes exec fail.
        let temp = temp.into_temp_path();

        Ok(PreparedBinary {
            release: self.release,
            sha256: self.sha256,
            target,
            temp,
            staging: self.staging,
        })
    }
}

impl PreparedBinary<'_> {
    /// Where the not-yet-placed binary currently lives.
    pub fn path(&self) -> &Path {
        &self.temp
    }

    /// Rename the binary over its target.
    ///
    /// The previous binary stays usable until the rename.
    pub fn place(self, smoke: Option<SmokeOutput>) -> Result<InstalledBinary, InstallError> {
        let replaced = self.target.exists();
        self.temp.persist(&self.target).map_err(|e| e.error)?;
        drop(self.staging);

        tracing::info!(path = %self.target.display(), replaced, "placed binary");
        Ok(InstalledBinary {
            name: self.release.name().clone(),
            version: self.release.version().clone(),
            platform: self.release.variant.platform,
            path: self.target,
            sha256: self.sha256,
            replaced,
            smoke,
        })
    }
}

/// Run the descriptor's smoke test against `binary`.
pub async fn smoke_test(descriptor: &Descriptor, binary: &Path) -> Result<SmokeOutput, InstallError> {
    let binary = binary.to_path_buf();
    let args = descriptor.test.args.clone();
    let expect = descriptor.expected_output().to_string();
    let exit_code = descriptor.test.exit_code;
    let timeout = Duration::from_secs(descriptor.test.timeout_secs);

    let output = tokio::task::spawn_blocking(move || {
        SmokeTest {
            binary: &binary,
            args: &args,
            expect: &expect,
            exit_code,
            timeout,
        }
        .run()
    })
    .await
    .map_err(|e| InstallError::context("smoke test task", e))??;

    Ok(output)
}

/// Smoke-test the binary currently installed for `descriptor`.
pub async fn verify_installed(
    prefix: &Prefix,
    descriptor: &Descriptor,
    reporter: &dyn Reporter,
) -> Result<SmokeOutput, InstallError> {
    let name = &descriptor.package.name;
    let version = &descriptor.package.version;
    reporter.testing(name, version);

    let path = prefix.bin_path(descriptor.bin());
    match smoke_test(descriptor, &path).await {
        Ok(output) => {
            reporter.done(name, version, "smoke test passed");
            Ok(output)
        }
        Err(e) => {
            reporter.failed(name, version, e.kind().as_str());
            Err(e)
        }
    }
}

/// Run the whole pipeline for `platform`.
///
/// Steps run strictly in order and the first failure ends the attempt. The
/// smoke test runs before the rename, so any failure, including a failed
/// smoke test, leaves an existing binary untouched.
pub async fn install(
    ctx: &InstallContext<'_>,
    descriptor: &Descriptor,
    platform: Platform,
    run_test: bool,
) -> Result<InstalledBinary, InstallError> {
    let name = &descriptor.package.name;
    let version = &descriptor.package.version;
    ctx.reporter.section(&format!("Installing {name} {version}"));

    let result = run_pipeline(ctx, descriptor, platform, run_test).await;
    match &result {
        Ok(installed) => {
            let detail = installed.path.display().to_string();
            ctx.reporter.done(name, version, &detail);
        }
        Err(e) => {
            tracing::warn!(kind = %e.kind(), error = %e, "install failed");
            ctx.reporter.failed(name, version, e.kind().as_str());
        }
    }
    result
}

async fn run_pipeline(
    ctx: &InstallContext<'_>,
    descriptor: &Descriptor,
    platform: Platform,
    run_test: bool,
) -> Result<InstalledBinary, InstallError> {
    let release = Release::resolve(descriptor, platform)?;
    let verified = release.fetch(ctx).await?;
    let staged = verified.extract(ctx).await?;
    let prepared = staged.prepare(ctx)?;

    let smoke = if run_test {
        ctx.reporter
            .testing(&descriptor.package.name, &descriptor.package.version);
        Some(smoke_test(descriptor, prepared.path()).await?)
    } else {
        None
    };

    prepared.place(smoke)
}
