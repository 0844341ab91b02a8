//! Archive extraction module
//!
//! Handles tar.gz, tar, zip and bare binaries. Only regular files are
//! written; entries whose path would escape the destination are rejected.

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use zip::ZipArchive;

use pour_schema::ArtifactFormat;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Invalid path in archive: {0}")]
    UnsafePath(PathBuf),

    #[error("Binary '{bin}' not found in archive ({entries} files extracted)")]
    BinaryNotFound { bin: String, entries: usize },
}

/// Information about an extracted file
#[derive(Debug, Clone)]
pub struct ExtractedFile {
    /// Path relative to extraction root
    pub relative_path: PathBuf,
    /// Absolute path on disk
    pub absolute_path: PathBuf,
    /// Whether this is an executable
    pub is_executable: bool,
}

/// Reject absolute paths and `..` so nothing lands outside `dest_dir`.
fn sanitize(path: &Path) -> Result<PathBuf, ExtractError> {
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ExtractError::UnsafePath(path.to_path_buf()));
            }
        }
    }
    if clean.as_os_str().is_empty() {
        return Err(ExtractError::UnsafePath(path.to_path_buf()));
    }
    Ok(clean)
}

/// Extract a tar.gz archive to a destination directory
pub fn extract_tar_gz(
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<Vec<ExtractedFile>, ExtractError> {
    let file = File::open(archive_path)?;
    let reader = BufReader::new(file);
    let gz_decoder = flate2::read::GzDecoder::new(reader);

    extract_tar(gz_decoder, dest_dir)
}

/// Extract a tar archive from a reader
fn extract_tar<R: Read>(reader: R, dest_dir: &Path) -> Result<Vec<ExtractedFile>, ExtractError> {
    fs::create_dir_all(dest_dir)?;

    let mut archive = tar::Archive::new(reader);
    let mut extracted_files = Vec::new();

    for entry in archive.entries()? {
        let mut entry = entry?;

        // Directories are created on demand; links are never followed.
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let relative_path = sanitize(&entry.path()?)?;
        let absolute_path = dest_dir.join(&relative_path);

        if let Some(parent) = absolute_path.parent() {
            fs::create_dir_all(parent)?;
        }

        entry.unpack(&absolute_path)?;

        let is_executable = entry
            .header()
            .mode()
            .map(|m| m & 0o111 != 0)
            .unwrap_or(false);

        extracted_files.push(ExtractedFile {
            relative_path,
            absolute_path,
            is_executable,
        });
    }

    Ok(extracted_files)
}

/// Extract a zip archive
pub fn extract_zip(
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<Vec<ExtractedFile>, ExtractError> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| ExtractError::Archive(e.to_string()))?;

    fs::create_dir_all(dest_dir)?;
    let mut extracted_files = Vec::new();

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| ExtractError::Archive(e.to_string()))?;

        if file.is_dir() {
            continue;
        }

        let relative_path = match file.enclosed_name() {
            Some(path) => sanitize(&path)?,
            None => return Err(ExtractError::UnsafePath(PathBuf::from(file.name()))),
        };

        let absolute_path = dest_dir.join(&relative_path);
        if let Some(p) = absolute_path.parent() {
            fs::create_dir_all(p)?;
        }

        let mut outfile = File::create(&absolute_path)?;
        io::copy(&mut file, &mut outfile)?;

        #[cfg(unix)]
        let is_executable = if let Some(mode) = file.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&absolute_path, fs::Permissions::from_mode(mode))?;
            mode & 0o111 != 0
        } else {
            false
        };
        #[cfg(not(unix))]
        let is_executable = false;

        extracted_files.push(ExtractedFile {
            relative_path,
            absolute_path,
            is_executable,
        });
    }

    Ok(extracted_files)
}

/// Unpack `archive_path` into `dest_dir` according to `format`.
///
/// A bare binary is copied in as `bin_name`.
pub fn extract(
    archive_path: &Path,
    format: ArtifactFormat,
    dest_dir: &Path,
    bin_name: &str,
) -> Result<Vec<ExtractedFile>, ExtractError> {
    match format {
        ArtifactFormat::TarGz => extract_tar_gz(archive_path, dest_dir),
        ArtifactFormat::Tar => {
            let file = File::open(archive_path)?;
            extract_tar(BufReader::new(file), dest_dir)
        }
        ArtifactFormat::Zip => extract_zip(archive_path, dest_dir),
        ArtifactFormat::Binary => {
            fs::create_dir_all(dest_dir)?;
            let relative_path = sanitize(Path::new(bin_name))?;
            let dest_path = dest_dir.join(&relative_path);
            fs::copy(archive_path, &dest_path)?;

            Ok(vec![ExtractedFile {
                relative_path,
                absolute_path: dest_path,
                is_executable: true, // Raw downloads are the binary itself
            }])
        }
    }
}

/// Locate `bin` among the extracted files.
///
/// Archives often wrap their contents in a top-level directory, so any
/// depth is accepted. Executable entries are preferred over plain files of
/// the same name (completion scripts, docs), then the shallowest match wins.
pub fn find_binary<'a>(
    files: &'a [ExtractedFile],
    bin: &str,
) -> Result<&'a ExtractedFile, ExtractError> {
    files
        .iter()
        .filter(|f| f.relative_path.file_name().is_some_and(|n| n == bin))
        .min_by_key(|f| (!f.is_executable, f.relative_path.components().count()))
        .ok_or_else(|| ExtractError::BinaryNotFound {
            bin: bin.to_string(),
            entries: files.len(),
        })
}
