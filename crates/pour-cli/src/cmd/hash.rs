//! Hash command

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

use pour_schema::Sha256Digest;

/// Print `sha256  path` for each file
pub fn hash(files: &[PathBuf]) -> Result<()> {
    for file in files {
        let digest = file_digest(file)
            .with_context(|| format!("Failed to hash {}", file.display()))?;
        println!("{digest}  {}", file.display());
    }
    Ok(())
}

/// Compute SHA256 hash of a file (streaming)
pub fn file_digest(path: &Path) -> std::io::Result<Sha256Digest> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 65536]; // 64KB buffer

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(Sha256Digest::from_hasher(hasher))
}
