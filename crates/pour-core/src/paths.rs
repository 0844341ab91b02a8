use std::path::{Path, PathBuf};

use dirs::home_dir;

/// Environment variable overriding the prefix root.
pub const HOME_ENV: &str = "POUR_HOME";

/// The managed install prefix.
///
/// ```text
/// ~/.pour/
/// ├── bin/   # installed executables (the only persisted output)
/// └── tmp/   # staging for downloads, same volume as bin/
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefix {
    root: PathBuf,
}

impl Prefix {
    /// Use an explicit root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `$POUR_HOME`, else `~/.pour`. `None` if neither can be determined.
    pub fn from_env() -> Option<Self> {
        if let Some(val) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Some(Self::new(val));
        }
        home_dir().map(|h| Self::new(h.join(".pour")))
    }

    /// Prefix root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Binary installation directory: `<root>/bin`
    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    /// Staging directory: `<root>/tmp`
    pub fn tmp_dir(&self) -> PathBuf {
        self.root.join("tmp")
    }

    /// Install target for a binary name.
    pub fn bin_path(&self, bin: &str) -> PathBuf {
        self.bin_dir().join(bin)
    }
}

/// Extract the filename from a URL.
pub fn filename_from_url(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    path.split('/').next_back().unwrap_or("")
}
