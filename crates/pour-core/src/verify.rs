//! Post-install smoke test.
//!
//! Runs the installed binary with the descriptor's test arguments, captures
//! stdout and stderr into one stream (like `2>&1`) and checks the exit code
//! and that the output names the tool.

use std::fs;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;

use thiserror::Error;
use wait_timeout::ChildExt;

/// Ways a smoke test can fail.
#[derive(Error, Debug)]
pub enum VerifyError {
    /// Nothing is installed at the target path.
    #[error("{} does not exist", .0.display())]
    Missing(PathBuf),

    /// The target exists but has no execute bit.
    #[error("{} is not executable", .0.display())]
    NotExecutable(PathBuf),

    /// The OS refused to start the binary (corrupt or wrong-arch file).
    #[error("failed to run {}: {source}", .path.display())]
    Spawn {
        /// Binary that failed to start.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The binary did not exit in time.
    #[error("{} did not exit within {secs}s", .path.display())]
    TimedOut {
        /// Binary under test.
        path: PathBuf,
        /// Configured limit.
        secs: u64,
    },

    /// The binary exited with an unexpected status.
    #[error("expected exit code {expected}, got {}\n{output}", describe(.actual))]
    ExitCode {
        /// Required exit code.
        expected: i32,
        /// Actual code, `None` if killed by a signal.
        actual: Option<i32>,
        /// Combined output.
        output: String,
    },

    /// The output does not contain the expected text.
    #[error("output does not contain '{expected}':\n{output}")]
    OutputMismatch {
        /// Required substring.
        expected: String,
        /// Combined output.
        output: String,
    },

    /// Capturing output failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

fn describe(code: &Option<i32>) -> String {
    code.map_or_else(|| "termination by signal".to_string(), |c| c.to_string())
}

/// What to run and what to expect.
#[derive(Debug, Clone)]
pub struct SmokeTest<'a> {
    /// Installed binary.
    pub binary: &'a Path,
    /// Arguments, e.g. `["-version"]`.
    pub args: &'a [String],
    /// Substring the combined output must contain.
    pub expect: &'a str,
    /// Required exit code.
    pub exit_code: i32,
    /// Upper bound on run time.
    pub timeout: Duration,
}

/// A passing run.
#[derive(Debug, Clone)]
pub struct SmokeOutput {
    /// Combined stdout and stderr.
    pub output: String,
    /// Exit code (always the expected one).
    pub exit_code: i32,
}

// A freshly renamed executable can briefly report ETXTBSY while another
// process still holds a write handle inherited across fork.
#[cfg(unix)]
const ETXTBSY: i32 = 26;

impl SmokeTest<'_> {
    /// Run the test.
    ///
    /// # Errors
    ///
    /// Returns a [`VerifyError`] describing why the binary is not usable.
    pub fn run(&self) -> Result<SmokeOutput, VerifyError> {
        let meta = fs::metadata(self.binary).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => VerifyError::Missing(self.binary.to_path_buf()),
            _ => VerifyError::Io(e),
        })?;
        if !meta.is_file() {
            return Err(VerifyError::Missing(self.binary.to_path_buf()));
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if meta.permissions().mode() & 0o111 == 0 {
                return Err(VerifyError::NotExecutable(self.binary.to_path_buf()));
            }
        }

        let mut capture = tempfile::tempfile()?;
        let status = self.spawn_and_wait(&capture)?;

        capture.seek(SeekFrom::Start(0))?;
        let mut raw = Vec::new();
        capture.read_to_end(&mut raw)?;
        let output = String::from_utf8_lossy(&raw).into_owned();
        tracing::debug!(binary = %self.binary.display(), ?status, %output, "smoke test finished");

        if status.code() != Some(self.exit_code) {
            return Err(VerifyError::ExitCode {
                expected: self.exit_code,
                actual: status.code(),
                output,
            });
        }

        if !output.contains(self.expect) {
            return Err(VerifyError::OutputMismatch {
                expected: self.expect.to_string(),
                output,
            });
        }

        Ok(SmokeOutput {
            output,
            exit_code: self.exit_code,
        })
    }

    fn spawn_and_wait(&self, capture: &fs::File) -> Result<ExitStatus, VerifyError> {
        let mut attempts = 0;
        let mut child = loop {
            let spawned = Command::new(self.binary)
                .args(self.args)
                .stdin(Stdio::null())
                .stdout(Stdio::from(capture.try_clone()?))
                .stderr(Stdio::from(capture.try_clone()?))
                .spawn();

            match spawned {
                Ok(child) => break child,
                #[cfg(unix)]
                Err(e) if e.raw_os_error() == Some(ETXTBSY) && attempts < 5 => {
                    attempts += 1;
                    std::thread::sleep(Duration::from_millis(20));
                }
                Err(source) => {
                    return Err(VerifyError::Spawn {
                        path: self.binary.to_path_buf(),
                        source,
                    });
                }
            }
        };

        if let Some(status) = child.wait_timeout(self.timeout)? {
            Ok(status)
        } else {
            child.kill().ok();
            child.wait().ok();
            Err(VerifyError::TimedOut {
                path: self.binary.to_path_buf(),
                secs: self.timeout.as_secs(),
            })
        }
    }
}
