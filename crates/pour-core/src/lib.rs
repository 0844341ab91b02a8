//! Core library for pour.
//!
//! Reads a release descriptor, picks the variant for the host platform and
//! runs the strictly sequential install pipeline:
//!
//! ```text
//! resolve -> fetch -> verify checksum -> extract -> place -> smoke test
//! ```
//!
//! Every failure is terminal for the attempt and leaves any previously
//! installed binary untouched.

pub mod descriptor;
pub mod error;
pub mod install;
pub mod io;
pub mod paths;
pub mod reporter;
pub mod resolver;
pub mod verify;

pub use descriptor::Descriptor;
pub use error::{ErrorKind, InstallError};
pub use install::{InstallContext, InstalledBinary};
pub use paths::Prefix;
pub use reporter::{NullReporter, Reporter};
pub use resolver::{ResolveError, Variant};

/// User Agent string for outgoing requests
pub const USER_AGENT: &str = concat!("pour/", env!("CARGO_PKG_VERSION"));
