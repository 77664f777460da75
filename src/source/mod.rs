//! # Source Readers
//!
//! Reads the plaintext material (certificates, keys, config files) that
//! becomes secret content.
//!
//! Some sources are root-owned, so reads may need elevated privilege. The
//! privilege level is an explicit property of the reader, and the
//! existence check and the content read always go through the same reader.
//! A check at one privilege level followed by a read at another could report
//! "absent" for a file the read could access, or the reverse.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use zeroize::Zeroizing;

mod local;
mod sudo;

pub use local::LocalReader;
pub use sudo::SudoReader;

/// Privilege level used for source file access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadPrivilege {
    /// Read with the invoking user's own permissions
    Invoker,
    /// Read through `sudo -n`
    Elevated,
}

impl ReadPrivilege {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadPrivilege::Invoker => "invoker",
            ReadPrivilege::Elevated => "elevated",
        }
    }
}

/// Errors raised while checking or reading a source file
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("privilege elevation failed for {path}: {reason}")]
    Elevation { path: PathBuf, reason: String },
}

/// File content, wiped from memory on drop
pub type SecretBytes = Zeroizing<Vec<u8>>;

/// Reads source files at a fixed privilege level
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// The privilege level both `exists` and `read` use
    fn privilege(&self) -> ReadPrivilege;

    /// Check whether `path` exists
    async fn exists(&self, path: &Path) -> Result<bool, SourceError>;

    /// Read the full content of `path`
    async fn read(&self, path: &Path) -> Result<SecretBytes, SourceError>;
}

/// Build the reader matching a privilege level
#[must_use]
pub fn reader_for(
    privilege: ReadPrivilege,
    sudo_binary: &str,
    timeout: Duration,
) -> Box<dyn SourceReader> {
    match privilege {
        ReadPrivilege::Invoker => Box::new(LocalReader),
        ReadPrivilege::Elevated => Box::new(SudoReader::new(sudo_binary, timeout)),
    }
}
