//! Reader that elevates through non-interactive `sudo`.
//!
//! `sudo -n test -e PATH` answers existence and `sudo -n cat PATH` reads the
//! content, so both run as the same elevated user. `-n` keeps sudo from
//! prompting; a missing sudoers rule surfaces as an elevation error instead
//! of hanging the run.

use super::{ReadPrivilege, SecretBytes, SourceError, SourceReader};
use crate::process::{self, CommandError};
use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use zeroize::Zeroizing;

/// Reads files through `sudo -n`
#[derive(Debug, Clone)]
pub struct SudoReader {
    sudo_binary: String,
    timeout: Duration,
}

impl SudoReader {
    #[must_use]
    pub fn new(sudo_binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            sudo_binary: sudo_binary.into(),
            timeout,
        }
    }

    fn sudo_path(&self, path: &Path) -> Result<PathBuf, SourceError> {
        process::resolve_binary(&self.sudo_binary).map_err(|e| SourceError::Elevation {
            path: path.to_path_buf(),
            reason: format!("{} not found in PATH: {e}", self.sudo_binary),
        })
    }

    async fn sudo(
        &self,
        path: &Path,
        args: &[&OsStr],
    ) -> Result<process::CommandOutput, SourceError> {
        let sudo = self.sudo_path(path)?;
        let mut full_args = vec![OsStr::new("-n")];
        full_args.extend_from_slice(args);
        process::run(&sudo, full_args, &[], None, self.timeout)
            .await
            .map_err(|e| match e {
                CommandError::Io { source, .. } => SourceError::Io {
                    path: path.to_path_buf(),
                    source,
                },
                CommandError::Timeout { .. } => SourceError::Elevation {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                },
            })
    }
}

#[async_trait]
impl SourceReader for SudoReader {
    fn privilege(&self) -> ReadPrivilege {
        ReadPrivilege::Elevated
    }

    async fn exists(&self, path: &Path) -> Result<bool, SourceError> {
        let output = self
            .sudo(path, &[OsStr::new("test"), OsStr::new("-e"), path.as_os_str()])
            .await?;

        if output.success {
            return Ok(true);
        }
        // `test` exits 1 silently for a missing path; sudo itself complains on stderr
        let stderr = output.stderr_lossy();
        if stderr.is_empty() {
            debug!("{} does not exist (elevated check)", path.display());
            Ok(false)
        } else {
            Err(SourceError::Elevation {
                path: path.to_path_buf(),
                reason: stderr,
            })
        }
    }

    async fn read(&self, path: &Path) -> Result<SecretBytes, SourceError> {
        let output = self
            .sudo(path, &[OsStr::new("cat"), OsStr::new("--"), path.as_os_str()])
            .await?;

        if output.success {
            Ok(Zeroizing::new(output.stdout))
        } else {
            Err(SourceError::Elevation {
                path: path.to_path_buf(),
                reason: format!("{}: {}", output.status, output.stderr_lossy()),
            })
        }
    }
}
