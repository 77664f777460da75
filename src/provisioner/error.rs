//! Fatal provisioning errors.
//!
//! Only environment problems abort a run. Everything that goes wrong for a
//! single entry lands in the report instead.

use crate::constants::{EXIT_MANIFEST_ROOT, EXIT_NOT_MANAGER};
use crate::source::SourceError;
use crate::store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Run-aborting errors; no entry is processed when one of these is returned
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("not running against a swarm manager: {0}")]
    NotManager(#[source] StoreError),
    #[error("manifest root {0} does not exist; run from the deployment directory or set --root")]
    ManifestRootMissing(PathBuf),
    #[error("manifest root {path} could not be checked: {source}")]
    ManifestRootUnreadable {
        path: PathBuf,
        #[source]
        source: SourceError,
    },
}

impl ProvisionError {
    /// Process exit code for this error
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            ProvisionError::NotManager(_) => EXIT_NOT_MANAGER,
            ProvisionError::ManifestRootMissing(_)
            | ProvisionError::ManifestRootUnreadable { .. } => EXIT_MANIFEST_ROOT,
        }
    }

    /// Operator guidance for this error
    #[must_use]
    pub fn remediation(&self) -> &'static str {
        match self {
            ProvisionError::NotManager(_) => {
                "Run on a swarm manager node (docker node ls must succeed), or point --host / DOCKER_HOST at one"
            }
            ProvisionError::ManifestRootMissing(_) => {
                "Generate the certificates and configuration first, or pass --root with the directory holding them"
            }
            ProvisionError::ManifestRootUnreadable { .. } => {
                "Check that sudo is allowed non-interactively (sudo -n true) or use --no-sudo"
            }
        }
    }
}
