//! # Manifest
//!
//! The ordered list of (secret name, source file) pairs a provisioning run
//! must push into the swarm.
//!
//! A manifest is re-declared on every run and never persisted. Order only
//! affects log and report ordering; entries are independent.
//!
//! Relative source paths are resolved against the manifest root, absolute
//! paths are used as-is.

use crate::constants::MAX_SECRET_NAME_LEN;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

mod wazuh;

pub use wazuh::wazuh_default_manifest;

static SECRET_NAME_PATTERN: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_.-]*$")
        .expect("secret name pattern is a valid regex")
});

/// Errors raised while building or loading a manifest
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("invalid secret name '{name}': {reason}")]
    InvalidName { name: String, reason: String },
    #[error("duplicate secret name '{0}' in manifest")]
    DuplicateName(String),
    #[error("secret '{0}' has an empty source path")]
    EmptyPath(String),
    #[error("failed to read manifest file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse manifest file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// One secret to provision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretManifestEntry {
    /// Secret name, unique cluster-wide
    pub name: String,
    /// Source file, relative to the manifest root unless absolute
    #[serde(rename = "path")]
    pub source_path: PathBuf,
}

impl SecretManifestEntry {
    #[must_use]
    pub fn new(name: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source_path: source_path.into(),
        }
    }

    /// Resolve the source path against the manifest root
    #[must_use]
    pub fn resolve(&self, root: &Path) -> PathBuf {
        if self.source_path.is_absolute() {
            self.source_path.clone()
        } else {
            root.join(&self.source_path)
        }
    }
}

/// On-disk manifest layout
#[derive(Debug, Deserialize)]
struct ManifestFile {
    secrets: Vec<SecretManifestEntry>,
}

/// Validated, ordered manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<SecretManifestEntry>,
}

impl Manifest {
    /// Build a manifest, validating names and rejecting duplicates
    ///
    /// # Errors
    ///
    /// Returns `ManifestError` for an invalid or duplicate name, or an empty path.
    pub fn new(entries: Vec<SecretManifestEntry>) -> Result<Self, ManifestError> {
        let mut seen = HashSet::new();
        for entry in &entries {
            validate_secret_name(&entry.name)?;
            if entry.source_path.as_os_str().is_empty() {
                return Err(ManifestError::EmptyPath(entry.name.clone()));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(ManifestError::DuplicateName(entry.name.clone()));
            }
        }
        Ok(Self { entries })
    }

    /// Parse a manifest from YAML text
    ///
    /// ```yaml
    /// secrets:
    ///   - name: wazuh-root-ca
    ///     path: wazuh_indexer_ssl_certs/root-ca.pem
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::Parse` for malformed YAML and the validation
    /// errors of [`Manifest::new`].
    pub fn from_yaml_str(content: &str, origin: &Path) -> Result<Self, ManifestError> {
        let file: ManifestFile =
            serde_yaml::from_str(content).map_err(|source| ManifestError::Parse {
                path: origin.to_path_buf(),
                source,
            })?;
        Self::new(file.secrets)
    }

    /// Load a manifest from a YAML file
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::Read` when the file cannot be read, otherwise
    /// the errors of [`Manifest::from_yaml_str`].
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content, path)
    }

    #[must_use]
    pub fn entries(&self) -> &[SecretManifestEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Validate a Docker secret name
///
/// Docker accepts 1-64 characters, starting with an alphanumeric character,
/// followed by alphanumerics, `_`, `.` or `-`.
///
/// # Errors
///
/// Returns `ManifestError::InvalidName` describing the violated rule.
pub fn validate_secret_name(name: &str) -> Result<(), ManifestError> {
    let invalid = |reason: &str| ManifestError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.len() > MAX_SECRET_NAME_LEN {
        return Err(invalid(&format!(
            "name is longer than {MAX_SECRET_NAME_LEN} characters"
        )));
    }
    if !SECRET_NAME_PATTERN.is_match(name) {
        return Err(invalid(
            "must start with a letter or digit and contain only letters, digits, '_', '.' or '-'",
        ));
    }
    Ok(())
}
