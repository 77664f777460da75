//! # Secret Provisioner
//!
//! Pushes every manifest entry into the secret store, replacing any existing
//! secret of the same name.
//!
//! ## Run order
//!
//! 1. **Manager probe** - must succeed or the run aborts before any store call
//! 2. **Manifest root** - must exist (checked at the reader's privilege)
//! 3. **Entries** - strictly sequential, in manifest order:
//!    - source absent → SKIPPED, store untouched
//!    - secret exists → remove (a failed remove is logged, create still runs)
//!    - create from the file bytes → SUCCESS or FAILED
//!
//! A failed entry never stops later entries. There are no retries; re-running
//! the whole procedure is safe because every run converges to the same store
//! contents.
//!
//! ## Replacement
//!
//! Existing secrets are always removed and recreated, even when the content is
//! unchanged. Callers rely on every successful entry holding exactly the bytes
//! read during this run. Swarm secrets cannot be read back or updated in place,
//! so between remove and create the name is briefly absent.

use crate::manifest::{Manifest, SecretManifestEntry};
use crate::observability::metrics;
use crate::source::SourceReader;
use crate::store::{ManagerProbe, SecretStore};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};

pub mod error;
pub mod report;

pub use error::ProvisionError;
pub use report::{EntryOutcome, EntryReport, ProvisioningReport, ReportSummary};

/// Provisions a manifest into a secret store
///
/// The store, the manager probe and the source reader are injected so a run
/// can be exercised against in-memory fakes.
pub struct Provisioner<'a> {
    store: &'a dyn SecretStore,
    probe: &'a dyn ManagerProbe,
    reader: &'a dyn SourceReader,
    manifest_root: PathBuf,
}

impl std::fmt::Debug for Provisioner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provisioner")
            .field("manifest_root", &self.manifest_root)
            .field("privilege", &self.reader.privilege())
            .finish_non_exhaustive()
    }
}

impl<'a> Provisioner<'a> {
    #[must_use]
    pub fn new(
        store: &'a dyn SecretStore,
        probe: &'a dyn ManagerProbe,
        reader: &'a dyn SourceReader,
        manifest_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            probe,
            reader,
            manifest_root: manifest_root.into(),
        }
    }

    #[must_use]
    pub fn manifest_root(&self) -> &Path {
        &self.manifest_root
    }

    /// Run the two fatal preconditions: manager probe, then manifest root
    ///
    /// # Errors
    ///
    /// Returns `ProvisionError` when either precondition fails.
    pub async fn preflight(&self) -> Result<(), ProvisionError> {
        self.probe
            .verify_manager()
            .await
            .map_err(ProvisionError::NotManager)?;
        info!("Swarm manager capability verified");

        match self.reader.exists(&self.manifest_root).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(ProvisionError::ManifestRootMissing(
                self.manifest_root.clone(),
            )),
            Err(source) => Err(ProvisionError::ManifestRootUnreadable {
                path: self.manifest_root.clone(),
                source,
            }),
        }
    }

    /// Provision every manifest entry
    ///
    /// # Errors
    ///
    /// Returns `ProvisionError` only for the fatal preconditions; per-entry
    /// failures are recorded in the returned report.
    pub async fn provision(&self, manifest: &Manifest) -> Result<ProvisioningReport, ProvisionError> {
        let span = info_span!(
            "provision",
            manifest.entries = manifest.len(),
            manifest.root = %self.manifest_root.display(),
            read.privilege = self.reader.privilege().as_str()
        );
        let start = Instant::now();

        async move {
            self.preflight().await.inspect_err(|e| {
                error!("Provisioning aborted: {}", e);
            })?;

            let mut report = ProvisioningReport::new();
            for entry in manifest.entries() {
                let source_path = entry.resolve(&self.manifest_root);
                let outcome = self.provision_entry(entry, &source_path).await;
                metrics::increment_entries(outcome.as_str());
                report.record(&entry.name, source_path, outcome);
            }
            report.finish();

            let summary = report.summary();
            info!(
                "Provisioning finished: {} provisioned, {} skipped, {} failed",
                summary.succeeded, summary.skipped, summary.failed
            );
            metrics::observe_run_duration(start.elapsed().as_secs_f64());
            metrics::set_last_run_timestamp(chrono::Utc::now().timestamp());
            Ok(report)
        }
        .instrument(span)
        .await
    }

    async fn provision_entry(&self, entry: &SecretManifestEntry, source_path: &Path) -> EntryOutcome {
        let span = info_span!(
            "provision.entry",
            secret.name = %entry.name,
            source.path = %source_path.display()
        );

        async move {
            match self.reader.exists(source_path).await {
                Ok(true) => {}
                Ok(false) => {
                    warn!(
                        "Source for {} not found at {}, skipping",
                        entry.name,
                        source_path.display()
                    );
                    return EntryOutcome::Skipped {
                        reason: format!("source file {} not found", source_path.display()),
                    };
                }
                Err(e) => {
                    error!("Cannot check source for {}: {}", entry.name, e);
                    return EntryOutcome::Failed {
                        reason: e.to_string(),
                    };
                }
            }

            let content = match self.reader.read(source_path).await {
                Ok(content) => content,
                Err(e) => {
                    error!("Cannot read source for {}: {}", entry.name, e);
                    return EntryOutcome::Failed {
                        reason: e.to_string(),
                    };
                }
            };

            let existed = match self.store.exists(&entry.name).await {
                Ok(existed) => existed,
                Err(e) => {
                    warn!(
                        "Could not check whether {} exists, attempting create anyway: {}",
                        entry.name, e
                    );
                    false
                }
            };

            let mut remove_error = None;
            if existed {
                info!("Secret {} already exists, removing before recreate", entry.name);
                if let Err(e) = self.store.remove(&entry.name).await {
                    warn!("Failed to remove existing secret {}: {}", entry.name, e);
                    remove_error = Some(e.to_string());
                }
            }

            match self.store.create(&entry.name, &content).await {
                Ok(()) => {
                    info!(
                        "Secret {} {} ({} bytes)",
                        entry.name,
                        if existed { "replaced" } else { "created" },
                        content.len()
                    );
                    EntryOutcome::Success {
                        replaced: existed,
                        bytes: content.len(),
                        sha256: format!("{:x}", Sha256::digest(content.as_slice())),
                    }
                }
                Err(e) => {
                    error!("Failed to create secret {}: {}", entry.name, e);
                    let reason = match remove_error {
                        Some(remove) => format!("{e} (after failed remove: {remove})"),
                        None => e.to_string(),
                    };
                    EntryOutcome::Failed { reason }
                }
            }
        }
        .instrument(span)
        .await
    }
}
