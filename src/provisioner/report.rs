//! # Provisioning Report
//!
//! Per-entry outcomes of a run, in manifest order.
//!
//! The report alone must tell an operator which secrets were created or
//! replaced, which were skipped and why, and which failed and why. Secret
//! content never appears in it; a SHA-256 digest and byte count identify what
//! was stored.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Outcome of a single manifest entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryOutcome {
    /// The secret now holds the source file's bytes
    Success {
        /// A previous secret with this name was removed first
        replaced: bool,
        bytes: usize,
        sha256: String,
    },
    /// Source file absent; the store was not touched for this name
    Skipped { reason: String },
    /// A store or read error; other entries were still attempted
    Failed { reason: String },
}

impl EntryOutcome {
    /// Metric label / short status
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryOutcome::Success { replaced: true, .. } => "replaced",
            EntryOutcome::Success { replaced: false, .. } => "created",
            EntryOutcome::Skipped { .. } => "skipped",
            EntryOutcome::Failed { .. } => "failed",
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, EntryOutcome::Success { .. })
    }

    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self, EntryOutcome::Skipped { .. })
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, EntryOutcome::Failed { .. })
    }
}

/// One line of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryReport {
    pub name: String,
    pub source_path: PathBuf,
    #[serde(flatten)]
    pub outcome: EntryOutcome,
}

/// Aggregate counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Result of a completed provisioning run
#[derive(Debug, Clone, Serialize)]
pub struct ProvisioningReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub entries: Vec<EntryReport>,
}

impl Default for ProvisioningReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ProvisioningReport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            entries: Vec::new(),
        }
    }

    pub fn record(&mut self, name: &str, source_path: PathBuf, outcome: EntryOutcome) {
        self.entries.push(EntryReport {
            name: name.to_string(),
            source_path,
            outcome,
        });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Look up an entry by secret name
    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&EntryReport> {
        self.entries.iter().find(|e| e.name == name)
    }

    #[must_use]
    pub fn summary(&self) -> ReportSummary {
        self.entries
            .iter()
            .fold(ReportSummary::default(), |mut summary, entry| {
                summary.total += 1;
                match entry.outcome {
                    EntryOutcome::Success { .. } => summary.succeeded += 1,
                    EntryOutcome::Skipped { .. } => summary.skipped += 1,
                    EntryOutcome::Failed { .. } => summary.failed += 1,
                }
                summary
            })
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.entries.iter().any(|e| e.outcome.is_failed())
    }

    /// Render as pretty JSON
    ///
    /// # Errors
    ///
    /// Returns the serializer error (not expected for this type).
    pub fn to_json(&self) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct JsonReport<'a> {
            #[serde(flatten)]
            report: &'a ProvisioningReport,
            summary: ReportSummary,
        }
        serde_json::to_string_pretty(&JsonReport {
            report: self,
            summary: self.summary(),
        })
    }
}

impl fmt::Display for EntryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            EntryOutcome::Success {
                replaced,
                bytes,
                sha256,
            } => {
                let verb = if *replaced {
                    "replaced (already existed)"
                } else {
                    "created"
                };
                let short = sha256.get(..12).unwrap_or(sha256);
                write!(
                    f,
                    "✔ {:<32} {verb} from {} ({bytes} bytes, sha256 {short})",
                    self.name,
                    self.source_path.display()
                )
            }
            EntryOutcome::Skipped { reason } => {
                write!(f, "⚠ {:<32} skipped: {reason}", self.name)
            }
            EntryOutcome::Failed { reason } => {
                write!(f, "✗ {:<32} failed: {reason}", self.name)
            }
        }
    }
}

impl fmt::Display for ProvisioningReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        let summary = self.summary();
        write!(
            f,
            "{} secrets: {} provisioned, {} skipped, {} failed",
            summary.total, summary.succeeded, summary.skipped, summary.failed
        )
    }
}
