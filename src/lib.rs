//! # Swarm Secret Provisioner
//!
//! Pushes certificates, private keys and configuration files into Docker
//! Swarm as secrets, so a stack can reference them by name.
//!
//! A run is idempotent and convergent: every manifest entry whose source file
//! exists ends up as a secret holding exactly that file's bytes, whether or
//! not the secret existed before. Entries with a missing source are skipped,
//! entries that fail are reported, and neither stops the rest of the run.
//!
//! ## Layout
//!
//! - [`manifest`] - secret name to source path mapping (built-in Wazuh set or YAML)
//! - [`store`] - secret store boundary, docker CLI and in-memory backends
//! - [`source`] - source file readers at an explicit privilege level
//! - [`provisioner`] - the run itself and its report
//! - [`config`] - environment configuration
//! - [`observability`] - tracing setup and Prometheus metrics
//! - [`cli`] - `swarm-secrets` command line

pub mod cli;
pub mod config;
pub mod constants;
pub mod manifest;
pub mod observability;
pub mod process;
pub mod provisioner;
pub mod source;
pub mod store;

pub use manifest::{Manifest, SecretManifestEntry};
pub use provisioner::{EntryOutcome, ProvisionError, Provisioner, ProvisioningReport};
pub use source::{ReadPrivilege, SourceReader};
pub use store::{ManagerProbe, SecretStore};
