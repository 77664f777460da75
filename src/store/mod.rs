//! # Secret Stores
//!
//! The secret store is the only persisted state a provisioning run touches.
//! It is consumed through three operations and nothing else:
//!
//! - `exists` - is a secret with this name present?
//! - `remove` - delete the secret
//! - `create` - create the secret from raw bytes
//!
//! There is no update-in-place. Replacement is always remove-then-create.
//!
//! Before any mutation the provisioner asks a [`ManagerProbe`] to prove the
//! caller holds cluster-administrative rights.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub mod docker;
pub mod memory;

pub use docker::DockerSwarmStore;
pub use memory::InMemorySecretStore;

/// Errors returned by secret store backends
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{binary} not found in PATH: {reason}")]
    CommandUnavailable { binary: String, reason: String },
    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("`{command}` timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },
    #[error("I/O error talking to the secret store: {0}")]
    Io(#[from] std::io::Error),
    #[error("secret store rejected the request: {0}")]
    Rejected(String),
}

/// Secret store boundary
///
/// Names are cluster-wide unique strings; values are opaque byte blobs.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Check whether a secret with this name exists
    async fn exists(&self, name: &str) -> Result<bool, StoreError>;

    /// Remove a secret
    async fn remove(&self, name: &str) -> Result<(), StoreError>;

    /// Create a secret; fails if the name is already taken
    async fn create(&self, name: &str, value: &[u8]) -> Result<(), StoreError>;
}

/// Manager-capability probe
///
/// Must run an operation that only succeeds with cluster-manager privilege.
#[async_trait]
pub trait ManagerProbe: Send + Sync {
    async fn verify_manager(&self) -> Result<(), StoreError>;
}
