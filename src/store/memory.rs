//! # In-Memory Secret Store
//!
//! Ephemeral store implementing the same surface as the swarm backend.
//! Used by tests and by embedders that want to dry-run a manifest.
//!
//! Every call is recorded in an operation log so callers can assert exactly
//! which store calls a run made. Failures can be injected per name and
//! operation.

use super::{ManagerProbe, SecretStore, StoreError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Store operation, as recorded in the operation log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Probe,
    Exists,
    Remove,
    Create,
}

#[derive(Debug, Default)]
struct State {
    secrets: HashMap<String, Vec<u8>>,
    operations: Vec<(StoreOperation, String)>,
    failures: HashSet<(StoreOperation, String)>,
    manager: bool,
}

/// In-memory secret store with a recorded operation log
///
/// Thread-safe using `Arc<RwLock>`; clones share the same state.
#[derive(Clone, Debug)]
pub struct InMemorySecretStore {
    state: Arc<RwLock<State>>,
}

impl Default for InMemorySecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySecretStore {
    /// Empty store that answers the manager probe successfully
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State {
                manager: true,
                ..State::default()
            })),
        }
    }

    /// Empty store that behaves like a worker node
    #[must_use]
    pub fn worker() -> Self {
        Self {
            state: Arc::new(RwLock::new(State::default())),
        }
    }

    /// Seed a secret without recording an operation
    pub async fn insert(&self, name: &str, value: &[u8]) {
        self.state
            .write()
            .await
            .secrets
            .insert(name.to_string(), value.to_vec());
    }

    /// Make every future `operation` on `name` fail
    pub async fn fail_on(&self, operation: StoreOperation, name: &str) {
        self.state
            .write()
            .await
            .failures
            .insert((operation, name.to_string()));
    }

    pub async fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.state.read().await.secrets.get(name).cloned()
    }

    /// Snapshot of every stored secret
    pub async fn snapshot(&self) -> HashMap<String, Vec<u8>> {
        self.state.read().await.secrets.clone()
    }

    /// Operations recorded so far, in call order
    pub async fn operations(&self) -> Vec<(StoreOperation, String)> {
        self.state.read().await.operations.clone()
    }

    /// Operations that changed store contents
    pub async fn mutations(&self) -> Vec<(StoreOperation, String)> {
        self.operations()
            .await
            .into_iter()
            .filter(|(op, _)| matches!(op, StoreOperation::Remove | StoreOperation::Create))
            .collect()
    }

    fn injected(state: &State, operation: StoreOperation, name: &str) -> Result<(), StoreError> {
        if state.failures.contains(&(operation, name.to_string())) {
            return Err(StoreError::Rejected(format!(
                "injected {operation:?} failure for {name}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn exists(&self, name: &str) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        state
            .operations
            .push((StoreOperation::Exists, name.to_string()));
        Self::injected(&state, StoreOperation::Exists, name)?;
        Ok(state.secrets.contains_key(name))
    }

    async fn remove(&self, name: &str) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state
            .operations
            .push((StoreOperation::Remove, name.to_string()));
        Self::injected(&state, StoreOperation::Remove, name)?;
        if state.secrets.remove(name).is_none() {
            return Err(StoreError::Rejected(format!("no such secret: {name}")));
        }
        debug!("Removed in-memory secret: {}", name);
        Ok(())
    }

    async fn create(&self, name: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state
            .operations
            .push((StoreOperation::Create, name.to_string()));
        Self::injected(&state, StoreOperation::Create, name)?;
        if state.secrets.contains_key(name) {
            return Err(StoreError::Rejected(format!("secret {name} already exists")));
        }
        state.secrets.insert(name.to_string(), value.to_vec());
        debug!("Created in-memory secret: {} ({} bytes)", name, value.len());
        Ok(())
    }
}

#[async_trait]
impl ManagerProbe for InMemorySecretStore {
    async fn verify_manager(&self) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.operations.push((StoreOperation::Probe, String::new()));
        if state.manager {
            Ok(())
        } else {
            Err(StoreError::Rejected(
                "this node is not a swarm manager".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_rejects_existing_name() {
        let store = InMemorySecretStore::new();
        store.create("a", b"one").await.unwrap();
        let err = store.create("a", b"two").await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(store.get("a").await.unwrap(), b"one".to_vec());
    }

    #[tokio::test]
    async fn test_remove_missing_secret_fails() {
        let store = InMemorySecretStore::new();
        assert!(store.remove("ghost").await.is_err());
    }

    #[tokio::test]
    async fn test_injected_failure_leaves_state_untouched() {
        let store = InMemorySecretStore::new();
        store.insert("a", b"old").await;
        store.fail_on(StoreOperation::Remove, "a").await;
        assert!(store.remove("a").await.is_err());
        assert_eq!(store.get("a").await.unwrap(), b"old".to_vec());
    }

    #[tokio::test]
    async fn test_worker_fails_probe() {
        assert!(InMemorySecretStore::worker().verify_manager().await.is_err());
        assert!(InMemorySecretStore::new().verify_manager().await.is_ok());
    }

    #[tokio::test]
    async fn test_operations_are_recorded_in_order() {
        let store = InMemorySecretStore::new();
        store.exists("a").await.unwrap();
        store.create("a", b"x").await.unwrap();
        store.remove("a").await.unwrap();
        assert_eq!(
            store.operations().await,
            vec![
                (StoreOperation::Exists, "a".to_string()),
                (StoreOperation::Create, "a".to_string()),
                (StoreOperation::Remove, "a".to_string()),
            ]
        );
        assert_eq!(store.mutations().await.len(), 2);
    }
}
