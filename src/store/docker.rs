//! # Docker Swarm Secret Store
//!
//! Drives swarm secrets through the `docker` CLI.
//!
//! | Operation | Command |
//! |---|---|
//! | manager probe | `docker node ls --format {{.ID}}` |
//! | exists | `docker secret inspect --format {{.ID}} NAME` |
//! | remove | `docker secret rm NAME` |
//! | create | `docker secret create NAME -` (content on stdin) |
//!
//! `docker node ls` is used as the probe because the swarm API only serves
//! it from a manager node. Swarm secrets are immutable, so there is no
//! update call to offer.
//!
//! When a host is configured it is passed to every call as `DOCKER_HOST`.

use super::{ManagerProbe, SecretStore, StoreError};
use crate::observability::metrics;
use crate::process::{self, CommandError, CommandOutput};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, Instrument};

/// Whether `docker secret inspect` stderr says `name` does not exist
///
/// The CLI prints `No such secret: NAME`; newer daemons answer
/// `secret NAME not found`. Other "not found" errors (contexts, hosts) are
/// real failures.
fn is_secret_not_found(stderr: &str, name: &str) -> bool {
    let stderr = stderr.to_lowercase();
    let name = name.to_lowercase();
    stderr.contains("no such secret") || stderr.contains(&format!("secret {name} not found"))
}

/// Swarm secret store backed by the docker CLI
#[derive(Debug, Clone)]
pub struct DockerSwarmStore {
    docker_binary: String,
    host: Option<String>,
    timeout: Duration,
}

impl DockerSwarmStore {
    #[must_use]
    pub fn new(docker_binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            docker_binary: docker_binary.into(),
            host: None,
            timeout,
        }
    }

    /// Talk to the daemon at `host` (`DOCKER_HOST` syntax)
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Resolve the docker binary on `PATH`
    ///
    /// # Errors
    ///
    /// Returns `StoreError::CommandUnavailable` when docker cannot be found.
    pub fn docker_path(&self) -> Result<PathBuf, StoreError> {
        process::resolve_binary(&self.docker_binary).map_err(|e| StoreError::CommandUnavailable {
            binary: self.docker_binary.clone(),
            reason: e.to_string(),
        })
    }

    async fn docker(
        &self,
        operation: &'static str,
        args: &[&str],
        stdin: Option<&[u8]>,
    ) -> Result<CommandOutput, StoreError> {
        let docker = self.docker_path()?;
        let start = Instant::now();
        let envs: Vec<(&str, &str)> = self
            .host
            .as_deref()
            .map(|host| ("DOCKER_HOST", host))
            .into_iter()
            .collect();
        let result = process::run(&docker, args, &envs, stdin, self.timeout).await;
        metrics::observe_store_operation(operation, start.elapsed().as_secs_f64());

        result.map_err(|e| {
            metrics::increment_store_operation_errors(operation);
            match e {
                CommandError::Io { source, .. } => StoreError::Io(source),
                CommandError::Timeout { command, timeout } => {
                    StoreError::Timeout { command, timeout }
                }
            }
        })
    }

    fn failed(operation: &'static str, output: &CommandOutput) -> StoreError {
        metrics::increment_store_operation_errors(operation);
        StoreError::CommandFailed {
            command: output.command.clone(),
            status: output.status.clone(),
            stderr: output.stderr_lossy(),
        }
    }
}

#[async_trait]
impl SecretStore for DockerSwarmStore {
    async fn exists(&self, name: &str) -> Result<bool, StoreError> {
        let span = tracing::debug_span!("docker.secret.inspect", secret.name = name);
        async move {
            let output = self
                .docker("inspect", &["secret", "inspect", "--format", "{{.ID}}", name], None)
                .await?;
            if output.success {
                debug!("Swarm secret {} exists (id {})", name, output.stdout_lossy());
                return Ok(true);
            }
            if is_secret_not_found(&output.stderr_lossy(), name) {
                debug!("Swarm secret {} does not exist", name);
                Ok(false)
            } else {
                Err(Self::failed("inspect", &output))
            }
        }
        .instrument(span)
        .await
    }

    async fn remove(&self, name: &str) -> Result<(), StoreError> {
        let span = info_span!("docker.secret.rm", secret.name = name);
        async move {
            info!("Removing swarm secret: {}", name);
            let output = self.docker("rm", &["secret", "rm", name], None).await?;
            if output.success {
                Ok(())
            } else {
                Err(Self::failed("rm", &output))
            }
        }
        .instrument(span)
        .await
    }

    async fn create(&self, name: &str, value: &[u8]) -> Result<(), StoreError> {
        let span = info_span!(
            "docker.secret.create",
            secret.name = name,
            secret.bytes = value.len()
        );
        async move {
            info!("Creating swarm secret: {}", name);
            let output = self
                .docker("create", &["secret", "create", name, "-"], Some(value))
                .await?;
            if output.success {
                debug!("Swarm secret {} created (id {})", name, output.stdout_lossy());
                Ok(())
            } else {
                Err(Self::failed("create", &output))
            }
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl ManagerProbe for DockerSwarmStore {
    async fn verify_manager(&self) -> Result<(), StoreError> {
        let output = self
            .docker("probe", &["node", "ls", "--format", "{{.ID}}"], None)
            .await?;
        if output.success {
            debug!("Swarm manager probe succeeded");
            Ok(())
        } else {
            Err(Self::failed("probe", &output))
        }
    }
}
