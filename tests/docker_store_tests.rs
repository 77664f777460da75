//! Docker CLI backend against a scripted `docker` stand-in
//!
//! The stand-in keeps one file per secret in a state directory and logs
//! every invocation, so tests can check both store contents and the exact
//! commands issued.

#![cfg(unix)]

mod common;

use common::{init_tracing, write_script};
use std::path::{Path, PathBuf};
use std::time::Duration;
use swarm_secret_provisioner::cli::{provision_command, OutputFormat};
use swarm_secret_provisioner::config::ProvisionerConfig;
use swarm_secret_provisioner::constants::{
    EXIT_MANIFEST_ROOT, EXIT_NOT_MANAGER, EXIT_OK, EXIT_STRICT_FAILURES,
};
use swarm_secret_provisioner::manifest::{Manifest, SecretManifestEntry};
use swarm_secret_provisioner::source::ReadPrivilege;
use swarm_secret_provisioner::provisioner::{EntryOutcome, ProvisionError, Provisioner};
use swarm_secret_provisioner::source::LocalReader;
use swarm_secret_provisioner::store::{DockerSwarmStore, ManagerProbe, SecretStore, StoreError};
use tempfile::TempDir;

struct FakeSwarm {
    dir: TempDir,
    docker: PathBuf,
}

impl FakeSwarm {
    fn manager() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().display().to_string();
        let body = format!(
            r#"ROOT="{root}"
mkdir -p "$ROOT/state"
echo "$*" >> "$ROOT/calls"
printf '%s' "${{DOCKER_HOST:-}}" > "$ROOT/docker_host"
case "$1 $2" in
  "node ls")
    if [ -f "$ROOT/worker" ]; then
      echo "Error response from daemon: This node is not a swarm manager." >&2
      exit 1
    fi
    echo node1 ;;
  "secret inspect")
    if [ -f "$ROOT/state/$5" ]; then echo "id-$5"; else
      echo "Error response from daemon: no such secret: $5" >&2
      exit 1
    fi ;;
  "secret rm")
    if [ -f "$ROOT/broken-rm" ]; then echo "secret is in use by service" >&2; exit 1; fi
    rm "$ROOT/state/$3" 2>/dev/null || {{ echo "Error: No such secret: $3" >&2; exit 1; }}
    echo "$3" ;;
  "secret create")
    if [ -f "$ROOT/state/$3" ]; then
      echo "Error response from daemon: rpc error: code = AlreadyExists desc = secret $3 already exists" >&2
      exit 1
    fi
    cat > "$ROOT/state/$3"
    echo "id-$3" ;;
  *)
    echo "unexpected: $*" >&2
    exit 64 ;;
esac"#
        );
        let docker = write_script(dir.path(), "docker", &body);
        Self { dir, docker }
    }

    fn worker() -> Self {
        let swarm = Self::manager();
        std::fs::write(swarm.dir.path().join("worker"), b"").unwrap();
        swarm
    }

    fn store(&self) -> DockerSwarmStore {
        DockerSwarmStore::new(self.docker.display().to_string(), Duration::from_secs(10))
    }

    fn seed(&self, name: &str, content: &[u8]) {
        let state = self.dir.path().join("state");
        std::fs::create_dir_all(&state).unwrap();
        std::fs::write(state.join(name), content).unwrap();
    }

    fn secret(&self, name: &str) -> Option<Vec<u8>> {
        std::fs::read(self.dir.path().join("state").join(name)).ok()
    }

    fn calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.dir.path().join("calls"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// `DOCKER_HOST` as seen by the last docker invocation
    fn last_docker_host(&self) -> String {
        std::fs::read_to_string(self.dir.path().join("docker_host")).unwrap()
    }

    /// Configuration a `swarm-secrets provision --no-sudo --root ROOT` run would use
    fn config(&self, root: &Path) -> ProvisionerConfig {
        ProvisionerConfig {
            manifest_root: root.to_path_buf(),
            docker_binary: self.docker.display().to_string(),
            read_privilege: ReadPrivilege::Invoker,
            command_timeout_secs: 10,
            ..ProvisionerConfig::default()
        }
    }

    fn break_remove(&self) {
        std::fs::write(self.dir.path().join("broken-rm"), b"").unwrap();
    }
}

fn source_dir(files: &[(&str, &[u8])]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, content) in files {
        std::fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

#[tokio::test]
async fn test_store_operations() {
    init_tracing();
    let swarm = FakeSwarm::manager();
    let store = swarm.store();

    assert!(!store.exists("cert-a").await.unwrap());
    store.create("cert-a", b"AAA\n\x00binary").await.unwrap();
    assert!(store.exists("cert-a").await.unwrap());
    assert_eq!(swarm.secret("cert-a").unwrap(), b"AAA\n\x00binary".to_vec());

    store.remove("cert-a").await.unwrap();
    assert!(!store.exists("cert-a").await.unwrap());

    assert_eq!(
        swarm.calls(),
        vec![
            "secret inspect --format {{.ID}} cert-a",
            "secret create cert-a -",
            "secret inspect --format {{.ID}} cert-a",
            "secret rm cert-a",
            "secret inspect --format {{.ID}} cert-a",
        ]
    );
}

#[tokio::test]
async fn test_create_existing_name_reports_docker_error() {
    init_tracing();
    let swarm = FakeSwarm::manager();
    swarm.seed("cert-a", b"old");

    let err = swarm.store().create("cert-a", b"new").await.unwrap_err();

    match err {
        StoreError::CommandFailed { stderr, .. } => assert!(stderr.contains("already exists")),
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(swarm.secret("cert-a").unwrap(), b"old".to_vec());
}

#[tokio::test]
async fn test_manager_probe() {
    init_tracing();
    assert!(FakeSwarm::manager().store().verify_manager().await.is_ok());

    let err = FakeSwarm::worker().store().verify_manager().await.unwrap_err();
    assert!(err.to_string().contains("not a swarm manager"));
}

#[tokio::test]
async fn test_missing_docker_binary() {
    init_tracing();
    let store = DockerSwarmStore::new("/nonexistent/bin/docker", Duration::from_secs(1));
    assert!(matches!(
        store.verify_manager().await,
        Err(StoreError::CommandUnavailable { .. })
    ));
}

#[tokio::test]
async fn test_end_to_end_provisioning() {
    init_tracing();
    let swarm = FakeSwarm::manager();
    swarm.seed("cert-a", b"previous");
    let sources = source_dir(&[("a.pem", b"AAA")]);
    let manifest = Manifest::new(vec![
        SecretManifestEntry::new("cert-a", "a.pem"),
        SecretManifestEntry::new("cert-b", "missing.pem"),
    ])
    .unwrap();
    let store = swarm.store();
    let provisioner = Provisioner::new(&store, &store, &LocalReader, sources.path());

    let report = provisioner.provision(&manifest).await.unwrap();

    assert!(matches!(
        report.entry("cert-a").unwrap().outcome,
        EntryOutcome::Success { replaced: true, .. }
    ));
    assert!(report.entry("cert-b").unwrap().outcome.is_skipped());
    assert_eq!(swarm.secret("cert-a").unwrap(), b"AAA".to_vec());
    assert!(swarm.secret("cert-b").is_none());
    assert!(!swarm.calls().iter().any(|c| c.contains("cert-b")));
}

#[tokio::test]
async fn test_remove_failure_is_reported_per_entry() {
    init_tracing();
    let swarm = FakeSwarm::manager();
    swarm.seed("cert-a", b"previous");
    swarm.break_remove();
    let sources = source_dir(&[("a.pem", b"AAA"), ("b.pem", b"BBB")]);
    let manifest = Manifest::new(vec![
        SecretManifestEntry::new("cert-a", "a.pem"),
        SecretManifestEntry::new("cert-b", "b.pem"),
    ])
    .unwrap();
    let store = swarm.store();
    let provisioner = Provisioner::new(&store, &store, &LocalReader, sources.path());

    let report = provisioner.provision(&manifest).await.unwrap();

    match &report.entry("cert-a").unwrap().outcome {
        EntryOutcome::Failed { reason } => {
            assert!(reason.contains("already exists"));
            assert!(reason.contains("in use by service"));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(swarm.calls().contains(&"secret create cert-a -".to_string()));
    assert_eq!(swarm.secret("cert-b").unwrap(), b"BBB".to_vec());
}

#[tokio::test]
async fn test_worker_node_is_fatal() {
    init_tracing();
    let swarm = FakeSwarm::worker();
    let sources = source_dir(&[("a.pem", b"AAA")]);
    let manifest = Manifest::new(vec![SecretManifestEntry::new("cert-a", "a.pem")]).unwrap();
    let store = swarm.store();
    let provisioner = Provisioner::new(&store, &store, &LocalReader, sources.path());

    let err = provisioner.provision(&manifest).await.unwrap_err();

    assert!(matches!(err, ProvisionError::NotManager(_)));
    assert_eq!(swarm.calls(), vec!["node ls --format {{.ID}}"]);
}

#[tokio::test]
async fn test_missing_root_after_successful_probe() {
    init_tracing();
    let swarm = FakeSwarm::manager();
    let manifest = Manifest::new(vec![SecretManifestEntry::new("cert-a", "a.pem")]).unwrap();
    let store = swarm.store();
    let root = Path::new("/nonexistent/swarm-secrets-config");
    let provisioner = Provisioner::new(&store, &store, &LocalReader, root);

    let err = provisioner.provision(&manifest).await.unwrap_err();

    assert!(matches!(err, ProvisionError::ManifestRootMissing(_)));
    assert_eq!(swarm.calls(), vec!["node ls --format {{.ID}}"]);
}

#[tokio::test]
async fn test_rejected_create_keeps_docker_stderr_for_large_payloads() {
    init_tracing();
    let swarm = FakeSwarm::manager();
    swarm.seed("cert-a", b"old");
    let payload = vec![b'A'; 1 << 20];

    let err = swarm.store().create("cert-a", &payload).await.unwrap_err();

    match err {
        StoreError::CommandFailed { stderr, .. } => assert!(stderr.contains("already exists")),
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(swarm.secret("cert-a").unwrap(), b"old".to_vec());
}

#[tokio::test]
async fn test_large_payload_is_stored_intact() {
    init_tracing();
    let swarm = FakeSwarm::manager();
    let payload: Vec<u8> = (0..(1u32 << 20))
        .map(|i| u8::try_from(i % 251).unwrap())
        .collect();

    swarm.store().create("big", &payload).await.unwrap();

    assert_eq!(swarm.secret("big").unwrap(), payload);
}

#[tokio::test]
async fn test_configured_host_reaches_docker() {
    init_tracing();
    let swarm = FakeSwarm::manager();
    let store = swarm.store().with_host("tcp://manager-1:2376");

    store.verify_manager().await.unwrap();
    assert_eq!(swarm.last_docker_host(), "tcp://manager-1:2376");

    store.exists("cert-a").await.unwrap();
    assert_eq!(swarm.last_docker_host(), "tcp://manager-1:2376");
}

#[tokio::test]
async fn test_host_from_config_reaches_docker() {
    init_tracing();
    let swarm = FakeSwarm::manager();
    let mut config = swarm.config(Path::new("/unused"));
    config.docker_host = Some("ssh://ops@manager-2".to_string());

    config.docker_store().verify_manager().await.unwrap();

    assert_eq!(swarm.last_docker_host(), "ssh://ops@manager-2");
}

fn cert_manifest() -> Manifest {
    Manifest::new(vec![
        SecretManifestEntry::new("cert-a", "a.pem"),
        SecretManifestEntry::new("cert-b", "missing.pem"),
    ])
    .unwrap()
}

#[tokio::test]
async fn test_provision_command_exits_zero_on_completed_run() {
    init_tracing();
    let swarm = FakeSwarm::manager();
    let sources = source_dir(&[("a.pem", b"AAA")]);
    let config = swarm.config(sources.path());

    let first = provision_command(&config, &cert_manifest(), OutputFormat::Text, false).await;
    let second = provision_command(&config, &cert_manifest(), OutputFormat::Json, false).await;

    assert_eq!(first, EXIT_OK);
    assert_eq!(second, EXIT_OK);
    assert_eq!(swarm.secret("cert-a").unwrap(), b"AAA".to_vec());
    assert!(swarm.secret("cert-b").is_none());
}

#[tokio::test]
async fn test_provision_command_failed_entries_exit_code() {
    init_tracing();
    let swarm = FakeSwarm::manager();
    swarm.seed("cert-a", b"previous");
    swarm.break_remove();
    let sources = source_dir(&[("a.pem", b"AAA")]);
    let config = swarm.config(sources.path());

    let lenient = provision_command(&config, &cert_manifest(), OutputFormat::Text, false).await;
    let strict = provision_command(&config, &cert_manifest(), OutputFormat::Text, true).await;

    assert_eq!(lenient, EXIT_OK);
    assert_eq!(strict, EXIT_STRICT_FAILURES);
    assert_eq!(swarm.secret("cert-a").unwrap(), b"previous".to_vec());
}

#[tokio::test]
async fn test_provision_command_on_worker_node() {
    init_tracing();
    let swarm = FakeSwarm::worker();
    let sources = source_dir(&[("a.pem", b"AAA")]);
    let config = swarm.config(sources.path());

    let code = provision_command(&config, &cert_manifest(), OutputFormat::Text, false).await;

    assert_eq!(code, EXIT_NOT_MANAGER);
    assert_eq!(swarm.calls(), vec!["node ls --format {{.ID}}"]);
}

#[tokio::test]
async fn test_provision_command_without_docker() {
    init_tracing();
    let sources = source_dir(&[("a.pem", b"AAA")]);
    let config = ProvisionerConfig {
        manifest_root: sources.path().to_path_buf(),
        docker_binary: "/nonexistent/bin/docker".to_string(),
        read_privilege: ReadPrivilege::Invoker,
        ..ProvisionerConfig::default()
    };

    let code = provision_command(&config, &cert_manifest(), OutputFormat::Text, false).await;

    assert_eq!(code, EXIT_NOT_MANAGER);
}

#[tokio::test]
async fn test_provision_command_with_missing_root() {
    init_tracing();
    let swarm = FakeSwarm::manager();
    let config = swarm.config(Path::new("/nonexistent/swarm-secrets-config"));

    let code = provision_command(&config, &cert_manifest(), OutputFormat::Text, true).await;

    assert_eq!(code, EXIT_MANIFEST_ROOT);
    assert_eq!(swarm.calls(), vec!["node ls --format {{.ID}}"]);
}
