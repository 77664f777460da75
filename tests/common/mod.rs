//! Common test utilities for provisioner tests
//!
//! Provides a scripted source reader, a tracing setup shared by every test,
//! and helpers for fake executables.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once};
use swarm_secret_provisioner::source::{ReadPrivilege, SecretBytes, SourceError, SourceReader};
use zeroize::Zeroizing;

static TRACING_INIT: Once = Once::new();

/// Initialize a test subscriber once per test binary
///
/// Output goes through the libtest writer so it only shows for failing tests.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("swarm_secret_provisioner=debug"))
            .with_test_writer()
            .try_init();
    });
}

/// Source reader backed by a path map
///
/// Directories are modelled as a set of paths that exist but have no content.
#[derive(Debug)]
pub struct FakeReader {
    privilege: ReadPrivilege,
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
    dirs: HashSet<PathBuf>,
    denied: HashSet<PathBuf>,
    calls: Mutex<Vec<(&'static str, PathBuf)>>,
}

impl FakeReader {
    pub fn new(privilege: ReadPrivilege) -> Self {
        Self {
            privilege,
            files: Mutex::new(HashMap::new()),
            dirs: HashSet::new(),
            denied: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Elevated reader where `root` exists as a directory
    pub fn with_root(root: &str) -> Self {
        Self::new(ReadPrivilege::Elevated).dir(root)
    }

    #[must_use]
    pub fn dir(mut self, path: &str) -> Self {
        self.dirs.insert(PathBuf::from(path));
        self
    }

    #[must_use]
    pub fn file(self, path: &str, content: &[u8]) -> Self {
        self.write(path, content);
        self
    }

    /// Paths that exist but fail to read (e.g. sudo refused)
    #[must_use]
    pub fn denied(mut self, path: &str) -> Self {
        self.denied.insert(PathBuf::from(path));
        self
    }

    /// Change a file's content between runs
    pub fn write(&self, path: &str, content: &[u8]) {
        self.files
            .lock()
            .unwrap()
            .insert(PathBuf::from(path), content.to_vec());
    }

    /// Every reader call, in order
    pub fn calls(&self) -> Vec<(&'static str, PathBuf)> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str, path: &Path) {
        self.calls.lock().unwrap().push((call, path.to_path_buf()));
    }
}

#[async_trait]
impl SourceReader for FakeReader {
    fn privilege(&self) -> ReadPrivilege {
        self.privilege
    }

    async fn exists(&self, path: &Path) -> Result<bool, SourceError> {
        self.record("exists", path);
        Ok(self.dirs.contains(path)
            || self.denied.contains(path)
            || self.files.lock().unwrap().contains_key(path))
    }

    async fn read(&self, path: &Path) -> Result<SecretBytes, SourceError> {
        self.record("read", path);
        if self.denied.contains(path) {
            return Err(SourceError::Elevation {
                path: path.to_path_buf(),
                reason: "sudo: a password is required".to_string(),
            });
        }
        self.files
            .lock()
            .unwrap()
            .get(path)
            .map(|content| Zeroizing::new(content.clone()))
            .ok_or_else(|| SourceError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
    }
}

/// Write an executable shell script into `dir`
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
