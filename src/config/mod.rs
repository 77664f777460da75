//! # Provisioner Configuration
//!
//! Run-level settings loaded from environment variables, then overridden by
//! command-line flags.
//!
//! | Variable | Default |
//! |---|---|
//! | `SWARM_SECRETS_ROOT` | `config` |
//! | `SWARM_SECRETS_MANIFEST` | built-in Wazuh manifest |
//! | `DOCKER_BIN` | `docker` |
//! | `DOCKER_HOST` | unset (docker's own default) |
//! | `SUDO_BIN` | `sudo` |
//! | `READ_PRIVILEGE` | `sudo` (`sudo` or `none`) |
//! | `COMMAND_TIMEOUT_SECS` | `30` |
//! | `LOG_LEVEL` | `INFO` |
//! | `LOG_FORMAT` | `text` (`text` or `json`) |
//! | `LOG_ENABLE_COLOR` | `true` |
//! | `METRICS_FILE` | unset |

use crate::constants::{
    DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_DOCKER_BINARY, DEFAULT_MANIFEST_ROOT,
    DEFAULT_SUDO_BINARY,
};
use crate::manifest::{wazuh_default_manifest, Manifest, ManifestError};
use crate::source::ReadPrivilege;
use crate::store::DockerSwarmStore;
use std::path::PathBuf;
use std::time::Duration;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "text" => Some(LogFormat::Text),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Provisioner configuration
///
/// All settings have sensible defaults and can be overridden via environment
/// variables, then by CLI flags.
#[derive(Debug, Clone)]
pub struct ProvisionerConfig {
    /// Directory relative source paths resolve against
    pub manifest_root: PathBuf,
    /// YAML manifest file; the built-in Wazuh manifest is used when unset
    pub manifest_file: Option<PathBuf>,
    /// docker binary name or path
    pub docker_binary: String,
    /// Daemon address passed to docker as `DOCKER_HOST`
    pub docker_host: Option<String>,
    /// sudo binary name or path (used for elevated reads)
    pub sudo_binary: String,
    /// Privilege level for source file access
    pub read_privilege: ReadPrivilege,
    /// Timeout for each external command (seconds)
    pub command_timeout_secs: u64,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: LogFormat,
    /// Enable color in text format logs
    pub log_enable_color: bool,
    /// Prometheus textfile to write after a run
    pub metrics_file: Option<PathBuf>,
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            manifest_root: PathBuf::from(DEFAULT_MANIFEST_ROOT),
            manifest_file: None,
            docker_binary: DEFAULT_DOCKER_BINARY.to_string(),
            docker_host: None,
            sudo_binary: DEFAULT_SUDO_BINARY.to_string(),
            read_privilege: ReadPrivilege::Elevated,
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            log_level: "INFO".to_string(),
            log_format: LogFormat::Text,
            log_enable_color: true,
            metrics_file: None,
        }
    }
}

impl ProvisionerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            manifest_root: lookup("SWARM_SECRETS_ROOT")
                .map_or(defaults.manifest_root, PathBuf::from),
            manifest_file: lookup("SWARM_SECRETS_MANIFEST").map(PathBuf::from),
            docker_binary: lookup("DOCKER_BIN").unwrap_or(defaults.docker_binary),
            docker_host: lookup("DOCKER_HOST").filter(|host| !host.is_empty()),
            sudo_binary: lookup("SUDO_BIN").unwrap_or(defaults.sudo_binary),
            read_privilege: lookup("READ_PRIVILEGE")
                .and_then(|v| parse_privilege(&v))
                .unwrap_or(defaults.read_privilege),
            command_timeout_secs: lookup("COMMAND_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.command_timeout_secs),
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .and_then(|v| LogFormat::parse(&v))
                .unwrap_or(defaults.log_format),
            log_enable_color: lookup("LOG_ENABLE_COLOR")
                .map_or(defaults.log_enable_color, |v| parse_bool(&v)),
            metrics_file: lookup("METRICS_FILE").map(PathBuf::from),
        }
    }

    /// Get command timeout duration
    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Docker-backed store for this configuration
    #[must_use]
    pub fn docker_store(&self) -> DockerSwarmStore {
        let store = DockerSwarmStore::new(self.docker_binary.clone(), self.command_timeout());
        match &self.docker_host {
            Some(host) => store.with_host(host.clone()),
            None => store,
        }
    }

    /// Load the configured manifest, or the built-in one
    ///
    /// # Errors
    ///
    /// Returns `ManifestError` when the manifest file is unreadable or invalid.
    pub fn load_manifest(&self) -> Result<Manifest, ManifestError> {
        match &self.manifest_file {
            Some(path) => Manifest::load(path),
            None => Ok(wazuh_default_manifest()),
        }
    }
}

fn parse_privilege(value: &str) -> Option<ReadPrivilege> {
    match value.to_lowercase().as_str() {
        "sudo" | "elevated" => Some(ReadPrivilege::Elevated),
        "none" | "invoker" => Some(ReadPrivilege::Invoker),
        _ => None,
    }
}

fn parse_bool(value: &str) -> bool {
    let v_lower = value.to_lowercase();
    v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> ProvisionerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ProvisionerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = config_from(&[]);
        assert_eq!(config.manifest_root, PathBuf::from("config"));
        assert_eq!(config.read_privilege, ReadPrivilege::Elevated);
        assert_eq!(config.command_timeout(), Duration::from_secs(30));
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.manifest_file.is_none());
        assert!(config.metrics_file.is_none());
        assert!(config.docker_host.is_none());
        assert_eq!(config.docker_store().host(), None);
    }

    #[test]
    fn test_env_overrides() {
        let config = config_from(&[
            ("SWARM_SECRETS_ROOT", "/srv/wazuh/config"),
            ("READ_PRIVILEGE", "none"),
            ("COMMAND_TIMEOUT_SECS", "5"),
            ("LOG_FORMAT", "JSON"),
            ("LOG_ENABLE_COLOR", "off"),
            ("DOCKER_BIN", "/usr/local/bin/docker"),
            ("DOCKER_HOST", "ssh://ops@manager-1"),
        ]);
        assert_eq!(config.manifest_root, PathBuf::from("/srv/wazuh/config"));
        assert_eq!(config.read_privilege, ReadPrivilege::Invoker);
        assert_eq!(config.command_timeout_secs, 5);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(!config.log_enable_color);
        assert_eq!(config.docker_binary, "/usr/local/bin/docker");
        assert_eq!(config.docker_host.as_deref(), Some("ssh://ops@manager-1"));
        assert_eq!(config.docker_store().host(), Some("ssh://ops@manager-1"));
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        let config = config_from(&[
            ("READ_PRIVILEGE", "root-please"),
            ("COMMAND_TIMEOUT_SECS", "0"),
            ("LOG_FORMAT", "xml"),
        ]);
        assert_eq!(config.read_privilege, ReadPrivilege::Elevated);
        assert_eq!(config.command_timeout_secs, DEFAULT_COMMAND_TIMEOUT_SECS);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_default_manifest_used_without_file() {
        let manifest = ProvisionerConfig::default().load_manifest().unwrap();
        assert!(!manifest.is_empty());
    }

    #[test]
    fn test_missing_manifest_file_is_an_error() {
        let config = config_from(&[("SWARM_SECRETS_MANIFEST", "/nonexistent/manifest.yaml")]);
        assert!(matches!(
            config.load_manifest(),
            Err(ManifestError::Read { .. })
        ));
    }
}
