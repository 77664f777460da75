//! # swarm-secrets CLI
//!
//! Command-line interface for provisioning Docker Swarm secrets.
//!
//! ## Usage
//!
//! ```bash
//! # Provision the built-in Wazuh manifest from ./config
//! swarm-secrets provision
//!
//! # Provision from another directory, with a custom manifest, as JSON
//! swarm-secrets provision --root /srv/wazuh/config --manifest secrets.yaml --output json
//!
//! # Verify docker, manager rights and source files without changing anything
//! swarm-secrets check
//! ```
//!
//! Exit codes: 0 completed, 1 configuration error, 2 not a swarm manager,
//! 3 manifest root missing, 4 completed with failures under `--strict`.

use crate::config::{LogFormat, ProvisionerConfig};
use crate::constants::EXIT_CONFIG;
use crate::observability::{logging, metrics};
use crate::source::ReadPrivilege;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{error, info};

mod check;
mod provision;

pub use check::{check_command, run_checks, CheckLine, CheckReport, CheckStatus};
pub use provision::provision_command;

/// Docker Swarm secret provisioner
#[derive(Debug, Parser)]
#[command(name = "swarm-secrets", version)]
#[command(
    about = "Idempotently provision Docker Swarm secrets from certificate, key and config files",
    long_about = None,
    after_help = "\
Examples:
  swarm-secrets check
  swarm-secrets provision
  swarm-secrets provision --root /srv/wazuh/config --output json
"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (ERROR, WARN, INFO, DEBUG, TRACE); RUST_LOG takes precedence
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create or replace every secret in the manifest
    Provision {
        #[command(flatten)]
        source: SourceArgs,

        /// Report format written to stdout
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,

        /// Exit with code 4 when any entry failed
        #[arg(long)]
        strict: bool,

        /// Write Prometheus metrics to this textfile after the run
        #[arg(long, value_name = "FILE")]
        metrics_file: Option<PathBuf>,
    },
    /// Check docker, swarm manager rights and source files without changing anything
    Check {
        #[command(flatten)]
        source: SourceArgs,
    },
}

/// Flags shared by every subcommand
#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    /// Directory that relative source paths resolve against
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// YAML manifest file (defaults to the built-in Wazuh manifest)
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// docker binary name or path
    #[arg(long, value_name = "BIN")]
    pub docker: Option<String>,

    /// Docker daemon to talk to (same syntax as DOCKER_HOST)
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// sudo binary name or path
    #[arg(long, value_name = "BIN")]
    pub sudo: Option<String>,

    /// Read source files with the invoking user's permissions instead of sudo
    #[arg(long)]
    pub no_sudo: bool,

    /// Timeout for each external command, in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl SourceArgs {
    /// Apply flags on top of environment configuration
    pub fn apply(&self, config: &mut ProvisionerConfig) {
        if let Some(root) = &self.root {
            config.manifest_root.clone_from(root);
        }
        if let Some(manifest) = &self.manifest {
            config.manifest_file = Some(manifest.clone());
        }
        if let Some(docker) = &self.docker {
            config.docker_binary.clone_from(docker);
        }
        if let Some(host) = &self.host {
            config.docker_host = Some(host.clone());
        }
        if let Some(sudo) = &self.sudo {
            config.sudo_binary.clone_from(sudo);
        }
        if self.no_sudo {
            config.read_privilege = ReadPrivilege::Invoker;
        }
        if let Some(timeout) = self.timeout.filter(|secs| *secs > 0) {
            config.command_timeout_secs = timeout;
        }
    }
}

/// Resolve configuration from the environment and the parsed flags
#[must_use]
pub fn resolve_config(cli: &Cli, mut config: ProvisionerConfig) -> ProvisionerConfig {
    if let Some(level) = &cli.log_level {
        config.log_level.clone_from(level);
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    match &cli.command {
        Commands::Provision {
            source,
            metrics_file,
            ..
        } => {
            source.apply(&mut config);
            if let Some(file) = metrics_file {
                config.metrics_file = Some(file.clone());
            }
        }
        Commands::Check { source } => source.apply(&mut config),
    }
    config
}

/// Run the CLI and return the process exit code
pub async fn run(cli: Cli) -> i32 {
    let config = resolve_config(&cli, ProvisionerConfig::from_env());
    logging::init(&config.log_level, config.log_format, config.log_enable_color);

    info!(
        "swarm-secrets {} (built {}, git {})",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );

    if let Err(e) = metrics::register_metrics() {
        error!("{:#}", e);
        return EXIT_CONFIG;
    }

    let manifest = match config.load_manifest() {
        Ok(manifest) => manifest,
        Err(e) => {
            error!("Invalid manifest: {}", e);
            eprintln!("✗ {e}");
            return EXIT_CONFIG;
        }
    };

    match cli.command {
        Commands::Provision { output, strict, .. } => {
            provision_command(&config, &manifest, output, strict).await
        }
        Commands::Check { .. } => check_command(&config, &manifest).await,
    }
}
