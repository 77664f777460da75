//! # Constants
//!
//! Shared constants used throughout the provisioner.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Default manifest root, relative to the working directory
pub const DEFAULT_MANIFEST_ROOT: &str = "config";

/// Default docker binary (resolved on `PATH`)
pub const DEFAULT_DOCKER_BINARY: &str = "docker";

/// Default sudo binary used for elevated source reads
pub const DEFAULT_SUDO_BINARY: &str = "sudo";

/// Default timeout for a single external command (seconds)
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;

/// Tracing target the configured log level applies to when `RUST_LOG` is unset
pub const LOG_TARGET: &str = "swarm_secret_provisioner";

/// Maximum length of a Docker secret name
pub const MAX_SECRET_NAME_LEN: usize = 64;

/// Exit code: provisioning ran to completion
pub const EXIT_OK: i32 = 0;

/// Exit code: invalid configuration or manifest
pub const EXIT_CONFIG: i32 = 1;

/// Exit code: not running against a swarm manager
pub const EXIT_NOT_MANAGER: i32 = 2;

/// Exit code: manifest root directory missing or unreadable
pub const EXIT_MANIFEST_ROOT: i32 = 3;

/// Exit code: run completed with failed entries and `--strict` was requested
pub const EXIT_STRICT_FAILURES: i32 = 4;
