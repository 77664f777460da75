//! Check command
//!
//! Verifies that a provisioning run could succeed, without touching the
//! secret store. Similar to `provision`, checks run in order: docker binary,
//! swarm manager rights, manifest root, then every source file. A missing
//! source is only a warning because `provision` would skip it.

use crate::config::ProvisionerConfig;
use crate::constants::{EXIT_MANIFEST_ROOT, EXIT_NOT_MANAGER, EXIT_OK};
use crate::manifest::Manifest;
use crate::source::{reader_for, SourceReader};
use crate::store::ManagerProbe;
use std::fmt;
use std::path::Path;

/// Severity of a single check line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Ok,
    Warn,
    Fail,
}

/// One printed check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckLine {
    pub status: CheckStatus,
    pub message: String,
}

impl CheckLine {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Ok,
            message: message.into(),
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Warn,
            message: message.into(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Fail,
            message: message.into(),
        }
    }
}

impl fmt::Display for CheckLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = match self.status {
            CheckStatus::Ok => "✔",
            CheckStatus::Warn => "⚠",
            CheckStatus::Fail => "✗",
        };
        write!(f, "{mark} {}", self.message)
    }
}

/// Collected check results and the exit code they map to
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    pub lines: Vec<CheckLine>,
    pub exit_code: i32,
}

impl CheckReport {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.exit_code == EXIT_OK
    }

    #[must_use]
    pub fn warnings(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| l.status == CheckStatus::Warn)
            .count()
    }
}

/// Run the read-only checks: manager probe, manifest root, source files
///
/// Stops at the first fatal check, mirroring the order `provision` uses.
pub async fn run_checks(
    probe: &dyn ManagerProbe,
    reader: &dyn SourceReader,
    manifest: &Manifest,
    root: &Path,
) -> CheckReport {
    let mut report = CheckReport::default();

    match probe.verify_manager().await {
        Ok(()) => report.lines.push(CheckLine::ok("swarm manager rights verified")),
        Err(e) => {
            report
                .lines
                .push(CheckLine::fail(format!("not a swarm manager: {e}")));
            report.exit_code = EXIT_NOT_MANAGER;
            return report;
        }
    }

    match reader.exists(root).await {
        Ok(true) => report.lines.push(CheckLine::ok(format!(
            "manifest root {} exists ({} read)",
            root.display(),
            reader.privilege().as_str()
        ))),
        Ok(false) => {
            report.lines.push(CheckLine::fail(format!(
                "manifest root {} does not exist",
                root.display()
            )));
            report.exit_code = EXIT_MANIFEST_ROOT;
            return report;
        }
        Err(e) => {
            report.lines.push(CheckLine::fail(format!(
                "manifest root {} could not be checked: {e}",
                root.display()
            )));
            report.exit_code = EXIT_MANIFEST_ROOT;
            return report;
        }
    }

    for entry in manifest.entries() {
        let path = entry.resolve(root);
        let line = match reader.exists(&path).await {
            Ok(true) => CheckLine::ok(format!("{}: {}", entry.name, path.display())),
            Ok(false) => CheckLine::warn(format!(
                "{}: {} not found, would be skipped",
                entry.name,
                path.display()
            )),
            Err(e) => CheckLine::warn(format!("{}: {e}", entry.name)),
        };
        report.lines.push(line);
    }

    report
}

/// Check the local environment for a provisioning run
pub async fn check_command(config: &ProvisionerConfig, manifest: &Manifest) -> i32 {
    let store = config.docker_store();

    println!("► checking prerequisites");
    match store.docker_path() {
        Ok(path) => println!("✔ docker is available at {}", path.display()),
        Err(e) => {
            println!("✗ {e}");
            return EXIT_NOT_MANAGER;
        }
    }

    let reader = reader_for(
        config.read_privilege,
        &config.sudo_binary,
        config.command_timeout(),
    );
    let report = run_checks(&store, reader.as_ref(), manifest, &config.manifest_root).await;

    // Manager line, root line, then one line per manifest entry
    for (i, line) in report.lines.iter().enumerate() {
        match i {
            1 => println!("► checking manifest root"),
            2 => println!("► checking sources ({} entries)", manifest.len()),
            _ => {}
        }
        println!("{line}");
    }

    if report.passed() {
        match report.warnings() {
            0 => println!("✅ all checks passed"),
            n => println!("✅ checks passed with {n} warning(s)"),
        }
    }
    report.exit_code
}
