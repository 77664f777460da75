//! Provision command
//!
//! Builds the docker-backed store and the configured source reader, runs the
//! provisioner and prints the report to stdout. Logs go to stderr so the
//! JSON report can be piped.

use super::OutputFormat;
use crate::config::ProvisionerConfig;
use crate::constants::{EXIT_CONFIG, EXIT_OK, EXIT_STRICT_FAILURES};
use crate::manifest::Manifest;
use crate::observability::metrics;
use crate::provisioner::{Provisioner, ProvisioningReport};
use crate::source::reader_for;
use tracing::{error, info};

/// Provision every manifest entry and return the process exit code
pub async fn provision_command(
    config: &ProvisionerConfig,
    manifest: &Manifest,
    output: OutputFormat,
    strict: bool,
) -> i32 {
    let store = config.docker_store();
    let reader = reader_for(
        config.read_privilege,
        &config.sudo_binary,
        config.command_timeout(),
    );
    let provisioner = Provisioner::new(&store, &store, reader.as_ref(), &config.manifest_root);

    info!(
        "Provisioning {} secrets from {}",
        manifest.len(),
        config.manifest_root.display()
    );

    let report = match provisioner.provision(manifest).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("✗ {e}");
            eprintln!("  ► {}", e.remediation());
            write_metrics(config);
            return e.exit_code();
        }
    };

    if let Err(code) = print_report(&report, output) {
        return code;
    }
    write_metrics(config);

    if strict && report.has_failures() {
        error!("Run completed with failed entries (--strict)");
        return EXIT_STRICT_FAILURES;
    }
    EXIT_OK
}

fn print_report(report: &ProvisioningReport, output: OutputFormat) -> Result<(), i32> {
    match output {
        OutputFormat::Text => {
            println!("{report}");
            Ok(())
        }
        OutputFormat::Json => match report.to_json() {
            Ok(json) => {
                println!("{json}");
                Ok(())
            }
            Err(e) => {
                error!("Failed to serialize report: {}", e);
                Err(EXIT_CONFIG)
            }
        },
    }
}

/// Metrics are best-effort; a failed write never changes the exit code
fn write_metrics(config: &ProvisionerConfig) {
    if let Some(path) = &config.metrics_file {
        match metrics::write_textfile(path) {
            Ok(()) => info!("Metrics written to {}", path.display()),
            Err(e) => error!("{:#}", e),
        }
    }
}
