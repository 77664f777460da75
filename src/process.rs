//! # External Commands
//!
//! Thin wrapper over `tokio::process` used by the docker store and the
//! elevated file reader.
//!
//! **SECURITY**: secret content is only ever passed on stdin. It is never
//! written to a temporary file and never placed on a command line.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Failure to run a command at all (as opposed to a non-zero exit)
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to run `{command}`: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },
}

/// Captured result of a finished command
#[derive(Debug)]
pub struct CommandOutput {
    pub command: String,
    pub success: bool,
    pub status: String,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    #[must_use]
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).trim().to_string()
    }

    #[must_use]
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// Resolve a binary name on `PATH`; paths containing a separator are used as-is
///
/// # Errors
///
/// Returns the `which` error when the binary cannot be found.
pub fn resolve_binary(binary: &str) -> Result<PathBuf, which::Error> {
    if binary.contains(std::path::MAIN_SEPARATOR) {
        let path = Path::new(binary);
        if path.exists() {
            return Ok(path.to_path_buf());
        }
    }
    which::which(binary)
}

/// Run `program args...`, optionally piping `stdin`, bounded by `timeout`
///
/// `envs` are set on the child on top of the inherited environment.
///
/// stdin is written while the child runs. A child that exits without
/// draining it (e.g. docker rejecting the request up front) is reported by
/// its own exit status and stderr, not by the broken pipe.
///
/// # Errors
///
/// Returns `CommandError` when the process cannot be spawned, its pipes fail,
/// or it does not finish within `timeout`. A non-zero exit is *not* an error
/// here; inspect [`CommandOutput::success`].
pub async fn run<I, S>(
    program: &Path,
    args: I,
    envs: &[(&str, &str)],
    stdin: Option<&[u8]>,
    timeout: Duration,
) -> Result<CommandOutput, CommandError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<_> = args
        .into_iter()
        .map(|a| a.as_ref().to_os_string())
        .collect();
    let command = describe(program, &args);
    debug!("Running `{}`", command);

    let mut cmd = tokio::process::Command::new(program);
    cmd.args(&args)
        .envs(envs.iter().copied())
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let io_err = |source: std::io::Error| CommandError::Io {
        command: command.clone(),
        source,
    };

    let mut child = cmd.spawn().map_err(io_err)?;
    let pipe = child.stdin.take();

    let writer = async move {
        if let (Some(input), Some(mut pipe)) = (stdin, pipe) {
            pipe.write_all(input).await?;
            pipe.shutdown().await?;
            // Dropping the handle closes stdin so the child sees EOF
            drop(pipe);
        }
        Ok::<(), std::io::Error>(())
    };

    let execution = async {
        let (written, output) = tokio::join!(writer, child.wait_with_output());
        let output = output?;
        match written {
            Ok(()) => Ok(output),
            // The child's own failure explains why stdin was not consumed
            Err(e) if !output.status.success() => {
                debug!("`{}` exited before reading stdin: {}", command, e);
                Ok(output)
            }
            Err(e) => Err(e),
        }
    };

    let output = tokio::time::timeout(timeout, execution)
        .await
        .map_err(|_elapsed| CommandError::Timeout {
            command: command.clone(),
            timeout,
        })?
        .map_err(io_err)?;

    Ok(CommandOutput {
        success: output.status.success(),
        status: output.status.to_string(),
        stdout: output.stdout,
        stderr: output.stderr,
        command,
    })
}

fn describe(program: &Path, args: &[std::ffi::OsString]) -> String {
    let mut parts = vec![program.display().to_string()];
    parts.extend(args.iter().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}
