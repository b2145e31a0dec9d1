use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {secs}s")]
    TimedOut { program: String, secs: u64 },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// Run an external tool to completion and return its stdout.
///
/// The child is killed if the timeout elapses.
pub async fn run_command(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> Result<Vec<u8>, CommandError> {
    run_command_in(program, args, None, timeout).await
}

/// Like [`run_command`], with an explicit working directory.
pub async fn run_command_in(
    program: &str,
    args: &[&str],
    current_dir: Option<&Path>,
    timeout: Duration,
) -> Result<Vec<u8>, CommandError> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = current_dir {
        command.current_dir(dir);
    }

    let child = command.spawn().map_err(|source| CommandError::Spawn {
        program: program.to_string(),
        source,
    })?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| CommandError::TimedOut {
            program: program.to_string(),
            secs: timeout.as_secs(),
        })?
        .map_err(|source| CommandError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        tracing::debug!(
            program = %program,
            status = %output.status,
            stderr = %stderr,
            "External command failed"
        );
        return Err(CommandError::Failed {
            program: program.to_string(),
            status: output.status.to_string(),
            code: output.status.code(),
            stderr,
        });
    }

    Ok(output.stdout)
}
