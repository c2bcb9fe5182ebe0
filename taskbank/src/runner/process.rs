//! @ai:module:intent Spawn one build or run step under a wall-clock limit and clean up after it
//! @ai:module:layer infrastructure
//! @ai:module:public_api run_with_timeout, ProcessOutcome, ProcessOutput
//! @ai:module:stateless true

use crate::runner::language::ResolvedCommand;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};

/// Variables passed through to submitted programs; everything else is cleared.
const INHERITED_ENV: &[&str] = &[
    "PATH",
    "HOME",
    "LANG",
    "LC_ALL",
    "JAVA_HOME",
    "SYSTEMROOT",
    "TEMP",
    "TMP",
];

/// Output beyond this many bytes per stream is read and discarded.
const MAX_CAPTURE_BYTES: usize = 1024 * 1024;

/// @ai:intent Captured result of a process that exited on its own
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// @ai:intent How a step ended
#[derive(Debug)]
pub enum ProcessOutcome {
    Completed(ProcessOutput),
    TimedOut,
}

/// @ai:intent Read a pipe to the end, keeping at most MAX_CAPTURE_BYTES
/// @ai:effects io
async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut captured = Vec::new();
    let Some(mut pipe) = pipe else {
        return Ok(captured);
    };

    let mut chunk = [0u8; 8192];
    loop {
        let read = pipe.read(&mut chunk).await?;
        if read == 0 {
            break;
        }

        let room = MAX_CAPTURE_BYTES.saturating_sub(captured.len());
        captured.extend_from_slice(&chunk[..read.min(room)]);
    }

    Ok(captured)
}

/// @ai:intent SIGKILL every process left in the step's process group
/// @ai:effects process
#[cfg(unix)]
fn terminate_group(pid: Option<u32>) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pid.and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };

    match killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        Ok(()) => tracing::debug!("Killed leftover processes in group {}", pid),
        Err(Errno::ESRCH) => {}
        Err(e) => tracing::warn!("Failed to signal process group {}: {}", pid, e),
    }
}

#[cfg(not(unix))]
fn terminate_group(_pid: Option<u32>) {}

/// @ai:intent Kill the direct child if it is still running and reap it
/// @ai:effects process
async fn reap(child: &mut Child) {
    if let Err(e) = child.kill().await {
        tracing::debug!("Child already gone: {}", e);
    }
}

/// @ai:intent Run a command in work_dir, capturing stdout and stderr separately
/// @ai:pre command.program is non-empty
/// @ai:post no process started by this call is alive when it returns
/// @ai:effects process, io
pub async fn run_with_timeout(
    command: &ResolvedCommand,
    work_dir: &Path,
    limit: Duration,
) -> std::io::Result<ProcessOutcome> {
    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .current_dir(work_dir)
        .env_clear()
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    for key in INHERITED_ENV {
        if let Some(value) = std::env::var_os(key) {
            cmd.env(key, value);
        }
    }

    #[cfg(unix)]
    cmd.process_group(0);

    tracing::debug!("Spawning `{}` in {}", command, work_dir.display());

    let mut child = cmd.spawn()?;
    let pid = child.id();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let waited = {
        let child = &mut child;
        tokio::time::timeout(limit, async move {
            let (status, stdout, stderr) = tokio::join!(child.wait(), drain(stdout), drain(stderr));
            Ok::<_, std::io::Error>(ProcessOutput {
                status: status?,
                stdout: stdout?,
                stderr: stderr?,
            })
        })
        .await
    };

    // Grandchildren may outlive a leader that exited normally.
    terminate_group(pid);

    match waited {
        Ok(Ok(output)) => Ok(ProcessOutcome::Completed(output)),
        Ok(Err(e)) => {
            reap(&mut child).await;
            Err(e)
        }
        Err(_) => {
            tracing::debug!("`{}` exceeded {:?}, killed", command, limit);
            reap(&mut child).await;
            Ok(ProcessOutcome::TimedOut)
        }
    }
}
