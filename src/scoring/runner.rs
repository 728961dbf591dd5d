use std::{
    path::Path,
    process::{ExitStatus, Stdio},
    time::Duration,
};

use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, BufReader},
    process::{Child, ChildStdout, Command},
};
use tracing::{debug, warn, Instrument};

use super::{FailureCause, ScoringFailure, Stage};
use crate::config::ScorerCommand;

/// How long stderr may keep draining after the scorer itself has exited.
/// Descendants that inherited the pipe can hold it open indefinitely.
const STDERR_GRACE: Duration = Duration::from_millis(250);

/// Launches one scorer process per call, no retries.
///
/// Stdout is collected and returned once the process exits successfully.
/// Stderr is forwarded line by line to the log and nowhere else.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    stage: Stage,
    command: ScorerCommand,
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(stage: Stage, command: ScorerCommand, timeout: Option<Duration>) -> Self {
        Self {
            stage,
            command,
            timeout,
        }
    }

    fn fail(&self, cause: FailureCause) -> ScoringFailure {
        ScoringFailure::new(self.stage, cause)
    }

    pub async fn run(&self, image: &Path) -> Result<String, ScoringFailure> {
        let mut child = Command::new(&self.command.program)
            .args(&self.command.args)
            .arg(image)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.fail(FailureCause::Spawn(e.to_string())))?;

        let stage = self.stage;
        let stderr_task = child.stderr.take().map(|stderr| {
            tokio::spawn(
                async move {
                    let mut lines = BufReader::new(stderr).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        warn!(%stage, %line, "scorer stderr");
                    }
                }
                .in_current_span(),
            )
        });
        let stdout = child.stdout.take();

        let outcome = match self.timeout {
            Some(limit) => {
                let timed = tokio::time::timeout(limit, collect(&mut child, stdout)).await;
                let Ok(outcome) = timed else {
                    if let Err(e) = child.kill().await {
                        warn!(%stage, error = %e, "failed to kill timed out scorer");
                    }
                    if let Some(task) = stderr_task {
                        task.abort();
                    }
                    return Err(self.fail(FailureCause::Timeout(limit)));
                };
                outcome
            }
            None => collect(&mut child, stdout).await,
        };

        if let Some(mut task) = stderr_task {
            if tokio::time::timeout(STDERR_GRACE, &mut task).await.is_err() {
                debug!(%stage, "stderr still open after exit; detaching");
                task.abort();
            }
        }

        let (output, status) = outcome.map_err(|e| self.fail(FailureCause::Io(e.to_string())))?;
        if !status.success() {
            return Err(self.fail(FailureCause::ExitStatus(status.code())));
        }

        debug!(%stage, bytes = output.len(), "scorer finished");
        Ok(output)
    }
}

async fn collect(
    child: &mut Child,
    stdout: Option<ChildStdout>,
) -> std::io::Result<(String, ExitStatus)> {
    let mut raw = Vec::new();
    if let Some(mut out) = stdout {
        out.read_to_end(&mut raw).await?;
    }
    let status = child.wait().await?;
    Ok((String::from_utf8_lossy(&raw).into_owned(), status))
}
