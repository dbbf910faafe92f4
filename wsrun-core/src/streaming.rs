//! Spawning a package script and streaming its output line by line.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::RunnerKind;
use crate::error::{Error, Result};
use crate::output::{chunk_lines, OutputLine, OutputStream, Utf8Chunker};
use crate::runner::RunEvent;

const READ_BUF_SIZE: usize = 8 * 1024;

/// How long output is still collected after the child has exited.
pub const OUTPUT_DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Everything needed to launch one script in one workspace.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub workspace: String,
    pub label: String,
    pub dir: PathBuf,
    pub runner: RunnerKind,
    pub script_name: String,
    /// The script body from the descriptor; only used by [`RunnerKind::Shell`].
    pub script_body: String,
    pub args: Vec<String>,
    pub force_color: String,
}

impl LaunchSpec {
    fn command(&self) -> Command {
        let mut cmd = match self.runner {
            RunnerKind::Shell => {
                let mut cmd = Command::new("sh");
                cmd.arg("-c").arg(self.shell_line());
                cmd
            }
            RunnerKind::Npm => {
                let mut cmd = Command::new("npm");
                cmd.arg("run").arg(&self.script_name);
                if !self.args.is_empty() {
                    cmd.arg("--").args(&self.args);
                }
                cmd
            }
            RunnerKind::Yarn | RunnerKind::Pnpm => {
                let mut cmd = Command::new(self.runner.as_str());
                cmd.arg("run").arg(&self.script_name).args(&self.args);
                cmd
            }
        };

        cmd.current_dir(&self.dir)
            .env("FORCE_COLOR", &self.force_color)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// The script body with every argument appended single-quoted, the way
    /// package managers append arguments to a script.
    fn shell_line(&self) -> String {
        let mut line = self.script_body.clone();
        for arg in &self.args {
            line.push(' ');
            line.push('\'');
            line.push_str(&arg.replace('\'', "'\\''"));
            line.push('\'');
        }
        line
    }

    /// Human-readable form used in start announcements.
    pub fn display_command(&self) -> String {
        match self.runner {
            RunnerKind::Shell => format!("sh -c {}", self.script_body),
            runner => format!("{} run {}", runner.as_str(), self.script_name),
        }
    }
}

pub struct StreamingTask {
    child: Child,
    workspace: String,
    task_name: String,
    label: String,
}

/// A child that has exited, possibly with output still in flight.
pub struct ExitedTask {
    pub status: ExitStatus,
    pumps: OutputPumps,
}

impl ExitedTask {
    /// Waits up to `grace` for the remaining output, then stops reading.
    pub async fn drain(self, grace: Duration) {
        self.pumps.drain(grace).await
    }
}

impl StreamingTask {
    pub fn spawn(spec: &LaunchSpec) -> Result<Self> {
        let child = spec.command().spawn().map_err(|e| Error::TaskExecution {
            workspace: spec.workspace.clone(),
            task: spec.script_name.clone(),
            message: format!("Failed to spawn task: {}", e),
        })?;

        tracing::debug!(
            "spawned '{}' in {} (pid {:?})",
            spec.script_name,
            spec.dir.display(),
            child.id()
        );

        Ok(Self {
            child,
            workspace: spec.workspace.clone(),
            task_name: spec.script_name.clone(),
            label: spec.label.clone(),
        })
    }

    /// Forwards both output streams to `events` and resolves once the child
    /// exits, without waiting for the streams to close.
    ///
    /// If `done` flips to `true` (or its sender goes away) while the child is
    /// still alive, the child is killed.
    pub async fn wait_for_exit(
        mut self,
        events: mpsc::UnboundedSender<RunEvent>,
        done: watch::Receiver<bool>,
    ) -> Result<ExitedTask> {
        let stdout = self.child.stdout.take().ok_or_else(|| self.error("Failed to capture stdout"))?;
        let stderr = self.child.stderr.take().ok_or_else(|| self.error("Failed to capture stderr"))?;

        let pumps = OutputPumps {
            workspace: self.workspace.clone(),
            handles: vec![
                tokio::spawn(pump(stdout, OutputStream::Stdout, self.label.clone(), events.clone())),
                tokio::spawn(pump(stderr, OutputStream::Stderr, self.label.clone(), events)),
            ],
        };

        let status = tokio::select! {
            status = self.child.wait() => status,
            _ = settled(done) => {
                tracing::debug!("run settled with child still alive, terminating");
                let _ = self.child.start_kill();
                self.child.wait().await
            }
        };

        match status {
            Ok(status) => Ok(ExitedTask { status, pumps }),
            Err(e) => {
                pumps.abort();
                Err(self.error(&format!("Failed to wait for process: {}", e)))
            }
        }
    }

    /// [`StreamingTask::wait_for_exit`] followed by a bounded drain of the
    /// remaining output.
    pub async fn stream_output(
        self,
        events: mpsc::UnboundedSender<RunEvent>,
        done: watch::Receiver<bool>,
    ) -> Result<ExitStatus> {
        let exited = self.wait_for_exit(events, done).await?;
        let status = exited.status;
        exited.drain(OUTPUT_DRAIN_GRACE).await;
        Ok(status)
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    fn error(&self, message: &str) -> Error {
        Error::TaskExecution {
            workspace: self.workspace.clone(),
            task: self.task_name.clone(),
            message: message.to_string(),
        }
    }
}

/// Reader tasks for one child's stdout and stderr.
///
/// A background process started by the script can inherit the pipes and keep
/// them open long after the script itself has exited.
struct OutputPumps {
    workspace: String,
    handles: Vec<JoinHandle<std::io::Result<()>>>,
}

impl OutputPumps {
    async fn drain(self, grace: Duration) {
        let deadline = Instant::now() + grace;
        for mut handle in self.handles {
            let outcome = tokio::time::timeout_at(deadline, &mut handle).await;
            match outcome {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => {
                    tracing::warn!("{}: output stream closed early: {}", self.workspace, e)
                }
                Ok(Err(e)) => tracing::warn!("{}: output reader failed: {}", self.workspace, e),
                Err(_) => {
                    tracing::debug!("{}: output still open after exit, detaching", self.workspace);
                    handle.abort();
                }
            }
        }
    }

    fn abort(self) {
        for handle in self.handles {
            handle.abort();
        }
    }
}

async fn settled(mut done: watch::Receiver<bool>) {
    let _ = done.wait_for(|finished| *finished).await;
}

async fn pump<R>(
    mut reader: R,
    stream: OutputStream,
    label: String,
    events: mpsc::UnboundedSender<RunEvent>,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_BUF_SIZE];
    let mut chunker = Utf8Chunker::default();

    let emit = |text: &str| {
        for line in chunk_lines(text) {
            let _ = events.send(RunEvent::Line(OutputLine {
                label: label.clone(),
                line,
                stream,
            }));
        }
    };

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        emit(&chunker.push(&buf[..n]));
    }

    if let Some(rest) = chunker.finish() {
        emit(&rest);
    }
    Ok(())
}
