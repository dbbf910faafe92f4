//! Ordered, filtered fan-out of one package script across workspaces.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, watch, OwnedSemaphorePermit, Semaphore};

use crate::config::{RunnerKind, WorkspaceConfig};
use crate::error::{Error, Result};
use crate::manifest::PackageManifest;
use crate::output::OutputLine;
use crate::reporter::RunReporter;
use crate::streaming::{LaunchSpec, StreamingTask, OUTPUT_DRAIN_GRACE};
use crate::workspace::Workspace;

/// Per-invocation options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub parallel: bool,
    pub silent: bool,
    /// Short names that run first, in this order.
    pub order: Vec<String>,
    /// Short names that never run.
    pub exclude: Vec<String>,
    /// Pool size in parallel mode; `None` starts everything at once.
    pub jobs: Option<usize>,
}

impl RunOptions {
    /// Splits a comma-separated flag value, dropping empty entries.
    pub fn parse_list(value: &str) -> Vec<String> {
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn pool_size(&self, tasks: usize) -> usize {
        if self.parallel {
            self.jobs.unwrap_or(tasks).max(1)
        } else {
            1
        }
    }
}

/// The filtered, sorted set of workspaces a run will consider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub workspaces: Vec<Workspace>,
    pub label_width: usize,
}

impl RunPlan {
    /// Restricts to `package_prefix`, sorts by `order`, then drops `exclude`.
    ///
    /// Names missing from `order` keep their enumeration order after all
    /// listed ones; the sort is stable.
    pub fn new(workspaces: Vec<Workspace>, package_prefix: &str, options: &RunOptions) -> Self {
        let mut workspaces: Vec<Workspace> = workspaces
            .into_iter()
            .filter(|ws| ws.location.starts_with(package_prefix))
            .collect();

        let rank = |ws: &Workspace| {
            options
                .order
                .iter()
                .position(|name| name == ws.short_name())
                .unwrap_or(options.order.len())
        };
        workspaces.sort_by_key(rank);

        workspaces.retain(|ws| !options.exclude.iter().any(|name| name == ws.short_name()));

        let label_width = workspaces
            .iter()
            .map(|ws| ws.short_name().chars().count())
            .max()
            .unwrap_or(0);

        Self {
            workspaces,
            label_width,
        }
    }

    pub fn label(&self, workspace: &Workspace) -> String {
        format!("{:<width$}", workspace.short_name(), width = self.label_width)
    }

    pub fn short_names(&self) -> Vec<&str> {
        self.workspaces.iter().map(Workspace::short_name).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty()
    }
}

/// Why a planned workspace did not get a process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoDescriptor,
    InvalidDescriptor(String),
    ScriptMissing(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoDescriptor => write!(f, "no package.json"),
            SkipReason::InvalidDescriptor(message) => write!(f, "invalid package.json ({})", message),
            SkipReason::ScriptMissing(script) => write!(f, "no script named {}", script),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedTask {
    pub workspace: String,
    pub location: String,
    pub reason: SkipReason,
}

/// How a started task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded,
    /// Non-zero exit; `code` is `None` when the child died from a signal.
    Failed { code: Option<i32> },
    SpawnFailed { message: String },
}

/// Result of executing a task for a workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    /// Registered package name.
    pub workspace: String,
    pub location: String,
    pub task_name: String,
    pub outcome: TaskOutcome,
}

impl TaskResult {
    #[inline]
    pub fn success(&self) -> bool {
        matches!(self.outcome, TaskOutcome::Succeeded)
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self.outcome {
            TaskOutcome::Succeeded => Some(0),
            TaskOutcome::Failed { code } => code,
            TaskOutcome::SpawnFailed { .. } => None,
        }
    }
}

/// Everything that happened during a run. `results` follow plan order.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub results: Vec<TaskResult>,
    pub skipped: Vec<SkippedTask>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.results.iter().all(TaskResult::success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &TaskResult> {
        self.results.iter().filter(|r| !r.success())
    }
}

/// Messages flowing from running tasks to the single reporter loop.
#[derive(Debug, Clone)]
pub enum RunEvent {
    Line(OutputLine),
    Finished(TaskResult),
}

/// Executes a script across workspaces.
///
/// Tasks are admitted to a worker pool in plan order: one slot in serial
/// mode, `jobs` (or all) slots in parallel mode. A slot is held until the
/// child exits.
pub struct TaskRunner {
    root: PathBuf,
    runner: RunnerKind,
    package_prefix: String,
    force_color: String,
}

impl TaskRunner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_config(root, &WorkspaceConfig::default())
    }

    pub fn with_config(root: impl Into<PathBuf>, config: &WorkspaceConfig) -> Self {
        Self {
            root: root.into(),
            runner: config.run.runner,
            package_prefix: config.run.package_prefix.clone(),
            force_color: config.run.force_color.clone(),
        }
    }

    pub fn with_runner(mut self, runner: RunnerKind) -> Self {
        self.runner = runner;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn plan(&self, workspaces: Vec<Workspace>, options: &RunOptions) -> RunPlan {
        RunPlan::new(workspaces, &self.package_prefix, options)
    }

    /// Runs `task_name` in every planned workspace that defines it.
    ///
    /// Every planned workspace is checked first and skips are reported before
    /// any task starts. A failing task never cancels its siblings. Once every
    /// started task has finished, or this future is dropped, any child still
    /// alive is killed.
    pub async fn run_task(
        &self,
        workspaces: Vec<Workspace>,
        options: &RunOptions,
        task_name: &str,
        args: &[String],
        reporter: Arc<dyn RunReporter>,
    ) -> Result<RunSummary> {
        let plan = self.plan(workspaces, options);
        let mut summary = RunSummary::default();
        if plan.is_empty() {
            tracing::debug!("no workspaces under '{}'", self.package_prefix);
            return Ok(summary);
        }

        tracing::debug!("run order: {}", plan.short_names().join(", "));

        let pool = Arc::new(Semaphore::new(options.pool_size(plan.workspaces.len())));
        let (events_tx, mut events_rx) = mpsc::unbounded_channel::<RunEvent>();
        let (done_tx, done_rx) = watch::channel(false);

        let reporter_loop = {
            let reporter = Arc::clone(&reporter);
            tokio::spawn(async move {
                while let Some(event) = events_rx.recv().await {
                    match event {
                        RunEvent::Line(line) => reporter.output_line(&line),
                        RunEvent::Finished(result) => reporter.task_finished(&result),
                    }
                }
            })
        };

        let mut runnable = Vec::with_capacity(plan.workspaces.len());
        for workspace in &plan.workspaces {
            match self.resolve_script(workspace, task_name).await {
                Ok(script) => runnable.push((workspace, script)),
                Err(reason) => {
                    let skipped = SkippedTask {
                        workspace: workspace.name.clone(),
                        location: workspace.location.clone(),
                        reason,
                    };
                    reporter.task_skipped(&skipped);
                    summary.skipped.push(skipped);
                }
            }
        }

        let mut handles = Vec::with_capacity(runnable.len());
        for (workspace, script) in runnable {
            let permit = Arc::clone(&pool)
                .acquire_owned()
                .await
                .map_err(|e| Error::TaskExecution {
                    workspace: workspace.name.clone(),
                    task: task_name.to_string(),
                    message: format!("worker pool closed: {}", e),
                })?;

            let spec = LaunchSpec {
                workspace: workspace.name.clone(),
                label: plan.label(workspace),
                dir: workspace.dir(&self.root),
                runner: self.runner,
                script_name: task_name.to_string(),
                script_body: script,
                args: args.to_vec(),
                force_color: self.force_color.clone(),
            };

            if !options.silent {
                reporter.task_started(&spec.label, &spec.display_command());
            }

            let location = workspace.location.clone();
            let events = events_tx.clone();
            let done = done_rx.clone();
            let handle = tokio::spawn(execute(spec, location, events, done, permit));
            handles.push((workspace.clone(), handle));
        }
        drop(events_tx);

        for (workspace, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    let result = TaskResult {
                        workspace: workspace.name.clone(),
                        location: workspace.location.clone(),
                        task_name: task_name.to_string(),
                        outcome: TaskOutcome::SpawnFailed {
                            message: format!("task aborted: {}", e),
                        },
                    };
                    reporter.task_finished(&result);
                    result
                }
            };
            summary.results.push(result);
        }

        let _ = done_tx.send(true);
        if let Err(e) = reporter_loop.await {
            tracing::warn!("output reporter stopped: {}", e);
        }

        Ok(summary)
    }

    async fn resolve_script(
        &self,
        workspace: &Workspace,
        task_name: &str,
    ) -> std::result::Result<String, SkipReason> {
        let manifest_path = workspace.manifest_path(&self.root);
        let is_file = tokio::fs::metadata(&manifest_path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(SkipReason::NoDescriptor);
        }

        let content = tokio::fs::read_to_string(&manifest_path)
            .await
            .map_err(|e| SkipReason::InvalidDescriptor(e.to_string()))?;
        let manifest = PackageManifest::parse(&manifest_path, &content)
            .map_err(|e| SkipReason::InvalidDescriptor(e.to_string()))?;

        manifest
            .script(task_name)
            .map(str::to_string)
            .ok_or_else(|| SkipReason::ScriptMissing(task_name.to_string()))
    }
}

/// Runs one task. The pool slot is given back as soon as the child exits;
/// leftover output is drained afterwards.
async fn execute(
    spec: LaunchSpec,
    location: String,
    events: mpsc::UnboundedSender<RunEvent>,
    done: watch::Receiver<bool>,
    permit: OwnedSemaphorePermit,
) -> TaskResult {
    let outcome = match StreamingTask::spawn(&spec) {
        Err(e) => {
            drop(permit);
            TaskOutcome::SpawnFailed {
                message: e.to_string(),
            }
        }
        Ok(task) => {
            let exited = task.wait_for_exit(events.clone(), done).await;
            drop(permit);
            match exited {
                Ok(exited) => {
                    let status = exited.status;
                    exited.drain(OUTPUT_DRAIN_GRACE).await;
                    if status.success() {
                        TaskOutcome::Succeeded
                    } else {
                        TaskOutcome::Failed {
                            code: status.code(),
                        }
                    }
                }
                Err(e) => TaskOutcome::SpawnFailed {
                    message: e.to_string(),
                },
            }
        }
    };

    let result = TaskResult {
        workspace: spec.workspace,
        location,
        task_name: spec.script_name,
        outcome,
    };
    let _ = events.send(RunEvent::Finished(result.clone()));
    result
}
