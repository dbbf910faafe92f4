//! Script fan-out command.

use std::sync::Arc;

use anyhow::Result;
use wsrun_core::{LocateOptions, RunOptions, RunSection, RunnerKind, TaskRunner};

use crate::formatting::{print_error, print_run_failures};

use super::reporter::CliRunReporter;
use super::{load_workspace, LoadedWorkspace};

/// Raw `run` arguments before merging with `wsrun.toml`.
pub struct RunArgs {
    pub parallel: bool,
    pub silent: bool,
    pub order: Option<String>,
    pub exclude: Option<String>,
    pub jobs: Option<usize>,
    pub runner: Option<RunnerKind>,
    /// Script name followed by pass-through arguments.
    pub command: Vec<String>,
}

impl RunArgs {
    /// Flags win over config; booleans are OR-ed.
    fn to_options(&self, config: &RunSection) -> RunOptions {
        RunOptions {
            parallel: self.parallel || config.parallel,
            silent: self.silent || config.silent,
            order: self
                .order
                .as_deref()
                .map(RunOptions::parse_list)
                .unwrap_or_else(|| config.order.clone()),
            exclude: self
                .exclude
                .as_deref()
                .map(RunOptions::parse_list)
                .unwrap_or_else(|| config.exclude.clone()),
            jobs: self.jobs.or(config.jobs),
        }
    }
}

pub fn cmd_run(locate: LocateOptions, args: RunArgs) -> Result<()> {
    let Some((task_name, task_args)) = args.command.split_first() else {
        return Err(anyhow::anyhow!("No script name given"));
    };

    let LoadedWorkspace {
        root,
        config,
        workspaces,
    } = load_workspace(&locate)?;

    let options = args.to_options(&config.run);
    let mut runner = TaskRunner::with_config(&root, &config);
    if let Some(kind) = args.runner {
        runner = runner.with_runner(kind);
    }

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create tokio runtime: {}", e))?;

    let summary = rt.block_on(runner.run_task(
        workspaces,
        &options,
        task_name,
        task_args,
        Arc::new(CliRunReporter),
    ))?;

    if !summary.is_success() {
        print_run_failures(&summary);
        print_error(&format!(
            "{} of {} tasks failed",
            summary.failures().count(),
            summary.results.len()
        ));
        std::process::exit(1);
    }

    Ok(())
}
