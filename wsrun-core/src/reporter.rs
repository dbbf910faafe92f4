//! Trait for reporting run progress.

use crate::output::OutputLine;
use crate::runner::{SkippedTask, TaskResult};

/// Receives everything a run wants to show the user.
///
/// This trait allows the core library to report task progress without
/// directly writing to stdout/stderr. Output lines for one stream of one task
/// arrive in the order the child wrote them.
pub trait RunReporter: Send + Sync {
    /// A planned workspace was skipped before spawning anything.
    fn task_skipped(&self, skipped: &SkippedTask);

    /// A task is about to spawn. Not called in silent mode.
    fn task_started(&self, label: &str, command_line: &str);

    fn output_line(&self, line: &OutputLine);

    /// A started task reached a terminal state.
    fn task_finished(&self, result: &TaskResult);
}

/// Discards everything.
pub struct NullReporter;

impl RunReporter for NullReporter {
    fn task_skipped(&self, _skipped: &SkippedTask) {}
    fn task_started(&self, _label: &str, _command_line: &str) {}
    fn output_line(&self, _line: &OutputLine) {}
    fn task_finished(&self, _result: &TaskResult) {}
}
