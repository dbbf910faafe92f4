//! Terminal implementation of RunReporter.

use std::io::Write;

use owo_colors::OwoColorize;
use wsrun_core::{OutputLine, OutputStream, RunReporter, SkippedTask, TaskOutcome, TaskResult};

/// Writes prefixed child output to the matching stream and status to stderr.
pub struct CliRunReporter;

impl RunReporter for CliRunReporter {
    fn task_skipped(&self, skipped: &SkippedTask) {
        eprintln!(
            "{}",
            format!("{} skipped due to {}", skipped.workspace, skipped.reason).bright_black()
        );
    }

    fn task_started(&self, label: &str, command_line: &str) {
        eprintln!("{}", format!("[{}] {}", label, command_line).cyan());
    }

    fn output_line(&self, line: &OutputLine) {
        let prefix = format!("[{}] ", line.label);
        let _ = match line.stream {
            OutputStream::Stdout => {
                writeln!(std::io::stdout().lock(), "{}{}", prefix.cyan(), line.line)
            }
            OutputStream::Stderr => {
                writeln!(std::io::stderr().lock(), "{}{}", prefix.cyan(), line.line)
            }
        };
    }

    fn task_finished(&self, result: &TaskResult) {
        let message = match &result.outcome {
            TaskOutcome::Succeeded => return,
            TaskOutcome::Failed { code: Some(code) } => {
                format!("{} exited with code {}", result.workspace, code)
            }
            TaskOutcome::Failed { code: None } => {
                format!("{} was terminated by a signal", result.workspace)
            }
            TaskOutcome::SpawnFailed { message } => {
                format!("{} failed to start: {}", result.workspace, message)
            }
        };
        eprintln!("{}", message.red());
    }
}
