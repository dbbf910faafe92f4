//! Diagnostics printed around a run.

use owo_colors::OwoColorize;
use wsrun_core::{InvalidDescriptor, RunSummary};

use super::status::Status;

/// Prints the path of every descriptor the scanner had to skip.
pub fn print_invalid_descriptors(invalid: &[InvalidDescriptor]) {
    for descriptor in invalid {
        eprintln!("{}", descriptor.path.display().to_string().red().bold());
        tracing::debug!("{}", descriptor.message);
    }
}

/// Lists failed tasks once every task has finished.
pub fn print_run_failures(summary: &RunSummary) {
    eprintln!();
    for result in summary.failures() {
        let detail = match result.exit_code() {
            Some(code) => format!("exit code {}", code),
            None => "no exit code".to_string(),
        };
        eprintln!(
            "  {} {} {}",
            Status::Error.symbol().red(),
            result.workspace.bold(),
            format!("({}, {})", result.location, detail).bright_black()
        );
    }
}
