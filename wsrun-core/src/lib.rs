//! Core library for running package scripts across monorepo workspaces.

pub mod config;
pub mod error;
pub mod locator;
pub mod manifest;
pub mod output;
pub mod references;
pub mod reporter;
pub mod runner;
pub mod scanner;
pub mod streaming;
pub mod workspace;

pub use config::{LocateOptions, RunSection, RunnerKind, WorkspaceConfig};
pub use error::{Error, Result};
pub use locator::locate_root;
pub use manifest::{PackageManifest, RootManifest};
pub use output::{OutputLine, OutputStream};
pub use references::{generate_references, rewrite_references, GenerateReport};
pub use reporter::{NullReporter, RunReporter};
pub use runner::{RunOptions, RunPlan, RunSummary, SkipReason, SkippedTask, TaskOutcome, TaskResult, TaskRunner};
pub use scanner::{InvalidDescriptor, Scanner};
pub use streaming::{ExitedTask, LaunchSpec, StreamingTask, OUTPUT_DRAIN_GRACE};
pub use workspace::Workspace;
