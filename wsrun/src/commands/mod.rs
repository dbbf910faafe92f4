//! Command implementations for the CLI.

mod generate;
mod list;
mod reporter;
mod run;

use std::path::PathBuf;

use anyhow::Result;
use wsrun_core::{locate_root, LocateOptions, Scanner, Workspace, WorkspaceConfig};

use crate::formatting::print_invalid_descriptors;

pub use generate::cmd_generate;
pub use list::cmd_list;
pub use run::{cmd_run, RunArgs};

/// A located root with its config and enumerated workspaces.
struct LoadedWorkspace {
    root: PathBuf,
    config: WorkspaceConfig,
    workspaces: Vec<Workspace>,
}

fn load_workspace(locate: &LocateOptions) -> Result<LoadedWorkspace> {
    let root = locate_root(locate)?;
    let config = WorkspaceConfig::load(&root)?;
    let mut scanner = Scanner::with_config(&root, &config);
    let workspaces = scanner.scan()?;
    print_invalid_descriptors(scanner.invalid_descriptors());

    Ok(LoadedWorkspace {
        root,
        config,
        workspaces,
    })
}
