//! Workspace listing.

use anyhow::Result;
use owo_colors::OwoColorize;
use wsrun_core::PackageManifest;

use crate::formatting::{print_section_header, print_workspace_table, SectionStyle};

use super::{load_workspace, LoadedWorkspace};

pub fn cmd_list(locate: wsrun_core::LocateOptions, json: bool) -> Result<()> {
    let LoadedWorkspace {
        root, workspaces, ..
    } = load_workspace(&locate)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&workspaces)?);
        return Ok(());
    }

    print_section_header(
        &format!("Workspaces in {}", root.display()),
        SectionStyle::Primary,
    );

    if workspaces.is_empty() {
        println!("  {} No workspaces found", "WARNING:".yellow());
        return Ok(());
    }

    let rows: Vec<(String, String, Vec<String>)> = workspaces
        .iter()
        .map(|ws| {
            let scripts = PackageManifest::load(&ws.manifest_path(&root))
                .map(|m| m.scripts.keys().cloned().collect())
                .unwrap_or_default();
            (ws.name.clone(), ws.location.clone(), scripts)
        })
        .collect();

    print_workspace_table(&rows);
    Ok(())
}
