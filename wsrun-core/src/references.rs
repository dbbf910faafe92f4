//! Regenerates the `references` list of a shared TypeScript config.

use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};

use crate::config::{LocateOptions, WorkspaceConfig};
use crate::error::{Error, Result};
use crate::locator::locate_root;
use crate::scanner::{InvalidDescriptor, Scanner};
use crate::workspace::Workspace;

/// Replaces `references` with one `{ "path": <location> }` per workspace.
///
/// The key keeps its position if present and is appended otherwise; every
/// other key is left as it was.
pub fn with_references(mut config: Map<String, Value>, workspaces: &[Workspace]) -> Map<String, Value> {
    let references: Vec<Value> = workspaces
        .iter()
        .map(|ws| json!({ "path": ws.location }))
        .collect();
    config.insert("references".to_string(), Value::Array(references));
    config
}

/// Rewrites `<root>/<file_name>` in place with 2-space indentation.
pub fn rewrite_references(root: &Path, file_name: &str, workspaces: &[Workspace]) -> Result<PathBuf> {
    let path = root.join(file_name);
    let content = std::fs::read_to_string(&path)?;
    let context = path.display().to_string();

    let config = match serde_json::from_str::<Value>(&content).map_err(|e| Error::json(e, &context))? {
        Value::Object(map) => map,
        _ => {
            return Err(Error::InvalidConfig {
                path,
                message: "expected a JSON object at the top level".to_string(),
            })
        }
    };

    let updated = with_references(config, workspaces);
    let rendered = serde_json::to_string_pretty(&updated).map_err(|e| Error::json(e, &context))?;
    std::fs::write(&path, rendered)?;

    tracing::debug!("wrote {} references to {}", workspaces.len(), path.display());
    Ok(path)
}

/// Outcome of [`generate_references`].
#[derive(Debug, Clone)]
pub struct GenerateReport {
    pub path: PathBuf,
    pub references: usize,
    pub invalid: Vec<InvalidDescriptor>,
}

/// Locates the root, enumerates every workspace and rewrites the references
/// file named in `wsrun.toml` (default `tsconfig.json`).
pub fn generate_references(options: &LocateOptions, file_override: Option<&str>) -> Result<GenerateReport> {
    let root = locate_root(options)?;
    let config = WorkspaceConfig::load(&root)?;
    let mut scanner = Scanner::with_config(&root, &config);
    let workspaces = scanner.scan()?;

    let file_name = file_override.unwrap_or(&config.generate.references_file);
    let path = rewrite_references(&root, file_name, &workspaces)?;

    Ok(GenerateReport {
        path,
        references: workspaces.len(),
        invalid: scanner.invalid_descriptors().to_vec(),
    })
}
