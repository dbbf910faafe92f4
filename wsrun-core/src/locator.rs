//! Upward search for the monorepo root.

use std::path::{Path, PathBuf};

use crate::config::LocateOptions;
use crate::error::{Error, Result};
use crate::manifest::RootManifest;

fn declares_workspaces(dir: &Path, marker_file: &str) -> bool {
    let marker = dir.join(marker_file);
    if !marker.is_file() {
        return false;
    }

    let parsed = std::fs::read_to_string(&marker)
        .map_err(Error::from)
        .and_then(|content| {
            RootManifest::from_json(&content)
                .map_err(|e| Error::json(e, marker.display().to_string()))
        });

    match parsed {
        Ok(manifest) => manifest.workspace_globs().is_some(),
        Err(e) => {
            tracing::warn!("ignoring unreadable marker {}: {}", marker.display(), e);
            false
        }
    }
}

/// Walks up from `options.start_dir` to the first directory whose marker file
/// declares `workspaces`.
///
/// Fails with [`Error::RootNotFound`] at the filesystem root, or on reaching a
/// dependency-cache directory unless `cross_dependency_cache` is set.
pub fn locate_root(options: &LocateOptions) -> Result<PathBuf> {
    let start = options.start_dir.canonicalize()?;

    let not_found = || Error::RootNotFound {
        start: start.clone(),
    };

    let mut current_dir = start.as_path();

    loop {
        let in_cache = current_dir
            .file_name()
            .is_some_and(|name| name == options.dependency_cache_dir.as_str());

        if in_cache {
            if !options.cross_dependency_cache {
                tracing::debug!("stopped at dependency cache {}", current_dir.display());
                return Err(not_found());
            }
        } else if declares_workspaces(current_dir, &options.marker_file) {
            tracing::debug!("workspace root: {}", current_dir.display());
            return Ok(current_dir.to_path_buf());
        }

        match current_dir.parent() {
            Some(parent) if parent != current_dir => current_dir = parent,
            _ => return Err(not_found()),
        }
    }
}
