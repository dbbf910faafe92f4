//! Workspace enumeration from the root manifest's glob list.

use std::path::{Path, PathBuf};

use crate::config::WorkspaceConfig;
use crate::error::{Error, Result};
use crate::manifest::{PackageManifest, RootManifest, MANIFEST_FILE};
use crate::workspace::{to_location, Workspace};

/// A descriptor that matched a glob but could not be read or parsed.
#[derive(Debug, Clone)]
pub struct InvalidDescriptor {
    pub path: PathBuf,
    pub message: String,
}

/// Expands the root's `workspaces` globs into [`Workspace`] descriptors.
///
/// Output order is pattern order, then match order within a pattern. Nothing
/// is de-duplicated. Malformed descriptors are recorded and skipped.
pub struct Scanner {
    root: PathBuf,
    ignore: Vec<String>,
    invalid: Vec<InvalidDescriptor>,
}

impl Scanner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            ignore: crate::config::EnumerateSection::default().ignore,
            invalid: Vec::new(),
        }
    }

    pub fn with_config(root: impl AsRef<Path>, config: &WorkspaceConfig) -> Self {
        Self::new(root).with_ignore(config.workspace.ignore.clone())
    }

    /// Replaces the reserved location prefixes.
    pub fn with_ignore(mut self, prefixes: Vec<String>) -> Self {
        self.ignore = prefixes;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Descriptors skipped during the last [`Scanner::scan`].
    pub fn invalid_descriptors(&self) -> &[InvalidDescriptor] {
        &self.invalid
    }

    pub fn scan(&mut self) -> Result<Vec<Workspace>> {
        self.invalid.clear();

        let root_manifest = RootManifest::load(&self.root)?;
        let globs = root_manifest
            .workspace_globs()
            .ok_or_else(|| Error::RootNotFound {
                start: self.root.clone(),
            })?
            .to_vec();

        let mut descriptor_files = Vec::new();
        for pattern in &globs {
            descriptor_files.extend(self.expand(pattern)?);
        }

        let mut workspaces = Vec::with_capacity(descriptor_files.len());
        for path in descriptor_files {
            match self.read_descriptor(&path) {
                Ok(workspace) => workspaces.push(workspace),
                Err(e) => {
                    tracing::debug!("skipping {}: {}", path.display(), e);
                    self.invalid.push(InvalidDescriptor {
                        message: e.to_string(),
                        path,
                    });
                }
            }
        }

        workspaces.retain(|ws| !self.is_ignored(&ws.location));
        tracing::debug!("enumerated {} workspaces", workspaces.len());
        Ok(workspaces)
    }

    fn expand(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let escaped_root = glob::Pattern::escape(&self.root.to_string_lossy());
        let full_pattern = format!(
            "{}/{}/{}",
            escaped_root.trim_end_matches('/'),
            pattern.trim_end_matches('/'),
            MANIFEST_FILE
        );

        let entries = glob::glob(&full_pattern).map_err(|e| Error::InvalidGlob {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;

        let mut matches = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) => {
                    if path.is_file() {
                        matches.push(path);
                    }
                }
                Err(e) => tracing::warn!("glob error: {}", e),
            }
        }
        Ok(matches)
    }

    fn read_descriptor(&self, path: &Path) -> Result<Workspace> {
        let manifest = PackageManifest::load(path)?;
        let dir = path.parent().unwrap_or(path);
        let relative = dir.strip_prefix(&self.root).unwrap_or(dir);
        Ok(Workspace::new(manifest.name, to_location(relative)))
    }

    fn is_ignored(&self, location: &str) -> bool {
        self.ignore
            .iter()
            .any(|prefix| location.starts_with(prefix.as_str()))
    }
}
