//! Tool configuration: locator options and the optional `wsrun.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Name of the optional workspace-level configuration file.
pub const CONFIG_FILE: &str = "wsrun.toml";

/// Inputs for [`crate::locator::locate_root`].
#[derive(Debug, Clone)]
pub struct LocateOptions {
    /// Directory the upward walk starts from.
    pub start_dir: PathBuf,
    /// Marker file checked at every level.
    pub marker_file: String,
    /// Directory name treated as a project boundary.
    pub dependency_cache_dir: String,
    /// Step over dependency-cache directories instead of failing on them.
    pub cross_dependency_cache: bool,
}

impl LocateOptions {
    pub fn new(start_dir: impl Into<PathBuf>) -> Self {
        Self {
            start_dir: start_dir.into(),
            marker_file: crate::manifest::MANIFEST_FILE.to_string(),
            dependency_cache_dir: "node_modules".to_string(),
            cross_dependency_cache: false,
        }
    }

    pub fn cross_dependency_cache(mut self, cross: bool) -> Self {
        self.cross_dependency_cache = cross;
        self
    }
}

/// How a package script is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunnerKind {
    #[default]
    Yarn,
    Npm,
    Pnpm,
    /// Runs the descriptor's script string through `sh -c`.
    Shell,
}

impl RunnerKind {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            RunnerKind::Yarn => "yarn",
            RunnerKind::Npm => "npm",
            RunnerKind::Pnpm => "pnpm",
            RunnerKind::Shell => "shell",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "yarn" => Some(RunnerKind::Yarn),
            "npm" => Some(RunnerKind::Npm),
            "pnpm" => Some(RunnerKind::Pnpm),
            "shell" | "sh" => Some(RunnerKind::Shell),
            _ => None,
        }
    }
}

fn default_ignore() -> Vec<String> {
    vec!["tools/".to_string()]
}

fn default_package_prefix() -> String {
    "packages/".to_string()
}

fn default_force_color() -> String {
    "3".to_string()
}

fn default_references_file() -> String {
    "tsconfig.json".to_string()
}

/// `[workspace]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumerateSection {
    /// Location prefixes that are never enumerated.
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
}

impl Default for EnumerateSection {
    fn default() -> Self {
        Self {
            ignore: default_ignore(),
        }
    }
}

/// `[run]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSection {
    #[serde(default)]
    pub runner: RunnerKind,
    /// Only workspaces whose location starts with this prefix are run.
    #[serde(default = "default_package_prefix")]
    pub package_prefix: String,
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub silent: bool,
    #[serde(default)]
    pub order: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Upper bound on concurrent tasks in parallel mode.
    pub jobs: Option<usize>,
    /// Value of `FORCE_COLOR` handed to every child.
    #[serde(default = "default_force_color")]
    pub force_color: String,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            runner: RunnerKind::default(),
            package_prefix: default_package_prefix(),
            parallel: false,
            silent: false,
            order: Vec::new(),
            exclude: Vec::new(),
            jobs: None,
            force_color: default_force_color(),
        }
    }
}

/// `[generate]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateSection {
    #[serde(default = "default_references_file")]
    pub references_file: String,
}

impl Default for GenerateSection {
    fn default() -> Self {
        Self {
            references_file: default_references_file(),
        }
    }
}

/// Workspace-level configuration as defined in `wsrun.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(default)]
    pub workspace: EnumerateSection,
    #[serde(default)]
    pub run: RunSection,
    #[serde(default)]
    pub generate: GenerateSection,
    /// Path the config was read from, if any.
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl WorkspaceConfig {
    /// Loads `wsrun.toml` from the workspace root. A missing file yields defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let mut config: WorkspaceConfig = toml::from_str(&content).map_err(|error| Error::Toml {
            error,
            context: path.display().to_string(),
        })?;
        config.config_path = Some(path);
        Ok(config)
    }
}
