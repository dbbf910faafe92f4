//! `package.json` schemas for the workspace root and individual packages.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// File name of both the root marker and per-package descriptors.
pub const MANIFEST_FILE: &str = "package.json";

/// The `workspaces` field accepts either a glob list or yarn's object form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum WorkspacesValue {
    Globs(Vec<String>),
    Object {
        #[serde(default)]
        packages: Vec<String>,
    },
}

fn deserialize_workspaces<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<WorkspacesValue> = Option::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        WorkspacesValue::Globs(globs) => globs,
        WorkspacesValue::Object { packages } => packages,
    }))
}

/// The root marker file. Only the workspace glob list matters here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RootManifest {
    #[serde(default, deserialize_with = "deserialize_workspaces")]
    pub workspaces: Option<Vec<String>>,
}

impl RootManifest {
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    /// Reads `package.json` from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&path)?;
        Self::from_json(&content).map_err(|e| Error::json(e, path.display().to_string()))
    }

    /// Returns the declared globs, or `None` if this manifest is not a workspace root.
    #[inline]
    pub fn workspace_globs(&self) -> Option<&[String]> {
        self.workspaces.as_deref()
    }
}

/// A package descriptor (`<location>/package.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    pub name: String,
    #[serde(default)]
    pub scripts: IndexMap<String, String>,
}

impl PackageManifest {
    /// Parses and validates a descriptor. Missing or malformed fields become
    /// [`Error::DescriptorParse`].
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let manifest: PackageManifest =
            serde_json::from_str(content).map_err(|e| Error::DescriptorParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        if manifest.name.trim().is_empty() {
            return Err(Error::DescriptorParse {
                path: path.to_path_buf(),
                message: "field 'name' must not be empty".to_string(),
            });
        }

        Ok(manifest)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::DescriptorParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(path, &content)
    }

    #[inline]
    pub fn script(&self, name: &str) -> Option<&str> {
        self.scripts
            .get(name)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_accepts_object_form() {
        let root = RootManifest::from_json(r#"{"workspaces":{"packages":["libs/*"]}}"#).unwrap();
        assert_eq!(root.workspace_globs(), Some(&["libs/*".to_string()][..]));
    }

    #[test]
    fn root_without_workspaces() {
        let root = RootManifest::from_json(r#"{"name":"app"}"#).unwrap();
        assert!(root.workspace_globs().is_none());
    }

    #[test]
    fn descriptor_requires_name() {
        let err = PackageManifest::parse(Path::new("p/package.json"), r#"{"scripts":{}}"#);
        assert!(matches!(err, Err(Error::DescriptorParse { .. })));
    }

    #[test]
    fn empty_script_counts_as_missing() {
        let pkg = PackageManifest::parse(
            Path::new("p/package.json"),
            r#"{"name":"p","scripts":{"build":"","test":"jest"}}"#,
        )
        .unwrap();
        assert_eq!(pkg.script("build"), None);
        assert_eq!(pkg.script("test"), Some("jest"));
    }
}
