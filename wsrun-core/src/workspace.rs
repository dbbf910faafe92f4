//! Workspace descriptors produced by the scanner.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::manifest::MANIFEST_FILE;

/// A package inside the monorepo.
///
/// `location` is relative to the workspace root and always uses `/` as the
/// separator, so prefix checks such as `packages/` behave the same on every
/// platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub name: String,
    pub location: String,
}

impl Workspace {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
        }
    }

    /// Final path segment of the location; the key for ordering and exclusion.
    #[inline]
    pub fn short_name(&self) -> &str {
        self.location
            .rsplit('/')
            .next()
            .unwrap_or(self.location.as_str())
    }

    pub fn dir(&self, root: &Path) -> PathBuf {
        root.join(&self.location)
    }

    pub fn manifest_path(&self, root: &Path) -> PathBuf {
        self.dir(root).join(MANIFEST_FILE)
    }
}

/// Converts a path relative to the root into a `/`-separated location.
pub(crate) fn to_location(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(n) => Some(n.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_name_is_last_segment() {
        assert_eq!(Workspace::new("@scope/ui", "packages/ui").short_name(), "ui");
        assert_eq!(Workspace::new("x", "packages/nested/deep").short_name(), "deep");
        assert_eq!(Workspace::new("y", "single").short_name(), "single");
    }

    #[test]
    fn location_uses_forward_slashes() {
        let rel: PathBuf = ["packages", "a"].iter().collect();
        assert_eq!(to_location(&rel), "packages/a");
    }
}
