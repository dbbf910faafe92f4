use std::fs;
use std::path::Path;

use tempfile::TempDir;
use wsrun_core::{Error, Scanner, WorkspaceConfig};

fn write_root(root: &Path, globs: &[&str]) {
    let manifest = serde_json::json!({ "private": true, "workspaces": globs });
    fs::write(root.join("package.json"), manifest.to_string()).unwrap();
}

fn create_package(root: &Path, location: &str, name: &str) {
    let dir = root.join(location);
    fs::create_dir_all(&dir).unwrap();
    let manifest = serde_json::json!({ "name": name, "scripts": { "build": "echo build" } });
    fs::write(dir.join("package.json"), manifest.to_string()).unwrap();
}

fn locations(root: &Path) -> Vec<String> {
    let mut scanner = Scanner::new(root);
    scanner
        .scan()
        .unwrap()
        .into_iter()
        .map(|ws| ws.location)
        .collect()
}

#[test]
fn test_scan_preserves_pattern_order() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_root(root, &["packages/*", "apps/*"]);
    create_package(root, "apps/web", "@repo/web");
    create_package(root, "packages/b", "@repo/b");
    create_package(root, "packages/a", "@repo/a");

    assert_eq!(locations(root), vec!["packages/a", "packages/b", "apps/web"]);
}

#[test]
fn test_scan_does_not_deduplicate() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_root(root, &["packages/*", "packages/*"]);
    create_package(root, "packages/a", "@repo/a");

    let mut scanner = Scanner::new(root);
    let workspaces = scanner.scan().unwrap();
    assert_eq!(workspaces.len(), 2);
    assert_eq!(workspaces[0], workspaces[1]);
    assert_eq!(workspaces[0].name, "@repo/a");
}

#[test]
fn test_scan_excludes_tools() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_root(root, &["tools/*", "packages/*", "tools/nested/*"]);
    create_package(root, "tools/lint", "lint");
    create_package(root, "tools/nested/gen", "gen");
    create_package(root, "packages/a", "a");

    assert_eq!(locations(root), vec!["packages/a"]);
}

#[test]
fn test_scan_skips_malformed_descriptors() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_root(root, &["packages/*"]);
    create_package(root, "packages/a", "a");
    fs::create_dir_all(root.join("packages/broken")).unwrap();
    fs::write(root.join("packages/broken/package.json"), "{ not json").unwrap();
    fs::create_dir_all(root.join("packages/nameless")).unwrap();
    fs::write(root.join("packages/nameless/package.json"), r#"{"version":"1.0.0"}"#).unwrap();

    let mut scanner = Scanner::new(root);
    let workspaces = scanner.scan().unwrap();

    assert_eq!(workspaces.len(), 1);
    assert_eq!(workspaces[0].location, "packages/a");

    let invalid: Vec<_> = scanner
        .invalid_descriptors()
        .iter()
        .map(|d| d.path.strip_prefix(root).unwrap().to_path_buf())
        .collect();
    assert_eq!(invalid.len(), 2);
    assert!(invalid.contains(&Path::new("packages/broken/package.json").to_path_buf()));
    assert!(invalid.contains(&Path::new("packages/nameless/package.json").to_path_buf()));
}

#[test]
fn test_scan_ignores_dirs_without_descriptor() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_root(root, &["packages/*"]);
    create_package(root, "packages/a", "a");
    fs::create_dir_all(root.join("packages/empty")).unwrap();

    assert_eq!(locations(root), vec!["packages/a"]);
}

#[test]
fn test_scan_with_configured_ignore() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_root(root, &["packages/*", "tools/*"]);
    create_package(root, "packages/a", "a");
    create_package(root, "packages/legacy", "legacy");
    create_package(root, "tools/lint", "lint");
    fs::write(
        root.join("wsrun.toml"),
        "[workspace]\nignore = [\"packages/legacy\"]\n",
    )
    .unwrap();

    let config = WorkspaceConfig::load(root).unwrap();
    let mut scanner = Scanner::with_config(root, &config);
    let found: Vec<String> = scanner
        .scan()
        .unwrap()
        .into_iter()
        .map(|ws| ws.location)
        .collect();

    assert_eq!(found, vec!["packages/a", "tools/lint"]);
}

#[test]
fn test_scan_requires_workspaces_field() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("package.json"), r#"{"name":"solo"}"#).unwrap();

    let mut scanner = Scanner::new(temp_dir.path());
    assert!(matches!(scanner.scan(), Err(Error::RootNotFound { .. })));
}
