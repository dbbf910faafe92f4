use std::fs;
use std::path::Path;

use serde_json::{json, Value};
use tempfile::TempDir;
use wsrun_core::{generate_references, rewrite_references, Error, LocateOptions, Workspace};

fn create_package(root: &Path, location: &str) {
    let dir = root.join(location);
    fs::create_dir_all(&dir).unwrap();
    let name = location.rsplit('/').next().unwrap();
    fs::write(dir.join("package.json"), json!({ "name": name }).to_string()).unwrap();
}

#[test]
fn test_references_appended_with_two_space_indent() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(
        root.join("tsconfig.json"),
        r#"{"compilerOptions":{"strict":true,"target":"es2020"},"files":[]}"#,
    )
    .unwrap();

    let workspaces = vec![
        Workspace::new("a", "packages/a"),
        Workspace::new("b", "packages/b"),
    ];
    rewrite_references(root, "tsconfig.json", &workspaces).unwrap();

    let written = fs::read_to_string(root.join("tsconfig.json")).unwrap();
    let expected = r#"{
  "compilerOptions": {
    "strict": true,
    "target": "es2020"
  },
  "files": [],
  "references": [
    {
      "path": "packages/a"
    },
    {
      "path": "packages/b"
    }
  ]
}"#;
    assert_eq!(written, expected);
}

#[test]
fn test_existing_references_replaced_in_place() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(
        root.join("tsconfig.json"),
        r#"{"references":[{"path":"old"},{"path":"stale","prepend":true}],"include":["src"]}"#,
    )
    .unwrap();

    rewrite_references(root, "tsconfig.json", &[Workspace::new("x", "packages/x")]).unwrap();

    let written: Value =
        serde_json::from_str(&fs::read_to_string(root.join("tsconfig.json")).unwrap()).unwrap();
    let keys: Vec<&String> = written.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["references", "include"]);
    assert_eq!(written["references"], json!([{ "path": "packages/x" }]));
    assert_eq!(written["include"], json!(["src"]));
}

#[test]
fn test_non_object_config_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("tsconfig.json"), "[]").unwrap();

    let err = rewrite_references(temp_dir.path(), "tsconfig.json", &[]).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig { .. }));
}

#[test]
fn test_generate_uses_every_enumerated_workspace() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(
        root.join("package.json"),
        r#"{"private":true,"workspaces":["packages/*","apps/*","tools/*"]}"#,
    )
    .unwrap();
    fs::write(root.join("tsconfig.json"), r#"{"files":[]}"#).unwrap();
    create_package(root, "packages/core");
    create_package(root, "apps/web");
    create_package(root, "tools/lint");

    let start = root.join("packages/core");
    let report = generate_references(&LocateOptions::new(&start), None).unwrap();

    assert_eq!(report.references, 2);
    assert!(report.invalid.is_empty());

    let written: Value =
        serde_json::from_str(&fs::read_to_string(root.join("tsconfig.json")).unwrap()).unwrap();
    assert_eq!(
        written["references"],
        json!([{ "path": "packages/core" }, { "path": "apps/web" }])
    );
}

#[test]
fn test_generate_honours_configured_file() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(root.join("package.json"), r#"{"workspaces":["packages/*"]}"#).unwrap();
    fs::write(
        root.join("wsrun.toml"),
        "[generate]\nreferences_file = \"tsconfig.build.json\"\n",
    )
    .unwrap();
    fs::write(root.join("tsconfig.build.json"), "{}").unwrap();
    create_package(root, "packages/core");

    let report = generate_references(&LocateOptions::new(root), None).unwrap();
    assert!(report.path.ends_with("tsconfig.build.json"));

    let written: Value =
        serde_json::from_str(&fs::read_to_string(&report.path).unwrap()).unwrap();
    assert_eq!(written["references"], json!([{ "path": "packages/core" }]));
}
