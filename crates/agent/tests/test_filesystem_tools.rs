//! File tool behavior through the dispatcher boundary.

use serde_json::json;
use skiff_agent::confirm::NoChannel;
use skiff_agent::tools::{register_default_tools, ToolRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

fn registry_for(workspace: &std::path::Path) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    register_default_tools(&mut registry, workspace, 30, Arc::new(NoChannel));
    registry
}

fn workspace() -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    (temp, root)
}

#[tokio::test]
async fn test_read_file_roundtrip() {
    let (_temp, root) = workspace();
    std::fs::write(root.join("notes.txt"), "hello workspace").unwrap();

    let registry = registry_for(&root);
    let result = registry
        .dispatch("read_file", json!({"path": "notes.txt"}))
        .await;
    assert_eq!(result, "hello workspace");
}

#[tokio::test]
async fn test_read_file_missing() {
    let (_temp, root) = workspace();
    let registry = registry_for(&root);

    let result = registry
        .dispatch("read_file", json!({"path": "missing.txt"}))
        .await;
    assert_eq!(result, "error: file not found or invalid path");
}

#[tokio::test]
async fn test_read_file_escape_blocked() {
    let (_temp, root) = workspace();
    let registry = registry_for(&root);

    for path in ["../secret", "/etc/passwd", "sub/../../escape.txt"] {
        let result = registry.dispatch("read_file", json!({ "path": path })).await;
        assert_eq!(result, "error: file not found or invalid path", "path: {}", path);
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_read_file_symlink_escape_blocked() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("ws");
    let outside = temp.path().join("outside");
    std::fs::create_dir_all(&root).unwrap();
    std::fs::create_dir_all(&outside).unwrap();
    let root = root.canonicalize().unwrap();
    std::fs::write(outside.join("secret.txt"), "TOP SECRET").unwrap();
    std::os::unix::fs::symlink(outside.join("secret.txt"), root.join("link.txt")).unwrap();

    let registry = registry_for(&root);
    let result = registry
        .dispatch("read_file", json!({"path": "link.txt"}))
        .await;
    assert_eq!(result, "error: file not found or invalid path");
}

#[tokio::test]
async fn test_write_file_new_file() {
    let (_temp, root) = workspace();
    let registry = registry_for(&root);

    let result = registry
        .dispatch("write_file", json!({"path": "out.txt", "content": "data"}))
        .await;
    assert_eq!(result, "ok");
    assert_eq!(std::fs::read_to_string(root.join("out.txt")).unwrap(), "data");
}

#[tokio::test]
async fn test_write_file_requires_existing_parent() {
    let (_temp, root) = workspace();
    let registry = registry_for(&root);

    let result = registry
        .dispatch(
            "write_file",
            json!({"path": "no/such/dir/out.txt", "content": "data"}),
        )
        .await;
    assert_eq!(result, "error: parent directory does not exist");
    assert!(!root.join("no").exists());
}

#[tokio::test]
async fn test_write_file_escape_blocked() {
    let (_temp, root) = workspace();
    let registry = registry_for(&root);

    let result = registry
        .dispatch(
            "write_file",
            json!({"path": "../outside.txt", "content": "data"}),
        )
        .await;
    assert_eq!(result, "error: invalid path");
}

#[tokio::test]
async fn test_write_file_overwrites_existing() {
    let (_temp, root) = workspace();
    std::fs::write(root.join("file.txt"), "old").unwrap();
    let registry = registry_for(&root);

    let result = registry
        .dispatch("write_file", json!({"path": "file.txt", "content": "new"}))
        .await;
    assert_eq!(result, "ok");
    assert_eq!(std::fs::read_to_string(root.join("file.txt")).unwrap(), "new");
}
