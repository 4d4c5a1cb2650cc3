//! File read/write tools, confined to the workspace root.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use tracing::debug;

use super::path_utils::resolve_workspace_path;
use super::ToolTrait;

pub struct ReadFileTool {
    workspace: PathBuf,
}

impl ReadFileTool {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }
}

#[derive(Deserialize)]
struct ReadFileArgs {
    path: String,
}

#[async_trait]
impl ToolTrait for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }
    fn description(&self) -> &str {
        "Read a text file from the project workspace by relative path."
    }
    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": { "path": { "type": "string" } },
            "required": ["path"]
        })
    }
    async fn execute(
        &self,
        args: serde_json::Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let args: ReadFileArgs = serde_json::from_value(args)?;

        let path = match resolve_workspace_path(&args.path, &self.workspace) {
            Ok(path) if path.is_file() => path,
            _ => return Ok("error: file not found or invalid path".to_string()),
        };

        debug!("reading {:?}", path);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) => Ok(format!("error: {}", e)),
        }
    }
}

pub struct WriteFileTool {
    workspace: PathBuf,
}

impl WriteFileTool {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }
}

#[derive(Deserialize)]
struct WriteFileArgs {
    path: String,
    content: String,
}

#[async_trait]
impl ToolTrait for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }
    fn description(&self) -> &str {
        "Write text content to a file in the project workspace by relative path."
    }
    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string" },
                "content": { "type": "string" }
            },
            "required": ["path", "content"]
        })
    }
    async fn execute(
        &self,
        args: serde_json::Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let args: WriteFileArgs = serde_json::from_value(args)?;

        let path = match resolve_workspace_path(&args.path, &self.workspace) {
            Ok(path) => path,
            Err(_) => return Ok("error: invalid path".to_string()),
        };

        // The file may be new, but its parent directory must already exist.
        match path.parent() {
            Some(parent) if parent.is_dir() => {}
            _ => return Ok("error: parent directory does not exist".to_string()),
        }

        debug!("writing {} bytes to {:?}", args.content.len(), path);
        match tokio::fs::write(&path, &args.content).await {
            Ok(()) => Ok("ok".to_string()),
            Err(e) => Ok(format!("error: {}", e)),
        }
    }
}
