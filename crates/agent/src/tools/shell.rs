//! Shell command tool.
//!
//! Runs in the workspace root but is not path-confined; this is a wider
//! trust boundary than the file tools, by contract.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::ToolTrait;

pub struct RunShellTool {
    workspace: PathBuf,
    timeout_secs: u64,
}

impl RunShellTool {
    pub fn new(workspace: PathBuf, timeout_secs: u64) -> Self {
        Self {
            workspace,
            timeout_secs,
        }
    }
}

#[derive(Deserialize)]
struct RunShellArgs {
    command: String,
}

#[async_trait]
impl ToolTrait for RunShellTool {
    fn name(&self) -> &str {
        "run_shell"
    }
    fn description(&self) -> &str {
        "Run a shell command in the project root and return stdout/stderr."
    }
    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": { "command": { "type": "string" } },
            "required": ["command"]
        })
    }
    async fn execute(
        &self,
        args: serde_json::Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let args: RunShellArgs = serde_json::from_value(args)?;
        let command = args.command.trim();
        if command.is_empty() {
            return Ok("error: command must be non-empty".to_string());
        }

        debug!("running: {}", command);
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .current_dir(&self.workspace)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(
            tokio::time::Duration::from_secs(self.timeout_secs),
            cmd.output(),
        )
        .await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Ok(format!("error: {}", e)),
            Err(_) => {
                return Ok(format!(
                    "error: command timed out after {} seconds",
                    self.timeout_secs
                ))
            }
        };

        // Exit code plus both streams, even on non-zero exit.
        Ok(format!(
            "exit_code: {}\nstdout:\n{}\nstderr:\n{}",
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        ))
    }
}
