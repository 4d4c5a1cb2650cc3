//! Mutation gate: two-phase preview/confirm protocol for file edits.
//!
//! No filesystem write happens without a freshly computed diff of exactly
//! that change immediately preceding it. The proposal is ephemeral: it lives
//! between preview and confirm/cancel and is never persisted.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use similar::TextDiff;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use super::path_utils::resolve_workspace_path;
use super::ToolTrait;
use crate::confirm::{Confirmation, ConfirmationProvider};

#[derive(Error, Debug)]
pub enum EditError {
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("target must be non-empty")]
    EmptyTarget,

    #[error("target not found in file")]
    TargetMissing,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A previewed edit, ready to apply. Holds the resulting content so the
/// apply phase writes exactly what the operator saw.
#[derive(Debug, Clone)]
pub struct EditProposal {
    pub path: PathBuf,
    pub display_path: String,
    pub diff: String,
    pub updated: String,
}

/// Preview/apply pair wrapping the `edit_file` tool.
pub struct MutationGate {
    workspace: PathBuf,
}

impl MutationGate {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }

    /// Compute the updated content (first occurrence of `target` replaced)
    /// and a unified diff. Any failure yields no proposal and no mutation.
    pub async fn preview(
        &self,
        path_str: &str,
        target: &str,
        replacement: &str,
    ) -> Result<EditProposal, EditError> {
        let path = resolve_workspace_path(path_str, &self.workspace)
            .map_err(|_| EditError::InvalidPath(path_str.to_string()))?;

        if !path.is_file() {
            return Err(EditError::NotFound(path_str.to_string()));
        }
        if target.is_empty() {
            return Err(EditError::EmptyTarget);
        }

        let original = tokio::fs::read_to_string(&path).await?;
        if !original.contains(target) {
            return Err(EditError::TargetMissing);
        }

        let updated = original.replacen(target, replacement, 1);
        let diff = TextDiff::from_lines(&original, &updated)
            .unified_diff()
            .context_radius(3)
            .header(path_str, path_str)
            .to_string();

        debug!("edit preview computed for {:?}", path);
        Ok(EditProposal {
            path,
            display_path: path_str.to_string(),
            diff,
            updated,
        })
    }

    /// Write the previewed content. Callers must hold a confirmation for
    /// this exact proposal.
    pub async fn apply(&self, proposal: &EditProposal) -> Result<(), EditError> {
        tokio::fs::write(&proposal.path, &proposal.updated).await?;
        info!("applied edit to {:?}", proposal.path);
        Ok(())
    }
}

/// The `edit_file` tool: preview, then hand the diff to the injected
/// confirmation provider. Without an available channel it degrades to
/// preview-only and never applies unilaterally.
pub struct EditFileTool {
    gate: MutationGate,
    confirmation: Arc<dyn ConfirmationProvider>,
}

impl EditFileTool {
    pub fn new(workspace: PathBuf, confirmation: Arc<dyn ConfirmationProvider>) -> Self {
        Self {
            gate: MutationGate::new(workspace),
            confirmation,
        }
    }
}

#[derive(Deserialize)]
struct EditFileArgs {
    path: String,
    target: String,
    replacement: String,
}

#[async_trait]
impl ToolTrait for EditFileTool {
    fn name(&self) -> &str {
        "edit_file"
    }
    fn description(&self) -> &str {
        "Edit a file by replacing the first occurrence of a target string with a replacement string. \
         This tool will show a diff and requires user confirmation."
    }
    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string" },
                "target": { "type": "string" },
                "replacement": { "type": "string" }
            },
            "required": ["path", "target", "replacement"]
        })
    }
    async fn execute(
        &self,
        args: serde_json::Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let args: EditFileArgs = serde_json::from_value(args)?;

        let proposal = match self
            .gate
            .preview(&args.path, &args.target, &args.replacement)
            .await
        {
            Ok(proposal) => proposal,
            Err(e) => {
                debug!("edit preview failed: {}", e);
                return Ok("error: edit preview failed".to_string());
            }
        };

        match self.confirmation.confirm(&proposal.diff).await {
            Confirmation::Approved => match self.gate.apply(&proposal).await {
                Ok(()) => Ok("ok".to_string()),
                Err(e) => Ok(format!("error: {}", e)),
            },
            Confirmation::Denied => Ok("canceled".to_string()),
            Confirmation::Unavailable => Ok(format!("preview:\n{}", proposal.diff)),
        }
    }
}
