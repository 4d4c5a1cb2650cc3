//! Tool registry and dispatcher.

pub mod calc;
pub mod edit;
pub mod filesystem;
pub mod path_utils;
pub mod shell;

pub use calc::CalculatorTool;
pub use edit::{EditFileTool, EditProposal, MutationGate};
pub use filesystem::{ReadFileTool, WriteFileTool};
pub use path_utils::resolve_workspace_path;
pub use shell::RunShellTool;

use async_trait::async_trait;
use serde_json::Value;
use skiff_provider::Tool;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

use crate::confirm::ConfirmationProvider;

type BoxedTool = Box<dyn ToolTrait + Send + Sync>;

#[async_trait]
pub trait ToolTrait: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters(&self) -> Value;
    async fn execute(
        &self,
        args: Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}

pub fn to_provider_tool(tool: &dyn ToolTrait) -> Tool {
    Tool::new(tool.name(), tool.description(), tool.parameters())
}

/// Static tool catalog. `get_skill` is not registered here; the turn loop
/// intercepts it because it needs the skill catalog.
pub struct ToolRegistry {
    tools: HashMap<String, BoxedTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register<T: ToolTrait + 'static>(&mut self, tool: T) {
        let name = tool.name().to_string();
        self.tools.insert(name, Box::new(tool));
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn definitions(&self) -> Vec<Tool> {
        self.tools
            .values()
            .map(|t| to_provider_tool(t.as_ref()))
            .collect()
    }

    /// Dispatch a call to a named tool. Never propagates an error past this
    /// boundary: unknown tools, bad arguments, and execution failures all
    /// come back as descriptive `error: ...` text.
    pub async fn dispatch(&self, name: &str, args: Value) -> String {
        let Some(tool) = self.tools.get(name) else {
            return format!("error: unknown tool: {}", name);
        };
        match tool.execute(args).await {
            Ok(result) => result,
            Err(e) => {
                warn!("tool {} failed: {}", name, e);
                format!("error: {}", e)
            }
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Register the static catalog: calculator plus the workspace-confined file
/// tools and the shell tool.
pub fn register_default_tools(
    registry: &mut ToolRegistry,
    workspace: &Path,
    shell_timeout_secs: u64,
    confirmation: Arc<dyn ConfirmationProvider>,
) {
    registry.register(CalculatorTool);
    registry.register(ReadFileTool::new(workspace.to_path_buf()));
    registry.register(WriteFileTool::new(workspace.to_path_buf()));
    registry.register(EditFileTool::new(workspace.to_path_buf(), confirmation));
    registry.register(RunShellTool::new(
        workspace.to_path_buf(),
        shell_timeout_secs,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::NoChannel;

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        register_default_tools(
            &mut registry,
            Path::new("/tmp"),
            30,
            Arc::new(NoChannel),
        );
        registry
    }

    #[test]
    fn test_static_catalog_names() {
        let registry = registry();
        for name in ["calculator", "read_file", "write_file", "edit_file", "run_shell"] {
            assert!(registry.has(name), "missing {}", name);
        }
        assert!(!registry.has("get_skill"));
        assert_eq!(registry.definitions().len(), 5);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool_is_text() {
        let result = registry().dispatch("nope", serde_json::json!({})).await;
        assert_eq!(result, "error: unknown tool: nope");
    }

    #[tokio::test]
    async fn test_dispatch_bad_arguments_is_text() {
        let result = registry().dispatch("calculator", serde_json::json!({})).await;
        assert!(result.starts_with("error: "));
    }
}
