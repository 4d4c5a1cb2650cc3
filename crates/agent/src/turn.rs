//! Turn loop and round bounder.
//!
//! One turn takes a user utterance through model rounds and tool executions
//! to a final answer. History is append-only and survives error turns, so a
//! bound-exceeded turn still leaves its tool exchanges visible to the next
//! one.

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use skiff_provider::{ChatParams, Message, Provider, Tool, ToolCallDef};
use skiff_skills::SkillCatalog;

use crate::confirm::ConfirmationProvider;
use crate::extract::{extract_intent, Intent, ResponseContent};
use crate::tools::{register_default_tools, ToolRegistry};
use crate::{AgentError, Result};

const BASE_SYSTEM_PROMPT: &str = "You are a helpful assistant. \
When using tools, do not precompute or transform math expressions into numbers. \
Only call tools with the original expression. \
When a tool is needed, you must use tool_calls and never output JSON in plain text. \
Before editing a file, you must read it. After editing, read it again to verify changes.";

/// Loop tuning knobs.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub max_tool_rounds: u32,
    pub shell_timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_tool_rounds: 15,
            shell_timeout_secs: 30,
            max_tokens: 4096,
            temperature: 0.2,
        }
    }
}

/// The agent loop: conversation state, tool registry, skill catalog, and the
/// provider port, owned together. Strictly sequential; one turn fully
/// resolves before the next begins.
pub struct AgentLoop<P: Provider> {
    provider: P,
    model: String,
    system_prompt: String,
    history: Vec<Message>,
    tools: ToolRegistry,
    skills: SkillCatalog,
    settings: AgentSettings,
}

impl<P: Provider> AgentLoop<P> {
    pub fn new(
        provider: P,
        model: impl Into<String>,
        workspace: &Path,
        skills: SkillCatalog,
        confirmation: Arc<dyn ConfirmationProvider>,
        settings: AgentSettings,
    ) -> Self {
        // Canonicalize once at startup; the containment checks are lexical
        // against this root from here on.
        let workspace: PathBuf = workspace
            .canonicalize()
            .unwrap_or_else(|_| workspace.to_path_buf());

        let mut tools = ToolRegistry::new();
        register_default_tools(&mut tools, &workspace, settings.shell_timeout_secs, confirmation);

        let mut system_prompt = BASE_SYSTEM_PROMPT.to_string();
        if let Some(metadata) = skills.metadata_prompt() {
            system_prompt.push_str("\n\n");
            system_prompt.push_str(&metadata);
        }

        Self {
            provider,
            model: model.into(),
            system_prompt,
            history: Vec::new(),
            tools,
            skills,
            settings,
        }
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Definition for the meta-tool resolved against the skill catalog by
    /// the loop itself rather than the generic registry.
    fn get_skill_tool() -> Tool {
        Tool::new(
            "get_skill",
            "Load full content for a specific skill by skill name.",
            json!({
                "type": "object",
                "properties": { "skill_name": { "type": "string" } },
                "required": ["skill_name"]
            }),
        )
    }

    fn active_tool_specs(&self) -> Vec<Tool> {
        let mut specs = self.tools.definitions();
        specs.push(Self::get_skill_tool());
        specs
    }

    /// Run one turn: user text in, final answer (or surfaced tool result)
    /// out. Provider transport failure and the round bound are the only
    /// error paths; tool failures come back as text inside the turn.
    pub async fn run_turn(&mut self, user_text: &str) -> Result<String> {
        self.history.push(Message::user(user_text));

        let mut rounds = 0u32;
        loop {
            let params = ChatParams {
                model: self.model.clone(),
                messages: self.messages_with_system(),
                tools: self.active_tool_specs(),
                max_tokens: self.settings.max_tokens,
                temperature: self.settings.temperature,
            };

            let response = self
                .provider
                .chat(params)
                .await
                .map_err(|e| AgentError::Provider(e.to_string()))?;

            if response.has_tool_calls() {
                debug!("round {}: {} tool calls", rounds + 1, response.tool_calls.len());

                let defs: Vec<ToolCallDef> = response
                    .tool_calls
                    .iter()
                    .map(|tc| ToolCallDef::new(&tc.id, &tc.name, &tc.arguments))
                    .collect();
                let mut assistant = Message::assistant(
                    ResponseContent::ingest(&response.content).to_history_text(),
                );
                assistant.tool_calls = Some(defs);
                self.history.push(assistant);

                // Sequential and in listed order: a later call may depend on
                // an earlier call's side effects within the same round.
                for call in &response.tool_calls {
                    let result = match decode_arguments(&call.arguments) {
                        Ok(args) => self.execute_call(&call.name, args).await,
                        Err(e) => {
                            warn!("malformed arguments for {}: {}", call.name, e);
                            format!("error: invalid tool arguments: {}", e)
                        }
                    };
                    self.history.push(Message::tool(&call.id, &call.name, result));
                }

                rounds += 1;
                if rounds >= self.settings.max_tool_rounds {
                    return Err(AgentError::MaxRounds);
                }
                continue;
            }

            let content = ResponseContent::ingest(&response.content);
            match extract_intent(&content) {
                Intent::Invoke(intent) => {
                    debug!("fallback extraction: {}", intent.name);
                    // Single round: the result is surfaced directly with no
                    // further model round-trip.
                    let result = self.execute_call(&intent.name, intent.arguments).await;
                    self.history.push(Message::assistant(content.to_history_text()));
                    self.history.push(Message::tool_unkeyed(result.clone()));
                    return Ok(result);
                }
                Intent::FinalAnswer(text) => {
                    self.history.push(Message::assistant(text.clone()));
                    return Ok(text);
                }
            }
        }
    }

    fn messages_with_system(&self) -> Vec<Message> {
        let mut messages = vec![Message::system(self.system_prompt.clone())];
        messages.extend(self.history.iter().cloned());
        messages
    }

    /// `get_skill` is intercepted here because it needs the catalog; all
    /// other names go through the generic dispatcher.
    async fn execute_call(&self, name: &str, args: Value) -> String {
        if name == "get_skill" {
            let skill_name = args
                .get("skill_name")
                .and_then(Value::as_str)
                .unwrap_or("")
                .trim()
                .to_string();
            return match self.skills.get(&skill_name) {
                Some(skill) => skill.full_text(),
                None => format!("error: skill not found: {}", skill_name),
            };
        }
        self.tools.dispatch(name, args).await
    }
}

/// Structured call arguments arrive as a JSON-encoded object string and are
/// decoded to a mapping before dispatch. Malformed arguments synthesize an
/// error tool result for that call; they do not abort the turn.
fn decode_arguments(raw: &str) -> std::result::Result<Value, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_str(raw)
}
