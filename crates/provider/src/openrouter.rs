//! OpenRouter / OpenAI-compatible chat completions client.

use crate::*;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, trace};

pub struct OpenRouterProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenRouterProvider {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn build_request(&self, params: &ChatParams) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = params
            .messages
            .iter()
            .map(|m| {
                let mut obj = json!({ "role": &m.role });
                if let Some(content) = &m.content {
                    obj["content"] = json!(content);
                }
                if let Some(tool_calls) = &m.tool_calls {
                    obj["tool_calls"] = json!(tool_calls);
                }
                if let Some(tool_call_id) = &m.tool_call_id {
                    obj["tool_call_id"] = json!(tool_call_id);
                }
                if let Some(name) = &m.name {
                    obj["name"] = json!(name);
                }
                obj
            })
            .collect();

        let mut body = json!({
            "model": params.model,
            "messages": messages,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
        });

        if !params.tools.is_empty() {
            body["tools"] = json!(params.tools);
            body["tool_choice"] = json!("auto");
        }

        body
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<ChatResponse> {
        let choice = json["choices"]
            .get(0)
            .ok_or(ProviderError::InvalidResponse)?;
        let message = &choice["message"];
        // Content may be a string, an array, or absent; the extractor
        // handles the variants, so pass it through untouched.
        let content = message.get("content").cloned().unwrap_or(Value::Null);
        let finish_reason = choice["finish_reason"]
            .as_str()
            .unwrap_or("stop")
            .to_string();

        let mut tool_calls = Vec::new();
        if let Some(calls) = message["tool_calls"].as_array() {
            for call in calls {
                let function = &call["function"];
                let arguments = match &function["arguments"] {
                    Value::String(s) => s.clone(),
                    Value::Null => "{}".to_string(),
                    other => other.to_string(),
                };

                tool_calls.push(ToolCall {
                    id: call["id"].as_str().unwrap_or("").to_string(),
                    name: function["name"].as_str().unwrap_or("").to_string(),
                    arguments,
                });
            }
        }

        let usage = if let Some(usage) = json["usage"].as_object() {
            Usage {
                prompt_tokens: usage.get("prompt_tokens").and_then(Value::as_u64).unwrap_or(0) as u32,
                completion_tokens: usage
                    .get("completion_tokens")
                    .and_then(Value::as_u64)
                    .unwrap_or(0) as u32,
                total_tokens: usage.get("total_tokens").and_then(Value::as_u64).unwrap_or(0) as u32,
            }
        } else {
            Usage::default()
        };

        Ok(ChatResponse {
            content,
            tool_calls,
            finish_reason,
            usage,
        })
    }
}

#[async_trait::async_trait]
impl Provider for OpenRouterProvider {
    async fn chat(&self, params: ChatParams) -> Result<ChatResponse> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NoApiKey);
        }

        trace!("chat request to {}", self.base_url);
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = self.build_request(&params);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let json: serde_json::Value = response.json().await?;

        if !status.is_success() {
            let error = json["error"]["message"]
                .as_str()
                .unwrap_or("unknown error")
                .to_string();
            return Err(ProviderError::Api(format!("{} ({})", error, status)));
        }

        debug!(
            "response: {} tool calls",
            json["choices"][0]["message"]["tool_calls"]
                .as_array()
                .map(|v| v.len())
                .unwrap_or(0)
        );

        self.parse_response(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider() -> OpenRouterProvider {
        OpenRouterProvider::new("sk-or-test", "https://openrouter.ai/api/v1")
    }

    #[test]
    fn test_is_configured() {
        assert!(provider().is_configured());
        assert!(!OpenRouterProvider::new("", "https://openrouter.ai/api/v1").is_configured());
    }

    #[test]
    fn test_build_request_basic() {
        let params = ChatParams {
            model: "openrouter/auto".to_string(),
            messages: vec![Message::system("sys"), Message::user("hi")],
            tools: vec![],
            max_tokens: 1024,
            temperature: 0.2,
        };

        let request = provider().build_request(&params);
        assert_eq!(request["model"], "openrouter/auto");
        assert_eq!(request["max_tokens"], 1024);
        assert!(request.get("tools").is_none());

        let messages = request["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["content"], "hi");
    }

    #[test]
    fn test_build_request_with_tools() {
        let params = ChatParams {
            model: "openrouter/auto".to_string(),
            messages: vec![Message::user("hi")],
            tools: vec![Tool::new("calculator", "Evaluate math", json!({"type": "object"}))],
            ..Default::default()
        };

        let request = provider().build_request(&params);
        let tools = request["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["function"]["name"], "calculator");
        assert_eq!(request["tool_choice"], "auto");
    }

    #[test]
    fn test_build_request_tool_message_carries_call_id() {
        let params = ChatParams {
            messages: vec![Message::tool("call_9", "read_file", "data")],
            ..Default::default()
        };

        let request = provider().build_request(&params);
        let messages = request["messages"].as_array().unwrap();
        assert_eq!(messages[0]["role"], "tool");
        assert_eq!(messages[0]["tool_call_id"], "call_9");
        assert_eq!(messages[0]["name"], "read_file");
    }

    #[test]
    fn test_parse_response_text() {
        let response = provider()
            .parse_response(json!({
                "choices": [{
                    "message": { "role": "assistant", "content": "Hello!" },
                    "finish_reason": "stop"
                }],
                "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
            }))
            .unwrap();

        assert_eq!(response.content, json!("Hello!"));
        assert!(response.tool_calls.is_empty());
        assert_eq!(response.usage.total_tokens, 15);
    }

    #[test]
    fn test_parse_response_tool_calls_keep_raw_arguments() {
        let response = provider()
            .parse_response(json!({
                "choices": [{
                    "message": {
                        "content": null,
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": {
                                "name": "calculator",
                                "arguments": "{\"expression\": \"2+2\"}"
                            }
                        }]
                    },
                    "finish_reason": "tool_calls"
                }]
            }))
            .unwrap();

        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].id, "call_1");
        assert_eq!(response.tool_calls[0].arguments, "{\"expression\": \"2+2\"}");
        assert!(response.content.is_null());
    }

    #[test]
    fn test_parse_response_array_content_passes_through() {
        let response = provider()
            .parse_response(json!({
                "choices": [{
                    "message": {
                        "content": [{"name": "calculator", "arguments": {"expression": "1+1"}}]
                    },
                    "finish_reason": "stop"
                }]
            }))
            .unwrap();

        assert!(response.content.is_array());
    }

    #[test]
    fn test_parse_response_object_arguments_reencoded() {
        let response = provider()
            .parse_response(json!({
                "choices": [{
                    "message": {
                        "tool_calls": [{
                            "id": "call_1",
                            "function": { "name": "t", "arguments": {"k": "v"} }
                        }]
                    },
                    "finish_reason": "stop"
                }]
            }))
            .unwrap();

        assert_eq!(response.tool_calls[0].arguments, "{\"k\":\"v\"}");
    }

    #[test]
    fn test_parse_response_no_choices() {
        let result = provider().parse_response(json!({"choices": []}));
        assert!(matches!(result, Err(ProviderError::InvalidResponse)));
    }
}
