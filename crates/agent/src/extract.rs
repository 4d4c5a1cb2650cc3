//! Intent extraction from unstructured assistant content.
//!
//! Structured tool calls are authoritative and handled by the turn loop
//! before this module is consulted. What lands here is the messier case: a
//! model that ignored the calling convention and expressed tool intent as
//! text. Extraction requires exact schema markers before treating text as a
//! tool call, so ordinary prose that happens to mention JSON stays prose.

use regex::Regex;
use serde_json::{Map, Value};

/// Assistant content resolved into a tagged union at ingestion, so the
/// extractor can match exhaustively instead of sniffing types inline.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseContent {
    Empty,
    Text(String),
    Items(Vec<Value>),
}

impl ResponseContent {
    pub fn ingest(content: &Value) -> Self {
        match content {
            Value::String(s) => ResponseContent::Text(s.clone()),
            Value::Array(items) => ResponseContent::Items(items.clone()),
            _ => ResponseContent::Empty,
        }
    }

    /// Text form recorded on the assistant history message. Array payloads
    /// are re-serialized so history stays string-typed on the wire.
    pub fn to_history_text(&self) -> String {
        match self {
            ResponseContent::Empty => String::new(),
            ResponseContent::Text(s) => s.clone(),
            ResponseContent::Items(items) => {
                serde_json::to_string(items).unwrap_or_default()
            }
        }
    }
}

/// A tool invocation recovered from unstructured content.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolIntent {
    pub name: String,
    pub arguments: Value,
}

/// What the assistant content means for this turn.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Invoke(ToolIntent),
    FinalAnswer(String),
}

/// Resolution priority (first match wins):
/// 1. a fenced ```json block referencing the calculator tool, parsed
///    strictly;
/// 2. an "inline" shape: a list whose first element carries
///    `name`/`arguments`, or a JSON-looking string with that shape;
/// 3. otherwise the content is the final answer.
///
/// Parse or shape failures fall through silently; they are never errors.
pub fn extract_intent(content: &ResponseContent) -> Intent {
    if let ResponseContent::Text(text) = content {
        let trimmed = text.trim();
        if trimmed.starts_with("```") && trimmed.contains("calculator") {
            if let Some(intent) = parse_fenced_calculator(trimmed) {
                return Intent::Invoke(intent);
            }
        }
    }

    if let Some(intent) = parse_inline(content) {
        return Intent::Invoke(intent);
    }

    Intent::FinalAnswer(match content {
        ResponseContent::Text(text) => text.trim().to_string(),
        _ => String::new(),
    })
}

/// Strict parse of a fenced JSON block: a top-level object whose `method`
/// field equals `"calculator"`; `params` (object, default empty) becomes
/// the arguments.
fn parse_fenced_calculator(text: &str) -> Option<ToolIntent> {
    let re = Regex::new(r"(?s)```json\s*(\{.*?\})\s*```").expect("valid regex");
    let captures = re.captures(text)?;
    let payload: Value = serde_json::from_str(captures.get(1)?.as_str()).ok()?;

    if payload.get("method")?.as_str()? != "calculator" {
        return None;
    }

    let arguments = match payload.get("params") {
        Some(Value::Object(params)) => Value::Object(params.clone()),
        None => Value::Object(Map::new()),
        Some(_) => return None,
    };

    Some(ToolIntent {
        name: "calculator".to_string(),
        arguments,
    })
}

fn parse_inline(content: &ResponseContent) -> Option<ToolIntent> {
    match content {
        ResponseContent::Items(items) => {
            // Only the first candidate is ever executed, by design.
            let first = items.first()?.as_object()?;
            let name = first.get("name")?.as_str()?.to_string();
            let arguments = first.get("arguments")?.clone();
            Some(ToolIntent { name, arguments })
        }
        ResponseContent::Text(text) => {
            let trimmed = text.trim();
            if !trimmed.starts_with('{') && !trimmed.starts_with('[') {
                return None;
            }
            let payload: Value = serde_json::from_str(trimmed).ok()?;
            let candidate = match &payload {
                Value::Array(items) => items.first()?.as_object()?,
                Value::Object(obj) => obj,
                _ => return None,
            };
            let name = candidate.get("name")?.as_str()?.to_string();
            let arguments = candidate
                .get("arguments")
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new()));
            Some(ToolIntent { name, arguments })
        }
        ResponseContent::Empty => None,
    }
}
