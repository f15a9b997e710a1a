//! Claude `stream-json` line shapes.
//!
//! Only the fields the adapter reads are modelled. Everything is optional so
//! that new message types and fields from newer CLI releases still parse.

use serde::Deserialize;
use serde_json::Value;

/// One line of `claude --output-format stream-json` output.
#[derive(Debug, Clone, Deserialize)]
pub struct ClaudeStreamEvent {
    /// "system", "assistant", "user", "result", ...
    #[serde(rename = "type")]
    pub event_type: String,

    /// "init" on the first system message; "success"/"error_*" on results.
    #[serde(default)]
    pub subtype: Option<String>,

    #[serde(default)]
    pub session_id: Option<String>,

    /// Set on `assistant` and `user` messages.
    #[serde(default)]
    pub message: Option<ClaudeMessage>,

    /// Final answer text on `result` messages.
    #[serde(default)]
    pub result: Option<String>,

    #[serde(default)]
    pub is_error: Option<bool>,

    /// Token counts on `result` messages.
    #[serde(default)]
    pub usage: Option<ClaudeUsage>,

    #[serde(default)]
    pub total_cost_usd: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClaudeMessage {
    #[serde(default)]
    pub role: Option<String>,

    /// Content blocks. Plain string content is tolerated and ignored.
    #[serde(default, deserialize_with = "blocks_or_empty")]
    pub content: Vec<ContentBlock>,
}

/// A content block: `text`, `thinking`, `tool_use` or `tool_result`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,

    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub thinking: Option<String>,

    // tool_use
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub input: Option<Value>,

    // tool_result
    #[serde(default)]
    pub tool_use_id: Option<String>,
    /// A string, or an array of `{"type":"text","text":...}` parts.
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub is_error: Option<bool>,
}

/// Counts are kept raw; the shared usage builder reads them leniently.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaudeUsage {
    #[serde(default)]
    pub input_tokens: Option<Value>,
    #[serde(default)]
    pub output_tokens: Option<Value>,
    #[serde(default)]
    pub cache_read_input_tokens: Option<Value>,
    #[serde(default)]
    pub cache_creation_input_tokens: Option<Value>,
}

fn blocks_or_empty<'de, D>(deserializer: D) -> Result<Vec<ContentBlock>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Array(_) => serde_json::from_value(value).map_err(serde::de::Error::custom),
        _ => Ok(Vec::new()),
    }
}

// ============================================================================
// TESTS
// ============================================================================
