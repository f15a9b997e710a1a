//! Codex `exec --json` line shapes.
//!
//! Codex renamed some fields between releases (`item_type` became `type`),
//! so the item discriminant accepts both spellings. All payload fields are
//! optional and kept as raw JSON where their shape varies by item type.

use serde::Deserialize;
use serde_json::Value;

/// One line of `codex exec --json` output.
#[derive(Debug, Clone, Deserialize)]
pub struct CodexEvent {
    #[serde(rename = "type")]
    pub event_type: String,

    #[serde(default)]
    pub thread_id: Option<String>,

    /// Present on `item.*` events.
    #[serde(default)]
    pub item: Option<CodexItem>,

    /// Present on `turn.completed`.
    #[serde(default)]
    pub usage: Option<CodexUsage>,

    /// Present on stream-level `error` events.
    #[serde(default)]
    pub message: Option<String>,

    /// Present on `turn.failed`: `{"message": ...}`.
    #[serde(default)]
    pub error: Option<Value>,
}

/// A thread item. Which fields are set depends on `item_type`.
#[derive(Debug, Clone, Deserialize)]
pub struct CodexItem {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(rename = "type", alias = "item_type")]
    pub item_type: String,

    /// "in_progress", "completed", "failed", "declined".
    #[serde(default)]
    pub status: Option<String>,

    /// `agent_message` and `reasoning` text.
    #[serde(default)]
    pub text: Option<String>,

    // command_execution
    #[serde(default)]
    pub command: Option<Value>,
    #[serde(default)]
    pub aggregated_output: Option<Value>,
    #[serde(default)]
    pub exit_code: Option<i64>,

    // file_change
    #[serde(default)]
    pub changes: Option<Value>,

    // mcp_tool_call
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub arguments: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,

    // web_search
    #[serde(default)]
    pub query: Option<String>,

    // todo_list
    #[serde(default)]
    pub items: Option<Value>,

    // error item
    #[serde(default)]
    pub message: Option<String>,
}

/// Token counts on `turn.completed`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodexUsage {
    #[serde(default)]
    pub input_tokens: Option<Value>,
    #[serde(default)]
    pub cached_input_tokens: Option<Value>,
    #[serde(default)]
    pub output_tokens: Option<Value>,
}
