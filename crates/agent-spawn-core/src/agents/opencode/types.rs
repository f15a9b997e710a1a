//! OpenCode JSON line shapes.
//!
//! Everything is optional: OpenCode adds fields between releases and a
//! missing field must never make a line unreadable. Token counts stay as raw
//! JSON values so a non-numeric count degrades to 0 instead of failing the
//! whole line.

use serde::Deserialize;
use serde_json::Value;

/// One line of `opencode run --format json` output.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenCodeEvent {
    /// "step_start", "text", "reasoning", "tool_use", "step_finish", "error".
    #[serde(rename = "type")]
    pub event_type: String,

    #[serde(rename = "sessionID", default)]
    pub session_id: Option<String>,

    /// Older builds put text directly on the line instead of in `part`.
    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub part: Option<OpenCodePart>,

    /// Error payload for `error` lines: `{"name": ..., "data": {"message": ...}}`.
    #[serde(default)]
    pub error: Option<Value>,
}

/// The message part a line reports on.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenCodePart {
    #[serde(default)]
    pub id: Option<String>,

    /// "text", "reasoning", "tool", "step-start", "step-finish".
    #[serde(rename = "type", default)]
    pub part_type: Option<String>,

    #[serde(default)]
    pub text: Option<String>,

    /// Tool call id (tool parts only).
    #[serde(rename = "callID", default)]
    pub call_id: Option<String>,

    /// Tool name (tool parts only).
    #[serde(default)]
    pub tool: Option<String>,

    #[serde(default)]
    pub state: Option<ToolState>,

    /// Token counts (step-finish parts only).
    #[serde(default)]
    pub tokens: Option<TokenCounts>,

    #[serde(default)]
    pub cost: Option<Value>,
}

/// Lifecycle state of a tool part.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolState {
    /// "pending", "running", "completed", "error".
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub input: Option<Value>,

    #[serde(default)]
    pub output: Option<Value>,

    /// Error text when `status` is "error".
    #[serde(default)]
    pub error: Option<Value>,

    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenCounts {
    #[serde(default)]
    pub input: Option<Value>,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub reasoning: Option<Value>,
    #[serde(default)]
    pub cache: Option<CacheCounts>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheCounts {
    #[serde(default)]
    pub read: Option<Value>,
    #[serde(default)]
    pub write: Option<Value>,
}
