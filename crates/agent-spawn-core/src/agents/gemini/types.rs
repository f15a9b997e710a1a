//! Gemini `stream-json` line shapes.
//!
//! Events are flat objects with a `type` discriminator. A flat struct with
//! optional fields keeps unknown event types parseable, so they can be
//! dropped instead of failing.

use serde::Deserialize;
use serde_json::Value;

/// One line of `gemini --output-format stream-json` output.
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiStreamEvent {
    /// "init", "message", "tool_use", "tool_result", "error", "result".
    #[serde(rename = "type")]
    pub event_type: String,

    #[serde(default)]
    pub session_id: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    /// "assistant" or "user" on message events.
    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub content: Option<String>,

    /// Set when `content` is a streaming chunk.
    #[serde(default)]
    pub delta: Option<bool>,

    #[serde(default)]
    pub tool_name: Option<String>,

    #[serde(default)]
    pub tool_id: Option<String>,

    #[serde(default)]
    pub parameters: Option<Value>,

    /// "success" or "error" on tool_result; also set on result events.
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub output: Option<Value>,

    /// A string, or `{"type": ..., "message": ...}`.
    #[serde(default)]
    pub error: Option<Value>,

    #[serde(default)]
    pub message: Option<String>,

    /// "warning" or "error" on error events.
    #[serde(default)]
    pub severity: Option<String>,

    #[serde(default)]
    pub stats: Option<GeminiStats>,
}

/// Session totals on the final `result` event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeminiStats {
    #[serde(default)]
    pub total_tokens: Option<Value>,
    #[serde(default)]
    pub input_tokens: Option<Value>,
    #[serde(default)]
    pub output_tokens: Option<Value>,
    #[serde(default, alias = "cached_tokens")]
    pub cached: Option<Value>,
    #[serde(default)]
    pub duration_ms: Option<Value>,
    #[serde(default)]
    pub tool_calls: Option<Value>,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tool_use() {
        let json = r#"{"type":"tool_use","timestamp":"2025-01-01T00:00:00Z","tool_name":"run_shell_command","tool_id":"t1","parameters":{"command":"ls"}}"#;
        let event: GeminiStreamEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_type, "tool_use");
        assert_eq!(event.tool_id.as_deref(), Some("t1"));
        assert!(event.parameters.is_some());
    }

    #[test]
    fn parse_result_stats() {
        let json = r#"{"type":"result","status":"success","stats":{"total_tokens":30,"input_tokens":20,"output_tokens":10,"cached":5,"duration_ms":1200,"tool_calls":1}}"#;
        let event: GeminiStreamEvent = serde_json::from_str(json).unwrap();
        let stats = event.stats.unwrap();
        assert_eq!(stats.cached, Some(serde_json::json!(5)));
    }
}
