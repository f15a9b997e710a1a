//! Canonical event protocol shared by every agent family.
//!
//! Each adapter translates its agent's JSON dialect into [`AgentEvent`], so a
//! renderer can consume any agent's stream without per-agent branching.
//!
//! On the wire an event is a JSON object tagged by `event`:
//!
//! ```json
//! {"event":"tool_start","id":"call_1","kind":"exec","title":"ls -la"}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Coarse category of a tool call, derived from the tool's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Exec,
    Edit,
    Read,
    Search,
    Think,
    Other,
}

impl ToolKind {
    /// Classify a tool name.
    ///
    /// The name is lowercased first so `Bash` and `bash` agree. Shell names
    /// must match exactly; every other kind matches on a substring, checked
    /// in a fixed order (read, edit, search, think).
    pub fn classify(tool_name: &str) -> Self {
        let name = tool_name.to_lowercase();

        if matches!(name.as_str(), "bash" | "shell" | "sh") {
            return ToolKind::Exec;
        }

        let contains_any = |needles: &[&str]| needles.iter().any(|n| name.contains(n));

        if contains_any(&["read"]) {
            ToolKind::Read
        } else if contains_any(&["write", "edit", "patch"]) {
            ToolKind::Edit
        } else if contains_any(&["search", "grep", "glob", "find"]) {
            ToolKind::Search
        } else if contains_any(&["think", "task"]) {
            ToolKind::Think
        } else {
            ToolKind::Other
        }
    }
}

/// Token accounting reported by an agent.
///
/// Agents may report usage several times per run; the latest report wins.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
}

/// Unified event emitted for every agent family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum AgentEvent {
    /// First thread/session id seen in the stream. At most once per spawn.
    SessionStart { thread_id: String },

    /// A chunk of assistant-authored text.
    AgentMessage { text: String },

    /// A tool call was opened. `id` is unique among currently open calls.
    ToolStart {
        id: String,
        kind: ToolKind,
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input: Option<Value>,
    },

    /// A previously started tool call finished (successfully or not).
    ///
    /// `kind` is the kind recorded at the matching start; `path` holds the
    /// tool's output rendered as a string.
    ToolComplete {
        id: String,
        kind: ToolKind,
        path: String,
    },

    /// Intermediate "thinking" text.
    Reasoning { text: String },

    /// Token usage snapshot.
    Usage(Usage),

    /// A line could not be understood. The stream continues after it.
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stack: Option<String>,
    },
}

impl AgentEvent {
    /// The wire tag of this event (`"session_start"`, `"tool_start"`, ...).
    pub fn name(&self) -> &'static str {
        match self {
            AgentEvent::SessionStart { .. } => "session_start",
            AgentEvent::AgentMessage { .. } => "agent_message",
            AgentEvent::ToolStart { .. } => "tool_start",
            AgentEvent::ToolComplete { .. } => "tool_complete",
            AgentEvent::Reasoning { .. } => "reasoning",
            AgentEvent::Usage(_) => "usage",
            AgentEvent::Error { .. } => "error",
        }
    }

    pub(crate) fn error(message: impl Into<String>) -> Self {
        AgentEvent::Error {
            message: message.into(),
            stack: None,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
