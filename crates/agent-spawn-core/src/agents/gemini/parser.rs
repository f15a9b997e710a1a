//! Gemini stream adapter.
//!
//! Gemini's built-in tools have descriptive names (`run_shell_command`,
//! `search_file_content`) that are normalized before classification so they
//! land in the same kinds as other agents' tools.
//!
//! User messages echo the prompt and are skipped. Unknown event types are
//! dropped; `error` events and failed results are forwarded as
//! [`AgentEvent::Error`].

use serde::Deserialize;
use serde_json::Value;

use crate::agents::event::AgentEvent;
use crate::agents::shared::{usage_event, AdapterState, ToolStatus, ToolUpdate};
use crate::agents::{AdapterFamily, ProtocolAdapter};

use super::types::GeminiStreamEvent;

/// Adapter state for one `gemini -p` process.
#[derive(Debug, Default)]
pub struct GeminiParser {
    state: AdapterState,
}

impl GeminiParser {
    pub fn new() -> Self {
        Self::default()
    }

    fn translate(&mut self, event: &GeminiStreamEvent, events: &mut Vec<AgentEvent>) {
        match event.event_type.as_str() {
            "message" => {
                if event.role.as_deref() != Some("assistant") {
                    return;
                }
                if let Some(text) = event.content.clone().filter(|t| !t.is_empty()) {
                    events.push(AgentEvent::AgentMessage { text });
                }
            }

            "tool_use" => {
                let Some(id) = event.tool_id.as_deref() else {
                    log::debug!("gemini: tool_use without a tool_id");
                    return;
                };
                let name = event.tool_name.as_deref();
                self.state.tools.apply(
                    ToolUpdate {
                        id,
                        name,
                        kind_hint: name.map(normalize_tool_name),
                        status: ToolStatus::Running,
                        input: event.parameters.as_ref(),
                        output: None,
                    },
                    events,
                );
            }

            "tool_result" => {
                let Some(id) = event.tool_id.as_deref() else {
                    log::debug!("gemini: tool_result without a tool_id");
                    return;
                };
                let failed = event.status.as_deref() == Some("error");
                let output = if failed {
                    event.error.as_ref().map(|e| Value::String(error_text(e)))
                } else {
                    event.output.clone()
                };
                self.state.tools.apply(
                    ToolUpdate {
                        id,
                        name: None,
                        kind_hint: None,
                        status: if failed {
                            ToolStatus::Failed
                        } else {
                            ToolStatus::Completed
                        },
                        input: None,
                        output: output.as_ref(),
                    },
                    events,
                );
            }

            "error" => {
                let message = event
                    .message
                    .clone()
                    .or_else(|| event.error.as_ref().map(error_text))
                    .unwrap_or_else(|| "Gemini reported an error".to_string());
                events.push(AgentEvent::error(message));
            }

            "result" => {
                if event.status.as_deref() == Some("error") {
                    let message = event
                        .error
                        .as_ref()
                        .map(error_text)
                        .unwrap_or_else(|| "Gemini run failed".to_string());
                    events.push(AgentEvent::error(message));
                }
                if let Some(ref stats) = event.stats {
                    if let Some(usage) = usage_event(
                        stats.input_tokens.as_ref(),
                        stats.output_tokens.as_ref(),
                        stats.cached.as_ref(),
                        None,
                    ) {
                        events.push(usage);
                    }
                }
            }

            // Session id is picked up by the shared search.
            "init" => {}

            other => log::debug!("gemini: dropping unknown event type {:?}", other),
        }
    }
}

/// Map Gemini's built-in tool names onto names the classifier understands.
/// Anything else (MCP tools included) passes through.
fn normalize_tool_name(name: &str) -> &str {
    match name {
        "run_shell_command" | "shell" => "shell",
        "replace" | "edit_file" => "edit",
        "write_file" => "write",
        "read_file" | "read_many_files" => "read",
        "search_file_content" | "grep" => "grep",
        "glob" => "glob",
        "google_web_search" => "web_search",
        other => other,
    }
}

fn error_text(error: &Value) -> String {
    error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string())
}

impl ProtocolAdapter for GeminiParser {
    fn family(&self) -> AdapterFamily {
        AdapterFamily::Gemini
    }

    fn adapt_line(&mut self, line: &str) -> Vec<AgentEvent> {
        let mut events = Vec::new();
        let Some(message) = self.state.begin_line(line, &mut events) else {
            return events;
        };

        match GeminiStreamEvent::deserialize(&message) {
            Ok(event) => self.translate(&event, &mut events),
            Err(err) => log::debug!("gemini: unrecognised line shape: {}", err),
        }

        events
    }
}

// ============================================================================
// TESTS
// ============================================================================
