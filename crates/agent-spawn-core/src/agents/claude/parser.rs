//! Claude stream adapter.
//!
//! One `assistant` message may hold several content blocks; they are
//! translated in order, so a message that says something and then calls a
//! tool yields the `AgentMessage` before the `ToolStart`.
//!
//! Unknown message and block types are dropped. A `result` flagged
//! `is_error` is forwarded as [`AgentEvent::Error`].

use serde::Deserialize;
use serde_json::Value;

use crate::agents::event::AgentEvent;
use crate::agents::shared::{usage_event, AdapterState, ToolStatus, ToolUpdate};
use crate::agents::{AdapterFamily, ProtocolAdapter};

use super::types::{ClaudeStreamEvent, ContentBlock};

/// Adapter state for one `claude -p` process.
#[derive(Debug, Default)]
pub struct ClaudeParser {
    state: AdapterState,
}

impl ClaudeParser {
    pub fn new() -> Self {
        Self::default()
    }

    fn translate(&mut self, event: &ClaudeStreamEvent, events: &mut Vec<AgentEvent>) {
        match event.event_type.as_str() {
            "assistant" | "user" => {
                let Some(ref message) = event.message else {
                    return;
                };
                for block in &message.content {
                    self.translate_block(block, events);
                }
            }

            "result" => {
                if event.is_error == Some(true) {
                    let message = event
                        .result
                        .as_deref()
                        .filter(|r| !r.is_empty())
                        .or(event.subtype.as_deref())
                        .unwrap_or("Claude run failed");
                    events.push(AgentEvent::error(message));
                }
                if let Some(ref usage) = event.usage {
                    if let Some(usage) = usage_event(
                        usage.input_tokens.as_ref(),
                        usage.output_tokens.as_ref(),
                        usage.cache_read_input_tokens.as_ref(),
                        event.total_cost_usd.as_ref(),
                    ) {
                        events.push(usage);
                    }
                }
            }

            // Session id is picked up by the shared search.
            "system" => {}

            other => log::debug!("claude: dropping unknown message type {:?}", other),
        }
    }

    fn translate_block(&mut self, block: &ContentBlock, events: &mut Vec<AgentEvent>) {
        match block.block_type.as_str() {
            "text" => {
                if let Some(text) = block.text.clone().filter(|t| !t.is_empty()) {
                    events.push(AgentEvent::AgentMessage { text });
                }
            }

            "thinking" => {
                if let Some(text) = block.thinking.clone().filter(|t| !t.is_empty()) {
                    events.push(AgentEvent::Reasoning { text });
                }
            }

            "tool_use" => {
                let Some(id) = block.id.as_deref() else {
                    log::debug!("claude: tool_use block without an id");
                    return;
                };
                self.state.tools.apply(
                    ToolUpdate {
                        id,
                        name: block.name.as_deref(),
                        kind_hint: None,
                        status: ToolStatus::Running,
                        input: block.input.as_ref(),
                        output: None,
                    },
                    events,
                );
            }

            "tool_result" => {
                let Some(id) = block.tool_use_id.as_deref() else {
                    log::debug!("claude: tool_result block without a tool_use_id");
                    return;
                };
                let status = if block.is_error == Some(true) {
                    ToolStatus::Failed
                } else {
                    ToolStatus::Completed
                };
                let output = block.content.as_ref().map(result_text);
                self.state.tools.apply(
                    ToolUpdate {
                        id,
                        name: None,
                        kind_hint: None,
                        status,
                        input: None,
                        output: output.as_ref(),
                    },
                    events,
                );
            }

            other => log::debug!("claude: dropping unknown content block {:?}", other),
        }
    }
}

/// Flatten a `tool_result` content array of text parts into one string.
/// Other shapes are passed through untouched.
fn result_text(content: &Value) -> Value {
    let Value::Array(parts) = content else {
        return content.clone();
    };
    let texts: Vec<&str> = parts
        .iter()
        .filter(|p| p.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    if texts.len() == parts.len() {
        Value::String(texts.join("\n"))
    } else {
        content.clone()
    }
}

impl ProtocolAdapter for ClaudeParser {
    fn family(&self) -> AdapterFamily {
        AdapterFamily::Claude
    }

    fn adapt_line(&mut self, line: &str) -> Vec<AgentEvent> {
        let mut events = Vec::new();
        let Some(message) = self.state.begin_line(line, &mut events) else {
            return events;
        };

        match ClaudeStreamEvent::deserialize(&message) {
            Ok(event) => self.translate(&event, &mut events),
            Err(err) => log::debug!("claude: unrecognised line shape: {}", err),
        }

        events
    }
}

// ============================================================================
// TESTS
// ============================================================================
