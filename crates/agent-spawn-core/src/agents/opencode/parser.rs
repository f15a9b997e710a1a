//! OpenCode stream adapter.
//!
//! OpenCode reports each tool part several times as its state moves from
//! `pending` to `running` to `completed`/`error`; the shared tracker folds
//! those updates into one start and one completion.
//!
//! Unknown line types are dropped. `error` lines are forwarded as
//! [`AgentEvent::Error`] so a failed session is visible in the stream.

use serde::Deserialize;
use serde_json::Value;

use crate::agents::event::AgentEvent;
use crate::agents::shared::{usage_event, AdapterState, ToolStatus, ToolUpdate};
use crate::agents::{AdapterFamily, ProtocolAdapter};

use super::types::{OpenCodeEvent, OpenCodePart};

/// Adapter state for one `opencode run` process.
#[derive(Debug, Default)]
pub struct OpenCodeParser {
    state: AdapterState,
}

impl OpenCodeParser {
    pub fn new() -> Self {
        Self::default()
    }

    fn translate(&mut self, event: &OpenCodeEvent, events: &mut Vec<AgentEvent>) {
        let part = event.part.as_ref();

        match event.event_type.as_str() {
            "text" => {
                if let Some(text) = part_text(event) {
                    events.push(AgentEvent::AgentMessage { text });
                }
            }

            "reasoning" => {
                if let Some(text) = part_text(event) {
                    events.push(AgentEvent::Reasoning { text });
                }
            }

            "tool_use" => {
                if let Some(part) = part {
                    self.translate_tool(part, events);
                }
            }

            "step_finish" => {
                let Some(tokens) = part.and_then(|p| p.tokens.as_ref()) else {
                    return;
                };
                let cached = tokens.cache.as_ref().and_then(|c| c.read.as_ref());
                if let Some(usage) = usage_event(
                    tokens.input.as_ref(),
                    tokens.output.as_ref(),
                    cached,
                    part.and_then(|p| p.cost.as_ref()),
                ) {
                    events.push(usage);
                }
            }

            "error" => events.push(AgentEvent::error(error_message(event.error.as_ref()))),

            "step_start" => {}

            other => log::debug!("opencode: dropping unknown event type {:?}", other),
        }
    }

    fn translate_tool(&mut self, part: &OpenCodePart, events: &mut Vec<AgentEvent>) {
        let Some(call_id) = part.call_id.as_deref().or(part.id.as_deref()) else {
            log::debug!("opencode: tool part without a call id");
            return;
        };
        let state = part.state.as_ref();
        let status = state
            .and_then(|s| s.status.as_deref())
            .map_or(ToolStatus::Running, ToolStatus::parse);
        let output = state.and_then(|s| {
            if status == ToolStatus::Failed {
                s.error.as_ref().or(s.output.as_ref())
            } else {
                s.output.as_ref()
            }
        });

        self.state.tools.apply(
            ToolUpdate {
                id: call_id,
                name: part.tool.as_deref(),
                kind_hint: None,
                status,
                input: state.and_then(|s| s.input.as_ref()),
                output,
            },
            events,
        );
    }
}

/// Text of a text/reasoning line; empty chunks are skipped.
fn part_text(event: &OpenCodeEvent) -> Option<String> {
    event
        .part
        .as_ref()
        .and_then(|p| p.text.clone())
        .or_else(|| event.text.clone())
        .filter(|t| !t.is_empty())
}

fn error_message(error: Option<&Value>) -> String {
    let Some(error) = error else {
        return "OpenCode reported an error".to_string();
    };
    error
        .pointer("/data/message")
        .or_else(|| error.get("message"))
        .or_else(|| error.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| error.as_str().map(str::to_string))
        .unwrap_or_else(|| error.to_string())
}

impl ProtocolAdapter for OpenCodeParser {
    fn family(&self) -> AdapterFamily {
        AdapterFamily::OpenCode
    }

    fn adapt_line(&mut self, line: &str) -> Vec<AgentEvent> {
        let mut events = Vec::new();
        let Some(message) = self.state.begin_line(line, &mut events) else {
            return events;
        };

        match OpenCodeEvent::deserialize(&message) {
            Ok(event) => self.translate(&event, &mut events),
            Err(err) => log::debug!("opencode: unrecognised line shape: {}", err),
        }

        events
    }
}

// ============================================================================
// TESTS
// ============================================================================
