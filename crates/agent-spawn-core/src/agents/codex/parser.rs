//! Codex stream adapter.
//!
//! # Items as Tool Calls
//!
//! Codex reports work as thread items. Items that represent an action are
//! mapped onto a tool name and fed to the shared tracker:
//!
//! | item type           | tool name        | kind   |
//! |---------------------|------------------|--------|
//! | `command_execution` | `shell`          | exec   |
//! | `file_change`       | `apply_patch`    | edit   |
//! | `web_search`        | `web_search`     | search |
//! | `todo_list`         | `task_list`      | think  |
//! | `mcp_tool_call`     | the MCP tool     | varies |
//!
//! `reasoning` and `agent_message` items are only emitted once completed, so
//! a streamed item is never reported twice.
//!
//! Unknown event and item types are dropped. `error` events, `error` items
//! and `turn.failed` are forwarded as [`AgentEvent::Error`].

use serde::Deserialize;
use serde_json::{json, Value};

use crate::agents::event::AgentEvent;
use crate::agents::shared::{usage_event, AdapterState, ToolStatus, ToolUpdate};
use crate::agents::{AdapterFamily, ProtocolAdapter};

use super::types::{CodexEvent, CodexItem};

/// Which `item.*` event an item arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemPhase {
    Started,
    Updated,
    Completed,
}

/// Adapter state for one `codex exec` process.
#[derive(Debug, Default)]
pub struct CodexParser {
    state: AdapterState,
}

impl CodexParser {
    pub fn new() -> Self {
        Self::default()
    }

    fn translate(&mut self, event: &CodexEvent, events: &mut Vec<AgentEvent>) {
        match event.event_type.as_str() {
            "item.started" | "item.updated" | "item.completed" => {
                let phase = match event.event_type.as_str() {
                    "item.started" => ItemPhase::Started,
                    "item.updated" => ItemPhase::Updated,
                    _ => ItemPhase::Completed,
                };
                if let Some(ref item) = event.item {
                    self.translate_item(item, phase, events);
                }
            }

            "turn.completed" => {
                if let Some(ref usage) = event.usage {
                    if let Some(usage) = usage_event(
                        usage.input_tokens.as_ref(),
                        usage.output_tokens.as_ref(),
                        usage.cached_input_tokens.as_ref(),
                        None,
                    ) {
                        events.push(usage);
                    }
                }
            }

            "turn.failed" => {
                let message = event
                    .error
                    .as_ref()
                    .and_then(|e| e.get("message"))
                    .and_then(Value::as_str)
                    .unwrap_or("Codex turn failed");
                events.push(AgentEvent::error(message));
            }

            "error" => {
                let message = event.message.as_deref().unwrap_or("Codex reported an error");
                events.push(AgentEvent::error(message));
            }

            // Thread id is picked up by the shared search.
            "thread.started" | "turn.started" => {}

            other => log::debug!("codex: dropping unknown event type {:?}", other),
        }
    }

    fn translate_item(&mut self, item: &CodexItem, phase: ItemPhase, events: &mut Vec<AgentEvent>) {
        match item.item_type.as_str() {
            "agent_message" => {
                if phase == ItemPhase::Completed {
                    if let Some(text) = item.text.clone().filter(|t| !t.is_empty()) {
                        events.push(AgentEvent::AgentMessage { text });
                    }
                }
            }

            "reasoning" => {
                if phase == ItemPhase::Completed {
                    if let Some(text) = item.text.clone().filter(|t| !t.is_empty()) {
                        events.push(AgentEvent::Reasoning { text });
                    }
                }
            }

            "error" => {
                if phase == ItemPhase::Completed {
                    let message = item.message.as_deref().unwrap_or("Codex reported an error");
                    events.push(AgentEvent::error(message));
                }
            }

            "command_execution" => {
                let input = item.command.as_ref().map(|c| json!({ "command": c }));
                self.apply_item(
                    item,
                    phase,
                    "shell",
                    input.as_ref(),
                    item.aggregated_output.as_ref(),
                    events,
                );
            }

            "file_change" => {
                let input = item.changes.as_ref().map(|c| json!({ "changes": c }));
                self.apply_item(
                    item,
                    phase,
                    "apply_patch",
                    input.as_ref(),
                    item.changes.as_ref(),
                    events,
                );
            }

            "web_search" => {
                let input = item.query.as_ref().map(|q| json!({ "query": q }));
                self.apply_item(item, phase, "web_search", input.as_ref(), None, events);
            }

            "todo_list" => {
                self.apply_item(
                    item,
                    phase,
                    "task_list",
                    item.items.as_ref(),
                    item.items.as_ref(),
                    events,
                );
            }

            "mcp_tool_call" => {
                let name = item.tool.as_deref().unwrap_or("mcp_tool");
                let output = item.result.as_ref().or(item.error.as_ref());
                self.apply_item(item, phase, name, item.arguments.as_ref(), output, events);
            }

            other => log::debug!("codex: dropping unknown item type {:?}", other),
        }
    }

    fn apply_item(
        &mut self,
        item: &CodexItem,
        phase: ItemPhase,
        name: &str,
        input: Option<&Value>,
        output: Option<&Value>,
        events: &mut Vec<AgentEvent>,
    ) {
        let Some(id) = item.id.as_deref() else {
            log::debug!("codex: {} item without an id", item.item_type);
            return;
        };

        let status = match (phase, item.status.as_deref()) {
            (_, Some("failed" | "declined")) => ToolStatus::Failed,
            (ItemPhase::Completed, _) => ToolStatus::Completed,
            (_, Some(status)) => ToolStatus::parse(status),
            (_, None) => ToolStatus::Running,
        };

        self.state.tools.apply(
            ToolUpdate {
                id,
                name: Some(name),
                kind_hint: None,
                status,
                input,
                output,
            },
            events,
        );
    }
}

impl ProtocolAdapter for CodexParser {
    fn family(&self) -> AdapterFamily {
        AdapterFamily::Codex
    }

    fn adapt_line(&mut self, line: &str) -> Vec<AgentEvent> {
        let mut events = Vec::new();
        let Some(message) = self.state.begin_line(line, &mut events) else {
            return events;
        };

        match CodexEvent::deserialize(&message) {
            Ok(event) => self.translate(&event, &mut events),
            Err(err) => log::debug!("codex: unrecognised line shape: {}", err),
        }

        events
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::event::{ToolKind, Usage};

    fn adapt(lines: &[&str]) -> Vec<AgentEvent> {
        CodexParser::new().adapt_all(lines.iter().copied())
    }

    #[test]
    fn thread_started_emits_session_start() {
        let events = adapt(&[r#"{"type":"thread.started","thread_id":"0199a213"}"#]);
        assert_eq!(
            events,
            vec![AgentEvent::SessionStart {
                thread_id: "0199a213".to_string()
            }]
        );
    }

    #[test]
    fn command_execution_lifecycle() {
        let events = adapt(&[
            r#"{"type":"item.started","item":{"id":"item_0","type":"command_execution","command":"bash -lc ls","aggregated_output":"","status":"in_progress"}}"#,
            r#"{"type":"item.completed","item":{"id":"item_0","type":"command_execution","command":"bash -lc ls","aggregated_output":"README.md\n","exit_code":0,"status":"completed"}}"#,
        ]);

        assert_eq!(
            events,
            vec![
                AgentEvent::ToolStart {
                    id: "item_0".to_string(),
                    kind: ToolKind::Exec,
                    title: "bash -lc ls".to_string(),
                    input: Some(json!({"command": "bash -lc ls"})),
                },
                AgentEvent::ToolComplete {
                    id: "item_0".to_string(),
                    kind: ToolKind::Exec,
                    path: "README.md\n".to_string(),
                },
            ]
        );
    }

    #[test]
    fn failed_command_still_completes() {
        let events = adapt(&[
            r#"{"type":"item.started","item":{"id":"item_1","type":"command_execution","command":"false","status":"in_progress"}}"#,
            r#"{"type":"item.completed","item":{"id":"item_1","type":"command_execution","command":"false","aggregated_output":"","exit_code":1,"status":"failed"}}"#,
        ]);
        assert!(matches!(
            &events[1],
            AgentEvent::ToolComplete { kind: ToolKind::Exec, .. }
        ));
    }

    #[test]
    fn file_change_only_completed() {
        let events = adapt(&[
            r#"{"type":"item.completed","item":{"id":"item_2","type":"file_change","changes":[{"path":"src/lib.rs","kind":"update"}],"status":"completed"}}"#,
        ]);
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            AgentEvent::ToolStart { kind: ToolKind::Edit, title, .. } if title == "apply_patch"
        ));
        assert_eq!(
            events[1],
            AgentEvent::ToolComplete {
                id: "item_2".to_string(),
                kind: ToolKind::Edit,
                path: r#"[{"kind":"update","path":"src/lib.rs"}]"#.to_string(),
            }
        );
    }

    #[test]
    fn todo_list_updates_do_not_duplicate_start() {
        let events = adapt(&[
            r#"{"type":"item.started","item":{"id":"item_3","type":"todo_list","items":[{"text":"a","completed":false}]}}"#,
            r#"{"type":"item.updated","item":{"id":"item_3","type":"todo_list","items":[{"text":"a","completed":true}]}}"#,
        ]);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            AgentEvent::ToolStart { kind: ToolKind::Think, .. }
        ));
    }

    #[test]
    fn mcp_tool_call_uses_tool_name() {
        let events = adapt(&[
            r#"{"type":"item.started","item":{"id":"item_4","type":"mcp_tool_call","server":"docs","tool":"search_docs","arguments":{"q":"tokio"},"status":"in_progress"}}"#,
            r#"{"type":"item.completed","item":{"id":"item_4","type":"mcp_tool_call","server":"docs","tool":"search_docs","result":{"hits":1},"status":"completed"}}"#,
        ]);
        assert!(matches!(
            &events[0],
            AgentEvent::ToolStart { kind: ToolKind::Search, title, .. } if title == "search_docs"
        ));
        assert!(matches!(
            &events[1],
            AgentEvent::ToolComplete { path, .. } if path == r#"{"hits":1}"#
        ));
    }

    #[test]
    fn reasoning_and_message_only_on_completion() {
        let events = adapt(&[
            r#"{"type":"item.started","item":{"id":"item_5","type":"reasoning","text":""}}"#,
            r#"{"type":"item.completed","item":{"id":"item_5","type":"reasoning","text":"**Planning**"}}"#,
            r#"{"type":"item.started","item":{"id":"item_6","type":"agent_message","text":"Do"}}"#,
            r#"{"type":"item.completed","item":{"id":"item_6","type":"agent_message","text":"Done."}}"#,
        ]);
        assert_eq!(
            events,
            vec![
                AgentEvent::Reasoning {
                    text: "**Planning**".to_string()
                },
                AgentEvent::AgentMessage {
                    text: "Done.".to_string()
                },
            ]
        );
    }

    #[test]
    fn legacy_item_type_field_is_accepted() {
        let events = adapt(&[
            r#"{"type":"item.completed","item":{"id":"item_7","item_type":"assistant_message","text":"hi"}}"#,
            r#"{"type":"item.completed","item":{"id":"item_8","item_type":"agent_message","text":"hello"}}"#,
        ]);
        assert_eq!(
            events,
            vec![AgentEvent::AgentMessage {
                text: "hello".to_string()
            }]
        );
    }

    #[test]
    fn turn_completed_reports_usage() {
        let events = adapt(&[
            r#"{"type":"turn.completed","usage":{"input_tokens":2400,"cached_input_tokens":1024,"output_tokens":310}}"#,
        ]);
        assert_eq!(
            events,
            vec![AgentEvent::Usage(Usage {
                input_tokens: 2400,
                output_tokens: 310,
                cached_tokens: Some(1024),
                cost_usd: None,
            })]
        );
    }

    #[test]
    fn errors_are_forwarded() {
        let events = adapt(&[
            r#"{"type":"error","message":"stream disconnected"}"#,
            r#"{"type":"turn.failed","error":{"message":"usage limit reached"}}"#,
        ]);
        assert_eq!(
            events,
            vec![
                AgentEvent::error("stream disconnected"),
                AgentEvent::error("usage limit reached"),
            ]
        );
    }

    #[test]
    fn turn_started_and_unknown_events_are_silent() {
        let events = adapt(&[
            r#"{"type":"turn.started"}"#,
            r#"{"type":"session.configured","model":"gpt-5"}"#,
        ]);
        assert!(events.is_empty());
    }
}
