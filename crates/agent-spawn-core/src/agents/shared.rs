//! Machinery every adapter family shares.
//!
//! A family parser only knows its own dialect. Everything else lives here:
//!
//! - Parsing a line and downgrading malformed JSON to an in-band error
//! - Finding the thread/session id, whatever the agent calls it
//! - Correlating tool-call starts and completions by call id
//! - Turning raw token counts into a [`Usage`] event

use std::collections::HashMap;

use serde_json::Value;

use super::event::{AgentEvent, ToolKind, Usage};

/// Field names an agent may use for its thread/session id, in priority order.
pub const THREAD_ID_ALIASES: [&str; 6] = [
    "thread_id",
    "threadId",
    "threadID",
    "session_id",
    "sessionId",
    "sessionID",
];

const MALFORMED_PREFIX: &str = "[adapter] Malformed JSON line: ";
const MALFORMED_LINE_LIMIT: usize = 200;
const EXEC_TITLE_LIMIT: usize = 80;

/// Truncate to at most `max` characters, ending in `...` when cut.
///
/// Counts characters, not bytes, so multi-byte text is never split.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Search a parsed message for a thread/session id.
///
/// Each object is checked against [`THREAD_ID_ALIASES`] in order before its
/// children are visited, so a top-level id beats a nested one. Empty strings
/// are skipped.
pub fn find_thread_id(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => {
            for alias in THREAD_ID_ALIASES {
                if let Some(id) = map.get(alias).and_then(Value::as_str) {
                    if !id.is_empty() {
                        return Some(id.to_string());
                    }
                }
            }
            map.values().find_map(find_thread_id)
        }
        Value::Array(items) => items.iter().find_map(find_thread_id),
        _ => None,
    }
}

/// Render tool output as a string.
///
/// Strings pass through verbatim; anything else is serialized as JSON. A
/// missing or `null` output renders as the empty string.
pub fn stringify_output(output: Option<&Value>) -> String {
    match output {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => serde_json::to_string(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// Read a token count. Missing or non-numeric values are `None`.
pub fn token_count(value: Option<&Value>) -> Option<u64> {
    let value = value?;
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|n| n.is_finite() && *n >= 0.0)
            .map(|n| n as u64)
    })
}

/// Build a usage event from raw counts.
///
/// Input and output default to 0. Returns `None` for an all-zero report
/// without a cached count, which agents send as a heartbeat.
pub fn usage_event(
    input: Option<&Value>,
    output: Option<&Value>,
    cached: Option<&Value>,
    cost: Option<&Value>,
) -> Option<AgentEvent> {
    let input_tokens = token_count(input).unwrap_or(0);
    let output_tokens = token_count(output).unwrap_or(0);
    let cached_tokens = token_count(cached);

    if input_tokens == 0 && output_tokens == 0 && cached_tokens.is_none() {
        return None;
    }

    Some(AgentEvent::Usage(Usage {
        input_tokens,
        output_tokens,
        cached_tokens,
        cost_usd: cost.and_then(Value::as_f64),
    }))
}

// ============================================================================
// TOOL-CALL CORRELATION
// ============================================================================

/// Lifecycle status carried by a tool-call update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ToolStatus {
    /// Map an agent's status string. Anything unrecognised counts as running.
    pub fn parse(status: &str) -> Self {
        match status {
            "pending" => ToolStatus::Pending,
            "completed" | "success" | "succeeded" => ToolStatus::Completed,
            "failed" | "error" | "declined" => ToolStatus::Failed,
            _ => ToolStatus::Running,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ToolStatus::Completed | ToolStatus::Failed)
    }
}

/// One observation of a tool call, as extracted by a family parser.
#[derive(Debug, Clone, Copy)]
pub struct ToolUpdate<'a> {
    pub id: &'a str,
    /// Tool name. Dialects that omit it on completion pass `None`.
    pub name: Option<&'a str>,
    /// Name to classify by when it differs from the displayed `name`.
    pub kind_hint: Option<&'a str>,
    pub status: ToolStatus,
    pub input: Option<&'a Value>,
    pub output: Option<&'a Value>,
}

/// Open tool calls for one spawn, keyed by call id.
///
/// The kind is fixed when the call starts and reused on completion, so a
/// completion can never disagree with its start.
#[derive(Debug, Default)]
pub struct ToolCallTracker {
    open: HashMap<String, ToolKind>,
}

impl ToolCallTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` has started and not yet completed.
    #[cfg(test)]
    pub fn is_open(&self, id: &str) -> bool {
        self.open.contains_key(id)
    }

    #[cfg(test)]
    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Apply one update and append the resulting events.
    ///
    /// The first sighting of an id emits `ToolStart`. A terminal status on an
    /// open id emits exactly one `ToolComplete` and forgets the id, so a later
    /// update with the same id starts a new call. An update that is both the
    /// first sighting and terminal emits the start and then the completion.
    pub fn apply(&mut self, update: ToolUpdate<'_>, events: &mut Vec<AgentEvent>) {
        if update.id.is_empty() {
            log::debug!("dropping tool update without a call id");
            return;
        }

        if !self.open.contains_key(update.id) {
            let name = update.name.unwrap_or("tool");
            let kind = ToolKind::classify(update.kind_hint.unwrap_or(name));
            self.open.insert(update.id.to_string(), kind);
            events.push(AgentEvent::ToolStart {
                id: update.id.to_string(),
                kind,
                title: tool_title(kind, name, update.input),
                input: update.input.cloned(),
            });
        }

        if update.status.is_terminal() {
            if let Some(kind) = self.open.remove(update.id) {
                events.push(AgentEvent::ToolComplete {
                    id: update.id.to_string(),
                    kind,
                    path: stringify_output(update.output),
                });
            }
        }
    }
}

/// Exec calls are titled by their command; every other kind by tool name.
fn tool_title(kind: ToolKind, name: &str, input: Option<&Value>) -> String {
    if kind != ToolKind::Exec {
        return name.to_string();
    }
    match input.and_then(command_text) {
        Some(command) => truncate(&command, EXEC_TITLE_LIMIT),
        None => name.to_string(),
    }
}

/// Pull the command out of a shell tool's input.
///
/// Accepts a bare string, or an object with `command`/`cmd` holding either a
/// string or an argv array.
fn command_text(input: &Value) -> Option<String> {
    let command = match input {
        Value::String(_) => input,
        Value::Object(map) => map.get("command").or_else(|| map.get("cmd"))?,
        _ => return None,
    };
    match command {
        Value::String(s) => Some(s.clone()),
        Value::Array(parts) => {
            let words: Vec<&str> = parts.iter().filter_map(Value::as_str).collect();
            (!words.is_empty()).then(|| words.join(" "))
        }
        _ => None,
    }
}

// ============================================================================
// PER-SPAWN ADAPTER STATE
// ============================================================================

/// State every adapter instance carries for the lifetime of one spawn.
#[derive(Debug, Default)]
pub struct AdapterState {
    session_started: bool,
    pub tools: ToolCallTracker,
}

impl AdapterState {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn session_started(&self) -> bool {
        self.session_started
    }

    /// Parse one raw line and handle the dialect-independent steps.
    ///
    /// Blank lines yield nothing. Malformed JSON appends an error event and
    /// yields `None`. Otherwise the first thread id of the spawn appends a
    /// `SessionStart`, and the parsed message is returned for dispatch.
    pub fn begin_line(&mut self, line: &str, events: &mut Vec<AgentEvent>) -> Option<Value> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        let message: Value = match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(err) => {
                log::debug!("malformed agent output line: {}", err);
                events.push(AgentEvent::error(format!(
                    "{MALFORMED_PREFIX}{}",
                    truncate(line, MALFORMED_LINE_LIMIT)
                )));
                return None;
            }
        };

        if !self.session_started {
            if let Some(thread_id) = find_thread_id(&message) {
                self.session_started = true;
                events.push(AgentEvent::SessionStart { thread_id });
            }
        }

        Some(message)
    }
}

// ============================================================================
// TESTS
// ============================================================================
