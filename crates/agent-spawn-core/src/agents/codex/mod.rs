//! Codex adapter and spawn configuration.
//!
//! # Protocol Overview
//!
//! `codex exec --json` prints one event per line, discriminated by `type`:
//!
//! - `thread.started`: carries `thread_id`
//! - `turn.started` / `turn.completed` / `turn.failed`: turn lifecycle;
//!   `turn.completed` carries token `usage`
//! - `item.started` / `item.updated` / `item.completed`: an `item` whose own
//!   `type` says what it is (`command_execution`, `file_change`,
//!   `mcp_tool_call`, `web_search`, `todo_list`, `reasoning`,
//!   `agent_message`, `error`)
//! - `error`: stream-level error
//!
//! Item ids double as tool-call ids.

mod parser;
pub mod spawn;
mod types;

pub use parser::CodexParser;
pub use spawn::spawn_config;
pub use types::*;
