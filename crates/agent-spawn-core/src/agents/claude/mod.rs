//! Claude Code adapter and spawn configuration.
//!
//! # Protocol Overview
//!
//! `claude -p <prompt> --output-format stream-json --verbose` prints one JSON
//! message per line:
//!
//! - `system` (subtype `init`): session start, carries `session_id`
//! - `assistant`: a model message whose `content` holds `text`, `thinking`
//!   and `tool_use` blocks
//! - `user`: tool results fed back to the model as `tool_result` blocks
//! - `result`: end of the run, with token `usage` and `total_cost_usd`
//!
//! Tool results carry only the `tool_use_id`, so the kind of a completed call
//! always comes from the `tool_use` block that opened it.

mod parser;
pub mod spawn;
mod types;

pub use parser::ClaudeParser;
pub use spawn::spawn_config;
pub use types::*;
