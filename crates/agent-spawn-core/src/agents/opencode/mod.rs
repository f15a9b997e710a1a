//! OpenCode adapter and spawn configuration.
//!
//! # Protocol Overview
//!
//! `opencode run --format json` prints one JSON object per line. Every object
//! has a `type` and most carry the message `part` that produced it:
//!
//! - `step_start`: a model step began (carries `sessionID`)
//! - `text`: assistant text part
//! - `reasoning`: thinking part
//! - `tool_use`: tool part with `callID`, `tool` and `state.status`
//! - `step_finish`: step ended, with `tokens` and `cost`
//! - `error`: session error
//!
//! The session id arrives as `sessionID` on every line and is picked up by the
//! shared thread-id search.

mod parser;
pub mod spawn;
mod types;

pub use parser::OpenCodeParser;
pub use spawn::spawn_config;
pub use types::*;
