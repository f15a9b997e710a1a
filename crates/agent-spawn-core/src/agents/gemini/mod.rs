//! Gemini CLI adapter and spawn configuration.
//!
//! # Protocol Overview
//!
//! `gemini -p <prompt> --output-format stream-json` prints flat NDJSON
//! events, each with a `type`:
//!
//! - `init`: session start, carries `session_id`
//! - `message`: text from `user` or `assistant`; assistant text may arrive
//!   as `delta` chunks
//! - `tool_use`: tool invocation with `tool_name`, `tool_id`, `parameters`
//! - `tool_result`: `status` `success` or `error` for a `tool_id`
//! - `error`: non-fatal or fatal error
//! - `result`: end of the run with `stats`

mod parser;
pub mod spawn;
mod types;

pub use parser::GeminiParser;
pub use spawn::spawn_config;
pub use types::*;
