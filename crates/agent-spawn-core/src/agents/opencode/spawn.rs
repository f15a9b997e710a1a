//! OpenCode spawn configuration.

use crate::agents::AdapterFamily;
use crate::registry::AgentSpawnConfig;

/// `opencode run <prompt> [--model <m>] --format json`
///
/// OpenCode has no stdin prompt mode; a stdin request falls back to
/// passing the prompt as an argument.
pub fn spawn_config() -> AgentSpawnConfig {
    AgentSpawnConfig::new("opencode", "run", AdapterFamily::OpenCode)
        .model_flag("--model")
        .default_args(["--format", "json"])
}
