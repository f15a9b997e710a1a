//! Claude Code spawn configuration.

use crate::agents::AdapterFamily;
use crate::registry::AgentSpawnConfig;

/// `claude -p <prompt> [--model <m>] --output-format stream-json --verbose`
///
/// `stream-json` output requires `--verbose` in print mode. In stdin mode the
/// prompt is piped as plain text.
pub fn spawn_config() -> AgentSpawnConfig {
    AgentSpawnConfig::new("claude", "-p", AdapterFamily::Claude)
        .model_flag("--model")
        .default_args(["--output-format", "stream-json", "--verbose"])
        .stdin_mode(true, ["--input-format", "text"])
}
