//! Gemini CLI spawn configuration.

use crate::agents::AdapterFamily;
use crate::registry::AgentSpawnConfig;

/// `gemini -p <prompt> [--model <m>] --output-format stream-json`
///
/// Gemini takes its prompt as an argument only; a stdin request falls back
/// to positional mode.
pub fn spawn_config() -> AgentSpawnConfig {
    AgentSpawnConfig::new("gemini", "-p", AdapterFamily::Gemini)
        .model_flag("--model")
        .default_args(["--output-format", "stream-json"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemini_has_no_stdin_mode() {
        let config = spawn_config();
        assert_eq!(config.binary_name, "gemini");
        assert_eq!(config.prompt_flag, "-p");
        assert_eq!(config.default_args, vec!["--output-format", "stream-json"]);
        assert!(config.stdin_mode.is_none());
    }
}
