//! Codex spawn configuration.

use crate::agents::AdapterFamily;
use crate::registry::AgentSpawnConfig;

/// `codex exec <prompt> [--model <m>] --json --skip-git-repo-check`
///
/// In stdin mode the prompt is dropped from the arguments and `-` tells
/// `codex exec` to read it from standard input.
pub fn spawn_config() -> AgentSpawnConfig {
    AgentSpawnConfig::new("codex", "exec", AdapterFamily::Codex)
        .model_flag("--model")
        .default_args(["--json", "--skip-git-repo-check"])
        .stdin_mode(true, ["-"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codex_reads_prompt_from_dash() {
        let config = spawn_config();
        assert_eq!(config.binary_name, "codex");
        assert_eq!(config.prompt_flag, "exec");
        assert_eq!(config.model_flag.as_deref(), Some("--model"));

        let stdin = config.stdin_mode.unwrap();
        assert!(stdin.omit_prompt);
        assert_eq!(stdin.extra_args, vec!["-"]);
    }
}
