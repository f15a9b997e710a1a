//! Static per-agent spawn configuration.
//!
//! An [`AgentSpawnConfig`] says how to launch one agent CLI and which
//! adapter family reads its output. [`AgentRegistry`] maps agent ids to
//! configs; looking up an unknown id is the only precondition failure of a
//! spawn.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::agents::{claude, codex, gemini, opencode, AdapterFamily};
use crate::error::SpawnError;

/// How an agent accepts its prompt on standard input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StdinMode {
    /// Leave the prompt out of the argument list when it goes over stdin.
    #[serde(default)]
    pub omit_prompt: bool,
    /// Arguments telling the agent to read its prompt from stdin.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

/// Launch recipe for one agent CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSpawnConfig {
    pub binary_name: String,
    /// Flag (or subcommand) placed before the prompt. Empty means the prompt
    /// is passed bare.
    pub prompt_flag: String,
    #[serde(default)]
    pub default_args: Vec<String>,
    #[serde(default)]
    pub model_flag: Option<String>,
    #[serde(default)]
    pub stdin_mode: Option<StdinMode>,
    pub adapter_family: AdapterFamily,
}

impl AgentSpawnConfig {
    /// Create a config with no default args, model flag or stdin mode.
    pub fn new(
        binary_name: impl Into<String>,
        prompt_flag: impl Into<String>,
        adapter_family: AdapterFamily,
    ) -> Self {
        Self {
            binary_name: binary_name.into(),
            prompt_flag: prompt_flag.into(),
            default_args: Vec::new(),
            model_flag: None,
            stdin_mode: None,
            adapter_family,
        }
    }

    /// Set the arguments always passed after the prompt and model.
    pub fn default_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the flag used to select a model.
    pub fn model_flag(mut self, flag: impl Into<String>) -> Self {
        self.model_flag = Some(flag.into());
        self
    }

    /// Allow the prompt to be sent over stdin.
    pub fn stdin_mode<I, S>(mut self, omit_prompt: bool, extra_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stdin_mode = Some(StdinMode {
            omit_prompt,
            extra_args: extra_args.into_iter().map(Into::into).collect(),
        });
        self
    }
}

/// Agent id → spawn configuration.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: BTreeMap<String, AgentSpawnConfig>,
}

impl AgentRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every agent this crate ships an adapter for.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("claude-code", claude::spawn_config());
        registry.register("claude", claude::spawn_config());
        registry.register("codex", codex::spawn_config());
        registry.register("opencode", opencode::spawn_config());
        registry.register("gemini", gemini::spawn_config());
        registry
    }

    /// Register (or replace) an agent. Returns the config it replaced.
    pub fn register(
        &mut self,
        agent_id: impl Into<String>,
        config: AgentSpawnConfig,
    ) -> Option<AgentSpawnConfig> {
        self.agents.insert(agent_id.into(), config)
    }

    pub fn get(&self, agent_id: &str) -> Option<&AgentSpawnConfig> {
        self.agents.get(agent_id)
    }

    /// Look up an agent, failing with [`SpawnError::UnknownAgent`].
    pub fn resolve(&self, agent_id: &str) -> Result<&AgentSpawnConfig, SpawnError> {
        self.get(agent_id).ok_or_else(|| SpawnError::UnknownAgent {
            agent_id: agent_id.to_string(),
        })
    }

    /// Registered agent ids, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.agents.keys().map(String::as_str)
    }

    /// Merge configs from a JSON object keyed by agent id.
    ///
    /// ```json
    /// {"my-agent": {"binaryName": "my-agent", "promptFlag": "-p", "adapterFamily": "claude"}}
    /// ```
    ///
    /// Returns how many entries were registered. Nothing is registered if the
    /// document fails to parse.
    pub fn extend_from_json(&mut self, json: &str) -> Result<usize, serde_json::Error> {
        let entries: BTreeMap<String, AgentSpawnConfig> = serde_json::from_str(json)?;
        let count = entries.len();
        self.agents.extend(entries);
        Ok(count)
    }
}

// ============================================================================
// TESTS
// ============================================================================
