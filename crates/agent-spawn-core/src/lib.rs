//! # agent-spawn-core
//!
//! Spawn AI coding agent CLIs and normalize their JSON-lines output into one
//! canonical event protocol.
//!
//! ## Key Concepts
//!
//! - **Agent id**: key into an [`AgentRegistry`] of static spawn configs
//! - **Adapter family**: the JSON dialect an agent speaks (Claude, Codex,
//!   OpenCode, Gemini)
//! - **AgentEvent**: the canonical event every dialect is translated into
//! - **SpawnResult**: exit code, stderr, thread id and usage of one run
//!
//! ## Example
//!
//! ```ignore
//! use agent_spawn_core::{Orchestrator, SpawnOptions};
//! use futures::StreamExt;
//!
//! let orchestrator = Orchestrator::builtin();
//! let mut spawn = orchestrator.spawn_streaming("codex", SpawnOptions::new("fix the tests"))?;
//! while let Some(event) = spawn.events.next().await {
//!     println!("{:?}", event?);
//! }
//! let result = spawn.done.await?;
//! ```

pub mod agents;
pub mod error;
pub mod line_reader;
pub mod logging;
pub mod orchestrator;
pub mod registry;
pub mod shell;
pub mod spawn;

// Re-export commonly used types
pub use agents::event::{AgentEvent, ToolKind, Usage};
pub use agents::{AdapterFamily, ProtocolAdapter};
pub use error::SpawnError;
pub use line_reader::LineReader;
pub use orchestrator::{Orchestrator, SpawnResult, StreamingSpawn};
pub use registry::{AgentRegistry, AgentSpawnConfig, StdinMode};
pub use spawn::SpawnOptions;
