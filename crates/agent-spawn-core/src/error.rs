//! Error taxonomy for spawning agents.
//!
//! Only precondition and process-level failures are errors. A malformed
//! stdout line becomes an in-band [`AgentEvent::Error`] and a non-zero exit
//! code is plain data on [`SpawnResult`].
//!
//! [`AgentEvent::Error`]: crate::agents::event::AgentEvent::Error
//! [`SpawnResult`]: crate::orchestrator::SpawnResult

use std::io;
use thiserror::Error;

/// Errors raised while resolving, launching or supervising an agent process.
#[derive(Error, Debug)]
pub enum SpawnError {
    /// No spawn configuration is registered under this agent id.
    ///
    /// Returned synchronously; no child process exists yet.
    #[error("Unknown agent: {agent_id}")]
    UnknownAgent { agent_id: String },

    /// The operating system could not create the child process.
    #[error("Failed to spawn {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: io::Error,
    },

    /// The command line could not be composed (e.g. an unquotable argument
    /// for a login shell).
    #[error("Failed to build command: {0}")]
    Command(String),

    /// Reading the child's stdout failed mid-stream.
    #[error("Failed to read agent output: {0}")]
    Read(#[source] io::Error),

    /// Waiting for the child to exit failed.
    #[error("Failed to wait for agent process: {0}")]
    Wait(#[source] io::Error),

    /// The task supervising the child went away without reporting an exit.
    #[error("Agent supervisor stopped before the process exited")]
    Aborted,
}

pub type Result<T, E = SpawnError> = std::result::Result<T, E>;

// ============================================================================
// TESTS
// ============================================================================
