//! Spawn orchestration.
//!
//! [`Orchestrator::spawn_streaming`] wires the pieces together:
//!
//! ```text
//! AgentProcess stdout ─► LineReader ─► ProtocolAdapter ─► events
//!        │                                   │
//!        └─ exit + stderr ─► done ◄── ResultAccumulator (thread id, usage)
//! ```
//!
//! `events` and `done` are independent. The accumulator is fed as `events`
//! is consumed, and `done` takes a snapshot of it once the process has
//! exited. A caller that wants the thread id and usage in the result should
//! drain `events` before awaiting `done`.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use futures::stream::{self, BoxStream, Stream, StreamExt};
use serde::Serialize;
use tokio::process::ChildStdout;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::agents::event::{AgentEvent, Usage};
use crate::agents::{adapt, AdapterFamily};
use crate::error::SpawnError;
use crate::line_reader::LineReader;
use crate::logging::{self, Direction, LogHandle};
use crate::registry::AgentRegistry;
use crate::spawn::{build_invocation, AgentProcess, KillHandle, ProcessOutcome, SpawnOptions};

/// Final outcome of one spawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnResult {
    pub stderr: String,
    /// Exit code, or -1 when the process was ended by a signal.
    pub exit_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Session data gathered from the event stream while it is consumed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultAccumulator {
    thread_id: Option<String>,
    usage: Option<Usage>,
}

impl ResultAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The first thread id wins.
    pub fn on_session_start(&mut self, thread_id: &str) {
        if self.thread_id.is_none() {
            self.thread_id = Some(thread_id.to_string());
        }
    }

    /// The latest usage report wins.
    pub fn on_usage(&mut self, usage: &Usage) {
        self.usage = Some(*usage);
    }

    pub fn observe(&mut self, event: &AgentEvent) {
        match event {
            AgentEvent::SessionStart { thread_id } => self.on_session_start(thread_id),
            AgentEvent::Usage(usage) => self.on_usage(usage),
            _ => {}
        }
    }

    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    pub fn usage(&self) -> Option<&Usage> {
        self.usage.as_ref()
    }

    fn finish(&self, outcome: ProcessOutcome) -> SpawnResult {
        SpawnResult {
            stderr: outcome.stderr,
            exit_code: outcome.exit.code,
            signal: outcome.exit.signal,
            thread_id: self.thread_id.clone(),
            usage: self.usage,
        }
    }
}

type SharedAccumulator = Arc<Mutex<ResultAccumulator>>;

fn lock(accumulator: &SharedAccumulator) -> MutexGuard<'_, ResultAccumulator> {
    accumulator.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Canonical events of one spawn, in stdout order. Single pass.
pub struct EventStream {
    inner: BoxStream<'static, Result<AgentEvent, SpawnError>>,
}

impl EventStream {
    fn empty() -> Self {
        Self {
            inner: stream::empty().boxed(),
        }
    }
}

impl Stream for EventStream {
    type Item = Result<AgentEvent, SpawnError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream").finish_non_exhaustive()
    }
}

/// Resolves once the process has exited and its stderr is closed.
///
/// Fails only when the process could not be started or supervised.
#[derive(Debug)]
pub struct SpawnDone {
    exit: oneshot::Receiver<Result<ProcessOutcome, SpawnError>>,
    accumulator: SharedAccumulator,
}

impl Future for SpawnDone {
    type Output = Result<SpawnResult, SpawnError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let outcome = match Pin::new(&mut self.exit).poll(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(Ok(outcome)) => outcome,
            Poll::Ready(Err(_)) => Err(SpawnError::Aborted),
        };
        Poll::Ready(outcome.map(|outcome| lock(&self.accumulator).finish(outcome)))
    }
}

/// Handle to an in-flight spawn.
#[derive(Debug)]
pub struct StreamingSpawn {
    pub events: EventStream,
    pub done: SpawnDone,
    kill: KillHandle,
}

impl StreamingSpawn {
    /// Kill the child. `done` still resolves, with the signal recorded.
    pub fn kill(&self) {
        self.kill.kill();
    }

    pub fn kill_handle(&self) -> KillHandle {
        self.kill.clone()
    }

    pub fn into_parts(self) -> (EventStream, SpawnDone, KillHandle) {
        (self.events, self.done, self.kill)
    }

    /// Drain every event, then wait for the process.
    pub async fn collect(
        self,
    ) -> (
        Vec<Result<AgentEvent, SpawnError>>,
        Result<SpawnResult, SpawnError>,
    ) {
        let events = self.events.collect().await;
        let result = self.done.await;
        (events, result)
    }

    /// A spawn that never started: no events, `done` fails with `err`.
    fn failed(err: SpawnError) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(Err(err));
        Self {
            events: EventStream::empty(),
            done: SpawnDone {
                exit: rx,
                accumulator: SharedAccumulator::default(),
            },
            kill: KillHandle::default(),
        }
    }
}

/// Spawns agents by id and streams their canonical events.
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    registry: AgentRegistry,
}

impl Orchestrator {
    pub fn new(registry: AgentRegistry) -> Self {
        Self { registry }
    }

    /// An orchestrator over [`AgentRegistry::builtin`].
    pub fn builtin() -> Self {
        Self::new(AgentRegistry::builtin())
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut AgentRegistry {
        &mut self.registry
    }

    /// Start `agent_id` and return its event stream and completion future.
    ///
    /// Fails immediately, before any process exists, only for an unknown
    /// agent id. A process that cannot be started yields an empty `events`
    /// and a `done` that fails. Must be called inside a tokio runtime.
    pub fn spawn_streaming(
        &self,
        agent_id: &str,
        options: SpawnOptions,
    ) -> Result<StreamingSpawn, SpawnError> {
        let config = self.registry.resolve(agent_id)?;
        let invocation = build_invocation(config, &options);

        let log_id = options
            .log_id
            .clone()
            .unwrap_or_else(|| format!("{}-{}", agent_id, Uuid::new_v4()));
        let transcript = logging::open_log_file(options.log_dir.as_deref(), &log_id);

        let mut process = match AgentProcess::spawn(invocation, &options, Arc::clone(&transcript)) {
            Ok(process) => process,
            Err(err) => {
                log::warn!("Failed to start agent {}: {}", agent_id, err);
                return Ok(StreamingSpawn::failed(err));
            }
        };

        let accumulator = SharedAccumulator::default();
        let events = match process.take_stdout() {
            Some(stdout) => event_pipeline(
                stdout,
                config.adapter_family,
                transcript,
                Arc::clone(&accumulator),
            ),
            None => EventStream::empty(),
        };
        let (exit, kill) = process.into_exit();

        Ok(StreamingSpawn {
            events,
            done: SpawnDone { exit, accumulator },
            kill,
        })
    }
}

/// stdout → lines → adapter → events, feeding the accumulator on the way.
fn event_pipeline(
    stdout: ChildStdout,
    family: AdapterFamily,
    transcript: LogHandle,
    accumulator: SharedAccumulator,
) -> EventStream {
    let lines = LineReader::new(stdout).into_stream().inspect(move |line| {
        if let Ok(line) = line {
            log::debug!("{} stdout: {}", family.as_str(), line);
            logging::log_line(&transcript, Direction::Stdout, line);
        }
    });

    let events = adapt(Box::pin(lines), family.adapter()).inspect(move |event| {
        if let Ok(event) = event {
            lock(&accumulator).observe(event);
        }
    });

    EventStream {
        inner: events.boxed(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
