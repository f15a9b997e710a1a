//! Agent process spawning.
//!
//! This module turns a resolved [`AgentSpawnConfig`] plus caller
//! [`SpawnOptions`] into a running child process:
//!
//! - Composing the argument list in the exact order agent CLIs expect
//! - Writing the prompt to stdin and closing it, when stdin mode is active
//! - Capturing stderr in full
//! - Supervising the child until exit, with an optional kill
//!
//! Stdout is handed to the caller untouched; line splitting and protocol
//! adaptation happen downstream.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout};
use tokio::sync::{oneshot, Notify};

use crate::error::SpawnError;
use crate::logging::{self, Direction, LogHandle};
use crate::registry::AgentSpawnConfig;
use crate::shell::{build_command, AgentExit};

/// Caller-supplied options for one spawn.
#[derive(Debug, Clone, Default)]
pub struct SpawnOptions {
    pub prompt: String,
    /// Model name. Ignored for agents without a model flag.
    pub model: Option<String>,
    /// Extra arguments appended after everything else.
    pub args: Vec<String>,
    /// Send the prompt over stdin when the agent supports it.
    pub use_stdin: bool,
    pub cwd: Option<PathBuf>,
    /// Environment overrides for the child.
    pub env: Vec<(String, String)>,
    /// Run through a login shell, e.g. `"/bin/zsh -l -c"`. An empty string
    /// selects `$SHELL -l -c`.
    pub shell_prefix: Option<String>,
    /// Directory for the transcript file. No transcript when unset.
    pub log_dir: Option<PathBuf>,
    /// Transcript file stem. Defaults to the agent id plus a random suffix.
    pub log_id: Option<String>,
}

impl SpawnOptions {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn use_stdin(mut self, use_stdin: bool) -> Self {
        self.use_stdin = use_stdin;
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn shell_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.shell_prefix = Some(prefix.into());
        self
    }

    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn log_id(mut self, id: impl Into<String>) -> Self {
        self.log_id = Some(id.into());
        self
    }
}

/// A fully composed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub binary: String,
    pub args: Vec<String>,
    /// Text to write to stdin before closing it. `None` means stdin is not
    /// used and the child gets `/dev/null`.
    pub stdin: Option<String>,
}

/// Compose the invocation for `config` and `options`.
///
/// Argument order:
/// `[prompt_flag, prompt, model_flag, model, default_args.., stdin extra_args.., caller args..]`
///
/// - An empty `prompt_flag` is left out, so the prompt is passed bare.
/// - The prompt is left out when stdin mode is active and omits it.
/// - The model pair is added only when both flag and a non-empty model exist.
/// - Stdin mode is active only when requested and the agent has a stdin
///   mode; otherwise the prompt is passed positionally.
pub fn build_invocation(config: &AgentSpawnConfig, options: &SpawnOptions) -> Invocation {
    let stdin_mode = config.stdin_mode.as_ref().filter(|_| options.use_stdin);
    if options.use_stdin && stdin_mode.is_none() {
        log::debug!(
            "{} has no stdin mode; passing the prompt as an argument",
            config.binary_name
        );
    }

    let mut args = Vec::new();

    if !config.prompt_flag.is_empty() {
        args.push(config.prompt_flag.clone());
    }
    if !stdin_mode.is_some_and(|mode| mode.omit_prompt) {
        args.push(options.prompt.clone());
    }

    match (config.model_flag.as_ref(), options.model.as_deref()) {
        (Some(flag), Some(model)) if !model.is_empty() => {
            args.push(flag.clone());
            args.push(model.to_string());
        }
        (None, Some(model)) if !model.is_empty() => {
            log::warn!(
                "{} has no model flag; ignoring model {:?}",
                config.binary_name,
                model
            );
        }
        _ => {}
    }

    args.extend(config.default_args.iter().cloned());
    if let Some(mode) = stdin_mode {
        args.extend(mode.extra_args.iter().cloned());
    }
    args.extend(options.args.iter().cloned());

    Invocation {
        binary: config.binary_name.clone(),
        args,
        stdin: stdin_mode.map(|_| options.prompt.clone()),
    }
}

/// How a supervised child ended.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub exit: AgentExit,
    /// Everything the child wrote to stderr, decoded lossily.
    pub stderr: String,
}

/// Cloneable handle that asks the supervisor to kill its child.
#[derive(Debug, Clone, Default)]
pub struct KillHandle {
    notify: Arc<Notify>,
}

impl KillHandle {
    /// Request a kill. Idempotent; a no-op once the child has exited.
    pub fn kill(&self) {
        self.notify.notify_one();
    }
}

/// A running agent process.
///
/// The child itself is owned by a background supervisor task; this handle
/// holds its stdout, the exit notification and the kill switch.
#[derive(Debug)]
pub struct AgentProcess {
    stdout: Option<ChildStdout>,
    exit: oneshot::Receiver<Result<ProcessOutcome, SpawnError>>,
    kill: KillHandle,
}

impl AgentProcess {
    /// Start the child and its supervisor.
    ///
    /// Must be called inside a tokio runtime. Fails if the command cannot be
    /// composed or the OS refuses to create the process.
    pub fn spawn(
        invocation: Invocation,
        options: &SpawnOptions,
        transcript: LogHandle,
    ) -> Result<Self, SpawnError> {
        let mut cmd = build_command(
            &invocation.binary,
            &invocation.args,
            options.cwd.as_deref(),
            options.shell_prefix.as_deref(),
        )?;
        for (key, value) in &options.env {
            cmd.env(key, value);
        }
        cmd.stdin(if invocation.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

        log::info!("spawning {} {:?}", invocation.binary, invocation.args);
        let mut child = cmd.spawn().map_err(|source| SpawnError::Spawn {
            binary: invocation.binary.clone(),
            source,
        })?;

        if let (Some(prompt), Some(stdin)) = (invocation.stdin, child.stdin.take()) {
            tokio::spawn(write_prompt(stdin, prompt, Arc::clone(&transcript)));
        }

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let kill = KillHandle::default();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(supervise(child, stderr, kill.clone(), transcript, tx));

        Ok(Self {
            stdout,
            exit: rx,
            kill,
        })
    }

    /// Take the child's stdout. Returns `None` after the first call.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.stdout.take()
    }

    pub fn kill_handle(&self) -> KillHandle {
        self.kill.clone()
    }

    /// Split into the exit notification and the kill handle.
    pub fn into_exit(self) -> (oneshot::Receiver<Result<ProcessOutcome, SpawnError>>, KillHandle) {
        (self.exit, self.kill)
    }

    /// Wait for the child to exit and stderr to close.
    pub async fn wait(self) -> Result<ProcessOutcome, SpawnError> {
        self.exit.await.unwrap_or(Err(SpawnError::Aborted))
    }
}

/// Write the prompt and close stdin so the child sees EOF.
async fn write_prompt(mut stdin: ChildStdin, prompt: String, transcript: LogHandle) {
    logging::log_line(&transcript, Direction::Stdin, &prompt);
    let result = async {
        stdin.write_all(prompt.as_bytes()).await?;
        stdin.shutdown().await
    }
    .await;
    if let Err(err) = result {
        log::warn!("Failed to write prompt to agent stdin: {}", err);
    }
}

/// Own the child until it exits: drain stderr, honour kill requests and
/// report the outcome.
///
/// The outcome is sent once the child has exited and stderr reached EOF. A
/// grandchild that inherited stderr keeps the outcome pending until it exits
/// too; only the direct child is killed.
async fn supervise(
    mut child: Child,
    stderr: Option<ChildStderr>,
    kill: KillHandle,
    transcript: LogHandle,
    tx: oneshot::Sender<Result<ProcessOutcome, SpawnError>>,
) {
    let read_stderr = async move {
        let mut buf = Vec::new();
        if let Some(mut stderr) = stderr {
            if let Err(err) = stderr.read_to_end(&mut buf).await {
                log::warn!("Failed to read agent stderr: {}", err);
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    };

    let wait = async {
        tokio::select! {
            status = child.wait() => status,
            _ = kill.notify.notified() => {
                log::debug!("killing agent process {:?}", child.id());
                if let Err(err) = child.start_kill() {
                    log::warn!("Failed to kill agent process: {}", err);
                }
                child.wait().await
            }
        }
    };

    let (stderr, status) = tokio::join!(read_stderr, wait);

    for line in stderr.lines() {
        logging::log_line(&transcript, Direction::Stderr, line);
    }

    let outcome = status.map_err(SpawnError::Wait).map(|status| {
        let exit = AgentExit::from_status(status);
        logging::log_line(
            &transcript,
            Direction::Exit,
            &format!("code={} signal={:?}", exit.code, exit.signal),
        );
        ProcessOutcome { exit, stderr }
    });

    // The receiver may be gone if the caller dropped `done`.
    let _ = tx.send(outcome);
}

// ============================================================================
// TESTS
// ============================================================================
