//! Building the child command.
//!
//! Agents are normally spawned directly. When the caller asks for a login
//! shell (a `shell_prefix`), the binary and its arguments are quoted into a
//! single command string for `<prefix> '<command>'` so the user's profile
//! sets up `PATH` and friends first.
//!
//! # Example
//!
//! ```ignore
//! use agent_spawn_core::shell::build_command;
//!
//! let cmd = build_command(
//!     "codex",
//!     &["exec".to_string(), "fix the tests".to_string()],
//!     None,
//!     Some("/bin/zsh -l -c"),
//! )?;
//! ```

use std::path::Path;
use std::process::ExitStatus;

use serde::Serialize;
use tokio::process::Command;

use crate::error::SpawnError;

/// How a child process terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AgentExit {
    /// Exit code, or -1 when the process was ended by a signal.
    pub code: i32,
    pub signal: Option<i32>,
}

impl AgentExit {
    pub fn from_status(status: ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code().unwrap_or(-1),
            signal,
        }
    }
}

/// Prepend the binary's parent directory to PATH so sibling tools (node,
/// for npm-installed agents) are found.
pub fn prepare_path_env(cmd: &mut Command, binary_path: &str) {
    if !binary_path.contains('/') {
        return;
    }
    let Some(dir) = Path::new(binary_path).parent().and_then(Path::to_str) else {
        return;
    };
    if dir.is_empty() {
        return;
    }
    let existing = std::env::var("PATH").unwrap_or_default();
    let combined = if existing.is_empty() {
        dir.to_string()
    } else {
        format!("{}:{}", dir, existing)
    };
    cmd.env("PATH", combined);
}

/// Build the command for `binary args...`.
///
/// With `shell_prefix` set, the command runs inside that shell (an empty
/// prefix selects `$SHELL -l -c`). Otherwise the binary is executed directly.
pub fn build_command(
    binary_path: &str,
    args: &[String],
    working_dir: Option<&Path>,
    shell_prefix: Option<&str>,
) -> Result<Command, SpawnError> {
    let mut cmd = match shell_prefix {
        Some(prefix) => build_login_shell_command(binary_path, args, prefix)?,
        None => {
            let mut cmd = Command::new(binary_path);
            cmd.args(args);
            cmd
        }
    };

    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    Ok(cmd)
}

#[cfg(unix)]
fn build_login_shell_command(
    binary_path: &str,
    args: &[String],
    prefix: &str,
) -> Result<Command, SpawnError> {
    let prefix = get_shell_prefix(prefix);

    let prefix_parts: Vec<&str> = prefix.split_whitespace().collect();
    let Some((shell_program, shell_args)) = prefix_parts.split_first() else {
        return Err(SpawnError::Command("Empty shell prefix".to_string()));
    };

    let mut command_parts = Vec::with_capacity(args.len() + 1);
    for part in std::iter::once(binary_path).chain(args.iter().map(String::as_str)) {
        let quoted = shlex::try_quote(part)
            .map_err(|_| SpawnError::Command(format!("Cannot quote argument: {:?}", part)))?;
        command_parts.push(quoted.into_owned());
    }
    let full_command = command_parts.join(" ");

    let mut cmd = Command::new(shell_program);
    cmd.args(shell_args).arg(&full_command);
    prepare_path_env(&mut cmd, binary_path);

    Ok(cmd)
}

/// No login shell concept off Unix; the binary runs directly.
#[cfg(not(unix))]
fn build_login_shell_command(
    binary_path: &str,
    args: &[String],
    _prefix: &str,
) -> Result<Command, SpawnError> {
    let mut cmd = Command::new(binary_path);
    cmd.args(args);
    prepare_path_env(&mut cmd, binary_path);
    Ok(cmd)
}

/// Resolve the shell prefix.
///
/// A non-empty custom prefix is used as-is. Otherwise `$SHELL -l -c`, with
/// non-POSIX shells (fish, nushell, ...) replaced by bash or sh.
#[cfg(unix)]
fn get_shell_prefix(custom_prefix: &str) -> String {
    if !custom_prefix.trim().is_empty() {
        return custom_prefix.to_string();
    }

    let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string());
    let shell_name = Path::new(&shell)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    let non_posix = ["fish", "nu", "nushell", "elvish", "xonsh", "ion"];

    let effective_shell = if non_posix.contains(&shell_name) {
        if Path::new("/bin/bash").exists() {
            "/bin/bash"
        } else {
            "/bin/sh"
        }
    } else {
        &shell
    };

    format!("{} -l -c", effective_shell)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn args_of(cmd: &Command) -> Vec<String> {
        cmd.as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn agent_exit_serializes() {
        let exit = AgentExit {
            code: -1,
            signal: Some(9),
        };
        let json = serde_json::to_string(&exit).unwrap();
        assert_eq!(json, r#"{"code":-1,"signal":9}"#);
    }

    #[test]
    fn direct_command_keeps_arguments_verbatim() {
        let args = vec!["exec".to_string(), "it's a $PROMPT".to_string()];
        let cmd = build_command("codex", &args, Some(Path::new("/tmp")), None).unwrap();

        assert_eq!(cmd.as_std().get_program(), "codex");
        assert_eq!(args_of(&cmd), args);
        assert_eq!(cmd.as_std().get_current_dir(), Some(Path::new("/tmp")));
    }

    #[test]
    #[cfg(unix)]
    fn custom_prefix_is_used_as_is() {
        assert_eq!(get_shell_prefix("/bin/zsh -l -c"), "/bin/zsh -l -c");
        assert_eq!(get_shell_prefix("/usr/bin/bash -c"), "/usr/bin/bash -c");
    }

    #[test]
    #[cfg(unix)]
    fn empty_prefix_uses_login_shell() {
        assert!(get_shell_prefix("").ends_with(" -l -c"));
        assert!(get_shell_prefix("  ").ends_with(" -l -c"));
    }

    #[test]
    #[cfg(unix)]
    fn login_shell_quotes_into_one_argument() {
        let cmd = build_command(
            "/path/with spaces/claude",
            &["-p".to_string(), "fix it's bug".to_string()],
            None,
            Some("/bin/bash -c"),
        )
        .unwrap();

        assert_eq!(cmd.as_std().get_program(), "/bin/bash");
        let args = args_of(&cmd);
        assert_eq!(args.len(), 2);
        assert_eq!(args[0], "-c");
        assert_eq!(
            shlex::split(&args[1]).unwrap(),
            vec!["/path/with spaces/claude", "-p", "fix it's bug"]
        );
    }

    #[test]
    #[cfg(unix)]
    fn login_shell_prepends_binary_dir_to_path() {
        let cmd = build_command("/opt/agents/bin/codex", &[], None, Some("/bin/sh -c")).unwrap();
        let path = cmd
            .as_std()
            .get_envs()
            .find(|(k, _)| *k == "PATH")
            .and_then(|(_, v)| v)
            .map(|v| v.to_string_lossy().into_owned())
            .unwrap();
        assert!(path.starts_with("/opt/agents/bin"));
    }

    #[test]
    #[cfg(unix)]
    fn nul_byte_cannot_be_quoted() {
        let err = build_command("codex", &["a\0b".to_string()], None, Some("/bin/sh -c"))
            .unwrap_err();
        assert!(matches!(err, SpawnError::Command(_)));
    }
}
