//! Per-spawn transcript files.
//!
//! A transcript records what went over the child's pipes, one timestamped
//! line per record:
//!
//! ```text
//! [2026-02-04T10:15:30.123Z] STDOUT: {"type":"thread.started",...}
//! ```
//!
//! Transcripts are best-effort. A directory that cannot be created or a write
//! that fails is logged and otherwise ignored.

use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::Path,
    sync::{Arc, Mutex},
};

use chrono::{SecondsFormat, Utc};

/// Thread-safe handle to an append-only transcript. `None` means disabled.
pub type LogHandle = Arc<Mutex<Option<File>>>;

/// Which stream a transcript record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Stdin,
    Stdout,
    Stderr,
    Exit,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Stdin => "STDIN",
            Direction::Stdout => "STDOUT",
            Direction::Stderr => "STDERR",
            Direction::Exit => "EXIT",
        }
    }
}

/// Current UTC time as ISO 8601 with milliseconds.
fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Append a timestamped record to the transcript (if enabled).
pub fn log_line(handle: &LogHandle, direction: Direction, data: &str) {
    let mut guard = handle.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(ref mut file) = *guard {
        let result = writeln!(file, "[{}] {}: {}", utc_timestamp(), direction.as_str(), data)
            .and_then(|()| file.flush());
        if let Err(err) = result {
            log::warn!("Failed to write transcript line: {}", err);
        }
    }
}

/// Open (or create) `{log_dir}/{log_id}.log` for appending.
///
/// Returns a disabled handle when `log_dir` is `None` or the file cannot be
/// opened.
pub fn open_log_file(log_dir: Option<&Path>, log_id: &str) -> LogHandle {
    let file = log_dir.and_then(|dir| {
        let path = dir.join(format!("{}.log", log_id));
        let opened = std::fs::create_dir_all(dir)
            .and_then(|()| OpenOptions::new().create(true).append(true).open(&path));
        match opened {
            Ok(file) => Some(file),
            Err(err) => {
                log::warn!("Failed to open transcript {}: {}", path.display(), err);
                None
            }
        }
    });
    Arc::new(Mutex::new(file))
}

/// Whether a handle will actually record anything.
#[cfg(test)]
pub fn is_enabled(handle: &LogHandle) -> bool {
    handle
        .lock()
        .map(|guard| guard.is_some())
        .unwrap_or_else(|poisoned| poisoned.into_inner().is_some())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn utc_timestamp_format() {
        let ts = utc_timestamp();
        // YYYY-MM-DDTHH:MM:SS.mmmZ
        assert!(ts.ends_with('Z'));
        assert_eq!(ts.len(), 24);
        assert_eq!(&ts[10..11], "T");
        assert_eq!(&ts[19..20], ".");
    }

    #[test]
    fn open_log_file_creates_nested_dir() {
        let dir = tempdir().unwrap();
        let log_dir = dir.path().join("logs").join("spawns");

        let handle = open_log_file(Some(&log_dir), "codex-1");
        assert!(is_enabled(&handle));
        assert!(log_dir.join("codex-1.log").exists());
    }

    #[test]
    fn open_log_file_none_dir() {
        let handle = open_log_file(None, "test");
        assert!(!is_enabled(&handle));
    }

    #[test]
    fn log_line_appends_records() {
        let dir = tempdir().unwrap();
        let handle = open_log_file(Some(dir.path()), "test");
        log_line(&handle, Direction::Stdin, "hello world");
        log_line(&handle, Direction::Exit, "code=0");

        let contents = std::fs::read_to_string(dir.path().join("test.log")).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("STDIN: hello world"));
        assert!(lines[1].ends_with("EXIT: code=0"));
    }

    #[test]
    fn log_line_handles_disabled_handle() {
        let handle: LogHandle = Arc::new(Mutex::new(None));
        // Should not panic
        log_line(&handle, Direction::Stdout, "test");
    }
}
