//! End-to-end spawns against `tests/fixtures/mock-agent.sh`.
//!
//! The fixture is registered with `sh` as the binary and the script path as
//! the prompt flag, so every spawn runs `sh mock-agent.sh <prompt> ...` and the
//! prompt selects the scenario.

#![cfg(unix)]

use std::time::Duration;

use agent_spawn_core::{
    AdapterFamily, AgentEvent, AgentRegistry, AgentSpawnConfig, Orchestrator, SpawnError,
    SpawnOptions, ToolKind, Usage,
};
use futures::StreamExt;

const MOCK_AGENT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/mock-agent.sh");

fn orchestrator() -> Orchestrator {
    let mut registry = AgentRegistry::new();
    registry.register(
        "codex",
        AgentSpawnConfig::new("sh", MOCK_AGENT, AdapterFamily::Codex),
    );
    registry.register(
        "codex-stdin",
        AgentSpawnConfig::new("sh", MOCK_AGENT, AdapterFamily::Codex).stdin_mode(true, ["--stdin"]),
    );
    registry.register(
        "missing",
        AgentSpawnConfig::new("/nonexistent/bin/agent", "-p", AdapterFamily::Claude),
    );
    Orchestrator::new(registry)
}

fn names(events: &[Result<AgentEvent, SpawnError>]) -> Vec<&'static str> {
    events
        .iter()
        .map(|e| e.as_ref().map(AgentEvent::name).unwrap_or("read_error"))
        .collect()
}

#[tokio::test]
async fn codex_scenario_streams_canonical_events() {
    let spawn = orchestrator()
        .spawn_streaming("codex", SpawnOptions::new("codex"))
        .unwrap();
    let (events, result) = spawn.collect().await;

    assert_eq!(
        names(&events),
        vec![
            "session_start",
            "tool_start",
            "tool_complete",
            "tool_start",
            "tool_complete",
            "tool_start",
            "reasoning",
            "agent_message",
            "usage",
        ]
    );

    let kinds: Vec<ToolKind> = events
        .iter()
        .filter_map(|e| match e {
            Ok(AgentEvent::ToolStart { kind, .. } | AgentEvent::ToolComplete { kind, .. }) => {
                Some(*kind)
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            ToolKind::Exec,
            ToolKind::Exec,
            ToolKind::Edit,
            ToolKind::Edit,
            ToolKind::Think,
        ]
    );

    let result = result.unwrap();
    assert_eq!(result.exit_code, 0);
    assert_eq!(result.signal, None);
    assert_eq!(result.stderr, "");
    assert_eq!(
        result.thread_id.as_deref(),
        Some("0199a213-81c0-7800-8aa1-bbab2a035a53")
    );
    assert_eq!(
        result.usage,
        Some(Usage {
            input_tokens: 1200,
            output_tokens: 64,
            cached_tokens: Some(800),
            cost_usd: None,
        })
    );
}

#[tokio::test]
async fn failing_agent_reports_exit_code_and_stderr() {
    let spawn = orchestrator()
        .spawn_streaming("codex", SpawnOptions::new("fail"))
        .unwrap();
    let (events, result) = spawn.collect().await;

    assert!(events.is_empty());
    let result = result.unwrap();
    assert_eq!(result.exit_code, 2);
    assert_eq!(result.stderr, "mock agent failed\n");
    assert_eq!(result.thread_id, None);
    assert_eq!(result.usage, None);
}

#[tokio::test]
async fn stdin_mode_pipes_the_prompt() {
    let spawn = orchestrator()
        .spawn_streaming(
            "codex-stdin",
            SpawnOptions::new("hello from stdin").use_stdin(true),
        )
        .unwrap();
    let (events, result) = spawn.collect().await;

    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        Ok(AgentEvent::AgentMessage { text }) if text == "hello from stdin"
    ));
    assert_eq!(result.unwrap().exit_code, 0);
}

#[tokio::test]
async fn malformed_line_does_not_end_the_stream() {
    let spawn = orchestrator()
        .spawn_streaming("codex", SpawnOptions::new("malformed"))
        .unwrap();
    let (events, result) = spawn.collect().await;

    assert_eq!(events.len(), 2);
    assert!(matches!(
        &events[0],
        Ok(AgentEvent::Error { message, .. })
            if message == "[adapter] Malformed JSON line: {invalid json"
    ));
    assert!(matches!(
        &events[1],
        Ok(AgentEvent::AgentMessage { text }) if text == "still here"
    ));
    assert_eq!(result.unwrap().exit_code, 0);
}

#[test]
fn unknown_agent_fails_before_spawning() {
    let err = orchestrator()
        .spawn_streaming("cursor", SpawnOptions::new("hi"))
        .unwrap_err();
    assert!(matches!(err, SpawnError::UnknownAgent { ref agent_id } if agent_id == "cursor"));
    assert_eq!(err.to_string(), "Unknown agent: cursor");
}

#[tokio::test]
async fn missing_binary_rejects_done() {
    let spawn = orchestrator()
        .spawn_streaming("missing", SpawnOptions::new("hi"))
        .unwrap();
    let (events, result) = spawn.collect().await;

    assert!(events.is_empty());
    assert!(matches!(
        result,
        Err(SpawnError::Spawn { ref binary, .. }) if binary == "/nonexistent/bin/agent"
    ));
}

#[tokio::test]
async fn kill_resolves_done_with_signal() {
    let spawn = orchestrator()
        .spawn_streaming("codex", SpawnOptions::new("sleep"))
        .unwrap();
    let (mut events, done, kill) = spawn.into_parts();

    let first = events.next().await.unwrap().unwrap();
    assert_eq!(
        first,
        AgentEvent::SessionStart {
            thread_id: "sleepy".to_string()
        }
    );

    kill.kill();
    assert!(events.next().await.is_none());

    let result = tokio::time::timeout(Duration::from_secs(10), done)
        .await
        .expect("done should resolve after kill")
        .unwrap();
    assert_eq!(result.exit_code, -1);
    assert_eq!(result.signal, Some(9));
    assert_eq!(result.thread_id.as_deref(), Some("sleepy"));
}

#[tokio::test]
async fn done_resolves_without_draining_events() {
    let spawn = orchestrator()
        .spawn_streaming("codex", SpawnOptions::new("fail"))
        .unwrap();
    let (_events, done, _kill) = spawn.into_parts();

    let result = done.await.unwrap();
    assert_eq!(result.exit_code, 2);
}

#[tokio::test]
async fn login_shell_prefix_runs_the_same_scenario() {
    let spawn = orchestrator()
        .spawn_streaming(
            "codex",
            SpawnOptions::new("codex").shell_prefix("/bin/sh -c"),
        )
        .unwrap();
    let (events, result) = spawn.collect().await;

    assert_eq!(events.len(), 9);
    assert_eq!(result.unwrap().exit_code, 0);
}

#[tokio::test]
async fn transcript_is_written_when_log_dir_is_set() {
    let dir = tempfile::tempdir().unwrap();
    let spawn = orchestrator()
        .spawn_streaming(
            "codex",
            SpawnOptions::new("fail")
                .log_dir(dir.path())
                .log_id("run-1"),
        )
        .unwrap();
    let (_, result) = spawn.collect().await;
    assert_eq!(result.unwrap().exit_code, 2);

    let transcript = std::fs::read_to_string(dir.path().join("run-1.log")).unwrap();
    assert!(transcript.contains("STDERR: mock agent failed"));
    assert!(transcript.contains("EXIT: code=2"));
}

#[tokio::test]
async fn concurrent_spawns_do_not_interfere() {
    let orchestrator = orchestrator();
    let a = orchestrator
        .spawn_streaming("codex", SpawnOptions::new("codex"))
        .unwrap();
    let b = orchestrator
        .spawn_streaming("codex", SpawnOptions::new("codex"))
        .unwrap();

    let ((events_a, result_a), (events_b, result_b)) = tokio::join!(a.collect(), b.collect());

    assert_eq!(names(&events_a), names(&events_b));
    assert_eq!(result_a.unwrap().thread_id, result_b.unwrap().thread_id);
}
