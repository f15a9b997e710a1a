//! Agent families and their protocol adapters.
//!
//! Every supported agent CLI speaks its own JSON-lines dialect. Each family
//! module provides:
//!
//! - `parser.rs`: a [`ProtocolAdapter`] translating the dialect into
//!   [`AgentEvent`]s
//! - `spawn.rs`: the static [`AgentSpawnConfig`] used to launch it
//! - `types.rs`: serde shapes of the dialect's messages
//!
//! Adapters are selected through [`AdapterFamily`], never by branching on the
//! agent in shared code.
//!
//! [`AgentSpawnConfig`]: crate::registry::AgentSpawnConfig

pub mod claude;
pub mod codex;
pub mod event;
pub mod gemini;
pub mod opencode;
pub mod shared;

use std::collections::VecDeque;
use std::io;

use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::error::SpawnError;
use event::AgentEvent;

/// Translates one agent's output lines into canonical events.
///
/// An adapter instance carries the state of exactly one spawn (notably its
/// open tool calls) and must not be reused for another.
pub trait ProtocolAdapter: Send {
    fn family(&self) -> AdapterFamily;

    /// Translate one raw stdout line. Never fails: malformed input becomes an
    /// [`AgentEvent::Error`] and the adapter stays usable.
    fn adapt_line(&mut self, line: &str) -> Vec<AgentEvent>;

    /// Translate a finite batch of lines, in order.
    fn adapt_all<'a, I>(&mut self, lines: I) -> Vec<AgentEvent>
    where
        I: IntoIterator<Item = &'a str>,
        Self: Sized,
    {
        lines
            .into_iter()
            .flat_map(|line| self.adapt_line(line))
            .collect()
    }
}

/// Tag naming which dialect an agent speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterFamily {
    Claude,
    Codex,
    OpenCode,
    Gemini,
}

impl AdapterFamily {
    /// Create a fresh adapter for one spawn.
    pub fn adapter(self) -> Box<dyn ProtocolAdapter> {
        match self {
            AdapterFamily::Claude => Box::new(claude::ClaudeParser::new()),
            AdapterFamily::Codex => Box::new(codex::CodexParser::new()),
            AdapterFamily::OpenCode => Box::new(opencode::OpenCodeParser::new()),
            AdapterFamily::Gemini => Box::new(gemini::GeminiParser::new()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AdapterFamily::Claude => "claude",
            AdapterFamily::Codex => "codex",
            AdapterFamily::OpenCode => "opencode",
            AdapterFamily::Gemini => "gemini",
        }
    }
}

/// Chain an adapter onto a line stream.
///
/// Events come out in the order their lines went in. Lines are pulled one at
/// a time, only once every event from the previous line has been taken. A
/// read error is yielded once as [`SpawnError::Read`] and ends the stream.
pub fn adapt<S>(
    lines: S,
    adapter: Box<dyn ProtocolAdapter>,
) -> impl Stream<Item = Result<AgentEvent, SpawnError>> + Send
where
    S: Stream<Item = io::Result<String>> + Send + Unpin,
{
    struct State<S> {
        lines: S,
        adapter: Box<dyn ProtocolAdapter>,
        pending: VecDeque<AgentEvent>,
        finished: bool,
    }

    let state = State {
        lines,
        adapter,
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                return Some((Ok(event), state));
            }
            if state.finished {
                return None;
            }
            match state.lines.next().await {
                Some(Ok(line)) => state.pending.extend(state.adapter.adapt_line(&line)),
                Some(Err(err)) => {
                    state.finished = true;
                    return Some((Err(SpawnError::Read(err)), state));
                }
                None => state.finished = true,
            }
        }
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    fn lines(items: &[&str]) -> impl Stream<Item = io::Result<String>> + Send + Unpin {
        stream::iter(
            items
                .iter()
                .map(|s| Ok(s.to_string()))
                .collect::<Vec<io::Result<String>>>(),
        )
    }

    #[test]
    fn every_family_builds_a_matching_adapter() {
        for family in [
            AdapterFamily::Claude,
            AdapterFamily::Codex,
            AdapterFamily::OpenCode,
            AdapterFamily::Gemini,
        ] {
            assert_eq!(family.adapter().family(), family);
        }
    }

    #[test]
    fn family_tag_serializes_lowercase() {
        let json = serde_json::to_string(&AdapterFamily::OpenCode).unwrap();
        assert_eq!(json, "\"opencode\"");
    }

    #[test]
    fn malformed_line_does_not_abort_the_stream() {
        let input = lines(&[
            "{invalid json",
            r#"{"type":"text","part":{"type":"text","text":"hi"}}"#,
        ]);
        let events: Vec<_> =
            block_on(adapt(input, AdapterFamily::OpenCode.adapter()).collect::<Vec<_>>());

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], Ok(AgentEvent::Error { .. })));
        assert!(matches!(&events[1], Ok(AgentEvent::AgentMessage { text }) if text == "hi"));
    }

    #[test]
    fn read_error_ends_the_stream_after_earlier_events() {
        let input = stream::iter(vec![
            Ok(r#"{"type":"text","part":{"type":"text","text":"before"}}"#.to_string()),
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone")),
            Ok(r#"{"type":"text","part":{"type":"text","text":"after"}}"#.to_string()),
        ]);
        let events: Vec<_> =
            block_on(adapt(input, AdapterFamily::OpenCode.adapter()).collect::<Vec<_>>());

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], Ok(AgentEvent::AgentMessage { text }) if text == "before"));
        assert!(matches!(&events[1], Err(SpawnError::Read(_))));
    }
}
