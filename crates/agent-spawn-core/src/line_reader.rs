//! Splitting a child's byte stream into lines.
//!
//! Reads arrive in arbitrary chunks: a JSON object may be split across two
//! reads, and one read may carry several objects. [`LineBuffer`] keeps the
//! incomplete tail between reads and hands out only complete lines.
//!
//! Lines are split on `\n` alone. A `\r` before it stays in the line; every
//! adapter parses JSON, which treats it as trailing whitespace. Bytes are
//! decoded per complete line, so a multi-byte character split across reads is
//! reassembled before decoding. Invalid UTF-8 is replaced, not rejected.

use std::collections::VecDeque;
use std::io;

use futures::stream::{self, Stream};
use tokio::io::{AsyncRead, AsyncReadExt};

const READ_CHUNK: usize = 8 * 1024;

/// Accumulates raw bytes and yields complete lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    partial: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every line it completed, newline stripped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut rest = chunk;
        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            self.partial.extend_from_slice(&rest[..pos]);
            lines.push(String::from_utf8_lossy(&self.partial).into_owned());
            self.partial.clear();
            rest = &rest[pos + 1..];
        }
        self.partial.extend_from_slice(rest);
        lines
    }

    /// End of stream: the unterminated tail, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.partial.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.partial).into_owned();
        self.partial.clear();
        Some(line)
    }
}

/// Lazy, single-pass line sequence over an async reader.
pub struct LineReader<R> {
    reader: R,
    buffer: LineBuffer,
    ready: VecDeque<String>,
    done: bool,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: LineBuffer::new(),
            ready: VecDeque::new(),
            done: false,
        }
    }

    /// Next complete line, or `None` at end of stream.
    ///
    /// A read error is returned as-is; lines already returned stay valid.
    /// After an error or end of stream every call returns `Ok(None)`.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(line) = self.ready.pop_front() {
                return Ok(Some(line));
            }
            if self.done {
                return Ok(None);
            }
            let n = match self.reader.read(&mut chunk).await {
                Ok(n) => n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.done = true;
                    return Err(err);
                }
            };
            if n == 0 {
                self.done = true;
                return Ok(self.buffer.finish());
            }
            self.ready.extend(self.buffer.push(&chunk[..n]));
        }
    }

    /// Turn the reader into a stream. A read error is the last item.
    pub fn into_stream(self) -> impl Stream<Item = io::Result<String>> + Send
    where
        R: Send,
    {
        stream::unfold(Some(self), |reader| async move {
            let mut reader = reader?;
            match reader.next_line().await {
                Ok(Some(line)) => Some((Ok(line), Some(reader))),
                Ok(None) => None,
                Err(err) => Some((Err(err), None)),
            }
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
