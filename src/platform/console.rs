//! Console platform: NDJSON over stdin/stdout.
//!
//! Stands in for a real chat adapter. Each input line is one
//! [`Invocation`]; every mute or message the game produces is written as one
//! [`ConsoleRecord`] line on the output.
//!
//! # Edge Cases Handled
//!
//! - Last line without `\n`: returned, the next read reports EOF.
//! - Empty lines: skipped.
//! - Malformed JSON, invalid UTF-8 or oversized lines: logged and skipped.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::Mutex;

use super::{ChatPlatform, Invocation, Result, RoomId, UserId};
use crate::observability::metrics::{self, RejectReason};

/// Default maximum input line size in bytes (64 KB).
pub const DEFAULT_MAX_LINE_SIZE: usize = 64 * 1024;

/// One line of console output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConsoleRecord {
    /// A chat message.
    Send {
        /// Destination room
        room: RoomId,
        /// Message text
        text: String,
    },
    /// A mute action.
    Mute {
        /// Room the mute applies to
        room: RoomId,
        /// Muted user
        user: UserId,
        /// Mute length in milliseconds
        duration_ms: u64,
    },
}

// ============================================================================
// Output
// ============================================================================

/// [`ChatPlatform`] that writes NDJSON records.
///
/// The async mutex is required because the lock is held across the write
/// and flush `.await` points.
pub struct ConsolePlatform<W> {
    writer: Mutex<W>,
}

impl ConsolePlatform<BufWriter<tokio::io::Stdout>> {
    /// Creates a platform writing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(BufWriter::new(tokio::io::stdout()))
    }
}

impl<W> ConsolePlatform<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Creates a platform writing to `writer`.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the platform and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    async fn write_record(&self, record: &ConsoleRecord) -> Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await?;
        writer.flush().await?;
        Ok(())
    }
}

impl<W> std::fmt::Debug for ConsolePlatform<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsolePlatform").finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl<W> ChatPlatform for ConsolePlatform<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn mute(&self, room: &RoomId, user: &UserId, duration: Duration) -> Result<()> {
        let duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self.write_record(&ConsoleRecord::Mute {
            room: room.clone(),
            user: user.clone(),
            duration_ms,
        })
        .await
    }

    async fn send(&self, room: &RoomId, text: &str) -> Result<()> {
        self.write_record(&ConsoleRecord::Send {
            room: room.clone(),
            text: text.to_string(),
        })
        .await
    }

    fn mention(&self, user: &UserId) -> String {
        format!("<at id=\"{user}\"/>")
    }
}

// ============================================================================
// Input
// ============================================================================

/// Reads [`Invocation`]s line by line.
///
/// At most `max_line_size + 1` bytes of a line are ever buffered; the rest
/// of an oversized line is drained from the reader and discarded.
pub struct ConsoleInput<R> {
    reader: R,
    max_line_size: usize,
    buf: Vec<u8>,
}

impl ConsoleInput<BufReader<tokio::io::Stdin>> {
    /// Creates an input reading stdin.
    #[must_use]
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> ConsoleInput<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    /// Creates an input over `reader` with the default line limit.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self::with_max_line_size(reader, DEFAULT_MAX_LINE_SIZE)
    }

    /// Creates an input with an explicit line limit.
    #[must_use]
    pub fn with_max_line_size(reader: R, max_line_size: usize) -> Self {
        let read_limit = max_line_size.saturating_add(1);
        Self {
            reader,
            max_line_size,
            buf: Vec::with_capacity(read_limit.min(DEFAULT_MAX_LINE_SIZE)),
        }
    }

    /// Returns the next well-formed invocation.
    ///
    /// Returns `Ok(None)` on EOF (clean shutdown).
    ///
    /// # Errors
    ///
    /// Returns an error if reading from the underlying stream fails.
    pub async fn next_invocation(&mut self) -> Result<Option<Invocation>> {
        loop {
            let Some(overflowed) = self.read_bounded_line().await? else {
                return Ok(None);
            };

            if overflowed || self.buf.len() > self.max_line_size {
                tracing::warn!(
                    limit = self.max_line_size,
                    "input line too large (read capped), skipping"
                );
                metrics::record_rejected(RejectReason::Malformed);
                continue;
            }

            let line = match std::str::from_utf8(&self.buf) {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!(error = %e, "invalid UTF-8 in input line, skipping");
                    metrics::record_rejected(RejectReason::Malformed);
                    continue;
                }
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<Invocation>(trimmed) {
                Ok(invocation) => return Ok(Some(invocation)),
                Err(e) => {
                    tracing::warn!(error = %e, "malformed input line, skipping");
                    metrics::record_rejected(RejectReason::Malformed);
                }
            }
        }
    }

    /// Reads one line into `buf`, copying at most `max_line_size + 1` bytes.
    ///
    /// Returns `None` on EOF with nothing read, otherwise whether the line
    /// exceeded the limit.
    async fn read_bounded_line(&mut self) -> Result<Option<bool>> {
        let read_limit = self.max_line_size.saturating_add(1);
        self.buf.clear();
        let mut overflowed = false;
        let mut consumed_any = false;

        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                // EOF; a final line without '\n' is still returned
                return Ok(consumed_any.then_some(overflowed));
            }
            consumed_any = true;

            let newline = available.iter().position(|&b| b == b'\n');
            let chunk_len = newline.unwrap_or(available.len());

            if !overflowed {
                let remaining = read_limit.saturating_sub(self.buf.len());
                self.buf
                    .extend_from_slice(&available[..chunk_len.min(remaining)]);
                overflowed = chunk_len > remaining;
            }

            match newline {
                Some(pos) => {
                    self.reader.consume(pos + 1);
                    return Ok(Some(overflowed));
                }
                None => self.reader.consume(chunk_len),
            }
        }
    }
}

impl<R> std::fmt::Debug for ConsoleInput<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleInput")
            .field("max_line_size", &self.max_line_size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(bytes: &[u8]) -> Vec<ConsoleRecord> {
        std::str::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn writes_send_and_mute_records() {
        let platform = ConsolePlatform::new(Vec::new());
        let room = RoomId::from("g1");
        let user = UserId::from("u1");

        platform.send(&room, "hello").await.unwrap();
        platform
            .mute(&room, &user, Duration::from_secs(120))
            .await
            .unwrap();

        let out = records(&platform.into_inner());
        assert_eq!(
            out,
            vec![
                ConsoleRecord::Send {
                    room: room.clone(),
                    text: "hello".to_string()
                },
                ConsoleRecord::Mute {
                    room,
                    user,
                    duration_ms: 120_000
                },
            ]
        );
    }

    #[test]
    fn record_wire_format() {
        let json = serde_json::to_string(&ConsoleRecord::Mute {
            room: RoomId::from("g1"),
            user: UserId::from("u1"),
            duration_ms: 30_000,
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"type":"mute","room":"g1","user":"u1","duration_ms":30000}"#
        );
    }

    #[tokio::test]
    async fn queued_send_without_delay_is_immediate() {
        let platform = ConsolePlatform::new(Vec::new());
        platform
            .send_queued(&RoomId::from("g1"), "later", Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(records(&platform.into_inner()).len(), 1);
    }

    #[test]
    fn mention_token() {
        let platform = ConsolePlatform::new(Vec::new());
        assert_eq!(platform.mention(&UserId::from("42")), r#"<at id="42"/>"#);
    }

    #[tokio::test]
    async fn input_skips_blank_and_malformed_lines() {
        let data: &[u8] = b"\n   \nnot json\n{\"room\":\"g1\",\"user\":\"u1\",\"content\":\"x\"}\n";
        let mut input = ConsoleInput::new(data);
        let inv = input.next_invocation().await.unwrap().unwrap();
        assert_eq!(inv, Invocation::in_room("g1", "u1", "x"));
        assert!(input.next_invocation().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn input_skips_invalid_utf8() {
        let data: &[u8] = b"\xff\xfe garbage\n{\"room\":\"g1\",\"user\":\"u1\",\"content\":\"x\"}\n";
        let mut input = ConsoleInput::new(data);
        let inv = input.next_invocation().await.unwrap().unwrap();
        assert_eq!(inv, Invocation::in_room("g1", "u1", "x"));
        assert!(input.next_invocation().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn oversized_line_is_never_buffered_whole() {
        let mut data = vec![b'a'; 8 * 1024 * 1024];
        data.extend_from_slice(b"\n{\"user\":\"u\",\"content\":\"\"}\n");
        // A small internal buffer forces many fill_buf rounds
        let reader = BufReader::with_capacity(4096, data.as_slice());
        let mut input = ConsoleInput::with_max_line_size(reader, 32);

        let inv = input.next_invocation().await.unwrap().unwrap();
        assert_eq!(inv.user, UserId::from("u"));
        assert!(
            input.buf.capacity() < 1024,
            "line buffer grew to {}",
            input.buf.capacity()
        );
    }

    #[tokio::test]
    async fn oversized_final_line_without_newline_is_skipped() {
        let data = vec![b'x'; 10_000];
        let mut input = ConsoleInput::with_max_line_size(data.as_slice(), 64);
        assert!(input.next_invocation().await.unwrap().is_none());
        assert!(input.buf.len() <= 65);
    }

    #[tokio::test]
    async fn input_without_trailing_newline() {
        let data: &[u8] = b"{\"user\":\"u1\",\"content\":\"x\"}";
        let mut input = ConsoleInput::new(data);
        assert!(input.next_invocation().await.unwrap().is_some());
        assert!(input.next_invocation().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn input_skips_oversized_lines() {
        let data: &[u8] = b"{\"user\":\"u1\",\"content\":\"a long line\"}\n{\"user\":\"u\",\"content\":\"\"}\n";
        let mut input = ConsoleInput::with_max_line_size(data, 30);
        let inv = input.next_invocation().await.unwrap().unwrap();
        assert_eq!(inv.user, UserId::from("u"));
    }
}
