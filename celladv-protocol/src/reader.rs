//! Logical message reassembly over a transport stream

use crate::frame::{DecodedFrame, FRAME_END};
use crate::statistics::LinkStatistics;
use bytes::BytesMut;
use celladv_core::{CellError, CellResult};
use celladv_transport::StreamAccessor;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete logical messages from a transport stream.
///
/// Handles partial reads internally: raw bytes accumulate in a buffer
/// until an end delimiter arrives, each delimiter-terminated frame is
/// decoded, and fragment payloads are concatenated in arrival order until
/// the final fragment. Fragments of one reply arrive in order on the
/// single TCP stream, so no reordering is performed.
#[derive(Debug)]
pub struct MessageReader {
    buf: BytesMut,
}

impl MessageReader {
    /// Create a new message reader
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Discard any buffered bytes.
    ///
    /// Must be called when the underlying connection is replaced, so a
    /// half-received frame from the old session cannot corrupt the first
    /// reply of the new one.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Read one delimiter-terminated raw frame, delimiters included.
    async fn read_frame<S: StreamAccessor>(&mut self, stream: &mut S) -> CellResult<Vec<u8>> {
        loop {
            if let Some(pos) = self.buf.iter().position(|&b| b == FRAME_END) {
                let frame = self.buf.split_to(pos + 1);
                return Ok(frame.to_vec());
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(CellError::Disconnected);
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }

    /// Read and reassemble one logical message.
    ///
    /// Loops [read frame, unescape, verify checksum, append payload] until
    /// the final fragment. A checksum mismatch is logged and the payload
    /// is consumed regardless; this mirrors the instrument's documented
    /// behavior and keeps the reply stream in sync.
    ///
    /// # Errors
    /// - `CellError::Disconnected` if the stream ends, also mid-message
    /// - `CellError::FrameInvalid` if a frame cannot be decoded
    /// - any transport error from the underlying read
    pub async fn read_message<S: StreamAccessor>(
        &mut self,
        stream: &mut S,
        statistics: &mut LinkStatistics,
    ) -> CellResult<Vec<u8>> {
        let mut message = Vec::new();
        loop {
            let raw = self.read_frame(stream).await?;
            let frame = DecodedFrame::parse(&raw)?;
            statistics.increment_frames_received();

            if !frame.checksum_ok() {
                statistics.increment_checksum_errors();
                log::warn!(
                    "checksum required to be 0x{:02X}, but 0x{:02X} (command 0x{:02X}, fragment {}/{})",
                    frame.expected_checksum,
                    frame.checksum,
                    frame.command,
                    frame.index,
                    frame.total,
                );
            }

            message.extend_from_slice(&frame.payload);
            if frame.is_final() {
                break;
            }
        }

        statistics.increment_messages_received();
        Ok(message)
    }
}

impl Default for MessageReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{encode_command, encode_fragment};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::time::Duration;

    /// Stream fed from a fixed script of read chunks; EOF when exhausted.
    struct ScriptedStream {
        chunks: VecDeque<Vec<u8>>,
    }

    impl ScriptedStream {
        fn new(chunks: Vec<Vec<u8>>) -> Self {
            Self {
                chunks: chunks.into(),
            }
        }
    }

    #[async_trait]
    impl StreamAccessor for ScriptedStream {
        async fn set_timeout(&mut self, _timeout: Option<Duration>) -> CellResult<()> {
            Ok(())
        }

        async fn read(&mut self, buf: &mut [u8]) -> CellResult<usize> {
            let Some(mut chunk) = self.chunks.pop_front() else {
                return Ok(0);
            };
            let n = chunk.len().min(buf.len());
            buf[..n].copy_from_slice(&chunk[..n]);
            if n < chunk.len() {
                self.chunks.push_front(chunk.split_off(n));
            }
            Ok(n)
        }

        async fn write(&mut self, buf: &[u8]) -> CellResult<usize> {
            Ok(buf.len())
        }

        async fn flush(&mut self) -> CellResult<()> {
            Ok(())
        }

        fn is_closed(&self) -> bool {
            self.chunks.is_empty()
        }

        async fn close(&mut self) -> CellResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_single_frame_message() {
        let mut stream = ScriptedStream::new(vec![encode_command(0x50, b"READY")]);
        let mut reader = MessageReader::new();
        let mut stats = LinkStatistics::new();
        let message = reader.read_message(&mut stream, &mut stats).await.unwrap();
        assert_eq!(message, b"READY");
        assert_eq!(stats.frames_received, 1);
        assert_eq!(stats.messages_received, 1);
        assert_eq!(stats.checksum_errors, 0);
    }

    #[tokio::test]
    async fn test_three_fragment_reassembly() {
        // total=3 with indexes 0,1,2; only 3 <= 2+1 marks the end.
        let mut wire = Vec::new();
        wire.extend_from_slice(&encode_fragment(0x60, 3, 0, b"AAAA"));
        wire.extend_from_slice(&encode_fragment(0x60, 3, 1, b"BBBB"));
        wire.extend_from_slice(&encode_fragment(0x60, 3, 2, b"CCCC"));

        let mut stream = ScriptedStream::new(vec![wire]);
        let mut reader = MessageReader::new();
        let mut stats = LinkStatistics::new();
        let message = reader.read_message(&mut stream, &mut stats).await.unwrap();
        assert_eq!(message, b"AAAABBBBCCCC");
        assert_eq!(stats.frames_received, 3);
        assert_eq!(stats.messages_received, 1);
    }

    #[tokio::test]
    async fn test_frame_split_across_reads() {
        let frame = encode_command(0x60, &[0x7E, 0x7D, 0x10, 0x20]);
        let chunks = frame.iter().map(|&b| vec![b]).collect();
        let mut stream = ScriptedStream::new(chunks);
        let mut reader = MessageReader::new();
        let mut stats = LinkStatistics::new();
        let message = reader.read_message(&mut stream, &mut stats).await.unwrap();
        assert_eq!(message, vec![0x7E, 0x7D, 0x10, 0x20]);
    }

    #[tokio::test]
    async fn test_eof_is_disconnect() {
        let mut stream = ScriptedStream::new(vec![]);
        let mut reader = MessageReader::new();
        let mut stats = LinkStatistics::new();
        let err = reader
            .read_message(&mut stream, &mut stats)
            .await
            .unwrap_err();
        assert!(err.is_disconnect());
    }

    #[tokio::test]
    async fn test_eof_mid_message_is_disconnect() {
        // First fragment promises more, then the stream dies.
        let mut stream = ScriptedStream::new(vec![encode_fragment(0x60, 3, 0, b"AAAA")]);
        let mut reader = MessageReader::new();
        let mut stats = LinkStatistics::new();
        let err = reader
            .read_message(&mut stream, &mut stats)
            .await
            .unwrap_err();
        assert!(err.is_disconnect());
        assert_eq!(stats.frames_received, 1);
        assert_eq!(stats.messages_received, 0);
    }

    #[tokio::test]
    async fn test_checksum_mismatch_consumed_and_counted() {
        let mut raw = encode_command(0x50, b"status");
        let pos = raw.len() - 3;
        raw[pos] ^= 0x01;
        let mut stream = ScriptedStream::new(vec![raw]);
        let mut reader = MessageReader::new();
        let mut stats = LinkStatistics::new();
        let message = reader.read_message(&mut stream, &mut stats).await.unwrap();
        assert_eq!(message.len(), 6);
        assert_eq!(stats.checksum_errors, 1);
        assert_eq!(stats.messages_received, 1);
    }

    #[tokio::test]
    async fn test_reset_discards_partial_frame() {
        // A truncated frame sits in the buffer, then the reader is reset
        // and a fresh session delivers a complete one.
        let mut partial = encode_command(0x50, b"old");
        partial.truncate(partial.len() - 2);

        let mut reader = MessageReader::new();
        let mut stats = LinkStatistics::new();

        let mut dying = ScriptedStream::new(vec![partial]);
        let err = reader.read_message(&mut dying, &mut stats).await.unwrap_err();
        assert!(err.is_disconnect());

        reader.reset();
        let mut fresh = ScriptedStream::new(vec![encode_command(0x50, b"new")]);
        let message = reader.read_message(&mut fresh, &mut stats).await.unwrap();
        assert_eq!(message, b"new");
    }
}
