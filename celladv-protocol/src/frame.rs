//! Frame structure and encoding/decoding
//!
//! Wire layout of one frame:
//!
//! ```text
//! 0x7F | 'C' | command | total | index | payload... | checksum | 0x7E
//! ```
//!
//! Everything between the delimiters is byte-stuffed: `0x7E`, `0x7D` and
//! `0x7F` are each replaced by `0x7D` followed by the value XOR `0x20`,
//! so the delimiters never appear inside an escaped body. The checksum is
//! the low 8 bits of the sum of the unescaped bytes from the tag through
//! the payload. `total`/`index` carry the fragment count and the current
//! fragment index of a multi-frame reply.

use crate::checksum::checksum_of;
use celladv_core::{CellError, CellResult};

/// Frame start delimiter
pub const FRAME_START: u8 = 0x7F;

/// Frame end delimiter
pub const FRAME_END: u8 = 0x7E;

/// Escape byte
pub const ESCAPE: u8 = 0x7D;

/// XOR mask applied to escaped bytes
pub const ESCAPE_MASK: u8 = 0x20;

/// Frame tag, first unescaped byte of every frame body
pub const FRAME_TAG: u8 = b'C';

fn needs_escape(byte: u8) -> bool {
    matches!(byte, FRAME_END | ESCAPE | FRAME_START)
}

/// Escape a frame body for transmission.
///
/// Every occurrence of `0x7E`, `0x7D` or `0x7F` is replaced by `0x7D`
/// followed by the value XOR `0x20`.
pub fn escape(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());
    for &byte in data {
        if needs_escape(byte) {
            result.push(ESCAPE);
            result.push(byte ^ ESCAPE_MASK);
        } else {
            result.push(byte);
        }
    }
    result
}

/// Reverse [`escape`]: collapse every `0x7D`-prefixed pair back to the
/// original byte. A trailing lone escape byte is dropped.
pub fn unescape(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());
    let mut escaped = false;
    for &byte in data {
        if escaped {
            escaped = false;
            result.push(byte ^ ESCAPE_MASK);
        } else if byte == ESCAPE {
            escaped = true;
        } else {
            result.push(byte);
        }
    }
    result
}

/// Check whether a fragment with the given count/index pair is the last
/// fragment of its message.
///
/// The device marks the final fragment by the relation
/// `total <= index + 1`; single-frame replies carry `total = index = 1`.
pub fn is_final_fragment(total: u8, index: u8) -> bool {
    u16::from(total) <= u16::from(index) + 1
}

/// Encode one fragment with an explicit fragment count and index.
///
/// Builds `tag|command|total|index|payload`, appends the checksum of that
/// buffer, escapes the whole body and wraps it in the frame delimiters.
/// The output never contains an unescaped delimiter byte inside the body.
pub fn encode_fragment(command: u8, total: u8, index: u8, payload: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(5 + payload.len());
    body.push(FRAME_TAG);
    body.push(command);
    body.push(total);
    body.push(index);
    body.extend_from_slice(payload);
    body.push(checksum_of(&body));

    let escaped = escape(&body);
    let mut frame = Vec::with_capacity(escaped.len() + 2);
    frame.push(FRAME_START);
    frame.extend_from_slice(&escaped);
    frame.push(FRAME_END);
    frame
}

/// Encode a single-frame command for transmission to the instrument.
///
/// Commands always go out as one fragment, `total = index = 0x01`.
pub fn encode_command(command: u8, payload: &[u8]) -> Vec<u8> {
    encode_fragment(command, 0x01, 0x01, payload)
}

/// One decoded wire frame
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    pub command: u8,
    /// Fragment count of the logical message this frame belongs to
    pub total: u8,
    /// Index of this fragment
    pub index: u8,
    pub payload: Vec<u8>,
    /// Checksum byte carried by the frame
    pub checksum: u8,
    /// Checksum recomputed over tag..payload
    pub expected_checksum: u8,
}

impl DecodedFrame {
    /// Decode one delimiter-bounded raw frame.
    ///
    /// Strips the delimiters, unescapes the body, splits off the trailing
    /// checksum byte and recomputes the expected value. A checksum
    /// mismatch is NOT an error here: the caller decides whether to log
    /// and consume the payload anyway (see [`checksum_ok`](Self::checksum_ok)).
    ///
    /// # Errors
    /// Returns `CellError::FrameInvalid` if the delimiters are missing or
    /// the unescaped body is shorter than the fixed header plus checksum.
    pub fn parse(raw: &[u8]) -> CellResult<Self> {
        if raw.len() < 2 || raw[0] != FRAME_START || raw[raw.len() - 1] != FRAME_END {
            return Err(CellError::FrameInvalid(
                "missing frame delimiters".to_string(),
            ));
        }

        let body = unescape(&raw[1..raw.len() - 1]);
        // tag + command + total + index + checksum
        if body.len() < 5 {
            return Err(CellError::FrameInvalid(format!(
                "frame body too short: {} bytes",
                body.len()
            )));
        }

        let checksum = body[body.len() - 1];
        let content = &body[..body.len() - 1];
        let expected_checksum = checksum_of(content);

        Ok(Self {
            command: content[1],
            total: content[2],
            index: content[3],
            payload: content[4..].to_vec(),
            checksum,
            expected_checksum,
        })
    }

    /// Whether the carried checksum matches the recomputed one
    pub fn checksum_ok(&self) -> bool {
        self.checksum == self.expected_checksum
    }

    /// Whether this frame is the last fragment of its message
    pub fn is_final(&self) -> bool {
        is_final_fragment(self.total, self.index)
    }
}
