//! Wire frame codec for the CellAdvisor remote-control protocol
//!
//! The instrument speaks a private byte-stuffed framing protocol over TCP:
//! every command and reply travels in delimiter-bounded, escaped,
//! checksummed frames, and a logical reply may span several frames. This
//! crate provides the codec (escaping, checksum, frame encode/decode) and
//! the multi-frame message reassembly on top of a transport stream.

pub mod checksum;
pub mod frame;
pub mod opcode;
pub mod reader;
pub mod statistics;

pub use checksum::{checksum_of, Checksum};
pub use frame::{
    encode_command, encode_fragment, escape, is_final_fragment, unescape, DecodedFrame,
    ESCAPE, ESCAPE_MASK, FRAME_END, FRAME_START, FRAME_TAG,
};
pub use reader::MessageReader;
pub use statistics::LinkStatistics;
