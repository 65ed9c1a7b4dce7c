//! Device command bytes
//!
//! Each remote-control operation is a single command byte, optionally
//! paired with an ASCII payload.

/// Status / liveness probe
pub const STATUS: u8 = 0x50;

/// Screen capture request (reply is a JPEG image)
pub const SCREEN: u8 = 0x60;

/// SCPI command passthrough (payload is a newline-terminated SCPI string)
pub const SCPI: u8 = 0x61;

/// Interference power measurement query
pub const INTERFERENCE_POWER: u8 = 0x83;
