//! Transport layer for the CellAdvisor remote-control protocol
//!
//! This crate provides the stream abstraction and the TCP transport used to
//! reach the instrument.

pub mod stream;
pub mod tcp;

pub use stream::{StreamAccessor, TransportLayer};
pub use tcp::{TcpSettings, TcpTransport, INSTRUMENT_PORT};
