//! celladv - Rust implementation of the CellAdvisor remote-control protocol
//!
//! This library talks to JDSU CellAdvisor test instruments over their
//! private TCP byte-stuffed framing protocol and exposes the device's
//! capabilities (status polling, screenshot capture, keypad/touch
//! injection, measurement retrieval) to multiple concurrent callers
//! through a small supervised worker pool.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `celladv-core`: Error taxonomy and measurement types
//! - `celladv-transport`: Transport layer (TCP)
//! - `celladv-protocol`: Frame codec, escaping, checksum, reassembly
//! - `celladv-client`: Device link and operation surface
//! - `celladv-dispatch`: Request queue, worker pool, supervision
//!
//! # Usage
//!
//! ```no_run
//! use celladv::dispatch::{DispatchPool, PoolConfig};
//! use std::collections::HashMap;
//!
//! # async fn run() -> celladv::CellResult<()> {
//! let pool = DispatchPool::connect(PoolConfig::new("10.82.26.12").with_workers(4)).await?;
//! let handle = pool.handle();
//! let reply = handle.submit("heartbeat", HashMap::new()).await?;
//! # Ok(())
//! # }
//! ```

// Re-export core types
pub use celladv_core::{CellError, CellResult, InterferencePower};

// Re-export client API
pub mod client {
    pub use celladv_client::*;
}

// Re-export dispatch API
pub mod dispatch {
    pub use celladv_dispatch::*;
}

// Re-export protocol internals
pub mod protocol {
    pub use celladv_protocol::*;
}

// Re-export transport layer
pub mod transport {
    pub use celladv_transport::*;
}
