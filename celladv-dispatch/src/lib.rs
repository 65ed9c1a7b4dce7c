//! Concurrent dispatch layer for CellAdvisor instruments
//!
//! Callers submit named commands with string arguments; a pool of workers,
//! each exclusively owning one persistent device connection, answers them
//! from a shared bounded queue. Workers heartbeat the instrument when
//! idle, share one screen cache, and are restarted by a supervisor when
//! their link hits end-of-stream.

pub mod cache;
pub mod config;
pub mod metrics;
pub mod pool;
pub mod request;
pub mod state;

mod worker;

#[cfg(test)]
mod testutil;

pub use cache::ScreenCache;
pub use config::PoolConfig;
pub use metrics::{AtomicMetrics, MetricsSink, MetricsSnapshot};
pub use pool::{DispatchPool, PoolHandle};
pub use request::{CommandKind, Reply, Request};
pub use state::WorkerState;
