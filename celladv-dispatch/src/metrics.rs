//! Dispatch observability counters
//!
//! The pool reports request outcomes through an injected sink instead of
//! process-wide globals.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Sink for dispatch outcome counters
pub trait MetricsSink: Send + Sync + fmt::Debug {
    /// A reply was delivered to a waiting caller
    fn increment_send_success(&self);

    /// A caller received its reply within the bounded wait
    fn increment_receive_success(&self);

    /// A reply was ready but the caller had abandoned the wait
    fn increment_send_pending(&self);

    /// A caller's bounded wait expired before a reply arrived
    fn increment_receive_pending(&self);
}

/// Default in-memory metrics sink backed by atomic counters
#[derive(Debug, Default)]
pub struct AtomicMetrics {
    send_success: AtomicU64,
    receive_success: AtomicU64,
    send_pending: AtomicU64,
    receive_pending: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub send_success: u64,
    pub receive_success: u64,
    pub send_pending: u64,
    pub receive_pending: u64,
}

impl AtomicMetrics {
    /// Create a sink with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Read all counters at once
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            send_success: self.send_success.load(Ordering::Relaxed),
            receive_success: self.receive_success.load(Ordering::Relaxed),
            send_pending: self.send_pending.load(Ordering::Relaxed),
            receive_pending: self.receive_pending.load(Ordering::Relaxed),
        }
    }
}

impl MetricsSink for AtomicMetrics {
    fn increment_send_success(&self) {
        self.send_success.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_receive_success(&self) {
        self.receive_success.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_send_pending(&self) {
        self.send_pending.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_receive_pending(&self) {
        self.receive_pending.fetch_add(1, Ordering::Relaxed);
    }
}
