//! Pool configuration

use std::time::Duration;

/// Dispatch pool configuration
///
/// All knobs are externally supplied; nothing here is negotiated with the
/// instrument.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Instrument host; the fixed device port is appended by the transport
    pub instrument_address: String,
    /// Number of workers, each owning one device connection
    pub workers: usize,
    /// Idle period after which a worker sends a liveness probe
    pub poll_period: Duration,
    /// Bound on a caller's wait for enqueueing and for the reply
    pub reply_timeout: Duration,
    /// Maximum screen cache age before a refresh is allowed
    pub freshness_window: Duration,
}

impl PoolConfig {
    /// Create a configuration for the given instrument host with defaults
    pub fn new(instrument_address: impl Into<String>) -> Self {
        Self {
            instrument_address: instrument_address.into(),
            workers: 4,
            poll_period: Duration::from_secs(10),
            reply_timeout: Duration::from_secs(3),
            freshness_window: Duration::from_secs(1),
        }
    }

    /// Set the number of workers (at least 1)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the heartbeat poll period
    pub fn with_poll_period(mut self, poll_period: Duration) -> Self {
        self.poll_period = poll_period;
        self
    }

    /// Set the caller-visible wait bound
    pub fn with_reply_timeout(mut self, reply_timeout: Duration) -> Self {
        self.reply_timeout = reply_timeout;
        self
    }

    /// Set the screen cache freshness window
    pub fn with_freshness_window(mut self, freshness_window: Duration) -> Self {
        self.freshness_window = freshness_window;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PoolConfig::new("10.82.26.12");
        assert_eq!(config.workers, 4);
        assert_eq!(config.poll_period, Duration::from_secs(10));
        assert_eq!(config.reply_timeout, Duration::from_secs(3));
        assert_eq!(config.freshness_window, Duration::from_secs(1));
    }

    #[test]
    fn test_worker_count_floor() {
        let config = PoolConfig::new("host").with_workers(0);
        assert_eq!(config.workers, 1);
    }
}
