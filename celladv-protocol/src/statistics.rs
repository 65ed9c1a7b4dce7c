//! Per-link statistics collection

/// Device link statistics
///
/// Tracks frame and message counters for one instrument connection.
/// Counters are owned by the link and survive reinitialization, so they
/// describe the lifetime of the worker slot rather than one TCP session.
#[derive(Debug, Clone, Default)]
pub struct LinkStatistics {
    /// Total number of frames sent
    pub frames_sent: u64,
    /// Total number of frames received
    pub frames_received: u64,
    /// Total number of logical messages sent
    pub messages_sent: u64,
    /// Total number of logical messages received (after reassembly)
    pub messages_received: u64,
    /// Number of frames whose checksum did not match
    pub checksum_errors: u64,
    /// Number of link reinitializations
    pub reconnects: u64,
}

impl LinkStatistics {
    /// Create new statistics with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all statistics counters
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Increment frames sent counter
    pub fn increment_frames_sent(&mut self) {
        self.frames_sent += 1;
    }

    /// Increment frames received counter
    pub fn increment_frames_received(&mut self) {
        self.frames_received += 1;
    }

    /// Increment messages sent counter
    pub fn increment_messages_sent(&mut self) {
        self.messages_sent += 1;
    }

    /// Increment messages received counter
    pub fn increment_messages_received(&mut self) {
        self.messages_received += 1;
    }

    /// Increment checksum error counter
    pub fn increment_checksum_errors(&mut self) {
        self.checksum_errors += 1;
    }

    /// Increment reconnect counter
    pub fn increment_reconnects(&mut self) {
        self.reconnects += 1;
    }
}
