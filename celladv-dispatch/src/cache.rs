//! Shared screen capture cache

use celladv_client::InstrumentLink;
use celladv_core::CellResult;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct CacheSlot {
    taken_at: Option<Instant>,
    image: Vec<u8>,
}

impl CacheSlot {
    fn is_stale(&self, freshness_window: Duration) -> bool {
        match self.taken_at {
            Some(taken_at) => taken_at.elapsed() > freshness_window,
            None => true,
        }
    }
}

/// Screen image cache shared by all workers
///
/// Readers proceed concurrently; the refresh path takes the write lock
/// and re-checks staleness under it, so requests racing for a refresh
/// fetch from the instrument at most once per freshness window.
#[derive(Debug)]
pub struct ScreenCache {
    inner: RwLock<CacheSlot>,
    freshness_window: Duration,
}

impl ScreenCache {
    /// Create an empty cache with the given freshness window
    pub fn new(freshness_window: Duration) -> Self {
        Self {
            inner: RwLock::new(CacheSlot::default()),
            freshness_window,
        }
    }

    /// Current cached image (empty until the first successful refresh)
    pub async fn image(&self) -> Vec<u8> {
        self.inner.read().await.image.clone()
    }

    /// Whether the cache is older than the freshness window (or empty)
    pub async fn is_stale(&self) -> bool {
        self.inner.read().await.is_stale(self.freshness_window)
    }

    /// Refresh the cached image through `link` if it is stale.
    ///
    /// Double-checked: staleness is probed under the read lock first, and
    /// re-checked after acquiring the write lock, so only one of several
    /// racing workers performs the fetch. The capture timestamp advances
    /// even when the fetch fails; a failed refresh is not retried until
    /// the window elapses again.
    ///
    /// # Returns
    /// `true` if this call performed the fetch, `false` if the cache was
    /// already fresh.
    pub async fn refresh_if_stale<L: InstrumentLink>(&self, link: &mut L) -> CellResult<bool> {
        if !self.is_stale().await {
            return Ok(false);
        }

        let mut slot = self.inner.write().await;
        if !slot.is_stale(self.freshness_window) {
            return Ok(false);
        }

        slot.taken_at = Some(Instant::now());
        slot.image = link.screen().await?;
        Ok(true)
    }
}
