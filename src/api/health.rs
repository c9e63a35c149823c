//! Shared health state for the /health endpoint.
//! Updated by the bootstrap, MarketRefresher, and NarrativeWorker.

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared health metrics. Updated by background tasks, read by the API.
#[derive(Default)]
pub struct HealthState {
    /// Unix-seconds timestamp of the last successful market fetch (0 = none).
    pub last_refresh_at_secs: AtomicU64,
    /// Markets added/removed counters from the last refresh diff.
    pub last_refresh_added: AtomicU64,
    pub last_refresh_removed: AtomicU64,
    /// Narrative requests queued but not yet resolved.
    pub narrative_pending: AtomicU64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_last_refresh(&self, at_secs: u64, added: u64, removed: u64) {
        self.last_refresh_at_secs.store(at_secs, Ordering::Relaxed);
        self.last_refresh_added.store(added, Ordering::Relaxed);
        self.last_refresh_removed.store(removed, Ordering::Relaxed);
    }

    pub fn inc_narrative_pending(&self) {
        self.narrative_pending.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec_narrative_pending(&self) {
        // Saturating: a late decrement after restart must not wrap.
        let _ = self.narrative_pending.fetch_update(
            Ordering::Relaxed,
            Ordering::Relaxed,
            |v| Some(v.saturating_sub(1)),
        );
    }

    pub fn last_refresh_at_secs(&self) -> u64 {
        self.last_refresh_at_secs.load(Ordering::Relaxed)
    }

    pub fn last_refresh_added(&self) -> u64 {
        self.last_refresh_added.load(Ordering::Relaxed)
    }

    pub fn last_refresh_removed(&self) -> u64 {
        self.last_refresh_removed.load(Ordering::Relaxed)
    }

    pub fn narrative_pending(&self) -> u64 {
        self.narrative_pending.load(Ordering::Relaxed)
    }
}
