// Mod runtime metrics
//
// Lightweight counters for watching how often documents reload and overrides apply

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counters shared by the store, cache, loaders and controller.
///
/// Uses atomic operations so the notification threads and the apply tick can
/// record without locking. Call [`log_summary`](Self::log_summary) on shutdown
/// to see how the session went.
#[derive(Debug)]
pub struct ModMetrics {
    /// Documents decoded successfully from disk
    pub documents_loaded: AtomicU64,

    /// Documents that were corrupt and replaced by defaults
    pub corrupt_recoveries: AtomicU64,

    /// Reloads triggered by filesystem notifications
    pub watch_reloads: AtomicU64,

    /// Override payloads pushed onto targets
    pub applies: AtomicU64,

    /// Captured defaults pushed back onto targets
    pub restores: AtomicU64,

    /// Resource loads served from the cache
    pub cache_hits: AtomicU64,

    /// Resource loads that decoded from disk
    pub cache_misses: AtomicU64,

    start_time: Instant,
}

impl ModMetrics {
    pub fn new() -> Self {
        Self {
            documents_loaded: AtomicU64::new(0),
            corrupt_recoveries: AtomicU64::new(0),
            watch_reloads: AtomicU64::new(0),
            applies: AtomicU64::new(0),
            restores: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_document_loaded(&self) {
        self.documents_loaded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_corrupt_recovery(&self) {
        self.corrupt_recoveries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_watch_reload(&self) {
        self.watch_reloads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_apply(&self) {
        self.applies.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_restore(&self) {
        self.restores.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Fraction of resource loads served from cache (0.0 when nothing was loaded).
    pub fn cache_hit_ratio(&self) -> f64 {
        let hits = self.cache_hits.load(Ordering::Relaxed);
        let total = hits + self.cache_misses.load(Ordering::Relaxed);
        if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Mod Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Documents: {} loaded, {} corrupt, {} watch reloads",
            self.documents_loaded.load(Ordering::Relaxed),
            self.corrupt_recoveries.load(Ordering::Relaxed),
            self.watch_reloads.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Overrides: {} applied, {} restored",
            self.applies.load(Ordering::Relaxed),
            self.restores.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Resource cache: {} hits, {} misses ({:.0}% hit ratio)",
            self.cache_hits.load(Ordering::Relaxed),
            self.cache_misses.load(Ordering::Relaxed),
            self.cache_hit_ratio() * 100.0
        );
    }
}

impl Default for ModMetrics {
    fn default() -> Self {
        Self::new()
    }
}
