use serde::Serialize;

/// Monotonic lookup counters; reset only by [`crate::RouteCache::clear`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
    pub saves: u64,
}

impl CacheStats {
    /// Hit rate as a percentage; `0.0` before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            return 0.0;
        }
        self.hits as f64 / lookups as f64 * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStatsReport {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
    pub saves: u64,
    pub size: usize,
    pub max_size: usize,
    pub hit_rate: f64,
}

impl CacheStatsReport {
    pub fn summary(&self) -> String {
        format!(
            "Size: {}/{}, Hits: {}, Misses: {}, Hit rate: {:.1}%, Invalidations: {}, Saves: {}",
            self.size,
            self.max_size,
            self.hits,
            self.misses,
            self.hit_rate,
            self.invalidations,
            self.saves
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugEntry {
    pub key: String,
    pub use_count: u64,
    pub age_ms: u128,
    pub checkpoints: usize,
    pub waypoints: usize,
}

/// Stats plus the most used entries (by `use_count`, descending).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheDebugInfo {
    pub stats: CacheStatsReport,
    pub top_entries: Vec<DebugEntry>,
}
