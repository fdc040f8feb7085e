//! Per-agent route cache.
//!
//! Routes are keyed by bucketed `(start, end, dimension)` so nearby requests
//! share an entry. Each stored route keeps a sparse set of checkpoints with
//! the block type observed at caching time; lookups re-check a sample of
//! them against the live world and drop routes whose terrain changed.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod cache;
pub mod config;
pub mod route;
pub mod stats;

pub use cache::RouteCache;
pub use config::RouteCacheConfig;
pub use route::{CacheKey, CachedRoute, Checkpoint, DEFAULT_DIMENSION};
pub use stats::{CacheDebugInfo, CacheStats, CacheStatsReport, DebugEntry};
