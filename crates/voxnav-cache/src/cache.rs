//! Route cache storage, validation, and invalidation.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, warn};
use voxnav_core::{BlockUpdate, BlockWorld, Clock, SystemClock, VoxelPos};

use crate::route::{checkpoint_indices, validation_sample};
use crate::{
    CacheDebugInfo, CacheKey, CacheStats, CacheStatsReport, CachedRoute, Checkpoint, DebugEntry,
    RouteCacheConfig,
};

/// Radius around a solid/non-solid block change whose routes are dropped.
pub const BLOCK_CHANGE_RADIUS: f64 = 3.0;

const DEBUG_TOP_ENTRIES: usize = 10;

/// Agent-local cache of previously computed routes.
///
/// Not synchronized: owned and mutated by a single agent's navigation
/// context. Block mutations are received through a broadcast subscription
/// and applied lazily at the start of every lookup, store and invalidation.
pub struct RouteCache {
    config: RouteCacheConfig,
    world: Arc<dyn BlockWorld>,
    clock: Arc<dyn Clock>,
    entries: HashMap<CacheKey, CachedRoute>,
    stats: CacheStats,
    updates: Option<broadcast::Receiver<BlockUpdate>>,
    next_seq: u64,
}

impl RouteCache {
    pub fn new(config: RouteCacheConfig, world: Arc<dyn BlockWorld>) -> Self {
        Self::with_clock(config, world, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: RouteCacheConfig,
        world: Arc<dyn BlockWorld>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let updates = Some(world.subscribe());
        Self {
            config,
            world,
            clock,
            entries: HashMap::new(),
            stats: CacheStats::default(),
            updates,
            next_seq: 0,
        }
    }

    pub fn config(&self) -> &RouteCacheConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether block updates are still being received.
    pub fn is_subscribed(&self) -> bool {
        self.updates.is_some()
    }

    pub fn key_for(&self, start: VoxelPos, end: VoxelPos) -> CacheKey {
        CacheKey::new(start, end, self.config.bucket_radius, self.world.dimension())
    }

    /// Look up a route without touching stats, recency, or validity.
    pub fn peek(&self, start: VoxelPos, end: VoxelPos) -> Option<&CachedRoute> {
        self.entries.get(&self.key_for(start, end))
    }

    /// Look up a usable route from `start` to `end`.
    ///
    /// Expired and invalid entries are removed and reported as misses.
    pub fn get(&mut self, start: VoxelPos, end: VoxelPos) -> Option<&CachedRoute> {
        self.process_world_updates();

        let key = self.key_for(start, end);
        let now = self.clock.now();

        let Some(route) = self.entries.get(&key) else {
            self.stats.misses += 1;
            debug!("route cache miss for {}", key);
            return None;
        };

        if now.duration_since(route.created_at) > self.config.expiration() {
            self.entries.remove(&key);
            self.stats.misses += 1;
            debug!("route cache entry {} expired", key);
            return None;
        }

        if !self.is_valid(route) {
            self.entries.remove(&key);
            self.stats.invalidations += 1;
            self.stats.misses += 1;
            debug!("route cache entry {} failed validation", key);
            return None;
        }

        let seq = self.bump_seq();
        self.stats.hits += 1;
        let route = self.entries.get_mut(&key)?;
        route.last_used_at = now;
        route.use_seq = seq;
        route.use_count += 1;
        debug!(
            "route cache hit for {} (uses: {}, waypoints: {})",
            key,
            route.use_count,
            route.waypoints.len()
        );
        Some(&*route)
    }

    /// Store a computed route. Returns `false` when the route is too short
    /// to be worth caching.
    pub fn put(
        &mut self,
        start: VoxelPos,
        end: VoxelPos,
        waypoints: Vec<VoxelPos>,
        cost: f64,
    ) -> bool {
        self.process_world_updates();

        if waypoints.len() < self.config.min_path_length_to_cache
            || self.config.max_cache_size == 0
        {
            return false;
        }

        let key = self.key_for(start, end);
        if !self.entries.contains_key(&key) && self.entries.len() >= self.config.max_cache_size {
            self.evict_lru();
        }

        let checkpoints = checkpoint_indices(waypoints.len())
            .into_iter()
            .map(|index| {
                let position = waypoints[index];
                Checkpoint {
                    position,
                    block_type_id: self.world.block_at(position).map(|b| b.type_id),
                    index,
                }
            })
            .collect::<Vec<_>>();

        let now = self.clock.now();
        let use_seq = self.bump_seq();
        debug!(
            "caching route {} ({} waypoints, {} checkpoints)",
            key,
            waypoints.len(),
            checkpoints.len()
        );
        self.entries.insert(
            key,
            CachedRoute {
                start,
                end,
                waypoints,
                checkpoints,
                created_at: now,
                last_used_at: now,
                use_count: 1,
                cost,
                use_seq,
            },
        );
        self.stats.saves += 1;
        true
    }

    /// Re-check up to five evenly spaced checkpoints against the world.
    ///
    /// A single missing block or type mismatch invalidates the whole route.
    pub fn is_valid(&self, route: &CachedRoute) -> bool {
        validation_sample(route.checkpoints.len()).all(|i| {
            let checkpoint = &route.checkpoints[i];
            match self.world.block_at(checkpoint.position) {
                Some(block) => Some(block.type_id) == checkpoint.block_type_id,
                None => false,
            }
        })
    }

    /// Drop every route with a checkpoint within `radius` of `pos`.
    pub fn invalidate_near(&mut self, pos: VoxelPos, radius: f64) -> usize {
        self.process_world_updates();
        self.remove_near(pos, radius)
    }

    /// React to a single block mutation.
    ///
    /// Only changes that flip a voxel between solid and passable can affect
    /// traversal; everything else is ignored.
    pub fn apply_block_update(&mut self, update: &BlockUpdate) -> usize {
        if !update.crosses_solid_boundary() {
            return 0;
        }
        self.remove_near(update.position(), BLOCK_CHANGE_RADIUS)
    }

    /// Drain pending block updates from the world subscription.
    ///
    /// Returns the number of routes removed. When the subscription lagged and
    /// updates were lost, every route is dropped.
    pub fn process_world_updates(&mut self) -> usize {
        let mut removed = 0;
        loop {
            let Some(updates) = self.updates.as_mut() else {
                break;
            };
            match updates.try_recv() {
                Ok(update) => removed += self.apply_block_update(&update),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(
                        "route cache missed {} block updates; dropping all {} routes",
                        skipped,
                        self.entries.len()
                    );
                    removed += self.remove_all();
                }
                Err(TryRecvError::Closed) => {
                    debug!("block update stream closed");
                    self.updates = None;
                    break;
                }
            }
        }
        removed
    }

    /// Remove the least recently used route.
    pub fn evict_lru(&mut self) -> Option<CacheKey> {
        let key = self
            .entries
            .iter()
            .min_by_key(|(_, route)| route.recency())
            .map(|(key, _)| key.clone())?;
        self.entries.remove(&key);
        debug!("evicted least recently used route {}", key);
        Some(key)
    }

    pub fn stats(&self) -> CacheStatsReport {
        CacheStatsReport {
            hits: self.stats.hits,
            misses: self.stats.misses,
            invalidations: self.stats.invalidations,
            saves: self.stats.saves,
            size: self.entries.len(),
            max_size: self.config.max_cache_size,
            hit_rate: self.stats.hit_rate(),
        }
    }

    pub fn debug_info(&self) -> CacheDebugInfo {
        let now = self.clock.now();
        let mut routes: Vec<(&CacheKey, &CachedRoute)> = self.entries.iter().collect();
        routes.sort_by(|(ka, a), (kb, b)| {
            b.use_count
                .cmp(&a.use_count)
                .then_with(|| ka.to_string().cmp(&kb.to_string()))
        });

        let top_entries = routes
            .into_iter()
            .take(DEBUG_TOP_ENTRIES)
            .map(|(key, route)| DebugEntry {
                key: key.to_string(),
                use_count: route.use_count,
                age_ms: now.duration_since(route.created_at).as_millis(),
                checkpoints: route.checkpoints.len(),
                waypoints: route.waypoints.len(),
            })
            .collect();

        CacheDebugInfo {
            stats: self.stats(),
            top_entries,
        }
    }

    /// Remove every route and reset stats.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats = CacheStats::default();
    }

    /// Unsubscribe from block updates and drop every route. Idempotent.
    pub fn dispose(&mut self) {
        if self.updates.take().is_some() {
            debug!("route cache disposed ({} routes dropped)", self.entries.len());
        }
        self.entries.clear();
    }

    fn remove_near(&mut self, pos: VoxelPos, radius: f64) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, route| !route.has_checkpoint_within(pos, radius));
        let removed = before - self.entries.len();
        if removed > 0 {
            self.stats.invalidations += removed as u64;
            debug!("invalidated {} routes near {} (radius {})", removed, pos, radius);
        }
        removed
    }

    fn remove_all(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        self.stats.invalidations += removed as u64;
        removed
    }

    fn bump_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

impl Drop for RouteCache {
    fn drop(&mut self) {
        self.dispose();
    }
}
