use core::fmt;
use std::time::Instant;

use serde::Serialize;
use voxnav_core::VoxelPos;

/// Dimension tag used when the world cannot report one.
pub const DEFAULT_DIMENSION: &str = "overworld";

/// Bucketed lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CacheKey {
    pub start: VoxelPos,
    pub end: VoxelPos,
    pub dimension: String,
}

impl CacheKey {
    pub fn new(
        start: VoxelPos,
        end: VoxelPos,
        bucket_radius: i32,
        dimension: Option<String>,
    ) -> Self {
        Self {
            start: start.bucket(bucket_radius),
            end: end.bucket(bucket_radius),
            dimension: dimension.unwrap_or_else(|| DEFAULT_DIMENSION.to_string()),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{}:{},{},{}:{}",
            self.start.x,
            self.start.y,
            self.start.z,
            self.end.x,
            self.end.y,
            self.end.z,
            self.dimension
        )
    }
}

/// Sparse sample of a route, with the block type seen there when cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Checkpoint {
    pub position: VoxelPos,
    /// `None` when the block was unknown at caching time.
    pub block_type_id: Option<u32>,
    /// Index of the sampled waypoint.
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct CachedRoute {
    pub start: VoxelPos,
    pub end: VoxelPos,
    pub waypoints: Vec<VoxelPos>,
    /// Always ends with the final waypoint.
    pub checkpoints: Vec<Checkpoint>,
    pub created_at: Instant,
    pub last_used_at: Instant,
    pub use_count: u64,
    /// Planning time (ms) the route took to compute.
    pub cost: f64,
    pub(crate) use_seq: u64,
}

impl CachedRoute {
    /// LRU ordering key; the sequence breaks ties between equal instants.
    pub(crate) fn recency(&self) -> (Instant, u64) {
        (self.last_used_at, self.use_seq)
    }

    pub fn has_checkpoint_within(&self, pos: VoxelPos, radius: f64) -> bool {
        self.checkpoints
            .iter()
            .any(|cp| cp.position.distance(pos) <= radius)
    }
}

/// Waypoint indices sampled as checkpoints for a route of `len` waypoints.
///
/// Samples every `max(5, len / 10)` waypoints and always includes the last.
pub fn checkpoint_indices(len: usize) -> Vec<usize> {
    if len == 0 {
        return Vec::new();
    }
    let stride = (len / 10).max(5);
    let mut out: Vec<usize> = (0..len).step_by(stride).collect();
    if out.last() != Some(&(len - 1)) {
        out.push(len - 1);
    }
    out
}

/// Checkpoint indices re-checked on lookup: at most 5, evenly spaced.
pub fn validation_sample(count: usize) -> impl Iterator<Item = usize> {
    let stride = (count / 5).max(1);
    (0..count).step_by(stride).take(5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_routes_sample_every_five() {
        assert_eq!(checkpoint_indices(12), vec![0, 5, 10, 11]);
    }

    #[test]
    fn last_waypoint_is_not_duplicated() {
        assert_eq!(checkpoint_indices(11), vec![0, 5, 10]);
    }

    #[test]
    fn long_routes_sample_every_tenth_of_length() {
        let idx = checkpoint_indices(100);
        assert_eq!(idx.len(), 11);
        assert_eq!(idx[1], 10);
        assert_eq!(idx.last(), Some(&99));
    }

    #[test]
    fn validation_never_checks_more_than_five() {
        assert_eq!(validation_sample(3).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(validation_sample(7).count(), 5);
        assert_eq!(validation_sample(20).collect::<Vec<_>>(), vec![0, 4, 8, 12, 16]);
    }

    #[test]
    fn key_display_includes_dimension() {
        let key = CacheKey::new(
            VoxelPos::new(3, 64, -1),
            VoxelPos::new(12, 64, 40),
            5,
            None,
        );
        assert_eq!(key.to_string(), "0,60,-5:10,60,40:overworld");
    }
}
