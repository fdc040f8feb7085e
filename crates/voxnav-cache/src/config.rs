//! Route cache configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteCacheConfig {
    /// Maximum number of cached routes before LRU eviction
    #[serde(default = "default_max_cache_size", alias = "maxCacheSize")]
    pub max_cache_size: usize,

    /// Bucket edge length; start/end are rounded down to multiples of it
    #[serde(default = "default_bucket_radius", alias = "bucketRadius")]
    pub bucket_radius: i32,

    /// Age after which an entry is treated as a miss
    #[serde(default = "default_cache_expiration_ms", alias = "cacheExpirationMs")]
    pub cache_expiration_ms: u64,

    /// Routes with fewer waypoints are never stored
    #[serde(default = "default_min_path_length", alias = "minPathLengthToCache")]
    pub min_path_length_to_cache: usize,
}

fn default_max_cache_size() -> usize {
    100
}
fn default_bucket_radius() -> i32 {
    5
}
fn default_cache_expiration_ms() -> u64 {
    300_000
}
fn default_min_path_length() -> usize {
    10
}

impl Default for RouteCacheConfig {
    fn default() -> Self {
        Self {
            max_cache_size: default_max_cache_size(),
            bucket_radius: default_bucket_radius(),
            cache_expiration_ms: default_cache_expiration_ms(),
            min_path_length_to_cache: default_min_path_length(),
        }
    }
}

impl RouteCacheConfig {
    pub fn expiration(&self) -> Duration {
        Duration::from_millis(self.cache_expiration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: RouteCacheConfig = serde_json::from_str(r#"{ "bucket_radius": 8 }"#)
            .expect("partial config");
        assert_eq!(config.bucket_radius, 8);
        assert_eq!(config.max_cache_size, 100);
        assert_eq!(config.expiration(), Duration::from_secs(300));
        assert_eq!(config.min_path_length_to_cache, 10);
    }

    #[test]
    fn camel_case_aliases_are_accepted() {
        let config: RouteCacheConfig =
            serde_json::from_str(r#"{ "maxCacheSize": 7, "minPathLengthToCache": 3 }"#)
                .expect("camelCase config");
        assert_eq!(config.max_cache_size, 7);
        assert_eq!(config.min_path_length_to_cache, 3);
    }
}
