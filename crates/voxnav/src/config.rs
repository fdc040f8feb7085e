//! Navigation configuration, loadable from YAML.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use voxnav_cache::RouteCacheConfig;

/// Top-level configuration: route cache plus controller tuning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavConfig {
    #[serde(default)]
    pub cache: RouteCacheConfig,

    #[serde(default)]
    pub navigation: NavigatorConfig,
}

impl NavConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        Ok(config)
    }

    /// Load from `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Controller timing and negotiation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigatorConfig {
    /// Planner timeout when a request does not set one
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,

    /// Arrival distance when a request does not set one
    #[serde(default = "default_acceptance_radius")]
    pub default_acceptance_radius: f64,

    /// Arrival distance for block-targeted navigation
    #[serde(default = "default_block_acceptance_radius")]
    pub block_acceptance_radius: f64,

    /// Plans slower than this are stored in the route cache
    #[serde(default = "default_slow_plan_threshold_ms")]
    pub slow_plan_threshold_ms: u64,

    /// Pause after a successful arrival before returning
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Arrival radius for `goto_agent` / `follow_agent` when none is given
    #[serde(default = "default_follow_radius")]
    pub default_follow_radius: f64,

    /// Distance at which a peer's claim counts as occupying the target
    #[serde(default = "default_occupancy_proximity")]
    pub occupancy_proximity: f64,

    /// Search radius for a free alternative to an occupied target
    #[serde(default = "default_alternative_search_radius")]
    pub alternative_search_radius: i32,

    /// Radius of cache invalidation when executing a cached route fails
    #[serde(default = "default_cache_failure_radius")]
    pub cache_failure_invalidation_radius: f64,

    /// Follow loop period
    #[serde(default = "default_follow_tick_ms")]
    pub follow_tick_ms: u64,

    /// Extra distance beyond the follow radius tolerated before re-targeting
    #[serde(default = "default_follow_slack")]
    pub follow_slack: f64,
}

fn default_timeout_ms() -> u64 {
    30_000
}
fn default_acceptance_radius() -> f64 {
    1.0
}
fn default_block_acceptance_radius() -> f64 {
    1.5
}
fn default_follow_radius() -> f64 {
    3.0
}
fn default_slow_plan_threshold_ms() -> u64 {
    500
}
fn default_settle_delay_ms() -> u64 {
    500
}
fn default_occupancy_proximity() -> f64 {
    1.0
}
fn default_alternative_search_radius() -> i32 {
    3
}
fn default_cache_failure_radius() -> f64 {
    10.0
}
fn default_follow_tick_ms() -> u64 {
    1_000
}
fn default_follow_slack() -> f64 {
    2.0
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: default_timeout_ms(),
            default_acceptance_radius: default_acceptance_radius(),
            block_acceptance_radius: default_block_acceptance_radius(),
            default_follow_radius: default_follow_radius(),
            slow_plan_threshold_ms: default_slow_plan_threshold_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            occupancy_proximity: default_occupancy_proximity(),
            alternative_search_radius: default_alternative_search_radius(),
            cache_failure_invalidation_radius: default_cache_failure_radius(),
            follow_tick_ms: default_follow_tick_ms(),
            follow_slack: default_follow_slack(),
        }
    }
}

impl NavigatorConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    pub fn slow_plan_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_plan_threshold_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn follow_tick(&self) -> Duration {
        // A zero period would make `tokio::time::interval` panic.
        Duration::from_millis(self.follow_tick_ms.max(1))
    }
}
