//! Navigation orchestration for an agent in a shared voxel world.
//!
//! [`NavigationController`] runs one navigation request end to end:
//! occupancy negotiation with peer agents, route-cache lookup, fallback
//! planning under a timeout, and cleanup on every exit path. External
//! systems plug in through the [`Planner`], [`Coordinator`], [`Gaze`] and
//! [`ScaffoldingProvider`] traits.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod config;
pub mod controller;
pub mod coordinator;
pub mod error;
pub mod follow;
pub mod gaze;
pub mod planner;
pub mod profile;
pub mod request;

pub use config::{NavConfig, NavigatorConfig};
pub use controller::{NavigationController, NavigationControllerBuilder};
pub use coordinator::Coordinator;
pub use error::{NavError, PlannerError};
pub use follow::FollowHandle;
pub use gaze::Gaze;
pub use planner::{Goal, Planner};
pub use profile::{
    DigPredicate, DiggingBias, MovementProfile, ScaffoldingProvider,
    FALLBACK_SCAFFOLDING_BLOCKS,
};
pub use request::{NavOutcome, NavigationOptions, NavigationRequest, ProfileOverride};

pub use voxnav_cache::{CacheDebugInfo, CacheStatsReport, RouteCacheConfig};
pub use voxnav_core::{AgentId, IntoVoxelPos, PositionError, Vec3, VoxelPos};
