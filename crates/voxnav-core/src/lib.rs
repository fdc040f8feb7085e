//! Voxel world-model interface (positions, blocks, mutation stream, agent views).

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod agent;
pub mod clock;
pub mod math;
pub mod pos;
pub mod world;

pub use agent::AgentId;
pub use clock::{Clock, ManualClock, SystemClock};
pub use math::Vec3;
pub use pos::{IntoVoxelPos, PositionError, VoxelPos};
pub use world::{AgentWorld, Block, BlockUpdate, BlockWorld, BoundingBox};
