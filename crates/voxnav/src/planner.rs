use async_trait::async_trait;
use voxnav_core::VoxelPos;

use crate::{MovementProfile, PlannerError};

/// Arrive within `range` blocks of `pos`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Goal {
    pub pos: VoxelPos,
    pub range: f64,
}

impl Goal {
    pub fn near(pos: VoxelPos, range: f64) -> Self {
        Self { pos, range }
    }
}

/// Path planner and movement executor for one agent.
#[async_trait]
pub trait Planner: Send + Sync {
    /// Travel to `goal`, resolving once arrived.
    async fn goto(&self, goal: Goal) -> Result<(), PlannerError>;

    /// Waypoints of the most recently completed `goto`, for backends that
    /// expose them.
    fn last_path(&self) -> Option<Vec<VoxelPos>> {
        None
    }

    fn movement_profile(&self) -> MovementProfile;

    fn set_movement_profile(&self, profile: MovementProfile);

    /// Pursue `goal` in the background. With `continuous`, the planner keeps
    /// re-planning as the goal or world changes.
    fn set_goal(&self, goal: Goal, continuous: bool);

    /// Abandon the current goal, if any.
    fn stop(&self);
}
