use voxnav_core::{AgentId, VoxelPos};

/// Shared registry of the destinations agents are heading to.
///
/// Coordination is cooperative: checking occupancy and registering a goal
/// are separate calls, so two agents can still pick the same destination in
/// between. Implementations use interior mutability; every method takes
/// `&self`.
pub trait Coordinator: Send + Sync {
    /// Whether another agent's claim lies within `proximity` of `pos`.
    fn is_occupied(&self, pos: VoxelPos, agent: &AgentId, proximity: f64) -> bool;

    /// A free position within `search_radius` of `pos`, if any.
    fn find_alternative(
        &self,
        pos: VoxelPos,
        agent: &AgentId,
        search_radius: i32,
    ) -> Option<VoxelPos>;

    /// Record that `agent` is now heading to `pos`.
    fn register_goal(&self, agent: &AgentId, pos: VoxelPos, label: &str);

    /// Drop `agent`'s claim. Calling it without a claim is a no-op.
    fn clear_goal(&self, agent: &AgentId);
}
