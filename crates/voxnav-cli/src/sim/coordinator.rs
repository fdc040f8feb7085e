use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tracing::debug;
use voxnav::{AgentId, Coordinator, VoxelPos};

/// Single-process goal registry shared by every simulated agent.
#[derive(Default)]
pub struct LocalCoordinator {
    claims: Mutex<HashMap<AgentId, (VoxelPos, String)>>,
}

impl LocalCoordinator {
    pub fn claim_of(&self, agent: &AgentId) -> Option<(VoxelPos, String)> {
        self.claims
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(agent)
            .cloned()
    }

    fn occupied_by_other(&self, pos: VoxelPos, agent: &AgentId, proximity: f64) -> bool {
        self.claims
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|(owner, (claimed, _))| owner != agent && claimed.distance(pos) <= proximity)
    }
}

impl Coordinator for LocalCoordinator {
    fn is_occupied(&self, pos: VoxelPos, agent: &AgentId, proximity: f64) -> bool {
        self.occupied_by_other(pos, agent, proximity)
    }

    /// Nearest unclaimed position on the same layer, scanning outward ring
    /// by ring.
    fn find_alternative(
        &self,
        pos: VoxelPos,
        agent: &AgentId,
        search_radius: i32,
    ) -> Option<VoxelPos> {
        let mut candidates: Vec<VoxelPos> = (-search_radius..=search_radius)
            .flat_map(|dx| (-search_radius..=search_radius).map(move |dz| pos.offset(dx, 0, dz)))
            .filter(|candidate| *candidate != pos)
            .collect();
        candidates.sort_by(|a, b| a.distance(pos).total_cmp(&b.distance(pos)).then(a.cmp(b)));
        candidates
            .into_iter()
            .find(|candidate| !self.occupied_by_other(*candidate, agent, 1.0))
    }

    fn register_goal(&self, agent: &AgentId, pos: VoxelPos, label: &str) {
        debug!("{} claims {} ({})", agent, pos, label);
        self.claims
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(agent.clone(), (pos, label.to_string()));
    }

    fn clear_goal(&self, agent: &AgentId) {
        self.claims
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(agent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_claim_does_not_count_as_occupied() {
        let coordinator = LocalCoordinator::default();
        let alice = AgentId::from("alice");
        let bob = AgentId::from("bob");
        coordinator.register_goal(&alice, VoxelPos::new(5, 0, 5), "goto");

        assert!(!coordinator.is_occupied(VoxelPos::new(5, 0, 5), &alice, 1.0));
        assert!(coordinator.is_occupied(VoxelPos::new(5, 0, 6), &bob, 1.0));
        assert!(!coordinator.is_occupied(VoxelPos::new(5, 0, 7), &bob, 1.0));
    }

    #[test]
    fn alternative_is_nearest_free_neighbour() {
        let coordinator = LocalCoordinator::default();
        let alice = AgentId::from("alice");
        let bob = AgentId::from("bob");
        let target = VoxelPos::new(0, 0, 0);
        coordinator.register_goal(&alice, target, "goto");

        let alternative = coordinator.find_alternative(target, &bob, 3).unwrap();

        assert_eq!(alternative.distance(target), 2.0_f64.sqrt());
        assert!(!coordinator.is_occupied(alternative, &bob, 1.0));

        coordinator.clear_goal(&alice);
        assert!(coordinator.claim_of(&alice).is_none());
    }
}
