use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use voxnav::{Goal, MovementProfile, Planner, PlannerError, Vec3, VoxelPos};
use voxnav_core::BlockWorld;

use super::SimWorld;

const DEFAULT_MAX_EXPANSIONS: usize = 50_000;

/// Horizontal steps; each may also climb or drop one block.
const STEPS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Frontier entry ordered by `(f, g, insertion order)`; wrapped in
/// `Reverse` so the max-heap pops the cheapest node first.
type Frontier = BinaryHeap<Reverse<(u32, u32, u64, VoxelPos)>>;

/// Every step moves exactly one block horizontally, so the horizontal
/// Manhattan distance never overestimates.
fn heuristic(a: VoxelPos, b: VoxelPos) -> u32 {
    a.x.abs_diff(b.x) + a.z.abs_diff(b.z)
}

/// Walking A* planner over a [`SimWorld`], with artificial latency so the
/// controller's slow-plan caching kicks in.
///
/// Digging is priced through the movement profile but never performed.
pub struct AStarPlanner {
    world: Arc<SimWorld>,
    latency: Duration,
    max_expansions: usize,
    profile: Mutex<MovementProfile>,
    last_path: Mutex<Option<Vec<VoxelPos>>>,
    goal: Mutex<Option<(Goal, bool)>>,
}

impl AStarPlanner {
    pub fn new(world: Arc<SimWorld>, latency: Duration) -> Self {
        Self {
            world,
            latency,
            max_expansions: DEFAULT_MAX_EXPANSIONS,
            profile: Mutex::new(MovementProfile::default()),
            last_path: Mutex::new(None),
            goal: Mutex::new(None),
        }
    }

    /// Goal currently pursued in the background, if any.
    pub fn background_goal(&self) -> Option<(Goal, bool)> {
        *lock(&self.goal)
    }

    /// Extra cost of making `pos` passable for a two-high agent, or `None`
    /// when it cannot be made passable.
    fn body_cost(&self, pos: VoxelPos, profile: &MovementProfile) -> Option<u32> {
        let mut cost = 0;
        for body in [pos, pos.offset(0, 1, 0)] {
            let block = self.world.block_at(body)?;
            if block.is_solid() {
                if !profile.may_dig(&block) {
                    return None;
                }
                cost += profile.dig_cost.max(0.0).ceil() as u32;
            }
        }
        Some(cost)
    }

    fn step_cost(&self, pos: VoxelPos, profile: &MovementProfile) -> Option<u32> {
        if !self.world.is_solid(pos.offset(0, -1, 0)) {
            return None;
        }
        self.body_cost(pos, profile).map(|dig| 1 + dig)
    }

    pub fn find_path(&self, start: VoxelPos, goal: Goal) -> Result<Vec<VoxelPos>, PlannerError> {
        let profile = lock(&self.profile).clone();
        let target = goal.pos;

        let mut open = Frontier::new();
        let mut seq: u64 = 0;
        let mut g_score: HashMap<VoxelPos, u32> = HashMap::new();
        let mut came_from: HashMap<VoxelPos, VoxelPos> = HashMap::new();

        g_score.insert(start, 0);
        open.push(Reverse((heuristic(start, target), 0, seq, start)));
        seq += 1;

        let mut expansions = 0;
        while let Some(Reverse((_, g, _, pos))) = open.pop() {
            if pos.distance(target) <= goal.range {
                let mut path = vec![pos];
                let mut current = pos;
                while let Some(prev) = came_from.get(&current) {
                    current = *prev;
                    path.push(current);
                }
                path.reverse();
                debug!(
                    "found path to {} with {} waypoints after {} expansions",
                    target,
                    path.len(),
                    expansions
                );
                return Ok(path);
            }

            if g_score.get(&pos).is_some_and(|best| g != *best) {
                // Superseded by a cheaper entry.
                continue;
            }

            expansions += 1;
            if expansions > self.max_expansions {
                return Err(PlannerError::new(format!(
                    "no path to {target} within {} expansions",
                    self.max_expansions
                )));
            }

            for (dx, dz) in STEPS {
                for dy in [0, 1, -1] {
                    let next = pos.offset(dx, dy, dz);
                    let Some(cost) = self.step_cost(next, &profile) else {
                        continue;
                    };
                    let next_g = g.saturating_add(cost);
                    if g_score.get(&next).is_some_and(|best| next_g >= *best) {
                        continue;
                    }
                    came_from.insert(next, pos);
                    g_score.insert(next, next_g);
                    let f = next_g.saturating_add(heuristic(next, target));
                    open.push(Reverse((f, next_g, seq, next)));
                    seq += 1;
                }
            }
        }

        Err(PlannerError::new(format!("no path to {target}")))
    }
}

#[async_trait]
impl Planner for AStarPlanner {
    async fn goto(&self, goal: Goal) -> Result<(), PlannerError> {
        let start = self.world.agent_voxel();
        let path = self.find_path(start, goal)?;
        tokio::time::sleep(self.latency).await;

        if let Some(last) = path.last() {
            self.world.teleport(Vec3::from(*last) + Vec3::new(0.5, 0.0, 0.5));
        }
        *lock(&self.last_path) = Some(path);
        Ok(())
    }

    fn last_path(&self) -> Option<Vec<VoxelPos>> {
        lock(&self.last_path).clone()
    }

    fn movement_profile(&self) -> MovementProfile {
        lock(&self.profile).clone()
    }

    fn set_movement_profile(&self, profile: MovementProfile) {
        *lock(&self.profile) = profile;
    }

    fn set_goal(&self, goal: Goal, continuous: bool) {
        debug!("background goal set to {} (continuous: {})", goal.pos, continuous);
        *lock(&self.goal) = Some((goal, continuous));
    }

    fn stop(&self) {
        *lock(&self.goal) = None;
    }
}
