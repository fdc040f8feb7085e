//! Scripted collaborators shared by the controller integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use voxnav::{
    AgentId, Coordinator, Gaze, Goal, MovementProfile, Planner, PlannerError,
    ScaffoldingProvider, Vec3, VoxelPos,
};
use voxnav_core::{AgentWorld, Block, BlockUpdate, BlockWorld, BoundingBox};

pub const AIR: u32 = 0;
pub const STONE: u32 = 1;

/// Straight route along +z starting at `origin`.
pub fn line(origin: VoxelPos, len: usize) -> Vec<VoxelPos> {
    (0..len as i32).map(|dz| origin.offset(0, 0, dz)).collect()
}

/// Open world of air with one controlled agent and named peers.
pub struct MockWorld {
    position: Mutex<Option<Vec3>>,
    peers: Mutex<HashMap<String, Vec3>>,
    blocks: Mutex<HashMap<VoxelPos, Block>>,
    updates: broadcast::Sender<BlockUpdate>,
}

impl MockWorld {
    pub fn at(position: Vec3) -> Arc<Self> {
        let (updates, _) = broadcast::channel(64);
        Arc::new(Self {
            position: Mutex::new(Some(position)),
            peers: Mutex::new(HashMap::new()),
            blocks: Mutex::new(HashMap::new()),
            updates,
        })
    }

    pub fn move_to(&self, position: Vec3) {
        *self.position.lock().unwrap() = Some(position);
    }

    pub fn set_peer(&self, name: &str, position: Vec3) {
        self.peers.lock().unwrap().insert(name.to_string(), position);
    }

    pub fn remove_peer(&self, name: &str) {
        self.peers.lock().unwrap().remove(name);
    }

    /// Change a block and broadcast the mutation.
    pub fn set_block(&self, pos: VoxelPos, type_id: u32, bounding_box: BoundingBox) {
        let old = self.block_at(pos);
        let new = Block::new(type_id, format!("block_{type_id}"), bounding_box, pos);
        self.blocks.lock().unwrap().insert(pos, new.clone());
        let _ = self.updates.send(BlockUpdate { old, new });
    }
}

impl BlockWorld for MockWorld {
    fn block_at(&self, pos: VoxelPos) -> Option<Block> {
        let blocks = self.blocks.lock().unwrap();
        Some(
            blocks
                .get(&pos)
                .cloned()
                .unwrap_or_else(|| Block::new(AIR, "air", BoundingBox::Empty, pos)),
        )
    }

    fn subscribe(&self) -> broadcast::Receiver<BlockUpdate> {
        self.updates.subscribe()
    }
}

impl AgentWorld for MockWorld {
    fn position(&self) -> Option<Vec3> {
        *self.position.lock().unwrap()
    }

    fn peer_position(&self, name: &str) -> Option<Vec3> {
        self.peers.lock().unwrap().get(name).copied()
    }
}

/// Scripted outcome of one `Planner::goto` call.
#[derive(Debug, Clone)]
pub enum Step {
    Arrive(Duration),
    Fail(Duration, &'static str),
    Hang,
}

/// Planner whose `goto` calls follow a script; once the script runs out
/// every call arrives after `default_latency`.
pub struct MockPlanner {
    script: Mutex<VecDeque<Step>>,
    default_latency: Mutex<Duration>,
    path: Mutex<Option<Vec<VoxelPos>>>,
    profile: Mutex<MovementProfile>,
    pub goals: Mutex<Vec<Goal>>,
    pub profiles_during_goto: Mutex<Vec<MovementProfile>>,
    pub profile_sets: AtomicUsize,
    pub continuous_goals: Mutex<Vec<(Goal, bool)>>,
    pub stops: AtomicUsize,
}

impl MockPlanner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            default_latency: Mutex::new(Duration::from_millis(50)),
            path: Mutex::new(None),
            profile: Mutex::new(MovementProfile::default()),
            goals: Mutex::new(Vec::new()),
            profiles_during_goto: Mutex::new(Vec::new()),
            profile_sets: AtomicUsize::new(0),
            continuous_goals: Mutex::new(Vec::new()),
            stops: AtomicUsize::new(0),
        })
    }

    pub fn push(&self, step: Step) {
        self.script.lock().unwrap().push_back(step);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.default_latency.lock().unwrap() = latency;
    }

    /// Waypoints reported by `last_path` after a successful `goto`.
    pub fn set_path(&self, path: Vec<VoxelPos>) {
        *self.path.lock().unwrap() = Some(path);
    }

    pub fn goal_count(&self) -> usize {
        self.goals.lock().unwrap().len()
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn current_profile(&self) -> MovementProfile {
        self.profile.lock().unwrap().clone()
    }
}

#[async_trait]
impl Planner for MockPlanner {
    async fn goto(&self, goal: Goal) -> Result<(), PlannerError> {
        self.goals.lock().unwrap().push(goal);
        let profile = self.profile.lock().unwrap().clone();
        self.profiles_during_goto.lock().unwrap().push(profile);

        let step = self.script.lock().unwrap().pop_front();
        let step = step.unwrap_or_else(|| Step::Arrive(*self.default_latency.lock().unwrap()));
        match step {
            Step::Arrive(latency) => {
                tokio::time::sleep(latency).await;
                Ok(())
            }
            Step::Fail(latency, message) => {
                tokio::time::sleep(latency).await;
                Err(PlannerError::new(message))
            }
            Step::Hang => std::future::pending().await,
        }
    }

    fn last_path(&self) -> Option<Vec<VoxelPos>> {
        self.path.lock().unwrap().clone()
    }

    fn movement_profile(&self) -> MovementProfile {
        self.profile.lock().unwrap().clone()
    }

    fn set_movement_profile(&self, profile: MovementProfile) {
        self.profile_sets.fetch_add(1, Ordering::SeqCst);
        *self.profile.lock().unwrap() = profile;
    }

    fn set_goal(&self, goal: Goal, continuous: bool) {
        self.continuous_goals.lock().unwrap().push((goal, continuous));
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Coordinator with a fixed set of claimed positions.
#[derive(Default)]
pub struct MockCoordinator {
    occupied: Mutex<HashSet<VoxelPos>>,
    alternative: Mutex<Option<VoxelPos>>,
    pub registrations: Mutex<Vec<(VoxelPos, String)>>,
    pub clears: AtomicUsize,
}

impl MockCoordinator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn occupy(&self, pos: VoxelPos) {
        self.occupied.lock().unwrap().insert(pos);
    }

    pub fn offer_alternative(&self, pos: VoxelPos) {
        *self.alternative.lock().unwrap() = Some(pos);
    }

    pub fn registered(&self) -> Vec<(VoxelPos, String)> {
        self.registrations.lock().unwrap().clone()
    }

    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl Coordinator for MockCoordinator {
    fn is_occupied(&self, pos: VoxelPos, _agent: &AgentId, _proximity: f64) -> bool {
        self.occupied.lock().unwrap().contains(&pos)
    }

    fn find_alternative(
        &self,
        _pos: VoxelPos,
        _agent: &AgentId,
        _search_radius: i32,
    ) -> Option<VoxelPos> {
        *self.alternative.lock().unwrap()
    }

    fn register_goal(&self, _agent: &AgentId, pos: VoxelPos, label: &str) {
        self.registrations
            .lock()
            .unwrap()
            .push((pos, label.to_string()));
    }

    fn clear_goal(&self, _agent: &AgentId) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct MockGaze {
    paused: AtomicBool,
    pub pauses: AtomicUsize,
    pub resumes: AtomicUsize,
}

impl MockGaze {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn already_paused() -> Arc<Self> {
        let gaze = Self::default();
        gaze.paused.store(true, Ordering::SeqCst);
        Arc::new(gaze)
    }

    pub fn pause_count(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }

    pub fn resume_count(&self) -> usize {
        self.resumes.load(Ordering::SeqCst)
    }
}

impl Gaze for MockGaze {
    fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
        self.paused.store(true, Ordering::SeqCst);
    }

    fn resume(&self) {
        self.resumes.fetch_add(1, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}

/// Scaffolding provider that remembers which flavour was requested.
#[derive(Default)]
pub struct MockScaffolding {
    pub requests: Mutex<Vec<bool>>,
}

impl ScaffoldingProvider for MockScaffolding {
    fn create_profile(&self, aggressive: bool) -> MovementProfile {
        self.requests.lock().unwrap().push(aggressive);
        MovementProfile {
            allow_scaffolding: true,
            scaffolding_blocks: vec!["oak_planks".to_string()],
            allow_parkour: !aggressive,
            ..MovementProfile::default()
        }
    }
}
