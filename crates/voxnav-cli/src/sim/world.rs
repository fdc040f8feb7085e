use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use voxnav_core::{AgentWorld, Block, BlockUpdate, BlockWorld, BoundingBox, Vec3, VoxelPos};

pub const AIR: u32 = 0;
pub const STONE: u32 = 1;

const UPDATE_CAPACITY: usize = 256;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Flat stone floor below `y = 0`, open air above, with explicit overrides.
pub struct SimWorld {
    overrides: Mutex<HashMap<VoxelPos, Block>>,
    agent: Mutex<Vec3>,
    peers: Mutex<HashMap<String, Vec3>>,
    updates: broadcast::Sender<BlockUpdate>,
}

impl SimWorld {
    pub fn flat(agent: Vec3) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CAPACITY);
        Self {
            overrides: Mutex::new(HashMap::new()),
            agent: Mutex::new(agent),
            peers: Mutex::new(HashMap::new()),
            updates,
        }
    }

    /// Place a two-high stone wall across x in `[x0, x1]` at depth `z`.
    pub fn add_wall(&self, x0: i32, x1: i32, z: i32) {
        for x in x0..=x1 {
            for y in 0..2 {
                self.set_block(VoxelPos::new(x, y, z), STONE);
            }
        }
    }

    /// Replace the block at `pos` and notify subscribers.
    pub fn set_block(&self, pos: VoxelPos, type_id: u32) {
        let new = match type_id {
            AIR => Block::new(AIR, "air", BoundingBox::Empty, pos),
            _ => Block::new(type_id, "stone", BoundingBox::Block, pos),
        };
        let old = self.block_at(pos);
        lock(&self.overrides).insert(pos, new.clone());
        // No subscribers is fine.
        let _ = self.updates.send(BlockUpdate { old, new });
    }

    pub fn teleport(&self, pos: Vec3) {
        *lock(&self.agent) = pos;
    }

    pub fn agent_voxel(&self) -> VoxelPos {
        lock(&self.agent).floor()
    }

    pub fn set_peer(&self, name: &str, pos: Vec3) {
        lock(&self.peers).insert(name.to_string(), pos);
    }

    pub fn is_solid(&self, pos: VoxelPos) -> bool {
        self.block_at(pos).is_some_and(|b| b.is_solid())
    }
}

impl BlockWorld for SimWorld {
    fn block_at(&self, pos: VoxelPos) -> Option<Block> {
        if let Some(block) = lock(&self.overrides).get(&pos) {
            return Some(block.clone());
        }
        Some(if pos.y < 0 {
            Block::new(STONE, "stone", BoundingBox::Block, pos)
        } else {
            Block::new(AIR, "air", BoundingBox::Empty, pos)
        })
    }

    fn dimension(&self) -> Option<String> {
        Some("overworld".to_string())
    }

    fn subscribe(&self) -> broadcast::Receiver<BlockUpdate> {
        self.updates.subscribe()
    }
}

impl AgentWorld for SimWorld {
    fn position(&self) -> Option<Vec3> {
        Some(*lock(&self.agent))
    }

    fn peer_position(&self, name: &str) -> Option<Vec3> {
        lock(&self.peers).get(name).copied()
    }
}
