use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::{Vec3, VoxelPos};

/// Collision shape of a block, as far as traversal is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BoundingBox {
    /// Full collision cube; agents stand on it and cannot pass through.
    Block,
    /// No collision (air, flowers, torches, ...).
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Block {
    pub type_id: u32,
    pub name: Arc<str>,
    pub bounding_box: BoundingBox,
    pub position: VoxelPos,
}

impl Block {
    pub fn new(
        type_id: u32,
        name: impl AsRef<str>,
        bounding_box: BoundingBox,
        position: VoxelPos,
    ) -> Self {
        Self {
            type_id,
            name: Arc::from(name.as_ref()),
            bounding_box,
            position,
        }
    }

    pub fn is_solid(&self) -> bool {
        self.bounding_box == BoundingBox::Block
    }
}

/// One observed block mutation.
///
/// `old` is `None` when the previous state was unknown (e.g. the chunk was
/// not loaded yet).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BlockUpdate {
    pub old: Option<Block>,
    pub new: Block,
}

impl BlockUpdate {
    pub fn position(&self) -> VoxelPos {
        self.new.position
    }

    /// True when the change flips a voxel between passable and solid.
    ///
    /// Swaps between two solid (or two non-solid) blocks cannot change which
    /// routes are traversable.
    pub fn crosses_solid_boundary(&self) -> bool {
        let was_solid = self.old.as_ref().is_some_and(Block::is_solid);
        was_solid != self.new.is_solid()
    }
}

/// Read access to the voxel world plus its mutation stream.
pub trait BlockWorld: Send + Sync {
    /// Block at `pos`, or `None` when it is unknown/unloaded.
    fn block_at(&self, pos: VoxelPos) -> Option<Block>;

    /// Dimension tag of the world this agent is currently in, when known.
    fn dimension(&self) -> Option<String> {
        None
    }

    /// Subscribe to block mutations. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<BlockUpdate>;
}

/// Agent-centric world queries used by navigation.
pub trait AgentWorld: BlockWorld {
    /// Current position of the controlled agent.
    fn position(&self) -> Option<Vec3>;

    /// Position of a live, visible peer agent by name.
    fn peer_position(&self, name: &str) -> Option<Vec3>;
}
