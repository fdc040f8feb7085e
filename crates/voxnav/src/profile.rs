//! Movement profiles and the digging-bias override stack.

use core::fmt;
use std::sync::Arc;

use voxnav_core::Block;

/// Extra per-block dig permission, evaluated on top of `can_dig`.
pub type DigPredicate = Arc<dyn Fn(&Block) -> bool + Send + Sync>;

/// Blocks the minimal scaffolding profile may place.
pub const FALLBACK_SCAFFOLDING_BLOCKS: &[&str] = &[
    "dirt",
    "cobblestone",
    "cobbled_deepslate",
    "netherrack",
    "stone",
    "andesite",
    "diorite",
    "granite",
];

/// Traversal-cost policy handed to the planner.
#[derive(Clone)]
pub struct MovementProfile {
    /// Cost added for every block that must be broken.
    pub dig_cost: f64,
    pub can_dig: bool,
    pub dig_predicate: Option<DigPredicate>,
    pub allow_scaffolding: bool,
    /// Block names that may be placed as scaffolding.
    pub scaffolding_blocks: Vec<String>,
    pub allow_parkour: bool,
    pub allow_sprinting: bool,
}

impl Default for MovementProfile {
    fn default() -> Self {
        Self {
            dig_cost: 1.0,
            can_dig: true,
            dig_predicate: None,
            allow_scaffolding: false,
            scaffolding_blocks: Vec::new(),
            allow_parkour: true,
            allow_sprinting: true,
        }
    }
}

impl fmt::Debug for MovementProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MovementProfile")
            .field("dig_cost", &self.dig_cost)
            .field("can_dig", &self.can_dig)
            .field("dig_predicate", &self.dig_predicate.as_ref().map(|_| ".."))
            .field("allow_scaffolding", &self.allow_scaffolding)
            .field("scaffolding_blocks", &self.scaffolding_blocks)
            .field("allow_parkour", &self.allow_parkour)
            .field("allow_sprinting", &self.allow_sprinting)
            .finish()
    }
}

impl MovementProfile {
    /// Whether the planner may break `block`.
    pub fn may_dig(&self, block: &Block) -> bool {
        self.can_dig && self.dig_predicate.as_ref().is_none_or(|allow| allow(block))
    }

    /// This profile with scaffolding enabled over the fixed fallback
    /// allow-list.
    pub fn with_fallback_scaffolding(mut self) -> Self {
        self.allow_scaffolding = true;
        self.scaffolding_blocks = FALLBACK_SCAFFOLDING_BLOCKS
            .iter()
            .map(|name| name.to_string())
            .collect();
        self
    }
}

/// Builds full-featured scaffolding profiles.
pub trait ScaffoldingProvider: Send + Sync {
    fn create_profile(&self, aggressive: bool) -> MovementProfile;
}

/// Temporary override that makes the planner reluctant to break terrain.
#[derive(Clone)]
pub struct DiggingBias {
    pub dig_cost: f64,
    /// Forbid digging entirely.
    pub disable_dig: bool,
    /// AND-composed with the predicate already in force.
    pub predicate: Option<DigPredicate>,
}

impl Default for DiggingBias {
    fn default() -> Self {
        Self {
            dig_cost: 100.0,
            disable_dig: false,
            predicate: None,
        }
    }
}

impl fmt::Debug for DiggingBias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiggingBias")
            .field("dig_cost", &self.dig_cost)
            .field("disable_dig", &self.disable_dig)
            .field("predicate", &self.predicate.as_ref().map(|_| ".."))
            .finish()
    }
}

impl DiggingBias {
    pub(crate) fn apply(&self, profile: &mut MovementProfile) {
        profile.dig_cost = self.dig_cost;
        if self.disable_dig {
            profile.can_dig = false;
        }
        if let Some(extra) = self.predicate.clone() {
            let composed: DigPredicate = match profile.dig_predicate.take() {
                Some(previous) => Arc::new(move |block: &Block| previous(block) && extra(block)),
                None => extra,
            };
            profile.dig_predicate = Some(composed);
        }
    }
}

/// Digging state captured before a bias is applied.
#[derive(Clone)]
pub(crate) struct DiggingBiasFrame {
    dig_cost: f64,
    can_dig: bool,
    dig_predicate: Option<DigPredicate>,
}

impl DiggingBiasFrame {
    pub(crate) fn capture(profile: &MovementProfile) -> Self {
        Self {
            dig_cost: profile.dig_cost,
            can_dig: profile.can_dig,
            dig_predicate: profile.dig_predicate.clone(),
        }
    }

    pub(crate) fn restore(self, profile: &mut MovementProfile) {
        profile.dig_cost = self.dig_cost;
        profile.can_dig = self.can_dig;
        profile.dig_predicate = self.dig_predicate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxnav_core::{BoundingBox, VoxelPos};

    fn block(name: &str) -> Block {
        Block::new(1, name, BoundingBox::Block, VoxelPos::ORIGIN)
    }

    #[test]
    fn predicates_compose_with_and() {
        let mut profile = MovementProfile::default();
        DiggingBias {
            predicate: Some(Arc::new(|b: &Block| &*b.name != "glass")),
            ..DiggingBias::default()
        }
        .apply(&mut profile);
        DiggingBias {
            predicate: Some(Arc::new(|b: &Block| &*b.name != "chest")),
            ..DiggingBias::default()
        }
        .apply(&mut profile);

        assert!(profile.may_dig(&block("dirt")));
        assert!(!profile.may_dig(&block("glass")));
        assert!(!profile.may_dig(&block("chest")));
        assert_eq!(profile.dig_cost, 100.0);
    }

    #[test]
    fn frame_restores_captured_state() {
        let mut profile = MovementProfile::default();
        let frame = DiggingBiasFrame::capture(&profile);
        DiggingBias {
            disable_dig: true,
            dig_cost: 250.0,
            ..DiggingBias::default()
        }
        .apply(&mut profile);
        assert!(!profile.may_dig(&block("dirt")));

        frame.restore(&mut profile);
        assert!(profile.can_dig);
        assert_eq!(profile.dig_cost, 1.0);
        assert!(profile.dig_predicate.is_none());
    }

    #[test]
    fn fallback_scaffolding_uses_fixed_allow_list() {
        let profile = MovementProfile::default().with_fallback_scaffolding();
        assert!(profile.allow_scaffolding);
        assert!(profile.scaffolding_blocks.iter().any(|b| b == "cobblestone"));
        assert_eq!(profile.scaffolding_blocks.len(), FALLBACK_SCAFFOLDING_BLOCKS.len());
    }
}
