use voxnav_core::{Block, BlockUpdate, BoundingBox, VoxelPos};

fn block(type_id: u32, name: &str, bounding_box: BoundingBox) -> Block {
    Block::new(type_id, name, bounding_box, VoxelPos::new(3, 64, -2))
}

#[test]
fn stone_to_air_crosses_solid_boundary() {
    let update = BlockUpdate {
        old: Some(block(1, "stone", BoundingBox::Block)),
        new: block(0, "air", BoundingBox::Empty),
    };
    assert!(update.crosses_solid_boundary());
    assert_eq!(update.position(), VoxelPos::new(3, 64, -2));
}

#[test]
fn cosmetic_swaps_do_not_cross_solid_boundary() {
    let solid_swap = BlockUpdate {
        old: Some(block(1, "stone", BoundingBox::Block)),
        new: block(4, "cobblestone", BoundingBox::Block),
    };
    let flower = BlockUpdate {
        old: Some(block(0, "air", BoundingBox::Empty)),
        new: block(38, "poppy", BoundingBox::Empty),
    };
    assert!(!solid_swap.crosses_solid_boundary());
    assert!(!flower.crosses_solid_boundary());
}

#[test]
fn unknown_previous_state_counts_as_non_solid() {
    let placed = BlockUpdate {
        old: None,
        new: block(1, "stone", BoundingBox::Block),
    };
    assert!(placed.crosses_solid_boundary());
}
