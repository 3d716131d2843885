//! Linear teleporter layout.

use crate::types::{PlacementSlot, SearchResultSet, Vec3, WorldRecord};

/// Teleporters face back towards the search button.
pub const TELEPORTER_ROTATION: Vec3 = Vec3::new(0.0, 180.0, 0.0);

pub const TELEPORTER_SCALE: Vec3 = Vec3::splat(1.0);

/// Slot for the record at `index`: one `spacing` step further along x than
/// the previous one, starting one step past `base_offset`.
pub fn slot_for(index: usize, spacing: f32, base_offset: f32) -> PlacementSlot {
    PlacementSlot {
        index,
        position: Vec3::new(base_offset + (index + 1) as f32 * spacing, 0.0, 0.0),
        rotation: TELEPORTER_ROTATION,
        scale: TELEPORTER_SCALE,
    }
}

/// Pair every record with its slot, in result-set order.
pub fn plan_layout(
    results: &SearchResultSet,
    spacing: f32,
    base_offset: f32,
) -> Vec<(WorldRecord, PlacementSlot)> {
    results
        .iter()
        .enumerate()
        .map(|(index, record)| (record.clone(), slot_for(index, spacing, base_offset)))
        .collect()
}
