use crate::geometry::GeometryKernel;
use crate::interface::frame::{CarState, PlayerState};

/// A car that passed the radius check, with its 3D distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedEntity<'a> {
    pub slot: usize,
    pub entity: &'a CarState,
    pub distance: f64,
}

/// Keeps cars within `radius_meters` (3D) of the player, nearest first.
///
/// Equal distances keep their input order.
pub fn filter_and_sort<'a>(
    entities: &'a [CarState],
    player: &PlayerState,
    radius_meters: f64,
) -> Vec<RankedEntity<'a>> {
    let mut ranked: Vec<RankedEntity<'a>> = entities
        .iter()
        .enumerate()
        .map(|(slot, entity)| RankedEntity {
            slot,
            entity,
            distance: GeometryKernel::distance_3d(&player.position, &entity.position),
        })
        .filter(|candidate| candidate.distance <= radius_meters)
        .collect();
    ranked.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    ranked
}
