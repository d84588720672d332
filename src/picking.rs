//! Pointer picking: resolve a screen coordinate to the nearest live entity.
//!
//! The ray-casting primitive belongs to the render engine and is reached
//! through [`RayCaster`]; this module only chooses among the hits.

use crate::entity::{EntityRegistry, EntityState};
use crate::types::{EntityId, Vec3};

/// Engine-side ray casting against one entity's visual representation.
pub trait RayCaster {
    fn camera_position(&self) -> Vec3;

    /// World-space hit point of the ray through `(screen_x, screen_y)`, if any.
    fn raycast_entity(&self, screen_x: f32, screen_y: f32, entity: &EntityState) -> Option<Vec3>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub id: EntityId,
    pub point: Vec3,
    /// Distance from the camera to `point`.
    pub distance: f32,
}

/// Nearest intersected entity, or `None` on a miss.
///
/// Exact distance ties go to the lowest id: the registry iterates in
/// ascending id order and only a strictly closer hit replaces the best.
pub fn pick_closest_entity(
    registry: &EntityRegistry,
    caster: &impl RayCaster,
    screen_x: f32,
    screen_y: f32,
) -> Option<PickHit> {
    let camera = caster.camera_position();
    let mut best: Option<PickHit> = None;

    for entity in registry.iter() {
        let Some(point) = caster.raycast_entity(screen_x, screen_y, entity) else {
            continue;
        };
        let distance = camera.distance(point);
        if !distance.is_finite() {
            continue;
        }
        if best.map_or(true, |b| distance < b.distance) {
            best = Some(PickHit {
                id: entity.id,
                point,
                distance,
            });
        }
    }

    best
}
