//! `EntityRegistry` – the live entity set and its render-side smoothing.
//!
//! Each entity tracks two positions:
//!
//! * `target` – last authoritative position received in a snapshot.
//! * `displayed` – what the renderer draws; eased toward `target` every frame
//!   by [`EntityRegistry::advance`], whether or not a snapshot arrived.

use std::collections::BTreeMap;

use log::debug;

use crate::protocol::EntityDescriptor;
use crate::types::{EntityId, Vec3};

/// Below this distance the displayed position snaps onto the target.
const SNAP_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, PartialEq)]
pub struct EntityState {
    pub id: EntityId,
    pub kind: String,
    pub target: Vec3,
    pub displayed: Vec3,
    /// Snapshot tick of the last merge that carried this entity.
    pub last_tick: u64,
}

impl EntityState {
    fn spawn(descriptor: &EntityDescriptor, tick: u64) -> Self {
        Self {
            id: descriptor.id,
            kind: descriptor.kind.clone(),
            target: descriptor.position,
            displayed: descriptor.position,
            last_tick: tick,
        }
    }

    pub fn distance_to_target(&self) -> f32 {
        self.displayed.distance(self.target)
    }
}

/// Summary of one [`EntityRegistry::merge`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub spawned: Vec<EntityId>,
    pub despawned: Vec<EntityId>,
    pub updated: usize,
}

/// Live entities keyed by id, iterated in ascending id order.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRegistry {
    entities: BTreeMap<EntityId, EntityState>,
    smoothing_rate: f32,
    reference_frame_secs: f32,
}

impl EntityRegistry {
    /// `smoothing_rate` is the fraction of the remaining distance covered in
    /// one `reference_frame_secs` frame; it is clamped into `[0, 1)`.
    pub fn new(smoothing_rate: f32, reference_frame_secs: f32) -> Self {
        let smoothing_rate = if smoothing_rate.is_finite() {
            smoothing_rate.clamp(0.0, 0.999)
        } else {
            0.0
        };
        let reference_frame_secs = if reference_frame_secs.is_finite() && reference_frame_secs > 0.0
        {
            reference_frame_secs
        } else {
            1.0 / 60.0
        };
        Self {
            entities: BTreeMap::new(),
            smoothing_rate,
            reference_frame_secs,
        }
    }

    // ------------------------------------------------------------------
    // Merge
    // ------------------------------------------------------------------

    /// Make the registry hold exactly the ids in `descriptors`.
    ///
    /// Existing entities get a new target (their displayed position keeps
    /// easing), new ones spawn at their target, absent ones are removed.
    pub fn merge(&mut self, descriptors: &[EntityDescriptor], tick: u64) -> MergeReport {
        let mut report = MergeReport::default();

        let mut incoming: BTreeMap<EntityId, &EntityDescriptor> = BTreeMap::new();
        for d in descriptors {
            incoming.insert(d.id, d);
        }

        self.entities.retain(|id, _| {
            let keep = incoming.contains_key(id);
            if !keep {
                report.despawned.push(*id);
            }
            keep
        });

        for (id, descriptor) in incoming {
            match self.entities.get_mut(&id) {
                Some(entity) => {
                    entity.target = descriptor.position;
                    entity.last_tick = tick;
                    if entity.kind != descriptor.kind {
                        entity.kind = descriptor.kind.clone();
                    }
                    report.updated += 1;
                }
                None => {
                    self.entities
                        .insert(id, EntityState::spawn(descriptor, tick));
                    report.spawned.push(id);
                }
            }
        }

        if !report.spawned.is_empty() || !report.despawned.is_empty() {
            debug!(
                "Entity merge @{}: +{} -{} ~{}",
                tick,
                report.spawned.len(),
                report.despawned.len(),
                report.updated
            );
        }
        report
    }

    // ------------------------------------------------------------------
    // Interpolation
    // ------------------------------------------------------------------

    /// Fraction of the remaining distance covered over `delta` seconds.
    ///
    /// Compounds `smoothing_rate` per reference frame so the visual speed does
    /// not depend on the actual frame rate. Always in `[0, 1)`.
    pub fn blend_factor(&self, delta: f32) -> f32 {
        if !delta.is_finite() || delta <= 0.0 {
            return 0.0;
        }
        let frames = delta / self.reference_frame_secs;
        1.0 - (1.0 - self.smoothing_rate).powf(frames)
    }

    /// Ease every displayed position toward its target.
    pub fn advance(&mut self, delta: f32) {
        let alpha = self.blend_factor(delta);
        if alpha <= 0.0 {
            return;
        }
        for entity in self.entities.values_mut() {
            let next = entity.displayed.lerp(entity.target, alpha);
            entity.displayed = if next.distance(entity.target) < SNAP_EPSILON {
                entity.target
            } else {
                next
            };
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn get(&self, id: EntityId) -> Option<&EntityState> {
        self.entities.get(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Entities in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &EntityState> {
        self.entities.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new(0.2, 1.0 / 60.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(id: u64, x: f32, z: f32) -> EntityDescriptor {
        EntityDescriptor {
            id: EntityId(id),
            kind: "agent".into(),
            position: Vec3::new(x, 0.0, z),
        }
    }

    #[test]
    fn merge_spawns_at_target() {
        let mut r = EntityRegistry::default();
        let report = r.merge(&[desc(1, 3.0, 4.0)], 1);
        assert_eq!(report.spawned, vec![EntityId(1)]);

        let e = r.get(EntityId(1)).unwrap();
        assert_eq!(e.displayed, e.target);
        assert_eq!(e.last_tick, 1);
    }

    #[test]
    fn merge_updates_target_but_not_displayed() {
        let mut r = EntityRegistry::default();
        r.merge(&[desc(1, 0.0, 0.0)], 1);
        let report = r.merge(&[desc(1, 10.0, 0.0)], 2);
        assert_eq!(report.updated, 1);

        let e = r.get(EntityId(1)).unwrap();
        assert_eq!(e.target, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(e.displayed, Vec3::ZERO);
        assert_eq!(e.last_tick, 2);
    }

    #[test]
    fn merge_prunes_absent_ids() {
        let mut r = EntityRegistry::default();
        r.merge(&[desc(1, 0.0, 0.0), desc(2, 0.0, 0.0)], 1);
        let report = r.merge(&[desc(2, 1.0, 1.0), desc(3, 0.0, 0.0)], 2);

        assert_eq!(report.despawned, vec![EntityId(1)]);
        assert_eq!(report.spawned, vec![EntityId(3)]);
        assert_eq!(r.ids().collect::<Vec<_>>(), vec![EntityId(2), EntityId(3)]);
    }

    #[test]
    fn merge_updates_kind() {
        let mut r = EntityRegistry::default();
        r.merge(&[desc(1, 0.0, 0.0)], 1);
        let mut d = desc(1, 0.0, 0.0);
        d.kind = "npc".into();
        r.merge(&[d], 2);
        assert_eq!(r.get(EntityId(1)).unwrap().kind, "npc");
    }

    #[test]
    fn advance_moves_fraction_of_distance() {
        let mut r = EntityRegistry::new(0.5, 1.0);
        r.merge(&[desc(1, 0.0, 0.0)], 1);
        r.merge(&[desc(1, 8.0, 0.0)], 2);

        r.advance(1.0);
        assert!((r.get(EntityId(1)).unwrap().displayed.x - 4.0).abs() < 1e-5);
        r.advance(1.0);
        assert!((r.get(EntityId(1)).unwrap().displayed.x - 6.0).abs() < 1e-5);
    }

    #[test]
    fn blend_factor_is_frame_rate_independent() {
        let r = EntityRegistry::new(0.2, 1.0 / 60.0);
        let one_big = r.blend_factor(2.0 / 60.0);
        let small = r.blend_factor(1.0 / 60.0);
        let two_small = 1.0 - (1.0 - small) * (1.0 - small);
        assert!((one_big - two_small).abs() < 1e-5);
    }

    #[test]
    fn advance_ignores_non_positive_delta() {
        let mut r = EntityRegistry::default();
        r.merge(&[desc(1, 0.0, 0.0)], 1);
        r.merge(&[desc(1, 5.0, 0.0)], 2);
        let before = r.clone();
        r.advance(0.0);
        r.advance(-1.0);
        r.advance(f32::NAN);
        assert_eq!(r, before);
    }

    #[test]
    fn advance_snaps_when_close() {
        let mut r = EntityRegistry::new(0.9, 1.0 / 60.0);
        r.merge(&[desc(1, 0.0, 0.0)], 1);
        r.merge(&[desc(1, 1.0, 0.0)], 2);
        for _ in 0..200 {
            r.advance(1.0 / 60.0);
        }
        let e = r.get(EntityId(1)).unwrap();
        assert_eq!(e.displayed, e.target);
    }

    #[test]
    fn rate_is_clamped_below_one() {
        let r = EntityRegistry::new(5.0, 1.0 / 60.0);
        assert!(r.blend_factor(1.0 / 60.0) < 1.0);
    }
}
