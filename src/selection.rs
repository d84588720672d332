//! `SelectionOverlay` – the single inspected entity and its info panel.
//!
//! A selection is never cleared by the world: when the entity is pruned the
//! panel freezes at its last known state and is flagged `stale`. If the id
//! comes back in a later snapshot the panel resumes tracking it.

use log::debug;

use crate::entity::EntityRegistry;
use crate::types::{EntityId, Vec3};

/// Content of the on-screen entity panel.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityPanel {
    pub id: EntityId,
    pub kind: String,
    pub position: Vec3,
    pub last_tick: u64,
    pub stale: bool,
}

impl EntityPanel {
    pub fn title(&self) -> String {
        if self.stale {
            format!("{} {} (gone)", self.kind, self.id)
        } else {
            format!("{} {}", self.kind, self.id)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionOverlay {
    selected: Option<EntityId>,
    panel: Option<EntityPanel>,
    visible: bool,
}

impl SelectionOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<EntityId> {
        self.selected
    }

    pub fn panel(&self) -> Option<&EntityPanel> {
        self.panel.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Replace the selection and show the overlay.
    pub fn select(&mut self, id: EntityId, registry: &EntityRegistry) {
        debug!("Selected entity {}", id);
        self.selected = Some(id);
        self.panel = None;
        self.visible = true;
        self.refresh(registry);
    }

    /// Track the selected entity's displayed position.
    pub fn refresh(&mut self, registry: &EntityRegistry) {
        let Some(id) = self.selected else {
            return;
        };

        match registry.get(id) {
            Some(entity) => {
                self.panel = Some(EntityPanel {
                    id,
                    kind: entity.kind.clone(),
                    position: entity.displayed,
                    last_tick: entity.last_tick,
                    stale: false,
                });
            }
            None => {
                if let Some(panel) = self.panel.as_mut() {
                    if !panel.stale {
                        debug!("Selected entity {} despawned; freezing panel", id);
                    }
                    panel.stale = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::EntityDescriptor;

    fn desc(id: u64, x: f32) -> EntityDescriptor {
        EntityDescriptor {
            id: EntityId(id),
            kind: "agent".into(),
            position: Vec3::new(x, 0.0, 0.0),
        }
    }

    #[test]
    fn starts_hidden_and_empty() {
        let s = SelectionOverlay::new();
        assert!(s.selected().is_none());
        assert!(s.panel().is_none());
        assert!(!s.is_visible());
    }

    #[test]
    fn select_replaces_previous() {
        let mut r = EntityRegistry::default();
        r.merge(&[desc(1, 0.0), desc(2, 5.0)], 1);

        let mut s = SelectionOverlay::new();
        s.select(EntityId(1), &r);
        s.select(EntityId(2), &r);
        assert_eq!(s.selected(), Some(EntityId(2)));
        assert_eq!(s.panel().unwrap().position, Vec3::new(5.0, 0.0, 0.0));
        assert!(s.is_visible());
    }

    #[test]
    fn refresh_follows_displayed_position() {
        let mut r = EntityRegistry::new(0.5, 1.0);
        r.merge(&[desc(1, 0.0)], 1);
        let mut s = SelectionOverlay::new();
        s.select(EntityId(1), &r);

        r.merge(&[desc(1, 10.0)], 2);
        r.advance(1.0);
        s.refresh(&r);
        let panel = s.panel().unwrap();
        assert!((panel.position.x - 5.0).abs() < 1e-5);
        assert_eq!(panel.last_tick, 2);
    }

    #[test]
    fn pruned_selection_freezes_and_recovers() {
        let mut r = EntityRegistry::default();
        r.merge(&[desc(1, 3.0)], 1);
        let mut s = SelectionOverlay::new();
        s.select(EntityId(1), &r);

        r.merge(&[], 2);
        s.refresh(&r);
        let panel = s.panel().unwrap();
        assert!(panel.stale);
        assert_eq!(panel.position, Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(s.selected(), Some(EntityId(1)));
        assert!(panel.title().contains("gone"));

        r.merge(&[desc(1, 4.0)], 3);
        s.refresh(&r);
        assert!(!s.panel().unwrap().stale);
    }

    #[test]
    fn selecting_unknown_id_keeps_overlay_empty() {
        let r = EntityRegistry::default();
        let mut s = SelectionOverlay::new();
        s.select(EntityId(5), &r);
        assert_eq!(s.selected(), Some(EntityId(5)));
        assert!(s.panel().is_none());
    }
}
