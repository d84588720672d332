//! Render engine seam and a headless implementation.
//!
//! The viewer core never draws; it hands a [`Frame`] to whatever implements
//! [`RenderEngine`]. `HeadlessEngine` is a dependency-free stand-in with a
//! pinhole camera: it answers ray casts geometrically (entities are spheres,
//! terrain is the `y = 0` plane) and records what it was asked to draw.

use std::f32::consts::FRAC_PI_3;

use log::trace;

use crate::config::ViewerConfig;
use crate::entity::{EntityRegistry, EntityState};
use crate::picking::RayCaster;
use crate::selection::SelectionOverlay;
use crate::transform::{rotate_around_world_axis, Transform};
use crate::types::{EntityId, Vec3, ViewMode};
use crate::world::WorldState;

/// Everything the engine may read while drawing one frame.
pub struct Frame<'a> {
    pub world: &'a WorldState,
    pub entities: &'a EntityRegistry,
    pub view: ViewMode,
    pub selection: &'a SelectionOverlay,
}

pub trait RenderEngine: RayCaster {
    /// Advance engine-owned animation (camera controls etc.).
    fn update(&mut self, delta: f32);

    /// Hit point of the pointer ray on the terrain surface.
    fn raycast_terrain(&self, screen_x: f32, screen_y: f32) -> Option<Vec3>;

    fn follow(&mut self, id: EntityId);

    fn set_control_target(&mut self, point: Vec3);

    /// Frame the camera over a freshly initialized `rows` x `cols` grid.
    fn center_on_grid(&mut self, rows: usize, cols: usize);

    fn resize(&mut self, width: u32, height: u32);

    fn draw(&mut self, frame: &Frame<'_>);
}

// ---------------------------------------------------------------------------
// Headless engine
// ---------------------------------------------------------------------------

/// What the last [`RenderEngine::draw`] call saw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawSummary {
    pub view: ViewMode,
    pub entities: usize,
    pub selected: Option<EntityId>,
    pub visible_layers: Vec<ViewMode>,
}

#[derive(Debug, Clone)]
pub struct HeadlessEngine {
    pub camera: Transform,
    tile_size: f32,
    entity_radius: f32,
    camera_height: f32,
    viewport: (u32, u32),
    fov_y: f32,
    orbit_rate: f32,
    orbit_centre: Vec3,
    following: Option<EntityId>,
    control_target: Option<Vec3>,
    frames_drawn: u64,
    last_draw: Option<DrawSummary>,
}

impl HeadlessEngine {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            camera: Transform::looking_down(Vec3::new(0.0, config.camera_height, 0.0)),
            tile_size: config.tile_size,
            entity_radius: config.entity_radius,
            camera_height: config.camera_height,
            viewport: (config.width.max(1), config.height.max(1)),
            fov_y: FRAC_PI_3,
            orbit_rate: config.orbit_rate,
            orbit_centre: Vec3::ZERO,
            following: None,
            control_target: None,
            frames_drawn: 0,
            last_draw: None,
        }
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn following(&self) -> Option<EntityId> {
        self.following
    }

    pub fn control_target(&self) -> Option<Vec3> {
        self.control_target
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn last_draw(&self) -> Option<&DrawSummary> {
        self.last_draw.as_ref()
    }

    /// Tile-space position to world units.
    pub fn to_world(&self, tiles: Vec3) -> Vec3 {
        tiles * self.tile_size
    }

    fn half_extents(&self) -> (f32, f32) {
        let tan = (self.fov_y * 0.5).tan();
        let aspect = self.viewport.0 as f32 / self.viewport.1 as f32;
        (tan * aspect, tan)
    }

    /// Origin and unit direction of the ray through a viewport pixel.
    pub fn screen_ray(&self, screen_x: f32, screen_y: f32) -> (Vec3, Vec3) {
        let (w, h) = (self.viewport.0 as f32, self.viewport.1 as f32);
        let ndc_x = 2.0 * screen_x / w - 1.0;
        let ndc_y = 1.0 - 2.0 * screen_y / h;
        let (half_w, half_h) = self.half_extents();
        let dir = self.camera.forward()
            + self.camera.right() * (ndc_x * half_w)
            + self.camera.up() * (ndc_y * half_h);
        (self.camera.position, dir.normalize())
    }

    /// Viewport pixel of a world-space point in front of the camera.
    pub fn project(&self, point: Vec3) -> Option<(f32, f32)> {
        let v = point - self.camera.position;
        let depth = v.dot(self.camera.forward());
        if depth <= f32::EPSILON {
            return None;
        }
        let (half_w, half_h) = self.half_extents();
        let ndc_x = v.dot(self.camera.right()) / (depth * half_w);
        let ndc_y = v.dot(self.camera.up()) / (depth * half_h);
        let (w, h) = (self.viewport.0 as f32, self.viewport.1 as f32);
        Some(((ndc_x + 1.0) * 0.5 * w, (1.0 - ndc_y) * 0.5 * h))
    }
}

fn ray_sphere(origin: Vec3, dir: Vec3, centre: Vec3, radius: f32) -> Option<Vec3> {
    let oc = origin - centre;
    let b = oc.dot(dir);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let root = disc.sqrt();
    let t = if -b - root >= 0.0 { -b - root } else { -b + root };
    (t >= 0.0).then(|| origin + dir * t)
}

fn ray_ground(origin: Vec3, dir: Vec3) -> Option<Vec3> {
    let denom = Vec3::Y.dot(dir);
    if denom.abs() < 1e-4 {
        return None;
    }
    let t = -origin.y / denom;
    (t >= 0.0).then(|| origin + dir * t)
}

impl RayCaster for HeadlessEngine {
    fn camera_position(&self) -> Vec3 {
        self.camera.position
    }

    fn raycast_entity(&self, screen_x: f32, screen_y: f32, entity: &EntityState) -> Option<Vec3> {
        let (origin, dir) = self.screen_ray(screen_x, screen_y);
        ray_sphere(
            origin,
            dir,
            self.to_world(entity.displayed),
            self.entity_radius * self.tile_size,
        )
    }
}

impl RenderEngine for HeadlessEngine {
    fn update(&mut self, delta: f32) {
        if self.orbit_rate != 0.0 && delta.is_finite() {
            self.camera = rotate_around_world_axis(
                self.camera,
                self.orbit_centre,
                Vec3::Y,
                self.orbit_rate * delta,
            );
        }
    }

    fn raycast_terrain(&self, screen_x: f32, screen_y: f32) -> Option<Vec3> {
        let (origin, dir) = self.screen_ray(screen_x, screen_y);
        ray_ground(origin, dir)
    }

    fn follow(&mut self, id: EntityId) {
        self.following = Some(id);
    }

    fn set_control_target(&mut self, point: Vec3) {
        self.control_target = Some(point);
    }

    fn center_on_grid(&mut self, rows: usize, cols: usize) {
        let centre = Vec3::new(
            cols as f32 * self.tile_size * 0.5,
            0.0,
            rows as f32 * self.tile_size * 0.5,
        );
        self.orbit_centre = centre;
        self.camera = Transform::looking_down(centre + Vec3::Y * self.camera_height);
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width.max(1), height.max(1));
    }

    fn draw(&mut self, frame: &Frame<'_>) {
        if let Some(entity) = self.following.and_then(|id| frame.entities.get(id)) {
            let target = self.to_world(entity.displayed);
            self.camera.position.x = target.x;
            self.camera.position.z = target.z;
        }

        let summary = DrawSummary {
            view: frame.view,
            entities: frame.entities.len(),
            selected: frame.selection.selected(),
            visible_layers: frame
                .world
                .layers()
                .map(|l| l.visible_views())
                .unwrap_or_default(),
        };
        trace!("draw #{}: {:?}", self.frames_drawn, summary);
        self.frames_drawn += 1;
        self.last_draw = Some(summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::EntityDescriptor;

    fn engine() -> HeadlessEngine {
        let cfg = ViewerConfig {
            tile_size: 1.0,
            entity_radius: 0.5,
            camera_height: 100.0,
            width: 800,
            height: 600,
            ..ViewerConfig::default()
        };
        HeadlessEngine::new(&cfg)
    }

    fn entity(id: u64, position: Vec3) -> EntityState {
        let mut r = EntityRegistry::default();
        r.merge(
            &[EntityDescriptor {
                id: EntityId(id),
                kind: "agent".into(),
                position,
            }],
            1,
        );
        r.get(EntityId(id)).cloned().unwrap()
    }

    #[test]
    fn centre_ray_points_forward() {
        let e = engine();
        let (origin, dir) = e.screen_ray(400.0, 300.0);
        assert_eq!(origin, Vec3::new(0.0, 100.0, 0.0));
        assert!(dir.distance(Vec3::NEG_Y) < 1e-5);
    }

    #[test]
    fn centre_click_hits_entity_below() {
        let e = engine();
        let hit = e
            .raycast_entity(400.0, 300.0, &entity(1, Vec3::ZERO))
            .unwrap();
        assert!((e.camera_position().distance(hit) - 99.5).abs() < 1e-3);
    }

    #[test]
    fn off_axis_click_misses() {
        let e = engine();
        assert!(e.raycast_entity(10.0, 10.0, &entity(1, Vec3::ZERO)).is_none());
    }

    #[test]
    fn project_inverts_screen_ray() {
        let e = engine();
        let p = Vec3::new(12.0, 0.0, -7.0);
        let (sx, sy) = e.project(p).unwrap();
        let hit = e.raycast_terrain(sx, sy).unwrap();
        assert!(hit.distance(p) < 1e-2);
    }

    #[test]
    fn centering_moves_camera_over_grid() {
        let mut e = engine();
        e.center_on_grid(10, 20);
        assert_eq!(e.camera_position(), Vec3::new(10.0, 100.0, 5.0));
    }

    #[test]
    fn orbit_keeps_height_and_radius() {
        let cfg = ViewerConfig {
            tile_size: 1.0,
            orbit_rate: 1.0,
            camera_height: 50.0,
            ..ViewerConfig::default()
        };
        let mut e = HeadlessEngine::new(&cfg);
        e.center_on_grid(4, 4);
        e.camera.position.x += 10.0;
        e.update(0.5);

        let centre = Vec3::new(2.0, 50.0, 2.0);
        assert!((e.camera_position().y - 50.0).abs() < 1e-4);
        assert!((e.camera_position().distance(centre) - 10.0).abs() < 1e-3);
        assert!((e.camera.forward() - Vec3::NEG_Y).length() < 1e-4);
    }
}
