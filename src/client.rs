//! `ViewerClient` – the application context and per-frame loop.
//!
//! ## Usage
//!
//! ```no_run
//! use tileview::{config::ViewerConfig, engine::HeadlessEngine, ViewerClient};
//!
//! let config = ViewerConfig::default();
//! let mut engine = HeadlessEngine::new(&config);
//! let mut client = ViewerClient::new(config);
//!
//! // Hand this to the transport; it may live on another thread.
//! let inbox = client.sender();
//! inbox.push(r#"{"map": [[0]], "ent": [], "values": [[0]], "counts": [[0]]}"#);
//!
//! // Once per display refresh:
//! client.frame(&mut engine, 1.0 / 60.0);
//! ```
//!
//! ## Frame order
//!
//! ```text
//! engine.update(dt) → entities.advance(dt) → inbox.drain()
//!   → initialize | apply_terrain + merge → apply_overlay(active view)
//!   → selection.refresh() → engine.draw()
//! ```
//!
//! Interpolation always reads the state left by the previous frame; a
//! snapshot drained this frame is only visible from the next `advance` on.

use std::time::Instant;

use log::{debug, warn};

use crate::config::ViewerConfig;
use crate::engine::{Frame, RenderEngine};
use crate::entity::EntityRegistry;
use crate::inbox::{Inbox, InboxSender};
use crate::input::{InputEvent, KeyAction, KeyBindings, KeyCode};
use crate::picking::pick_closest_entity;
use crate::protocol::{Snapshot, SnapshotDecoder};
use crate::selection::SelectionOverlay;
use crate::types::{ClientMode, EntityId, ViewMode, ViewerStats};
use crate::view::ViewController;
use crate::world::WorldState;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// What the snapshot step of one frame did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Inbox was empty.
    Idle,
    /// A snapshot was applied; `discarded` older ones were dropped.
    Applied { discarded: usize },
    /// The newest message did not decode; nothing changed.
    DecodeFailed { discarded: usize },
    /// The snapshot decoded but did not fit the world; nothing changed.
    Rejected { discarded: usize },
}

/// What one input event did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputOutcome {
    Picked(EntityId),
    Missed,
    ViewChanged(ViewMode),
    Resized { width: u32, height: u32 },
    Ignored,
}

// ---------------------------------------------------------------------------
// ViewerClient
// ---------------------------------------------------------------------------

pub struct ViewerClient {
    config: ViewerConfig,
    bindings: KeyBindings,
    inbox: Inbox,
    decoder: SnapshotDecoder,
    world: WorldState,
    entities: EntityRegistry,
    view: ViewController,
    selection: SelectionOverlay,
    stats: ViewerStats,
    /// Number of snapshots applied so far.
    tick: u64,
    viewport: (u32, u32),
    last_frame: Option<Instant>,
}

impl ViewerClient {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            bindings: KeyBindings {
                toggle: KeyCode(config.toggle_key),
                cancel: KeyCode(config.cancel_key),
            },
            inbox: Inbox::new(),
            decoder: SnapshotDecoder::new(),
            world: WorldState::new(),
            entities: EntityRegistry::new(
                config.clamped_smoothing_rate(),
                config.reference_frame_secs,
            ),
            view: ViewController::new(config.initial_view),
            selection: SelectionOverlay::new(),
            stats: ViewerStats::default(),
            tick: 0,
            viewport: (config.width, config.height),
            last_frame: None,
            config,
        }
    }

    /// Producer handle for the transport layer.
    pub fn sender(&self) -> InboxSender {
        self.inbox.sender()
    }

    // -----------------------------------------------------------------------
    // Frame loop
    // -----------------------------------------------------------------------

    /// Run one frame, measuring the elapsed time since the previous call.
    pub fn tick(&mut self, engine: &mut impl RenderEngine, now: Instant) -> FrameOutcome {
        let delta = self
            .last_frame
            .map(|last| now.saturating_duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last_frame = Some(now);
        self.frame(engine, delta)
    }

    /// Run one frame with an explicit `delta` in seconds.
    pub fn frame(&mut self, engine: &mut impl RenderEngine, delta: f32) -> FrameOutcome {
        self.stats.frames += 1;

        engine.update(delta);
        self.entities.advance(delta);

        let outcome = match self.inbox.drain(&self.decoder) {
            None => FrameOutcome::Idle,
            Some(drain) => {
                self.stats.snapshots_dropped += drain.discarded as u64;
                match drain.snapshot {
                    Ok(snapshot) => self.apply_snapshot(snapshot, drain.discarded, engine),
                    Err(e) => {
                        warn!("Skipping frame merge: {}", e);
                        self.stats.decode_failures += 1;
                        FrameOutcome::DecodeFailed {
                            discarded: drain.discarded,
                        }
                    }
                }
            }
        };

        self.selection.refresh(&self.entities);
        engine.draw(&Frame {
            world: &self.world,
            entities: &self.entities,
            view: self.view.current(),
            selection: &self.selection,
        });

        outcome
    }

    fn apply_snapshot(
        &mut self,
        snapshot: Snapshot,
        discarded: usize,
        engine: &mut impl RenderEngine,
    ) -> FrameOutcome {
        let view = self.view.current();

        if self.world.is_initialized() {
            if let Err(e) = self.world.apply_terrain(&snapshot) {
                warn!("Rejecting snapshot: {}", e);
                self.stats.snapshots_rejected += 1;
                return FrameOutcome::Rejected { discarded };
            }
        } else {
            if let Err(e) = self.world.initialize(&snapshot, view, self.viewport) {
                warn!("Rejecting first snapshot: {}", e);
                self.stats.snapshots_rejected += 1;
                return FrameOutcome::Rejected { discarded };
            }
            let (rows, cols) = snapshot.dims();
            engine.center_on_grid(rows, cols);
        }

        self.tick += 1;
        self.entities.merge(&snapshot.entities, self.tick);

        if view.is_overlay() {
            if let Err(e) = self.world.apply_overlay(view, &snapshot) {
                warn!("Overlay refresh failed: {}", e);
            }
        }

        self.stats.snapshots_applied += 1;
        self.stats.entity_descriptors_dropped += snapshot.dropped_entities as u64;
        FrameOutcome::Applied { discarded }
    }

    // -----------------------------------------------------------------------
    // Input dispatch
    // -----------------------------------------------------------------------

    pub fn handle_input(
        &mut self,
        event: InputEvent,
        engine: &mut impl RenderEngine,
    ) -> InputOutcome {
        match event {
            InputEvent::PointerDown { x, y } => self.on_pointer_down(x, y, engine),
            InputEvent::KeyPress(key) => match self.bindings.action(key) {
                KeyAction::ToggleView => InputOutcome::ViewChanged(self.view.toggle(&mut self.world)),
                KeyAction::Cancel => {
                    debug!("Cancel key pressed (reserved)");
                    InputOutcome::Ignored
                }
                KeyAction::Unbound => InputOutcome::Ignored,
            },
            InputEvent::Resize { width, height } => {
                self.viewport = (width, height);
                engine.resize(width, height);
                self.world.resize(width, height);
                InputOutcome::Resized { width, height }
            }
        }
    }

    fn on_pointer_down(&mut self, x: f32, y: f32, engine: &mut impl RenderEngine) -> InputOutcome {
        let picked = pick_closest_entity(&self.entities, &*engine, x, y).map(|hit| hit.id);

        if let Some(id) = picked {
            self.selection.select(id, &self.entities);
            if self.config.mode == ClientMode::Spectator {
                engine.follow(id);
            }
        }

        if self.config.mode == ClientMode::Player {
            if let Some(point) = engine.raycast_terrain(x, y) {
                engine.set_control_target(point);
            }
        }

        picked.map_or(InputOutcome::Missed, InputOutcome::Picked)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn entities(&self) -> &EntityRegistry {
        &self.entities
    }

    pub fn view(&self) -> ViewMode {
        self.view.current()
    }

    pub fn selection(&self) -> &SelectionOverlay {
        &self.selection
    }

    pub fn stats(&self) -> &ViewerStats {
        &self.stats
    }

    /// Snapshots applied so far.
    pub fn snapshot_tick(&self) -> u64 {
        self.tick
    }

    pub fn pending(&self) -> usize {
        self.inbox.len()
    }
}
