//! Tileview
//!
//! A real-time viewer for a remotely simulated tile world: terrain, mobile
//! entities and two per-tile scalar overlays, streamed as JSON snapshots.
//!
//! ## Architecture
//!
//! ```text
//! transport ──▶ InboxSender ──▶ Inbox                 (inbox.rs)
//!                                 │
//! ViewerClient::frame  (client.rs)│  drain newest, decode (protocol.rs)
//!   ├── WorldState      (world.rs) ← terrain + overlay layers (terrain.rs)
//!   ├── EntityRegistry  (entity.rs) ← merge + smoothing
//!   ├── ViewController  (view.rs)
//!   └── SelectionOverlay (selection.rs)
//!
//! ViewerClient::handle_input (input.rs)
//!   └── pick_closest_entity (picking.rs) ─▶ RenderEngine (engine.rs)
//! ```
//!
//! Rendering, camera and ray casting live behind [`engine::RenderEngine`];
//! [`engine::HeadlessEngine`] implements it without a GPU.

pub mod client;
pub mod config;
pub mod engine;
pub mod entity;
pub mod feed;
pub mod inbox;
pub mod input;
pub mod picking;
pub mod protocol;
pub mod selection;
pub mod terrain;
pub mod transform;
pub mod types;
pub mod view;
pub mod world;

pub use client::{FrameOutcome, InputOutcome, ViewerClient};
pub use config::ViewerConfig;
pub use entity::{EntityRegistry, EntityState};
pub use inbox::{Inbox, InboxSender};
pub use protocol::{DecodeError, Snapshot, SnapshotDecoder};
pub use types::{ClientMode, EntityId, Vec3, ViewMode, ViewerStats};
pub use world::WorldState;
