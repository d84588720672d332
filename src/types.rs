//! Core viewer types shared across all modules.

use serde::{Deserialize, Serialize};

pub use glam::Vec3;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Stable entity identifier assigned by the simulation source.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// View modes
// ---------------------------------------------------------------------------

/// Which of the three mutually exclusive layers is on screen.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Base terrain.
    #[default]
    Client,
    /// Per-tile counts overlay.
    Counts,
    /// Per-tile values overlay.
    Values,
}

impl ViewMode {
    /// Fixed cycle order: Client → Counts → Values → Client.
    pub fn next(self) -> Self {
        match self {
            ViewMode::Client => ViewMode::Counts,
            ViewMode::Counts => ViewMode::Values,
            ViewMode::Values => ViewMode::Client,
        }
    }

    /// True for the two scalar overlays.
    pub fn is_overlay(self) -> bool {
        !matches!(self, ViewMode::Client)
    }
}

impl std::fmt::Display for ViewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ViewMode::Client => "client",
            ViewMode::Counts => "counts",
            ViewMode::Values => "values",
        };
        f.write_str(name)
    }
}

/// How the local user relates to the world.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientMode {
    /// Free camera, inspect only.
    #[default]
    Admin,
    /// Camera follows the last picked entity.
    Spectator,
    /// Clicks also steer the controls toward the clicked terrain point.
    Player,
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerStats {
    pub frames: u64,
    pub snapshots_applied: u64,
    /// Queued snapshots discarded because a newer one arrived before the drain.
    pub snapshots_dropped: u64,
    pub decode_failures: u64,
    /// Snapshots that decoded but could not be applied (e.g. grid resized).
    pub snapshots_rejected: u64,
    pub entity_descriptors_dropped: u64,
}
