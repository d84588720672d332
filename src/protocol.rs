//! Inbound snapshot wire protocol and its decoder.
//!
//! Every message pushed by the simulation source is one JSON object:
//!
//! ```json
//! {
//!   "map":    [[0, 1], [2, 1]],
//!   "ent":    [{"id": 7, "kind": "agent", "pos": [1.0, 0.5]}],
//!   "values": [[0.1, 0.2], [0.0, 1.0]],
//!   "counts": [[0, 3], [1, 0]]
//! }
//! ```
//!
//! ## Rules
//!
//! 1. `map`, `values` and `counts` are rectangular and share one shape.
//! 2. A broken entity descriptor is dropped on its own; the snapshot survives.
//! 3. Positions are in tile units: `[x, z]` (ground level) or `[x, y, z]`.
//! 4. Unknown top-level keys are ignored.

use log::warn;
use serde::Deserialize;
use thiserror::Error;

use crate::terrain::{Grid, GridError};
use crate::types::{EntityId, Vec3};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// The whole message is unusable; the frame skips its merge step.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed snapshot payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid `{layer}` grid: {source}")]
    Grid {
        layer: &'static str,
        #[source]
        source: GridError,
    },
    #[error("`{layer}` is {found:?}, expected {expected:?} to match `map`")]
    ShapeMismatch {
        layer: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },
}

/// A single entity descriptor is unusable; only that entity is dropped.
#[derive(Debug, Error)]
pub enum EntityFieldError {
    #[error("entity descriptor is missing `{0}`")]
    Missing(&'static str),
    #[error("entity descriptor has an invalid field: {0}")]
    Invalid(#[from] serde_json::Error),
    #[error("entity position needs 2 or 3 finite coordinates, got {0}")]
    BadPosition(usize),
}

// ---------------------------------------------------------------------------
// Decoded types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct EntityDescriptor {
    pub id: EntityId,
    pub kind: String,
    pub position: Vec3,
}

/// One consistent slice of world state.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub terrain: Grid<f32>,
    pub entities: Vec<EntityDescriptor>,
    pub counts: Grid<f32>,
    pub values: Grid<f32>,
    /// Descriptors discarded while decoding `ent`.
    pub dropped_entities: usize,
}

impl Snapshot {
    pub fn dims(&self) -> (usize, usize) {
        self.terrain.dims()
    }
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RawSnapshot {
    map: Vec<Vec<f32>>,
    ent: Vec<serde_json::Value>,
    values: Vec<Vec<f32>>,
    counts: Vec<Vec<f32>>,
}

#[derive(Deserialize)]
struct RawEntity {
    id: Option<u64>,
    #[serde(alias = "type")]
    kind: Option<String>,
    pos: Option<Vec<f32>>,
}

impl TryFrom<serde_json::Value> for EntityDescriptor {
    type Error = EntityFieldError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        let raw: RawEntity = serde_json::from_value(value)?;
        let id = raw.id.ok_or(EntityFieldError::Missing("id"))?;
        let kind = raw.kind.ok_or(EntityFieldError::Missing("kind"))?;
        let pos = raw.pos.ok_or(EntityFieldError::Missing("pos"))?;

        if pos.iter().any(|c| !c.is_finite()) {
            return Err(EntityFieldError::BadPosition(pos.len()));
        }
        let position = match pos.as_slice() {
            [x, z] => Vec3::new(*x, 0.0, *z),
            [x, y, z] => Vec3::new(*x, *y, *z),
            other => return Err(EntityFieldError::BadPosition(other.len())),
        };

        Ok(Self {
            id: EntityId(id),
            kind,
            position,
        })
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Parses raw inbox messages into [`Snapshot`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct SnapshotDecoder;

impl SnapshotDecoder {
    pub fn new() -> Self {
        Self
    }

    pub fn decode(&self, raw: &[u8]) -> Result<Snapshot, DecodeError> {
        let raw: RawSnapshot = serde_json::from_slice(raw)?;

        let terrain = grid("map", raw.map)?;
        let values = grid("values", raw.values)?;
        let counts = grid("counts", raw.counts)?;
        same_shape("values", &terrain, &values)?;
        same_shape("counts", &terrain, &counts)?;

        let mut entities = Vec::with_capacity(raw.ent.len());
        let mut dropped_entities = 0;
        for (index, value) in raw.ent.into_iter().enumerate() {
            match EntityDescriptor::try_from(value) {
                Ok(descriptor) => entities.push(descriptor),
                Err(e) => {
                    warn!("Dropping entity descriptor {}: {}", index, e);
                    dropped_entities += 1;
                }
            }
        }

        Ok(Snapshot {
            terrain,
            entities,
            counts,
            values,
            dropped_entities,
        })
    }
}

fn grid(layer: &'static str, rows: Vec<Vec<f32>>) -> Result<Grid<f32>, DecodeError> {
    Grid::from_rows(rows).map_err(|source| DecodeError::Grid { layer, source })
}

fn same_shape(
    layer: &'static str,
    terrain: &Grid<f32>,
    other: &Grid<f32>,
) -> Result<(), DecodeError> {
    if terrain.dims() == other.dims() {
        Ok(())
    } else {
        Err(DecodeError::ShapeMismatch {
            layer,
            expected: terrain.dims(),
            found: other.dims(),
        })
    }
}
