//! `WorldState` – terrain grid, the two scalar overlays and their visual layers.
//!
//! ```text
//! Uninitialized ──initialize(first snapshot)──▶ Initialized(WorldLayers)
//! ```
//!
//! Grids and colour buffers are allocated once, by `initialize`; every later
//! snapshot is copied into them in place.

use log::{debug, info};
use thiserror::Error;

use crate::protocol::Snapshot;
use crate::terrain::{heat, normalise_by_max, normalise_by_range, tile_color, Grid, Rgb};
use crate::types::ViewMode;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldError {
    #[error("world has not received its first snapshot")]
    Uninitialized,
    #[error("world is already initialized")]
    AlreadyInitialized,
    #[error("snapshot grid is {found:?}, world is fixed at {expected:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
}

// ---------------------------------------------------------------------------
// Layers
// ---------------------------------------------------------------------------

/// One colour-coded, per-tile visual layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub colors: Grid<Rgb>,
    pub visible: bool,
    /// Viewport the layer was last laid out for.
    pub viewport: (u32, u32),
    /// Number of times the colours were rebuilt.
    pub rebuilds: u64,
}

impl Layer {
    fn new(rows: usize, cols: usize, viewport: (u32, u32)) -> Self {
        Self {
            colors: Grid::new(rows, cols),
            visible: false,
            viewport,
            rebuilds: 0,
        }
    }
}

/// Allocated world data, present once the first snapshot arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldLayers {
    /// Latest terrain cells.
    pub terrain: Grid<f32>,
    /// Latest cached overlay data, refreshed every snapshot.
    pub counts: Grid<f32>,
    pub values: Grid<f32>,
    pub terrain_layer: Layer,
    pub counts_layer: Layer,
    pub values_layer: Layer,
}

impl WorldLayers {
    pub fn dims(&self) -> (usize, usize) {
        self.terrain.dims()
    }

    pub fn layer(&self, view: ViewMode) -> &Layer {
        match view {
            ViewMode::Client => &self.terrain_layer,
            ViewMode::Counts => &self.counts_layer,
            ViewMode::Values => &self.values_layer,
        }
    }

    fn layer_mut(&mut self, view: ViewMode) -> &mut Layer {
        match view {
            ViewMode::Client => &mut self.terrain_layer,
            ViewMode::Counts => &mut self.counts_layer,
            ViewMode::Values => &mut self.values_layer,
        }
    }

    /// Views whose layer is currently shown.
    pub fn visible_views(&self) -> Vec<ViewMode> {
        [ViewMode::Client, ViewMode::Counts, ViewMode::Values]
            .into_iter()
            .filter(|v| self.layer(*v).visible)
            .collect()
    }

    fn recolor(&mut self, view: ViewMode) {
        let Self {
            terrain,
            counts,
            values,
            terrain_layer,
            counts_layer,
            values_layer,
        } = self;

        match view {
            ViewMode::Client => {
                terrain_layer.colors.fill_from(terrain, tile_color);
                terrain_layer.rebuilds += 1;
            }
            ViewMode::Counts => {
                let norm = normalise_by_max(counts.cells());
                counts_layer.colors.fill_from(counts, |v| heat(norm(v)));
                counts_layer.rebuilds += 1;
            }
            ViewMode::Values => {
                let norm = normalise_by_range(values.cells());
                values_layer.colors.fill_from(values, |v| heat(norm(v)));
                values_layer.rebuilds += 1;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// WorldState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub enum WorldState {
    #[default]
    Uninitialized,
    Initialized(WorldLayers),
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self, WorldState::Initialized(_))
    }

    pub fn layers(&self) -> Option<&WorldLayers> {
        match self {
            WorldState::Initialized(layers) => Some(layers),
            WorldState::Uninitialized => None,
        }
    }

    fn layers_mut(&mut self) -> Result<&mut WorldLayers, WorldError> {
        match self {
            WorldState::Initialized(layers) => Ok(layers),
            WorldState::Uninitialized => Err(WorldError::Uninitialized),
        }
    }

    /// Allocate every grid from the first snapshot and show `view`.
    ///
    /// Both overlays are coloured up front so either can be shown at once.
    pub fn initialize(
        &mut self,
        snapshot: &Snapshot,
        view: ViewMode,
        viewport: (u32, u32),
    ) -> Result<(), WorldError> {
        if self.is_initialized() {
            return Err(WorldError::AlreadyInitialized);
        }

        let (rows, cols) = snapshot.dims();
        let mut layers = WorldLayers {
            terrain: snapshot.terrain.clone(),
            counts: snapshot.counts.clone(),
            values: snapshot.values.clone(),
            terrain_layer: Layer::new(rows, cols, viewport),
            counts_layer: Layer::new(rows, cols, viewport),
            values_layer: Layer::new(rows, cols, viewport),
        };
        layers.recolor(ViewMode::Client);
        layers.recolor(ViewMode::Counts);
        layers.recolor(ViewMode::Values);
        layers.layer_mut(view).visible = true;

        info!("World initialized: {}x{} tiles, showing {}", rows, cols, view);
        *self = WorldState::Initialized(layers);
        Ok(())
    }

    /// Reject snapshots whose grid does not match the allocated one.
    pub fn check_dims(&self, snapshot: &Snapshot) -> Result<(), WorldError> {
        let layers = self.layers().ok_or(WorldError::Uninitialized)?;
        if layers.dims() == snapshot.dims() {
            Ok(())
        } else {
            Err(WorldError::DimensionMismatch {
                expected: layers.dims(),
                found: snapshot.dims(),
            })
        }
    }

    /// Copy terrain cells in place and refresh the terrain colours.
    ///
    /// Also caches both overlay datasets for a later [`Self::reset_to`].
    pub fn apply_terrain(&mut self, snapshot: &Snapshot) -> Result<(), WorldError> {
        self.check_dims(snapshot)?;
        let layers = self.layers_mut()?;
        layers.terrain.copy_from(&snapshot.terrain);
        layers.counts.copy_from(&snapshot.counts);
        layers.values.copy_from(&snapshot.values);
        layers.recolor(ViewMode::Client);
        Ok(())
    }

    /// Recolour the overlay for the active `view` only; `Client` is a no-op.
    pub fn apply_overlay(&mut self, view: ViewMode, snapshot: &Snapshot) -> Result<(), WorldError> {
        self.check_dims(snapshot)?;
        let layers = self.layers_mut()?;
        match view {
            ViewMode::Client => {}
            ViewMode::Counts => {
                layers.counts.copy_from(&snapshot.counts);
                layers.recolor(ViewMode::Counts);
            }
            ViewMode::Values => {
                layers.values.copy_from(&snapshot.values);
                layers.recolor(ViewMode::Values);
            }
        }
        Ok(())
    }

    /// Rebuild `view` from the cached data and show it.
    pub fn reset_to(&mut self, view: ViewMode) -> Result<(), WorldError> {
        let layers = self.layers_mut()?;
        layers.recolor(view);
        layers.layer_mut(view).visible = true;
        debug!("Layer {} reset and shown", view);
        Ok(())
    }

    pub fn hide(&mut self, view: ViewMode) -> Result<(), WorldError> {
        self.layers_mut()?.layer_mut(view).visible = false;
        Ok(())
    }

    /// Record the new viewport on every layer.
    pub fn resize(&mut self, width: u32, height: u32) {
        if let WorldState::Initialized(layers) = self {
            for view in [ViewMode::Client, ViewMode::Counts, ViewMode::Values] {
                layers.layer_mut(view).viewport = (width, height);
            }
        }
    }
}
