//! Tile grids and their colouring: the `Grid` container shared by terrain and
//! overlays, the terrain palette and the scalar heat ramp.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("grid has no cells")]
    Empty,
    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Row-major rectangular grid of per-tile values.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    cells: Vec<T>,
}

impl<T: Copy + Default> Grid<T> {
    /// Allocate a grid filled with `T::default()`.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![T::default(); rows * cols],
        }
    }

    /// Flatten nested rows, rejecting empty and ragged input.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, GridError> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        if cols == 0 {
            return Err(GridError::Empty);
        }

        let mut cells = Vec::with_capacity(rows.len() * cols);
        for (row, values) in rows.iter().enumerate() {
            if values.len() != cols {
                return Err(GridError::Ragged {
                    row,
                    expected: cols,
                    found: values.len(),
                });
            }
            cells.extend_from_slice(values);
        }

        Ok(Self {
            rows: rows.len(),
            cols,
            cells,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        if row < self.rows && col < self.cols {
            Some(self.cells[row * self.cols + col])
        } else {
            None
        }
    }

    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    /// Overwrite every cell from `other` without reallocating.
    ///
    /// Returns `false` (and leaves `self` untouched) when the shapes differ.
    pub fn copy_from(&mut self, other: &Grid<T>) -> bool {
        if self.dims() != other.dims() {
            return false;
        }
        self.cells.copy_from_slice(&other.cells);
        true
    }

    /// Overwrite every cell with `f(source cell)`; shapes must already match.
    pub fn fill_from<S: Copy + Default>(&mut self, source: &Grid<S>, f: impl Fn(S) -> T) {
        debug_assert_eq!(self.dims(), source.dims());
        for (dst, src) in self.cells.iter_mut().zip(source.cells.iter()) {
            *dst = f(*src);
        }
    }
}

// ---------------------------------------------------------------------------
// Colouring
// ---------------------------------------------------------------------------

pub type Rgb = [u8; 3];

/// Terrain palette, indexed by tile type (the integral part of the cell value).
const TERRAIN_PALETTE: [Rgb; 6] = [
    [20, 20, 60],    // void / lava
    [40, 90, 200],   // water
    [70, 160, 70],   // grass
    [110, 110, 110], // stone
    [30, 110, 40],   // forest
    [120, 90, 50],   // scrub
];

const UNKNOWN_TILE: Rgb = [255, 0, 255];

const COLD: Rgb = [20, 30, 160];
const HOT: Rgb = [230, 40, 30];

/// Colour for one terrain cell.
pub fn tile_color(value: f32) -> Rgb {
    if !value.is_finite() || value < 0.0 {
        return UNKNOWN_TILE;
    }
    TERRAIN_PALETTE
        .get(value as usize)
        .copied()
        .unwrap_or(UNKNOWN_TILE)
}

/// Linear cold→hot ramp for `t` in `[0, 1]` (clamped).
pub fn heat(t: f32) -> Rgb {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
    [mix(COLD[0], HOT[0]), mix(COLD[1], HOT[1]), mix(COLD[2], HOT[2])]
}

/// Normalise against `[0, max]`; used for counts.
pub fn normalise_by_max(cells: &[f32]) -> impl Fn(f32) -> f32 {
    let max = cells
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0f32, f32::max);
    move |v| if max > 0.0 { v / max } else { 0.0 }
}

/// Normalise against `[min, max]`; used for values.
pub fn normalise_by_range(cells: &[f32]) -> impl Fn(f32) -> f32 {
    let (min, max) = cells
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    let span = max - min;
    move |v| {
        if span.is_finite() && span > 0.0 {
            (v - min) / span
        } else {
            0.0
        }
    }
}
