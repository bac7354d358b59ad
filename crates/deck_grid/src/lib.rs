//! deck_grid: model-space to grid-space conversion and per-deck occupancy.
//!
//! Decks are carved into half-meter cells. A [`GridSpace`] fixes the
//! conversion for a whole ship: scale model coordinates by two, add a
//! constant offset derived once from the topmost deck's silhouette, floor.
//! A [`DeckGrid`] then tracks which cells of one deck are occupied and which
//! are valid at all: each grid column carries a z-range derived from the
//! silhouette, so placement fails outside the ship's actual cross-section
//! even when the cell lies inside the grid's bounding rectangle.
//!
//! Conversion is pure and the limits never change after construction;
//! occupancy is the only mutable state here.

#![forbid(unsafe_code)]

use glam::Vec3;
use thiserror::Error;

/// Cells per model-space meter.
pub const CELLS_PER_METER: i32 = 2;
/// Cell edge length in model-space meters.
pub const CELL_SIZE_M: f32 = 0.5;

/// A cell coordinate. Distinct from [`GridDims`] and from model-space
/// vectors so the two spaces cannot be mixed up silently.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GridPos {
    pub x: i32,
    pub z: i32,
}

impl GridPos {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

impl std::ops::Add<GridDims> for GridPos {
    type Output = GridPos;
    fn add(self, d: GridDims) -> GridPos {
        GridPos::new(self.x + d.x, self.z + d.z)
    }
}

/// Footprint extent in cells; both components are at least 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridDims {
    pub x: i32,
    pub z: i32,
}

impl GridDims {
    pub fn new(x: i32, z: i32) -> Self {
        debug_assert!(x >= 1 && z >= 1, "footprint must span at least one cell");
        Self { x, z }
    }

    pub fn cell_count(&self) -> usize {
        (self.x * self.z) as usize
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    #[error("silhouette has no vertices")]
    EmptySilhouette,
    #[error("silhouette z extent is not symmetric (min {min_z}, max {max_z})")]
    AsymmetricSilhouette { min_z: f32, max_z: f32 },
    #[error("silhouette provides no vertex for grid column {col}")]
    SparseSilhouette { col: i32 },
    #[error("silhouette column {col} (half-beam {half_beam} m) overhangs the grid beam")]
    OverhangingSilhouette { col: i32, half_beam: f32 },
}

/// Why a footprint rectangle cannot be placed, with the first failing cell.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CellError {
    #[error("cell ({},{}) outside deck bounds", at.x, at.z)]
    OutOfBounds { at: GridPos },
    #[error("cell ({},{}) already occupied", at.x, at.z)]
    Occupied { at: GridPos },
}

/// Conversion context shared by every deck of one ship.
///
/// The offset shifts the bow-most, port-most corner of the topmost deck to
/// cell (0,0); z therefore counts from the port rail, and the long axis of
/// the ship sits at `offset.z`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridSpace {
    offset: GridPos,
    cols: usize,
    rows: usize,
}

impl GridSpace {
    /// Fit the grid to the topmost deck's silhouette.
    ///
    /// The silhouette must be laterally symmetric (|min z| == max z within a
    /// cell); the grid then spans `(max_x - min_x) * 2` columns and
    /// `max_z * 4` rows.
    pub fn fit(silhouette: &[Vec3]) -> Result<Self, GridError> {
        if silhouette.is_empty() {
            return Err(GridError::EmptySilhouette);
        }
        let mut min_x = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut min_z = f32::INFINITY;
        let mut max_z = f32::NEG_INFINITY;
        for v in silhouette {
            min_x = min_x.min(v.x);
            max_x = max_x.max(v.x);
            min_z = min_z.min(v.z);
            max_z = max_z.max(v.z);
        }
        if (min_z + max_z).abs() > CELL_SIZE_M {
            return Err(GridError::AsymmetricSilhouette { min_z, max_z });
        }
        let scale = CELLS_PER_METER as f32;
        let offset = GridPos::new((-min_x * scale).round() as i32, (max_z * scale).round() as i32);
        let cols = ((max_x - min_x) * scale).round() as usize;
        let rows = (max_z * 2.0 * scale).round() as usize;
        if cols == 0 || rows == 0 {
            return Err(GridError::EmptySilhouette);
        }
        Ok(Self { offset, cols, rows })
    }

    /// Model space to cell coordinate: scale by two, offset, floor.
    pub fn to_grid(&self, pos: Vec3) -> GridPos {
        let scale = CELLS_PER_METER as f32;
        GridPos::new(
            (pos.x * scale + self.offset.x as f32).floor() as i32,
            (pos.z * scale + self.offset.z as f32).floor() as i32,
        )
    }

    /// Cell coordinate back to the cell's model-space corner (y = 0).
    pub fn to_model(&self, pos: GridPos) -> Vec3 {
        Vec3::new(
            (pos.x - self.offset.x) as f32 * CELL_SIZE_M,
            0.0,
            (pos.z - self.offset.z) as f32 * CELL_SIZE_M,
        )
    }

    pub fn offset(&self) -> GridPos {
        self.offset
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
}

/// One deck's occupancy table plus its silhouette-derived column limits.
#[derive(Clone, Debug, PartialEq)]
pub struct DeckGrid {
    cols: usize,
    rows: usize,
    occupied: Vec<bool>,
    /// First valid row per column; `i32::MAX` on padding columns.
    row_min: Vec<i32>,
    /// One past the last valid row per column; `i32::MIN` on padding columns.
    row_max: Vec<i32>,
}

impl DeckGrid {
    /// Build the limits from this deck's silhouette.
    ///
    /// Only the z >= 0 half is read; each grid column takes its beam from
    /// the widest vertex in the column and the valid range mirrors around
    /// the ship's long axis. Columns outside the silhouette's first/last
    /// column are padding and reject everything. A gap column between them
    /// is a provider contract violation: the silhouette is expected to carry
    /// one vertex per half-meter column. A column whose beam exceeds the
    /// grid's is rejected outright, so the stored limits always stay inside
    /// `[0, rows]`.
    pub fn from_silhouette(space: &GridSpace, silhouette: &[Vec3]) -> Result<Self, GridError> {
        if silhouette.is_empty() {
            return Err(GridError::EmptySilhouette);
        }
        let cols = space.cols();
        let rows = space.rows();
        let mut row_min = vec![i32::MAX; cols];
        let mut row_max = vec![i32::MIN; cols];

        let mut beam: Vec<Option<f32>> = vec![None; cols];
        for v in silhouette.iter().filter(|v| v.z >= 0.0) {
            let col = space.to_grid(*v).x;
            // A vertex exactly on the stern edge closes the last column.
            let col = col.clamp(0, cols as i32 - 1) as usize;
            beam[col] = Some(beam[col].map_or(v.z, |b: f32| b.max(v.z)));
        }
        let Some(first) = beam.iter().position(Option::is_some) else {
            return Err(GridError::EmptySilhouette);
        };
        let last = beam.iter().rposition(Option::is_some).unwrap_or(first);
        for col in first..=last {
            match beam[col] {
                Some(b) => {
                    let lo = space.to_grid(Vec3::new(0.0, 0.0, -b)).z;
                    if lo < 0 {
                        return Err(GridError::OverhangingSilhouette {
                            col: col as i32,
                            half_beam: b,
                        });
                    }
                    row_min[col] = lo;
                    row_max[col] = rows as i32 - lo;
                }
                None => return Err(GridError::SparseSilhouette { col: col as i32 }),
            }
        }
        Ok(Self {
            cols,
            rows,
            occupied: vec![false; cols * rows],
            row_min,
            row_max,
        })
    }

    fn idx(&self, x: usize, z: usize) -> usize {
        x * self.rows + z
    }

    /// Check every cell of the rectangle: inside the grid, inside the
    /// column's silhouette limits, not occupied. Reports the first failing
    /// cell and performs no mutation.
    pub fn check_free(&self, origin: GridPos, dims: GridDims) -> Result<(), CellError> {
        for x in origin.x..origin.x + dims.x {
            if x < 0 || x as usize >= self.cols {
                return Err(CellError::OutOfBounds {
                    at: GridPos::new(x, origin.z),
                });
            }
            for z in origin.z..origin.z + dims.z {
                let at = GridPos::new(x, z);
                if z < self.row_min[x as usize] || z >= self.row_max[x as usize] {
                    return Err(CellError::OutOfBounds { at });
                }
                if self.occupied[self.idx(x as usize, z as usize)] {
                    return Err(CellError::Occupied { at });
                }
            }
        }
        Ok(())
    }

    pub fn is_free(&self, origin: GridPos, dims: GridDims) -> bool {
        self.check_free(origin, dims).is_ok()
    }

    /// Write the rectangle. Callers validate first; bounds are asserted in
    /// debug builds only.
    pub fn set_occupied(&mut self, origin: GridPos, dims: GridDims, value: bool) {
        for x in origin.x..origin.x + dims.x {
            for z in origin.z..origin.z + dims.z {
                debug_assert!(
                    x >= 0 && (x as usize) < self.cols && z >= 0 && (z as usize) < self.rows,
                    "cell ({x},{z}) outside {}x{} grid",
                    self.cols,
                    self.rows
                );
                let i = self.idx(x as usize, z as usize);
                self.occupied[i] = value;
            }
        }
    }

    /// Occupancy of a single cell; cells outside the grid read as free.
    pub fn cell(&self, pos: GridPos) -> bool {
        if pos.x < 0 || pos.z < 0 || pos.x as usize >= self.cols || pos.z as usize >= self.rows {
            return false;
        }
        self.occupied[self.idx(pos.x as usize, pos.z as usize)]
    }

    /// Whether the cell lies inside this deck's silhouette.
    pub fn valid_cell(&self, pos: GridPos) -> bool {
        pos.x >= 0
            && (pos.x as usize) < self.cols
            && pos.z >= self.row_min[pos.x as usize]
            && pos.z < self.row_max[pos.x as usize]
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied.iter().filter(|c| **c).count()
    }

    /// `(row_min, row_max)` of a column; padding columns return the
    /// (MAX, MIN) sentinel pair and thus an empty range.
    pub fn row_bounds(&self, col: usize) -> (i32, i32) {
        (self.row_min[col], self.row_max[col])
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
}
