//! Deck-plate geometry: one half-meter floor quad per valid cell.
//!
//! Plates live in a fixed-slot [`ObjectBuffer`] keyed by [`PlateId`], so a
//! ceiling cut can switch individual plates off by key and removal can
//! switch them back on without rebuilding anything. The cell count is known
//! exactly from the deck's column limits, so the buffer is allocated tight
//! in a single pass.

use deck_grid::{CELL_SIZE_M, DeckGrid, GridPos, GridSpace};
use geom_buffer::{ObjectBuffer, Vertex};
use glam::{Vec2, Vec3};

/// Key of one deck plate. `x` is the grid column; `z` is the grid row
/// recentered on the ship's long axis, so the plate two cells to port of
/// the centerline has `z = -2` on every deck regardless of grid size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlateId {
    pub x: i32,
    pub z: i32,
}

/// Build the floor-plate buffer for one deck at height `y`.
///
/// Padding columns of a shorter deck have empty row ranges and get no
/// plates. Every plate starts enabled.
pub fn build_plate_buffer(space: &GridSpace, grid: &DeckGrid, y: f32) -> ObjectBuffer<PlateId> {
    let mut cells = Vec::new();
    for col in 0..grid.cols() {
        let (lo, hi) = grid.row_bounds(col);
        for z in lo..hi {
            cells.push(GridPos::new(col as i32, z));
        }
    }

    let mut buffer = ObjectBuffer::new(cells.len(), 6, 4);
    let off_z = space.offset().z;
    for cell in cells {
        let corner = space.to_model(cell) + Vec3::new(0.0, y, 0.0);
        let key = PlateId {
            x: cell.x,
            z: cell.z - off_z,
        };
        buffer.add_object(key, &PLATE_INDICES, &plate_quad(corner));
    }
    buffer
}

// Both triangles wind counter-clockwise seen from above.
const PLATE_INDICES: [u32; 6] = [0, 2, 1, 0, 3, 2];

fn plate_quad(corner: Vec3) -> [Vertex; 4] {
    let v = |dx: f32, dz: f32, u: f32, w: f32| {
        Vertex::new(
            corner + Vec3::new(dx * CELL_SIZE_M, 0.0, dz * CELL_SIZE_M),
            Vec3::Y,
            Vec2::new(u, w),
        )
    };
    [
        v(0.0, 0.0, 0.0, 0.0),
        v(1.0, 0.0, 1.0, 0.0),
        v(1.0, 1.0, 1.0, 1.0),
        v(0.0, 1.0, 0.0, 1.0),
    ]
}
