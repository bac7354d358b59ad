//! hull_mesh: fixed-width subdivision of hull plate panels.
//!
//! One [`HullMesh`] covers one side (port or starboard) of the hull. Input
//! is a list of 4-vertex panels (two upper vertices, two lower, possibly
//! with slanted leading/trailing edges where the hull rakes); panels may
//! stack in rows, one strip per deck, and each row ranks into a layer.
//! Subdivision walks each panel with a fixed-width cursor and retiles it as
//! triangles, every primitive tagged with the [`SectionId`] of the enclosing
//! cell. Later operations (portholes, damage) then enable or disable whole
//! cells by key instead of touching raw geometry.
//!
//! Per cell the tiling is: the overlap with the leading wedge (apex triangle
//! first, band quads after), the overlap with the full-height body (one quad
//! as two triangles), and the overlap with the trailing wedge (band quads,
//! apex triangle last). Pieces thinner than an epsilon are skipped, so the
//! emitted triangles tile the panel exactly with no gaps or overlaps.
//!
//! The build is two-pass: panels are subdivided into a generously sized
//! scratch buffer, then compacted into a buffer sized to the exact primitive
//! count.

#![forbid(unsafe_code)]

use geom_buffer::{ObjectBuffer, Vertex};
use glam::{Vec2, Vec3};
use thiserror::Error;

const EPS: f32 = 1e-4;

/// Quantized key of one fixed-width cell: `col` spans
/// `[col * cell_width, (col + 1) * cell_width)` along x, `layer` is the
/// panel row's rank from the keel upward. Integer identity; no float
/// comparisons anywhere in the key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SectionId {
    pub col: i32,
    pub layer: u16,
}

/// Hull side, picked from the panel vertices' z sign.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Port,
    Starboard,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
    #[error("no panels supplied")]
    Empty,
    #[error("vertex count {0} is not a multiple of 4")]
    MalformedPanels(usize),
    #[error("panel {index} does not split into an upper and a lower edge")]
    DegeneratePanel { index: usize },
    #[error("cell width must be positive (got {0})")]
    BadCellWidth(f32),
}

/// One hull plate: upper and lower edge, each sorted by x.
#[derive(Clone, Copy, Debug)]
struct Panel {
    upper: [Vertex; 2],
    lower: [Vertex; 2],
}

impl Panel {
    /// Split four vertices into the two edges by y, each sorted by x.
    fn from_quad(q: &[Vertex]) -> Option<Self> {
        let y_lo = q.iter().map(|v| v.pos.y).fold(f32::INFINITY, f32::min);
        let y_hi = q.iter().map(|v| v.pos.y).fold(f32::NEG_INFINITY, f32::max);
        if y_hi - y_lo <= EPS {
            return None;
        }
        let y_mid = 0.5 * (y_lo + y_hi);
        let mut up: Vec<Vertex> = q.iter().copied().filter(|v| v.pos.y > y_mid).collect();
        let mut lo: Vec<Vertex> = q.iter().copied().filter(|v| v.pos.y <= y_mid).collect();
        if up.len() != 2 || lo.len() != 2 {
            return None;
        }
        up.sort_by(|a, b| a.pos.x.total_cmp(&b.pos.x));
        lo.sort_by(|a, b| a.pos.x.total_cmp(&b.pos.x));
        Some(Self {
            upper: [up[0], up[1]],
            lower: [lo[0], lo[1]],
        })
    }

    fn min_x(&self) -> f32 {
        self.upper[0].pos.x.min(self.lower[0].pos.x)
    }

    fn max_x(&self) -> f32 {
        self.upper[1].pos.x.max(self.lower[1].pos.x)
    }

    /// `(lower y, upper y)` band of this panel's layer.
    fn y_band(&self) -> (f32, f32) {
        (self.lower[0].pos.y, self.upper[0].pos.y)
    }
}

/// Subdivided hull strip for one deck side.
pub struct HullMesh {
    buffer: ObjectBuffer<SectionId>,
    side: Side,
    cell_width: f32,
    /// y band per layer rank, ascending.
    layers: Vec<(f32, f32)>,
}

impl HullMesh {
    /// Subdivide a side's panels (flattened 4-vertex quads) into keyed
    /// sections of the given width.
    pub fn build(verts: &[Vertex], cell_width: f32) -> Result<Self, MeshError> {
        if !(cell_width > 0.0) {
            return Err(MeshError::BadCellWidth(cell_width));
        }
        if verts.is_empty() {
            return Err(MeshError::Empty);
        }
        if verts.len() % 4 != 0 {
            return Err(MeshError::MalformedPanels(verts.len()));
        }
        let side = if verts[1].pos.z > 0.0 {
            Side::Starboard
        } else {
            Side::Port
        };
        // Triangles wind counter-clockwise seen from outboard.
        let winding: [u32; 3] = match side {
            Side::Port => [0, 1, 2],
            Side::Starboard => [0, 2, 1],
        };

        let mut panels = Vec::with_capacity(verts.len() / 4);
        for (index, q) in verts.chunks_exact(4).enumerate() {
            let Some(p) = Panel::from_quad(q) else {
                return Err(MeshError::DegeneratePanel { index });
            };
            panels.push(p);
        }
        panels.sort_by(|a, b| a.min_x().total_cmp(&b.min_x()));

        let mut layers: Vec<(f32, f32)> = Vec::new();
        for p in &panels {
            let band = p.y_band();
            if !layers.iter().any(|l| (l.0 - band.0).abs() < EPS) {
                layers.push(band);
            }
        }
        layers.sort_by(|a, b| a.0.total_cmp(&b.0));

        // Worst case per covered cell: wedge piece + body quad + wedge piece.
        let mut cap = 0usize;
        for p in &panels {
            let cells = ((p.max_x() - p.min_x()) / cell_width).ceil() as usize + 2;
            cap += cells * 6;
        }
        let mut scratch: ObjectBuffer<SectionId> = ObjectBuffer::new(cap, 3, 3);
        for p in &panels {
            let band = p.y_band();
            let layer = layers
                .iter()
                .position(|l| (l.0 - band.0).abs() < EPS)
                .unwrap_or(0) as u16;
            subdivide_panel(&mut scratch, p, cell_width, layer, winding);
        }

        let mut buffer: ObjectBuffer<SectionId> = ObjectBuffer::new(scratch.len(), 3, 3);
        buffer.absorb(&mut scratch);
        Ok(Self {
            buffer,
            side,
            cell_width,
            layers,
        })
    }

    /// Disable every section whose cell rectangle lies inside the given
    /// model-space region. Returns the number of section keys toggled;
    /// requests for the other hull side return 0 untouched.
    pub fn disable_region(&mut self, start: Vec3, end: Vec3) -> usize {
        self.toggle_region(start, end, false)
    }

    /// Reverse of [`HullMesh::disable_region`].
    pub fn enable_region(&mut self, start: Vec3, end: Vec3) -> usize {
        self.toggle_region(start, end, true)
    }

    fn toggle_region(&mut self, start: Vec3, end: Vec3, enable: bool) -> usize {
        // Requests are gated by side: the z sign picks port or starboard.
        let z = if start.z != 0.0 { start.z } else { end.z };
        let wants = if z > 0.0 { Side::Starboard } else { Side::Port };
        if wants != self.side {
            return 0;
        }
        let (x0, x1) = (start.x.min(end.x), start.x.max(end.x));
        let (y0, y1) = (start.y.min(end.y), start.y.max(end.y));
        // Cells fully contained in [x0, x1].
        let col0 = ((x0 - EPS) / self.cell_width).ceil() as i32;
        let col1 = ((x1 + EPS) / self.cell_width).floor() as i32;
        let mut touched = 0;
        for (layer, band) in self.layers.iter().enumerate() {
            if band.0 < y0 - EPS || band.1 > y1 + EPS {
                continue;
            }
            for col in col0..col1 {
                let key = SectionId {
                    col,
                    layer: layer as u16,
                };
                let hit = if enable {
                    self.buffer.enable_object(key)
                } else {
                    self.buffer.disable_object(key)
                };
                if hit {
                    touched += 1;
                }
            }
        }
        touched
    }

    pub fn buffer(&self) -> &ObjectBuffer<SectionId> {
        &self.buffer
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn cell_width(&self) -> f32 {
        self.cell_width
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Number of primitives tagged with `key`.
    pub fn primitives_in(&self, key: SectionId) -> usize {
        self.buffer.keys().filter(|k| *k == key).count()
    }
}

/// Walk one panel with the fixed-width cursor, starting at the largest
/// multiple of `width` at or below the panel's front, and emit each cell's
/// overlap with the leading wedge, the body and the trailing wedge.
fn subdivide_panel(
    buf: &mut ObjectBuffer<SectionId>,
    p: &Panel,
    width: f32,
    layer: u16,
    winding: [u32; 3],
) {
    let front_min = p.upper[0].pos.x.min(p.lower[0].pos.x);
    let front_max = p.upper[0].pos.x.max(p.lower[0].pos.x);
    let back_min = p.upper[1].pos.x.min(p.lower[1].pos.x);
    let back_max = p.upper[1].pos.x.max(p.lower[1].pos.x);

    let mut col = (front_min / width).floor() as i32;
    loop {
        let s = col as f32 * width;
        let e = s + width;
        let key = SectionId { col, layer };
        front_piece(buf, p, key, s.max(front_min), e.min(front_max), front_min, winding);
        body_piece(buf, p, key, s.max(front_max), e.min(back_min), winding);
        tail_piece(buf, p, key, s.max(back_min), e.min(back_max), back_max, winding);
        if e >= back_max - EPS {
            break;
        }
        col += 1;
    }
}

/// Leading wedge overlap `[x0, x1]`: the apex triangle when the piece starts
/// at the panel front, a band quad between two cuts otherwise.
fn front_piece(
    buf: &mut ObjectBuffer<SectionId>,
    p: &Panel,
    key: SectionId,
    x0: f32,
    x1: f32,
    front_min: f32,
    winding: [u32; 3],
) {
    if x1 - x0 <= EPS {
        return;
    }
    let lower_leads = p.lower[0].pos.x < p.upper[0].pos.x;
    // The wedge is bounded by the protruding edge and the leading edge
    // joining the two front corners; the apex is the protruding corner.
    let (top, bot, apex) = if lower_leads {
        ((p.lower[0], p.upper[0]), (p.lower[0], p.lower[1]), p.lower[0])
    } else {
        ((p.upper[0], p.upper[1]), (p.upper[0], p.lower[0]), p.upper[0])
    };
    let top1 = cut_edge(&top.0, &top.1, x1);
    let bot1 = cut_edge(&bot.0, &bot.1, x1);
    if x0 <= front_min + EPS {
        push_tri(buf, key, [apex, top1, bot1], winding);
    } else {
        let top0 = cut_edge(&top.0, &top.1, x0);
        let bot0 = cut_edge(&bot.0, &bot.1, x0);
        push_quad(buf, key, [top1, bot1, bot0, top0], winding);
    }
}

/// Full-height body overlap `[x0, x1]`: one quad as two triangles, corners
/// interpolated along the upper and lower edges.
fn body_piece(
    buf: &mut ObjectBuffer<SectionId>,
    p: &Panel,
    key: SectionId,
    x0: f32,
    x1: f32,
    winding: [u32; 3],
) {
    if x1 - x0 <= EPS {
        return;
    }
    let u0 = cut_edge(&p.upper[0], &p.upper[1], x0);
    let u1 = cut_edge(&p.upper[0], &p.upper[1], x1);
    let l0 = cut_edge(&p.lower[0], &p.lower[1], x0);
    let l1 = cut_edge(&p.lower[0], &p.lower[1], x1);
    push_quad(buf, key, [u1, l1, l0, u0], winding);
}

/// Trailing wedge overlap `[x0, x1]`: band quads, apex triangle in the piece
/// reaching the panel's back.
fn tail_piece(
    buf: &mut ObjectBuffer<SectionId>,
    p: &Panel,
    key: SectionId,
    x0: f32,
    x1: f32,
    back_max: f32,
    winding: [u32; 3],
) {
    if x1 - x0 <= EPS {
        return;
    }
    let lower_trails = p.lower[1].pos.x > p.upper[1].pos.x;
    let (top, bot, apex) = if lower_trails {
        ((p.upper[1], p.lower[1]), (p.lower[0], p.lower[1]), p.lower[1])
    } else {
        ((p.upper[0], p.upper[1]), (p.lower[1], p.upper[1]), p.upper[1])
    };
    let top0 = cut_edge(&top.0, &top.1, x0);
    let bot0 = cut_edge(&bot.0, &bot.1, x0);
    if x1 >= back_max - EPS {
        push_tri(buf, key, [apex, bot0, top0], winding);
    } else {
        let top1 = cut_edge(&top.0, &top.1, x1);
        let bot1 = cut_edge(&bot.0, &bot.1, x1);
        push_quad(buf, key, [top1, bot1, bot0, top0], winding);
    }
}

/// Cut a straight edge at a given x. Normals and UVs share the position's
/// interpolation parameter; UVs are clamped to the unit square, normals are
/// left unnormalized.
fn cut_edge(a: &Vertex, b: &Vertex, x: f32) -> Vertex {
    let t = ((x - a.pos.x) / (b.pos.x - a.pos.x)).clamp(0.0, 1.0);
    Vertex {
        pos: a.pos.lerp(b.pos, t),
        normal: a.normal.lerp(b.normal, t),
        uv: a.uv.lerp(b.uv, t).clamp(Vec2::ZERO, Vec2::ONE),
    }
}

fn push_tri(buf: &mut ObjectBuffer<SectionId>, key: SectionId, v: [Vertex; 3], winding: [u32; 3]) {
    buf.add_object(key, &winding, &v);
}

fn push_quad(buf: &mut ObjectBuffer<SectionId>, key: SectionId, v: [Vertex; 4], winding: [u32; 3]) {
    push_tri(buf, key, [v[0], v[1], v[2]], winding);
    push_tri(buf, key, [v[2], v[3], v[0]], winding);
}
