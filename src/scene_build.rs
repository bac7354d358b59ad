//! Demo airship assembly: builds a small deterministic ship for the probe
//! bin and the end-to-end tests.
//!
//! This module is intentionally simple and deterministic. Every deck below
//! the weather deck is inset by a meter at bow and stern and the bow
//! columns taper, so padding columns and narrowed rows show up without any
//! hand-authored data. The hull is two [`HullMesh`] strips (port and
//! starboard), one panel row per deck, with raked leading and trailing
//! edges to exercise the wedge tiling.

use anyhow::Result;
use glam::{Vec2, Vec3};

use deck_objects::{DeckSilhouette, NoWalls, ObjectEnvironment, ObjectModel};
use geom_buffer::Vertex;
use hull_mesh::HullMesh;

/// Dimensions of the sample ship.
#[derive(Clone, Copy, Debug)]
pub struct SampleSpec {
    pub decks: usize,
    pub length_m: f32,
    pub half_beam_m: f32,
    pub deck_height_m: f32,
    /// Hull subdivision cell width.
    pub section_width_m: f32,
}

impl Default for SampleSpec {
    fn default() -> Self {
        Self {
            decks: 3,
            length_m: 12.0,
            half_beam_m: 3.0,
            deck_height_m: 2.5,
            section_width_m: 4.0,
        }
    }
}

pub struct SampleAirship {
    pub env: ObjectEnvironment,
    pub port: HullMesh,
    pub starboard: HullMesh,
}

pub fn build_sample_airship(spec: &SampleSpec) -> Result<SampleAirship> {
    let sils: Vec<DeckSilhouette> = (0..spec.decks).map(|d| deck_silhouette(spec, d)).collect();
    let env = ObjectEnvironment::new(&sils, Box::new(NoWalls))?;
    let port = HullMesh::build(&side_panels(spec, -spec.half_beam_m), spec.section_width_m)?;
    let starboard = HullMesh::build(&side_panels(spec, spec.half_beam_m), spec.section_width_m)?;
    Ok(SampleAirship {
        env,
        port,
        starboard,
    })
}

/// Placeholder object geometry: a one-meter tabletop quad above the origin.
pub fn marker_model() -> ObjectModel {
    let v = |x: f32, z: f32, u: f32, w: f32| {
        Vertex::new(Vec3::new(x, 0.9, z), Vec3::Y, Vec2::new(u, w))
    };
    ObjectModel {
        vertices: vec![
            v(0.0, 0.0, 0.0, 0.0),
            v(1.0, 0.0, 1.0, 0.0),
            v(1.0, 1.0, 1.0, 1.0),
            v(0.0, 1.0, 0.0, 1.0),
        ],
        indices: vec![0, 2, 1, 0, 3, 2],
    }
}

/// Deck outline: one vertex per half-meter column on each rail. Deck `d` is
/// inset `d` meters at bow and stern; the first meter tapers from 60% beam.
fn deck_silhouette(spec: &SampleSpec, deck: usize) -> DeckSilhouette {
    let inset = deck as f32;
    let x0 = inset;
    let x1 = spec.length_m - inset;
    let y = -(deck as f32) * spec.deck_height_m;
    let mut verts = Vec::new();
    for c in (x0 * 2.0) as i32..=(x1 * 2.0) as i32 {
        let x = c as f32 * 0.5;
        let t = (x - x0).min(1.0);
        let b = spec.half_beam_m * (0.6 + 0.4 * t);
        verts.push(Vec3::new(x, y, b));
        verts.push(Vec3::new(x, y, -b));
    }
    DeckSilhouette { verts }
}

/// Hull panels for one side: per deck a raked bow panel and a raked stern
/// panel sharing the midship edge.
fn side_panels(spec: &SampleSpec, z: f32) -> Vec<Vertex> {
    let rake = 1.2_f32;
    let normal = Vec3::new(0.0, 0.0, z.signum());
    let mut verts = Vec::new();
    for d in 0..spec.decks {
        let inset = d as f32;
        let x0 = inset;
        let x1 = spec.length_m - inset;
        let xm = 0.5 * (x0 + x1);
        let y_top = -(d as f32) * spec.deck_height_m;
        let y_bot = y_top - spec.deck_height_m;
        let v = |x: f32, y: f32| {
            let uv = Vec2::new(
                (x - x0) / (x1 - x0),
                (y - y_bot) / spec.deck_height_m,
            );
            Vertex::new(Vec3::new(x, y, z), normal, uv)
        };
        // Bow panel: lower front corner leads the upper by the rake.
        verts.extend([v(x0 + rake, y_top), v(xm, y_top), v(x0, y_bot), v(xm, y_bot)]);
        // Stern panel: lower back corner trails the upper.
        verts.extend([v(xm, y_top), v(x1 - rake, y_top), v(xm, y_bot), v(x1, y_bot)]);
    }
    verts
}
