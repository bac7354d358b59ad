//! Save/load for placed-object layouts.
//!
//! A layout file is a versioned JSON document listing every placement as
//! `(deck, position, dims, effect)`. Loading replays the records through
//! [`ObjectEnvironment::add_object`], so a stale file that no longer fits
//! the ship fails validation record by record instead of corrupting the
//! grids.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use deck_grid::GridDims;
use glam::Vec3;

use crate::{ObjectEnvironment, ObjectModel, PlacementError, SideEffect};

/// Schema tag expected in layout files.
pub const LAYOUT_SCHEMA: &str = "skywright.deck-layout.v1";

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("unsupported layout schema {0:?}")]
    Schema(String),
    #[error("layout JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("record {index}: footprint {dims:?} must be at least 1x1 cells")]
    BadDims { index: usize, dims: [i32; 2] },
    #[error("record {index}: {source}")]
    Placement {
        index: usize,
        #[source]
        source: PlacementError,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LayoutFile {
    pub schema: String,
    pub objects: Vec<PlacementRecord>,
}

/// One placement, in model-space coordinates so files survive grid-offset
/// changes between ships of the same hull.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlacementRecord {
    pub deck: usize,
    pub position: [f32; 3],
    pub dims: [i32; 2],
    #[serde(default)]
    pub effect: SideEffect,
}

/// Snapshot every live placement into a layout document.
pub fn export_layout(env: &ObjectEnvironment) -> LayoutFile {
    LayoutFile {
        schema: LAYOUT_SCHEMA.to_string(),
        objects: env
            .placements()
            .map(|(deck, position, dims, effect)| PlacementRecord {
                deck,
                position: position.to_array(),
                dims: [dims.x, dims.z],
                effect,
            })
            .collect(),
    }
}

pub fn layout_to_json(layout: &LayoutFile) -> Result<String, LayoutError> {
    Ok(serde_json::to_string_pretty(layout)?)
}

pub fn layout_from_json(text: &str) -> Result<LayoutFile, LayoutError> {
    let layout: LayoutFile = serde_json::from_str(text)?;
    if layout.schema != LAYOUT_SCHEMA {
        return Err(LayoutError::Schema(layout.schema));
    }
    Ok(layout)
}

/// Replay a layout into the environment, fail-fast on the first record the
/// environment rejects. Returns the number of objects placed; on error the
/// records before the failing one remain placed.
pub fn apply_layout(
    env: &mut ObjectEnvironment,
    layout: &LayoutFile,
    model: &ObjectModel,
) -> Result<usize, LayoutError> {
    for (index, rec) in layout.objects.iter().enumerate() {
        // File data is untrusted; keep it away from the GridDims contract.
        if rec.dims[0] < 1 || rec.dims[1] < 1 {
            return Err(LayoutError::BadDims {
                index,
                dims: rec.dims,
            });
        }
        env.add_object(
            model,
            Vec3::from(rec.position),
            GridDims::new(rec.dims[0], rec.dims[1]),
            rec.deck,
            rec.effect,
        )
        .map_err(|source| LayoutError::Placement { index, source })?;
    }
    Ok(layout.objects.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DeckSilhouette, NoWalls};

    fn ship(decks: usize) -> ObjectEnvironment {
        let sils: Vec<DeckSilhouette> = (0..decks)
            .map(|d| {
                let y = -(d as f32) * 2.5;
                let cols = 20;
                let mut verts = Vec::new();
                for c in 0..=cols {
                    let x = c as f32 * 0.5;
                    verts.push(Vec3::new(x, y, 2.0));
                    verts.push(Vec3::new(x, y, -2.0));
                }
                DeckSilhouette { verts }
            })
            .collect();
        ObjectEnvironment::new(&sils, Box::new(NoWalls)).unwrap()
    }

    #[test]
    fn export_apply_reproduces_occupancy() {
        let mut env = ship(2);
        let model = ObjectModel::default();
        env.add_object(
            &model,
            Vec3::new(3.0, 0.0, 1.0),
            GridDims::new(2, 2),
            0,
            SideEffect::None,
        )
        .unwrap();
        env.add_object(
            &model,
            Vec3::new(6.0, -2.5, -1.0),
            GridDims::new(1, 2),
            1,
            SideEffect::CutsIntoCeiling,
        )
        .unwrap();

        let json = layout_to_json(&export_layout(&env)).unwrap();
        let mut fresh = ship(2);
        let placed = apply_layout(&mut fresh, &layout_from_json(&json).unwrap(), &model).unwrap();

        assert_eq!(placed, 2);
        assert_eq!(fresh.occupied_count(0), env.occupied_count(0));
        assert_eq!(fresh.occupied_count(1), env.occupied_count(1));
        assert_eq!(
            fresh.plate_sink(0).active_objects(),
            env.plate_sink(0).active_objects()
        );
    }

    #[test]
    fn unknown_schema_is_rejected() {
        let text = r#"{ "schema": "skywright.deck-layout.v0", "objects": [] }"#;
        match layout_from_json(text) {
            Err(LayoutError::Schema(s)) => assert_eq!(s, "skywright.deck-layout.v0"),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn missing_effect_field_defaults_to_none() {
        let text = format!(
            r#"{{ "schema": "{LAYOUT_SCHEMA}",
                 "objects": [ {{ "deck": 0, "position": [3.0, 0.0, 1.0], "dims": [2, 2] }} ] }}"#
        );
        let layout = layout_from_json(&text).unwrap();
        assert_eq!(layout.objects[0].effect, SideEffect::None);
    }

    #[test]
    fn degenerate_dims_record_is_rejected() {
        let mut env = ship(1);
        let zeroed = LayoutFile {
            schema: LAYOUT_SCHEMA.to_string(),
            objects: vec![PlacementRecord {
                deck: 0,
                position: [3.0, 0.0, 1.0],
                dims: [0, 0],
                effect: SideEffect::None,
            }],
        };
        let err = apply_layout(&mut env, &zeroed, &ObjectModel::default()).unwrap_err();
        assert!(matches!(err, LayoutError::BadDims { index: 0, dims: [0, 0] }));
        assert_eq!(env.occupied_count(0), 0, "no phantom placement");

        let negative = LayoutFile {
            schema: LAYOUT_SCHEMA.to_string(),
            objects: vec![PlacementRecord {
                deck: 0,
                position: [3.0, 0.0, 1.0],
                dims: [2, -1],
                effect: SideEffect::None,
            }],
        };
        assert!(matches!(
            apply_layout(&mut env, &negative, &ObjectModel::default()),
            Err(LayoutError::BadDims { index: 0, .. })
        ));
        assert_eq!(env.occupied_count(0), 0);
    }

    #[test]
    fn replay_fails_fast_with_record_index() {
        let mut env = ship(1);
        let layout = LayoutFile {
            schema: LAYOUT_SCHEMA.to_string(),
            objects: vec![
                PlacementRecord {
                    deck: 0,
                    position: [3.0, 0.0, 1.0],
                    dims: [2, 2],
                    effect: SideEffect::None,
                },
                PlacementRecord {
                    deck: 0,
                    position: [3.0, 0.0, 1.0],
                    dims: [2, 2],
                    effect: SideEffect::None,
                },
            ],
        };
        let err = apply_layout(&mut env, &layout, &ObjectModel::default()).unwrap_err();
        match err {
            LayoutError::Placement { index, source } => {
                assert_eq!(index, 1);
                assert!(matches!(source, PlacementError::Occupied { .. }));
            }
            other => panic!("expected placement error, got {other:?}"),
        }
    }
}
