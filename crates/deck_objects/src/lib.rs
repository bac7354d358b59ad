//! deck_objects: placement environment for deck-bound objects.
//!
//! The [`ObjectEnvironment`] is the single mutable context for everything
//! object placement touches on one ship: per-deck occupancy grids, per-deck
//! model and deck-plate sinks, footprint records, and the visible-deck
//! cutoff. Deck 0 is the topmost deck; higher indices go down.
//!
//! Placement is validate-then-apply. [`ObjectEnvironment::add_object`]
//! re-runs validation internally, so an invalid request can never corrupt
//! the grids, and returns a [`PlacementReceipt`] describing every derived
//! mutation (ceiling cells marked, plates toggled) so callers and tests can
//! assert on exactly what happened. [`ObjectEnvironment::remove_object`] is
//! the exact inverse, including side-effect reversal.
//!
//! Single-threaded by design: one `&mut ObjectEnvironment` per ship, no
//! interior mutability, no global state.

#![forbid(unsafe_code)]
#![deny(warnings, clippy::all, clippy::pedantic)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate
)]

use std::collections::HashMap;

use glam::Vec3;
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use deck_grid::{CellError, DeckGrid, GridDims, GridError, GridPos, GridSpace};
use geom_buffer::{ObjectBuffer, Vertex};

pub mod layout;
pub mod plates;

pub use plates::PlateId;

/// What a placed object does beyond occupying its own footprint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SideEffect {
    #[default]
    None,
    /// The object is tall enough to break through the deck above.
    CutsIntoCeiling,
    /// Reserved: cutting into the port hull wall. Semantics undefined.
    CutsIntoPortHull,
    /// Reserved: cutting into the starboard hull wall. Semantics undefined.
    CutsIntoStarboardHull,
}

/// Identity of a placed object: its deck and grid origin. Two live objects
/// can never share an origin cell on the same deck, so this is unique among
/// placed objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectId {
    pub deck: usize,
    pub origin: GridPos,
}

/// Grid rectangle an object occupies on its deck.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Footprint {
    pub origin: GridPos,
    pub dims: GridDims,
}

/// Pre-loaded render geometry for one object, local to the model's origin.
#[derive(Clone, Debug, Default)]
pub struct ObjectModel {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl ObjectModel {
    /// Copy with every vertex translated by `offset`.
    #[must_use]
    pub fn translated(&self, offset: Vec3) -> ObjectModel {
        ObjectModel {
            vertices: self
                .vertices
                .iter()
                .map(|v| Vertex { pos: v.pos + offset, ..*v })
                .collect(),
            indices: self.indices.clone(),
        }
    }
}

/// Per-deck retained store for placed-object models. Unlike the fixed-slot
/// geometry sinks, entries here vary in size, so this is a plain keyed list
/// with a whole-deck visibility flag.
#[derive(Debug)]
pub struct ModelSink {
    entries: Vec<(ObjectId, ObjectModel)>,
    /// Whole-deck visibility; flipped by the visible-deck cutoff.
    pub enabled: bool,
}

impl ModelSink {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            enabled: true,
        }
    }

    fn add(&mut self, id: ObjectId, model: ObjectModel) {
        self.entries.push((id, model));
    }

    fn remove(&mut self, id: ObjectId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(eid, _)| *eid != id);
        self.entries.len() != before
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.entries.iter().any(|(eid, _)| *eid == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &ObjectModel)> {
        self.entries.iter().map(|(id, m)| (*id, m))
    }
}

impl Default for ModelSink {
    fn default() -> Self {
        Self::new()
    }
}

/// A derived mutation applied (or reversed) alongside a placement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppliedEffect {
    /// A ceiling cut marked cells on the deck above and disabled its plates.
    CeilingOpened {
        deck: usize,
        origin: GridPos,
        dims: GridDims,
        plates_disabled: usize,
    },
    /// Removal reversed a ceiling cut.
    CeilingClosed {
        deck: usize,
        origin: GridPos,
        dims: GridDims,
        plates_enabled: usize,
    },
}

/// Everything [`ObjectEnvironment::add_object`] changed.
#[derive(Clone, Debug)]
pub struct PlacementReceipt {
    pub id: ObjectId,
    pub origin: GridPos,
    pub effects: Vec<AppliedEffect>,
}

/// Everything [`ObjectEnvironment::remove_object`] reversed.
#[derive(Clone, Debug)]
pub struct RemovalReceipt {
    pub id: ObjectId,
    pub effects: Vec<AppliedEffect>,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PlacementError {
    #[error("deck {deck} out of range")]
    DeckOutOfRange { deck: usize },
    #[error("deck {deck}: cell ({},{}) outside bounds", at.x, at.z)]
    OutOfBounds { deck: usize, at: GridPos },
    #[error("deck {deck}: cell ({},{}) already occupied", at.x, at.z)]
    Occupied { deck: usize, at: GridPos },
    #[error("deck {deck}: interior wall blocks placement")]
    WallBlocked { deck: usize },
    #[error("side effect {0:?} is not supported")]
    Unsupported(SideEffect),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RemoveError {
    #[error("no placed object with id {0:?}")]
    UnknownObject(ObjectId),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EnvError {
    #[error("no decks supplied")]
    NoDecks,
    #[error("deck {deck} silhouette exceeds the deck-0 grid")]
    SilhouetteMismatch { deck: usize },
    #[error("deck {deck}: {source}")]
    Grid {
        deck: usize,
        #[source]
        source: GridError,
    },
}

/// Veto hook for the interior-wall subsystem: walls reject placements that
/// would bisect them.
pub trait WallOracle {
    fn allows(&self, position: Vec3, dims: GridDims, deck: usize) -> bool;
}

/// Default oracle: no interior walls, everything passes.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoWalls;

impl WallOracle for NoWalls {
    fn allows(&self, _position: Vec3, _dims: GridDims, _deck: usize) -> bool {
        true
    }
}

/// One deck's outline polygon; vertex y is the deck's height.
#[derive(Clone, Debug)]
pub struct DeckSilhouette {
    pub verts: Vec<Vec3>,
}

impl DeckSilhouette {
    fn deck_y(&self) -> f32 {
        self.verts.first().map_or(0.0, |v| v.y)
    }
}

/// The placement context for one ship.
pub struct ObjectEnvironment {
    space: GridSpace,
    grids: Vec<DeckGrid>,
    models: Vec<ModelSink>,
    plates: Vec<ObjectBuffer<PlateId>>,
    footprints: Vec<HashMap<ObjectId, Footprint>>,
    placed: Vec<Vec<PlacedObject>>,
    wall_oracle: Box<dyn WallOracle>,
    cur_deck: usize,
}

#[derive(Clone, Copy, Debug)]
struct PlacedObject {
    id: ObjectId,
    position: Vec3,
    dims: GridDims,
    effect: SideEffect,
}

impl ObjectEnvironment {
    /// Build the environment from the deck silhouettes, topmost first.
    ///
    /// The grid is fitted to deck 0; every other deck must convert inside
    /// that grid (shorter or narrower decks are fine, larger ones are not).
    pub fn new(
        decks: &[DeckSilhouette],
        wall_oracle: Box<dyn WallOracle>,
    ) -> Result<Self, EnvError> {
        let Some(first) = decks.first() else {
            return Err(EnvError::NoDecks);
        };
        let space = GridSpace::fit(&first.verts).map_err(|source| EnvError::Grid { deck: 0, source })?;
        let mut grids = Vec::with_capacity(decks.len());
        let mut plate_sinks = Vec::with_capacity(decks.len());
        for (deck, sil) in decks.iter().enumerate() {
            if !fits_space(&space, &sil.verts) {
                return Err(EnvError::SilhouetteMismatch { deck });
            }
            let grid = DeckGrid::from_silhouette(&space, &sil.verts)
                .map_err(|source| EnvError::Grid { deck, source })?;
            plate_sinks.push(plates::build_plate_buffer(&space, &grid, sil.deck_y()));
            grids.push(grid);
        }
        info!(
            "object environment: {} decks, {}x{} cells",
            decks.len(),
            space.cols(),
            space.rows()
        );
        let n = decks.len();
        Ok(Self {
            space,
            grids,
            models: (0..n).map(|_| ModelSink::new()).collect(),
            plates: plate_sinks,
            footprints: vec![HashMap::new(); n],
            placed: vec![Vec::new(); n],
            wall_oracle,
            cur_deck: 0,
        })
    }

    /// Check a placement without mutating anything. Short-circuits on the
    /// first failure.
    ///
    /// A ceiling cut on any deck but the topmost re-runs the check one deck
    /// up with no further side effect; on deck 0 that step is skipped
    /// entirely. The reserved hull side effects fail before any other work.
    pub fn validate_placement(
        &self,
        position: Vec3,
        dims: GridDims,
        deck: usize,
        effect: SideEffect,
    ) -> Result<(), PlacementError> {
        if deck >= self.grids.len() {
            return Err(PlacementError::DeckOutOfRange { deck });
        }
        if matches!(
            effect,
            SideEffect::CutsIntoPortHull | SideEffect::CutsIntoStarboardHull
        ) {
            return Err(PlacementError::Unsupported(effect));
        }
        let origin = self.space.to_grid(position);
        self.grids[deck]
            .check_free(origin, dims)
            .map_err(|e| match e {
                CellError::OutOfBounds { at } => PlacementError::OutOfBounds { deck, at },
                CellError::Occupied { at } => PlacementError::Occupied { deck, at },
            })?;
        if effect == SideEffect::CutsIntoCeiling && deck != 0 {
            self.validate_placement(position, dims, deck - 1, SideEffect::None)?;
        }
        if !self.wall_oracle.allows(position, dims, deck) {
            return Err(PlacementError::WallBlocked { deck });
        }
        Ok(())
    }

    pub fn is_placement_valid(
        &self,
        position: Vec3,
        dims: GridDims,
        deck: usize,
        effect: SideEffect,
    ) -> bool {
        self.validate_placement(position, dims, deck, effect).is_ok()
    }

    /// Validate and place an object, submitting its model to the deck's
    /// sink and applying side effects. Returns a receipt listing every
    /// derived mutation; on error nothing has changed.
    pub fn add_object(
        &mut self,
        model: &ObjectModel,
        position: Vec3,
        dims: GridDims,
        deck: usize,
        effect: SideEffect,
    ) -> Result<PlacementReceipt, PlacementError> {
        self.validate_placement(position, dims, deck, effect)?;
        let origin = self.space.to_grid(position);
        let id = ObjectId { deck, origin };

        self.models[deck].add(id, model.translated(position));
        self.grids[deck].set_occupied(origin, dims, true);

        let mut effects = Vec::new();
        if effect == SideEffect::CutsIntoCeiling && deck != 0 {
            let above = deck - 1;
            self.grids[above].set_occupied(origin, dims, true);
            let plates_disabled = self.toggle_plates(above, origin, dims, false);
            effects.push(AppliedEffect::CeilingOpened {
                deck: above,
                origin,
                dims,
                plates_disabled,
            });
        }

        self.footprints[deck].insert(id, Footprint { origin, dims });
        self.placed[deck].push(PlacedObject {
            id,
            position,
            dims,
            effect,
        });
        Ok(PlacementReceipt { id, origin, effects })
    }

    /// Exact inverse of [`ObjectEnvironment::add_object`]: clears the
    /// footprint, reverses the add-time side effect, and drops the model.
    /// After this the touched decks' occupancy equals the pre-add state.
    pub fn remove_object(&mut self, id: ObjectId) -> Result<RemovalReceipt, RemoveError> {
        let deck = id.deck;
        if deck >= self.placed.len() {
            return Err(RemoveError::UnknownObject(id));
        }
        let Some(at) = self.placed[deck].iter().position(|p| p.id == id) else {
            return Err(RemoveError::UnknownObject(id));
        };
        let obj = self.placed[deck].remove(at);

        self.grids[deck].set_occupied(id.origin, obj.dims, false);
        let mut effects = Vec::new();
        if obj.effect == SideEffect::CutsIntoCeiling && deck != 0 {
            let above = deck - 1;
            self.grids[above].set_occupied(id.origin, obj.dims, false);
            let plates_enabled = self.toggle_plates(above, id.origin, obj.dims, true);
            effects.push(AppliedEffect::CeilingClosed {
                deck: above,
                origin: id.origin,
                dims: obj.dims,
                plates_enabled,
            });
        }
        self.footprints[deck].remove(&id);
        self.models[deck].remove(id);
        Ok(RemovalReceipt { id, effects })
    }

    fn toggle_plates(&mut self, deck: usize, origin: GridPos, dims: GridDims, enable: bool) -> usize {
        // Plate keys recenter z on the ship's long axis.
        let off_z = self.space.offset().z;
        let mut touched = 0;
        for x in origin.x..origin.x + dims.x {
            for z in origin.z..origin.z + dims.z {
                let key = PlateId { x, z: z - off_z };
                let hit = if enable {
                    self.plates[deck].enable_object(key)
                } else {
                    self.plates[deck].disable_object(key)
                };
                debug_assert!(hit, "no deck plate under occupied cell ({x},{z})");
                if hit {
                    touched += 1;
                }
            }
        }
        touched
    }

    /// Monotonic visibility cutoff: show the given deck and everything
    /// beneath it, hide the decks above. The deck is clamped into range and
    /// the applied value returned.
    pub fn set_visible_deck(&mut self, deck: usize) -> usize {
        let applied = deck.min(self.grids.len() - 1);
        for sink in &mut self.models {
            sink.enabled = false;
        }
        for sink in self.models.iter_mut().skip(applied) {
            sink.enabled = true;
        }
        self.cur_deck = applied;
        applied
    }

    /// One deck toward the topmost (deck 0), clamped.
    pub fn move_up_one_deck(&mut self) -> usize {
        self.set_visible_deck(self.cur_deck.saturating_sub(1))
    }

    /// One deck downward, clamped at the lowest deck.
    pub fn move_down_one_deck(&mut self) -> usize {
        self.set_visible_deck(self.cur_deck + 1)
    }

    pub fn current_deck(&self) -> usize {
        self.cur_deck
    }

    pub fn num_decks(&self) -> usize {
        self.grids.len()
    }

    pub fn space(&self) -> &GridSpace {
        &self.space
    }

    pub fn grid(&self, deck: usize) -> &DeckGrid {
        &self.grids[deck]
    }

    pub fn occupied_count(&self, deck: usize) -> usize {
        self.grids[deck].occupied_count()
    }

    /// Footprints placed on a deck; the wall subsystem reads these to avoid
    /// bisecting objects.
    pub fn footprints(&self, deck: usize) -> &HashMap<ObjectId, Footprint> {
        &self.footprints[deck]
    }

    /// The object whose footprint covers a cell, if any.
    pub fn object_at(&self, deck: usize, at: GridPos) -> Option<ObjectId> {
        self.footprints[deck]
            .iter()
            .find(|(_, f)| {
                at.x >= f.origin.x
                    && at.x < f.origin.x + f.dims.x
                    && at.z >= f.origin.z
                    && at.z < f.origin.z + f.dims.z
            })
            .map(|(id, _)| *id)
    }

    pub fn model_sink(&self, deck: usize) -> &ModelSink {
        &self.models[deck]
    }

    pub fn plate_sink(&self, deck: usize) -> &ObjectBuffer<PlateId> {
        &self.plates[deck]
    }

    /// Every live placement as `(deck, position, dims, effect)`.
    pub fn placements(&self) -> impl Iterator<Item = (usize, Vec3, GridDims, SideEffect)> + '_ {
        self.placed.iter().enumerate().flat_map(|(deck, objs)| {
            objs.iter().map(move |p| (deck, p.position, p.dims, p.effect))
        })
    }
}

fn fits_space(space: &GridSpace, verts: &[Vec3]) -> bool {
    verts.iter().all(|v| {
        let g = space.to_grid(*v);
        g.x >= 0 && g.x <= space.cols() as i32 && g.z >= 0 && g.z <= space.rows() as i32
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};

    fn rect_silhouette(len_m: f32, half_beam_m: f32, y: f32) -> DeckSilhouette {
        let cols = (len_m * 2.0) as i32;
        let mut verts = Vec::new();
        for c in 0..=cols {
            let x = c as f32 * 0.5;
            verts.push(Vec3::new(x, y, half_beam_m));
            verts.push(Vec3::new(x, y, -half_beam_m));
        }
        DeckSilhouette { verts }
    }

    fn ship(decks: usize) -> ObjectEnvironment {
        let sils: Vec<DeckSilhouette> = (0..decks)
            .map(|d| rect_silhouette(10.0, 2.0, -(d as f32) * 2.5))
            .collect();
        ObjectEnvironment::new(&sils, Box::new(NoWalls)).unwrap()
    }

    fn marker() -> ObjectModel {
        let v = |x: f32, z: f32, u: f32, w: f32| {
            Vertex::new(Vec3::new(x, 0.0, z), Vec3::Y, Vec2::new(u, w))
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

    #[test]
    fn basic_placement_scenario() {
        let mut env = ship(1);
        let pos = Vec3::new(3.0, 0.0, 1.0);
        let dims = GridDims::new(2, 2);
        assert!(env.is_placement_valid(pos, dims, 0, SideEffect::None));

        let receipt = env.add_object(&marker(), pos, dims, 0, SideEffect::None).unwrap();
        assert_eq!(receipt.origin, GridPos::new(6, 6));
        assert_eq!(receipt.id, ObjectId { deck: 0, origin: GridPos::new(6, 6) });
        assert!(receipt.effects.is_empty());
        for x in 6..8 {
            for z in 6..8 {
                assert!(env.grid(0).cell(GridPos::new(x, z)), "cell ({x},{z})");
            }
        }
        assert_eq!(env.occupied_count(0), 4);
        assert!(env.model_sink(0).contains(receipt.id));

        let err = env.add_object(&marker(), pos, dims, 0, SideEffect::None).unwrap_err();
        assert_eq!(
            err,
            PlacementError::Occupied { deck: 0, at: GridPos::new(6, 6) }
        );
    }

    #[test]
    fn placing_never_clears_other_footprints() {
        let mut env = ship(1);
        let dims = GridDims::new(2, 2);
        env.add_object(&marker(), Vec3::new(3.0, 0.0, 1.0), dims, 0, SideEffect::None)
            .unwrap();
        let before = env.occupied_count(0);
        env.add_object(&marker(), Vec3::new(6.0, 0.0, 0.0), dims, 0, SideEffect::None)
            .unwrap();
        assert!(env.occupied_count(0) >= before + dims.cell_count());
    }

    #[test]
    fn rejects_out_of_bounds_and_bad_deck() {
        let env = ship(1);
        let dims = GridDims::new(2, 2);
        let err = env
            .validate_placement(Vec3::new(9.8, 0.0, 0.0), dims, 0, SideEffect::None)
            .unwrap_err();
        assert!(matches!(err, PlacementError::OutOfBounds { deck: 0, .. }));
        assert_eq!(
            env.validate_placement(Vec3::new(3.0, 0.0, 1.0), dims, 5, SideEffect::None),
            Err(PlacementError::DeckOutOfRange { deck: 5 })
        );
    }

    #[test]
    fn reserved_hull_effects_fail_before_mutation() {
        let mut env = ship(1);
        let dims = GridDims::new(1, 1);
        for effect in [SideEffect::CutsIntoPortHull, SideEffect::CutsIntoStarboardHull] {
            assert!(!env.is_placement_valid(Vec3::new(3.0, 0.0, 1.0), dims, 0, effect));
            let err = env
                .add_object(&marker(), Vec3::new(3.0, 0.0, 1.0), dims, 0, effect)
                .unwrap_err();
            assert_eq!(err, PlacementError::Unsupported(effect));
        }
        assert_eq!(env.occupied_count(0), 0);
        assert!(env.model_sink(0).is_empty());
    }

    #[test]
    fn wall_oracle_vetoes_placement() {
        struct AftOnly;
        impl WallOracle for AftOnly {
            fn allows(&self, position: Vec3, _dims: GridDims, _deck: usize) -> bool {
                position.x >= 5.0
            }
        }
        let sils = vec![rect_silhouette(10.0, 2.0, 0.0)];
        let mut env = ObjectEnvironment::new(&sils, Box::new(AftOnly)).unwrap();
        let dims = GridDims::new(1, 1);
        assert_eq!(
            env.validate_placement(Vec3::new(3.0, 0.0, 1.0), dims, 0, SideEffect::None),
            Err(PlacementError::WallBlocked { deck: 0 })
        );
        assert!(env
            .add_object(&marker(), Vec3::new(6.0, 0.0, 1.0), dims, 0, SideEffect::None)
            .is_ok());
    }

    #[test]
    fn ceiling_cut_opens_deck_above() {
        let mut env = ship(2);
        let pos = Vec3::new(3.0, -2.5, 1.0);
        let dims = GridDims::new(2, 2);
        let receipt = env
            .add_object(&marker(), pos, dims, 1, SideEffect::CutsIntoCeiling)
            .unwrap();

        let origin = GridPos::new(6, 6);
        assert_eq!(
            receipt.effects,
            vec![AppliedEffect::CeilingOpened {
                deck: 0,
                origin,
                dims,
                plates_disabled: 4,
            }]
        );
        assert_eq!(env.occupied_count(0), 4);
        assert_eq!(env.occupied_count(1), 4);
        // Plate keys are recentered on the long axis (offset.z = 4).
        for x in 6..8 {
            for z in 6..8 {
                let key = PlateId { x, z: z - 4 };
                assert_eq!(env.plate_sink(0).is_object_enabled(key), Some(false));
            }
        }
    }

    #[test]
    fn ceiling_cut_on_top_deck_is_a_no_op() {
        let mut env = ship(2);
        let receipt = env
            .add_object(
                &marker(),
                Vec3::new(3.0, 0.0, 1.0),
                GridDims::new(2, 2),
                0,
                SideEffect::CutsIntoCeiling,
            )
            .unwrap();
        assert!(receipt.effects.is_empty());
        assert_eq!(env.occupied_count(0), 4);
    }

    #[test]
    fn ceiling_cut_needs_room_above() {
        let mut env = ship(2);
        let pos_above = Vec3::new(3.0, 0.0, 1.0);
        let pos = Vec3::new(3.0, -2.5, 1.0);
        let dims = GridDims::new(2, 2);
        env.add_object(&marker(), pos_above, dims, 0, SideEffect::None).unwrap();
        let err = env
            .add_object(&marker(), pos, dims, 1, SideEffect::CutsIntoCeiling)
            .unwrap_err();
        assert_eq!(
            err,
            PlacementError::Occupied { deck: 0, at: GridPos::new(6, 6) }
        );
        // Plain placement on the lower deck still works.
        assert!(env.add_object(&marker(), pos, dims, 1, SideEffect::None).is_ok());
    }

    #[test]
    fn visible_deck_cutoff_is_monotonic_and_clamped() {
        let mut env = ship(3);
        assert_eq!(env.set_visible_deck(1), 1);
        assert!(!env.model_sink(0).enabled);
        assert!(env.model_sink(1).enabled);
        assert!(env.model_sink(2).enabled);

        assert_eq!(env.set_visible_deck(99), 2);
        assert!(!env.model_sink(1).enabled);
        assert!(env.model_sink(2).enabled);

        assert_eq!(env.move_up_one_deck(), 1);
        assert_eq!(env.move_up_one_deck(), 0);
        assert_eq!(env.move_up_one_deck(), 0);
        assert!(env.model_sink(0).enabled);
        assert_eq!(env.move_down_one_deck(), 1);
    }

    #[test]
    fn remove_is_the_exact_inverse_of_add() {
        let mut env = ship(2);
        let pos = Vec3::new(3.0, -2.5, 1.0);
        let dims = GridDims::new(2, 2);
        let receipt = env
            .add_object(&marker(), pos, dims, 1, SideEffect::CutsIntoCeiling)
            .unwrap();

        let removal = env.remove_object(receipt.id).unwrap();
        assert_eq!(
            removal.effects,
            vec![AppliedEffect::CeilingClosed {
                deck: 0,
                origin: receipt.origin,
                dims,
                plates_enabled: 4,
            }]
        );
        assert_eq!(env.occupied_count(0), 0);
        assert_eq!(env.occupied_count(1), 0);
        assert!(env.footprints(1).is_empty());
        assert!(env.model_sink(1).is_empty());
        assert_eq!(
            env.plate_sink(0).is_object_enabled(PlateId { x: 6, z: 2 }),
            Some(true)
        );

        assert_eq!(
            env.remove_object(receipt.id).unwrap_err(),
            RemoveError::UnknownObject(receipt.id)
        );
    }

    #[test]
    fn object_at_finds_covering_footprint() {
        let mut env = ship(1);
        let receipt = env
            .add_object(
                &marker(),
                Vec3::new(3.0, 0.0, 1.0),
                GridDims::new(2, 2),
                0,
                SideEffect::None,
            )
            .unwrap();
        assert_eq!(env.object_at(0, GridPos::new(7, 7)), Some(receipt.id));
        assert_eq!(env.object_at(0, GridPos::new(8, 6)), None);
        assert_eq!(env.footprints(0).len(), 1);
    }

    #[test]
    fn oversized_deck_is_rejected_at_construction() {
        let sils = vec![
            rect_silhouette(10.0, 2.0, 0.0),
            rect_silhouette(12.0, 2.0, -2.5),
        ];
        let err = match ObjectEnvironment::new(&sils, Box::new(NoWalls)) {
            Err(e) => e,
            Ok(_) => panic!("expected a silhouette mismatch"),
        };
        assert_eq!(err, EnvError::SilhouetteMismatch { deck: 1 });
    }

    #[test]
    fn beam_overhang_below_is_rejected_at_construction() {
        // Deck 1 keeps the port rail flush but pokes the starboard rail
        // 0.2 m past deck 0's beam. The rail vertices alone still floor
        // inside the grid, so the column limits have to catch this.
        let mut wide = rect_silhouette(10.0, 2.0, -2.5);
        for v in wide.verts.iter_mut().filter(|v| v.z > 0.0) {
            v.z = 2.2;
        }
        let sils = vec![rect_silhouette(10.0, 2.0, 0.0), wide];
        let err = match ObjectEnvironment::new(&sils, Box::new(NoWalls)) {
            Err(e) => e,
            Ok(_) => panic!("expected the overhang to be rejected"),
        };
        assert_eq!(
            err,
            EnvError::Grid {
                deck: 1,
                source: GridError::OverhangingSilhouette {
                    col: 0,
                    half_beam: 2.2
                }
            }
        );
    }

    #[test]
    fn shorter_lower_decks_taper_freely() {
        // A lower deck shorter than deck 0 gets padding columns, not errors.
        let sils = vec![
            rect_silhouette(10.0, 2.0, 0.0),
            DeckSilhouette {
                verts: rect_silhouette(6.0, 2.0, -2.5)
                    .verts
                    .into_iter()
                    .map(|v| Vec3::new(v.x + 2.0, v.y, v.z))
                    .collect(),
            },
        ];
        let env = ObjectEnvironment::new(&sils, Box::new(NoWalls)).unwrap();
        assert!(env.is_placement_valid(
            Vec3::new(3.0, -2.5, 1.0),
            GridDims::new(1, 1),
            1,
            SideEffect::None
        ));
        assert!(!env.is_placement_valid(
            Vec3::new(0.5, -2.5, 1.0),
            GridDims::new(1, 1),
            1,
            SideEffect::None
        ));
    }
}
