// Root app shell and re-exports for workspace crates used by bins.
pub use deck_grid as grid;
pub use deck_objects as objects;
pub use geom_buffer as buffer;
pub use hull_mesh as hull;
pub mod scene_build;
