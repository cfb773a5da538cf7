//! Renderer data structures.
//!
//! - `model` contains meshes, materials and the `DrawModel` extension for render passes
//! - `texture` contains the GPU texture wrapper and creation utilities
//! - `instance` holds object placement (world matrices)
//! - `uniform` holds the per-draw constant buffer payload and its slotted GPU buffer

pub mod instance;
pub mod model;
pub mod texture;
pub mod uniform;
