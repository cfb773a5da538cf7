//! reflect-ngin
//!
//! A small real-time renderer built on wgpu and winit. It draws a bridge model, a
//! sky box and a sphere that reflects both through a cube map re-rendered every
//! frame, driven by a pausable clock.
//!
//! High-level modules
//! - `app`: winit event loop, input handling and `run`
//! - `camera`: cameras, projection math and the orbit controller
//! - `clock`: game/actual time, frame statistics and fixed steps
//! - `config`: layered configuration (defaults, TOML files, environment)
//! - `context`: window, surface, device and queue
//! - `cube_map`: the dynamic cube map render target and its face cameras
//! - `data_structures`: meshes, materials, textures, instances and uniforms
//! - `pipelines`: render pipelines and shaders
//! - `resources`: asset loading and procedural meshes
//! - `scene`: per-frame update and the seven render passes
//!

pub mod app;
pub mod camera;
pub mod clock;
pub mod config;
pub mod context;
pub mod cube_map;
pub mod data_structures;
pub mod pipelines;
pub mod resources;
pub mod scene;

pub use app::{run, run_with_config};
pub use config::AppConfig;
