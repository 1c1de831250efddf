// src/lib.rs
//! Tile floor planner: room and tile input in, a tiled 3D floor, its joint
//! grid and a material estimate out.

pub mod camera;
pub mod catalog;
pub mod config;
pub mod error;
pub mod estimate;
pub mod floor;
pub mod grid;
pub mod planner;
pub mod resolver;
pub mod scene;
pub mod texture;
pub mod units;

pub use catalog::{MapUrls, TileCatalog, TileDesign};
pub use config::{InputField, Pattern, PlannerConfig, PlannerInputs};
pub use error::{PlannerError, Result};
pub use estimate::{estimate, Estimate, EstimateReport};
pub use planner::{FloorLayout, FloorPlanner, Selection};
pub use resolver::{FsTextureLoader, MemoryTextureLoader, TextureCache, TextureLoader, TextureResolver};
pub use scene::SceneSnapshot;
pub use texture::{Texture, TextureHandle};
