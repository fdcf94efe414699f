//! Heightmap generation for the streaming terrain.
//!
//! [`HeightmapGenerator`] turns validated [`HeightmapSettings`] into heights
//! at world positions. Chunk heights are produced point-wise so neighbouring
//! chunks agree exactly along shared edges. Standalone [`Heightmap`] grids
//! support normalisation and the explicit [`erosion`] passes.

pub mod async_generation;
pub mod erosion;
pub mod generator;
pub mod heightmap;
pub mod seed;
pub mod settings;

pub use async_generation::{AsyncHeightGenerator, GeneratedHeights, HeightTask};
pub use erosion::{ErosionReport, HydraulicErosion, ThermalErosion};
pub use generator::{FalloffFrame, HeightmapGenerator};
pub use heightmap::{Heightmap, min_max, remap_unit};
pub use seed::{ClockRandomSource, FixedRandomSource, RandomSource};
pub use settings::{
    ErosionSettings, HeightmapSettings, SettingsError, TerrainWeights, ThermalSettings,
};
