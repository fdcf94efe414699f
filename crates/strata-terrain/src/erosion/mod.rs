//! Post-generation erosion passes over a standalone [`Heightmap`](crate::Heightmap).
//!
//! Erosion is never run implicitly by the pipeline; callers invoke it on
//! grids they own.

mod hydraulic;
mod thermal;

pub use hydraulic::{ErosionReport, HydraulicErosion};
pub use thermal::ThermalErosion;
