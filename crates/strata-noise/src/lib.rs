//! Deterministic noise kernels and fractal Brownian motion for terrain generation.
//!
//! Every kernel is built from a 32-bit seed and is pure over its inputs, so a
//! kernel can be shared across threads and sampled in any order while still
//! producing bit-identical results.

mod cellular;
mod fbm;
mod gradient;
mod kernel;
mod simplex;
mod tables;
mod value;

pub use cellular::{CellularNoise, CellularReturn, DistanceMetric};
pub use fbm::{Fbm, FbmError, FbmSettings};
pub use gradient::GradientNoise;
pub use kernel::{Noise, NoiseKind};
pub use simplex::SimplexNoise;
pub use value::ValueNoise;
