//! Level-of-detail selection for terrain chunks: distance thresholds,
//! mesh stride/resolution per level and transition blending.

mod selector;

pub use selector::{
    DEFAULT_TRANSITION_WIDTH, LodError, LodLevel, LodSelector, mesh_resolution, stride,
};
