//! Distance-based LOD selection with transition blending.

use serde::Serialize;
use strata_coords::{CHUNK_SIZE, MAX_LOD};
use thiserror::Error;

/// Default width of the transition band, as a fraction of a level's range.
pub const DEFAULT_TRANSITION_WIDTH: f32 = 0.1;

/// Fraction of a level's range after which [`LodSelector::transition_factor`] ramps.
const TRANSITION_START: f32 = 0.9;

/// Errors raised when building a selector from distances.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LodError {
    #[error("at least one LOD distance is required")]
    Empty,
    #[error("LOD distance #{index} is {value}, expected a finite non-negative number")]
    InvalidDistance { index: usize, value: f32 },
}

/// One level of detail.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LodLevel {
    pub level: u8,
    /// Largest camera distance this level covers.
    pub max_distance: f32,
    /// Vertices per mesh side at this level.
    pub mesh_resolution: usize,
}

/// Mesh vertex stride at `lod`: `1 << lod`.
pub fn stride(lod: u8) -> usize {
    1 << lod.min(MAX_LOD)
}

/// Vertices per mesh side at `lod`: `CHUNK_SIZE / stride + 1`.
pub fn mesh_resolution(lod: u8) -> usize {
    CHUNK_SIZE / stride(lod) + 1
}

/// Ordered set of [`LodLevel`]s, ascending by `max_distance`.
///
/// The last level's `max_distance` is the horizon; anything farther still
/// maps to the last level.
#[derive(Clone, Debug, PartialEq)]
pub struct LodSelector {
    levels: Vec<LodLevel>,
}

impl LodSelector {
    /// Builds levels from distance thresholds. Distances are sorted ascending;
    /// thresholds past [`MAX_LOD`] fold into a single coarsest level that
    /// ends at the largest distance.
    pub fn from_distances(distances: &[f32]) -> Result<Self, LodError> {
        if distances.is_empty() {
            return Err(LodError::Empty);
        }
        if let Some((index, &value)) = distances
            .iter()
            .enumerate()
            .find(|(_, d)| !d.is_finite() || **d < 0.0)
        {
            return Err(LodError::InvalidDistance { index, value });
        }

        let mut sorted = distances.to_vec();
        sorted.sort_by(f32::total_cmp);
        let mut levels: Vec<LodLevel> = Vec::with_capacity(MAX_LOD as usize + 1);
        for (i, max_distance) in sorted.into_iter().enumerate() {
            let level = i.min(MAX_LOD as usize) as u8;
            match levels.last_mut() {
                Some(last) if last.level == level => last.max_distance = max_distance,
                _ => levels.push(LodLevel {
                    level,
                    max_distance,
                    mesh_resolution: mesh_resolution(level),
                }),
            }
        }
        Ok(Self { levels })
    }

    /// `n` levels with quadratic spacing: level `i < n − 1` ends at
    /// `view_distance · ((i + 1) / n)²`, the last at `view_distance`.
    pub fn setup_default(view_distance: f32, n: usize) -> Self {
        let n = n.clamp(1, MAX_LOD as usize + 1);
        let view = if view_distance.is_finite() {
            view_distance.max(0.0)
        } else {
            0.0
        };
        let levels = (0..n)
            .map(|i| {
                let max_distance = if i + 1 == n {
                    view
                } else {
                    let t = (i + 1) as f32 / n as f32;
                    view * t * t
                };
                LodLevel {
                    level: i as u8,
                    max_distance,
                    mesh_resolution: mesh_resolution(i as u8),
                }
            })
            .collect();
        Self { levels }
    }

    pub fn levels(&self) -> &[LodLevel] {
        &self.levels
    }

    /// Level of the first entry whose `max_distance ≥ distance`, else the last.
    pub fn lod_for(&self, distance: f32) -> u8 {
        self.levels
            .iter()
            .find(|l| l.max_distance >= distance)
            .or(self.levels.last())
            .map_or(0, |l| l.level)
    }

    pub fn stride(&self, lod: u8) -> usize {
        stride(lod)
    }

    pub fn mesh_resolution(&self, lod: u8) -> usize {
        mesh_resolution(lod)
    }

    /// Distance covered by the coarsest level.
    pub fn horizon(&self) -> f32 {
        self.levels.last().map_or(0.0, |l| l.max_distance)
    }

    fn level(&self, lod: u8) -> Option<&LodLevel> {
        self.levels.iter().find(|l| l.level == lod)
    }

    /// `0` until `distance` passes 90% of the level's range, then a linear
    /// ramp reaching `1` at `max_distance`.
    pub fn transition_factor(&self, distance: f32, lod: u8) -> f32 {
        let Some(level) = self.level(lod) else {
            return 0.0;
        };
        let max = level.max_distance;
        let start = max * TRANSITION_START;
        if distance <= start {
            0.0
        } else if max <= start {
            1.0
        } else {
            ((distance - start) / (max - start)).min(1.0)
        }
    }

    /// Whether `distance` lies in `[max·(1 − width), max]` of the level.
    pub fn is_in_transition(&self, distance: f32, lod: u8, width: f32) -> bool {
        self.level(lod).is_some_and(|level| {
            let max = level.max_distance;
            distance >= max * (1.0 - width) && distance <= max
        })
    }
}
