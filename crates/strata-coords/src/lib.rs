//! Chunk grid addressing for the infinite terrain plane.
//!
//! The world is tiled by square chunks of [`CHUNK_SIZE`] cells, each cell
//! [`CHUNK_SCALE`] world units wide. A chunk stores `CHUNK_SIZE + 1` samples
//! per side so that neighbours share their edge row/column.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Cells per chunk side.
pub const CHUNK_SIZE: usize = 32;

/// Samples per chunk side (one extra row/column shared with the neighbour).
pub const CHUNK_SAMPLES: usize = CHUNK_SIZE + 1;

/// Total height samples stored by one chunk.
pub const CHUNK_SAMPLE_COUNT: usize = CHUNK_SAMPLES * CHUNK_SAMPLES;

/// World units between two adjacent samples.
pub const CHUNK_SCALE: f32 = 1.0;

/// World-space edge length of one chunk.
pub const CHUNK_WORLD_SIZE: f32 = CHUNK_SIZE as f32 * CHUNK_SCALE;

/// Coarsest level of detail a chunk mesh can be built at.
pub const MAX_LOD: u8 = 4;

/// Largest absolute world coordinate the streamer accepts: `2²⁴`, the last
/// magnitude at which `f32` still represents every integer sample position.
pub const MAX_WORLD_EXTENT: f32 = 16_777_216.0;

/// Identifies a tile on the infinite 2D chunk grid.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ChunkCoord {
    /// Grid column (world X / chunk size).
    pub x: i32,
    /// Grid row (world Z / chunk size).
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a chunk coordinate.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Returns the coordinate of the chunk containing world position `(x, z)`.
    ///
    /// Positions outside the `i32` chunk range saturate; NaN maps to `0`.
    pub fn from_world(x: f32, z: f32) -> Self {
        Self {
            x: (x / CHUNK_WORLD_SIZE).floor() as i32,
            z: (z / CHUNK_WORLD_SIZE).floor() as i32,
        }
    }

    /// Like [`ChunkCoord::from_world`], but `None` for non-finite positions
    /// or positions beyond [`MAX_WORLD_EXTENT`].
    pub fn try_from_world(x: f32, z: f32) -> Option<Self> {
        let in_range = |v: f32| v.is_finite() && v.abs() <= MAX_WORLD_EXTENT;
        (in_range(x) && in_range(z)).then(|| Self::from_world(x, z))
    }

    /// Returns the neighbouring coordinate offset by `(dx, dz)`, saturating
    /// at the edges of the grid.
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            z: self.z.saturating_add(dz),
        }
    }

    /// Integer sample position of the chunk's `(0, 0)` sample.
    pub fn origin_sample(self) -> (i64, i64) {
        let size = CHUNK_SIZE as i64;
        (i64::from(self.x) * size, i64::from(self.z) * size)
    }

    /// World-space position of the chunk's `(0, 0)` sample.
    pub fn origin_world(self) -> Vec2 {
        Vec2::new(
            self.x as f32 * CHUNK_WORLD_SIZE,
            self.z as f32 * CHUNK_WORLD_SIZE,
        )
    }

    /// World-space center of the chunk.
    pub fn center_world(self) -> Vec2 {
        Vec2::new(
            (self.x as f32 + 0.5) * CHUNK_WORLD_SIZE,
            (self.z as f32 + 0.5) * CHUNK_WORLD_SIZE,
        )
    }

    /// Manhattan distance in chunks.
    pub fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).saturating_add(self.z.abs_diff(other.z))
    }

    /// Chebyshev (king-move) distance in chunks.
    pub fn chebyshev(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).max(self.z.abs_diff(other.z))
    }

    /// Euclidean distance between the two chunk centers, in chunks.
    pub fn euclidean(self, other: Self) -> f32 {
        let dx = (i64::from(self.x) - i64::from(other.x)) as f32;
        let dz = (i64::from(self.z) - i64::from(other.z)) as f32;
        (dx * dx + dz * dz).sqrt()
    }

    /// Euclidean distance between the two chunk centers, in world units.
    pub fn world_distance(self, other: Self) -> f32 {
        self.euclidean(other) * CHUNK_WORLD_SIZE
    }

    /// Distance from a world-space point to this chunk's center.
    pub fn distance_to_point(self, point: Vec2) -> f32 {
        self.center_world().distance(point)
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Row-major index of sample `(x, z)` inside a chunk heights buffer.
#[inline]
pub fn sample_index(x: usize, z: usize) -> usize {
    debug_assert!(x < CHUNK_SAMPLES && z < CHUNK_SAMPLES);
    z * CHUNK_SAMPLES + x
}
