//! Grid mesher for a chunk's `(SIZE+1)²` height samples.
//!
//! Vertices are emitted row-major (`z` outer, `x` inner) every `1 << lod`
//! samples. Each grid quad becomes two triangles wound counter-clockwise
//! when seen from above, so faces point toward `+Y`.

use glam::Vec2;
use strata_coords::{
    CHUNK_SAMPLE_COUNT, CHUNK_SAMPLES, CHUNK_SCALE, CHUNK_SIZE, MAX_LOD, sample_index,
};

use crate::color::ColorDecorator;
use crate::float3::{self, Float3};
use crate::vertex::{MeshData, MeshVertex};

/// Vertices per side for `lod`.
pub fn grid_resolution(lod: u8) -> usize {
    CHUNK_SIZE / (1 << lod.min(MAX_LOD)) + 1
}

/// Surface normal at sample `(x, z)` from central differences.
///
/// Neighbours outside the grid are replaced by the edge sample.
pub fn sample_normal(heights: &[f32], x: usize, z: usize) -> Float3 {
    let last = CHUNK_SAMPLES - 1;
    let h = |sx: usize, sz: usize| heights[sample_index(sx.min(last), sz.min(last))];

    let left = h(x.saturating_sub(1), z);
    let right = h(x + 1, z);
    let back = h(x, z.saturating_sub(1));
    let front = h(x, z + 1);

    float3::normalize(Float3::new(
        (left - right) * 0.5,
        CHUNK_SCALE,
        (back - front) * 0.5,
    ))
}

/// Builds the chunk mesh at `lod`.
///
/// `origin` is the chunk's world-space corner; `height_range` is the
/// generator's `(min, max)` used to normalise heights for coloring.
///
/// # Panics
///
/// Panics if `heights` does not hold exactly `CHUNK_SAMPLE_COUNT` samples.
pub fn build_heightfield_mesh(
    heights: &[f32],
    origin: Vec2,
    lod: u8,
    height_range: (f32, f32),
    decorator: &dyn ColorDecorator,
) -> MeshData {
    assert_eq!(
        heights.len(),
        CHUNK_SAMPLE_COUNT,
        "heightfield must be {CHUNK_SAMPLES}x{CHUNK_SAMPLES}"
    );

    let stride = 1usize << lod.min(MAX_LOD);
    let res = grid_resolution(lod);
    let (min_h, max_h) = height_range;
    let span = max_h - min_h;

    let mut mesh = MeshData::with_capacity(res * res, (res - 1) * (res - 1) * 6);

    for z in (0..=CHUNK_SIZE).step_by(stride) {
        for x in (0..=CHUNK_SIZE).step_by(stride) {
            let h = heights[sample_index(x, z)];
            let normal = sample_normal(heights, x, z);
            let normalized = if span > 0.0 { (h - min_h) / span } else { 0.5 };
            let slope = 1.0 - normal.y;

            mesh.vertices.push(MeshVertex {
                position: [
                    origin.x + x as f32 * CHUNK_SCALE,
                    h,
                    origin.y + z as f32 * CHUNK_SCALE,
                ],
                normal: normal.to_array(),
                uv: [x as f32 / CHUNK_SIZE as f32, z as f32 / CHUNK_SIZE as f32],
                color: decorator.color(normalized, slope),
            });
        }
    }

    let row = res as u32;
    for gz in 0..row - 1 {
        for gx in 0..row - 1 {
            let tl = gz * row + gx;
            let tr = tl + 1;
            let bl = tl + row;
            let br = bl + 1;
            mesh.indices.extend_from_slice(&[tl, bl, br, tl, br, tr]);
        }
    }

    mesh
}
