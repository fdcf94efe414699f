//! Seed-derived lookup tables and interpolation helpers shared by the kernels.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

/// The 12 edge-midpoint gradients of a cube.
pub(crate) const GRAD3: [[f32; 3]; 12] = [
    [1.0, 1.0, 0.0],
    [-1.0, 1.0, 0.0],
    [1.0, -1.0, 0.0],
    [-1.0, -1.0, 0.0],
    [1.0, 0.0, 1.0],
    [-1.0, 0.0, 1.0],
    [1.0, 0.0, -1.0],
    [-1.0, 0.0, -1.0],
    [0.0, 1.0, 1.0],
    [0.0, -1.0, 1.0],
    [0.0, 1.0, -1.0],
    [0.0, -1.0, -1.0],
];

/// A permutation of `0..=255` repeated twice so lookups never need wrapping.
pub(crate) type PermTable = [u8; 512];

/// Shuffle `0..=255` with a ChaCha stream seeded from `seed`, then double it.
pub(crate) fn permutation(seed: u32) -> Box<PermTable> {
    let mut rng = ChaCha8Rng::seed_from_u64(u64::from(seed));
    let mut base: Vec<u8> = (0..=255).collect();
    base.shuffle(&mut rng);

    let mut table = Box::new([0u8; 512]);
    for (i, slot) in table.iter_mut().enumerate() {
        *slot = base[i & 255];
    }
    table
}

/// Wrap a floored lattice coordinate into the `0..=255` table range.
#[inline]
pub(crate) fn wrap(cell: f32) -> usize {
    (cell as i32 & 255) as usize
}

/// Improved Perlin fade curve `6t⁵ − 15t⁴ + 10t³`.
#[inline]
pub(crate) fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

/// Cubic smoothstep `3t² − 2t³`.
#[inline]
pub(crate) fn smooth(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

#[inline]
pub(crate) fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}

#[inline]
pub(crate) fn dot2(g: [f32; 3], x: f32, y: f32) -> f32 {
    g[0] * x + g[1] * y
}

#[inline]
pub(crate) fn dot3(g: [f32; 3], x: f32, y: f32, z: f32) -> f32 {
    g[0] * x + g[1] * y + g[2] * z
}
