//! Value noise: smoothly interpolated random values at integer lattice points.

use std::fmt;

use crate::tables::{PermTable, lerp, permutation, smooth, wrap};

/// Value noise over a seeded permutation table. Output lies in `[0, 1]`.
#[derive(Clone)]
pub struct ValueNoise {
    seed: u32,
    perm: Box<PermTable>,
}

impl ValueNoise {
    /// Builds the permutation table for `seed`.
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            perm: permutation(seed),
        }
    }

    /// The seed this kernel was built from.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    #[inline]
    fn lattice2(&self, x: usize, y: usize) -> f32 {
        let p = &self.perm;
        p[p[x] as usize + y] as f32 / 255.0
    }

    #[inline]
    fn lattice3(&self, x: usize, y: usize, z: usize) -> f32 {
        let p = &self.perm;
        p[p[p[x] as usize + y] as usize + z] as f32 / 255.0
    }

    /// Samples 2D noise at `(x, y)`.
    pub fn sample2(&self, x: f32, y: f32) -> f32 {
        let (fx, fy) = (x.floor(), y.floor());
        let (xi, yi) = (wrap(fx), wrap(fy));
        let u = smooth(x - fx);
        let v = smooth(y - fy);

        let top = lerp(self.lattice2(xi, yi), self.lattice2(xi + 1, yi), u);
        let bottom = lerp(
            self.lattice2(xi, yi + 1),
            self.lattice2(xi + 1, yi + 1),
            u,
        );
        lerp(top, bottom, v)
    }

    /// Samples 3D noise at `(x, y, z)`.
    pub fn sample3(&self, x: f32, y: f32, z: f32) -> f32 {
        let (fx, fy, fz) = (x.floor(), y.floor(), z.floor());
        let (xi, yi, zi) = (wrap(fx), wrap(fy), wrap(fz));
        let u = smooth(x - fx);
        let v = smooth(y - fy);
        let w = smooth(z - fz);

        let plane = |z: usize| {
            let top = lerp(self.lattice3(xi, yi, z), self.lattice3(xi + 1, yi, z), u);
            let bottom = lerp(
                self.lattice3(xi, yi + 1, z),
                self.lattice3(xi + 1, yi + 1, z),
                u,
            );
            lerp(top, bottom, v)
        };
        lerp(plane(zi), plane(zi + 1), w)
    }
}

impl fmt::Debug for ValueNoise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueNoise")
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}
