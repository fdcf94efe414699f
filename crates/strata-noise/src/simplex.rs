//! Simplex noise on skewed triangular (2D) and tetrahedral (3D) lattices.

use std::fmt;

use crate::tables::{GRAD3, PermTable, dot2, dot3, permutation, wrap};

/// Skew factor `(√3 − 1) / 2`.
const F2: f32 = 0.366_025_42;
/// Unskew factor `(3 − √3) / 6`.
const G2: f32 = 0.211_324_87;
const F3: f32 = 1.0 / 3.0;
const G3: f32 = 1.0 / 6.0;

const SCALE_2D: f32 = 70.0;
const SCALE_3D: f32 = 32.0;

/// Simplex noise over a seeded permutation table. Output approximates `[-1, 1]`.
#[derive(Clone)]
pub struct SimplexNoise {
    seed: u32,
    perm: Box<PermTable>,
}

/// Squared kernel radius of a 2D corner.
const RADIUS2_2D: f32 = 0.5;
/// Squared kernel radius of a 3D corner, paired with the 3D output scale of 32.
const RADIUS2_3D: f32 = 0.6;

/// Radial falloff contribution of one simplex corner.
#[inline]
fn corner(radius2: f32, r2: f32, gradient_dot: f32) -> f32 {
    let t = radius2 - r2;
    if t <= 0.0 {
        0.0
    } else {
        let t2 = t * t;
        t2 * t2 * gradient_dot
    }
}

impl SimplexNoise {
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
    fn gradient(&self, hash: u8) -> [f32; 3] {
        GRAD3[hash as usize % 12]
    }

    /// Samples 2D noise at `(x, y)`.
    pub fn sample2(&self, x: f32, y: f32) -> f32 {
        let p = &self.perm;

        let s = (x + y) * F2;
        let i = (x + s).floor();
        let j = (y + s).floor();
        let t = (i + j) * G2;
        let x0 = x - (i - t);
        let y0 = y - (j - t);

        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - i1 as f32 + G2;
        let y1 = y0 - j1 as f32 + G2;
        let x2 = x0 - 1.0 + 2.0 * G2;
        let y2 = y0 - 1.0 + 2.0 * G2;

        let ii = wrap(i);
        let jj = wrap(j);
        let g0 = self.gradient(p[ii + p[jj] as usize]);
        let g1 = self.gradient(p[ii + i1 + p[jj + j1] as usize]);
        let g2 = self.gradient(p[ii + 1 + p[jj + 1] as usize]);

        let n0 = corner(RADIUS2_2D, x0 * x0 + y0 * y0, dot2(g0, x0, y0));
        let n1 = corner(RADIUS2_2D, x1 * x1 + y1 * y1, dot2(g1, x1, y1));
        let n2 = corner(RADIUS2_2D, x2 * x2 + y2 * y2, dot2(g2, x2, y2));

        SCALE_2D * (n0 + n1 + n2)
    }

    /// Samples 3D noise at `(x, y, z)`.
    pub fn sample3(&self, x: f32, y: f32, z: f32) -> f32 {
        let p = &self.perm;

        let s = (x + y + z) * F3;
        let i = (x + s).floor();
        let j = (y + s).floor();
        let k = (z + s).floor();
        let t = (i + j + k) * G3;
        let x0 = x - (i - t);
        let y0 = y - (j - t);
        let z0 = z - (k - t);

        // Traversal order of the tetrahedron containing the point.
        let (i1, j1, k1, i2, j2, k2) = if x0 >= y0 {
            if y0 >= z0 {
                (1, 0, 0, 1, 1, 0)
            } else if x0 >= z0 {
                (1, 0, 0, 1, 0, 1)
            } else {
                (0, 0, 1, 1, 0, 1)
            }
        } else if y0 < z0 {
            (0, 0, 1, 0, 1, 1)
        } else if x0 < z0 {
            (0, 1, 0, 0, 1, 1)
        } else {
            (0, 1, 0, 1, 1, 0)
        };

        let x1 = x0 - i1 as f32 + G3;
        let y1 = y0 - j1 as f32 + G3;
        let z1 = z0 - k1 as f32 + G3;
        let x2 = x0 - i2 as f32 + 2.0 * G3;
        let y2 = y0 - j2 as f32 + 2.0 * G3;
        let z2 = z0 - k2 as f32 + 2.0 * G3;
        let x3 = x0 - 1.0 + 3.0 * G3;
        let y3 = y0 - 1.0 + 3.0 * G3;
        let z3 = z0 - 1.0 + 3.0 * G3;

        let ii = wrap(i);
        let jj = wrap(j);
        let kk = wrap(k);
        let hash = |di: usize, dj: usize, dk: usize| -> u8 {
            p[ii + di + p[jj + dj + p[kk + dk] as usize] as usize]
        };
        let g0 = self.gradient(hash(0, 0, 0));
        let g1 = self.gradient(hash(i1, j1, k1));
        let g2 = self.gradient(hash(i2, j2, k2));
        let g3 = self.gradient(hash(1, 1, 1));

        let n0 = corner(
            RADIUS2_3D,
            x0 * x0 + y0 * y0 + z0 * z0,
            dot3(g0, x0, y0, z0),
        );
        let n1 = corner(
            RADIUS2_3D,
            x1 * x1 + y1 * y1 + z1 * z1,
            dot3(g1, x1, y1, z1),
        );
        let n2 = corner(
            RADIUS2_3D,
            x2 * x2 + y2 * y2 + z2 * z2,
            dot3(g2, x2, y2, z2),
        );
        let n3 = corner(
            RADIUS2_3D,
            x3 * x3 + y3 * y3 + z3 * z3,
            dot3(g3, x3, y3, z3),
        );

        SCALE_3D * (n0 + n1 + n2 + n3)
    }
}

impl fmt::Debug for SimplexNoise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimplexNoise")
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}
