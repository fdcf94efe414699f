//! Improved Perlin gradient noise.

use std::fmt;

use crate::tables::{GRAD3, PermTable, dot2, dot3, fade, lerp, permutation, wrap};

/// Classic gradient (Perlin) noise over a seeded permutation table.
///
/// Output lies roughly in `[-1, 1]` and is exactly zero at integer lattice points.
#[derive(Clone)]
pub struct GradientNoise {
    seed: u32,
    perm: Box<PermTable>,
}

impl GradientNoise {
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
    fn grad2(&self, hash: u8, x: f32, y: f32) -> f32 {
        dot2(GRAD3[hash as usize % 12], x, y)
    }

    #[inline]
    fn grad3(&self, hash: u8, x: f32, y: f32, z: f32) -> f32 {
        dot3(GRAD3[hash as usize % 12], x, y, z)
    }

    /// Samples 2D noise at `(x, y)`.
    pub fn sample2(&self, x: f32, y: f32) -> f32 {
        let p = &self.perm;
        let (fx, fy) = (x.floor(), y.floor());
        let (xf, yf) = (x - fx, y - fy);
        let (xi, yi) = (wrap(fx), wrap(fy));
        let u = fade(xf);
        let v = fade(yf);

        let a = p[xi] as usize + yi;
        let b = p[xi + 1] as usize + yi;

        let x1 = lerp(
            self.grad2(p[a], xf, yf),
            self.grad2(p[b], xf - 1.0, yf),
            u,
        );
        let x2 = lerp(
            self.grad2(p[a + 1], xf, yf - 1.0),
            self.grad2(p[b + 1], xf - 1.0, yf - 1.0),
            u,
        );
        lerp(x1, x2, v)
    }

    /// Samples 3D noise at `(x, y, z)`.
    pub fn sample3(&self, x: f32, y: f32, z: f32) -> f32 {
        let p = &self.perm;
        let (fx, fy, fz) = (x.floor(), y.floor(), z.floor());
        let (xf, yf, zf) = (x - fx, y - fy, z - fz);
        let (xi, yi, zi) = (wrap(fx), wrap(fy), wrap(fz));
        let u = fade(xf);
        let v = fade(yf);
        let w = fade(zf);

        let a = p[xi] as usize + yi;
        let aa = p[a] as usize + zi;
        let ab = p[a + 1] as usize + zi;
        let b = p[xi + 1] as usize + yi;
        let ba = p[b] as usize + zi;
        let bb = p[b + 1] as usize + zi;

        let near = lerp(
            lerp(
                self.grad3(p[aa], xf, yf, zf),
                self.grad3(p[ba], xf - 1.0, yf, zf),
                u,
            ),
            lerp(
                self.grad3(p[ab], xf, yf - 1.0, zf),
                self.grad3(p[bb], xf - 1.0, yf - 1.0, zf),
                u,
            ),
            v,
        );
        let far = lerp(
            lerp(
                self.grad3(p[aa + 1], xf, yf, zf - 1.0),
                self.grad3(p[ba + 1], xf - 1.0, yf, zf - 1.0),
                u,
            ),
            lerp(
                self.grad3(p[ab + 1], xf, yf - 1.0, zf - 1.0),
                self.grad3(p[bb + 1], xf - 1.0, yf - 1.0, zf - 1.0),
                u,
            ),
            v,
        );
        lerp(near, far, w)
    }
}

impl fmt::Debug for GradientNoise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GradientNoise")
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_at_lattice_points() {
        let noise = GradientNoise::new(42);
        for i in -5..5 {
            for j in -5..5 {
                assert_eq!(noise.sample2(i as f32, j as f32), 0.0);
                assert_eq!(noise.sample3(i as f32, j as f32, 3.0), 0.0);
            }
        }
    }

    #[test]
    fn test_output_roughly_unit_range() {
        let noise = GradientNoise::new(9);
        for i in 0..2000 {
            let x = i as f32 * 0.137 - 50.0;
            let y = i as f32 * 0.071 + 3.3;
            let v2 = noise.sample2(x, y);
            let v3 = noise.sample3(x, y, x * 0.5);
            assert!(v2.abs() <= 1.1, "2D sample {v2} out of range");
            assert!(v3.abs() <= 1.1, "3D sample {v3} out of range");
        }
    }

    #[test]
    fn test_same_seed_same_output() {
        let a = GradientNoise::new(12345);
        let b = GradientNoise::new(12345);
        for i in 0..100 {
            let x = i as f32 * 0.31;
            assert_eq!(a.sample2(x, -x).to_bits(), b.sample2(x, -x).to_bits());
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = GradientNoise::new(1);
        let b = GradientNoise::new(2);
        let differs = (0..50).any(|i| {
            let x = i as f32 * 0.37 + 0.5;
            a.sample2(x, x * 0.7) != b.sample2(x, x * 0.7)
        });
        assert!(differs);
    }

    #[test]
    fn test_continuity() {
        let noise = GradientNoise::new(3);
        let step = 0.001;
        for i in 0..5000 {
            let x = i as f32 * step;
            let d = (noise.sample2(x + step, 0.3) - noise.sample2(x, 0.3)).abs();
            assert!(d < 0.05, "jump {d} at x={x}");
        }
    }
}
