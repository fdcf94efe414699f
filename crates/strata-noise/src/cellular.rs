//! Cellular (Worley) noise: distance to pseudo-random feature points.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Distance metric used to measure feature-point distances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistanceMetric {
    #[default]
    Euclidean,
    Manhattan,
    Chebyshev,
}

/// Which combination of the two nearest feature distances is returned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellularReturn {
    /// Distance to the nearest feature point.
    #[default]
    F1,
    /// Distance to the second-nearest feature point.
    F2,
    /// `F2 − F1`, which highlights cell borders.
    F2MinusF1,
    /// `(F1 + F2) / 2`.
    Average,
}

/// Worley noise with one feature point per integer cell.
///
/// Cell hashing uses odd multipliers derived from the seed, so two kernels
/// with different seeds place their feature points independently.
#[derive(Clone, Debug)]
pub struct CellularNoise {
    seed: u32,
    multipliers: [u32; 3],
    mix: u32,
    metric: DistanceMetric,
    mode: CellularReturn,
}

impl CellularNoise {
    /// Creates a kernel with Euclidean distance returning F1.
    pub fn new(seed: u32) -> Self {
        Self::with_options(seed, DistanceMetric::default(), CellularReturn::default())
    }

    /// Creates a kernel with an explicit metric and return mode.
    pub fn with_options(seed: u32, metric: DistanceMetric, mode: CellularReturn) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(u64::from(seed));
        let multipliers = [
            rng.next_u32() | 1,
            rng.next_u32() | 1,
            rng.next_u32() | 1,
        ];
        Self {
            seed,
            multipliers,
            mix: rng.next_u32(),
            metric,
            mode,
        }
    }

    /// The seed this kernel was built from.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// The configured distance metric.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// The configured return mode.
    pub fn mode(&self) -> CellularReturn {
        self.mode
    }

    /// Nominal output interval for the configured return mode.
    pub fn nominal_range(&self) -> (f32, f32) {
        match self.mode {
            CellularReturn::F1 | CellularReturn::F2MinusF1 => (0.0, 1.0),
            CellularReturn::F2 => (0.0, 1.5),
            CellularReturn::Average => (0.0, 1.25),
        }
    }

    #[inline]
    fn hash(&self, x: i32, y: i32, z: i32) -> u32 {
        let mut h = self.mix
            ^ (x as u32).wrapping_mul(self.multipliers[0])
            ^ (y as u32).wrapping_mul(self.multipliers[1])
            ^ (z as u32).wrapping_mul(self.multipliers[2]);
        h ^= h >> 16;
        h = h.wrapping_mul(0x7feb_352d);
        h ^= h >> 15;
        h = h.wrapping_mul(0x846c_a68b);
        h ^ (h >> 16)
    }

    #[inline]
    fn unit(bits: u32) -> f32 {
        (bits & 0xFFFF) as f32 / 65_535.0
    }

    #[inline]
    fn distance(&self, dx: f32, dy: f32, dz: f32) -> f32 {
        match self.metric {
            DistanceMetric::Euclidean => (dx * dx + dy * dy + dz * dz).sqrt(),
            DistanceMetric::Manhattan => dx.abs() + dy.abs() + dz.abs(),
            DistanceMetric::Chebyshev => dx.abs().max(dy.abs()).max(dz.abs()),
        }
    }

    fn combine(&self, f1: f32, f2: f32) -> f32 {
        match self.mode {
            CellularReturn::F1 => f1,
            CellularReturn::F2 => f2,
            CellularReturn::F2MinusF1 => f2 - f1,
            CellularReturn::Average => (f1 + f2) * 0.5,
        }
    }

    /// Samples 2D noise at `(x, y)` searching the surrounding 3×3 cells.
    pub fn sample2(&self, x: f32, y: f32) -> f32 {
        let cx = x.floor() as i32;
        let cy = y.floor() as i32;
        let mut f1 = f32::MAX;
        let mut f2 = f32::MAX;

        for oy in -1..=1 {
            for ox in -1..=1 {
                let (nx, ny) = (cx.wrapping_add(ox), cy.wrapping_add(oy));
                let h = self.hash(nx, ny, 0);
                let px = nx as f32 + Self::unit(h);
                let py = ny as f32 + Self::unit(h >> 16);
                let d = self.distance(px - x, py - y, 0.0);
                if d < f1 {
                    f2 = f1;
                    f1 = d;
                } else if d < f2 {
                    f2 = d;
                }
            }
        }

        self.combine(f1, f2)
    }

    /// Samples 3D noise at `(x, y, z)` searching the surrounding 3×3×3 cells.
    pub fn sample3(&self, x: f32, y: f32, z: f32) -> f32 {
        let cx = x.floor() as i32;
        let cy = y.floor() as i32;
        let cz = z.floor() as i32;
        let mut f1 = f32::MAX;
        let mut f2 = f32::MAX;

        for oz in -1..=1 {
            for oy in -1..=1 {
                for ox in -1..=1 {
                    let (nx, ny, nz) = (
                        cx.wrapping_add(ox),
                        cy.wrapping_add(oy),
                        cz.wrapping_add(oz),
                    );
                    let h = self.hash(nx, ny, nz);
                    let h2 = h.rotate_left(11).wrapping_mul(0x9e37_79b9);
                    let px = nx as f32 + Self::unit(h);
                    let py = ny as f32 + Self::unit(h >> 16);
                    let pz = nz as f32 + Self::unit(h2 >> 8);
                    let d = self.distance(px - x, py - y, pz - z);
                    if d < f1 {
                        f2 = f1;
                        f1 = d;
                    } else if d < f2 {
                        f2 = d;
                    }
                }
            }
        }

        self.combine(f1, f2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f1_never_exceeds_f2() {
        let f1 = CellularNoise::with_options(5, DistanceMetric::Euclidean, CellularReturn::F1);
        let f2 = CellularNoise::with_options(5, DistanceMetric::Euclidean, CellularReturn::F2);
        let diff =
            CellularNoise::with_options(5, DistanceMetric::Euclidean, CellularReturn::F2MinusF1);
        for i in 0..500 {
            let x = i as f32 * 0.173 - 20.0;
            let y = i as f32 * 0.091 + 4.0;
            let a = f1.sample2(x, y);
            let b = f2.sample2(x, y);
            assert!(a <= b, "F1 {a} > F2 {b}");
            assert!((diff.sample2(x, y) - (b - a)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_distances_are_non_negative_and_bounded() {
        for metric in [
            DistanceMetric::Euclidean,
            DistanceMetric::Manhattan,
            DistanceMetric::Chebyshev,
        ] {
            let noise = CellularNoise::with_options(11, metric, CellularReturn::F1);
            for i in 0..300 {
                let x = i as f32 * 0.29 - 30.0;
                let v2 = noise.sample2(x, -x * 0.5);
                let v3 = noise.sample3(x, 0.25, x * 0.1);
                assert!((0.0..=2.0).contains(&v2), "{metric:?} 2D value {v2}");
                assert!((0.0..=3.0).contains(&v3), "{metric:?} 3D value {v3}");
            }
        }
    }

    #[test]
    fn test_metric_ordering_at_same_point() {
        let e = CellularNoise::with_options(3, DistanceMetric::Euclidean, CellularReturn::F1);
        let m = CellularNoise::with_options(3, DistanceMetric::Manhattan, CellularReturn::F1);
        let c = CellularNoise::with_options(3, DistanceMetric::Chebyshev, CellularReturn::F1);
        for i in 0..200 {
            let x = i as f32 * 0.41;
            let (ve, vm, vc) = (e.sample2(x, 2.2), m.sample2(x, 2.2), c.sample2(x, 2.2));
            assert!(vc <= ve + 1e-6 && ve <= vm + 1e-6, "{vc} {ve} {vm}");
        }
    }

    #[test]
    fn test_seed_changes_feature_points() {
        let a = CellularNoise::new(1);
        let b = CellularNoise::new(2);
        let differs = (0..50).any(|i| {
            let x = i as f32 * 0.37;
            a.sample2(x, x) != b.sample2(x, x)
        });
        assert!(differs);
    }

    #[test]
    fn test_lattice_edge_does_not_overflow() {
        let noise = CellularNoise::new(9);
        assert!(noise.sample2(3.0e10, -3.0e10).is_finite());
        assert!(noise.sample3(3.0e10, 0.0, -3.0e10).is_finite());
    }
}
