//! Closed set of noise kernels dispatched by `match`.

use serde::{Deserialize, Serialize};

use crate::cellular::{CellularNoise, CellularReturn, DistanceMetric};
use crate::gradient::GradientNoise;
use crate::simplex::SimplexNoise;
use crate::value::ValueNoise;

/// Serializable description of which kernel to build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoiseKind {
    Gradient,
    #[default]
    Simplex,
    Cellular {
        metric: DistanceMetric,
        mode: CellularReturn,
    },
    Value,
}

/// A seeded noise kernel.
#[derive(Clone, Debug)]
pub enum Noise {
    Gradient(GradientNoise),
    Simplex(SimplexNoise),
    Cellular(CellularNoise),
    Value(ValueNoise),
}

impl Noise {
    /// Builds the kernel described by `kind` from `seed`.
    pub fn from_kind(kind: NoiseKind, seed: u32) -> Self {
        match kind {
            NoiseKind::Gradient => Self::Gradient(GradientNoise::new(seed)),
            NoiseKind::Simplex => Self::Simplex(SimplexNoise::new(seed)),
            NoiseKind::Cellular { metric, mode } => {
                Self::Cellular(CellularNoise::with_options(seed, metric, mode))
            }
            NoiseKind::Value => Self::Value(ValueNoise::new(seed)),
        }
    }

    /// The kind this kernel was built from.
    pub fn kind(&self) -> NoiseKind {
        match self {
            Self::Gradient(_) => NoiseKind::Gradient,
            Self::Simplex(_) => NoiseKind::Simplex,
            Self::Cellular(c) => NoiseKind::Cellular {
                metric: c.metric(),
                mode: c.mode(),
            },
            Self::Value(_) => NoiseKind::Value,
        }
    }

    pub fn seed(&self) -> u32 {
        match self {
            Self::Gradient(n) => n.seed(),
            Self::Simplex(n) => n.seed(),
            Self::Cellular(n) => n.seed(),
            Self::Value(n) => n.seed(),
        }
    }

    #[inline]
    pub fn sample2(&self, x: f32, y: f32) -> f32 {
        match self {
            Self::Gradient(n) => n.sample2(x, y),
            Self::Simplex(n) => n.sample2(x, y),
            Self::Cellular(n) => n.sample2(x, y),
            Self::Value(n) => n.sample2(x, y),
        }
    }

    #[inline]
    pub fn sample3(&self, x: f32, y: f32, z: f32) -> f32 {
        match self {
            Self::Gradient(n) => n.sample3(x, y, z),
            Self::Simplex(n) => n.sample3(x, y, z),
            Self::Cellular(n) => n.sample3(x, y, z),
            Self::Value(n) => n.sample3(x, y, z),
        }
    }

    /// Advertised output interval, used when remapping samples to `[0, 1]`.
    pub fn nominal_range(&self) -> (f32, f32) {
        match self {
            Self::Gradient(_) | Self::Simplex(_) => (-1.0, 1.0),
            Self::Cellular(c) => c.nominal_range(),
            Self::Value(_) => (0.0, 1.0),
        }
    }

    /// Maps `v` from [`Self::nominal_range`] into `[0, 1]`, clamped.
    pub fn to_unit(&self, v: f32) -> f32 {
        let (lo, hi) = self.nominal_range();
        ((v - lo) / (hi - lo)).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: [NoiseKind; 4] = [
        NoiseKind::Gradient,
        NoiseKind::Simplex,
        NoiseKind::Cellular {
            metric: DistanceMetric::Manhattan,
            mode: CellularReturn::F2MinusF1,
        },
        NoiseKind::Value,
    ];

    #[test]
    fn test_kind_round_trips_through_kernel() {
        for kind in ALL_KINDS {
            let noise = Noise::from_kind(kind, 99);
            assert_eq!(noise.kind(), kind);
            assert_eq!(noise.seed(), 99);
        }
    }

    #[test]
    fn test_dispatch_matches_concrete_kernel() {
        let direct = SimplexNoise::new(4);
        let wrapped = Noise::from_kind(NoiseKind::Simplex, 4);
        for i in 0..50 {
            let x = i as f32 * 0.7;
            assert_eq!(direct.sample2(x, 1.0), wrapped.sample2(x, 1.0));
            assert_eq!(direct.sample3(x, 1.0, 2.0), wrapped.sample3(x, 1.0, 2.0));
        }
    }

    #[test]
    fn test_to_unit_clamps() {
        for kind in ALL_KINDS {
            let noise = Noise::from_kind(kind, 1);
            for i in 0..200 {
                let x = i as f32 * 0.31 - 10.0;
                let u = noise.to_unit(noise.sample2(x, x * 0.3));
                assert!((0.0..=1.0).contains(&u), "{kind:?} produced {u}");
            }
        }
        let simplex = Noise::from_kind(NoiseKind::Simplex, 0);
        assert_eq!(simplex.to_unit(-5.0), 0.0);
        assert_eq!(simplex.to_unit(0.0), 0.5);
        assert_eq!(simplex.to_unit(5.0), 1.0);
    }

    #[test]
    fn test_default_kind_is_simplex() {
        assert_eq!(NoiseKind::default(), NoiseKind::Simplex);
    }
}
