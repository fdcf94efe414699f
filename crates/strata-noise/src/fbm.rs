//! Fractal Brownian motion: octave stacking over any [`Noise`] kernel.
//!
//! All variants are pure over `(x, y)` and run in O(octaves). The sampler
//! borrows its kernel, so one kernel can back several samplers with
//! different settings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::kernel::Noise;

/// Upper bound on octave count.
pub const MAX_OCTAVES: u32 = 12;

/// Offsets of the second domain-warp helper sample.
const WARP_SHIFT: (f32, f32) = (5.2, 1.3);
/// Domain-warp displacement multiplier applied on top of the strength.
const WARP_SCALE: f32 = 4.0;
/// Final ridged multiplier before clamping.
const RIDGED_SCALE: f32 = 1.25;

/// Errors raised while validating [`FbmSettings`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FbmError {
    #[error("invalid fbm setting `{field}`: {reason}")]
    InvalidSettings {
        field: &'static str,
        reason: &'static str,
    },
}

/// Octave-stacking parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FbmSettings {
    /// Number of octaves, `1..=12`.
    pub octaves: u32,
    /// Frequency of the first octave.
    pub frequency: f32,
    /// Amplitude of the first octave.
    pub amplitude: f32,
    /// Frequency multiplier between octaves.
    pub lacunarity: f32,
    /// Amplitude multiplier between octaves.
    pub persistence: f32,
    /// Ridged only: weight feedback from one octave to the next.
    pub gain: f32,
    /// Ridged only: value the absolute noise is subtracted from.
    pub offset: f32,
}

impl Default for FbmSettings {
    fn default() -> Self {
        Self::terrain()
    }
}

impl FbmSettings {
    /// Broad rolling base terrain.
    pub fn terrain() -> Self {
        Self {
            octaves: 6,
            frequency: 0.005,
            amplitude: 1.0,
            lacunarity: 2.0,
            persistence: 0.5,
            gain: 2.0,
            offset: 1.0,
        }
    }

    /// Sharper settings intended for the ridged mountain layer.
    pub fn mountains() -> Self {
        Self {
            octaves: 7,
            frequency: 0.004,
            amplitude: 1.0,
            lacunarity: 2.1,
            persistence: 0.55,
            gain: 2.2,
            offset: 1.0,
        }
    }

    /// Higher-frequency standard settings for the hill layer.
    pub fn hills() -> Self {
        Self {
            octaves: 4,
            frequency: 0.02,
            amplitude: 1.0,
            lacunarity: 2.0,
            persistence: 0.45,
            gain: 2.0,
            offset: 1.0,
        }
    }

    /// Rejects out-of-range octave counts and non-finite or non-positive parameters.
    pub fn validate(&self) -> Result<(), FbmError> {
        if self.octaves == 0 || self.octaves > MAX_OCTAVES {
            return Err(FbmError::InvalidSettings {
                field: "octaves",
                reason: "must be in 1..=12",
            });
        }
        let positive = [
            ("frequency", self.frequency),
            ("amplitude", self.amplitude),
            ("lacunarity", self.lacunarity),
            ("persistence", self.persistence),
            ("gain", self.gain),
        ];
        for (field, value) in positive {
            if !value.is_finite() {
                return Err(FbmError::InvalidSettings {
                    field,
                    reason: "must be finite",
                });
            }
            if value <= 0.0 {
                return Err(FbmError::InvalidSettings {
                    field,
                    reason: "must be greater than zero",
                });
            }
        }
        if !self.offset.is_finite() {
            return Err(FbmError::InvalidSettings {
                field: "offset",
                reason: "must be finite",
            });
        }
        Ok(())
    }

    /// `Σ persistenceⁱ` over all octaves.
    pub fn persistence_sum(&self) -> f32 {
        let mut sum = 0.0;
        let mut p = 1.0;
        for _ in 0..self.octaves {
            sum += p;
            p *= self.persistence;
        }
        sum
    }
}

/// Fractal sampler over a borrowed kernel.
#[derive(Clone, Copy, Debug)]
pub struct Fbm<'a> {
    noise: &'a Noise,
    settings: FbmSettings,
}

impl<'a> Fbm<'a> {
    pub fn new(noise: &'a Noise, settings: FbmSettings) -> Self {
        Self { noise, settings }
    }

    pub fn settings(&self) -> &FbmSettings {
        &self.settings
    }

    pub fn noise(&self) -> &'a Noise {
        self.noise
    }

    /// Theoretical maximum of `Σ amplitude·persistenceⁱ`.
    pub fn max_amplitude(&self) -> f32 {
        self.settings.amplitude * self.settings.persistence_sum()
    }

    /// Runs `f(noise_sample)` for every octave and returns the amplitude-weighted sum.
    #[inline]
    fn accumulate2(&self, x: f32, y: f32, mut f: impl FnMut(f32) -> f32) -> f32 {
        let s = &self.settings;
        let mut total = 0.0;
        let mut frequency = s.frequency;
        let mut amplitude = s.amplitude;
        for _ in 0..s.octaves {
            total += amplitude * f(self.noise.sample2(x * frequency, y * frequency));
            frequency *= s.lacunarity;
            amplitude *= s.persistence;
        }
        total
    }

    #[inline]
    fn accumulate3(&self, x: f32, y: f32, z: f32, mut f: impl FnMut(f32) -> f32) -> f32 {
        let s = &self.settings;
        let mut total = 0.0;
        let mut frequency = s.frequency;
        let mut amplitude = s.amplitude;
        for _ in 0..s.octaves {
            let n = self
                .noise
                .sample3(x * frequency, y * frequency, z * frequency);
            total += amplitude * f(n);
            frequency *= s.lacunarity;
            amplitude *= s.persistence;
        }
        total
    }

    /// Standard FBM, normalised by `Σ persistenceⁱ`.
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        self.accumulate2(x, y, |n| n) / self.settings.persistence_sum()
    }

    /// Ridged multifractal in `[0, 1]`.
    ///
    /// Each octave is `(offset − |n|)²` weighted by the previous octave's
    /// signal times `gain`, clamped to `[0, 1]`.
    pub fn ridged(&self, x: f32, y: f32) -> f32 {
        let s = &self.settings;
        let mut weight = 1.0;
        let sum = self.accumulate2(x, y, |n| {
            let mut signal = s.offset - n.abs();
            signal *= signal;
            signal *= weight;
            weight = (signal * s.gain).clamp(0.0, 1.0);
            signal
        });
        (sum / self.max_amplitude() * RIDGED_SCALE).clamp(0.0, 1.0)
    }

    /// Sum of absolute octave values, normalised by `Σ persistenceⁱ`.
    pub fn turbulence(&self, x: f32, y: f32) -> f32 {
        self.accumulate2(x, y, f32::abs) / self.settings.persistence_sum()
    }

    /// Puffy variant: each octave is `2|n| − 1`; result remapped to `[0, 1]`.
    pub fn billow(&self, x: f32, y: f32) -> f32 {
        let v = self.accumulate2(x, y, |n| 2.0 * n.abs() - 1.0) / self.settings.persistence_sum();
        (v + 1.0) * 0.5
    }

    /// Single-pass domain warp.
    pub fn warped(&self, x: f32, y: f32, strength: f32) -> f32 {
        let qx = self.sample(x, y);
        let qy = self.sample(x + WARP_SHIFT.0, y + WARP_SHIFT.1);
        let k = strength * WARP_SCALE;
        self.sample(x + k * qx, y + k * qy)
    }

    /// Repeated domain warp. Iteration `i` shifts its helper samples by
    /// `(i·1.7 + 0.5, i·2.3 + 1.1)` and accumulates the displacement.
    pub fn warped_iterated(&self, x: f32, y: f32, strength: f32, iterations: u32) -> f32 {
        let k = strength * WARP_SCALE;
        let (mut px, mut py) = (x, y);
        for i in 0..iterations {
            let ox = i as f32 * 1.7 + 0.5;
            let oy = i as f32 * 2.3 + 1.1;
            let qx = self.sample(px + ox, py + oy);
            let qy = self.sample(px + ox + WARP_SHIFT.0, py + oy + WARP_SHIFT.1);
            px += k * qx;
            py += k * qy;
        }
        self.sample(px, py)
    }

    /// Standard FBM over 3D space.
    pub fn sample3(&self, x: f32, y: f32, z: f32) -> f32 {
        self.accumulate3(x, y, z, |n| n) / self.settings.persistence_sum()
    }

    /// Ridged multifractal over 3D space.
    pub fn ridged3(&self, x: f32, y: f32, z: f32) -> f32 {
        let s = &self.settings;
        let mut weight = 1.0;
        let sum = self.accumulate3(x, y, z, |n| {
            let mut signal = s.offset - n.abs();
            signal *= signal;
            signal *= weight;
            weight = (signal * s.gain).clamp(0.0, 1.0);
            signal
        });
        (sum / self.max_amplitude() * RIDGED_SCALE).clamp(0.0, 1.0)
    }

    /// Turbulence over 3D space.
    pub fn turbulence3(&self, x: f32, y: f32, z: f32) -> f32 {
        self.accumulate3(x, y, z, f32::abs) / self.settings.persistence_sum()
    }
}
