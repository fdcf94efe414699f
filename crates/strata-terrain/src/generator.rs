//! Point-wise height pipeline: base FBM, terrain-band blend, falloff,
//! terracing and remap into the world height range.
//!
//! Every stage is a pure function of the world position, so two chunks that
//! share an edge evaluate bit-identical heights along it.

use glam::Vec2;
use strata_coords::{CHUNK_SAMPLES, CHUNK_SCALE, ChunkCoord};
use strata_noise::{Fbm, FbmSettings, Noise};

use crate::heightmap::{Heightmap, remap_unit};
use crate::seed::det_powf;
use crate::settings::{HeightmapSettings, SettingsError, TerrainWeights};

/// Seed perturbation for the ridged mountain layer.
pub const MOUNTAIN_SEED_MASK: u32 = 0x9E37_79B9;
/// Seed offset for the hill layer.
pub const HILL_SEED_OFFSET: u32 = 1013;

const FALLOFF_A: f32 = 3.0;
const FALLOFF_B: f32 = 2.2;

/// Rectangle mapped onto `[-1, 1]²` when evaluating the falloff mask.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FalloffFrame {
    pub min: Vec2,
    pub max: Vec2,
}

impl FalloffFrame {
    /// Frame spanning the sample positions of a `width × height` grid.
    pub fn grid(width: usize, height: usize) -> Self {
        Self {
            min: Vec2::ZERO,
            max: Vec2::new(
                width.saturating_sub(1).max(1) as f32,
                height.saturating_sub(1).max(1) as f32,
            ),
        }
    }

    /// World-space frame `[-extent, extent]²` centred on the origin.
    pub fn world(extent: f32) -> Self {
        Self {
            min: Vec2::splat(-extent),
            max: Vec2::splat(extent),
        }
    }

    /// Maps `p` into frame-relative `[-1, 1]` coordinates (unclamped).
    pub fn to_signed_unit(&self, p: Vec2) -> Vec2 {
        (p - self.min) / (self.max - self.min) * 2.0 - Vec2::ONE
    }
}

/// Falloff keep-curve `vᵃ / (vᵃ + (b − b·v)ᵃ)` of a smoothstepped `v ∈ [0, 1]`.
pub fn falloff_curve(v: f32) -> f32 {
    let v = v.clamp(0.0, 1.0);
    let s = v * v * (3.0 - 2.0 * v);
    let num = det_powf(s, FALLOFF_A);
    let den = num + det_powf(FALLOFF_B - FALLOFF_B * s, FALLOFF_A);
    if den <= 0.0 { 0.0 } else { num / den }
}

/// Multiplier `1 − strength·(1 − f(max(|nx|, |ny|)))` for a frame-relative point.
pub fn falloff_factor(n: Vec2, strength: f32) -> f32 {
    let v = n.x.abs().max(n.y.abs());
    1.0 - strength * (1.0 - falloff_curve(v))
}

/// Snaps `h` to one of `levels` evenly spaced plateaus.
pub fn terrace(h: f32, levels: u32) -> f32 {
    let l = levels.max(1) as f32;
    (h * l).round() / l
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Banded blend of the base value with plain, hill and mountain layers.
pub fn blend_bands(base: f32, hill: f32, mountain: f32, weights: &TerrainWeights) -> f32 {
    let w = weights.effective();
    let plain = base * 0.3;
    let blended = if base > 0.7 {
        lerp(hill, mountain, (base - 0.7) / 0.3) * (w.mountain + w.hill)
    } else if base > 0.3 {
        lerp(plain, hill, (base - 0.3) / 0.4) * (w.hill + w.plain)
    } else {
        let ocean_floor = w.ocean * 0.2;
        lerp(ocean_floor, plain, base / 0.3) * (w.plain + w.ocean)
    };
    blended.clamp(0.0, 1.0)
}

/// Evaluates [`HeightmapSettings`] at world positions.
///
/// Owns one kernel per layer; cheap to share behind an `Arc`.
#[derive(Clone, Debug)]
pub struct HeightmapGenerator {
    settings: HeightmapSettings,
    base: Noise,
    mountain: Noise,
    hill: Noise,
}

impl HeightmapGenerator {
    /// Validates `settings` and builds the layer kernels.
    pub fn new(settings: HeightmapSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        let seed = settings.seed;
        Ok(Self {
            base: Noise::from_kind(settings.kernel, seed),
            mountain: Noise::from_kind(settings.kernel, seed ^ MOUNTAIN_SEED_MASK),
            hill: Noise::from_kind(settings.kernel, seed.wrapping_add(HILL_SEED_OFFSET)),
            settings,
        })
    }

    pub fn settings(&self) -> &HeightmapSettings {
        &self.settings
    }

    /// `(min_height, max_height)` of the output.
    pub fn height_range(&self) -> (f32, f32) {
        (self.settings.min_height, self.settings.max_height)
    }

    fn unit_fbm(&self, noise: &Noise, settings: FbmSettings, raw: impl Fn(&Fbm) -> f32) -> f32 {
        let fbm = Fbm::new(noise, settings);
        noise.to_unit(raw(&fbm) / settings.amplitude)
    }

    /// Pipeline output in `[0, 1]` before the final remap.
    pub fn sample_normalized(&self, x: f32, z: f32, frame: &FalloffFrame) -> f32 {
        let s = &self.settings;

        let base = self.unit_fbm(&self.base, s.noise, |fbm| match s.domain_warp {
            Some(strength) => fbm.warped(x, z, strength),
            None => fbm.sample(x, z),
        });
        let hill = self.unit_fbm(&self.hill, FbmSettings::hills(), |fbm| fbm.sample(x, z));
        let mountain = Fbm::new(&self.mountain, FbmSettings::mountains()).ridged(x, z);

        let mut h = blend_bands(base, hill, mountain, &s.weights);

        if s.apply_falloff {
            let n = frame.to_signed_unit(Vec2::new(x, z));
            h *= falloff_factor(n, s.falloff_strength);
        }
        if let Some(levels) = s.terrace {
            h = terrace(h, levels);
        }
        h.clamp(0.0, 1.0)
    }

    /// World height at `(x, z)`, inside `[min_height, max_height]`.
    pub fn sample_height(&self, x: f32, z: f32, frame: &FalloffFrame) -> f32 {
        let (min, max) = self.height_range();
        remap_unit(self.sample_normalized(x, z, frame), min, max)
    }

    /// Falloff frame used for chunk sampling.
    pub fn chunk_frame(&self) -> FalloffFrame {
        FalloffFrame::world(self.settings.falloff_extent)
    }

    /// Standalone `width × height` grid sampled at integer positions.
    pub fn generate_grid(&self, width: usize, height: usize) -> Result<Heightmap, SettingsError> {
        if width == 0 || height == 0 {
            return Err(SettingsError::EmptyGrid { width, height });
        }
        let frame = FalloffFrame::grid(width, height);
        let mut map = Heightmap::new(width, height);
        for y in 0..height {
            for x in 0..width {
                map.set(x, y, self.sample_height(x as f32, y as f32, &frame));
            }
        }
        Ok(map)
    }

    /// `samples × samples` heights starting at integer sample `(origin_x, origin_z)`.
    ///
    /// World positions are `(origin + i) · spacing`, computed from integers so
    /// that overlapping regions evaluate identical inputs.
    pub fn generate_region(
        &self,
        origin_x: i64,
        origin_z: i64,
        samples: usize,
        spacing: f32,
    ) -> Vec<f32> {
        let frame = self.chunk_frame();
        let mut heights = Vec::with_capacity(samples * samples);
        for j in 0..samples as i64 {
            let wz = origin_z.saturating_add(j) as f32 * spacing;
            for i in 0..samples as i64 {
                let wx = origin_x.saturating_add(i) as f32 * spacing;
                heights.push(self.sample_height(wx, wz, &frame));
            }
        }
        heights
    }

    /// The `(CHUNK_SIZE + 1)²` heights of one chunk.
    pub fn generate_chunk(&self, coord: ChunkCoord) -> Vec<f32> {
        let (origin_x, origin_z) = coord.origin_sample();
        self.generate_region(origin_x, origin_z, CHUNK_SAMPLES, CHUNK_SCALE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_coords::{CHUNK_SAMPLE_COUNT, CHUNK_SIZE, sample_index};

    fn generator(settings: HeightmapSettings) -> HeightmapGenerator {
        HeightmapGenerator::new(settings).unwrap()
    }

    #[test]
    fn test_rejects_invalid_settings() {
        let bad = HeightmapSettings {
            falloff_strength: 2.0,
            ..Default::default()
        };
        assert!(HeightmapGenerator::new(bad).is_err());
    }

    #[test]
    fn test_chunk_has_full_sample_grid() {
        let g = generator(HeightmapSettings::with_seed(7));
        assert_eq!(g.generate_chunk(ChunkCoord::new(3, -2)).len(), CHUNK_SAMPLE_COUNT);
    }

    #[test]
    fn test_deterministic_across_instances() {
        let settings = HeightmapSettings::with_seed(12345);
        let a = generator(settings.clone()).generate_chunk(ChunkCoord::new(0, 0));
        let b = generator(settings).generate_chunk(ChunkCoord::new(0, 0));
        let centre = sample_index(CHUNK_SIZE / 2, CHUNK_SIZE / 2);
        assert_eq!(a[centre].to_bits(), b[centre].to_bits());
        assert_eq!(a, b);
    }

    #[test]
    fn test_adjacent_chunks_share_edges() {
        let g = generator(HeightmapSettings::with_seed(12345));
        let a = g.generate_chunk(ChunkCoord::new(-1, 0));
        let b = g.generate_chunk(ChunkCoord::new(0, 0));
        let c = g.generate_chunk(ChunkCoord::new(-1, 1));
        for k in 0..=CHUNK_SIZE {
            assert_eq!(
                a[sample_index(CHUNK_SIZE, k)].to_bits(),
                b[sample_index(0, k)].to_bits()
            );
            assert_eq!(
                a[sample_index(k, CHUNK_SIZE)].to_bits(),
                c[sample_index(k, 0)].to_bits()
            );
        }
    }

    #[test]
    fn test_extreme_chunk_coords_generate() {
        let g = generator(HeightmapSettings::with_seed(12345));
        let last = g.generate_chunk(ChunkCoord::new(i32::MAX, i32::MIN));
        let prev = g.generate_chunk(ChunkCoord::new(i32::MAX - 1, i32::MIN));
        assert_eq!(last.len(), CHUNK_SAMPLE_COUNT);
        assert!(last.iter().all(|h| h.is_finite()));
        for k in 0..=CHUNK_SIZE {
            assert_eq!(
                prev[sample_index(CHUNK_SIZE, k)].to_bits(),
                last[sample_index(0, k)].to_bits()
            );
        }
    }

    #[test]
    fn test_heights_respect_range() {
        for warp in [None, Some(2.0)] {
            let settings = HeightmapSettings {
                min_height: -10.0,
                max_height: 90.0,
                domain_warp: warp,
                terrace: Some(6),
                apply_falloff: true,
                falloff_strength: 0.7,
                falloff_extent: 64.0,
                ..HeightmapSettings::with_seed(3)
            };
            let g = generator(settings);
            for coord in [ChunkCoord::new(0, 0), ChunkCoord::new(-4, 9)] {
                for h in g.generate_chunk(coord) {
                    assert!((-10.0..=90.0).contains(&h), "height {h} out of range");
                }
            }
        }
    }

    #[test]
    fn test_blend_bands_stays_in_unit_range() {
        let weights = TerrainWeights {
            mountain: 3.0,
            hill: 2.0,
            plain: 1.0,
            ocean: 0.0,
        };
        for i in 0..=100 {
            let base = i as f32 / 100.0;
            let v = blend_bands(base, 0.8, 1.0, &weights);
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_blend_band_edges() {
        let w = TerrainWeights::default();
        // Ocean band bottom is the ocean floor scaled by plain + ocean.
        assert!((blend_bands(0.0, 0.5, 0.5, &w) - 0.1).abs() < 1e-6);
        // Ocean band at its top reaches the plain value.
        assert!((blend_bands(0.3, 0.5, 0.9, &w) - 0.09).abs() < 1e-6);
        // Mountain band at its top is the mountain value.
        assert!((blend_bands(1.0, 0.2, 0.6, &w) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_zero_weights_blend_uniformly() {
        let zero = TerrainWeights {
            mountain: 0.0,
            hill: 0.0,
            plain: 0.0,
            ocean: 0.0,
        };
        let v = blend_bands(1.0, 0.2, 0.8, &zero);
        assert!((v - 0.4).abs() < 1e-6, "got {v}");
    }

    #[test]
    fn test_falloff_curve_shape() {
        assert_eq!(falloff_curve(0.0), 0.0);
        assert!((falloff_curve(1.0) - 1.0).abs() < 1e-6);
        let mut prev = 0.0;
        for i in 1..=20 {
            let v = falloff_curve(i as f32 / 20.0);
            assert!(v >= prev);
            prev = v;
        }
        assert!((falloff_factor(Vec2::ZERO, 0.8) - 0.2).abs() < 1e-6);
        assert!((falloff_factor(Vec2::new(1.0, -0.3), 0.8) - 1.0).abs() < 1e-6);
        assert_eq!(falloff_factor(Vec2::new(0.4, 0.1), 0.0), 1.0);
    }

    #[test]
    fn test_falloff_frames() {
        let grid = FalloffFrame::grid(5, 3);
        assert_eq!(grid.to_signed_unit(Vec2::new(0.0, 0.0)), Vec2::new(-1.0, -1.0));
        assert_eq!(grid.to_signed_unit(Vec2::new(4.0, 2.0)), Vec2::new(1.0, 1.0));
        assert_eq!(grid.to_signed_unit(Vec2::new(2.0, 1.0)), Vec2::ZERO);
        let world = FalloffFrame::world(100.0);
        assert_eq!(world.to_signed_unit(Vec2::new(50.0, -100.0)), Vec2::new(0.5, -1.0));
    }

    #[test]
    fn test_terrace_snaps_levels() {
        assert_eq!(terrace(0.0, 4), 0.0);
        assert_eq!(terrace(0.3, 4), 0.25);
        assert_eq!(terrace(0.9, 4), 1.0);
        let g = generator(HeightmapSettings {
            terrace: Some(4),
            min_height: 0.0,
            max_height: 1.0,
            ..HeightmapSettings::with_seed(9)
        });
        for h in g.generate_chunk(ChunkCoord::new(1, 1)) {
            let scaled = h * 4.0;
            assert!((scaled - scaled.round()).abs() < 1e-5, "height {h} not terraced");
        }
    }

    #[test]
    fn test_generate_grid_dimensions() {
        let g = generator(HeightmapSettings::with_seed(1));
        assert!(matches!(
            g.generate_grid(0, 4),
            Err(SettingsError::EmptyGrid { width: 0, height: 4 })
        ));
        let map = g.generate_grid(17, 9).unwrap();
        assert_eq!((map.width(), map.height()), (17, 9));
        let (lo, hi) = map.min_max().unwrap();
        assert!(lo >= 0.0 && hi <= 50.0);
    }

    #[test]
    fn test_layer_seeds_are_distinct() {
        let g = generator(HeightmapSettings::with_seed(5));
        assert_eq!(g.base.seed(), 5);
        assert_eq!(g.mountain.seed(), 5 ^ MOUNTAIN_SEED_MASK);
        assert_eq!(g.hill.seed(), 5 + HILL_SEED_OFFSET);
    }
}
