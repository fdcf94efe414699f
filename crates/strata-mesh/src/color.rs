//! Vertex color decoration keyed by normalized height and slope.

/// Supplies a vertex color for a terrain sample.
///
/// `normalized_height` is in `[0, 1]` across the generator's height range,
/// `slope` is `1 − normal.y` (0 on flat ground).
pub trait ColorDecorator {
    fn color(&self, normalized_height: f32, slope: f32) -> [f32; 4];
}

/// Six-band height palette with slope-driven rock on grassland.
#[derive(Clone, Debug, PartialEq)]
pub struct SlopePalette {
    pub water_level: f32,
    pub sand_level: f32,
    pub grass_level: f32,
    pub rock_level: f32,
    /// Slope where grass starts turning into rock.
    pub rock_slope_start: f32,
    /// Slope range over which the grass-to-rock blend completes.
    pub rock_slope_range: f32,
    pub deep_water: [f32; 3],
    pub shallow_water: [f32; 3],
    pub sand: [f32; 3],
    pub grass: [f32; 3],
    pub rock: [f32; 3],
    pub snow: [f32; 3],
}

impl Default for SlopePalette {
    fn default() -> Self {
        Self {
            water_level: 0.2,
            sand_level: 0.25,
            grass_level: 0.6,
            rock_level: 0.8,
            rock_slope_start: 0.3,
            rock_slope_range: 0.4,
            deep_water: [0.05, 0.12, 0.35],
            shallow_water: [0.15, 0.35, 0.60],
            sand: [0.76, 0.70, 0.50],
            grass: [0.22, 0.50, 0.18],
            rock: [0.45, 0.42, 0.40],
            snow: [0.95, 0.95, 0.97],
        }
    }
}

fn mix(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    let s = 1.0 - t;
    [a[0] * s + b[0] * t, a[1] * s + b[1] * t, a[2] * s + b[2] * t]
}

/// Position of `v` inside `[lo, hi]`, clamped to `[0, 1]`.
fn band_t(v: f32, lo: f32, hi: f32) -> f32 {
    if hi <= lo {
        return 1.0;
    }
    ((v - lo) / (hi - lo)).clamp(0.0, 1.0)
}

impl SlopePalette {
    /// Grass-to-rock blend weight for `slope`.
    pub fn rock_blend(&self, slope: f32) -> f32 {
        if self.rock_slope_range <= 0.0 {
            return if slope >= self.rock_slope_start { 1.0 } else { 0.0 };
        }
        ((slope - self.rock_slope_start) / self.rock_slope_range).clamp(0.0, 1.0)
    }

    fn rgb(&self, h: f32, slope: f32) -> [f32; 3] {
        let h = if h.is_finite() { h.clamp(0.0, 1.0) } else { 0.0 };
        if h < self.water_level {
            mix(self.deep_water, self.shallow_water, band_t(h, 0.0, self.water_level))
        } else if h < self.sand_level {
            mix(
                self.shallow_water,
                self.sand,
                band_t(h, self.water_level, self.sand_level),
            )
        } else if h < self.grass_level {
            let ground = mix(self.sand, self.grass, band_t(h, self.sand_level, self.grass_level));
            mix(ground, self.rock, self.rock_blend(slope))
        } else if h < self.rock_level {
            mix(self.grass, self.rock, band_t(h, self.grass_level, self.rock_level))
        } else {
            mix(self.rock, self.snow, band_t(h, self.rock_level, 1.0))
        }
    }
}

impl ColorDecorator for SlopePalette {
    fn color(&self, normalized_height: f32, slope: f32) -> [f32; 4] {
        let [r, g, b] = self.rgb(normalized_height, slope);
        [r, g, b, 1.0]
    }
}

/// Paints every vertex the same color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlatColor(pub [f32; 4]);

impl ColorDecorator for FlatColor {
    fn color(&self, _normalized_height: f32, _slope: f32) -> [f32; 4] {
        self.0
    }
}
