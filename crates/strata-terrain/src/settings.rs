//! Value types configuring height generation and erosion.

use serde::{Deserialize, Serialize};
use strata_noise::{FbmError, FbmSettings, NoiseKind};
use thiserror::Error;

/// Errors raised when settings or grid dimensions are rejected.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SettingsError {
    #[error(transparent)]
    Fbm(#[from] FbmError),
    #[error("invalid setting `{field}`: {reason}")]
    InvalidSettings {
        field: &'static str,
        reason: &'static str,
    },
    #[error("grid must have non-zero dimensions, got {width}x{height}")]
    EmptyGrid { width: usize, height: usize },
    #[error("grid data has {actual} samples, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

fn invalid(field: &'static str, reason: &'static str) -> SettingsError {
    SettingsError::InvalidSettings { field, reason }
}

fn check_finite(field: &'static str, value: f32) -> Result<(), SettingsError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, "must be finite"))
    }
}

fn check_unit(field: &'static str, value: f32) -> Result<(), SettingsError> {
    check_finite(field, value)?;
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, "must be in [0, 1]"))
    }
}

fn check_non_negative(field: &'static str, value: f32) -> Result<(), SettingsError> {
    check_finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must not be negative"))
    }
}

/// Relative contribution of each terrain band.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainWeights {
    pub mountain: f32,
    pub hill: f32,
    pub plain: f32,
    pub ocean: f32,
}

impl Default for TerrainWeights {
    fn default() -> Self {
        Self {
            mountain: 0.5,
            hill: 0.5,
            plain: 0.5,
            ocean: 0.5,
        }
    }
}

impl TerrainWeights {
    /// Weights actually used for blending. A zero sum falls back to ¼ each.
    pub fn effective(&self) -> Self {
        let sum = self.mountain + self.hill + self.plain + self.ocean;
        if sum <= 0.0 {
            Self {
                mountain: 0.25,
                hill: 0.25,
                plain: 0.25,
                ocean: 0.25,
            }
        } else {
            *self
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        check_non_negative("weights.mountain", self.mountain)?;
        check_non_negative("weights.hill", self.hill)?;
        check_non_negative("weights.plain", self.plain)?;
        check_non_negative("weights.ocean", self.ocean)
    }
}

/// Everything needed to turn a world position into a height.
///
/// Held by value by the generator and never mutated during generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightmapSettings {
    pub seed: u32,
    pub noise: FbmSettings,
    pub kernel: NoiseKind,
    pub min_height: f32,
    pub max_height: f32,
    pub weights: TerrainWeights,
    pub apply_falloff: bool,
    /// How strongly the falloff mask attenuates heights, `[0, 1]`.
    pub falloff_strength: f32,
    /// World-space half size of the falloff frame used for chunks.
    pub falloff_extent: f32,
    /// Terrace level count, if terracing is enabled.
    pub terrace: Option<u32>,
    /// Domain-warp strength, if warping is enabled.
    pub domain_warp: Option<f32>,
}

impl Default for HeightmapSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            noise: FbmSettings::terrain(),
            kernel: NoiseKind::Simplex,
            min_height: 0.0,
            max_height: 50.0,
            weights: TerrainWeights::default(),
            apply_falloff: false,
            falloff_strength: 1.0,
            falloff_extent: 1024.0,
            terrace: None,
            domain_warp: None,
        }
    }
}

impl HeightmapSettings {
    /// Default settings for `seed`.
    pub fn with_seed(seed: u32) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// Validates and returns `self`.
    pub fn validated(self) -> Result<Self, SettingsError> {
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.noise.validate()?;
        check_finite("min_height", self.min_height)?;
        check_finite("max_height", self.max_height)?;
        if self.min_height > self.max_height {
            return Err(invalid("min_height", "must not exceed max_height"));
        }
        self.weights.validate()?;
        check_unit("falloff_strength", self.falloff_strength)?;
        check_finite("falloff_extent", self.falloff_extent)?;
        if self.falloff_extent <= 0.0 {
            return Err(invalid("falloff_extent", "must be greater than zero"));
        }
        if self.terrace == Some(0) {
            return Err(invalid("terrace", "needs at least one level"));
        }
        if let Some(strength) = self.domain_warp {
            check_non_negative("domain_warp", strength)?;
        }
        Ok(())
    }
}

/// Droplet-based hydraulic erosion parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErosionSettings {
    /// Number of droplets simulated.
    pub iterations: u32,
    /// Maximum steps a droplet takes before it is dropped.
    pub max_droplet_lifetime: u32,
    pub inertia: f32,
    pub sediment_capacity: f32,
    pub min_sediment_capacity: f32,
    pub deposit_speed: f32,
    pub erode_speed: f32,
    pub evaporate_speed: f32,
    pub gravity: f32,
    /// Brush radius in cells, `1..=8`.
    pub erosion_radius: u32,
}

impl Default for ErosionSettings {
    fn default() -> Self {
        Self {
            iterations: 50_000,
            max_droplet_lifetime: 30,
            inertia: 0.05,
            sediment_capacity: 4.0,
            min_sediment_capacity: 0.01,
            deposit_speed: 0.3,
            erode_speed: 0.3,
            evaporate_speed: 0.01,
            gravity: 4.0,
            erosion_radius: 3,
        }
    }
}

impl ErosionSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        check_unit("inertia", self.inertia)?;
        check_non_negative("sediment_capacity", self.sediment_capacity)?;
        check_non_negative("min_sediment_capacity", self.min_sediment_capacity)?;
        check_unit("deposit_speed", self.deposit_speed)?;
        check_unit("erode_speed", self.erode_speed)?;
        check_unit("evaporate_speed", self.evaporate_speed)?;
        check_non_negative("gravity", self.gravity)?;
        if !(1..=8).contains(&self.erosion_radius) {
            return Err(invalid("erosion_radius", "must be in 1..=8"));
        }
        Ok(())
    }
}

/// Talus-angle thermal erosion parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermalSettings {
    pub iterations: u32,
    /// Largest stable height difference between 4-neighbours.
    pub talus_angle: f32,
}

impl Default for ThermalSettings {
    fn default() -> Self {
        Self {
            iterations: 20,
            talus_angle: 0.02,
        }
    }
}

impl ThermalSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        check_non_negative("talus_angle", self.talus_angle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(HeightmapSettings::default().validate(), Ok(()));
        assert_eq!(ErosionSettings::default().validate(), Ok(()));
        assert_eq!(ThermalSettings::default().validate(), Ok(()));
    }

    #[test]
    fn test_heightmap_settings_rejections() {
        let inverted = HeightmapSettings {
            min_height: 10.0,
            max_height: 5.0,
            ..Default::default()
        };
        assert!(matches!(
            inverted.validate(),
            Err(SettingsError::InvalidSettings {
                field: "min_height",
                ..
            })
        ));

        let negative_weight = HeightmapSettings {
            weights: TerrainWeights {
                ocean: -1.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(negative_weight.validate().is_err());

        let zero_terrace = HeightmapSettings {
            terrace: Some(0),
            ..Default::default()
        };
        assert!(zero_terrace.validate().is_err());

        let nan_height = HeightmapSettings {
            max_height: f32::NAN,
            ..Default::default()
        };
        assert!(nan_height.validate().is_err());

        let bad_noise = HeightmapSettings {
            noise: FbmSettings {
                octaves: 0,
                ..FbmSettings::terrain()
            },
            ..Default::default()
        };
        assert!(matches!(bad_noise.validate(), Err(SettingsError::Fbm(_))));

        let negative_warp = HeightmapSettings {
            domain_warp: Some(-0.5),
            ..Default::default()
        };
        assert!(negative_warp.validated().is_err());
    }

    #[test]
    fn test_erosion_settings_rejections() {
        let radius = ErosionSettings {
            erosion_radius: 9,
            ..Default::default()
        };
        assert!(radius.validate().is_err());
        let inertia = ErosionSettings {
            inertia: 1.5,
            ..Default::default()
        };
        assert!(inertia.validate().is_err());
        let talus = ThermalSettings {
            talus_angle: -0.1,
            ..Default::default()
        };
        assert!(talus.validate().is_err());
    }

    #[test]
    fn test_zero_weight_sum_falls_back_to_uniform() {
        let zero = TerrainWeights {
            mountain: 0.0,
            hill: 0.0,
            plain: 0.0,
            ocean: 0.0,
        };
        let eff = zero.effective();
        assert_eq!(eff.mountain, 0.25);
        assert_eq!(eff.ocean, 0.25);
        let custom = TerrainWeights {
            mountain: 1.0,
            ..zero
        };
        assert_eq!(custom.effective(), custom);
    }
}
