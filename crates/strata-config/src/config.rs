//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strata_noise::{FbmSettings, NoiseKind};
use strata_stream::{StoreConfig, UNLOAD_FACTOR};
use strata_terrain::{
    ErosionSettings, FixedRandomSource, HeightmapSettings, RandomSource, TerrainWeights,
    ThermalSettings,
};

use crate::error::ConfigError;

/// File name of the persisted configuration.
pub const CONFIG_FILE_NAME: &str = "strata.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StrataConfig {
    /// Residency radii, budgets and LOD thresholds.
    pub streaming: StreamingConfig,
    /// Height generation parameters.
    pub terrain: TerrainConfig,
    /// Hydraulic erosion parameters for explicit erosion passes.
    pub erosion: ErosionSettings,
    /// Thermal erosion parameters for explicit erosion passes.
    pub thermal: ThermalSettings,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Streaming configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamingConfig {
    /// Residency radius in world units.
    pub view_distance: f32,
    /// Eviction radius; `None` uses `view_distance * 1.2`.
    pub unload_distance: Option<f32>,
    /// Chunks generated per tick.
    pub max_gen_per_frame: usize,
    /// Meshes built per tick.
    pub max_mesh_per_frame: usize,
    /// Explicit LOD thresholds in world units.
    pub lod_distances: Option<Vec<f32>>,
    /// Height generation threads; `0` generates on the tick thread.
    pub generation_workers: usize,
}

/// Height generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// World seed. `None` draws one from the host's random source.
    pub seed: Option<u32>,
    pub noise: FbmSettings,
    pub kernel: NoiseKind,
    pub min_height: f32,
    pub max_height: f32,
    pub weights: TerrainWeights,
    pub apply_falloff: bool,
    pub falloff_strength: f32,
    pub falloff_extent: f32,
    pub terrace: Option<u32>,
    pub domain_warp: Option<f32>,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Frames between periodic stats lines in the demo; `0` disables them.
    pub stats_interval: u64,
}

// --- Default implementations ---

impl Default for StreamingConfig {
    fn default() -> Self {
        let store = StoreConfig::default();
        Self {
            view_distance: store.view_distance,
            unload_distance: None,
            max_gen_per_frame: store.max_gen_per_frame,
            max_mesh_per_frame: store.max_mesh_per_frame,
            lod_distances: None,
            generation_workers: 0,
        }
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        let settings = HeightmapSettings::default();
        Self {
            seed: None,
            noise: settings.noise,
            kernel: settings.kernel,
            min_height: settings.min_height,
            max_height: settings.max_height,
            weights: settings.weights,
            apply_falloff: settings.apply_falloff,
            falloff_strength: settings.falloff_strength,
            falloff_extent: settings.falloff_extent,
            terrace: settings.terrace,
            domain_warp: settings.domain_warp,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            stats_interval: 60,
        }
    }
}

// --- Conversion into runtime settings ---

impl StreamingConfig {
    /// Validated store configuration.
    pub fn store_config(&self) -> Result<StoreConfig, ConfigError> {
        let config = StoreConfig {
            view_distance: self.view_distance,
            unload_distance: self
                .unload_distance
                .unwrap_or(self.view_distance * UNLOAD_FACTOR),
            max_gen_per_frame: self.max_gen_per_frame,
            max_mesh_per_frame: self.max_mesh_per_frame,
            lod_distances: self.lod_distances.clone(),
            generation_workers: self.generation_workers,
        };
        config.validate()?;
        Ok(config)
    }
}

impl TerrainConfig {
    /// Validated heightmap settings. The random source is consulted only
    /// when no seed is configured.
    pub fn heightmap_settings(
        &self,
        random: &mut dyn RandomSource,
    ) -> Result<HeightmapSettings, ConfigError> {
        let seed = match self.seed {
            Some(seed) => seed,
            None => random.next_seed(),
        };
        let settings = HeightmapSettings {
            seed,
            noise: self.noise,
            kernel: self.kernel,
            min_height: self.min_height,
            max_height: self.max_height,
            weights: self.weights,
            apply_falloff: self.apply_falloff,
            falloff_strength: self.falloff_strength,
            falloff_extent: self.falloff_extent,
            terrace: self.terrace,
            domain_warp: self.domain_warp,
        };
        Ok(settings.validated()?)
    }
}

impl StrataConfig {
    pub fn store_config(&self) -> Result<StoreConfig, ConfigError> {
        self.streaming.store_config()
    }

    pub fn heightmap_settings(
        &self,
        random: &mut dyn RandomSource,
    ) -> Result<HeightmapSettings, ConfigError> {
        self.terrain.heightmap_settings(random)
    }

    /// Checks every section without building anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store_config()?;
        self.erosion.validate()?;
        self.thermal.validate()?;
        let mut seeds = FixedRandomSource(0);
        self.heightmap_settings(&mut seeds)?;
        Ok(())
    }
}

// --- Load / Save / Reload ---

/// Platform config directory for strata, falling back to the working
/// directory when the platform has none.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("strata"))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl StrataConfig {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let config = Self::read(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = StrataConfig::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `strata.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        log::debug!("Saved config to {}", config_path.display());
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read(&config_dir.join(CONFIG_FILE_NAME))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        ron::from_str(&contents).map_err(ConfigError::ParseError)
    }
}
