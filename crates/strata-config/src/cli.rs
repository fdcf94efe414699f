//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::StrataConfig;

/// Frames flown by the demo when `--frames` is not given.
pub const DEFAULT_FRAMES: u64 = 600;

/// Camera speed in world units per second when `--speed` is not given.
pub const DEFAULT_SPEED: f32 = 64.0;

/// Strata command-line arguments.
///
/// CLI values override settings loaded from `strata.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "strata", about = "Streaming procedural terrain")]
pub struct CliArgs {
    /// World seed.
    #[arg(long)]
    pub seed: Option<u32>,

    /// Residency radius in world units.
    #[arg(long)]
    pub view_distance: Option<f32>,

    /// Chunks generated per frame.
    #[arg(long)]
    pub max_gen_per_frame: Option<usize>,

    /// Meshes built per frame.
    #[arg(long)]
    pub max_mesh_per_frame: Option<usize>,

    /// Height generation worker threads (0 = tick thread).
    #[arg(long)]
    pub workers: Option<usize>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of frames to simulate.
    #[arg(long)]
    pub frames: Option<u64>,

    /// Camera speed along +x in world units per second.
    #[arg(long)]
    pub speed: Option<f32>,

    /// Run hydraulic and thermal erosion on a standalone grid and exit.
    #[arg(long)]
    pub erosion_preview: bool,
}

impl CliArgs {
    pub fn frames(&self) -> u64 {
        self.frames.unwrap_or(DEFAULT_FRAMES)
    }

    pub fn speed(&self) -> f32 {
        self.speed.unwrap_or(DEFAULT_SPEED)
    }
}

impl StrataConfig {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.terrain.seed = Some(seed);
        }
        if let Some(view) = args.view_distance {
            self.streaming.view_distance = view;
        }
        if let Some(n) = args.max_gen_per_frame {
            self.streaming.max_gen_per_frame = n;
        }
        if let Some(n) = args.max_mesh_per_frame {
            self.streaming.max_mesh_per_frame = n;
        }
        if let Some(n) = args.workers {
            self.streaming.generation_workers = n;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
