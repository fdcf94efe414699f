//! Headless fly-through exercising the whole terrain pipeline.
//!
//! Loads `strata.ron`, applies CLI overrides, streams terrain around a camera
//! flying along +x and prints the final statistics as JSON. With
//! `--erosion-preview` it erodes a standalone grid instead.

use clap::Parser;
use glam::Vec3;
use strata_config::{CliArgs, ConfigError, StrataConfig, default_config_dir};
use strata_mesh::MemoryMeshSink;
use strata_stream::{ChunkStore, StoreError};
use strata_terrain::{
    ClockRandomSource, HeightmapGenerator, HydraulicErosion, SettingsError, ThermalErosion,
};
use tracing::{error, info, warn};

/// Simulated frame time.
const FRAME_DT: f32 = 1.0 / 60.0;

/// Camera height above the ground.
const EYE_HEIGHT: f32 = 2.0;

/// Upper bound on the startup force-load radius.
const START_RADIUS: f32 = 96.0;

/// Side length of the erosion preview grid.
const PREVIEW_SIZE: usize = 128;

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}

fn fly_through(config: &StrataConfig, frames: u64, speed: f32) -> Result<(), DemoError> {
    let store_config = config.store_config()?;
    let settings = config.heightmap_settings(&mut ClockRandomSource::new())?;
    info!(
        seed = settings.seed,
        view_distance = store_config.view_distance,
        frames,
        speed,
        "starting fly-through"
    );

    let mut store = ChunkStore::new(store_config, settings, MemoryMeshSink::new())?;

    let mut camera = Vec3::ZERO;
    store.force_load_around(camera, config.streaming.view_distance.min(START_RADIUS));
    camera.y = store.height_at(camera.x, camera.z) + EYE_HEIGHT;

    let interval = config.debug.stats_interval;
    for frame in 1..=frames {
        camera.x += speed * FRAME_DT;
        store.tick(camera, FRAME_DT);

        match store.try_height_at(camera.x, camera.z) {
            Some(ground) => camera.y = ground + EYE_HEIGHT,
            None => warn!(frame, x = camera.x, "camera is over unloaded terrain"),
        }

        if interval > 0 && frame % interval == 0 {
            let stats = store.stats();
            info!(
                frame,
                x = camera.x,
                loaded = stats.loaded,
                visible = stats.visible,
                pending_gen = stats.pending_gen,
                pending_mesh = stats.pending_mesh,
                triangles = stats.total_triangles,
                "streaming"
            );
        }
    }

    let sink = store.sink();
    info!(
        live_meshes = sink.live_count(),
        uploads = sink.upload_count(),
        releases = sink.release_count(),
        failed_uploads = sink.failed_upload_count(),
        elapsed = store.elapsed(),
        "fly-through finished"
    );
    for message in store.error_log().iter() {
        warn!("{message}");
    }

    println!("{}", serde_json::to_string_pretty(&store.stats())?);
    Ok(())
}

fn erosion_preview(config: &StrataConfig) -> Result<(), DemoError> {
    let settings = config.heightmap_settings(&mut ClockRandomSource::new())?;
    let seed = settings.seed;
    let generator = HeightmapGenerator::new(settings)?;
    let mut map = generator.generate_grid(PREVIEW_SIZE, PREVIEW_SIZE)?;

    let before = map.sum();
    let report = HydraulicErosion::new(config.erosion)?.erode(&mut map, seed);
    let after_hydraulic = map.sum();
    let moved = ThermalErosion::new(config.thermal)?.erode(&mut map);
    let after = map.sum();

    info!(
        seed,
        droplets = report.droplets,
        eroded = report.eroded,
        deposited = report.deposited,
        thermal_moved = moved,
        "erosion preview finished"
    );

    let summary = serde_json::json!({
        "seed": seed,
        "grid": [map.width(), map.height()],
        "mass_before": before,
        "mass_after_hydraulic": after_hydraulic,
        "mass_after": after,
        "droplets": report.droplets,
        "eroded": report.eroded,
        "deposited": report.deposited,
        "thermal_moved": moved,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn main() {
    let args = CliArgs::parse();

    let config_dir = args.config.clone().unwrap_or_else(default_config_dir);

    // Load or create config, then apply CLI overrides
    let mut config = StrataConfig::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        StrataConfig::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    strata_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    let result = if args.erosion_preview {
        erosion_preview(&config)
    } else {
        fly_through(&config, args.frames(), args.speed())
    };

    if let Err(err) = result {
        error!(%err, "demo failed");
        std::process::exit(1);
    }
}
