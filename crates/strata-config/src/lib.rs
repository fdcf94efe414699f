//! Configuration for the strata terrain stack.
//!
//! Provides runtime-configurable settings that persist to disk as RON files,
//! validate into the streaming and generation types, and accept CLI
//! overrides via clap.

mod cli;
mod config;
mod error;

pub use cli::{CliArgs, DEFAULT_FRAMES, DEFAULT_SPEED};
pub use config::{
    CONFIG_FILE_NAME, DebugConfig, StrataConfig, StreamingConfig, TerrainConfig,
    default_config_dir,
};
pub use error::ConfigError;
