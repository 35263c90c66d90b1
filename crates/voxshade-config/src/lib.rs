//! Configuration system for the Voxshade terrain shading core.
//!
//! Provides runtime-configurable shading constants that persist to disk as RON
//! files. Supports CLI overrides via clap, hot-reload detection, and
//! forward/backward compatible serialization.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    AtlasConfig, ClassProfileConfig, Config, DebugConfig, DetailConfig, FogConfig,
    MaterialsConfig, RenderConfig, ShadingConfig, ShadowConfig, default_config_dir,
};
pub use error::ConfigError;
