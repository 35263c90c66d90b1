//! Demo error type.

use thiserror::Error;
use voxshade_config::ConfigError;
use voxshade_lighting::ShadowConfigError;
use voxshade_materials::AtlasError;
use voxshade_shading::FrameError;

/// Anything that can stop the demo from producing an image.
#[derive(Debug, Error)]
pub enum DemoError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("shadow setup: {0}")]
    Shadow(#[from] ShadowConfigError),

    #[error("atlas: {0}")]
    Atlas(#[from] AtlasError),

    #[error("frame: {0}")]
    Frame(#[from] FrameError),

    #[error("failed to write image: {0}")]
    Image(#[from] image::ImageError),

    #[error("output size {width}x{height} is empty")]
    EmptyImage { width: u32, height: u32 },

    #[error("output size {width}x{height} has too many pixels")]
    ImageTooLarge { width: u32, height: u32 },
}
