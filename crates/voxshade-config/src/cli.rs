//! Command-line argument parsing for the shading demo and tools.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Voxshade command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "voxshade", about = "Voxel terrain shading core")]
pub struct CliArgs {
    /// Output image width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Output image height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Worker threads for fragment shading (0 = all cores).
    #[arg(long)]
    pub workers: Option<usize>,

    /// Number of active shadow cascades (0 disables shadows).
    #[arg(long)]
    pub cascades: Option<u8>,

    /// Fog start distance.
    #[arg(long)]
    pub fog_near: Option<f32>,

    /// Fog end distance.
    #[arg(long)]
    pub fog_far: Option<f32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long, short, default_value = "terrain.png")]
    pub output: PathBuf,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.render.width = w;
        }
        if let Some(h) = args.height {
            self.render.height = h;
        }
        if let Some(workers) = args.workers {
            self.render.worker_threads = workers;
        }
        if let Some(count) = args.cascades {
            self.shadow.cascade_count = count;
        }
        if let Some(near) = args.fog_near {
            self.fog.near = near;
        }
        if let Some(far) = args.fog_far {
            self.fog.far = far;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
