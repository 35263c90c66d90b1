//! Offline demo that shades a synthetic voxel terrain into a PNG.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p voxshade-demo -- --output terrain.png`.
//! Run with `cargo run -p voxshade-demo -- --width 1920 --height 1080` to override size.

mod error;
mod render;
mod scene;
mod shadow_pass;

use std::time::Instant;

use clap::Parser;
use glam::Vec3;
use tracing::info;
use voxshade_config::{CliArgs, Config, default_config_dir};
use voxshade_lighting::{CascadeConfig, DirectionalLight, ShadowCascadeSet};
use voxshade_materials::{AtlasBuilder, AtlasLayout, TextureAtlas, TilePattern};
use voxshade_shading::{Camera, FragmentDispatcher, FrameInputs};

use crate::error::DemoError;
use crate::scene::VoxelScene;

const SCENE_SIZE: u32 = 96;
const SCENE_HEIGHT: u32 = 40;

/// Tiles for the custom blocks placed in the scene. `UNTEXTURED` is left out
/// on purpose and renders with the missing-texture pattern.
fn demo_tiles() -> [(u16, TilePattern); 5] {
    [
        (
            scene::BRICK_TOWER,
            TilePattern::Bricks {
                brick: [0.6, 0.25, 0.15],
                mortar: [0.8, 0.78, 0.72],
            },
        ),
        (
            scene::CHECKER_CRATE,
            TilePattern::Checker {
                a: [0.55, 0.4, 0.2],
                b: [0.4, 0.28, 0.12],
                cells: 4,
            },
        ),
        (
            scene::MOSSY_PILLAR,
            TilePattern::Noise {
                color: [0.35, 0.45, 0.3],
                amplitude: 0.15,
                seed: 7,
            },
        ),
        (
            scene::GLOW_COLUMN,
            TilePattern::Gradient {
                top: [1.0, 0.9, 0.5],
                bottom: [0.9, 0.4, 0.1],
            },
        ),
        (
            scene::PAINTED_WALL,
            TilePattern::Solid {
                color: [0.2, 0.35, 0.7],
            },
        ),
    ]
}

fn build_atlas(config: &Config) -> Result<TextureAtlas, DemoError> {
    let layout = AtlasLayout {
        tiles_per_row: config.atlas.tiles_per_row,
        padding: config.atlas.padding,
        custom_block_threshold: config.atlas.custom_block_threshold,
    };
    let mut builder = AtlasBuilder::new(layout, config.atlas.tile_pixels)?;
    for (block_id, pattern) in demo_tiles() {
        builder.paint_tile(block_id, &pattern)?;
    }
    info!(painted = builder.painted_count(), "built texture atlas");
    Ok(builder.build())
}

/// Camera over the south-west corner looking at the middle of the terrain.
fn demo_camera(scene: &VoxelScene, width: u32, height: u32) -> Camera {
    let center = scene.center() + Vec3::Y * 8.0;
    let mut camera = Camera {
        position: center + Vec3::new(-52.0, 34.0, 60.0),
        target: center,
        fov_y: 55f32.to_radians(),
        aspect_ratio: 1.0,
        near: 0.1,
        far: 400.0,
    };
    camera.set_aspect_ratio(width as f32, height as f32);
    camera
}

fn fit_cascades(
    config: &Config,
    light: &DirectionalLight,
    camera: &Camera,
) -> Result<ShadowCascadeSet, DemoError> {
    let shadow = &config.shadow;
    if shadow.cascade_count == 0 {
        info!("shadows disabled");
        return Ok(ShadowCascadeSet::disabled());
    }
    let cascade_config = CascadeConfig {
        num_cascades: usize::from(shadow.cascade_count),
        resolution: shadow.resolution,
        cascade_distances: shadow.cascade_splits.to_vec(),
        overlap_factor: shadow.overlap_factor,
        stabilize: shadow.stabilize,
    };
    let cascades = cascade_config.fit(light.direction, &camera.frustum(), shadow.bias)?;
    Ok(cascades.clamp_to_layers(u32::from(shadow.cascade_count)))
}

fn run(args: &CliArgs, config: &Config) -> Result<(), DemoError> {
    config.validate()?;
    let settings = &config.render;
    let started = Instant::now();

    let scene = VoxelScene::generate(SCENE_SIZE, SCENE_HEIGHT);
    let camera = demo_camera(&scene, settings.width, settings.height);
    let light = DirectionalLight::default();
    info!(size = scene.size(), height = scene.height(), "generated scene");

    let cascades = fit_cascades(config, &light, &camera)?;
    let shadow_map = shadow_pass::render_shadow_map(&scene, &cascades, config.shadow.resolution)?;
    info!(
        cascades = cascades.active_cascade_count(),
        resolution = config.shadow.resolution,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "shadow map ready"
    );

    let atlas = build_atlas(config)?;
    let frame = FrameInputs::from_config(
        config,
        camera.context(),
        light,
        cascades,
        shadow_map,
        atlas,
    )?;

    let visibility = render::trace_visibility(&scene, &camera, settings.width, settings.height)?;
    info!(
        fragments = visibility.points.len(),
        coverage = visibility.coverage(),
        "traced visibility"
    );

    let dispatcher = FragmentDispatcher::new(settings.worker_threads, settings.chunk_size)?;
    let image = render::shade_image(&visibility, &frame, &dispatcher);
    render::save_png(&image, &args.output)?;

    info!(
        path = %args.output.display(),
        width = settings.width,
        height = settings.height,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "frame written"
    );
    Ok(())
}

fn main() -> Result<(), DemoError> {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = args.config.clone().unwrap_or_else(default_config_dir);

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    voxshade_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    run(&args, &config).inspect_err(|e| tracing::error!("demo failed: {e}"))
}
