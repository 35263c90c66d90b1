//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level shading configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Lighting constants.
    pub shading: ShadingConfig,
    /// Cascaded shadow settings.
    pub shadow: ShadowConfig,
    /// Texture atlas layout.
    pub atlas: AtlasConfig,
    /// Procedural detail fade band.
    pub detail: DetailConfig,
    /// Per-class procedural detail profiles.
    pub materials: MaterialsConfig,
    /// Distance fog.
    pub fog: FogConfig,
    /// Output image and dispatch settings.
    pub render: RenderConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Ambient + diffuse + face tint constants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShadingConfig {
    /// Constant ambient term added before face tinting.
    pub ambient: f32,
    /// Weight of the directional diffuse term.
    pub diffuse_weight: f32,
    /// Tint for faces whose normal points up.
    pub top_face_light: f32,
    /// Tint for faces whose normal is dominantly along X.
    pub x_face_light: f32,
    /// Tint for every other face (dominant Z, and downward faces).
    pub other_face_light: f32,
}

/// Cascaded shadow map settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShadowConfig {
    /// Number of active cascades (0 disables shadows, at most 4).
    pub cascade_count: u8,
    /// Far view depth of each cascade, strictly increasing.
    pub cascade_splits: [f32; 4],
    /// Fraction of the previous cascade that the next one overlaps.
    pub overlap_factor: f32,
    /// Shadow map resolution per cascade layer.
    pub resolution: u32,
    /// Depth subtracted from the reference depth before comparison.
    pub bias: f32,
    /// Base world-space normal offset applied in cascade 0.
    pub normal_offset: f32,
    /// Per-cascade growth of the normal offset.
    pub normal_offset_growth: f32,
    /// PCF kernel radius in texels.
    pub pcf_spread: f32,
    /// Use cheaper filters for far cascades (3x3 grid, then single tap).
    pub tiered_filtering: bool,
    /// Snap light matrices to texel boundaries to stop shimmering.
    pub stabilize: bool,
}

/// Atlas grid layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AtlasConfig {
    /// Tiles per atlas row (the atlas is square).
    pub tiles_per_row: u32,
    /// Pixel size of one tile.
    pub tile_pixels: u32,
    /// Local UV inset that keeps bilinear taps inside the tile.
    pub padding: f32,
    /// Block ids at or above this value are sampled from the atlas.
    pub custom_block_threshold: u16,
}

/// Distance band over which procedural detail fades out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetailConfig {
    /// Full detail up to this distance.
    pub fade_start: f32,
    /// No detail beyond this distance.
    pub fade_end: f32,
}

/// Procedural detail profile of one material class.
///
/// A profile given in `config.ron` must list every field; omitted profiles
/// keep their built-in values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassProfileConfig {
    /// Fraction of the tile near each border that darkens, in (0, 0.5].
    pub edge_width: f32,
    /// Darkening at a tile corner.
    pub edge_strength: f32,
    /// Speckle cells hashing above this brighten.
    pub bright_threshold: f32,
    /// Speckle cells hashing below this darken.
    pub dark_threshold: f32,
    pub bright_delta: f32,
    pub dark_delta: f32,
    /// Amplitude of the fine continuous jitter.
    pub jitter_amplitude: f32,
    /// Hash seed of the class.
    pub seed: u32,
    /// Color distant side faces blend toward (linear RGB), if any.
    pub side_average: Option<[f32; 3]>,
}

/// Detail profiles for grass, stone and everything else.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MaterialsConfig {
    pub grass: ClassProfileConfig,
    pub stone: ClassProfileConfig,
    pub generic: ClassProfileConfig,
}

/// Distance fog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FogConfig {
    /// Fog color (linear RGB).
    pub color: [f32; 3],
    /// Horizontal distance where fog starts.
    pub near: f32,
    /// Horizontal distance where fog is opaque.
    pub far: f32,
}

/// Output image and worker settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Worker threads for fragment dispatch (0 = one per logical core).
    pub worker_threads: usize,
    /// Fragments handed to a worker at a time.
    pub chunk_size: usize,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for ShadingConfig {
    fn default() -> Self {
        Self {
            ambient: 0.3,
            diffuse_weight: 0.7,
            top_face_light: 1.0,
            x_face_light: 0.75,
            other_face_light: 0.6,
        }
    }
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            cascade_count: 2,
            cascade_splits: [64.0, 256.0, 512.0, 1024.0],
            overlap_factor: 0.1,
            resolution: 2048,
            bias: 0.003,
            normal_offset: 0.1,
            normal_offset_growth: 0.3,
            pcf_spread: 2.5,
            tiered_filtering: false,
            stabilize: true,
        }
    }
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            tiles_per_row: 16,
            tile_pixels: 16,
            padding: 0.001,
            custom_block_threshold: 100,
        }
    }
}

impl Default for DetailConfig {
    fn default() -> Self {
        Self {
            fade_start: 15.0,
            fade_end: 40.0,
        }
    }
}

impl Default for MaterialsConfig {
    fn default() -> Self {
        Self {
            grass: ClassProfileConfig {
                edge_width: 0.06,
                edge_strength: 0.08,
                bright_threshold: 0.85,
                dark_threshold: 0.15,
                bright_delta: 0.05,
                dark_delta: 0.04,
                jitter_amplitude: 0.02,
                seed: 0x1a2b,
                side_average: Some([0.35, 0.45, 0.25]),
            },
            stone: ClassProfileConfig {
                edge_width: 0.04,
                edge_strength: 0.10,
                bright_threshold: 0.82,
                dark_threshold: 0.25,
                bright_delta: 0.05,
                dark_delta: 0.05,
                jitter_amplitude: 0.025,
                seed: 0x5c3d,
                side_average: Some([0.5, 0.5, 0.5]),
            },
            generic: ClassProfileConfig {
                edge_width: 0.04,
                edge_strength: 0.06,
                bright_threshold: 0.85,
                dark_threshold: 0.2,
                bright_delta: 0.04,
                dark_delta: 0.04,
                jitter_amplitude: 0.015,
                seed: 0x9e4f,
                side_average: None,
            },
        }
    }
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            color: [0.7, 0.8, 0.9],
            near: 96.0,
            far: 192.0,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 960,
            height: 540,
            worker_threads: 0,
            chunk_size: 1024,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Default directory holding `config.ron`: `<platform config dir>/voxshade`.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("voxshade")
}

// --- Validation ---

/// Largest shadow map side, atlas side and output side accepted, in pixels.
pub const MAX_TEXTURE_SIZE: u32 = 16384;

/// Block ids are 16-bit, so wider atlas grids are never addressable.
pub const MAX_ATLAS_TILES_PER_ROW: u32 = 256;

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

impl Config {
    /// Check ranges and orderings the shading core relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let shadow = &self.shadow;
        if shadow.cascade_count > 4 {
            return Err(invalid("shadow.cascade_count", "at most 4 cascades"));
        }
        if shadow.resolution == 0 || shadow.resolution > MAX_TEXTURE_SIZE {
            return Err(invalid(
                "shadow.resolution",
                format!("must be in 1..={MAX_TEXTURE_SIZE}, got {}", shadow.resolution),
            ));
        }
        let active = &shadow.cascade_splits[..usize::from(shadow.cascade_count)];
        if active.iter().any(|&d| d <= 0.0) || active.windows(2).any(|w| w[1] <= w[0]) {
            return Err(invalid(
                "shadow.cascade_splits",
                format!("must be positive and strictly increasing, got {active:?}"),
            ));
        }
        if !(0.0..1.0).contains(&shadow.overlap_factor) {
            return Err(invalid("shadow.overlap_factor", "must be in [0, 1)"));
        }
        if shadow.bias < 0.0 {
            return Err(invalid("shadow.bias", "must not be negative"));
        }
        if self.fog.near >= self.fog.far {
            return Err(invalid(
                "fog",
                format!("near {} must be below far {}", self.fog.near, self.fog.far),
            ));
        }
        if self.detail.fade_start >= self.detail.fade_end {
            return Err(invalid(
                "detail",
                format!(
                    "fade_start {} must be below fade_end {}",
                    self.detail.fade_start, self.detail.fade_end
                ),
            ));
        }
        let atlas = &self.atlas;
        if atlas.tiles_per_row == 0 || atlas.tile_pixels == 0 {
            return Err(invalid("atlas", "tile grid and tile size must be non-zero"));
        }
        if atlas.tiles_per_row > MAX_ATLAS_TILES_PER_ROW {
            return Err(invalid(
                "atlas.tiles_per_row",
                format!("at most {MAX_ATLAS_TILES_PER_ROW}, got {}", atlas.tiles_per_row),
            ));
        }
        let atlas_side = atlas.tiles_per_row.checked_mul(atlas.tile_pixels);
        if atlas_side.is_none_or(|side| side > MAX_TEXTURE_SIZE) {
            return Err(invalid(
                "atlas.tile_pixels",
                format!(
                    "{} tiles of {} pixels exceed {MAX_TEXTURE_SIZE} pixels",
                    atlas.tiles_per_row, atlas.tile_pixels
                ),
            ));
        }
        let render = &self.render;
        if render.width == 0 || render.height == 0 {
            return Err(invalid("render", "image size must be non-zero"));
        }
        if render.width > MAX_TEXTURE_SIZE || render.height > MAX_TEXTURE_SIZE {
            return Err(invalid(
                "render",
                format!("image sides must not exceed {MAX_TEXTURE_SIZE} pixels"),
            ));
        }
        Ok(())
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
