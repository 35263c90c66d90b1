//! Immutable per-frame inputs and single-fragment shading.

use glam::Vec4;
use thiserror::Error;
use voxshade_config::Config;
use voxshade_lighting::{
    DepthCompare, DirectionalLight, PcfStrategyTable, ShadowCascadeSet, ShadowConfigError,
    ShadowMap, ShadowSampler,
};
use voxshade_materials::{
    AtlasError, MaterialError, ProceduralGenerator, SurfacePoint, SurfaceResolver, TextureAtlas,
};

use crate::camera::CameraContext;
use crate::compositor::Compositor;
use crate::fog::FogParameters;
use crate::params::{ShadingParams, class_table_from_config};

/// Errors from assembling frame inputs.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("{cascades} active cascades but the shadow map has {layers} layers")]
    CascadeLayerMismatch { cascades: u8, layers: u32 },

    #[error("fog band [{near}, {far}] is empty")]
    EmptyFogBand { near: f32, far: f32 },

    #[error("detail fade band [{start}, {end}] is empty")]
    EmptyDetailFade { start: f32, end: f32 },

    #[error("fragment buffer length {points} does not match output length {output}")]
    BufferLengthMismatch { points: usize, output: usize },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Shadow(#[from] ShadowConfigError),

    #[error(transparent)]
    Atlas(#[from] AtlasError),

    #[error(transparent)]
    Material(#[from] MaterialError),
}

/// Everything fragment shading reads during one frame.
///
/// Built once and shared by reference across worker threads.
#[derive(Clone, Debug)]
pub struct FrameInputs {
    pub camera: CameraContext,
    pub light: DirectionalLight,
    pub cascades: ShadowCascadeSet,
    pub shadow_map: ShadowMap,
    pub sampler: ShadowSampler,
    pub atlas: TextureAtlas,
    pub detail: ProceduralGenerator,
    pub compositor: Compositor,
}

impl FrameInputs {
    /// Assemble inputs with default shading constants.
    pub fn new(
        camera: CameraContext,
        light: DirectionalLight,
        cascades: ShadowCascadeSet,
        shadow_map: ShadowMap,
        atlas: TextureAtlas,
    ) -> Result<Self, FrameError> {
        Self {
            camera,
            light,
            cascades,
            shadow_map,
            sampler: ShadowSampler::default(),
            atlas,
            detail: ProceduralGenerator::default(),
            compositor: Compositor::default(),
        }
        .validated()
    }

    /// Assemble inputs with shading constants taken from `config`.
    pub fn from_config(
        config: &Config,
        camera: CameraContext,
        light: DirectionalLight,
        cascades: ShadowCascadeSet,
        shadow_map: ShadowMap,
        atlas: TextureAtlas,
    ) -> Result<Self, FrameError> {
        let shadow = &config.shadow;
        let sampler = ShadowSampler {
            normal_offset: shadow.normal_offset,
            normal_offset_growth: shadow.normal_offset_growth,
            spread: shadow.pcf_spread,
            filters: if shadow.tiered_filtering {
                PcfStrategyTable::tiered()
            } else {
                PcfStrategyTable::uniform()
            },
        };
        let detail = ProceduralGenerator::new(
            config.detail.fade_start,
            config.detail.fade_end,
            class_table_from_config(&config.materials),
        );
        let compositor = Compositor::new(
            ShadingParams::from_config(&config.shading),
            FogParameters::from_config(&config.fog),
        );
        Self {
            camera,
            light,
            cascades,
            shadow_map,
            sampler,
            atlas,
            detail,
            compositor,
        }
        .validated()
    }

    /// Check cross-field consistency. Cascades exceeding the shadow map's
    /// layers are an error here so the sampler never indexes past them.
    pub fn validated(mut self) -> Result<Self, FrameError> {
        let layers = self.shadow_map.layer_count();
        if u32::from(self.cascades.active_cascade_count()) > layers {
            return Err(FrameError::CascadeLayerMismatch {
                cascades: self.cascades.active_cascade_count(),
                layers,
            });
        }
        let fog = &self.compositor.fog;
        if fog.near_distance >= fog.far_distance {
            return Err(FrameError::EmptyFogBand {
                near: fog.near_distance,
                far: fog.far_distance,
            });
        }
        if self.detail.fade_start >= self.detail.fade_end {
            return Err(FrameError::EmptyDetailFade {
                start: self.detail.fade_start,
                end: self.detail.fade_end,
            });
        }
        self.atlas.layout().validate()?;
        self.detail.classes = self.detail.classes.validated()?;
        Ok(self)
    }
}

/// Shade one fragment: shadow, surface albedo, lighting and fog. Alpha is 1.
pub fn shade_fragment(frame: &FrameInputs, point: &SurfacePoint) -> Vec4 {
    let view_depth = frame.camera.view_depth(point.world_position);
    let shadow = frame.sampler.compute_shadow_factor(
        point.world_position,
        point.normal,
        view_depth,
        &frame.cascades,
        &frame.shadow_map,
    );
    let surface = SurfaceResolver::new(&frame.atlas, &frame.detail)
        .resolve_surface_color(point, frame.camera.position);
    frame
        .compositor
        .shade(point, &frame.camera, &frame.light, shadow, &surface)
        .extend(1.0)
}
