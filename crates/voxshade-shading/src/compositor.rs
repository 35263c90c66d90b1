//! Combines albedo, direct light, shadow and fog into the final color.

use glam::Vec3;
use voxshade_lighting::DirectionalLight;
use voxshade_materials::{ResolvedSurface, SurfacePoint};

use crate::camera::CameraContext;
use crate::fog::FogParameters;
use crate::params::ShadingParams;

/// Face tint for `normal` under `params`.
#[inline]
pub fn face_light(normal: Vec3, params: &ShadingParams) -> f32 {
    params.face_light.for_normal(normal)
}

/// Lighting and fog compositor.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Compositor {
    pub params: ShadingParams,
    pub fog: FogParameters,
}

impl Compositor {
    pub fn new(params: ShadingParams, fog: FogParameters) -> Self {
        Self { params, fog }
    }

    /// Scalar light reaching a face: ambient plus shadowed diffuse, tinted by
    /// face orientation.
    #[inline]
    pub fn lighting(&self, normal: Vec3, light: &DirectionalLight, shadow_factor: f32) -> f32 {
        let diffuse = light.lambert(normal) * shadow_factor;
        (self.params.ambient + diffuse * self.params.diffuse_weight)
            * face_light(normal, &self.params)
    }

    /// Final linear RGB for one fragment.
    ///
    /// Atlas texels are scaled by the lighting term alone; procedural albedo
    /// is additionally tinted by the light color.
    pub fn shade(
        &self,
        point: &SurfacePoint,
        camera: &CameraContext,
        light: &DirectionalLight,
        shadow_factor: f32,
        surface: &ResolvedSurface,
    ) -> Vec3 {
        let lighting = self.lighting(point.normal, light, shadow_factor);
        let lit = if surface.uses_atlas {
            surface.albedo * lighting
        } else {
            surface.albedo * light.color * lighting
        };
        self.fog
            .apply(lit, camera.horizontal_distance(point.world_position))
    }
}
