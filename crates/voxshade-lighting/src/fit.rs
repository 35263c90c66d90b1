//! Fitting light-space matrices around slices of the camera frustum.
//!
//! Each cascade covers a view-depth range `[near, far]`. The slice's eight
//! corners are enclosed by a light-aligned orthographic box; with
//! stabilization on, the box is snapped to whole shadow map texels so shadows
//! do not swim as the camera moves.

use glam::{Mat4, Vec3, Vec4};

use crate::cascade::{MAX_CASCADES, ShadowCascadeSet, ShadowConfigError, check_resolution};

/// How far the light box extends toward the light beyond the slice, as a
/// multiple of the slice's depth extent. Catches casters outside the view.
const CASTER_DEPTH_EXTENSION: f32 = 1.0;

/// Cascade layout and quality settings.
#[derive(Clone, Debug, PartialEq)]
pub struct CascadeConfig {
    /// Number of cascades in use (at most 4).
    pub num_cascades: usize,
    /// Shadow map resolution per cascade.
    pub resolution: u32,
    /// Far view depth of each cascade.
    pub cascade_distances: Vec<f32>,
    /// Fraction by which a cascade starts before the previous one ends.
    pub overlap_factor: f32,
    /// Snap to texel boundaries to reduce shimmering.
    pub stabilize: bool,
}

impl CascadeConfig {
    /// Long shadow range for mountainous worlds.
    pub fn large_world() -> Self {
        Self {
            num_cascades: 2,
            resolution: 2048,
            cascade_distances: vec![64.0, 256.0, 512.0, 1024.0],
            overlap_factor: 0.1,
            stabilize: true,
        }
    }

    /// Medium range, three cascades.
    pub fn medium_world() -> Self {
        Self {
            num_cascades: 3,
            resolution: 1024,
            cascade_distances: vec![32.0, 128.0, 512.0],
            overlap_factor: 0.1,
            stabilize: true,
        }
    }

    /// Lower quality, higher frame rate.
    pub fn fast() -> Self {
        Self {
            num_cascades: 2,
            resolution: 512,
            cascade_distances: vec![64.0, 256.0],
            overlap_factor: 0.05,
            stabilize: false,
        }
    }

    /// Cascades actually used: the configured count limited by the distances
    /// provided and by [`MAX_CASCADES`].
    pub fn active_count(&self) -> usize {
        self.num_cascades
            .min(self.cascade_distances.len())
            .min(MAX_CASCADES)
    }

    /// `(near, far)` view-depth range of every active cascade.
    pub fn ranges(&self, camera_near: f32) -> Vec<(f32, f32)> {
        let mut ranges = Vec::with_capacity(self.active_count());
        let mut near = camera_near;
        for &far in self.cascade_distances.iter().take(self.active_count()) {
            ranges.push((near, far));
            near = far * (1.0 - self.overlap_factor);
        }
        ranges
    }

    /// Fit every active cascade and assemble a validated cascade set.
    pub fn fit(
        &self,
        light_dir: Vec3,
        frustum: &CameraFrustum,
        bias: f32,
    ) -> Result<ShadowCascadeSet, ShadowConfigError> {
        check_resolution(self.resolution)?;
        let ranges = self.ranges(frustum.near);
        let matrices: Vec<Mat4> = ranges
            .iter()
            .map(|&(near, far)| {
                let corners = frustum.slice_corners(near, far);
                fit_cascade_matrix(light_dir, &corners, self.resolution, self.stabilize)
                    .light_view_proj
            })
            .collect();
        let splits: Vec<f32> = ranges.iter().map(|&(_, far)| far).collect();

        tracing::debug!(cascades = splits.len(), ?splits, "fitted shadow cascades");
        ShadowCascadeSet::new(&matrices, &splits, 1.0 / self.resolution as f32, bias)
    }
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self::large_world()
    }
}

/// The camera parameters needed to slice its view frustum.
#[derive(Clone, Copy, Debug)]
pub struct CameraFrustum {
    /// World-to-view matrix (right-handed, looking down -Z).
    pub view: Mat4,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width / height.
    pub aspect: f32,
    /// Near clip distance.
    pub near: f32,
}

impl CameraFrustum {
    /// World-space corners of the frustum between view depths `near` and `far`.
    ///
    /// Order: near plane (bl, br, tr, tl), then far plane in the same order.
    pub fn slice_corners(&self, near: f32, far: f32) -> [Vec3; 8] {
        let inv_view = self.view.inverse();
        let tan_half = (self.fov_y * 0.5).tan();
        let mut corners = [Vec3::ZERO; 8];
        for (plane, depth) in [near, far].into_iter().enumerate() {
            let half_h = depth * tan_half;
            let half_w = half_h * self.aspect;
            let local = [
                Vec3::new(-half_w, -half_h, -depth),
                Vec3::new(half_w, -half_h, -depth),
                Vec3::new(half_w, half_h, -depth),
                Vec3::new(-half_w, half_h, -depth),
            ];
            for (i, corner) in local.into_iter().enumerate() {
                corners[plane * 4 + i] = inv_view.transform_point3(corner);
            }
        }
        corners
    }
}

/// Result of fitting one cascade.
#[derive(Clone, Copy, Debug)]
pub struct FittedCascade {
    /// Light view-projection; maps to depth range `[0, 1]`.
    pub light_view_proj: Mat4,
    /// World units covered by one shadow map texel.
    pub world_texel_size: f32,
}

/// Compute a light-space orthographic matrix enclosing `corners`.
pub fn fit_cascade_matrix(
    light_dir: Vec3,
    corners: &[Vec3; 8],
    resolution: u32,
    stabilize: bool,
) -> FittedCascade {
    let center = corners.iter().copied().sum::<Vec3>() / corners.len() as f32;
    let up = if light_dir.y.abs() > 0.99 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let light_view = Mat4::look_at_rh(center - light_dir * 100.0, center, up);

    let mut min = Vec3::splat(f32::MAX);
    let mut max = Vec3::splat(f32::MIN);
    for corner in corners {
        let ls = (light_view * Vec4::new(corner.x, corner.y, corner.z, 1.0)).truncate();
        min = min.min(ls);
        max = max.max(ls);
    }

    // View space looks down -Z, so casters between the light and the slice
    // have larger z.
    let z_range = max.z - min.z;
    max.z += z_range * CASTER_DEPTH_EXTENSION;

    let world_texel_size = (max.x - min.x) / resolution as f32;
    if stabilize && world_texel_size > 0.0 {
        min.x = (min.x / world_texel_size).floor() * world_texel_size;
        max.x = (max.x / world_texel_size).ceil() * world_texel_size;
        min.y = (min.y / world_texel_size).floor() * world_texel_size;
        max.y = (max.y / world_texel_size).ceil() * world_texel_size;
    }

    let ortho = Mat4::orthographic_rh(min.x, max.x, min.y, max.y, -max.z, -min.z);
    FittedCascade {
        light_view_proj: ortho * light_view,
        world_texel_size,
    }
}
