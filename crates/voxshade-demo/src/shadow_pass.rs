//! Shadow map rendering by casting light rays into the scene.

use std::time::Instant;

use glam::{Mat4, Vec2, Vec3};
use rayon::prelude::*;
use voxshade_lighting::{ShadowCascadeSet, ShadowConfigError, ShadowMap};

use crate::scene::VoxelScene;

/// Light-space ray through the centre of a shadow map texel, from the near
/// plane to the far plane of the cascade box.
fn texel_ray(inverse: Mat4, uv: Vec2) -> (Vec3, Vec3) {
    let ndc = Vec2::new(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0);
    let near = inverse.project_point3(ndc.extend(0.0));
    let far = inverse.project_point3(ndc.extend(1.0));
    (near, far)
}

/// Depth of the first occluder for every texel of one layer, in row order.
fn render_layer(scene: &VoxelScene, light_view_proj: Mat4, resolution: u32) -> Vec<f32> {
    let inverse = light_view_proj.inverse();
    let texel = 1.0 / resolution as f32;
    (0..resolution * resolution)
        .into_par_iter()
        .map(|index| {
            let (x, y) = (index % resolution, index / resolution);
            let uv = Vec2::new((x as f32 + 0.5) * texel, (y as f32 + 0.5) * texel);
            let (near, far) = texel_ray(inverse, uv);
            let span = far - near;
            scene
                .raycast(near, span, span.length())
                .map_or(1.0, |hit| {
                    light_view_proj.project_point3(hit.position).z.clamp(0.0, 1.0)
                })
        })
        .collect()
}

/// Render one shadow map layer per active cascade.
///
/// The resolution is checked by [`ShadowMap::new`] before any layer is
/// traced, so `resolution * resolution` fits in `u32`.
pub fn render_shadow_map(
    scene: &VoxelScene,
    cascades: &ShadowCascadeSet,
    resolution: u32,
) -> Result<ShadowMap, ShadowConfigError> {
    let layers = u32::from(cascades.active_cascade_count()).max(1);
    let mut map = ShadowMap::new(resolution, layers)?;
    for cascade in 0..cascades.active_cascade_count() {
        let started = Instant::now();
        let depths = render_layer(scene, cascades.light_view_proj(cascade), resolution);
        let mut occluded = 0usize;
        for (index, depth) in depths.into_iter().enumerate() {
            if depth < 1.0 {
                occluded += 1;
            }
            let index = index as u32;
            map.write_depth(
                u32::from(cascade),
                index % resolution,
                index / resolution,
                depth,
            );
        }
        tracing::debug!(
            cascade,
            resolution,
            occluded,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "rendered shadow cascade"
        );
    }
    Ok(map)
}
