//! Layered depth texture with comparison-sampler semantics.
//!
//! Layers are written by the shadow pass (one per cascade) and only read by
//! shading. Reads go through [`DepthCompare`], which mirrors a hardware
//! comparison sampler: `LessEqual` compare, linear filtering, clamp-to-edge.

use glam::{Mat4, Vec2, Vec3};

use crate::cascade::{ShadowConfigError, check_resolution};

/// Depth-comparison lookup into a layered shadow map.
pub trait DepthCompare {
    /// Number of layers (cascades) available.
    fn layer_count(&self) -> u32;

    /// Filtered comparison at `uv` in layer `layer`.
    ///
    /// Returns 1.0 where `reference <= stored depth` (lit), 0.0 where occluded,
    /// bilinearly weighted between the four nearest texels.
    fn sample_compare(&self, layer: u32, uv: Vec2, reference: f32) -> f32;
}

/// CPU shadow map: square `f32` depth layers, cleared to the far plane (1.0).
#[derive(Clone, Debug)]
pub struct ShadowMap {
    resolution: u32,
    layers: Vec<Vec<f32>>,
}

impl ShadowMap {
    /// Allocate `layer_count` layers of `resolution × resolution` texels.
    pub fn new(resolution: u32, layer_count: u32) -> Result<Self, ShadowConfigError> {
        check_resolution(resolution)?;
        let texels = resolution as usize * resolution as usize;
        Ok(Self {
            resolution,
            layers: vec![vec![1.0; texels]; layer_count as usize],
        })
    }

    /// Texels per side.
    #[inline]
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Reset every texel to the far plane.
    pub fn clear(&mut self) {
        for layer in &mut self.layers {
            layer.fill(1.0);
        }
    }

    /// Stored depth, with clamp-to-edge addressing.
    pub fn depth_at(&self, layer: u32, x: i64, y: i64) -> f32 {
        let max = self.resolution as i64 - 1;
        let x = x.clamp(0, max) as usize;
        let y = y.clamp(0, max) as usize;
        self.layers
            .get(layer as usize)
            .map_or(1.0, |texels| texels[y * self.resolution as usize + x])
    }

    /// Keep the nearer of the stored depth and `depth` at texel `(x, y)`.
    ///
    /// Out-of-range texels and layers are ignored.
    pub fn write_depth(&mut self, layer: u32, x: u32, y: u32, depth: f32) {
        if x >= self.resolution || y >= self.resolution {
            return;
        }
        let index = (y * self.resolution + x) as usize;
        if let Some(texel) = self
            .layers
            .get_mut(layer as usize)
            .and_then(|texels| texels.get_mut(index))
        {
            *texel = texel.min(depth);
        }
    }

    /// Project a world-space caster sample and write its depth over a square
    /// footprint of `radius` texels.
    ///
    /// Returns `false` when the point falls outside the light frustum.
    pub fn splat_point(&mut self, layer: u32, light_view_proj: Mat4, world: Vec3, radius: u32) -> bool {
        let clip = light_view_proj * world.extend(1.0);
        if clip.w.abs() < f32::EPSILON {
            return false;
        }
        let ndc = clip.truncate() / clip.w;
        let uv = Vec2::new(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5);
        if !(0.0..=1.0).contains(&uv.x) || !(0.0..=1.0).contains(&uv.y) || !(0.0..=1.0).contains(&ndc.z) {
            return false;
        }
        let res = self.resolution as i64;
        let cx = ((uv.x * self.resolution as f32) as i64).min(res - 1);
        let cy = ((uv.y * self.resolution as f32) as i64).min(res - 1);
        let r = radius as i64;
        for y in (cy - r).max(0)..=(cy + r).min(res - 1) {
            for x in (cx - r).max(0)..=(cx + r).min(res - 1) {
                self.write_depth(layer, x as u32, y as u32, ndc.z);
            }
        }
        true
    }

    #[inline]
    fn compare(&self, layer: u32, x: i64, y: i64, reference: f32) -> f32 {
        if reference <= self.depth_at(layer, x, y) {
            1.0
        } else {
            0.0
        }
    }
}

impl DepthCompare for ShadowMap {
    fn layer_count(&self) -> u32 {
        self.layers.len() as u32
    }

    fn sample_compare(&self, layer: u32, uv: Vec2, reference: f32) -> f32 {
        debug_assert!(
            layer < self.layer_count(),
            "cascade layer {layer} not configured"
        );
        let texel = uv * self.resolution as f32 - Vec2::splat(0.5);
        let base = texel.floor();
        let f = texel - base;
        let (x0, y0) = (base.x as i64, base.y as i64);

        let c00 = self.compare(layer, x0, y0, reference);
        let c10 = self.compare(layer, x0 + 1, y0, reference);
        let c01 = self.compare(layer, x0, y0 + 1, reference);
        let c11 = self.compare(layer, x0 + 1, y0 + 1, reference);

        let top = c00 + (c10 - c00) * f.x;
        let bottom = c01 + (c11 - c01) * f.x;
        top + (bottom - top) * f.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::MAX_SHADOW_RESOLUTION;

    #[test]
    fn test_new_map_is_cleared_to_far_plane() {
        let map = ShadowMap::new(8, 2).unwrap();
        assert_eq!(map.layer_count(), 2);
        assert_eq!(map.depth_at(1, 3, 3), 1.0);
        assert_eq!(map.sample_compare(0, Vec2::splat(0.5), 0.99), 1.0);
    }

    #[test]
    fn test_zero_resolution_is_rejected() {
        assert_eq!(
            ShadowMap::new(0, 1).unwrap_err(),
            ShadowConfigError::ZeroResolution
        );
    }

    #[test]
    fn test_oversized_resolution_is_rejected() {
        assert_eq!(
            ShadowMap::new(70_000, 1).unwrap_err(),
            ShadowConfigError::ResolutionTooLarge {
                resolution: 70_000,
                max: MAX_SHADOW_RESOLUTION
            }
        );
    }

    #[test]
    fn test_write_depth_keeps_nearest() {
        let mut map = ShadowMap::new(4, 1).unwrap();
        map.write_depth(0, 1, 2, 0.4);
        map.write_depth(0, 1, 2, 0.6);
        assert_eq!(map.depth_at(0, 1, 2), 0.4);
        // Out of range writes are ignored.
        map.write_depth(0, 9, 9, 0.1);
        map.write_depth(3, 0, 0, 0.1);
        assert_eq!(map.depth_at(0, 0, 0), 1.0);
    }

    #[test]
    fn test_compare_is_less_equal() {
        let mut map = ShadowMap::new(1, 1).unwrap();
        map.write_depth(0, 0, 0, 0.5);
        assert_eq!(map.sample_compare(0, Vec2::splat(0.5), 0.5), 1.0);
        assert_eq!(map.sample_compare(0, Vec2::splat(0.5), 0.49), 1.0);
        assert_eq!(map.sample_compare(0, Vec2::splat(0.5), 0.51), 0.0);
    }

    #[test]
    fn test_linear_filter_blends_across_edge() {
        let mut map = ShadowMap::new(4, 1).unwrap();
        for y in 0..4 {
            map.write_depth(0, 0, y, 0.2);
            map.write_depth(0, 1, y, 0.2);
        }
        // Exactly between texel 1 (occluded) and texel 2 (lit).
        let mid = map.sample_compare(0, Vec2::new(0.5, 0.5), 0.5);
        assert!((mid - 0.5).abs() < 1e-5, "expected half-lit, got {mid}");
        // Texel centres give hard results.
        assert_eq!(map.sample_compare(0, Vec2::new(0.125, 0.5), 0.5), 0.0);
        assert_eq!(map.sample_compare(0, Vec2::new(0.875, 0.5), 0.5), 1.0);
    }

    #[test]
    fn test_clamp_to_edge_addressing() {
        let mut map = ShadowMap::new(2, 1).unwrap();
        map.write_depth(0, 0, 0, 0.1);
        assert_eq!(map.depth_at(0, -5, -5), 0.1);
        assert_eq!(map.sample_compare(0, Vec2::new(0.0, 0.0), 0.5), 0.0);
    }

    #[test]
    fn test_splat_point_writes_footprint() {
        let mut map = ShadowMap::new(16, 1).unwrap();
        let matrix = Mat4::orthographic_rh(-8.0, 8.0, -8.0, 8.0, 0.0, 10.0);
        assert!(map.splat_point(0, matrix, Vec3::new(0.5, 0.5, -5.0), 1));
        // (0.5, 0.5) lands in texel (8, 7).
        assert!((map.depth_at(0, 8, 7) - 0.5).abs() < 1e-5);
        assert!((map.depth_at(0, 9, 8) - 0.5).abs() < 1e-5);
        assert_eq!(map.depth_at(0, 11, 7), 1.0);
        assert!(!map.splat_point(0, matrix, Vec3::new(20.0, 0.0, -5.0), 1));
    }

    #[test]
    fn test_clear_resets_layers() {
        let mut map = ShadowMap::new(2, 1).unwrap();
        map.write_depth(0, 1, 1, 0.3);
        map.clear();
        assert_eq!(map.depth_at(0, 1, 1), 1.0);
    }
}
