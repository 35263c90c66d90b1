//! Distance fog.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use voxshade_config::FogConfig;
use voxshade_materials::smoothstep;

/// Fog blended in over the horizontal distance band `[near, far]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FogParameters {
    /// Linear RGB.
    pub color: Vec3,
    pub near_distance: f32,
    pub far_distance: f32,
}

impl Default for FogParameters {
    fn default() -> Self {
        Self {
            color: Vec3::new(0.7, 0.8, 0.9),
            near_distance: 96.0,
            far_distance: 192.0,
        }
    }
}

impl FogParameters {
    pub fn from_config(config: &FogConfig) -> Self {
        Self {
            color: Vec3::from(config.color),
            near_distance: config.near,
            far_distance: config.far,
        }
    }

    /// Fog weight in `[0, 1]`: 0 up to `near_distance`, 1 from `far_distance`.
    #[inline]
    pub fn factor(&self, horizontal_distance: f32) -> f32 {
        smoothstep(self.near_distance, self.far_distance, horizontal_distance)
    }

    /// Blend `lit` toward the fog color.
    #[inline]
    pub fn apply(&self, lit: Vec3, horizontal_distance: f32) -> Vec3 {
        lit.lerp(self.color, self.factor(horizontal_distance))
    }

    pub fn to_uniform(&self) -> FogUniform {
        FogUniform {
            color_near: [self.color.x, self.color.y, self.color.z, self.near_distance],
            far_padding: [self.far_distance, 0.0, 0.0, 0.0],
        }
    }
}

/// GPU-side fog, 32 bytes, std140-compatible.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct FogUniform {
    /// xyz = color, w = near distance.
    pub color_near: [f32; 4],
    /// x = far distance.
    pub far_padding: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_inside_near_distance() {
        let fog = FogParameters::default();
        let lit = Vec3::new(0.2, 0.4, 0.1);
        for d in [0.0, 10.0, 95.9, 96.0] {
            assert_eq!(fog.apply(lit, d), lit, "distance {d}");
        }
    }

    #[test]
    fn test_converges_to_fog_color() {
        let fog = FogParameters::default();
        let lit = Vec3::new(0.2, 0.4, 0.1);
        for d in [192.0, 500.0, 1.0e6] {
            let c = fog.apply(lit, d);
            assert!((c - fog.color).length() < 1e-6, "distance {d}: {c}");
        }
        let mid = fog.apply(lit, 144.0);
        assert!((mid - (lit + fog.color) * 0.5).length() < 1e-5);
    }

    #[test]
    fn test_factor_is_monotonic() {
        let fog = FogParameters::default();
        let mut last = 0.0;
        for i in 0..300 {
            let f = fog.factor(i as f32);
            assert!(f >= last);
            last = f;
        }
    }

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<FogUniform>(), 32);
        let u = FogParameters::default().to_uniform();
        assert_eq!(u.color_near[3], 96.0);
        assert_eq!(u.far_padding[0], 192.0);
    }

    #[test]
    fn test_from_config() {
        let fog = FogParameters::from_config(&FogConfig::default());
        assert_eq!(fog, FogParameters::default());
    }
}
