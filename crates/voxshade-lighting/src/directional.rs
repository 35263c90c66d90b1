//! Directional light: the single sun or moon light that shades terrain.
//!
//! The [`DirectionalLight`] struct describes the CPU-side light properties,
//! while [`DirectionalLightUniform`] is the GPU-side representation written
//! to a uniform buffer each frame.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// CPU-side directional light description.
///
/// The direction and color are refreshed once per frame by the day/night
/// cycle; shading only reads them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    /// Normalized direction vector pointing FROM the light (toward the surface).
    pub direction: Vec3,
    /// Linear RGB color of the light (not premultiplied by intensity).
    pub color: Vec3,
    /// Scalar intensity multiplier.
    pub intensity: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            // Morning sun, slightly off-vertical.
            direction: Vec3::new(0.4, -0.8, 0.3).normalize(),
            color: Vec3::new(1.0, 0.98, 0.95),
            intensity: 1.0,
        }
    }
}

impl DirectionalLight {
    /// Create a light, normalizing `direction`.
    ///
    /// # Panics
    ///
    /// Panics if the direction has near-zero length.
    pub fn new(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        let mut light = Self {
            direction: Vec3::NEG_Y,
            color,
            intensity,
        };
        light.set_direction(direction);
        light
    }

    /// Set the light direction, normalizing the input.
    ///
    /// # Panics
    ///
    /// Panics if the input vector has near-zero length.
    pub fn set_direction(&mut self, dir: Vec3) {
        let len = dir.length();
        assert!(len > 1e-6, "directional light direction must not be zero");
        self.direction = dir / len;
    }

    /// Unit vector from a surface toward the light.
    #[inline]
    pub fn to_light(&self) -> Vec3 {
        -self.direction
    }

    /// Lambert term for a surface normal, scaled by intensity.
    #[inline]
    pub fn lambert(&self, normal: Vec3) -> f32 {
        normal.dot(self.to_light()).max(0.0) * self.intensity
    }

    /// Build the GPU-side uniform from this light's properties.
    pub fn to_uniform(&self) -> DirectionalLightUniform {
        DirectionalLightUniform {
            direction_intensity: [
                self.direction.x,
                self.direction.y,
                self.direction.z,
                self.intensity,
            ],
            color_padding: [self.color.x, self.color.y, self.color.z, 0.0],
        }
    }
}

/// GPU-side representation, 32 bytes, std140-compatible.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct DirectionalLightUniform {
    /// xyz = direction (normalized), w = intensity.
    pub direction_intensity: [f32; 4],
    /// xyz = color (linear RGB), w = padding.
    pub color_padding: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_is_normalized() {
        let light = DirectionalLight::default();
        let len = light.direction.length();
        assert!(
            (len - 1.0).abs() < 1e-6,
            "direction must be unit length, got {len}"
        );
    }

    #[test]
    fn test_new_normalizes() {
        let light = DirectionalLight::new(Vec3::new(3.0, -4.0, 0.0), Vec3::ONE, 2.0);
        assert!((light.direction.length() - 1.0).abs() < 1e-6);
        assert!((light.direction.x - 0.6).abs() < 1e-6);
    }

    #[test]
    #[should_panic(expected = "must not be zero")]
    fn test_zero_direction_panics() {
        let mut light = DirectionalLight::default();
        light.set_direction(Vec3::ZERO);
    }

    #[test]
    fn test_lambert_faces_light() {
        let light = DirectionalLight::new(Vec3::NEG_Y, Vec3::ONE, 0.8);
        assert!((light.lambert(Vec3::Y) - 0.8).abs() < 1e-6);
        assert_eq!(light.lambert(Vec3::NEG_Y), 0.0, "back faces get no diffuse");
        assert!(light.lambert(Vec3::X).abs() < 1e-6);
    }

    #[test]
    fn test_uniform_buffer_layout_matches_shader() {
        assert_eq!(std::mem::size_of::<DirectionalLightUniform>(), 32);
        assert_eq!(
            std::mem::offset_of!(DirectionalLightUniform, direction_intensity),
            0
        );
        assert_eq!(
            std::mem::offset_of!(DirectionalLightUniform, color_padding),
            16
        );
    }

    #[test]
    fn test_to_uniform_packs_correctly() {
        let light = DirectionalLight {
            direction: Vec3::new(0.0, -1.0, 0.0),
            color: Vec3::new(1.0, 0.5, 0.25),
            intensity: 2.0,
        };
        let u = light.to_uniform();
        assert!((u.direction_intensity[1] - (-1.0)).abs() < 1e-6);
        assert!((u.direction_intensity[3] - 2.0).abs() < 1e-6);
        assert!((u.color_padding[1] - 0.5).abs() < 1e-6);
        assert!((u.color_padding[3] - 0.0).abs() < 1e-6);
    }
}
