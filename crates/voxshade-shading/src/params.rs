//! Tuned shading constants, injected from configuration at startup.

use glam::Vec3;
use voxshade_config::{ClassProfileConfig, MaterialsConfig, ShadingConfig};
use voxshade_materials::{ClassParams, ClassTable};

/// Per-face brightness tints standing in for ambient occlusion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceLight {
    /// Faces whose normal points up.
    pub top: f32,
    /// Faces whose normal is dominantly ±X.
    pub x_side: f32,
    /// Every other face (±Z sides and bottoms).
    pub other: f32,
}

impl Default for FaceLight {
    fn default() -> Self {
        Self {
            top: 1.0,
            x_side: 0.75,
            other: 0.6,
        }
    }
}

impl FaceLight {
    /// Tint for a face with `normal`.
    #[inline]
    pub fn for_normal(&self, normal: Vec3) -> f32 {
        if normal.y > 0.5 {
            self.top
        } else if normal.x.abs() > 0.5 {
            self.x_side
        } else {
            self.other
        }
    }
}

/// Ambient + diffuse weights of the blocky lighting model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadingParams {
    pub ambient: f32,
    pub diffuse_weight: f32,
    pub face_light: FaceLight,
}

impl Default for ShadingParams {
    fn default() -> Self {
        Self {
            ambient: 0.3,
            diffuse_weight: 0.7,
            face_light: FaceLight::default(),
        }
    }
}

impl ShadingParams {
    pub fn from_config(config: &ShadingConfig) -> Self {
        Self {
            ambient: config.ambient,
            diffuse_weight: config.diffuse_weight,
            face_light: FaceLight {
                top: config.top_face_light,
                x_side: config.x_face_light,
                other: config.other_face_light,
            },
        }
    }
}

fn class_params(profile: &ClassProfileConfig) -> ClassParams {
    ClassParams {
        edge_width: profile.edge_width,
        edge_strength: profile.edge_strength,
        bright_threshold: profile.bright_threshold,
        dark_threshold: profile.dark_threshold,
        bright_delta: profile.bright_delta,
        dark_delta: profile.dark_delta,
        jitter_amplitude: profile.jitter_amplitude,
        seed: profile.seed,
        side_average: profile.side_average,
    }
}

/// Procedural detail profiles from configuration. Unvalidated; frame
/// assembly checks them.
pub fn class_table_from_config(config: &MaterialsConfig) -> ClassTable {
    ClassTable {
        grass: class_params(&config.grass),
        stone: class_params(&config.stone),
        generic: class_params(&config.generic),
    }
}
