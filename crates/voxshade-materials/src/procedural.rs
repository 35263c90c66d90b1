//! Procedural surface detail for blocks below the custom-texture threshold.
//!
//! Detail is a brightness delta built from three layers: darkening near tile
//! edges, quantized speckle on an 8×8 sub-tile grid, and a fine continuous
//! jitter. All three fade out with camera distance to avoid moiré.

use glam::{IVec2, Vec2, Vec3};

use crate::material::{ClassParams, ClassTable, MaterialClass};
use crate::noise;
use crate::surface::smoothstep;

/// Speckle cells per tile side.
pub const SPECKLE_CELLS: f32 = 8.0;
/// Jitter lattice cells per tile side.
pub const JITTER_CELLS: f32 = 32.0;
/// Decorrelates jitter from speckle under the same class seed.
const JITTER_SEED_SALT: u32 = 0x5bd1_e995;

/// Source of per-fragment procedural detail.
pub trait SurfaceDetail {
    /// Brightness delta for a face point of class `class`.
    ///
    /// `block_xz` is any point inside the block; it is floored to pick the
    /// per-block noise instance.
    fn variation(&self, class: MaterialClass, uv: Vec2, block_xz: Vec2, distance: f32) -> f32;

    /// Base color after distance-dependent side-face averaging.
    fn side_face_albedo(
        &self,
        class: MaterialClass,
        base_color: Vec3,
        is_top: bool,
        distance: f32,
    ) -> Vec3;
}

/// Hash-noise detail generator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProceduralGenerator {
    /// Full detail up to this camera distance.
    pub fade_start: f32,
    /// No detail beyond this camera distance.
    pub fade_end: f32,
    pub classes: ClassTable,
}

impl Default for ProceduralGenerator {
    fn default() -> Self {
        Self {
            fade_start: 15.0,
            fade_end: 40.0,
            classes: ClassTable::default(),
        }
    }
}

impl ProceduralGenerator {
    pub fn new(fade_start: f32, fade_end: f32, classes: ClassTable) -> Self {
        Self {
            fade_start,
            fade_end,
            classes,
        }
    }

    /// 1.0 up close, 0.0 far away.
    #[inline]
    pub fn detail_fade(&self, distance: f32) -> f32 {
        1.0 - smoothstep(self.fade_start, self.fade_end, distance)
    }

    /// Non-positive darkening, zero once the point is `edge_width` from every
    /// tile border. Not faded.
    pub fn edge_darkening(params: &ClassParams, uv: Vec2) -> f32 {
        let edge_distance = uv.min(Vec2::ONE - uv).min_element().max(0.0);
        -params.edge_strength * (1.0 - smoothstep(0.0, params.edge_width, edge_distance))
    }

    /// Quantized speckle delta: `+bright_delta`, `-dark_delta`, or 0.
    pub fn speckle(params: &ClassParams, uv: Vec2, block: IVec2) -> f32 {
        let cell = (uv * SPECKLE_CELLS)
            .floor()
            .as_ivec2()
            .clamp(IVec2::ZERO, IVec2::splat(SPECKLE_CELLS as i32 - 1));
        let h = noise::cell_hash(cell, block, params.seed);
        if h > params.bright_threshold {
            params.bright_delta
        } else if h < params.dark_threshold {
            -params.dark_delta
        } else {
            0.0
        }
    }

    /// Continuous jitter in `[-jitter_amplitude, jitter_amplitude]`.
    pub fn jitter(params: &ClassParams, uv: Vec2, block: IVec2) -> f32 {
        let n = noise::value_noise(uv * JITTER_CELLS, block, params.seed ^ JITTER_SEED_SALT);
        (n * 2.0 - 1.0) * params.jitter_amplitude
    }

    /// Classify `base_color` and return its brightness delta.
    pub fn procedural_variation(
        &self,
        base_color: Vec3,
        uv: Vec2,
        world_xz: Vec2,
        distance: f32,
    ) -> f32 {
        self.variation(MaterialClass::classify(base_color), uv, world_xz, distance)
    }
}

impl SurfaceDetail for ProceduralGenerator {
    fn variation(&self, class: MaterialClass, uv: Vec2, block_xz: Vec2, distance: f32) -> f32 {
        let fade = self.detail_fade(distance);
        if fade <= 0.0 {
            return 0.0;
        }
        let params = self.classes.get(class);
        let block = block_xz.floor().as_ivec2();
        let detail = Self::edge_darkening(params, uv)
            + Self::speckle(params, uv, block)
            + Self::jitter(params, uv, block);
        detail * fade
    }

    fn side_face_albedo(
        &self,
        class: MaterialClass,
        base_color: Vec3,
        is_top: bool,
        distance: f32,
    ) -> Vec3 {
        match self.classes.get(class).side_average {
            Some(average) if !is_top => {
                base_color.lerp(Vec3::from(average), 1.0 - self.detail_fade(distance))
            }
            _ => base_color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLASSES: [MaterialClass; 3] = [
        MaterialClass::Grass,
        MaterialClass::Stone,
        MaterialClass::Generic,
    ];

    #[test]
    fn test_detail_fade_band() {
        let generator = ProceduralGenerator::default();
        assert_eq!(generator.detail_fade(0.0), 1.0);
        assert_eq!(generator.detail_fade(15.0), 1.0);
        assert_eq!(generator.detail_fade(40.0), 0.0);
        assert_eq!(generator.detail_fade(500.0), 0.0);
        let mid = generator.detail_fade(27.5);
        assert!((mid - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_edge_darkening_zero_at_centre_max_at_corners() {
        let table = ClassTable::default();
        for class in CLASSES {
            let params = table.get(class);
            assert_eq!(
                ProceduralGenerator::edge_darkening(params, Vec2::splat(0.5)),
                0.0,
                "{class:?} centre"
            );
            for corner in [Vec2::ZERO, Vec2::ONE, Vec2::new(0.0, 1.0)] {
                let at_corner = ProceduralGenerator::edge_darkening(params, corner);
                assert!(
                    (at_corner + params.edge_strength).abs() < 1e-6,
                    "{class:?} corner {corner}: {at_corner}"
                );
            }
            for i in 0..=20 {
                let uv = Vec2::new(i as f32 / 20.0, 0.3);
                let e = ProceduralGenerator::edge_darkening(params, uv);
                assert!(e <= 0.0 && e >= -params.edge_strength - 1e-6);
            }
        }
    }

    #[test]
    fn test_edge_darkening_ramps_within_edge_width() {
        let params = ClassParams::GRASS;
        let inside = ProceduralGenerator::edge_darkening(&params, Vec2::new(0.03, 0.5));
        let outside = ProceduralGenerator::edge_darkening(&params, Vec2::new(0.07, 0.5));
        assert!(inside < 0.0 && inside > -params.edge_strength);
        assert_eq!(outside, 0.0);
    }

    #[test]
    fn test_variation_is_deterministic() {
        let generator = ProceduralGenerator::default();
        for i in 0..64 {
            let uv = Vec2::new((i % 8) as f32 / 8.0 + 0.03, (i / 8) as f32 / 8.0 + 0.07);
            let xz = Vec2::new(i as f32 * 1.5 - 40.0, 12.25);
            for class in CLASSES {
                let a = generator.variation(class, uv, xz, 3.0);
                let b = generator.variation(class, uv, xz, 3.0);
                assert_eq!(a.to_bits(), b.to_bits());
            }
        }
    }

    #[test]
    fn test_speckle_is_constant_within_a_cell() {
        let params = ClassParams::STONE;
        let block = IVec2::new(5, -7);
        let a = ProceduralGenerator::speckle(&params, Vec2::new(0.26, 0.51), block);
        let b = ProceduralGenerator::speckle(&params, Vec2::new(0.37, 0.62), block);
        assert_eq!(a, b, "same 8x8 cell must give the same speckle");
    }

    #[test]
    fn test_speckle_varies_between_blocks() {
        let params = ClassParams::GRASS;
        let uv = Vec2::new(0.4, 0.6);
        let values: Vec<f32> = (0..200)
            .map(|x| ProceduralGenerator::speckle(&params, uv, IVec2::new(x, 0)))
            .collect();
        assert!(values.iter().any(|&v| v > 0.0), "no bright speckle");
        assert!(values.iter().any(|&v| v < 0.0), "no dark speckle");
        assert!(values.iter().any(|&v| v == 0.0), "no plain cells");
    }

    #[test]
    fn test_speckle_depends_on_floored_world_xz() {
        let generator = ProceduralGenerator::default();
        let uv = Vec2::new(0.5, 0.5);
        let a = generator.variation(MaterialClass::Stone, uv, Vec2::new(3.1, 9.9), 1.0);
        let b = generator.variation(MaterialClass::Stone, uv, Vec2::new(3.8, 9.2), 1.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_jitter_is_bounded() {
        for class in CLASSES {
            let params = *ClassTable::default().get(class);
            for i in 0..200 {
                let uv = Vec2::new((i as f32 * 0.137).fract(), (i as f32 * 0.291).fract());
                let j = ProceduralGenerator::jitter(&params, uv, IVec2::new(i, -i));
                assert!(j.abs() <= params.jitter_amplitude + 1e-6);
            }
        }
    }

    #[test]
    fn test_grass_top_face_close_up_delta_range() {
        let generator = ProceduralGenerator::default();
        let base = Vec3::new(0.2, 0.8, 0.1);
        let mut nonzero = 0;
        for bx in -10..10 {
            for i in 0..36 {
                // Keep clear of the edge band.
                let uv = Vec2::new(0.1 + (i % 6) as f32 * 0.15, 0.1 + (i / 6) as f32 * 0.15);
                let xz = Vec2::new(bx as f32 + 0.5, 4.5);
                let delta = generator.procedural_variation(base, uv, xz, 5.0);
                assert!(
                    (-0.06..=0.08).contains(&delta),
                    "delta {delta} out of range at {uv} block {bx}"
                );
                if delta != 0.0 {
                    nonzero += 1;
                }
            }
        }
        assert!(nonzero > 0);
    }

    #[test]
    fn test_detail_vanishes_beyond_fade_end() {
        let generator = ProceduralGenerator::default();
        for class in CLASSES {
            let v = generator.variation(class, Vec2::ZERO, Vec2::new(1.0, 2.0), 41.0);
            assert_eq!(v, 0.0, "{class:?}");
        }
    }

    #[test]
    fn test_side_faces_blend_toward_average_with_distance() {
        let generator = ProceduralGenerator::default();
        let base = Vec3::new(0.2, 0.8, 0.1);
        let average = Vec3::from(ClassParams::GRASS.side_average.unwrap());

        let near = generator.side_face_albedo(MaterialClass::Grass, base, false, 5.0);
        assert_eq!(near, base);
        let far = generator.side_face_albedo(MaterialClass::Grass, base, false, 100.0);
        assert!((far - average).length() < 1e-6);
        let top = generator.side_face_albedo(MaterialClass::Grass, base, true, 100.0);
        assert_eq!(top, base);
        let generic = generator.side_face_albedo(MaterialClass::Generic, base, false, 100.0);
        assert_eq!(generic, base);
    }
}
