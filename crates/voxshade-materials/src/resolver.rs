//! Chooses between the texture atlas and procedural detail for a fragment.

use glam::{Vec2, Vec3};

use crate::atlas::TextureAtlas;
use crate::material::MaterialClass;
use crate::procedural::SurfaceDetail;
use crate::surface::{SurfacePoint, face_uv};

/// Albedo of a fragment and which path produced it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedSurface {
    /// Linear RGB in `[0, 1]`.
    pub albedo: Vec3,
    /// Sampled from the atlas; such texels are lit without the light color.
    pub uses_atlas: bool,
}

/// Resolves surface albedo against one atlas and one detail source.
pub struct SurfaceResolver<'a, D: SurfaceDetail + ?Sized> {
    atlas: &'a TextureAtlas,
    detail: &'a D,
}

impl<'a, D: SurfaceDetail + ?Sized> SurfaceResolver<'a, D> {
    pub fn new(atlas: &'a TextureAtlas, detail: &'a D) -> Self {
        Self { atlas, detail }
    }

    /// Albedo of `point` seen from `view_position`.
    ///
    /// Custom blocks are sampled from their atlas tile. Other blocks, and
    /// custom ids that have no tile, get procedural detail; tile-less ids
    /// always use the generic class.
    pub fn resolve_surface_color(
        &self,
        point: &SurfacePoint,
        view_position: Vec3,
    ) -> ResolvedSurface {
        let uv = face_uv(point.world_position, point.normal);
        let layout = self.atlas.layout();

        if layout.is_custom(point.block_id) {
            if let Some(texel) = self.atlas.sample_block(point.block_id, uv) {
                return ResolvedSurface {
                    albedo: texel,
                    uses_atlas: true,
                };
            }
            return self.procedural(point, uv, view_position, MaterialClass::Generic);
        }

        let class = point
            .material
            .unwrap_or_else(|| MaterialClass::classify(point.base_color));
        self.procedural(point, uv, view_position, class)
    }

    fn procedural(
        &self,
        point: &SurfacePoint,
        uv: Vec2,
        view_position: Vec3,
        class: MaterialClass,
    ) -> ResolvedSurface {
        let distance = view_position.distance(point.world_position);
        let block = point.block_position();
        let side = self.detail.side_face_albedo(
            class,
            point.base_color,
            point.is_top_face(),
            distance,
        );
        let delta = self
            .detail
            .variation(class, uv, Vec2::new(block.x, block.z), distance);
        ResolvedSurface {
            albedo: (side + Vec3::splat(delta)).clamp(Vec3::ZERO, Vec3::ONE),
            uses_atlas: false,
        }
    }
}
