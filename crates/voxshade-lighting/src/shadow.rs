//! Shadow visibility for a surface point: cascade dispatch, normal-offset
//! bias, light-space projection and percentage-closer filtering.

use glam::{Mat4, Vec2, Vec3};

use crate::cascade::{MAX_CASCADES, ShadowCascadeSet};
use crate::shadow_map::DepthCompare;

/// Fixed 16-tap Poisson disk, radius about one kernel unit.
///
/// Kept constant across frames and pixels so penumbrae do not shimmer.
pub const POISSON_DISK_16: [Vec2; 16] = [
    Vec2::new(-0.942_016_24, -0.399_062_16),
    Vec2::new(0.945_586_1, -0.768_907_25),
    Vec2::new(-0.094_184_1, -0.929_388_7),
    Vec2::new(0.344_959_38, 0.293_877_6),
    Vec2::new(-0.915_885_8, 0.457_714_32),
    Vec2::new(-0.815_442_3, -0.879_124_64),
    Vec2::new(-0.382_775_43, 0.276_768_45),
    Vec2::new(0.974_843_98, 0.756_483_8),
    Vec2::new(0.443_233_25, -0.975_115_54),
    Vec2::new(0.537_429_8, -0.473_734_2),
    Vec2::new(-0.264_969_1, -0.418_930_23),
    Vec2::new(0.791_975_14, 0.190_901_88),
    Vec2::new(-0.241_888_4, 0.997_065_07),
    Vec2::new(-0.814_099_55, 0.914_375_9),
    Vec2::new(0.199_841_26, 0.786_413_67),
    Vec2::new(0.143_831_61, -0.141_007_9),
];

/// 3×3 grid in whole texels.
pub const GRID_3X3: [Vec2; 9] = [
    Vec2::new(-1.0, -1.0),
    Vec2::new(0.0, -1.0),
    Vec2::new(1.0, -1.0),
    Vec2::new(-1.0, 0.0),
    Vec2::new(0.0, 0.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(-1.0, 1.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(1.0, 1.0),
];

const SINGLE_TAP: [Vec2; 1] = [Vec2::ZERO];

/// Percentage-closer filter kernel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PcfFilter {
    /// 16 Poisson taps scaled by `texel_size * spread`: wide, soft.
    Poisson16,
    /// 9 taps on a one-texel grid.
    Grid3x3,
    /// One filtered comparison.
    SingleTap,
}

impl PcfFilter {
    /// Tap offsets in kernel units.
    pub fn offsets(self) -> &'static [Vec2] {
        match self {
            Self::Poisson16 => &POISSON_DISK_16,
            Self::Grid3x3 => &GRID_3X3,
            Self::SingleTap => &SINGLE_TAP,
        }
    }

    /// UV distance of one kernel unit.
    pub fn scale(self, texel_size: f32, spread: f32) -> f32 {
        match self {
            Self::Poisson16 => texel_size * spread,
            Self::Grid3x3 | Self::SingleTap => texel_size,
        }
    }
}

/// Filter used by each cascade index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PcfStrategyTable(pub [PcfFilter; MAX_CASCADES]);

impl PcfStrategyTable {
    /// Poisson filtering in every cascade.
    pub const fn uniform() -> Self {
        Self([PcfFilter::Poisson16; MAX_CASCADES])
    }

    /// Soft near cascades, cheaper far ones.
    pub const fn tiered() -> Self {
        Self([
            PcfFilter::Poisson16,
            PcfFilter::Poisson16,
            PcfFilter::Grid3x3,
            PcfFilter::SingleTap,
        ])
    }

    /// Filter for `cascade`.
    #[inline]
    pub fn filter_for(&self, cascade: u8) -> PcfFilter {
        self.0[(cascade as usize).min(MAX_CASCADES - 1)]
    }
}

impl Default for PcfStrategyTable {
    fn default() -> Self {
        Self::uniform()
    }
}

/// Position of a point in shadow map space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowCoord {
    /// Texture coordinate, origin at the top-left.
    pub uv: Vec2,
    /// Reference depth in `[0, 1]`.
    pub depth: f32,
}

impl ShadowCoord {
    /// Project `world` with a light view-projection.
    ///
    /// Returns `None` when the point falls outside the light frustum.
    pub fn project(light_view_proj: Mat4, world: Vec3) -> Option<Self> {
        let clip = light_view_proj * world.extend(1.0);
        if clip.w.abs() < f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let coord = Self {
            uv: Vec2::new(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5),
            depth: ndc.z,
        };
        coord.in_frustum().then_some(coord)
    }

    fn in_frustum(&self) -> bool {
        let unit = 0.0..=1.0;
        unit.contains(&self.uv.x) && unit.contains(&self.uv.y) && unit.contains(&self.depth)
    }
}

/// Shadow sampling parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowSampler {
    /// World-space normal offset in cascade 0.
    pub normal_offset: f32,
    /// Fractional growth of the offset per cascade index.
    pub normal_offset_growth: f32,
    /// Poisson kernel radius in texels.
    pub spread: f32,
    /// Kernel per cascade.
    pub filters: PcfStrategyTable,
}

impl Default for ShadowSampler {
    fn default() -> Self {
        Self {
            normal_offset: 0.1,
            normal_offset_growth: 0.3,
            spread: 2.5,
            filters: PcfStrategyTable::default(),
        }
    }
}

impl ShadowSampler {
    /// Normal offset for a cascade; coarser cascades cover more world per
    /// texel and need a larger push.
    #[inline]
    pub fn normal_offset_for(&self, cascade: u8) -> f32 {
        self.normal_offset * (1.0 + cascade as f32 * self.normal_offset_growth)
    }

    /// Visibility of `position` in `[0, 1]`, 1.0 meaning fully lit.
    ///
    /// Points beyond the last cascade split, points outside the selected
    /// cascade's light frustum, and every point when shadows are disabled are
    /// treated as lit.
    pub fn compute_shadow_factor<M: DepthCompare + ?Sized>(
        &self,
        position: Vec3,
        normal: Vec3,
        view_depth: f32,
        cascades: &ShadowCascadeSet,
        shadow_map: &M,
    ) -> f32 {
        let Some(last_split) = cascades.last_split() else {
            return 1.0;
        };
        if view_depth >= last_split {
            return 1.0;
        }

        let cascade = cascades.select(view_depth);
        let biased = position + normal * self.normal_offset_for(cascade);
        let Some(coord) = ShadowCoord::project(cascades.light_view_proj(cascade), biased) else {
            return 1.0;
        };

        let filter = self.filters.filter_for(cascade);
        let scale = filter.scale(cascades.texel_size(), self.spread);
        let reference = coord.depth - cascades.bias();
        let layer = cascade as u32;

        let offsets = filter.offsets();
        let lit: f32 = offsets
            .iter()
            .map(|&offset| shadow_map.sample_compare(layer, coord.uv + offset * scale, reference))
            .sum();
        (lit / offsets.len() as f32).clamp(0.0, 1.0)
    }
}
