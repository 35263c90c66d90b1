//! Cascade set validation and per-fragment cascade selection.
//!
//! A [`ShadowCascadeSet`] holds up to four light-space matrices and the view
//! depths at which each cascade ends. All invariants (strictly increasing
//! splits, count within the available matrices and shadow map layers) are
//! checked here at configuration time so the sampler never has to.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use thiserror::Error;

/// Maximum number of cascades a set can hold.
pub const MAX_CASCADES: usize = 4;

/// Largest shadow map side length accepted, in texels.
pub const MAX_SHADOW_RESOLUTION: u32 = 16384;

/// Errors returned while building a cascade set or shadow map.
#[derive(Debug, Error, PartialEq)]
pub enum ShadowConfigError {
    /// More cascades were requested than the set can hold.
    #[error("cascade count {count} exceeds the maximum of {max}")]
    TooManyCascades {
        /// Requested count.
        count: usize,
        /// Supported maximum.
        max: usize,
    },

    /// Number of light matrices differs from the number of splits.
    #[error("{matrices} light matrices given for {splits} cascade splits")]
    LengthMismatch {
        /// Number of matrices.
        matrices: usize,
        /// Number of splits.
        splits: usize,
    },

    /// A split is not finite or not positive.
    #[error("cascade split {index} is invalid: {value}")]
    InvalidSplit {
        /// Split index.
        index: usize,
        /// Offending value.
        value: f32,
    },

    /// A split is not greater than the one before it.
    #[error("cascade split {index} ({value}) is not greater than split {}", .index - 1)]
    SplitsNotIncreasing {
        /// Split index.
        index: usize,
        /// Offending value.
        value: f32,
    },

    /// Texel size must be positive and finite.
    #[error("shadow texel size must be positive, got {0}")]
    InvalidTexelSize(f32),

    /// Bias must be non-negative and finite.
    #[error("shadow bias must be non-negative, got {0}")]
    InvalidBias(f32),

    /// Shadow map resolution must be non-zero.
    #[error("shadow map resolution must be non-zero")]
    ZeroResolution,

    /// Shadow map resolution exceeds [`MAX_SHADOW_RESOLUTION`].
    #[error("shadow map resolution {resolution} exceeds the maximum of {max}")]
    ResolutionTooLarge { resolution: u32, max: u32 },
}

/// Reject zero and oversized shadow map resolutions.
pub(crate) fn check_resolution(resolution: u32) -> Result<(), ShadowConfigError> {
    if resolution == 0 {
        return Err(ShadowConfigError::ZeroResolution);
    }
    if resolution > MAX_SHADOW_RESOLUTION {
        return Err(ShadowConfigError::ResolutionTooLarge {
            resolution,
            max: MAX_SHADOW_RESOLUTION,
        });
    }
    Ok(())
}

/// Per-frame cascaded shadow inputs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowCascadeSet {
    light_view_proj: [Mat4; MAX_CASCADES],
    cascade_splits: [f32; MAX_CASCADES],
    texel_size: f32,
    bias: f32,
    active_cascade_count: u8,
}

impl ShadowCascadeSet {
    /// Build a validated cascade set.
    ///
    /// `matrices[i]` is the light view-projection for the cascade ending at
    /// view depth `splits[i]`. `texel_size` is one shadow map texel in UV
    /// units (usually `1.0 / resolution`).
    pub fn new(
        matrices: &[Mat4],
        splits: &[f32],
        texel_size: f32,
        bias: f32,
    ) -> Result<Self, ShadowConfigError> {
        if splits.len() > MAX_CASCADES {
            return Err(ShadowConfigError::TooManyCascades {
                count: splits.len(),
                max: MAX_CASCADES,
            });
        }
        if matrices.len() != splits.len() {
            return Err(ShadowConfigError::LengthMismatch {
                matrices: matrices.len(),
                splits: splits.len(),
            });
        }
        for (index, &value) in splits.iter().enumerate() {
            if !value.is_finite() || value <= 0.0 {
                return Err(ShadowConfigError::InvalidSplit { index, value });
            }
            if index > 0 && value <= splits[index - 1] {
                return Err(ShadowConfigError::SplitsNotIncreasing { index, value });
            }
        }
        if !texel_size.is_finite() || texel_size <= 0.0 {
            return Err(ShadowConfigError::InvalidTexelSize(texel_size));
        }
        if !bias.is_finite() || bias < 0.0 {
            return Err(ShadowConfigError::InvalidBias(bias));
        }

        let mut light_view_proj = [Mat4::IDENTITY; MAX_CASCADES];
        let mut cascade_splits = [f32::MAX; MAX_CASCADES];
        light_view_proj[..matrices.len()].copy_from_slice(matrices);
        cascade_splits[..splits.len()].copy_from_slice(splits);

        Ok(Self {
            light_view_proj,
            cascade_splits,
            texel_size,
            bias,
            active_cascade_count: splits.len() as u8,
        })
    }

    /// A set with shadows switched off.
    pub fn disabled() -> Self {
        Self {
            light_view_proj: [Mat4::IDENTITY; MAX_CASCADES],
            cascade_splits: [f32::MAX; MAX_CASCADES],
            texel_size: 1.0,
            bias: 0.0,
            active_cascade_count: 0,
        }
    }

    /// Limit the active cascades to the layers the shadow map actually has.
    pub fn clamp_to_layers(mut self, layer_count: u32) -> Self {
        let available = layer_count.min(MAX_CASCADES as u32) as u8;
        if self.active_cascade_count > available {
            tracing::warn!(
                requested = self.active_cascade_count,
                available,
                "clamping active shadow cascades to shadow map layers"
            );
            self.active_cascade_count = available;
        }
        self
    }

    /// Number of cascades in use; 0 means shadows are disabled.
    #[inline]
    pub fn active_cascade_count(&self) -> u8 {
        self.active_cascade_count
    }

    /// Splits of the active cascades, ascending.
    #[inline]
    pub fn splits(&self) -> &[f32] {
        &self.cascade_splits[..self.active_cascade_count as usize]
    }

    /// Far view depth of the outermost active cascade.
    #[inline]
    pub fn last_split(&self) -> Option<f32> {
        self.splits().last().copied()
    }

    /// Light view-projection of one cascade.
    #[inline]
    pub fn light_view_proj(&self, cascade: u8) -> Mat4 {
        self.light_view_proj[(cascade as usize).min(MAX_CASCADES - 1)]
    }

    /// Shadow map texel size in UV units.
    #[inline]
    pub fn texel_size(&self) -> f32 {
        self.texel_size
    }

    /// Depth comparison bias.
    #[inline]
    pub fn bias(&self) -> f32 {
        self.bias
    }

    /// Cascade covering `view_depth`.
    #[inline]
    pub fn select(&self, view_depth: f32) -> u8 {
        select_cascade(view_depth, &self.cascade_splits, self.active_cascade_count)
    }

    /// Pack for upload to a shader.
    pub fn to_uniform(&self) -> ShadowUniform {
        ShadowUniform {
            light_view_proj: self.light_view_proj.map(|m| m.to_cols_array()),
            cascade_splits: self.cascade_splits,
            cascade_count: self.active_cascade_count as u32,
            texel_size: self.texel_size,
            bias: self.bias,
            _pad: 0.0,
        }
    }
}

/// Map a view depth to a cascade index.
///
/// Returns the index of the first of the `count` leading splits that is
/// strictly greater than `view_depth`, or the last cascade when the depth lies
/// beyond every split. Callers skip shadowing entirely when `count == 0`; in
/// that case 0 is returned.
pub fn select_cascade(view_depth: f32, splits: &[f32], count: u8) -> u8 {
    let active = &splits[..(count as usize).min(splits.len())];
    if active.is_empty() {
        return 0;
    }
    active
        .iter()
        .position(|&split| split > view_depth)
        .unwrap_or(active.len() - 1) as u8
}

/// GPU-side shadow uniform data (bound in the terrain fragment shader).
///
/// Total size: 4×64 + 16 + 16 = 288 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ShadowUniform {
    /// Light-space view-projection matrix per cascade (column-major).
    pub light_view_proj: [[f32; 16]; 4],
    /// Far view depth per cascade.
    pub cascade_splits: [f32; 4],
    /// Number of active cascades.
    pub cascade_count: u32,
    /// Texel size in UV units.
    pub texel_size: f32,
    /// Depth comparison bias.
    pub bias: f32,
    /// Padding to 16 bytes.
    pub _pad: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPLITS: [f32; 4] = [10.0, 30.0, 60.0, 100.0];

    fn four_cascades() -> ShadowCascadeSet {
        ShadowCascadeSet::new(&[Mat4::IDENTITY; 4], &SPLITS, 1.0 / 2048.0, 0.003).unwrap()
    }

    #[test]
    fn test_select_cascade_scenario() {
        assert_eq!(select_cascade(45.0, &SPLITS, 4), 2);
    }

    #[test]
    fn test_select_cascade_boundaries() {
        assert_eq!(select_cascade(0.0, &SPLITS, 4), 0);
        assert_eq!(select_cascade(9.99, &SPLITS, 4), 0);
        // A split equal to the depth is not strictly greater.
        assert_eq!(select_cascade(10.0, &SPLITS, 4), 1);
        assert_eq!(select_cascade(99.0, &SPLITS, 4), 3);
    }

    #[test]
    fn test_select_cascade_beyond_last_split_returns_last() {
        assert_eq!(select_cascade(100.0, &SPLITS, 4), 3);
        assert_eq!(select_cascade(1.0e6, &SPLITS, 4), 3);
        assert_eq!(select_cascade(1.0e6, &SPLITS, 2), 1);
    }

    #[test]
    fn test_select_cascade_respects_count() {
        // Only the first two splits are considered.
        assert_eq!(select_cascade(45.0, &SPLITS, 2), 1);
        assert_eq!(select_cascade(45.0, &SPLITS, 0), 0);
    }

    #[test]
    fn test_select_cascade_is_monotonic() {
        let mut previous = 0;
        let mut depth = 0.0;
        while depth < 150.0 {
            let cascade = select_cascade(depth, &SPLITS, 4);
            assert!(
                cascade >= previous,
                "cascade decreased from {previous} to {cascade} at depth {depth}"
            );
            previous = cascade;
            depth += 0.25;
        }
        assert_eq!(previous, 3);
    }

    #[test]
    fn test_rejects_non_increasing_splits() {
        let result = ShadowCascadeSet::new(&[Mat4::IDENTITY; 3], &[10.0, 10.0, 20.0], 0.001, 0.0);
        assert_eq!(
            result,
            Err(ShadowConfigError::SplitsNotIncreasing {
                index: 1,
                value: 10.0
            })
        );
    }

    #[test]
    fn test_rejects_too_many_cascades() {
        let result = ShadowCascadeSet::new(&[Mat4::IDENTITY; 5], &[1.0, 2.0, 3.0, 4.0, 5.0], 0.001, 0.0);
        assert!(matches!(
            result,
            Err(ShadowConfigError::TooManyCascades { count: 5, max: 4 })
        ));
    }

    #[test]
    fn test_rejects_mismatched_lengths_and_bad_values() {
        assert!(matches!(
            ShadowCascadeSet::new(&[Mat4::IDENTITY; 1], &[1.0, 2.0], 0.001, 0.0),
            Err(ShadowConfigError::LengthMismatch { .. })
        ));
        assert!(matches!(
            ShadowCascadeSet::new(&[Mat4::IDENTITY; 1], &[f32::NAN], 0.001, 0.0),
            Err(ShadowConfigError::InvalidSplit { index: 0, .. })
        ));
        assert!(matches!(
            ShadowCascadeSet::new(&[Mat4::IDENTITY; 1], &[1.0], 0.0, 0.0),
            Err(ShadowConfigError::InvalidTexelSize(_))
        ));
        assert!(matches!(
            ShadowCascadeSet::new(&[Mat4::IDENTITY; 1], &[1.0], 0.001, -0.1),
            Err(ShadowConfigError::InvalidBias(_))
        ));
    }

    #[test]
    fn test_clamp_to_layers() {
        let set = four_cascades().clamp_to_layers(2);
        assert_eq!(set.active_cascade_count(), 2);
        assert_eq!(set.splits(), &[10.0, 30.0]);
        assert_eq!(set.last_split(), Some(30.0));

        let untouched = four_cascades().clamp_to_layers(8);
        assert_eq!(untouched.active_cascade_count(), 4);
    }

    #[test]
    fn test_disabled_set_has_no_splits() {
        let set = ShadowCascadeSet::disabled();
        assert_eq!(set.active_cascade_count(), 0);
        assert!(set.splits().is_empty());
        assert_eq!(set.last_split(), None);
    }

    #[test]
    fn test_shadow_uniform_size() {
        assert_eq!(std::mem::size_of::<ShadowUniform>(), 288);
    }

    #[test]
    fn test_to_uniform_packs_splits_and_count() {
        let uniform = four_cascades().to_uniform();
        assert_eq!(uniform.cascade_count, 4);
        assert_eq!(uniform.cascade_splits, SPLITS);
        assert!((uniform.bias - 0.003).abs() < 1e-9);
        assert_eq!(uniform.light_view_proj[0], Mat4::IDENTITY.to_cols_array());
    }
}
