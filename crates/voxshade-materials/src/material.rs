//! Material classes and their procedural detail parameters.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// MaterialClass
// ---------------------------------------------------------------------------

/// Coarse material category that selects a procedural detail profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialClass {
    Grass,
    Stone,
    Generic,
}

impl MaterialClass {
    /// Guess the class of an untagged surface from its base color.
    ///
    /// Bright green with little red is grass; near-grey mid tones are stone.
    pub fn classify(base_color: Vec3) -> Self {
        let (r, g) = (base_color.x, base_color.y);
        if g > 0.5 && r < 0.5 {
            Self::Grass
        } else if (r - g).abs() < 0.1 && (0.4..=0.7).contains(&r) {
            Self::Stone
        } else {
            Self::Generic
        }
    }

    /// Index into per-class tables and GPU arrays.
    pub fn index(self) -> usize {
        match self {
            Self::Grass => 0,
            Self::Stone => 1,
            Self::Generic => 2,
        }
    }
}

// ---------------------------------------------------------------------------
// MaterialError
// ---------------------------------------------------------------------------

/// Errors from validating class parameters.
#[derive(Debug, Error, PartialEq)]
pub enum MaterialError {
    #[error("edge width {0} must be in (0, 0.5]")]
    InvalidEdgeWidth(f32),

    #[error("speckle thresholds out of order: dark {dark} >= bright {bright}")]
    ThresholdsOutOfOrder { dark: f32, bright: f32 },

    #[error("{field} must be finite and non-negative, got {value}")]
    InvalidAmount { field: &'static str, value: f32 },
}

// ---------------------------------------------------------------------------
// ClassParams
// ---------------------------------------------------------------------------

/// Detail profile of one material class.
///
/// Deltas are brightness offsets added to every color channel; `dark_delta`
/// is a magnitude and is subtracted.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassParams {
    /// Fraction of the tile near each border that darkens.
    pub edge_width: f32,
    /// Darkening at a tile corner, before distance fade.
    pub edge_strength: f32,
    /// Cells hashing above this value brighten.
    pub bright_threshold: f32,
    /// Cells hashing below this value darken.
    pub dark_threshold: f32,
    pub bright_delta: f32,
    pub dark_delta: f32,
    /// Peak amplitude of the fine continuous jitter.
    pub jitter_amplitude: f32,
    /// Mixed into every hash so classes do not share speckle patterns.
    pub seed: u32,
    /// Color distant side faces blend toward, if any.
    pub side_average: Option<[f32; 3]>,
}

impl ClassParams {
    pub const GRASS: Self = Self {
        edge_width: 0.06,
        edge_strength: 0.08,
        bright_threshold: 0.85,
        dark_threshold: 0.15,
        bright_delta: 0.05,
        dark_delta: 0.04,
        jitter_amplitude: 0.02,
        seed: 0x0000_1a2b,
        side_average: Some([0.35, 0.45, 0.25]),
    };

    pub const STONE: Self = Self {
        edge_width: 0.04,
        edge_strength: 0.10,
        bright_threshold: 0.82,
        dark_threshold: 0.25,
        bright_delta: 0.05,
        dark_delta: 0.05,
        jitter_amplitude: 0.025,
        seed: 0x0000_5c3d,
        side_average: Some([0.5, 0.5, 0.5]),
    };

    pub const GENERIC: Self = Self {
        edge_width: 0.04,
        edge_strength: 0.06,
        bright_threshold: 0.85,
        dark_threshold: 0.2,
        bright_delta: 0.04,
        dark_delta: 0.04,
        jitter_amplitude: 0.015,
        seed: 0x0000_9e4f,
        side_average: None,
    };

    /// Built-in profile for `class`.
    pub const fn for_class(class: MaterialClass) -> Self {
        match class {
            MaterialClass::Grass => Self::GRASS,
            MaterialClass::Stone => Self::STONE,
            MaterialClass::Generic => Self::GENERIC,
        }
    }

    /// Largest brightening the profile can add (speckle plus jitter).
    pub fn max_brighten(&self) -> f32 {
        self.bright_delta + self.jitter_amplitude
    }

    /// Largest darkening the profile can apply away from tile borders.
    pub fn max_darken(&self) -> f32 {
        self.dark_delta + self.jitter_amplitude
    }

    /// Check ranges, returning the profile with thresholds clamped to `[0, 1]`.
    pub fn validated(mut self) -> Result<Self, MaterialError> {
        if self.edge_width.is_nan() || self.edge_width <= 0.0 || self.edge_width > 0.5 {
            return Err(MaterialError::InvalidEdgeWidth(self.edge_width));
        }
        for (field, value) in [
            ("edge_strength", self.edge_strength),
            ("bright_delta", self.bright_delta),
            ("dark_delta", self.dark_delta),
            ("jitter_amplitude", self.jitter_amplitude),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(MaterialError::InvalidAmount { field, value });
            }
        }
        self.bright_threshold = self.bright_threshold.clamp(0.0, 1.0);
        self.dark_threshold = self.dark_threshold.clamp(0.0, 1.0);
        if self.dark_threshold >= self.bright_threshold {
            return Err(MaterialError::ThresholdsOutOfOrder {
                dark: self.dark_threshold,
                bright: self.bright_threshold,
            });
        }
        Ok(self)
    }
}

// ---------------------------------------------------------------------------
// ClassTable
// ---------------------------------------------------------------------------

/// Profiles for every material class.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassTable {
    pub grass: ClassParams,
    pub stone: ClassParams,
    pub generic: ClassParams,
}

impl Default for ClassTable {
    fn default() -> Self {
        Self {
            grass: ClassParams::for_class(MaterialClass::Grass),
            stone: ClassParams::for_class(MaterialClass::Stone),
            generic: ClassParams::for_class(MaterialClass::Generic),
        }
    }
}

impl ClassTable {
    #[inline]
    pub fn get(&self, class: MaterialClass) -> &ClassParams {
        match class {
            MaterialClass::Grass => &self.grass,
            MaterialClass::Stone => &self.stone,
            MaterialClass::Generic => &self.generic,
        }
    }

    /// Validate every profile.
    pub fn validated(self) -> Result<Self, MaterialError> {
        Ok(Self {
            grass: self.grass.validated()?,
            stone: self.stone.validated()?,
            generic: self.generic.validated()?,
        })
    }

    /// GPU array indexed by [`MaterialClass::index`].
    pub fn to_gpu(&self) -> [MaterialClassGpu; 3] {
        [
            MaterialClassGpu::from(&self.grass),
            MaterialClassGpu::from(&self.stone),
            MaterialClassGpu::from(&self.generic),
        ]
    }
}

// ---------------------------------------------------------------------------
// MaterialClassGpu
// ---------------------------------------------------------------------------

/// GPU-side class profile, 48 bytes, std140/std430 compatible.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct MaterialClassGpu {
    /// x = edge width, y = edge strength, z = bright threshold, w = dark threshold.
    pub edge_thresholds: [f32; 4],
    /// x = bright delta, y = dark delta, z = jitter amplitude, w = has side average.
    pub deltas: [f32; 4],
    /// xyz = side average color, w = seed bits.
    pub side_average_seed: [f32; 4],
}

impl From<&ClassParams> for MaterialClassGpu {
    fn from(p: &ClassParams) -> Self {
        let average = p.side_average.unwrap_or([0.0; 3]);
        Self {
            edge_thresholds: [
                p.edge_width,
                p.edge_strength,
                p.bright_threshold,
                p.dark_threshold,
            ],
            deltas: [
                p.bright_delta,
                p.dark_delta,
                p.jitter_amplitude,
                if p.side_average.is_some() { 1.0 } else { 0.0 },
            ],
            side_average_seed: [average[0], average[1], average[2], f32::from_bits(p.seed)],
        }
    }
}
