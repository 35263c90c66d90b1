//! The rasterized surface sample handed to shading, and face projection.

use glam::{Vec2, Vec3};

use crate::material::MaterialClass;

/// One fragment of voxel terrain after rasterization.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfacePoint {
    pub world_position: Vec3,
    /// Unit, axis-aligned for voxel faces.
    pub normal: Vec3,
    /// Linear RGB per-vertex color.
    pub base_color: Vec3,
    pub block_id: u16,
    /// Explicit class from the asset pipeline; `None` falls back to
    /// [`MaterialClass::classify`].
    pub material: Option<MaterialClass>,
}

impl SurfacePoint {
    pub fn new(world_position: Vec3, normal: Vec3, base_color: Vec3, block_id: u16) -> Self {
        Self {
            world_position,
            normal,
            base_color,
            block_id,
            material: None,
        }
    }

    pub fn with_material(mut self, class: MaterialClass) -> Self {
        self.material = Some(class);
        self
    }

    /// Upward-facing, including slightly tilted normals.
    #[inline]
    pub fn is_top_face(&self) -> bool {
        self.normal.y > 0.5
    }

    /// Position inside the block that owns this face.
    ///
    /// Face positions sit on block boundaries, so step half a block against
    /// the normal before flooring.
    #[inline]
    pub fn block_position(&self) -> Vec3 {
        (self.world_position - self.normal * 0.5).floor()
    }
}

/// World plane a face projects onto for its texture coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaceAxis {
    /// Top and bottom faces; UV from world XZ.
    Y,
    /// ±X faces; UV from world ZY.
    X,
    /// ±Z faces; UV from world XY.
    Z,
}

impl FaceAxis {
    pub fn from_normal(normal: Vec3) -> Self {
        if normal.y.abs() > 0.5 {
            Self::Y
        } else if normal.x.abs() > 0.5 {
            Self::X
        } else {
            Self::Z
        }
    }
}

/// Per-face texture coordinate in `[0, 1)`, repeating once per block.
///
/// `fract` keeps negative coordinates tiling the same way as positive ones.
pub fn face_uv(world_position: Vec3, normal: Vec3) -> Vec2 {
    let p = world_position;
    let plane = match FaceAxis::from_normal(normal) {
        FaceAxis::Y => Vec2::new(p.x, p.z),
        FaceAxis::X => Vec2::new(p.z, p.y),
        FaceAxis::Z => Vec2::new(p.x, p.y),
    };
    plane - plane.floor()
}

/// Hermite smoothstep, 0 at `edge0` and 1 at `edge1`.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
