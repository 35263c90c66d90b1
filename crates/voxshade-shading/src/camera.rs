//! Camera state consumed by shading.

use glam::{Mat4, Vec3};
use voxshade_lighting::CameraFrustum;

/// Per-frame camera values every fragment reads.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraContext {
    pub position: Vec3,
    pub view_projection: Mat4,
}

impl CameraContext {
    pub fn new(position: Vec3, view_projection: Mat4) -> Self {
        Self {
            position,
            view_projection,
        }
    }

    /// Clip-space `w` of `world`: its distance along the view axis for a
    /// perspective projection. Cascades are selected by this depth.
    #[inline]
    pub fn view_depth(&self, world: Vec3) -> f32 {
        (self.view_projection * world.extend(1.0)).w
    }

    /// Distance from the camera to `world` in the XZ plane.
    #[inline]
    pub fn horizontal_distance(&self, world: Vec3) -> f32 {
        let d = world - self.position;
        (d.x * d.x + d.z * d.z).sqrt()
    }
}

/// A look-at perspective camera, standing in for the engine camera.
#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width / height.
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// World-to-view matrix (right-handed, looking down -Z).
    pub fn view_matrix(&self) -> Mat4 {
        let forward = self.forward();
        let up = if forward.y.abs() > 0.999 { Vec3::Z } else { Vec3::Y };
        Mat4::look_at_rh(self.position, self.target, up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect_ratio, self.near, self.far)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or(Vec3::NEG_Z)
    }

    /// Update the aspect ratio after a resize.
    pub fn set_aspect_ratio(&mut self, width: f32, height: f32) {
        self.aspect_ratio = width / height;
    }

    pub fn context(&self) -> CameraContext {
        CameraContext::new(self.position, self.view_projection_matrix())
    }

    /// Frustum description used to fit shadow cascades.
    pub fn frustum(&self) -> CameraFrustum {
        CameraFrustum {
            view: self.view_matrix(),
            fov_y: self.fov_y,
            aspect: self.aspect_ratio,
            near: self.near,
        }
    }
}
