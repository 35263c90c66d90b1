//! Primary visibility and image output.
//!
//! Casts one camera ray per pixel to find the visible face, shades all hits
//! in one dispatch and writes an sRGB PNG.

use std::path::Path;

use glam::{Mat4, Vec2, Vec3, Vec4};
use image::{Rgb, RgbImage};
use rayon::prelude::*;
use voxshade_materials::SurfacePoint;
use voxshade_shading::{Camera, FragmentDispatcher, FrameInputs};

use crate::error::DemoError;
use crate::scene::VoxelScene;

/// Visible surfaces of one frame, with the pixel each came from.
pub struct VisibilityBuffer {
    pub width: u32,
    pub height: u32,
    pub points: Vec<SurfacePoint>,
    pub pixels: Vec<u32>,
}

impl VisibilityBuffer {
    pub fn coverage(&self) -> f32 {
        let pixels = u64::from(self.width) * u64::from(self.height);
        self.points.len() as f32 / pixels.max(1) as f32
    }
}

/// World-space ray through the centre of pixel `(x, y)`.
fn pixel_ray(inverse_view_proj: Mat4, x: u32, y: u32, width: u32, height: u32) -> (Vec3, Vec3) {
    let ndc = Vec2::new(
        (x as f32 + 0.5) / width as f32 * 2.0 - 1.0,
        1.0 - (y as f32 + 0.5) / height as f32 * 2.0,
    );
    let near = inverse_view_proj.project_point3(ndc.extend(0.0));
    let far = inverse_view_proj.project_point3(ndc.extend(1.0));
    (near, far - near)
}

/// Find the visible face under every pixel.
pub fn trace_visibility(
    scene: &VoxelScene,
    camera: &Camera,
    width: u32,
    height: u32,
) -> Result<VisibilityBuffer, DemoError> {
    if width == 0 || height == 0 {
        return Err(DemoError::EmptyImage { width, height });
    }
    let pixel_count = width
        .checked_mul(height)
        .ok_or(DemoError::ImageTooLarge { width, height })?;
    let inverse = camera.view_projection_matrix().inverse();
    let hits: Vec<(u32, SurfacePoint)> = (0..pixel_count)
        .into_par_iter()
        .filter_map(|pixel| {
            let (origin, dir) = pixel_ray(inverse, pixel % width, pixel / width, width, height);
            scene
                .raycast(origin, dir, camera.far)
                .map(|hit| (pixel, hit.surface_point()))
        })
        .collect();
    let (pixels, points) = hits.into_iter().unzip();
    Ok(VisibilityBuffer {
        width,
        height,
        points,
        pixels,
    })
}

/// Linear to display encoding.
#[inline]
fn encode(linear: f32) -> u8 {
    (linear.clamp(0.0, 1.0).powf(1.0 / 2.2) * 255.0).round() as u8
}

fn to_rgb(color: Vec4) -> Rgb<u8> {
    Rgb([encode(color.x), encode(color.y), encode(color.z)])
}

/// Shade the visible surfaces and compose the image. Pixels without a hit
/// show the fog color.
pub fn shade_image(
    visibility: &VisibilityBuffer,
    frame: &FrameInputs,
    dispatcher: &FragmentDispatcher,
) -> RgbImage {
    let colors = dispatcher.shade(frame, &visibility.points);
    let sky = to_rgb(frame.compositor.fog.color.extend(1.0));
    let mut image = RgbImage::from_pixel(visibility.width, visibility.height, sky);
    for (&pixel, color) in visibility.pixels.iter().zip(colors) {
        image.put_pixel(pixel % visibility.width, pixel / visibility.width, to_rgb(color));
    }
    image
}

pub fn save_png(image: &RgbImage, path: &Path) -> Result<(), DemoError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(image::ImageError::IoError)?;
    }
    image.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}
