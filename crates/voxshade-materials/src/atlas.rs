//! Block texture atlas: a square grid of tiles indexed directly by block id.
//!
//! Block `k` occupies tile `(k % tiles_per_row, k / tiles_per_row)`. Ids at or
//! above the custom threshold are textured from the atlas; lower ids are
//! shaded procedurally and their tiles are never read.

use std::path::Path;

use glam::{IVec2, UVec2, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::noise;

// ---------------------------------------------------------------------------
// AtlasError
// ---------------------------------------------------------------------------

/// Errors returned by atlas construction and lookup.
#[derive(Debug, Error)]
pub enum AtlasError {
    /// The block id has no tile in the grid.
    #[error("block id {block_id} outside atlas grid (capacity {capacity})")]
    BlockOutOfRange { block_id: u16, capacity: u32 },

    /// Failed to load an image file.
    #[error("image load error: {0}")]
    ImageLoad(#[from] image::ImageError),

    /// Layout or image dimensions are unusable.
    #[error("invalid atlas config: {0}")]
    InvalidConfig(String),
}

/// Block ids are `u16`, so a wider grid would hold tiles no block can use.
pub const MAX_TILES_PER_ROW: u32 = 256;

// ---------------------------------------------------------------------------
// AtlasLayout
// ---------------------------------------------------------------------------

/// Grid geometry of the atlas in UV space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AtlasLayout {
    pub tiles_per_row: u32,
    /// Inset applied to local UVs so sampling never reaches a neighbor tile.
    pub padding: f32,
    /// Smallest block id textured from the atlas.
    pub custom_block_threshold: u16,
}

impl Default for AtlasLayout {
    fn default() -> Self {
        Self {
            tiles_per_row: 16,
            padding: 0.001,
            custom_block_threshold: 100,
        }
    }
}

impl AtlasLayout {
    /// Number of tiles in the grid.
    pub fn capacity(&self) -> u32 {
        self.tiles_per_row.saturating_mul(self.tiles_per_row)
    }

    pub fn validate(&self) -> Result<(), AtlasError> {
        if self.tiles_per_row == 0 {
            return Err(AtlasError::InvalidConfig(
                "tiles_per_row must be non-zero".to_string(),
            ));
        }
        if self.tiles_per_row > MAX_TILES_PER_ROW {
            return Err(AtlasError::InvalidConfig(format!(
                "tiles_per_row {} exceeds the maximum of {MAX_TILES_PER_ROW}",
                self.tiles_per_row
            )));
        }
        if !(0.0..0.5).contains(&self.padding) {
            return Err(AtlasError::InvalidConfig(format!(
                "padding {} must be in [0, 0.5)",
                self.padding
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn is_custom(&self, block_id: u16) -> bool {
        block_id >= self.custom_block_threshold
    }

    #[inline]
    pub fn in_grid(&self, block_id: u16) -> bool {
        u32::from(block_id) < self.capacity()
    }

    /// Fails for ids without a tile.
    pub fn validate_block_id(&self, block_id: u16) -> Result<(), AtlasError> {
        if self.in_grid(block_id) {
            Ok(())
        } else {
            Err(AtlasError::BlockOutOfRange {
                block_id,
                capacity: self.capacity(),
            })
        }
    }

    /// Column and row of the block's tile.
    pub fn tile_coords(&self, block_id: u16) -> Option<UVec2> {
        self.in_grid(block_id).then(|| {
            let id = u32::from(block_id);
            UVec2::new(id % self.tiles_per_row, id / self.tiles_per_row)
        })
    }

    /// Returns `(uv_min, uv_max)` of the block's tile.
    pub fn tile_uvs(&self, block_id: u16) -> Option<(Vec2, Vec2)> {
        let tile = self.tile_coords(block_id)?.as_vec2();
        let size = 1.0 / self.tiles_per_row as f32;
        Some((tile * size, (tile + Vec2::ONE) * size))
    }

    /// Map a per-face UV into the block's tile.
    ///
    /// `local_uv` is clamped to `[padding, 1 - padding]` first, so the result
    /// always lies inside the tile whatever the input.
    pub fn atlas_uv(&self, block_id: u16, local_uv: Vec2) -> Option<Vec2> {
        let tile = self.tile_coords(block_id)?.as_vec2();
        let local = local_uv.clamp(
            Vec2::splat(self.padding),
            Vec2::splat(1.0 - self.padding),
        );
        Some((tile + local) / self.tiles_per_row as f32)
    }
}

// ---------------------------------------------------------------------------
// TilePattern
// ---------------------------------------------------------------------------

/// Procedurally painted tile contents. Colors are linear RGB in `[0, 1]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TilePattern {
    /// Flat color with a darker one-pixel border.
    Solid { color: [f32; 3] },
    /// Alternating squares, `cells` per side.
    Checker { a: [f32; 3], b: [f32; 3], cells: u32 },
    /// Per-pixel brightness noise around a color.
    Noise { color: [f32; 3], amplitude: f32, seed: u32 },
    /// Vertical blend from `top` to `bottom`.
    Gradient { top: [f32; 3], bottom: [f32; 3] },
    /// Running-bond bricks separated by mortar lines.
    Bricks { brick: [f32; 3], mortar: [f32; 3] },
    /// Magenta and black checker marking an unassigned tile.
    Missing,
}

const BORDER_SHADE: f32 = 0.8;
const MISSING_MAGENTA: [f32; 3] = [1.0, 0.0, 1.0];

fn to_rgba(color: [f32; 3]) -> image::Rgba<u8> {
    let c = Vec3::from(color).clamp(Vec3::ZERO, Vec3::ONE) * 255.0;
    image::Rgba([c.x.round() as u8, c.y.round() as u8, c.z.round() as u8, 255])
}

impl TilePattern {
    /// Paint a `size × size` tile.
    pub fn render(&self, size: u32) -> image::RgbaImage {
        let s = size.max(1);
        image::RgbaImage::from_fn(s, s, |x, y| match self {
            Self::Solid { color } => {
                let border = x == 0 || y == 0 || x == s - 1 || y == s - 1;
                if border {
                    to_rgba((Vec3::from(*color) * BORDER_SHADE).into())
                } else {
                    to_rgba(*color)
                }
            }
            Self::Checker { a, b, cells } => {
                let cell = (s / (*cells).max(1)).max(1);
                if ((x / cell) + (y / cell)) % 2 == 0 {
                    to_rgba(*a)
                } else {
                    to_rgba(*b)
                }
            }
            Self::Noise {
                color,
                amplitude,
                seed,
            } => {
                let h = noise::unit_float(noise::hash4(x as i32, y as i32, 0, 0, *seed));
                let shift = (h * 2.0 - 1.0) * amplitude;
                to_rgba((Vec3::from(*color) + Vec3::splat(shift)).into())
            }
            Self::Gradient { top, bottom } => {
                let t = if s > 1 { y as f32 / (s - 1) as f32 } else { 0.0 };
                to_rgba(Vec3::from(*top).lerp(Vec3::from(*bottom), t).into())
            }
            Self::Bricks { brick, mortar } => {
                let course = (s / 4).max(1);
                let row = y / course;
                let offset = if row % 2 == 0 { 0 } else { s / 4 };
                let on_mortar = y % course == 0 || (x + offset) % (s / 2).max(1) == 0;
                to_rgba(if on_mortar { *mortar } else { *brick })
            }
            Self::Missing => {
                let half = (s / 2).max(1);
                if ((x / half) + (y / half)) % 2 == 0 {
                    to_rgba(MISSING_MAGENTA)
                } else {
                    to_rgba([0.0; 3])
                }
            }
        })
    }
}

// ---------------------------------------------------------------------------
// TextureAtlas
// ---------------------------------------------------------------------------

/// A finished atlas image with its layout.
#[derive(Clone, Debug)]
pub struct TextureAtlas {
    layout: AtlasLayout,
    image: image::RgbaImage,
}

impl TextureAtlas {
    /// Wrap an existing atlas image. It must be square and divide evenly into
    /// tiles.
    pub fn from_image(layout: AtlasLayout, image: image::RgbaImage) -> Result<Self, AtlasError> {
        layout.validate()?;
        if image.width() != image.height() {
            return Err(AtlasError::InvalidConfig(format!(
                "atlas image {}x{} is not square",
                image.width(),
                image.height()
            )));
        }
        if image.width() == 0 || !image.width().is_multiple_of(layout.tiles_per_row) {
            return Err(AtlasError::InvalidConfig(format!(
                "atlas width {} is not a multiple of {} tiles",
                image.width(),
                layout.tiles_per_row
            )));
        }
        Ok(Self { layout, image })
    }

    /// Load an atlas image from disk.
    pub fn load(layout: AtlasLayout, path: &Path) -> Result<Self, AtlasError> {
        let image = image::open(path)?.to_rgba8();
        Self::from_image(layout, image)
    }

    pub fn layout(&self) -> &AtlasLayout {
        &self.layout
    }

    pub fn image(&self) -> &image::RgbaImage {
        &self.image
    }

    /// Pixels per tile side.
    pub fn tile_pixels(&self) -> u32 {
        self.image.width() / self.layout.tiles_per_row
    }

    /// Bilinearly filtered color at `uv` over the whole image, clamp-to-edge.
    pub fn sample(&self, uv: Vec2) -> Vec4 {
        let max = IVec2::new(self.image.width() as i32, self.image.height() as i32) - IVec2::ONE;
        self.filter(uv, IVec2::ZERO, max)
    }

    /// Bilinear filter whose taps are clamped to the texel rectangle
    /// `[min, max]`.
    fn filter(&self, uv: Vec2, min: IVec2, max: IVec2) -> Vec4 {
        let size = Vec2::new(self.image.width() as f32, self.image.height() as f32);
        let texel = uv * size - Vec2::splat(0.5);
        let base = texel.floor();
        let f = texel - base;
        let origin = base.as_ivec2();
        let tap = |offset: IVec2| self.texel((origin + offset).clamp(min, max));

        let top = tap(IVec2::ZERO).lerp(tap(IVec2::X), f.x);
        let bottom = tap(IVec2::Y).lerp(tap(IVec2::ONE), f.x);
        top.lerp(bottom, f.y)
    }

    fn texel(&self, at: IVec2) -> Vec4 {
        let px = self.image.get_pixel(at.x as u32, at.y as u32);
        Vec4::new(
            f32::from(px[0]),
            f32::from(px[1]),
            f32::from(px[2]),
            f32::from(px[3]),
        ) / 255.0
    }

    /// Color of `block_id`'s tile at a per-face UV, or `None` outside the grid.
    ///
    /// Filter taps stay inside the tile, so neighbors never bleed in at the
    /// tile edges.
    pub fn sample_block(&self, block_id: u16, local_uv: Vec2) -> Option<Vec3> {
        let tile = self.layout.tile_coords(block_id)?.as_ivec2();
        let uv = self.layout.atlas_uv(block_id, local_uv)?;
        let pixels = self.tile_pixels() as i32;
        let min = tile * pixels;
        let max = min + IVec2::splat(pixels - 1);
        Some(self.filter(uv, min, max).truncate())
    }
}

// ---------------------------------------------------------------------------
// AtlasBuilder
// ---------------------------------------------------------------------------

/// Assembles a [`TextureAtlas`] tile by tile.
pub struct AtlasBuilder {
    layout: AtlasLayout,
    tile_pixels: u32,
    atlas_image: image::RgbaImage,
    painted: Vec<bool>,
}

impl AtlasBuilder {
    pub fn new(layout: AtlasLayout, tile_pixels: u32) -> Result<Self, AtlasError> {
        layout.validate()?;
        if tile_pixels == 0 {
            return Err(AtlasError::InvalidConfig(
                "tile_pixels must be non-zero".to_string(),
            ));
        }
        let size = layout
            .tiles_per_row
            .checked_mul(tile_pixels)
            .ok_or_else(|| {
                AtlasError::InvalidConfig(format!(
                    "{} tiles of {tile_pixels} pixels overflow the atlas size",
                    layout.tiles_per_row
                ))
            })?;
        Ok(Self {
            atlas_image: image::RgbaImage::new(size, size),
            painted: vec![false; layout.capacity() as usize],
            layout,
            tile_pixels,
        })
    }

    /// Place an image in `block_id`'s tile, resizing it if needed.
    pub fn set_tile_image(
        &mut self,
        block_id: u16,
        img: &image::RgbaImage,
    ) -> Result<(), AtlasError> {
        let tile = self
            .layout
            .tile_coords(block_id)
            .ok_or(AtlasError::BlockOutOfRange {
                block_id,
                capacity: self.layout.capacity(),
            })?;

        let size = self.tile_pixels;
        let resized;
        let tile_img = if img.width() != size || img.height() != size {
            resized =
                image::imageops::resize(img, size, size, image::imageops::FilterType::Lanczos3);
            &resized
        } else {
            img
        };

        let origin = tile * size;
        image::imageops::replace(
            &mut self.atlas_image,
            tile_img,
            i64::from(origin.x),
            i64::from(origin.y),
        );
        self.painted[usize::from(block_id)] = true;
        Ok(())
    }

    /// Load an image file into `block_id`'s tile.
    pub fn load_tile(&mut self, block_id: u16, path: &Path) -> Result<(), AtlasError> {
        let img = image::open(path)?.to_rgba8();
        self.set_tile_image(block_id, &img)
    }

    /// Paint `block_id`'s tile procedurally.
    pub fn paint_tile(&mut self, block_id: u16, pattern: &TilePattern) -> Result<(), AtlasError> {
        let img = pattern.render(self.tile_pixels);
        self.set_tile_image(block_id, &img)
    }

    /// Tiles assigned so far.
    pub fn painted_count(&self) -> usize {
        self.painted.iter().filter(|&&p| p).count()
    }

    /// Finish the atlas. Custom tiles that were never assigned are painted
    /// with [`TilePattern::Missing`].
    pub fn build(mut self) -> TextureAtlas {
        let missing = TilePattern::Missing.render(self.tile_pixels);
        let first_custom = usize::from(self.layout.custom_block_threshold);
        for id in first_custom..self.painted.len() {
            if !self.painted[id] {
                let tile = UVec2::new(
                    id as u32 % self.layout.tiles_per_row,
                    id as u32 / self.layout.tiles_per_row,
                ) * self.tile_pixels;
                image::imageops::replace(
                    &mut self.atlas_image,
                    &missing,
                    i64::from(tile.x),
                    i64::from(tile.y),
                );
            }
        }
        TextureAtlas {
            layout: self.layout,
            image: self.atlas_image,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
