//! Synthetic voxel terrain and ray casting against it.
//!
//! Stands in for the engine's chunk storage and rasterizer: the demo finds
//! visible surfaces by casting one ray per pixel through the block grid.

use glam::{IVec2, IVec3, Vec2, Vec3};
use voxshade_materials::{MaterialClass, SurfacePoint, noise};

pub const AIR: u16 = u16::MAX;

pub const GRASS: u16 = 0;
pub const DIRT: u16 = 1;
pub const STONE: u16 = 2;
pub const SNOW: u16 = 3;
pub const SAND: u16 = 4;

/// Custom blocks drawn from the atlas, and the tile each one gets.
pub const BRICK_TOWER: u16 = 120;
pub const CHECKER_CRATE: u16 = 130;
pub const MOSSY_PILLAR: u16 = 140;
pub const GLOW_COLUMN: u16 = 150;
pub const PAINTED_WALL: u16 = 160;
/// Deliberately left without a tile.
pub const UNTEXTURED: u16 = 199;

const TERRAIN_SEED: u32 = 0x00c0_ffee;

/// Per-vertex color and material tag of a block.
pub fn block_appearance(id: u16) -> (Vec3, Option<MaterialClass>) {
    match id {
        GRASS => (Vec3::new(0.3, 0.65, 0.2), Some(MaterialClass::Grass)),
        DIRT => (Vec3::new(0.45, 0.32, 0.2), None),
        // Untagged on purpose: classified from color.
        STONE => (Vec3::new(0.52, 0.5, 0.48), None),
        SNOW => (Vec3::new(0.92, 0.94, 0.96), Some(MaterialClass::Generic)),
        SAND => (Vec3::new(0.82, 0.76, 0.52), None),
        _ => (Vec3::ONE, None),
    }
}

/// A face hit by a ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// Ray parameter at the hit.
    pub distance: f32,
    pub position: Vec3,
    /// Outward normal of the face that was entered.
    pub normal: Vec3,
    pub cell: IVec3,
    pub block_id: u16,
}

impl RayHit {
    pub fn surface_point(&self) -> SurfacePoint {
        let (color, material) = block_appearance(self.block_id);
        SurfacePoint {
            world_position: self.position,
            normal: self.normal,
            base_color: color,
            block_id: self.block_id,
            material,
        }
    }
}

/// Dense block grid over `[0, size) × [0, height) × [0, size)`.
pub struct VoxelScene {
    size: i32,
    height: i32,
    blocks: Vec<u16>,
}

impl VoxelScene {
    /// Empty scene.
    pub fn new(size: u32, height: u32) -> Self {
        let size = size.max(1) as i32;
        let height = height.max(1) as i32;
        Self {
            size,
            height,
            blocks: vec![AIR; (size * size * height) as usize],
        }
    }

    /// Rolling heightfield with layered soil, snowy peaks, a beach line and
    /// a handful of custom-textured structures.
    pub fn generate(size: u32, height: u32) -> Self {
        let mut scene = Self::new(size, height);
        let max_height = scene.height - 8;
        for z in 0..scene.size {
            for x in 0..scene.size {
                let h = scene.terrain_height(x, z, max_height);
                for y in 0..h {
                    let id = if y == h - 1 {
                        match h {
                            h if h >= max_height - 3 => SNOW,
                            h if h >= max_height - 8 => STONE,
                            h if h <= 5 => SAND,
                            _ => GRASS,
                        }
                    } else if y >= h - 3 {
                        DIRT
                    } else {
                        STONE
                    };
                    scene.set(IVec3::new(x, y, z), id);
                }
            }
        }

        let structures = [
            (IVec2::new(20, 20), 9, BRICK_TOWER),
            (IVec2::new(34, 16), 4, CHECKER_CRATE),
            (IVec2::new(44, 30), 7, MOSSY_PILLAR),
            (IVec2::new(26, 42), 11, GLOW_COLUMN),
            (IVec2::new(52, 48), 5, PAINTED_WALL),
            (IVec2::new(12, 50), 6, UNTEXTURED),
        ];
        for (xz, tall, id) in structures {
            scene.place_column(xz, tall, id);
        }
        scene
    }

    fn terrain_height(&self, x: i32, z: i32, max_height: i32) -> i32 {
        let p = Vec2::new(x as f32, z as f32);
        let broad = noise::value_noise(p / 24.0, IVec2::ZERO, TERRAIN_SEED);
        let detail = noise::value_noise(p / 7.0, IVec2::ZERO, TERRAIN_SEED ^ 0x55);
        let n = broad * 0.8 + detail * 0.2;
        (3.0 + n * (max_height - 3) as f32).round().clamp(1.0, max_height as f32) as i32
    }

    /// Stack a 2×2 column of `id` on top of the terrain.
    fn place_column(&mut self, xz: IVec2, tall: i32, id: u16) {
        for dz in 0..2 {
            for dx in 0..2 {
                let (x, z) = (xz.x + dx, xz.y + dz);
                let Some(ground) = self.surface_height(x, z) else {
                    continue;
                };
                for y in ground..(ground + tall).min(self.height) {
                    self.set(IVec3::new(x, y, z), id);
                }
            }
        }
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// World-space centre of the block grid's floor.
    pub fn center(&self) -> Vec3 {
        Vec3::new(self.size as f32 * 0.5, 0.0, self.size as f32 * 0.5)
    }

    fn index(&self, cell: IVec3) -> Option<usize> {
        let inside = (0..self.size).contains(&cell.x)
            && (0..self.height).contains(&cell.y)
            && (0..self.size).contains(&cell.z);
        inside.then(|| ((cell.y * self.size + cell.z) * self.size + cell.x) as usize)
    }

    pub fn set(&mut self, cell: IVec3, id: u16) {
        if let Some(i) = self.index(cell) {
            self.blocks[i] = id;
        }
    }

    /// Block at `cell`, `None` for air and outside the grid.
    pub fn block_at(&self, cell: IVec3) -> Option<u16> {
        self.index(cell)
            .map(|i| self.blocks[i])
            .filter(|&id| id != AIR)
    }

    /// Lowest air cell above the column's top block.
    pub fn surface_height(&self, x: i32, z: i32) -> Option<i32> {
        if !(0..self.size).contains(&x) || !(0..self.size).contains(&z) {
            return None;
        }
        let top = (0..self.height)
            .rev()
            .find(|&y| self.block_at(IVec3::new(x, y, z)).is_some());
        Some(top.map_or(0, |y| y + 1))
    }

    /// First solid face along `origin + t * dir` for `t` in `[0, max_distance]`.
    ///
    /// Voxel traversal in the style of Amanatides and Woo, starting where
    /// the ray enters the grid bounds.
    pub fn raycast(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<RayHit> {
        let dir = dir.normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }
        let bounds_max = Vec3::new(self.size as f32, self.height as f32, self.size as f32);
        let (t_enter, t_exit, entry_normal) = slab_intersect(origin, dir, Vec3::ZERO, bounds_max)?;
        let t_end = t_exit.min(max_distance);
        let mut t = t_enter.max(0.0);
        if t > t_end {
            return None;
        }

        let start = origin + dir * (t + 1e-4);
        let mut cell = start.floor().as_ivec3();
        let mut normal = if t_enter > 0.0 { entry_normal } else { Vec3::ZERO };

        let step = IVec3::new(
            dir.x.signum() as i32,
            dir.y.signum() as i32,
            dir.z.signum() as i32,
        );
        let axis_t = |o: f32, d: f32, c: i32| -> (f32, f32) {
            if d > 0.0 {
                ((c as f32 + 1.0 - o) / d, 1.0 / d)
            } else if d < 0.0 {
                ((c as f32 - o) / d, -1.0 / d)
            } else {
                (f32::INFINITY, f32::INFINITY)
            }
        };
        let (tx, dx) = axis_t(origin.x, dir.x, cell.x);
        let (ty, dy) = axis_t(origin.y, dir.y, cell.y);
        let (tz, dz) = axis_t(origin.z, dir.z, cell.z);
        let mut t_max = Vec3::new(tx, ty, tz);
        let t_delta = Vec3::new(dx, dy, dz);

        loop {
            if let Some(block_id) = self.block_at(cell) {
                return Some(RayHit {
                    distance: t,
                    position: origin + dir * t,
                    normal,
                    cell,
                    block_id,
                });
            }
            if t_max.x < t_max.y && t_max.x < t_max.z {
                cell.x += step.x;
                t = t_max.x;
                t_max.x += t_delta.x;
                normal = Vec3::new(-step.x as f32, 0.0, 0.0);
            } else if t_max.y < t_max.z {
                cell.y += step.y;
                t = t_max.y;
                t_max.y += t_delta.y;
                normal = Vec3::new(0.0, -step.y as f32, 0.0);
            } else {
                cell.z += step.z;
                t = t_max.z;
                t_max.z += t_delta.z;
                normal = Vec3::new(0.0, 0.0, -step.z as f32);
            }
            if t > t_end {
                return None;
            }
        }
    }
}

/// Ray/AABB slab test. Returns entry and exit parameters and the outward
/// normal of the entry face.
fn slab_intersect(origin: Vec3, dir: Vec3, min: Vec3, max: Vec3) -> Option<(f32, f32, Vec3)> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    let mut normal = Vec3::ZERO;
    for axis in 0..3 {
        let (o, d) = (origin[axis], dir[axis]);
        if d.abs() < 1e-9 {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let mut t0 = (min[axis] - o) / d;
        let mut t1 = (max[axis] - o) / d;
        let mut face = -1.0;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
            face = 1.0;
        }
        if t0 > t_enter {
            t_enter = t0;
            normal = Vec3::ZERO;
            normal[axis] = face;
        }
        t_exit = t_exit.min(t1);
    }
    (t_enter <= t_exit && t_exit >= 0.0).then_some((t_enter, t_exit, normal))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_scene() -> VoxelScene {
        let mut scene = VoxelScene::new(8, 8);
        for z in 0..8 {
            for x in 0..8 {
                scene.set(IVec3::new(x, 0, z), STONE);
            }
        }
        scene.set(IVec3::new(4, 1, 4), BRICK_TOWER);
        scene
    }

    #[test]
    fn test_downward_ray_hits_top_face() {
        let scene = flat_scene();
        let hit = scene
            .raycast(Vec3::new(2.5, 20.0, 2.5), Vec3::NEG_Y, 100.0)
            .expect("ray should hit the floor");
        assert_eq!(hit.cell, IVec3::new(2, 0, 2));
        assert_eq!(hit.normal, Vec3::Y);
        assert!((hit.position.y - 1.0).abs() < 1e-4, "hit at {}", hit.position);
        assert_eq!(hit.block_id, STONE);
    }

    #[test]
    fn test_horizontal_ray_hits_side_face() {
        let scene = flat_scene();
        let hit = scene
            .raycast(Vec3::new(-3.0, 1.5, 4.5), Vec3::X, 100.0)
            .expect("ray should hit the tower");
        assert_eq!(hit.cell, IVec3::new(4, 1, 4));
        assert_eq!(hit.normal, Vec3::NEG_X);
        assert!((hit.position.x - 4.0).abs() < 1e-4);
        assert_eq!(hit.surface_point().block_id, BRICK_TOWER);
    }

    #[test]
    fn test_ray_entering_through_grid_side_reports_entry_normal() {
        let scene = flat_scene();
        let hit = scene
            .raycast(Vec3::new(-5.0, 0.5, 3.5), Vec3::X, 100.0)
            .unwrap();
        assert_eq!(hit.cell, IVec3::new(0, 0, 3));
        assert_eq!(hit.normal, Vec3::NEG_X);
    }

    #[test]
    fn test_ray_missing_scene() {
        let scene = flat_scene();
        assert!(scene.raycast(Vec3::new(2.5, 20.0, 2.5), Vec3::Y, 100.0).is_none());
        assert!(scene.raycast(Vec3::new(-5.0, 20.0, 2.5), Vec3::X, 100.0).is_none());
        assert!(scene.raycast(Vec3::new(2.5, 20.0, 2.5), Vec3::NEG_Y, 5.0).is_none());
    }

    #[test]
    fn test_oblique_ray_normal_is_axis_aligned() {
        let scene = flat_scene();
        let hit = scene
            .raycast(Vec3::new(0.3, 6.0, 0.2), Vec3::new(0.4, -1.0, 0.35), 100.0)
            .unwrap();
        assert_eq!(hit.normal.length(), 1.0);
        assert!(hit.normal.abs().max_element() == 1.0);
    }

    #[test]
    fn test_generated_scene_has_terrain_and_structures() {
        let scene = VoxelScene::generate(64, 32);
        let mut ids = std::collections::HashSet::new();
        for z in 0..64 {
            for x in 0..64 {
                let h = scene.surface_height(x, z).unwrap();
                assert!(h >= 1, "column ({x}, {z}) is empty");
                if let Some(id) = scene.block_at(IVec3::new(x, h - 1, z)) {
                    ids.insert(id);
                }
            }
        }
        assert!(ids.contains(&BRICK_TOWER));
        assert!(ids.contains(&UNTEXTURED));
        assert!(ids.iter().any(|&id| id < 100), "no natural blocks on top");
    }

    #[test]
    fn test_surface_point_carries_appearance() {
        let hit = RayHit {
            distance: 1.0,
            position: Vec3::new(0.5, 1.0, 0.5),
            normal: Vec3::Y,
            cell: IVec3::ZERO,
            block_id: GRASS,
        };
        let point = hit.surface_point();
        assert_eq!(point.material, Some(MaterialClass::Grass));
        assert_eq!(
            MaterialClass::classify(block_appearance(STONE).0),
            MaterialClass::Stone
        );
    }
}
