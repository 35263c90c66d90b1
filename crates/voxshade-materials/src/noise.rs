//! Integer hashing and value noise for procedural detail.
//!
//! Everything here is a pure function of its inputs so the same world
//! position always shades the same way, on any thread and in any frame.

use glam::{IVec2, Vec2};

const PRIME_A: u32 = 374_761_393;
const PRIME_B: u32 = 668_265_263;
const PRIME_C: u32 = 2_246_822_519;
const PRIME_D: u32 = 3_266_489_917;

/// Hash four lattice coordinates and a seed to 32 well-mixed bits.
pub fn hash4(a: i32, b: i32, c: i32, d: i32, seed: u32) -> u32 {
    let mut h = seed
        .wrapping_add((a as u32).wrapping_mul(PRIME_A))
        .wrapping_add((b as u32).wrapping_mul(PRIME_B))
        .wrapping_add((c as u32).wrapping_mul(PRIME_C))
        .wrapping_add((d as u32).wrapping_mul(PRIME_D));
    h = (h ^ (h >> 13)).wrapping_mul(1_274_126_177);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^ (h >> 16)
}

/// Map hash bits to `[0, 1)`.
#[inline]
pub fn unit_float(hash: u32) -> f32 {
    (hash >> 8) as f32 / (1u32 << 24) as f32
}

/// Hash of a cell within a block, in `[0, 1)`.
#[inline]
pub fn cell_hash(cell: IVec2, block: IVec2, seed: u32) -> f32 {
    unit_float(hash4(cell.x, cell.y, block.x, block.y, seed))
}

/// Smoothly interpolated lattice noise in `[0, 1]`.
///
/// `block` and `seed` select an independent lattice per block and class.
pub fn value_noise(p: Vec2, block: IVec2, seed: u32) -> f32 {
    let i = p.floor();
    let f = p - i;
    let cell = i.as_ivec2();
    let w = f * f * (Vec2::splat(3.0) - 2.0 * f);

    let n00 = cell_hash(cell, block, seed);
    let n10 = cell_hash(cell + IVec2::X, block, seed);
    let n01 = cell_hash(cell + IVec2::Y, block, seed);
    let n11 = cell_hash(cell + IVec2::ONE, block, seed);

    let bottom = n00 + (n10 - n00) * w.x;
    let top = n01 + (n11 - n01) * w.x;
    bottom + (top - bottom) * w.y
}
