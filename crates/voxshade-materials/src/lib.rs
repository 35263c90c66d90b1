//! Surface materials: material classes, face projection, the block texture
//! atlas, procedural detail noise, and the per-fragment albedo resolver.

mod atlas;
mod material;
pub mod noise;
mod procedural;
mod resolver;
mod surface;

pub use atlas::{
    AtlasBuilder, AtlasError, AtlasLayout, MAX_TILES_PER_ROW, TextureAtlas, TilePattern,
};
pub use material::{ClassParams, ClassTable, MaterialClass, MaterialClassGpu, MaterialError};
pub use procedural::{ProceduralGenerator, SurfaceDetail};
pub use resolver::{ResolvedSurface, SurfaceResolver};
pub use surface::{FaceAxis, SurfacePoint, face_uv, smoothstep};
