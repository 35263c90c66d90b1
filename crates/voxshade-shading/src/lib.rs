//! Terrain fragment shading: per-frame inputs, the lighting and fog
//! compositor, and a data-parallel dispatcher over fragment buffers.
//!
//! [`shade_fragment`] is a pure function of a [`FrameInputs`] and one
//! [`SurfacePoint`]; everything stateful (shadow map, atlas) is read-only for
//! the duration of a frame.

mod camera;
mod compositor;
mod dispatch;
mod fog;
mod frame;
mod params;

pub use camera::{Camera, CameraContext};
pub use compositor::{Compositor, face_light};
pub use dispatch::{FragmentDispatcher, shade_sequential};
pub use fog::{FogParameters, FogUniform};
pub use frame::{FrameError, FrameInputs, shade_fragment};
pub use params::{FaceLight, ShadingParams, class_table_from_config};

pub use voxshade_lighting::{DirectionalLight, ShadowCascadeSet, ShadowMap, ShadowSampler};
pub use voxshade_materials::{MaterialClass, ProceduralGenerator, SurfacePoint, TextureAtlas};
