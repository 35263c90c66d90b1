//! Directional light, cascaded shadow map selection and fitting, and
//! percentage-closer shadow sampling.

mod cascade;
mod directional;
pub mod fit;
mod shadow;
mod shadow_map;

pub use cascade::{
    MAX_CASCADES, MAX_SHADOW_RESOLUTION, ShadowCascadeSet, ShadowConfigError, ShadowUniform,
    select_cascade,
};
pub use directional::{DirectionalLight, DirectionalLightUniform};
pub use fit::{CameraFrustum, CascadeConfig, FittedCascade, fit_cascade_matrix};
pub use shadow::{GRID_3X3, POISSON_DISK_16, PcfFilter, PcfStrategyTable, ShadowCoord, ShadowSampler};
pub use shadow_map::{DepthCompare, ShadowMap};
