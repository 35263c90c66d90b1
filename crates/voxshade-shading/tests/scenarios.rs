//! End-to-end shading scenarios over a small synthetic frame.

use glam::{Mat4, Vec2, Vec3, Vec4};
use voxshade_lighting::{
    DirectionalLight, PcfStrategyTable, ShadowCascadeSet, ShadowMap, ShadowSampler, select_cascade,
};
use voxshade_materials::{
    AtlasBuilder, AtlasLayout, MaterialClass, ProceduralGenerator, SurfaceDetail, SurfacePoint,
    SurfaceResolver, TextureAtlas, TilePattern,
};
use voxshade_shading::{
    Camera, FogParameters, FragmentDispatcher, FrameInputs, shade_fragment, shade_sequential,
};

const RES: u32 = 128;
const BRICK: [f32; 3] = [0.6, 0.25, 0.15];

/// Orthographic sun straight overhead covering x, z in [-64, 64].
fn overhead_light_matrix() -> Mat4 {
    let view = Mat4::look_at_rh(Vec3::new(0.0, 100.0, 0.0), Vec3::ZERO, Vec3::Z);
    let proj = Mat4::orthographic_rh(-64.0, 64.0, -64.0, 64.0, 0.1, 200.0);
    proj * view
}

fn camera() -> Camera {
    Camera {
        position: Vec3::new(0.0, 12.0, 20.0),
        target: Vec3::new(0.0, 0.0, 0.0),
        fov_y: std::f32::consts::FRAC_PI_3,
        aspect_ratio: 1.0,
        near: 0.1,
        far: 500.0,
    }
}

fn atlas() -> TextureAtlas {
    let mut builder = AtlasBuilder::new(AtlasLayout::default(), 16).unwrap();
    builder
        .paint_tile(150, &TilePattern::Solid { color: BRICK })
        .unwrap();
    builder.build()
}

/// Roof at y = 8 over x < 0; ground at y = 0 everywhere.
fn shadowed_frame() -> FrameInputs {
    let matrix = overhead_light_matrix();
    let cascades = ShadowCascadeSet::new(
        &[matrix; 4],
        &[10.0, 30.0, 60.0, 100.0],
        1.0 / RES as f32,
        0.003,
    )
    .unwrap();
    let mut map = ShadowMap::new(RES, 4).unwrap();
    for layer in 0..4 {
        let mut x = -64.0;
        while x < 0.0 {
            let mut z = -64.0;
            while z < 64.0 {
                map.splat_point(layer, matrix, Vec3::new(x, 8.0, z), 1);
                z += 0.5;
            }
            x += 0.5;
        }
    }
    FrameInputs::new(
        camera().context(),
        DirectionalLight::new(Vec3::NEG_Y, Vec3::ONE, 1.0),
        cascades,
        map,
        atlas(),
    )
    .unwrap()
}

fn grid_points() -> Vec<SurfacePoint> {
    let mut points = Vec::new();
    for i in 0..40 {
        for j in 0..40 {
            let x = i as f32 * 0.77 - 15.0;
            let z = j as f32 * 0.61 - 12.0;
            let (block_id, color, normal) = match (i + j) % 5 {
                0 => (150, Vec3::ONE, Vec3::Y),
                1 => (1, Vec3::new(0.2, 0.8, 0.1), Vec3::Y),
                2 => (2, Vec3::new(0.5, 0.5, 0.5), Vec3::X),
                3 => (3, Vec3::new(0.8, 0.6, 0.3), Vec3::NEG_Z),
                _ => (4, Vec3::new(0.3, 0.7, 0.2), Vec3::Z),
            };
            points.push(SurfacePoint::new(Vec3::new(x, 0.0, z), normal, color, block_id));
        }
    }
    points
}

/// Detail source that fails the test if consulted.
struct Forbidden;

impl SurfaceDetail for Forbidden {
    fn variation(&self, _: MaterialClass, _: Vec2, _: Vec2, _: f32) -> f32 {
        panic!("procedural generator invoked for a custom block");
    }

    fn side_face_albedo(&self, _: MaterialClass, _: Vec3, _: bool, _: f32) -> Vec3 {
        panic!("procedural generator invoked for a custom block");
    }
}

#[test]
fn test_scenario_a_grass_top_face_close_up() {
    let generator = ProceduralGenerator::default();
    let base = Vec3::new(0.2, 0.8, 0.1);
    let mut seen_nonzero = false;
    for block_x in 0..16 {
        let uv = Vec2::new(0.45, 0.55);
        let world_xz = Vec2::new(block_x as f32 + 0.45, 3.55);
        let delta = generator.procedural_variation(base, uv, world_xz, 5.0);
        assert!(
            (-0.06..=0.08).contains(&delta),
            "grass delta {delta} outside [-0.06, 0.08]"
        );
        seen_nonzero |= delta != 0.0;
    }
    assert!(seen_nonzero, "grass should show some speckle up close");
}

#[test]
fn test_scenario_b_custom_block_never_runs_procedural() {
    let atlas = atlas();
    let resolver = SurfaceResolver::new(&atlas, &Forbidden);
    for normal in [Vec3::Y, Vec3::NEG_Y, Vec3::X, Vec3::NEG_X, Vec3::Z, Vec3::NEG_Z] {
        let point = SurfacePoint::new(Vec3::new(7.3, 2.5, -4.6), normal, Vec3::ONE, 150);
        let resolved = resolver.resolve_surface_color(&point, Vec3::new(0.0, 10.0, 0.0));
        assert!(resolved.uses_atlas, "face {normal} must use the atlas");
    }
}

#[test]
fn test_scenario_c_cascade_selection() {
    assert_eq!(select_cascade(45.0, &[10.0, 30.0, 60.0, 100.0], 4), 2);
}

#[test]
fn test_scenario_d_outside_light_frustum_is_lit() {
    let frame = shadowed_frame();
    // x = 89.6 projects to ndc.x = 1.4, u = 1.2.
    let point = Vec3::new(89.6, 0.0, 0.0);
    for tiered in [false, true] {
        let sampler = ShadowSampler {
            filters: if tiered {
                PcfStrategyTable::tiered()
            } else {
                PcfStrategyTable::uniform()
            },
            ..ShadowSampler::default()
        };
        for depth in [5.0, 20.0, 45.0, 80.0] {
            let factor = sampler.compute_shadow_factor(
                point,
                Vec3::Y,
                depth,
                &frame.cascades,
                &frame.shadow_map,
            );
            assert_eq!(factor, 1.0, "depth {depth} tiered {tiered}");
        }
    }
}

#[test]
fn test_shadowed_ground_is_darker_than_lit_ground() {
    let frame = shadowed_frame();
    let base = Vec3::splat(0.5);
    let shade = |x: f32| {
        let point = SurfacePoint::new(Vec3::new(x, 0.0, 0.5), Vec3::Y, base, 0)
            .with_material(MaterialClass::Generic);
        shade_fragment(&frame, &point)
    };
    let shadowed = shade(-6.5);
    let lit = shade(6.5);
    assert!(
        shadowed.x < lit.x * 0.5,
        "shadowed {shadowed} should be much darker than lit {lit}"
    );
    assert_eq!(shadowed.w, 1.0);
}

#[test]
fn test_fog_identity_and_convergence_through_pipeline() {
    let mut frame = shadowed_frame();
    frame.compositor.fog = FogParameters {
        color: Vec3::new(0.7, 0.8, 0.9),
        near_distance: 1000.0,
        far_distance: 2000.0,
    };
    // Far from the roof edge, so fully lit.
    let point = SurfacePoint::new(Vec3::new(8.5, 0.0, 3.5), Vec3::Y, Vec3::ONE, 150);
    let clear = shade_fragment(&frame, &point);
    let expected = Vec3::from(BRICK).extend(1.0);
    assert!(
        (clear - expected).abs().max_element() < 0.01,
        "unfogged atlas texel under full light: {clear}"
    );

    frame.compositor.fog.near_distance = 1.0;
    frame.compositor.fog.far_distance = 2.0;
    let fogged = shade_fragment(&frame, &point);
    assert!((fogged - Vec4::new(0.7, 0.8, 0.9, 1.0)).length() < 1e-6);
}

#[test]
fn test_parallel_dispatch_matches_sequential() {
    let frame = shadowed_frame();
    let points = grid_points();
    let sequential = shade_sequential(&frame, &points);
    for (workers, chunk) in [(1, 7), (4, 33), (3, 1024)] {
        let dispatcher = FragmentDispatcher::new(workers, chunk).unwrap();
        let parallel = dispatcher.shade(&frame, &points);
        assert_eq!(parallel.len(), sequential.len());
        for (i, (a, b)) in parallel.iter().zip(&sequential).enumerate() {
            assert_eq!(
                a.to_array().map(f32::to_bits),
                b.to_array().map(f32::to_bits),
                "fragment {i} differs with {workers} workers"
            );
        }
    }
}

#[test]
fn test_shade_into_checks_length() {
    let frame = shadowed_frame();
    let points = grid_points();
    let dispatcher = FragmentDispatcher::new(2, 64).unwrap();
    let mut short = vec![Vec4::ZERO; points.len() - 1];
    assert!(dispatcher.shade_into(&frame, &points, &mut short).is_err());

    let mut output = vec![Vec4::ZERO; points.len()];
    dispatcher.shade_into(&frame, &points, &mut output).unwrap();
    assert!(output.iter().all(|c| c.w == 1.0));
}

#[test]
fn test_output_is_finite_and_bounded() {
    let frame = shadowed_frame();
    for color in shade_sequential(&frame, &grid_points()) {
        for channel in color.to_array() {
            assert!(channel.is_finite() && (0.0..=1.0).contains(&channel), "{color}");
        }
    }
}
