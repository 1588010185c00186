//! Variant Key & Shader Variant Cache Tests
//!
//! Tests for:
//! - Surface option encoding: distinct keys, decode, define emission
//! - Default programs compiled once per key
//! - Node-graph programs compiled once per (owner, context, key)
//! - Compile failures memoized by the compiler, not retried
//! - World probe and volumetric programs: keys, stages and defines

mod common;

use proptest::prelude::*;

use myth_materials::errors::ShadingError;
use myth_materials::renderer::backend::{GraphOwner, NodeGraphId};
use myth_materials::renderer::materials::{
    ProgramRequest, VolumeOptions, request_program, world_probe, world_volume,
};
use myth_materials::renderer::pipeline::{
    AlphaVariant, GeometryKind, NodeGraphTarget, ShaderDefines, SurfaceOptions, SurfaceVariant,
    VariantKey, VolumeVariant, WorldVariant,
};
use myth_materials::resources::{Material, MaterialSet, World};

use common::{MockBackend, MockCompiler, registry};

fn alpha(index: u8) -> AlphaVariant {
    match index % 5 {
        0 => AlphaVariant::Opaque,
        1 => AlphaVariant::Clip,
        2 => AlphaVariant::Hashed,
        3 => AlphaVariant::Blend,
        _ => AlphaVariant::Multiply,
    }
}

prop_compose! {
    fn surface_options()(
        hair in any::<bool>(),
        probe_capture in any::<bool>(),
        ambient_occlusion in any::<bool>(),
        bent_normals in any::<bool>(),
        flat_normals in any::<bool>(),
        alpha_index in 0u8..5,
        shadow in any::<bool>(),
    ) -> SurfaceOptions {
        SurfaceOptions {
            geometry: if hair { GeometryKind::Hair } else { GeometryKind::Mesh },
            probe_capture,
            ambient_occlusion,
            bent_normals,
            flat_normals,
            alpha: alpha(alpha_index),
            shadow,
        }
    }
}

// ============================================================================
// Key Encoding
// ============================================================================

proptest! {
    #[test]
    fn distinct_options_give_distinct_keys(a in surface_options(), b in surface_options()) {
        let ka = VariantKey::from(a.variant());
        let kb = VariantKey::from(b.variant());
        prop_assert_eq!(a == b, ka == kb);
    }

    #[test]
    fn key_decodes_to_its_options(options in surface_options()) {
        prop_assert_eq!(options.variant().options(), Some(options));
    }

    #[test]
    fn emitted_defines_reproduce_the_flags(options in surface_options()) {
        let variant = options.variant();
        let source = variant.defines().to_source();
        let parsed = ShaderDefines::parse(&source);
        prop_assert_eq!(SurfaceVariant::from_defines(&parsed), variant);
    }
}

#[test]
fn only_cumulative_switches_have_default_slots() {
    let opaque = SurfaceOptions {
        ambient_occlusion: true,
        bent_normals: true,
        flat_normals: true,
        ..Default::default()
    };
    assert!(opaque.variant().default_slot().is_some());

    for alpha in [AlphaVariant::Clip, AlphaVariant::Hashed, AlphaVariant::Multiply] {
        let options = SurfaceOptions {
            alpha,
            ..Default::default()
        };
        assert!(options.variant().default_slot().is_none(), "{alpha:?}");
    }
}

// ============================================================================
// Default Programs
// ============================================================================

#[test]
fn default_variant_compiles_once() {
    let mut backend = MockBackend::default();
    let mut registry = registry();
    registry.init(&mut backend).unwrap();

    let variant = SurfaceVariant::MESH | SurfaceVariant::AO;
    let first = registry.default_surface(&mut backend, variant).unwrap();
    for _ in 0..8 {
        assert_eq!(registry.default_surface(&mut backend, variant).unwrap(), first);
    }

    assert_eq!(backend.default_lit_compiles(), 1);
    assert_eq!(registry.shaders().default_program(variant), Some(first));
    assert_eq!(registry.shaders().default_count(), 1);
}

#[test]
fn default_program_carries_prelude_and_variant_defines() {
    let mut backend = MockBackend::default();
    let mut registry = registry();
    registry.init(&mut backend).unwrap();

    let variant = SurfaceVariant::MESH | SurfaceVariant::FLAT;
    registry.default_surface(&mut backend, variant).unwrap();

    let shader = backend
        .shaders
        .iter()
        .find(|s| s.label.starts_with("Default Lit"))
        .unwrap();
    let defines = ShaderDefines::parse(&shader.defines);
    assert!(defines.contains("MAX_PROBE"));
    assert!(defines.contains("MESH_SHADER"));
    assert!(defines.contains("USE_FLAT_NORMAL"));
    assert!(!defines.contains("USE_AO"));
}

#[test]
fn node_only_variant_has_no_default_program() {
    let mut backend = MockBackend::default();
    let mut registry = registry();
    registry.init(&mut backend).unwrap();

    let err = registry
        .default_surface(&mut backend, SurfaceVariant::MESH | SurfaceVariant::CLIP)
        .unwrap_err();
    assert!(matches!(err, ShadingError::VariantOutOfRange { .. }));
    assert_eq!(backend.default_lit_compiles(), 0);
}

#[test]
fn default_program_requires_bootstrap() {
    let mut backend = MockBackend::default();
    let mut registry = registry();

    let err = registry
        .default_surface(&mut backend, SurfaceVariant::MESH)
        .unwrap_err();
    assert!(matches!(err, ShadingError::NotInitialized));
}

// ============================================================================
// Node-Graph Programs
// ============================================================================

fn material_target(graph: NodeGraphId) -> (MaterialSet, NodeGraphTarget) {
    let mut materials = MaterialSet::new();
    let key = materials.insert(Material::with_nodes("Graph", graph));
    let target = NodeGraphTarget {
        owner: GraphOwner::Material(key),
        graph,
        context: Default::default(),
    };
    (materials, target)
}

#[test]
fn node_variant_compiles_once() {
    let registry = registry();
    let mut compiler = MockCompiler::default();
    let (_materials, target) = material_target(NodeGraphId(1));
    let request = ProgramRequest::Mesh {
        ao: true,
        bent_normals: false,
        blend: false,
        multiply: false,
    };

    let first = request_program(&registry, &mut compiler, target, request).unwrap();
    for _ in 0..5 {
        let again = request_program(&registry, &mut compiler, target, request).unwrap();
        assert_eq!(again, first);
    }
    assert_eq!(compiler.compiles.len(), 1);

    let record = &compiler.compiles[0];
    let defines = ShaderDefines::parse(&record.defines);
    assert!(defines.contains("USE_AO"));
    assert!(!record.has_geometry_stage);
}

#[test]
fn each_variant_of_a_graph_compiles_separately() {
    let registry = registry();
    let mut compiler = MockCompiler::default();
    let (_materials, target) = material_target(NodeGraphId(1));

    let requests = [
        ProgramRequest::Mesh {
            ao: false,
            bent_normals: false,
            blend: false,
            multiply: false,
        },
        ProgramRequest::MeshDepth {
            hashed: false,
            shadow: false,
        },
        ProgramRequest::MeshDepth {
            hashed: true,
            shadow: true,
        },
    ];
    for request in requests {
        request_program(&registry, &mut compiler, target, request).unwrap();
        request_program(&registry, &mut compiler, target, request).unwrap();
    }

    assert_eq!(compiler.compiles.len(), 3);
    assert!(compiler.compiles[2].has_geometry_stage);
}

#[test]
fn failed_compile_is_reported_and_not_retried() {
    let registry = registry();
    let mut compiler = MockCompiler::failing([NodeGraphId(7)]);
    let (_materials, target) = material_target(NodeGraphId(7));
    let request = ProgramRequest::Hair {
        ao: false,
        bent_normals: false,
    };

    let failure = request_program(&registry, &mut compiler, target, request).unwrap_err();
    assert_eq!(failure.owner, target.owner);
    assert_eq!(failure.key, request.key());

    assert!(request_program(&registry, &mut compiler, target, request).is_err());
    assert_eq!(compiler.compiles.len(), 1);

    // A graph edit invalidates the memoized outcome.
    compiler.failing.clear();
    compiler.invalidate();
    assert!(request_program(&registry, &mut compiler, target, request).is_ok());
    assert_eq!(compiler.compiles.len(), 2);
}

// ============================================================================
// World Programs
// ============================================================================

fn world_target(graph: NodeGraphId) -> NodeGraphTarget {
    NodeGraphTarget {
        owner: GraphOwner::World,
        graph,
        context: Default::default(),
    }
}

#[test]
fn probe_request_uses_background_stage_and_probe_define() {
    let registry = registry();
    let mut compiler = MockCompiler::default();
    let target = world_target(NodeGraphId(3));

    let first =
        request_program(&registry, &mut compiler, target, ProgramRequest::WorldProbe).unwrap();
    let again =
        request_program(&registry, &mut compiler, target, ProgramRequest::WorldProbe).unwrap();
    assert_eq!(again, first);
    assert_eq!(compiler.compiles.len(), 1);

    let record = &compiler.compiles[0];
    assert_eq!(record.key, VariantKey(1));
    assert_eq!(record.key, VariantKey::from(WorldVariant::ProbeCapture));
    assert_eq!(record.vertex, "// background_vert\n");
    assert_eq!(record.fragment, registry.libraries().surface);
    assert!(!record.has_geometry_stage);

    let defines = ShaderDefines::parse(&record.defines);
    assert!(defines.contains("PROBE_CAPTURE"));
    assert!(!defines.contains("WORLD_BACKGROUND"));
}

#[test]
fn volume_request_packs_switches_above_the_world_kinds() {
    let registry = registry();
    let mut compiler = MockCompiler::default();
    let target = world_target(NodeGraphId(3));
    let options = VolumeOptions {
        lights: true,
        shadows: true,
        homogeneous: false,
        color_transmittance: true,
    };
    let request = ProgramRequest::WorldVolume(options);

    let first = request_program(&registry, &mut compiler, target, request).unwrap();
    let again = request_program(&registry, &mut compiler, target, request).unwrap();
    assert_eq!(again, first);
    assert_eq!(compiler.compiles.len(), 1);

    let bits = (VolumeVariant::LIGHTING | VolumeVariant::SHADOW | VolumeVariant::COLOR_TRANSMITTANCE)
        .bits();
    let record = &compiler.compiles[0];
    assert_eq!(record.key, VariantKey(2 | (bits << 2)));
    assert_eq!(record.vertex, "// background_vert\n");
    assert_eq!(record.fragment, registry.libraries().volume);
    assert!(record.fragment.ends_with("// volumetric_frag\n"));

    let defines = ShaderDefines::parse(&record.defines);
    assert!(defines.contains("VOLUMETRICS"));
    assert_eq!(VolumeVariant::from_defines(&defines), options.variant());
    assert!(!defines.contains("VOLUME_HOMOGENEOUS"));
}

#[test]
fn world_program_kinds_never_share_a_key() {
    let background = ProgramRequest::WorldBackground.key();
    let probe = ProgramRequest::WorldProbe.key();
    let empty_volume = ProgramRequest::WorldVolume(VolumeOptions::default()).key();
    let homogeneous = ProgramRequest::WorldVolume(VolumeOptions {
        homogeneous: true,
        ..Default::default()
    })
    .key();

    let keys = [background, probe, empty_volume, homogeneous];
    for (i, a) in keys.iter().enumerate() {
        for b in &keys[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn world_accessors_need_an_active_graph() {
    let registry = registry();
    let mut compiler = MockCompiler::default();
    let mut world = World::default();
    assert!(world_probe(&registry, &mut compiler, &world).is_none());

    world.use_nodes = true;
    world.node_graph = Some(NodeGraphId(5));
    let probe = world_probe(&registry, &mut compiler, &world).unwrap().unwrap();
    let volume = world_volume(&registry, &mut compiler, &world, VolumeOptions::default())
        .unwrap()
        .unwrap();

    assert_ne!(probe, volume);
    assert_eq!(compiler.compiles_of(GraphOwner::World), 2);
}
