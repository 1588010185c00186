//! Recording collaborators shared by the integration tests.
//!
//! Every mock counts what it was asked to do so tests can assert on
//! compile counts, uploaded texels and registered shadow casters.

#![allow(dead_code)]

use glam::{Mat4, Vec3};
use rustc_hash::{FxHashMap, FxHashSet};

use myth_materials::errors::{Result, ShadingError};
use myth_materials::renderer::backend::{
    ContextId, GeometryCache, GeometryHandle, GpuBackend, GraphOwner, MaterialGeometry,
    NodeGraphCompiler, NodeGraphId, NodeGraphOutcome, NodeGraphRequest, ObjectId, ProgramHandle,
    ShaderDescriptor, ShadowCasters, TextureArrayDescriptor, TextureHandle,
};
use myth_materials::renderer::core::{LUT_SIZE, LutTables, ShadingRegistry};
use myth_materials::renderer::draw::{PassId, PassList};
use myth_materials::renderer::materials::{MaterialViewport, PopulateContext};
use myth_materials::renderer::pipeline::{ShaderSources, VariantKey};
use myth_materials::renderer::settings::{EffectSettings, RegistrySettings};
use myth_materials::scene::{SceneObject, SceneView};

// ============================================================================
// GPU Backend
// ============================================================================

#[derive(Debug, Clone)]
pub struct CreatedShader {
    pub label: String,
    pub defines: String,
    pub program: ProgramHandle,
}

#[derive(Debug, Default)]
pub struct MockBackend {
    next_program: u32,
    next_texture: u32,
    pub shaders: Vec<CreatedShader>,
    pub freed_shaders: Vec<ProgramHandle>,
    pub textures: Vec<(TextureHandle, usize)>,
    pub freed_textures: Vec<TextureHandle>,
    pub drawn: Vec<PassId>,
    /// Labels whose compile fails.
    pub failing_labels: FxHashSet<String>,
}

impl MockBackend {
    pub fn compiled(&self, label: &str) -> usize {
        self.shaders.iter().filter(|s| s.label == label).count()
    }

    pub fn default_lit_compiles(&self) -> usize {
        self.shaders
            .iter()
            .filter(|s| s.label.starts_with("Default Lit"))
            .count()
    }
}

impl GpuBackend for MockBackend {
    fn create_shader(&mut self, desc: &ShaderDescriptor<'_>) -> Result<ProgramHandle> {
        if self.failing_labels.contains(desc.label) {
            return Err(ShadingError::ShaderCompile {
                label: desc.label.to_owned(),
                message: "rejected by mock".to_owned(),
            });
        }
        self.next_program += 1;
        let program = ProgramHandle(self.next_program);
        self.shaders.push(CreatedShader {
            label: desc.label.to_owned(),
            defines: desc.defines.to_owned(),
            program,
        });
        Ok(program)
    }

    fn free_shader(&mut self, program: ProgramHandle) {
        self.freed_shaders.push(program);
    }

    fn create_texture_array(
        &mut self,
        _desc: &TextureArrayDescriptor,
        texels: &[u8],
    ) -> Result<TextureHandle> {
        self.next_texture += 1;
        let texture = TextureHandle(self.next_texture);
        self.textures.push((texture, texels.len()));
        Ok(texture)
    }

    fn free_texture(&mut self, texture: TextureHandle) {
        self.freed_textures.push(texture);
    }

    fn draw_pass(&mut self, _passes: &PassList, pass: PassId) {
        self.drawn.push(pass);
    }
}

// ============================================================================
// Node Graph Compiler
// ============================================================================

#[derive(Debug, Clone)]
pub struct CompileRecord {
    pub owner: GraphOwner,
    pub graph: NodeGraphId,
    pub key: VariantKey,
    pub vertex: String,
    pub fragment: String,
    pub defines: String,
    pub has_geometry_stage: bool,
}

/// Compiler memoizing outcomes per `(owner, context, key)`, like a real
/// material would on its own program list.
#[derive(Debug, Default)]
pub struct MockCompiler {
    next_program: u32,
    cache: FxHashMap<(GraphOwner, ContextId, VariantKey), NodeGraphOutcome>,
    pub failing: FxHashSet<NodeGraphId>,
    pub compiles: Vec<CompileRecord>,
}

impl MockCompiler {
    pub fn failing(graphs: impl IntoIterator<Item = NodeGraphId>) -> Self {
        Self {
            failing: graphs.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn compiles_of(&self, owner: GraphOwner) -> usize {
        self.compiles.iter().filter(|c| c.owner == owner).count()
    }

    /// Forget every memoized outcome, as after a graph edit.
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }
}

impl NodeGraphCompiler for MockCompiler {
    fn find_cached(
        &self,
        owner: GraphOwner,
        context: ContextId,
        key: VariantKey,
    ) -> Option<NodeGraphOutcome> {
        self.cache.get(&(owner, context, key)).copied()
    }

    fn compile(&mut self, request: &NodeGraphRequest<'_>) -> NodeGraphOutcome {
        self.compiles.push(CompileRecord {
            owner: request.owner,
            graph: request.graph,
            key: request.key,
            vertex: request.vertex.to_owned(),
            fragment: request.fragment.to_owned(),
            defines: request.defines.to_owned(),
            has_geometry_stage: request.geometry.is_some(),
        });
        let outcome = if self.failing.contains(&request.graph) {
            NodeGraphOutcome::Failed
        } else {
            self.next_program += 1;
            NodeGraphOutcome::Ready(ProgramHandle(1000 + self.next_program))
        };
        self.cache
            .insert((request.owner, request.context, request.key), outcome);
        outcome
    }
}

// ============================================================================
// Geometry Cache
// ============================================================================

pub const FULLSCREEN_QUAD: GeometryHandle = GeometryHandle(1);

#[derive(Debug, Default)]
pub struct MockGeometry {
    /// Explicit per-slot geometry; other objects get one batch per slot.
    pub surfaces: FxHashMap<ObjectId, MaterialGeometry>,
    /// Objects without any surface.
    pub empty: FxHashSet<ObjectId>,
    pub hair: FxHashMap<(ObjectId, usize), GeometryHandle>,
    pub surface_requests: Vec<(ObjectId, Vec<Option<ProgramHandle>>)>,
    pub sculpt_coords: Vec<ObjectId>,
}

/// Geometry generated for slot `slot` of `object`.
pub fn slot_geometry(object: ObjectId, slot: usize) -> GeometryHandle {
    GeometryHandle(100 + object.0 * 10 + slot as u32)
}

impl GeometryCache for MockGeometry {
    fn surface_per_material(
        &mut self,
        object: ObjectId,
        programs: &[Option<ProgramHandle>],
    ) -> Option<MaterialGeometry> {
        self.surface_requests.push((object, programs.to_vec()));
        if self.empty.contains(&object) {
            return None;
        }
        if let Some(surface) = self.surfaces.get(&object) {
            return Some(surface.clone());
        }
        Some(
            (0..programs.len())
                .map(|slot| Some(slot_geometry(object, slot)))
                .collect(),
        )
    }

    fn fullscreen_quad(&mut self) -> GeometryHandle {
        FULLSCREEN_QUAD
    }

    fn hair_paths(&mut self, object: ObjectId, particle_system: usize) -> Option<GeometryHandle> {
        self.hair.get(&(object, particle_system)).copied()
    }

    fn ensure_sculpt_coords(&mut self, object: ObjectId) {
        self.sculpt_coords.push(object);
    }
}

// ============================================================================
// Shadows
// ============================================================================

#[derive(Debug, Default)]
pub struct MockShadows {
    pub plain: Vec<GeometryHandle>,
    pub material: Vec<(ProgramHandle, GeometryHandle, Option<f32>)>,
}

impl ShadowCasters for MockShadows {
    fn add_caster(&mut self, geometry: GeometryHandle, _transform: &Mat4) {
        self.plain.push(geometry);
    }

    fn add_material_caster(
        &mut self,
        program: ProgramHandle,
        geometry: GeometryHandle,
        _transform: &Mat4,
        alpha_threshold: Option<f32>,
    ) {
        self.material.push((program, geometry, alpha_threshold));
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn sources() -> ShaderSources {
    ShaderSources {
        lit_surface_vert: "// lit_surface_vert\n".into(),
        lit_surface_frag: "// lit_surface_frag\n".into(),
        default_frag: "// default_frag\n".into(),
        prepass_vert: "// prepass_vert\n".into(),
        prepass_frag: "// prepass_frag\n".into(),
        shadow_vert: "// shadow_vert\n".into(),
        shadow_geom: "// shadow_geom\n".into(),
        background_vert: "// background_vert\n".into(),
        default_world_frag: "// default_world_frag\n".into(),
        volumetric_frag: "// volumetric_frag\n".into(),
        bsdf_common_lib: "// bsdf_common_lib\n".into(),
        ambient_occlusion_lib: "// ambient_occlusion_lib\n".into(),
        octahedron_lib: "// octahedron_lib\n".into(),
        irradiance_lib: "// irradiance_lib\n".into(),
        lightprobe_lib: "// lightprobe_lib\n".into(),
        ltc_lib: "// ltc_lib\n".into(),
        bsdf_direct_lib: "// bsdf_direct_lib\n".into(),
        lamps_lib: "// lamps_lib\n".into(),
    }
}

pub fn luts() -> LutTables {
    let texels = (LUT_SIZE * LUT_SIZE) as usize;
    LutTables {
        ltc_mat_ggx: vec![[1.0, 0.0, 0.0, 1.0]; texels].into(),
        bsdf_split_sum_ggx: vec![[1.0, 0.0]; texels].into(),
        ltc_mag_ggx: vec![1.0; texels].into(),
        blue_noise: vec![[0.5, 0.5]; texels].into(),
    }
}

pub fn registry() -> ShadingRegistry {
    ShadingRegistry::new(sources(), luts(), RegistrySettings::default())
}

/// A bootstrapped registry, a viewport and recording collaborators.
pub struct Harness {
    pub backend: MockBackend,
    pub compiler: MockCompiler,
    pub geometry: MockGeometry,
    pub shadows: MockShadows,
    pub registry: ShadingRegistry,
    pub viewport: MaterialViewport,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_compiler(MockCompiler::default())
    }

    pub fn with_compiler(compiler: MockCompiler) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut backend = MockBackend::default();
        let mut registry = registry();
        let mut viewport = MaterialViewport::new();
        viewport
            .init(&mut registry, &mut backend, Mat4::IDENTITY, false)
            .expect("bootstrap");

        Self {
            backend,
            compiler,
            geometry: MockGeometry::default(),
            shadows: MockShadows::default(),
            registry,
            viewport,
        }
    }

    /// `cache_init`, populate every object, keep the frame open.
    pub fn begin_frame(
        &mut self,
        scene: &SceneView,
        effects: &EffectSettings,
        objects: &[SceneObject],
    ) -> Result<()> {
        let mut ctx = PopulateContext {
            backend: &mut self.backend,
            compiler: &mut self.compiler,
            geometry: &mut self.geometry,
            shadows: &mut self.shadows,
            scene,
        };
        self.viewport.cache_init(&self.registry, &mut ctx, effects)?;
        for object in objects {
            self.viewport
                .cache_populate(&mut self.registry, &mut ctx, object)?;
        }
        Ok(())
    }

    /// A complete frame: init, populate, finish.
    pub fn frame(
        &mut self,
        scene: &SceneView,
        effects: &EffectSettings,
        objects: &[SceneObject],
    ) -> Result<()> {
        self.begin_frame(scene, effects, objects)?;
        self.viewport.cache_finish();
        Ok(())
    }

    pub fn populate(&mut self, scene: &SceneView, object: &SceneObject) -> Result<()> {
        let mut ctx = PopulateContext {
            backend: &mut self.backend,
            compiler: &mut self.compiler,
            geometry: &mut self.geometry,
            shadows: &mut self.shadows,
            scene,
        };
        self.viewport
            .cache_populate(&mut self.registry, &mut ctx, object)
    }

    pub fn passes(&self) -> &PassList {
        self.viewport.passes()
    }
}

pub fn approx_vec3(a: Vec3, b: Vec3) -> bool {
    (a - b).abs().max_element() < 1e-5
}
