//! Collaborator Seams
//!
//! The material subsystem does not own a GPU device, a node-graph compiler,
//! a mesh cache or a shadow system. It talks to them through the traits in
//! this module and identifies their objects with small `Copy` handles.
//!
//! | Trait                 | Provides                                         |
//! |-----------------------|--------------------------------------------------|
//! | [`GpuBackend`]        | shader programs, texture arrays, pass submission |
//! | [`NodeGraphCompiler`] | programs generated from user node graphs         |
//! | [`GeometryCache`]     | per-material split surfaces, hair, fullscreen    |
//! | [`ShadowCasters`]     | shadow map caster registration                   |

use glam::Mat4;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use xxhash_rust::xxh3::Xxh3;

use crate::errors::Result;
use crate::renderer::draw::pass::{PassId, PassList};
use crate::renderer::pipeline::variant::VariantKey;
use crate::resources::material::MaterialKey;

// ─── Handles ──────────────────────────────────────────────────────────────────

/// Handle to a compiled shader program.
///
/// Default programs are created through [`GpuBackend::create_shader`],
/// node-graph programs through [`NodeGraphCompiler::compile`]; both must hand
/// out handles from the same namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(pub u32);

/// Handle to a backend texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Handle to a drawable geometry batch owned by the [`GeometryCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryHandle(pub u32);

/// Identity of a user node graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeGraphId(pub u32);

/// Identity of a scene object assigned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(pub u32);

/// Identity of the render context requesting node-graph programs.
///
/// Node-graph programs are cached on their owner per `(context, variant)`,
/// so two renderers sharing a material never see each other's programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId(pub u32);

impl ContextId {
    /// The interactive viewport renderer.
    pub const VIEWPORT: Self = Self(0);
}

impl Default for ContextId {
    fn default() -> Self {
        Self::VIEWPORT
    }
}

/// Owner of a node graph and of the program cache attached to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphOwner {
    Material(MaterialKey),
    World,
}

// ─── GPU Backend ──────────────────────────────────────────────────────────────

/// Vertex stage of a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexStage<'a> {
    Source(&'a str),
    /// The backend's built-in fullscreen triangle.
    Fullscreen,
}

/// Everything a backend needs to build one program.
#[derive(Debug, Clone, Copy)]
pub struct ShaderDescriptor<'a> {
    pub label: &'a str,
    pub vertex: VertexStage<'a>,
    pub geometry: Option<&'a str>,
    pub fragment: &'a str,
    /// `#define` block prepended to every stage.
    pub defines: &'a str,
}

impl ShaderDescriptor<'_> {
    /// xxh3-128 over all stages and defines.
    ///
    /// Two descriptors with equal fingerprints produce the same program.
    #[must_use]
    pub fn fingerprint(&self) -> u128 {
        let mut hasher = Xxh3::new();
        match self.vertex {
            VertexStage::Source(src) => hasher.update(src.as_bytes()),
            VertexStage::Fullscreen => hasher.update(b"<fullscreen>"),
        }
        hasher.update(&[0]);
        if let Some(geometry) = self.geometry {
            hasher.update(geometry.as_bytes());
        }
        hasher.update(&[0]);
        hasher.update(self.fragment.as_bytes());
        hasher.update(&[0]);
        hasher.update(self.defines.as_bytes());
        hasher.digest128()
    }
}

/// A layered 2D texture description.
#[derive(Debug, Clone)]
pub struct TextureArrayDescriptor {
    pub label: &'static str,
    /// `depth_or_array_layers` holds the layer count.
    pub size: wgpu::Extent3d,
    pub format: wgpu::TextureFormat,
    pub filter: wgpu::FilterMode,
    pub address_mode: wgpu::AddressMode,
}

/// Low-level graphics API used by the material subsystem.
pub trait GpuBackend {
    /// Compile a program. Failure is reported as
    /// [`ShadingError::ShaderCompile`](crate::errors::ShadingError::ShaderCompile).
    fn create_shader(&mut self, desc: &ShaderDescriptor<'_>) -> Result<ProgramHandle>;

    fn free_shader(&mut self, program: ProgramHandle);

    /// Create a texture array; `texels` is tightly packed, layer after layer.
    fn create_texture_array(
        &mut self,
        desc: &TextureArrayDescriptor,
        texels: &[u8],
    ) -> Result<TextureHandle>;

    fn free_texture(&mut self, texture: TextureHandle);

    /// Submit every batch of `pass` in order.
    fn draw_pass(&mut self, passes: &PassList, pass: PassId);
}

// ─── Node Graph Compiler ──────────────────────────────────────────────────────

/// A request to turn a node graph into a program.
#[derive(Debug, Clone, Copy)]
pub struct NodeGraphRequest<'a> {
    pub owner: GraphOwner,
    pub graph: NodeGraphId,
    pub context: ContextId,
    pub key: VariantKey,
    pub vertex: &'a str,
    pub geometry: Option<&'a str>,
    /// Shared library the generated node code is appended to.
    pub fragment: &'a str,
    pub defines: &'a str,
}

/// Result of a node-graph compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeGraphOutcome {
    Ready(ProgramHandle),
    /// The graph produced code the driver rejected, or uses unsupported nodes.
    Failed,
}

/// Generates programs from node graphs and caches them on the graph owner.
///
/// Implementations are expected to memoize both outcomes: a failed graph is
/// reported by [`find_cached`](Self::find_cached) as `Failed` until the owner
/// invalidates its cache (graph edit, driver reset).
pub trait NodeGraphCompiler {
    /// Look up the owner's cache for `(context, key)`.
    fn find_cached(
        &self,
        owner: GraphOwner,
        context: ContextId,
        key: VariantKey,
    ) -> Option<NodeGraphOutcome>;

    /// Generate, compile and cache a program.
    fn compile(&mut self, request: &NodeGraphRequest<'_>) -> NodeGraphOutcome;
}

// ─── Geometry Cache ───────────────────────────────────────────────────────────

/// Per-slot surface batches of one object. `None` marks a slot without
/// renderable faces.
pub type MaterialGeometry = SmallVec<[Option<GeometryHandle>; 4]>;

/// Supplies drawable geometry for scene objects.
pub trait GeometryCache {
    /// Split the object's surface by material slot.
    ///
    /// `programs` has one entry per slot; the cache may use it to decide
    /// which vertex attributes each split needs. `None` means the object has
    /// no surface at all.
    fn surface_per_material(
        &mut self,
        object: ObjectId,
        programs: &[Option<ProgramHandle>],
    ) -> Option<MaterialGeometry>;

    /// Fullscreen quad used by the background pass.
    fn fullscreen_quad(&mut self) -> GeometryHandle;

    /// Strand geometry of one particle system, if its paths are cached.
    fn hair_paths(&mut self, object: ObjectId, particle_system: usize) -> Option<GeometryHandle>;

    /// Make sure deformed sculpt coordinates are uploaded for regular drawing.
    fn ensure_sculpt_coords(&mut self, object: ObjectId);
}

// ─── Shadows ──────────────────────────────────────────────────────────────────

/// Accumulates shadow casters for the current frame.
pub trait ShadowCasters {
    /// Register geometry drawn with the plain depth program.
    fn add_caster(&mut self, geometry: GeometryHandle, transform: &Mat4);

    /// Register geometry drawn with a material depth program.
    ///
    /// `alpha_threshold` is set for clipped materials, `None` for hashed.
    fn add_material_caster(
        &mut self,
        program: ProgramHandle,
        geometry: GeometryHandle,
        transform: &Mat4,
        alpha_threshold: Option<f32>,
    );
}
