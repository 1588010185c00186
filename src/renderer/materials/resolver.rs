//! Material Program Resolver
//!
//! Decides, per material and draw context, whether a node-graph program is
//! requested and what to draw with when none is available.
//!
//! ```text
//! Unresolved ──(no graph / nodes off)──────────────► Fallback(material params)
//!     │
//!     └──► NodeGraphRequested ──► Success ─────────► NodeGraph(program)
//!                              └► Failure ─────────► Fallback(ERROR)
//! ```
//!
//! The resolved outcome is memoized by the draw-group caches, so a material
//! walks this path at most once per frame for each cached family.

use std::borrow::Cow;

use glam::Vec3;

use crate::errors::CompileFailure;
use crate::renderer::backend::{GraphOwner, NodeGraphCompiler, ProgramHandle};
use crate::renderer::core::registry::ShadingRegistry;
use crate::renderer::draw::pass::{DrawBatch, UniformValue};
use crate::renderer::pipeline::shader_cache::{NodeGraphSources, NodeGraphTarget};
use crate::renderer::pipeline::shader_defines::ShaderDefines;
use crate::renderer::pipeline::variant::{
    AlphaVariant, GeometryKind, SurfaceOptions, SurfaceVariant, VariantKey, VolumeVariant,
    WorldVariant,
};
use crate::resources::material::{Material, MaterialKey, World};

// ─── Requests ─────────────────────────────────────────────────────────────────

/// Switches of a world volumetric program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VolumeOptions {
    pub lights: bool,
    pub shadows: bool,
    pub homogeneous: bool,
    pub color_transmittance: bool,
}

impl VolumeOptions {
    #[must_use]
    pub fn variant(self) -> VolumeVariant {
        let mut v = VolumeVariant::empty();
        v.set(VolumeVariant::LIGHTING, self.lights);
        v.set(VolumeVariant::SHADOW, self.shadows);
        v.set(VolumeVariant::HOMOGENEOUS, self.homogeneous);
        v.set(VolumeVariant::COLOR_TRANSMITTANCE, self.color_transmittance);
        v
    }
}

/// A node-graph program family and its switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramRequest {
    /// Lit mesh surface.
    Mesh {
        ao: bool,
        bent_normals: bool,
        blend: bool,
        multiply: bool,
    },
    /// Depth-only mesh surface discarding by alpha.
    MeshDepth { hashed: bool, shadow: bool },
    /// Lit hair strands.
    Hair { ao: bool, bent_normals: bool },
    WorldBackground,
    WorldProbe,
    WorldVolume(VolumeOptions),
}

impl ProgramRequest {
    fn surface_options(self) -> Option<SurfaceOptions> {
        let options = match self {
            Self::Mesh {
                ao,
                bent_normals,
                blend,
                multiply,
            } => SurfaceOptions {
                ambient_occlusion: ao,
                bent_normals,
                alpha: if multiply {
                    AlphaVariant::Multiply
                } else if blend {
                    AlphaVariant::Blend
                } else {
                    AlphaVariant::Opaque
                },
                ..Default::default()
            },
            Self::MeshDepth { hashed, shadow } => SurfaceOptions {
                alpha: if hashed {
                    AlphaVariant::Hashed
                } else {
                    AlphaVariant::Clip
                },
                shadow,
                ..Default::default()
            },
            Self::Hair { ao, bent_normals } => SurfaceOptions {
                geometry: GeometryKind::Hair,
                ambient_occlusion: ao,
                bent_normals,
                ..Default::default()
            },
            Self::WorldBackground | Self::WorldProbe | Self::WorldVolume(_) => return None,
        };
        Some(options)
    }

    fn world_variant(self) -> Option<WorldVariant> {
        match self {
            Self::WorldBackground => Some(WorldVariant::Background),
            Self::WorldProbe => Some(WorldVariant::ProbeCapture),
            Self::WorldVolume(options) => Some(WorldVariant::Volume(options.variant())),
            Self::Mesh { .. } | Self::MeshDepth { .. } | Self::Hair { .. } => None,
        }
    }

    fn surface_variant(self) -> SurfaceVariant {
        self.surface_options()
            .map(|options| options.variant())
            .unwrap_or_default()
    }

    /// Integer key inside the request's family.
    #[must_use]
    pub fn key(self) -> VariantKey {
        match self.world_variant() {
            Some(world) => world.into(),
            None => self.surface_variant().into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_world(self) -> bool {
        self.world_variant().is_some()
    }

    /// Stages and variant defines for this request.
    #[must_use]
    pub fn sources(self, registry: &ShadingRegistry) -> NodeGraphSources<'_> {
        let sources = registry.sources();
        let libraries = registry.libraries();
        match self {
            Self::Mesh { .. } | Self::Hair { .. } => NodeGraphSources {
                vertex: &sources.lit_surface_vert,
                geometry: None,
                fragment: Cow::Borrowed(&libraries.surface),
                defines: self.surface_defines(),
            },
            Self::MeshDepth { shadow, .. } => NodeGraphSources {
                vertex: if shadow {
                    &*sources.shadow_vert
                } else {
                    &*sources.lit_surface_vert
                },
                geometry: shadow.then_some(&*sources.shadow_geom),
                fragment: Cow::Borrowed(&libraries.depth),
                defines: self.surface_defines(),
            },
            Self::WorldBackground => NodeGraphSources {
                vertex: &sources.background_vert,
                geometry: None,
                fragment: Cow::Borrowed(&libraries.surface),
                defines: ShaderDefines::from(&["WORLD_BACKGROUND"][..]),
            },
            Self::WorldProbe => NodeGraphSources {
                vertex: &sources.background_vert,
                geometry: None,
                fragment: Cow::Borrowed(&libraries.surface),
                defines: ShaderDefines::from(&["PROBE_CAPTURE"][..]),
            },
            Self::WorldVolume(options) => NodeGraphSources {
                vertex: &sources.background_vert,
                geometry: None,
                fragment: Cow::Borrowed(&libraries.volume),
                defines: options.variant().defines(),
            },
        }
    }

    fn surface_defines(self) -> ShaderDefines {
        self.surface_variant().defines()
    }
}

// ─── Resolution ───────────────────────────────────────────────────────────────

/// Parameters bound to default-shader batches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceParams {
    pub color: Vec3,
    pub metallic: f32,
    pub specular: f32,
    pub roughness: f32,
}

impl SurfaceParams {
    /// Magenta appearance marking a material whose node graph failed.
    pub const ERROR: Self = Self {
        color: Vec3::new(1.0, 0.0, 1.0),
        metallic: 0.5,
        specular: 0.5,
        roughness: 0.5,
    };

    #[must_use]
    pub fn from_material(material: &Material) -> Self {
        Self {
            color: material.color,
            metallic: material.metallic,
            specular: material.specular,
            roughness: material.roughness,
        }
    }

    /// Bind `basecol`, `metallic`, `specular` and `roughness`.
    pub fn bind(&self, batch: &mut DrawBatch) {
        batch.set_uniform("basecol", UniformValue::Vec3(self.color));
        batch.set_uniform("metallic", UniformValue::Float(self.metallic));
        batch.set_uniform("specular", UniformValue::Float(self.specular));
        batch.set_uniform("roughness", UniformValue::Float(self.roughness));
    }
}

/// What a surface is drawn with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    NodeGraph(ProgramHandle),
    /// Default shader with these parameters.
    Fallback(SurfaceParams),
}

/// Request `request` from the node graph of `target`, compiling on a miss.
pub fn request_program(
    registry: &ShadingRegistry,
    compiler: &mut dyn NodeGraphCompiler,
    target: NodeGraphTarget,
    request: ProgramRequest,
) -> Result<ProgramHandle, CompileFailure> {
    registry.shaders().get_or_compile_node_material(
        compiler,
        target,
        request.key(),
        || request.sources(registry),
    )
}

/// Resolve the program of a material surface.
///
/// Compile failures end here: they are logged and turned into
/// [`SurfaceParams::ERROR`].
pub fn resolve_surface(
    registry: &ShadingRegistry,
    compiler: &mut dyn NodeGraphCompiler,
    key: MaterialKey,
    material: &Material,
    request: ProgramRequest,
) -> Resolution {
    let Some(graph) = material.active_graph() else {
        return Resolution::Fallback(SurfaceParams::from_material(material));
    };

    let target = NodeGraphTarget {
        owner: GraphOwner::Material(key),
        graph,
        context: registry.context(),
    };

    match request_program(registry, compiler, target, request) {
        Ok(program) => Resolution::NodeGraph(program),
        Err(failure) => {
            log::warn!("{failure}; drawing '{}' with the error material", material.name);
            Resolution::Fallback(SurfaceParams::ERROR)
        }
    }
}

/// Depth-only program of a clipped or hashed material, `None` when the
/// material has no active graph or the graph failed.
pub fn mesh_depth_program(
    registry: &ShadingRegistry,
    compiler: &mut dyn NodeGraphCompiler,
    key: MaterialKey,
    material: &Material,
    hashed: bool,
    shadow: bool,
) -> Option<ProgramHandle> {
    let graph = material.active_graph()?;
    let target = NodeGraphTarget {
        owner: GraphOwner::Material(key),
        graph,
        context: registry.context(),
    };
    request_program(
        registry,
        compiler,
        target,
        ProgramRequest::MeshDepth { hashed, shadow },
    )
    .inspect_err(|failure| log::warn!("{failure}; '{}' uses the plain depth path", material.name))
    .ok()
}

fn world_program(
    registry: &ShadingRegistry,
    compiler: &mut dyn NodeGraphCompiler,
    world: &World,
    request: ProgramRequest,
) -> Option<Result<ProgramHandle, CompileFailure>> {
    let graph = world.active_graph()?;
    let target = NodeGraphTarget {
        owner: GraphOwner::World,
        graph,
        context: registry.context(),
    };
    Some(request_program(registry, compiler, target, request))
}

/// World background program; `None` when the world draws a solid color.
pub fn world_background(
    registry: &ShadingRegistry,
    compiler: &mut dyn NodeGraphCompiler,
    world: &World,
) -> Option<Result<ProgramHandle, CompileFailure>> {
    world_program(registry, compiler, world, ProgramRequest::WorldBackground)
}

/// World program used when rendering light probes.
pub fn world_probe(
    registry: &ShadingRegistry,
    compiler: &mut dyn NodeGraphCompiler,
    world: &World,
) -> Option<Result<ProgramHandle, CompileFailure>> {
    world_program(registry, compiler, world, ProgramRequest::WorldProbe)
}

/// World volumetric program.
pub fn world_volume(
    registry: &ShadingRegistry,
    compiler: &mut dyn NodeGraphCompiler,
    world: &World,
    options: VolumeOptions,
) -> Option<Result<ProgramHandle, CompileFailure>> {
    world_program(registry, compiler, world, ProgramRequest::WorldVolume(options))
}
