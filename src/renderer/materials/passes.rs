//! Frame Pass Layout
//!
//! The fixed passes recorded every frame and the shared default depth
//! batches inside them:
//!
//! | Pass                | State                                          |
//! |---------------------|------------------------------------------------|
//! | Background          | write depth, write color                       |
//! | Depth               | write depth, less, wire                        |
//! | Depth Cull          | write depth, less, cull back                   |
//! | Depth Clip          | write depth, less, clip planes, wire           |
//! | Depth Clip Cull     | write depth, less, clip planes, cull back      |
//! | Material            | write color, equal, clip planes, wire          |
//! | Transparent         | write color, less, clip planes, wire           |
//! | Default Lit (lazy)  | same as Material, one per default variant      |

use glam::Vec4;

use crate::errors::Result;
use crate::renderer::backend::TextureHandle;
use crate::renderer::core::registry::ShadingRegistry;
use crate::renderer::draw::pass::{
    BatchId, DrawBatch, PassId, PassList, SceneResource, UniformValue,
};
use crate::renderer::draw::state::DrawState;
use crate::renderer::pipeline::variant::{SURFACE_DEFAULT_SLOTS, SurfaceVariant};
use crate::renderer::settings::EffectSettings;

/// State of the material pass and of every default lit pass.
pub const MATERIAL_PASS_STATE: DrawState = DrawState::WRITE_COLOR
    .union(DrawState::DEPTH_EQUAL)
    .union(DrawState::CLIP_PLANES)
    .union(DrawState::WIRE);

const DEPTH_STATE: DrawState = DrawState::WRITE_DEPTH.union(DrawState::DEPTH_LESS);

/// Uniform blocks and counts owned by the lighting and probe subsystems.
const SCENE_UNIFORMS: [(&str, SceneResource); 18] = [
    ("probe_block", SceneResource::ProbeBlock),
    ("grid_block", SceneResource::GridBlock),
    ("planar_block", SceneResource::PlanarBlock),
    ("light_block", SceneResource::LightBlock),
    ("shadow_block", SceneResource::ShadowBlock),
    ("light_count", SceneResource::LightCount),
    ("probe_count", SceneResource::ProbeCount),
    ("grid_count", SceneResource::GridCount),
    ("planar_count", SceneResource::PlanarCount),
    ("specToggle", SceneResource::SpecularToggle),
    ("ssrToggle", SceneResource::SsrToggle),
    ("lodCubeMax", SceneResource::LodCubeMax),
    ("lodPlanarMax", SceneResource::LodPlanarMax),
    ("probeCubes", SceneResource::ProbeCubes),
    ("probePlanars", SceneResource::ProbePlanars),
    ("irradianceGrid", SceneResource::IrradianceGrid),
    ("shadowCubes", SceneResource::ShadowCubes),
    ("shadowCascades", SceneResource::ShadowCascades),
];

/// Bind the uniforms every lit program reads.
///
/// `ssr_id` is the screen-space reflection output slot, `-1` for none.
pub fn bind_standard_uniforms(
    batch: &mut DrawBatch,
    util_texture: TextureHandle,
    effects: &EffectSettings,
    view_vectors: [Vec4; 2],
    ssr_id: i32,
) {
    for (name, resource) in SCENE_UNIFORMS {
        batch.set_uniform(name, UniformValue::Scene(resource));
    }
    batch.set_uniform("utilTex", UniformValue::Texture(util_texture));
    batch.set_uniform("outputSsrId", UniformValue::Int(ssr_id));
    if effects.use_ao() {
        batch.set_uniform("viewvecs", UniformValue::Vec4Pair(view_vectors));
        batch.set_uniform("minMaxDepthTex", UniformValue::Scene(SceneResource::MinMaxDepth));
        batch.set_uniform("aoParameters", UniformValue::Vec3(effects.ao_parameters()));
    }
}

/// Shared default depth batches, one per depth pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultDepthBatches {
    pub depth: BatchId,
    pub depth_cull: BatchId,
    pub depth_clip: BatchId,
    pub depth_clip_cull: BatchId,
}

/// Ids of the passes recorded for the current frame.
#[derive(Debug, Clone)]
pub struct FramePasses {
    pub background: PassId,
    pub depth: PassId,
    pub depth_cull: PassId,
    pub depth_clip: PassId,
    pub depth_clip_cull: PassId,
    pub material: PassId,
    pub transparent: PassId,
    pub default_depth: DefaultDepthBatches,
    default_lit: [Option<PassId>; SURFACE_DEFAULT_SLOTS],
}

impl FramePasses {
    /// Create the fixed passes and the default depth batches.
    pub fn create(list: &mut PassList, registry: &ShadingRegistry) -> Result<Self> {
        let prepass = registry.default_prepass(false)?;
        let prepass_clip = registry.default_prepass(true)?;

        let background = list.create_pass(
            "Background Pass",
            DrawState::WRITE_DEPTH | DrawState::WRITE_COLOR,
        );

        let depth = list.create_pass("Depth Pass", DEPTH_STATE | DrawState::WIRE);
        let depth_cull = list.create_pass("Depth Pass Cull", DEPTH_STATE | DrawState::CULL_BACK);
        let depth_clip = list.create_pass(
            "Depth Pass Clip",
            DEPTH_STATE | DrawState::CLIP_PLANES | DrawState::WIRE,
        );
        let depth_clip_cull = list.create_pass(
            "Depth Pass Cull Clip",
            DEPTH_STATE | DrawState::CLIP_PLANES | DrawState::CULL_BACK,
        );

        let default_depth = DefaultDepthBatches {
            depth: list.create_batch(prepass, depth),
            depth_cull: list.create_batch(prepass, depth_cull),
            depth_clip: list.create_batch(prepass_clip, depth_clip),
            depth_clip_cull: list.create_batch(prepass_clip, depth_clip_cull),
        };

        let material = list.create_pass("Material Shader Pass", MATERIAL_PASS_STATE);
        let transparent = list.create_pass(
            "Material Transparent Pass",
            DrawState::WRITE_COLOR
                | DrawState::DEPTH_LESS
                | DrawState::CLIP_PLANES
                | DrawState::WIRE,
        );

        Ok(Self {
            background,
            depth,
            depth_cull,
            depth_clip,
            depth_clip_cull,
            material,
            transparent,
            default_depth,
            default_lit: [None; SURFACE_DEFAULT_SLOTS],
        })
    }

    /// `(depth, depth_clip)` passes for the culling mode.
    #[inline]
    #[must_use]
    pub fn depth_passes(&self, cull: bool) -> (PassId, PassId) {
        if cull {
            (self.depth_cull, self.depth_clip_cull)
        } else {
            (self.depth, self.depth_clip)
        }
    }

    /// Shared `(depth, depth_clip)` batches for the culling mode.
    #[inline]
    #[must_use]
    pub fn default_depth_batches(&self, cull: bool) -> (BatchId, BatchId) {
        let d = &self.default_depth;
        if cull {
            (d.depth_cull, d.depth_clip_cull)
        } else {
            (d.depth, d.depth_clip)
        }
    }

    /// Default lit pass of `variant`, if one was created this frame.
    #[must_use]
    pub fn default_lit(&self, variant: SurfaceVariant) -> Option<PassId> {
        variant.default_slot().and_then(|slot| self.default_lit[slot])
    }

    pub(crate) fn set_default_lit(&mut self, slot: usize, pass: PassId) {
        self.default_lit[slot] = Some(pass);
    }

    /// Created default lit passes in variant key order.
    pub fn default_lit_passes(&self) -> impl Iterator<Item = PassId> + '_ {
        self.default_lit.iter().flatten().copied()
    }
}
