//! Per-Frame Draw-Group Cache
//!
//! Opaque materials are resolved once per frame: the first object using a
//! material builds its shading batch and depth batches, every later object
//! only appends calls. Transparent materials are rebuilt for every slot
//! because each batch carries its own blend and depth state.
//!
//! Both caches live in one [`FrameCaches`] value owned by the viewport
//! between `cache_init` and `cache_finish`. Dropping it releases every entry.

use glam::Vec4;
use rustc_hash::FxHashMap;

use crate::errors::{Result, ShadingError};
use crate::renderer::backend::{GpuBackend, NodeGraphCompiler, ProgramHandle};
use crate::renderer::core::registry::ShadingRegistry;
use crate::renderer::draw::pass::{BatchId, PassId, PassList, UniformValue};
use crate::renderer::draw::state::DrawState;
use crate::renderer::materials::passes::{FramePasses, MATERIAL_PASS_STATE, bind_standard_uniforms};
use crate::renderer::materials::resolver::{
    ProgramRequest, Resolution, mesh_depth_program, resolve_surface,
};
use crate::renderer::pipeline::variant::{
    AlphaVariant, GeometryKind, SURFACE_DEFAULT_SLOTS, SurfaceOptions, SurfaceVariant,
};
use crate::renderer::settings::EffectSettings;
use crate::resources::material::{BlendMode, Material, MaterialKey, TransparentBlend};

// ─── Cache Entries ────────────────────────────────────────────────────────────

/// Batches built for one opaque material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialShadingGroups {
    pub shading: BatchId,
    /// Dedicated or shared depth batch.
    pub depth: BatchId,
    pub depth_clip: BatchId,
    /// Node-graph shading program, `None` when drawn by the default shader.
    pub program: Option<ProgramHandle>,
    /// Node-graph depth program of clipped and hashed materials.
    pub depth_program: Option<ProgramHandle>,
}

/// Opaque material cache keyed by material identity.
#[derive(Debug, Default)]
pub struct MaterialDrawGroups {
    entries: FxHashMap<MaterialKey, MaterialShadingGroups>,
}

impl MaterialDrawGroups {
    #[inline]
    #[must_use]
    pub fn get(&self, key: MaterialKey) -> Option<&MaterialShadingGroups> {
        self.entries.get(&key)
    }

    pub fn insert(&mut self, key: MaterialKey, groups: MaterialShadingGroups) {
        self.entries.insert(key, groups);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Hair material cache. Hair has no dedicated depth batches.
#[derive(Debug, Default)]
pub struct HairDrawGroups {
    entries: FxHashMap<MaterialKey, BatchId>,
}

impl HairDrawGroups {
    #[inline]
    #[must_use]
    pub fn get(&self, key: MaterialKey) -> Option<BatchId> {
        self.entries.get(&key).copied()
    }

    pub fn insert(&mut self, key: MaterialKey, batch: BatchId) {
        self.entries.insert(key, batch);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Every per-frame cache. Lives from `cache_init` to `cache_finish`.
#[derive(Debug, Default)]
pub struct FrameCaches {
    pub materials: MaterialDrawGroups,
    pub hair: HairDrawGroups,
}

/// Batches receiving the geometry of one material slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotGroups {
    pub shading: BatchId,
    pub depth: Option<BatchId>,
    pub depth_clip: Option<BatchId>,
    /// Program handed to the geometry cache for attribute selection.
    pub program: Option<ProgramHandle>,
}

impl From<MaterialShadingGroups> for SlotGroups {
    fn from(groups: MaterialShadingGroups) -> Self {
        Self {
            shading: groups.shading,
            depth: Some(groups.depth),
            depth_clip: Some(groups.depth_clip),
            program: groups.program,
        }
    }
}

// ─── Builder ──────────────────────────────────────────────────────────────────

/// Builds batches for one frame. Borrowed for a single populate call.
pub(crate) struct GroupBuilder<'a> {
    pub registry: &'a mut ShadingRegistry,
    pub backend: &'a mut dyn GpuBackend,
    pub compiler: &'a mut dyn NodeGraphCompiler,
    pub list: &'a mut PassList,
    pub layout: &'a mut FramePasses,
    pub effects: &'a EffectSettings,
    pub view_vectors: [Vec4; 2],
}

impl GroupBuilder<'_> {
    fn ssr_id(&self) -> i32 {
        if self.effects.screen_space_reflections {
            0
        } else {
            -1
        }
    }

    fn default_variant(&self, hair: bool, flat: bool, blend: bool) -> SurfaceVariant {
        SurfaceOptions {
            geometry: if hair {
                GeometryKind::Hair
            } else {
                GeometryKind::Mesh
            },
            ambient_occlusion: self.effects.use_ao(),
            bent_normals: self.effects.use_bent_normals(),
            flat_normals: flat,
            alpha: if blend {
                AlphaVariant::Blend
            } else {
                AlphaVariant::Opaque
            },
            ..Default::default()
        }
        .variant()
    }

    fn mesh_request(&self, transparent: Option<TransparentBlend>) -> ProgramRequest {
        ProgramRequest::Mesh {
            ao: self.effects.use_ao(),
            bent_normals: self.effects.use_bent_normals(),
            blend: transparent.is_some(),
            multiply: transparent == Some(TransparentBlend::Multiply),
        }
    }

    /// Node-graph batch in `pass` with the standard uniforms bound.
    fn node_batch(&mut self, program: ProgramHandle, pass: PassId, ssr_id: i32) -> Result<BatchId> {
        let util = self.registry.util_texture()?;
        let batch = self.list.create_batch(program, pass);
        bind_standard_uniforms(
            self.list.batch_mut(batch),
            util,
            self.effects,
            self.view_vectors,
            ssr_id,
        );
        Ok(batch)
    }

    /// A new batch in the default lit pass of the matching variant.
    ///
    /// The pass is created on first use, together with a head batch that
    /// carries the standard uniforms for every later batch of the pass.
    pub fn default_batch(&mut self, hair: bool, flat: bool) -> Result<BatchId> {
        let variant = self.default_variant(hair, flat, false);
        let program = self.registry.default_surface(self.backend, variant)?;

        let pass = match self.layout.default_lit(variant) {
            Some(pass) => pass,
            None => {
                let slot = variant.default_slot().ok_or(ShadingError::VariantOutOfRange {
                    key: variant.bits(),
                    limit: SURFACE_DEFAULT_SLOTS,
                })?;
                let pass = self.list.create_pass("Default Lit Pass", MATERIAL_PASS_STATE);
                self.layout.set_default_lit(slot, pass);
                let ssr_id = self.ssr_id();
                self.node_batch(program, pass, ssr_id)?;
                log::debug!("Created default lit pass for variant {:#04x}", variant.bits());
                pass
            }
        };

        Ok(self.list.create_batch(program, pass))
    }

    /// A default-shader batch inside `pass`, carrying its own standard uniforms.
    fn default_batch_in(&mut self, pass: PassId, flat: bool, blend: bool, ssr_id: i32) -> Result<BatchId> {
        let variant = self.default_variant(false, flat, blend);
        let program = self.registry.default_surface(self.backend, variant)?;
        self.node_batch(program, pass, ssr_id)
    }

    /// Batches of an opaque-family material, built on the first request of
    /// the frame.
    pub fn opaque(
        &mut self,
        cache: &mut MaterialDrawGroups,
        key: MaterialKey,
        material: &Material,
        cull: bool,
        flat: bool,
    ) -> Result<MaterialShadingGroups> {
        if let Some(groups) = cache.get(key) {
            log::trace!("Draw-group hit for '{}'", material.name);
            return Ok(*groups);
        }

        let request = self.mesh_request(None);
        let (shading, program) =
            match resolve_surface(self.registry, self.compiler, key, material, request) {
                Resolution::NodeGraph(program) => {
                    let ssr_id = self.ssr_id();
                    let batch = self.node_batch(program, self.layout.material, ssr_id)?;
                    (batch, Some(program))
                }
                Resolution::Fallback(params) => {
                    let batch = self.default_batch(false, flat)?;
                    params.bind(self.list.batch_mut(batch));
                    (batch, None)
                }
            };

        let depth_program = if material.blend_mode.discards_in_depth() {
            let hashed = material.blend_mode == BlendMode::Hashed;
            mesh_depth_program(self.registry, self.compiler, key, material, hashed, false)
        } else {
            None
        };

        let (depth, depth_clip) = match depth_program {
            Some(depth_program) => {
                let (pass, clip_pass) = self.layout.depth_passes(cull);
                let depth = self.list.create_batch(depth_program, pass);
                let depth_clip = self.list.create_batch(depth_program, clip_pass);
                if program.is_some() && material.blend_mode == BlendMode::Clip {
                    let threshold = UniformValue::Float(material.alpha_threshold);
                    self.list.batch_mut(depth).set_uniform("alphaThreshold", threshold);
                    self.list.batch_mut(depth_clip).set_uniform("alphaThreshold", threshold);
                }
                (depth, depth_clip)
            }
            None => self.layout.default_depth_batches(cull),
        };

        let groups = MaterialShadingGroups {
            shading,
            depth,
            depth_clip,
            program,
            depth_program,
        };
        cache.insert(key, groups);
        Ok(groups)
    }

    /// Fresh batches of a transparent material in the transparent pass.
    pub fn transparent(
        &mut self,
        key: MaterialKey,
        material: &Material,
        blend: TransparentBlend,
        cull: bool,
        flat: bool,
    ) -> Result<SlotGroups> {
        let pass = self.layout.transparent;
        let cull_state = if cull {
            DrawState::CULL_BACK
        } else {
            DrawState::empty()
        };

        // Created ahead of the shading batch. Batches draw in creation order
        // and the equal test below needs the front-most depth written first.
        let depth = if material.hide_backside {
            let prepass = self.registry.default_prepass(true)?;
            let id = self.list.create_batch(prepass, pass);
            let batch = self.list.batch_mut(id);
            batch.state_disable(DrawState::TRANSPARENT_OVERRIDABLE);
            batch.state_enable(DrawState::WRITE_DEPTH | DrawState::DEPTH_LESS | cull_state);
            Some(id)
        } else {
            None
        };

        let request = self.mesh_request(Some(blend));
        let (shading, program) =
            match resolve_surface(self.registry, self.compiler, key, material, request) {
                Resolution::NodeGraph(program) => (self.node_batch(program, pass, -1)?, Some(program)),
                Resolution::Fallback(params) => {
                    let batch = self.default_batch_in(pass, flat, true, -1)?;
                    params.bind(self.list.batch_mut(batch));
                    (batch, None)
                }
            };

        let depth_test = if material.hide_backside {
            DrawState::DEPTH_EQUAL
        } else {
            DrawState::DEPTH_LESS
        };
        let blend_state = match blend {
            TransparentBlend::Add => DrawState::ADDITIVE,
            TransparentBlend::Multiply => DrawState::MULTIPLY,
            TransparentBlend::Blend => DrawState::BLEND,
        };

        let batch = self.list.batch_mut(shading);
        batch.state_disable(DrawState::TRANSPARENT_OVERRIDABLE);
        batch.state_enable(DrawState::WRITE_COLOR | depth_test | cull_state | blend_state);

        Ok(SlotGroups {
            shading,
            depth,
            depth_clip: None,
            program,
        })
    }

    /// Shading batch of a hair material, built on the first request of the
    /// frame.
    pub fn hair(
        &mut self,
        cache: &mut HairDrawGroups,
        key: MaterialKey,
        material: &Material,
    ) -> Result<BatchId> {
        if let Some(batch) = cache.get(key) {
            return Ok(batch);
        }

        let request = ProgramRequest::Hair {
            ao: self.effects.use_ao(),
            bent_normals: self.effects.use_bent_normals(),
        };
        let batch = match resolve_surface(self.registry, self.compiler, key, material, request) {
            Resolution::NodeGraph(program) => self.node_batch(program, self.layout.material, -1)?,
            Resolution::Fallback(params) => {
                let batch = self.default_batch(true, false)?;
                params.bind(self.list.batch_mut(batch));
                batch
            }
        };

        cache.insert(key, batch);
        Ok(batch)
    }
}
