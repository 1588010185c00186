//! Material Viewport
//!
//! Per-viewport storage and the frame entry points:
//!
//! ```text
//! init ──► cache_init ──► cache_populate × objects ──► cache_finish ──► draw
//! ```
//!
//! `cache_init` creates the frame's passes and caches, `cache_populate`
//! routes every material slot of an object to its batches, `cache_finish`
//! drops the caches. The pass list stays readable until the next
//! `cache_init` so the host can submit it.

use glam::{Mat4, Vec3, Vec4};
use smallvec::SmallVec;

use crate::errors::{Result, ShadingError};
use crate::renderer::backend::{
    GeometryCache, GeometryHandle, GpuBackend, NodeGraphCompiler, ProgramHandle, ShadowCasters,
};
use crate::renderer::core::registry::ShadingRegistry;
use crate::renderer::core::view::view_vectors;
use crate::renderer::draw::pass::{DrawCall, PassList, UniformValue};
use crate::renderer::materials::draw_groups::{FrameCaches, GroupBuilder, SlotGroups};
use crate::renderer::materials::passes::FramePasses;
use crate::renderer::materials::resolver::{mesh_depth_program, world_background};
use crate::renderer::settings::EffectSettings;
use crate::resources::material::{BlendFamily, BlendMode, Material, MaterialKey, ShadowMode};
use crate::scene::SceneView;
use crate::scene::object::SceneObject;

/// Background color drawn when the world node graph fails.
const BACKGROUND_ERROR: Vec3 = Vec3::new(1.0, 0.0, 1.0);

/// Collaborators borrowed for one entry-point call.
pub struct PopulateContext<'a> {
    pub backend: &'a mut dyn GpuBackend,
    pub compiler: &'a mut dyn NodeGraphCompiler,
    pub geometry: &'a mut dyn GeometryCache,
    pub shadows: &'a mut dyn ShadowCasters,
    pub scene: &'a SceneView,
}

/// Per-viewport material storage.
#[derive(Debug, Default)]
pub struct MaterialViewport {
    view_vectors: [Vec4; 2],
    passes: PassList,
    layout: Option<FramePasses>,
    caches: Option<FrameCaches>,
    effects: EffectSettings,
}

impl MaterialViewport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bootstrap the registry (once) and refresh the view vectors.
    pub fn init(
        &mut self,
        registry: &mut ShadingRegistry,
        backend: &mut dyn GpuBackend,
        projection: Mat4,
        is_perspective: bool,
    ) -> Result<()> {
        registry.init(backend)?;
        self.view_vectors = view_vectors(projection, is_perspective);
        Ok(())
    }

    /// Start a frame: create its passes, the background batch and empty
    /// draw-group caches.
    pub fn cache_init(
        &mut self,
        registry: &ShadingRegistry,
        ctx: &mut PopulateContext<'_>,
        effects: &EffectSettings,
    ) -> Result<()> {
        if !registry.is_initialized() {
            return Err(ShadingError::NotInitialized);
        }

        self.passes = PassList::new();
        self.layout = None;
        self.caches = None;

        let layout = FramePasses::create(&mut self.passes, registry)?;
        self.record_background(registry, ctx, &layout, effects)?;

        self.layout = Some(layout);
        self.caches = Some(FrameCaches::default());
        self.effects = *effects;

        log::debug!(
            "Material cache initialized (ao: {}, ssr: {})",
            effects.use_ao(),
            effects.screen_space_reflections
        );
        Ok(())
    }

    fn record_background(
        &mut self,
        registry: &ShadingRegistry,
        ctx: &mut PopulateContext<'_>,
        layout: &FramePasses,
        effects: &EffectSettings,
    ) -> Result<()> {
        let quad = ctx.geometry.fullscreen_quad();
        let call = DrawCall::Geometry {
            geometry: quad,
            transform: Mat4::IDENTITY,
        };
        let alpha = UniformValue::Float(effects.background_alpha);

        let mut color = registry.settings().theme_background();
        if let Some(world) = ctx.scene.world.as_ref() {
            color = world.horizon;
            match world_background(registry, ctx.compiler, world) {
                Some(Ok(program)) => {
                    let id = self.passes.create_batch(program, layout.background);
                    let batch = self.passes.batch_mut(id);
                    batch.set_uniform("backgroundAlpha", alpha);
                    batch.add_call(call);
                    return Ok(());
                }
                Some(Err(failure)) => {
                    log::warn!("{failure}; drawing the error background");
                    color = BACKGROUND_ERROR;
                }
                None => {}
            }
        }

        let id = self
            .passes
            .create_batch(registry.default_background()?, layout.background);
        let batch = self.passes.batch_mut(id);
        batch.set_uniform("color", UniformValue::Vec3(color));
        batch.set_uniform("backgroundAlpha", alpha);
        batch.add_call(call);
        Ok(())
    }

    /// Route every material slot and hair system of `object` to its batches.
    pub fn cache_populate(
        &mut self,
        registry: &mut ShadingRegistry,
        ctx: &mut PopulateContext<'_>,
        object: &SceneObject,
    ) -> Result<()> {
        let (Some(layout), Some(caches)) = (self.layout.as_mut(), self.caches.as_mut()) else {
            return Err(ShadingError::FrameNotStarted);
        };
        if !object.is_mesh() {
            return Ok(());
        }

        let scene: &SceneView = ctx.scene;
        let is_active = scene.is_active(object.id);
        let sculpt_mode = is_active && object.sculpt_mode;
        let sculpt_draw = object.draws_sculpt(is_active);
        let flat = sculpt_draw && object.flat_normals;
        let cull = object.backface_culling;
        let slot_count = if sculpt_draw {
            1
        } else {
            object.material_slots.len().max(1)
        };

        let mut builder = GroupBuilder {
            registry,
            backend: &mut *ctx.backend,
            compiler: &mut *ctx.compiler,
            list: &mut self.passes,
            layout,
            effects: &self.effects,
            view_vectors: self.view_vectors,
        };

        let mut slots: SmallVec<[SlotGroups; 4]> = SmallVec::with_capacity(slot_count);
        for index in 0..slot_count {
            let assigned = if sculpt_draw {
                None
            } else {
                object.slot_material(index)
            };
            let (key, material) = scene.materials.resolve(assigned);
            let groups = match material.blend_mode.family() {
                BlendFamily::Opaque => builder
                    .opaque(&mut caches.materials, key, material, cull, flat)?
                    .into(),
                BlendFamily::Transparent(blend) => {
                    builder.transparent(key, material, blend, cull, flat)?
                }
            };
            slots.push(groups);
        }

        if sculpt_mode && !sculpt_draw {
            ctx.geometry.ensure_sculpt_coords(object.id);
        }

        let programs: SmallVec<[Option<ProgramHandle>; 4]> =
            slots.iter().map(|groups| groups.program).collect();

        if let Some(geometry) = ctx.geometry.surface_per_material(object.id, &programs) {
            for (index, groups) in slots.iter().enumerate() {
                let slot_geometry = geometry.get(index).copied().flatten();
                let call = if sculpt_draw {
                    DrawCall::Sculpt {
                        object: object.id,
                        transform: object.transform,
                    }
                } else if let Some(geometry) = slot_geometry {
                    DrawCall::Object {
                        geometry,
                        object: object.id,
                    }
                } else {
                    continue;
                };

                builder.list.batch_mut(groups.shading).add_call(call);
                for depth in [groups.depth, groups.depth_clip].into_iter().flatten() {
                    builder.list.batch_mut(depth).add_call(call);
                }

                // Shadows follow the slot's assigned material, also when
                // sculpt mode shades a single default slot.
                if let Some(geometry) = slot_geometry {
                    let (key, material) = scene.materials.resolve(object.slot_material(index));
                    register_shadow(
                        &mut builder,
                        &mut *ctx.shadows,
                        key,
                        material,
                        geometry,
                        &object.transform,
                    );
                }
            }
        }

        if scene.is_edited(object.id) {
            return Ok(());
        }

        for (index, system) in object.particle_systems.iter().enumerate() {
            if !system.draws_paths() {
                continue;
            }
            let Some(strands) = ctx.geometry.hair_paths(object.id, index) else {
                continue;
            };

            let call = DrawCall::Geometry {
                geometry: strands,
                transform: Mat4::IDENTITY,
            };
            let (depth, depth_clip) = builder.layout.default_depth_batches(false);
            builder.list.batch_mut(depth).add_call(call);
            builder.list.batch_mut(depth_clip).add_call(call);

            let (key, material) = scene
                .materials
                .resolve(object.slot_material(system.material_slot));
            let batch = builder.hair(&mut caches.hair, key, material)?;
            builder.list.batch_mut(batch).add_call(call);
        }

        Ok(())
    }

    /// End the frame's population. Releases every draw-group cache entry.
    pub fn cache_finish(&mut self) {
        if let Some(caches) = self.caches.take() {
            log::trace!(
                "Releasing {} material and {} hair draw groups",
                caches.materials.len(),
                caches.hair.len()
            );
        }
    }

    /// Submit every default lit pass created this frame, in variant order.
    pub fn draw_default_passes(&self, backend: &mut dyn GpuBackend) {
        let Some(layout) = self.layout.as_ref() else {
            return;
        };
        for pass in layout.default_lit_passes() {
            backend.draw_pass(&self.passes, pass);
        }
    }

    /// Passes recorded for the current frame.
    #[inline]
    #[must_use]
    pub fn passes(&self) -> &PassList {
        &self.passes
    }

    /// Pass ids of the current frame, `None` before the first `cache_init`.
    #[inline]
    #[must_use]
    pub fn layout(&self) -> Option<&FramePasses> {
        self.layout.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn view_vectors(&self) -> [Vec4; 2] {
        self.view_vectors
    }

    /// Whether `cache_populate` may be called.
    #[inline]
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.caches.is_some()
    }
}

/// Register one slot's geometry with the shadow subsystem.
///
/// Node materials with a non-solid blend mode cast through their own depth
/// program unless their shadow mode is solid; everything else uses the
/// plain caster.
fn register_shadow(
    builder: &mut GroupBuilder<'_>,
    shadows: &mut dyn ShadowCasters,
    key: MaterialKey,
    material: &Material,
    geometry: GeometryHandle,
    transform: &Mat4,
) {
    if material.active_graph().is_none() || material.blend_mode == BlendMode::Solid {
        shadows.add_caster(geometry, transform);
        return;
    }

    let (hashed, threshold) = match material.shadow_mode {
        ShadowMode::None => return,
        ShadowMode::Solid => {
            shadows.add_caster(geometry, transform);
            return;
        }
        ShadowMode::Clip => (false, Some(material.alpha_threshold)),
        ShadowMode::Hashed => (true, None),
    };

    match mesh_depth_program(builder.registry, builder.compiler, key, material, hashed, true) {
        Some(program) => shadows.add_material_caster(program, geometry, transform, threshold),
        None => shadows.add_caster(geometry, transform),
    }
}
