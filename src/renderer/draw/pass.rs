//! Passes, Batches and Draw Calls
//!
//! A [`PassList`] is the per-frame arena of everything the material subsystem
//! records: passes own ordered batch lists, batches own uniforms, state
//! overrides and calls. Passes and batches are addressed by `Copy` ids, so
//! caches can hold them without borrowing the arena.

use std::borrow::Cow;

use glam::{Mat4, Vec3, Vec4};

use super::state::DrawState;
use crate::renderer::backend::{GeometryHandle, ObjectId, ProgramHandle, TextureHandle};

// ─── Handles ──────────────────────────────────────────────────────────────────

/// Handle to a pass inside a [`PassList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassId(pub(crate) u32);

impl PassId {
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to a batch inside a [`PassList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchId(pub(crate) u32);

impl BatchId {
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ─── Uniforms ─────────────────────────────────────────────────────────────────

/// Per-frame resources owned by the lighting, probe and effect subsystems.
///
/// Bound by name; the backend resolves them when the pass is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneResource {
    ProbeBlock,
    GridBlock,
    PlanarBlock,
    LightBlock,
    ShadowBlock,
    LightCount,
    ProbeCount,
    GridCount,
    PlanarCount,
    SpecularToggle,
    SsrToggle,
    LodCubeMax,
    LodPlanarMax,
    ProbeCubes,
    ProbePlanars,
    IrradianceGrid,
    ShadowCubes,
    ShadowCascades,
    MinMaxDepth,
}

/// A value bound to a named shader uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    Vec3(Vec3),
    /// Two consecutive `vec4` entries of an array uniform.
    Vec4Pair([Vec4; 2]),
    Texture(TextureHandle),
    Scene(SceneResource),
}

// ─── Draw Calls ───────────────────────────────────────────────────────────────

/// One recorded draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCall {
    /// Geometry of a scene object, drawn with the object's transform.
    Object {
        geometry: GeometryHandle,
        object: ObjectId,
    },
    /// Dynamic-topology sculpt mesh, drawn from the sculpt structure.
    Sculpt { object: ObjectId, transform: Mat4 },
    /// Free-standing geometry with an explicit transform.
    Geometry {
        geometry: GeometryHandle,
        transform: Mat4,
    },
}

impl DrawCall {
    /// Geometry drawn by this call, if it is a cached batch.
    #[must_use]
    pub fn geometry(&self) -> Option<GeometryHandle> {
        match *self {
            Self::Object { geometry, .. } | Self::Geometry { geometry, .. } => Some(geometry),
            Self::Sculpt { .. } => None,
        }
    }
}

// ─── Pass & Batch ─────────────────────────────────────────────────────────────

/// Ordered bucket of batches sharing one pipeline state.
#[derive(Debug, Clone)]
pub struct RenderPass {
    pub name: Cow<'static, str>,
    pub state: DrawState,
    batches: Vec<BatchId>,
}

impl RenderPass {
    /// Batches in submission order.
    #[inline]
    #[must_use]
    pub fn batches(&self) -> &[BatchId] {
        &self.batches
    }
}

/// Geometry sharing one program, one uniform set and one state override.
#[derive(Debug, Clone)]
pub struct DrawBatch {
    program: ProgramHandle,
    pass: PassId,
    uniforms: Vec<(&'static str, UniformValue)>,
    state_disable: DrawState,
    state_enable: DrawState,
    calls: Vec<DrawCall>,
}

impl DrawBatch {
    #[inline]
    #[must_use]
    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    #[inline]
    #[must_use]
    pub fn pass(&self) -> PassId {
        self.pass
    }

    /// Bind `value` to `name`, replacing an earlier binding.
    pub fn set_uniform(&mut self, name: &'static str, value: UniformValue) {
        if let Some(slot) = self.uniforms.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.uniforms.push((name, value));
        }
    }

    #[must_use]
    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms
            .iter()
            .find_map(|(n, value)| (*n == name).then_some(value))
    }

    /// Uniforms in binding order.
    #[must_use]
    pub fn uniforms(&self) -> &[(&'static str, UniformValue)] {
        &self.uniforms
    }

    /// Clear `state` bits inherited from the pass.
    pub fn state_disable(&mut self, state: DrawState) {
        self.state_disable |= state;
        self.state_enable -= state;
    }

    /// Set `state` bits on top of the pass state.
    pub fn state_enable(&mut self, state: DrawState) {
        self.state_enable |= state;
    }

    /// Pipeline state used when this batch is drawn inside its pass.
    #[inline]
    #[must_use]
    pub fn effective_state(&self, pass_state: DrawState) -> DrawState {
        pass_state.overridden(self.state_disable, self.state_enable)
    }

    pub fn add_call(&mut self, call: DrawCall) {
        self.calls.push(call);
    }

    #[must_use]
    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }
}

// ─── Pass List ────────────────────────────────────────────────────────────────

/// Arena of the passes and batches recorded for one frame.
#[derive(Debug, Clone, Default)]
pub struct PassList {
    passes: Vec<RenderPass>,
    batches: Vec<DrawBatch>,
}

impl PassList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_pass(&mut self, name: impl Into<Cow<'static, str>>, state: DrawState) -> PassId {
        let id = PassId(self.passes.len() as u32);
        self.passes.push(RenderPass {
            name: name.into(),
            state,
            batches: Vec::new(),
        });
        id
    }

    /// Append an empty batch drawing `program` to the end of `pass`.
    pub fn create_batch(&mut self, program: ProgramHandle, pass: PassId) -> BatchId {
        let id = BatchId(self.batches.len() as u32);
        self.batches.push(DrawBatch {
            program,
            pass,
            uniforms: Vec::new(),
            state_disable: DrawState::empty(),
            state_enable: DrawState::empty(),
            calls: Vec::new(),
        });
        self.passes[pass.index()].batches.push(id);
        id
    }

    #[inline]
    #[must_use]
    pub fn pass(&self, id: PassId) -> &RenderPass {
        &self.passes[id.index()]
    }

    #[inline]
    #[must_use]
    pub fn batch(&self, id: BatchId) -> &DrawBatch {
        &self.batches[id.index()]
    }

    #[inline]
    pub fn batch_mut(&mut self, id: BatchId) -> &mut DrawBatch {
        &mut self.batches[id.index()]
    }

    /// Batches of `pass` in submission order.
    pub fn batches_in(&self, pass: PassId) -> impl Iterator<Item = (BatchId, &DrawBatch)> {
        self.pass(pass)
            .batches
            .iter()
            .map(|&id| (id, self.batch(id)))
    }

    /// Effective state of a batch inside its pass.
    #[must_use]
    pub fn batch_state(&self, id: BatchId) -> DrawState {
        let batch = self.batch(id);
        batch.effective_state(self.pass(batch.pass).state)
    }

    #[inline]
    #[must_use]
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    #[inline]
    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// Total calls recorded in `pass`.
    #[must_use]
    pub fn call_count(&self, pass: PassId) -> usize {
        self.batches_in(pass).map(|(_, b)| b.calls.len()).sum()
    }
}
