//! Draw recording: pipeline state flags and the per-frame pass arena.

pub mod pass;
pub mod state;

pub use pass::{BatchId, DrawBatch, DrawCall, PassId, PassList, RenderPass, SceneResource, UniformValue};
pub use state::DrawState;
