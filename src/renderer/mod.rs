//! Renderer side of the material subsystem.
//!
//! - [`backend`]: collaborator traits and opaque handles
//! - [`core`]: the shading registry and static resources
//! - [`pipeline`]: variant keys and the shader variant cache
//! - [`draw`]: pipeline state and the per-frame pass arena
//! - [`materials`]: program resolution, draw groups and populate
//! - [`settings`]: registry and per-frame effect settings

pub mod backend;
pub mod core;
pub mod draw;
pub mod materials;
pub mod pipeline;
pub mod settings;
