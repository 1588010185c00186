//! Material shading: program resolution, per-frame draw groups and pass
//! population.

pub mod draw_groups;
pub mod frame;
pub mod passes;
pub mod resolver;

pub use draw_groups::{
    FrameCaches, HairDrawGroups, MaterialDrawGroups, MaterialShadingGroups, SlotGroups,
};
pub use frame::{MaterialViewport, PopulateContext};
pub use passes::{DefaultDepthBatches, FramePasses, MATERIAL_PASS_STATE, bind_standard_uniforms};
pub use resolver::{
    ProgramRequest, Resolution, SurfaceParams, VolumeOptions, mesh_depth_program,
    request_program, resolve_surface, world_background, world_probe, world_volume,
};
