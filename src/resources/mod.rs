//! Host-side resource definitions consumed by the material subsystem.
//!
//! - Material: surface parameters, blend and shadow modes, node graph link
//! - World: background color and node graph link

pub mod material;

pub use material::{
    BlendFamily, BlendMode, Material, MaterialKey, MaterialSet, ShadowMode, TransparentBlend, World,
};
