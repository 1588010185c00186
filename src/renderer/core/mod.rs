//! Process-wide bootstrap: the shading registry, the utility lookup texture
//! and view-dependent vectors.

pub mod lut;
pub mod registry;
pub mod view;

pub use lut::{LUT_LAYERS, LUT_SIZE, LutTables};
pub use registry::ShadingRegistry;
pub use view::view_vectors;
