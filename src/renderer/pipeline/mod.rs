//! Shader pipeline: variant keys, define emission, source assembly and the
//! variant cache.
//!
//! - [`variant`]: option switches → integer keys
//! - [`shader_defines`]: ordered `#define` sets
//! - [`sources`]: host shader text and the assembled fragment libraries
//! - [`shader_cache`]: default program table and node-graph lookups

pub mod shader_cache;
pub mod shader_defines;
pub mod sources;
pub mod variant;

pub use shader_cache::{NodeGraphSources, NodeGraphTarget, ShaderVariantCache};
pub use shader_defines::ShaderDefines;
pub use sources::{FragmentLibraries, ShaderSources};
pub use variant::{
    AlphaVariant, GeometryKind, SurfaceOptions, SurfaceVariant, VariantKey, VolumeVariant,
    WorldVariant,
};
