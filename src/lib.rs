#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! # Myth Materials
//!
//! Material shading for a physically based viewport renderer:
//!
//! - encodes shading options into variant keys and compiles each variant
//!   at most once,
//! - resolves every material to a node-graph program or the default shader,
//!   falling back to a magenta error material when a graph fails,
//! - deduplicates draw groups per frame and populates the background,
//!   depth, material and transparent passes,
//! - owns the shared lookup texture and built-in programs.
//!
//! The GPU, the node-graph compiler, the geometry cache and the shadow
//! subsystem are reached through the traits in [`renderer::backend`].
//!
//! ```rust,ignore
//! let mut registry = ShadingRegistry::new(sources, luts, RegistrySettings::default());
//! let mut viewport = MaterialViewport::new();
//! viewport.init(&mut registry, &mut backend, projection, true)?;
//!
//! viewport.cache_init(&registry, &mut ctx, &effects)?;
//! for object in &objects {
//!     viewport.cache_populate(&mut registry, &mut ctx, object)?;
//! }
//! viewport.cache_finish();
//! viewport.draw_default_passes(&mut backend);
//! ```

pub mod errors;
pub mod renderer;
pub mod resources;
pub mod scene;

pub use errors::{CompileFailure, Result, ShadingError};
pub use renderer::backend::{
    ContextId, GeometryCache, GeometryHandle, GpuBackend, NodeGraphCompiler, NodeGraphId,
    ObjectId, ProgramHandle, ShadowCasters, TextureHandle,
};
pub use renderer::core::ShadingRegistry;
pub use renderer::materials::{MaterialViewport, PopulateContext};
pub use renderer::pipeline::{ShaderDefines, SurfaceVariant, VariantKey};
pub use renderer::settings::{EffectSettings, RegistrySettings};
pub use resources::{BlendMode, Material, MaterialKey, MaterialSet, ShadowMode, World};
pub use scene::{SceneObject, SceneView};
