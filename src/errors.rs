//! Error Types
//!
//! This module defines the error types used by the material subsystem.
//!
//! # Overview
//!
//! Two kinds of failure exist:
//!
//! - [`ShadingError`] covers fatal configuration problems: a built-in shader
//!   that does not compile, a malformed lookup table, an entry point called
//!   in the wrong lifecycle state. These propagate to the host with `?`.
//! - [`CompileFailure`] is the recoverable outcome of a node-graph compile.
//!   It never leaves the material resolver; the material is drawn with the
//!   magenta fallback instead.
//!
//! # Usage
//!
//! ```rust,ignore
//! use myth_materials::errors::{Result, ShadingError};
//!
//! fn bootstrap() -> Result<()> {
//!     registry.init(&mut backend)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::renderer::backend::{ContextId, GraphOwner};
use crate::renderer::pipeline::variant::VariantKey;

/// The main error type for the material subsystem.
#[derive(Error, Debug)]
pub enum ShadingError {
    // ========================================================================
    // Shader & Texture Creation
    // ========================================================================
    /// A built-in shader failed to compile.
    #[error("Failed to compile built-in shader '{label}': {message}")]
    ShaderCompile {
        /// Debug label of the shader
        label: String,
        /// Backend diagnostic
        message: String,
    },

    /// The backend could not create a texture.
    #[error("Failed to create texture '{label}': {message}")]
    TextureCreate {
        /// Debug label of the texture
        label: String,
        /// Backend diagnostic
        message: String,
    },

    /// A lookup table handed to the bootstrap has the wrong size.
    #[error("Lookup table '{table}' has {actual} entries, expected {expected}")]
    LutSize {
        /// Table name
        table: &'static str,
        /// Required entry count
        expected: usize,
        /// Provided entry count
        actual: usize,
    },

    // ========================================================================
    // Variant Errors
    // ========================================================================
    /// A default shader was requested for a key outside the default table.
    #[error("Variant key {key} is outside the default shader table (limit {limit})")]
    VariantOutOfRange {
        /// The offending key
        key: u32,
        /// Exclusive upper bound of the table
        limit: usize,
    },

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// Shared resources were used before `init`.
    #[error("Shading registry used before initialization")]
    NotInitialized,

    /// `cache_populate` was called outside `cache_init` / `cache_finish`.
    #[error("Material cache populated outside of a frame")]
    FrameNotStarted,
}

/// A node graph could not be turned into a usable program.
///
/// Recoverable: callers substitute the fallback appearance and route the
/// geometry to the default shader for the same variant flags.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Node graph of {owner:?} failed to compile for {context:?} variant {key:?}")]
pub struct CompileFailure {
    /// Owner of the node graph (a material or the world)
    pub owner: GraphOwner,
    /// Render context the program was requested for
    pub context: ContextId,
    /// Requested variant
    pub key: VariantKey,
}

/// Alias for `Result<T, ShadingError>`.
pub type Result<T> = std::result::Result<T, ShadingError>;
