//! Shader Variant Cache
//!
//! Two program families with two caching strategies:
//!
//! | Family      | Storage                               | Failure            |
//! |-------------|---------------------------------------|--------------------|
//! | Default     | flat table indexed by variant key     | fatal, propagated  |
//! | Node graph  | owner's cache, via the compiler       | recoverable        |
//!
//! Default programs are few and bounded, so a fixed array of
//! [`SURFACE_DEFAULT_SLOTS`] entries holds them for the lifetime of the
//! registry. Slots only ever go from empty to filled; [`free_all`] is the one
//! place that empties them.
//!
//! Node-graph programs are numerous and die with their material, so their
//! cache lives with the graph owner and is reached through
//! [`NodeGraphCompiler`].
//!
//! [`free_all`]: ShaderVariantCache::free_all

use std::borrow::Cow;

use super::shader_defines::ShaderDefines;
use super::sources::{FragmentLibraries, ShaderSources};
use super::variant::{SURFACE_DEFAULT_SLOTS, SurfaceVariant, VariantKey};
use crate::errors::{CompileFailure, Result, ShadingError};
use crate::renderer::backend::{
    ContextId, GpuBackend, GraphOwner, NodeGraphCompiler, NodeGraphId, NodeGraphOutcome,
    NodeGraphRequest, ProgramHandle, ShaderDescriptor, VertexStage,
};

/// Which node graph a program is generated from, and for whom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeGraphTarget {
    pub owner: GraphOwner,
    pub graph: NodeGraphId,
    pub context: ContextId,
}

/// Stages handed to the node-graph compiler on a cache miss.
#[derive(Debug, Clone)]
pub struct NodeGraphSources<'a> {
    pub vertex: &'a str,
    pub geometry: Option<&'a str>,
    pub fragment: Cow<'a, str>,
    /// Variant defines; the shared prelude is added by the cache.
    pub defines: ShaderDefines,
}

/// Process-wide table of default programs plus the node-graph lookup path.
pub struct ShaderVariantCache {
    default_surface: [Option<ProgramHandle>; SURFACE_DEFAULT_SLOTS],
    prelude: ShaderDefines,
}

impl ShaderVariantCache {
    /// `prelude` is prepended to every program this cache requests.
    #[must_use]
    pub fn new(prelude: ShaderDefines) -> Self {
        Self {
            default_surface: [None; SURFACE_DEFAULT_SLOTS],
            prelude,
        }
    }

    #[inline]
    #[must_use]
    pub fn prelude(&self) -> &ShaderDefines {
        &self.prelude
    }

    /// Prelude followed by `variant` defines, as shader text.
    #[must_use]
    pub fn define_source(&self, variant: &ShaderDefines) -> String {
        let mut source = self.prelude.to_source();
        source.push_str(&variant.to_source());
        source
    }

    /// Program already compiled for `variant`, if any.
    #[must_use]
    pub fn default_program(&self, variant: SurfaceVariant) -> Option<ProgramHandle> {
        variant
            .default_slot()
            .and_then(|slot| self.default_surface[slot])
    }

    /// Number of filled default slots.
    #[must_use]
    pub fn default_count(&self) -> usize {
        self.default_surface.iter().flatten().count()
    }

    /// Return the default program for `variant`, compiling it on first use.
    ///
    /// Only cumulative switches have a default program; a key carrying
    /// node-graph-only bits is rejected with
    /// [`ShadingError::VariantOutOfRange`].
    pub fn get_or_compile_default(
        &mut self,
        backend: &mut dyn GpuBackend,
        sources: &ShaderSources,
        libraries: &FragmentLibraries,
        variant: SurfaceVariant,
    ) -> Result<ProgramHandle> {
        let slot = variant
            .default_slot()
            .ok_or(ShadingError::VariantOutOfRange {
                key: variant.bits(),
                limit: SURFACE_DEFAULT_SLOTS,
            })?;

        if let Some(program) = self.default_surface[slot] {
            return Ok(program);
        }

        let defines = self.define_source(&variant.defines());
        let label = format!("Default Lit {slot:#04x}");
        let desc = ShaderDescriptor {
            label: &label,
            vertex: VertexStage::Source(&sources.lit_surface_vert),
            geometry: None,
            fragment: &libraries.default_surface,
            defines: &defines,
        };

        log::debug!(
            "Compiling default surface variant {variant:?} (source {:032x})",
            desc.fingerprint()
        );

        let program = backend.create_shader(&desc)?;
        self.default_surface[slot] = Some(program);
        Ok(program)
    }

    /// Return the node-graph program for `key`, compiling it on a miss.
    ///
    /// The owner's cache is consulted first; `build` runs only when nothing
    /// is cached, so hits never assemble source text. A failed compile is
    /// reported as [`CompileFailure`] and left to the caller to fall back.
    pub fn get_or_compile_node_material<'a>(
        &self,
        compiler: &mut dyn NodeGraphCompiler,
        target: NodeGraphTarget,
        key: VariantKey,
        build: impl FnOnce() -> NodeGraphSources<'a>,
    ) -> std::result::Result<ProgramHandle, CompileFailure> {
        let failure = CompileFailure {
            owner: target.owner,
            context: target.context,
            key,
        };

        let outcome = match compiler.find_cached(target.owner, target.context, key) {
            Some(outcome) => outcome,
            None => {
                let sources = build();
                let defines = self.define_source(&sources.defines);
                log::debug!(
                    "Compiling node graph {:?} of {:?} for variant {:#x}",
                    target.graph,
                    target.owner,
                    key.get()
                );
                compiler.compile(&NodeGraphRequest {
                    owner: target.owner,
                    graph: target.graph,
                    context: target.context,
                    key,
                    vertex: sources.vertex,
                    geometry: sources.geometry,
                    fragment: &sources.fragment,
                    defines: &defines,
                })
            }
        };

        match outcome {
            NodeGraphOutcome::Ready(program) => Ok(program),
            NodeGraphOutcome::Failed => Err(failure),
        }
    }

    /// Release every default program. Safe to call repeatedly.
    pub fn free_all(&mut self, backend: &mut dyn GpuBackend) {
        let mut freed = 0usize;
        for slot in &mut self.default_surface {
            if let Some(program) = slot.take() {
                backend.free_shader(program);
                freed += 1;
            }
        }
        if freed > 0 {
            log::info!("Released {freed} default surface programs");
        }
    }
}

impl std::fmt::Debug for ShaderVariantCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderVariantCache")
            .field("default_count", &self.default_count())
            .field("prelude", &self.prelude.len())
            .finish()
    }
}
