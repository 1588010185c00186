//! Shading Registry
//!
//! Explicitly owned home of every process-wide material resource:
//!
//! - the assembled fragment libraries,
//! - the built-in background and depth prepass programs,
//! - the default surface program table ([`ShaderVariantCache`]),
//! - the utility lookup texture.
//!
//! The registry is created once, initialized once with a backend, and passed
//! by reference into every frame. [`free_all`](ShadingRegistry::free_all)
//! returns it to the uninitialized state.

use crate::errors::{Result, ShadingError};
use crate::renderer::backend::{
    ContextId, GpuBackend, ProgramHandle, ShaderDescriptor, TextureHandle, VertexStage,
};
use crate::renderer::core::lut::LutTables;
use crate::renderer::pipeline::shader_cache::ShaderVariantCache;
use crate::renderer::pipeline::sources::{FragmentLibraries, ShaderSources};
use crate::renderer::pipeline::variant::SurfaceVariant;
use crate::renderer::settings::RegistrySettings;

const CLIP_PLANES_DEFINE: &str = "#define CLIP_PLANES\n";

/// GPU objects created by [`ShadingRegistry::init`].
#[derive(Debug, Clone, Copy)]
struct SharedResources {
    default_background: ProgramHandle,
    default_prepass: ProgramHandle,
    default_prepass_clip: ProgramHandle,
    util_texture: TextureHandle,
}

/// Process-wide material resources.
#[derive(Debug)]
pub struct ShadingRegistry {
    sources: ShaderSources,
    libraries: FragmentLibraries,
    luts: LutTables,
    settings: RegistrySettings,
    shaders: ShaderVariantCache,
    resources: Option<SharedResources>,
}

impl ShadingRegistry {
    #[must_use]
    pub fn new(sources: ShaderSources, luts: LutTables, settings: RegistrySettings) -> Self {
        let libraries = FragmentLibraries::build(&sources);
        let shaders = ShaderVariantCache::new(settings.limits.prelude());
        Self {
            sources,
            libraries,
            luts,
            settings,
            shaders,
            resources: None,
        }
    }

    /// Create the built-in programs and the lookup texture.
    ///
    /// Does nothing if already initialized. On failure every object created
    /// so far is released again.
    pub fn init(&mut self, backend: &mut dyn GpuBackend) -> Result<()> {
        if self.resources.is_some() {
            return Ok(());
        }

        let texels = self.luts.pack()?;

        let mut created = Vec::with_capacity(3);
        let programs = self.create_builtin_programs(backend, &mut created);
        let programs = match programs {
            Ok(programs) => programs,
            Err(err) => {
                created.into_iter().for_each(|p| backend.free_shader(p));
                return Err(err);
            }
        };

        let util_texture =
            match backend.create_texture_array(&LutTables::descriptor(), bytemuck::cast_slice(&texels)) {
                Ok(texture) => texture,
                Err(err) => {
                    created.into_iter().for_each(|p| backend.free_shader(p));
                    return Err(err);
                }
            };

        let [default_background, default_prepass, default_prepass_clip] = programs;
        self.resources = Some(SharedResources {
            default_background,
            default_prepass,
            default_prepass_clip,
            util_texture,
        });

        log::info!(
            "Shading registry initialized ({} KiB of fragment library)",
            (self.libraries.surface.len() + self.libraries.volume.len()) / 1024
        );
        Ok(())
    }

    fn create_builtin_programs(
        &self,
        backend: &mut dyn GpuBackend,
        created: &mut Vec<ProgramHandle>,
    ) -> Result<[ProgramHandle; 3]> {
        let mut create = |desc: ShaderDescriptor<'_>| -> Result<ProgramHandle> {
            log::debug!("Compiling {} ({:032x})", desc.label, desc.fingerprint());
            let program = backend.create_shader(&desc)?;
            created.push(program);
            Ok(program)
        };

        let background = create(ShaderDescriptor {
            label: "Default Background",
            vertex: VertexStage::Fullscreen,
            geometry: None,
            fragment: &self.sources.default_world_frag,
            defines: "",
        })?;
        let prepass = create(ShaderDescriptor {
            label: "Default Prepass",
            vertex: VertexStage::Source(&self.sources.prepass_vert),
            geometry: None,
            fragment: &self.sources.prepass_frag,
            defines: "",
        })?;
        let prepass_clip = create(ShaderDescriptor {
            label: "Default Prepass Clip",
            vertex: VertexStage::Source(&self.sources.prepass_vert),
            geometry: None,
            fragment: &self.sources.prepass_frag,
            defines: CLIP_PLANES_DEFINE,
        })?;

        Ok([background, prepass, prepass_clip])
    }

    #[inline]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.resources.is_some()
    }

    fn shared(&self) -> Result<&SharedResources> {
        self.resources.as_ref().ok_or(ShadingError::NotInitialized)
    }

    /// The packed utility lookup texture consumed by lighting shaders.
    pub fn util_texture(&self) -> Result<TextureHandle> {
        Ok(self.shared()?.util_texture)
    }

    /// Solid color background program.
    pub fn default_background(&self) -> Result<ProgramHandle> {
        Ok(self.shared()?.default_background)
    }

    /// Depth prepass program, optionally honoring clip planes.
    pub fn default_prepass(&self, clip_planes: bool) -> Result<ProgramHandle> {
        let shared = self.shared()?;
        Ok(if clip_planes {
            shared.default_prepass_clip
        } else {
            shared.default_prepass
        })
    }

    /// Default surface program for `variant`, compiled on first use.
    pub fn default_surface(
        &mut self,
        backend: &mut dyn GpuBackend,
        variant: SurfaceVariant,
    ) -> Result<ProgramHandle> {
        self.shared()?;
        self.shaders
            .get_or_compile_default(backend, &self.sources, &self.libraries, variant)
    }

    #[inline]
    #[must_use]
    pub fn sources(&self) -> &ShaderSources {
        &self.sources
    }

    #[inline]
    #[must_use]
    pub fn libraries(&self) -> &FragmentLibraries {
        &self.libraries
    }

    #[inline]
    #[must_use]
    pub fn shaders(&self) -> &ShaderVariantCache {
        &self.shaders
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn context(&self) -> ContextId {
        self.settings.context
    }

    /// Release every program and texture. Safe to call repeatedly.
    pub fn free_all(&mut self, backend: &mut dyn GpuBackend) {
        self.shaders.free_all(backend);
        if let Some(shared) = self.resources.take() {
            backend.free_shader(shared.default_background);
            backend.free_shader(shared.default_prepass);
            backend.free_shader(shared.default_prepass_clip);
            backend.free_texture(shared.util_texture);
            log::info!("Shading registry released");
        }
    }
}
