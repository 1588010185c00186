//! Material Subsystem Settings
//!
//! Configuration consumed by the material subsystem. Three groups exist,
//! each with a different lifetime:
//!
//! | Type               | Consumed by                     | Lifetime      |
//! |--------------------|---------------------------------|---------------|
//! | [`ShaderLimits`]   | every shader compile (prelude)  | process       |
//! | [`RegistrySettings`] | [`ShadingRegistry::new`]      | process       |
//! | [`EffectSettings`] | [`MaterialViewport::cache_init`] | one frame    |
//!
//! All settings are plain data with `serde` support so hosts can persist them
//! alongside their scene or user preferences. Missing fields fall back to the
//! defaults below.
//!
//! # Example
//!
//! ```rust,ignore
//! use myth_materials::renderer::settings::EffectSettings;
//!
//! let settings: EffectSettings = serde_json::from_str(r#"{
//!     "ambient_occlusion": { "enabled": true, "bent_normals": true },
//!     "screen_space_reflections": true
//! }"#)?;
//! ```
//!
//! [`ShadingRegistry::new`]: crate::renderer::core::registry::ShadingRegistry::new
//! [`MaterialViewport::cache_init`]: crate::renderer::materials::frame::MaterialViewport::cache_init

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::renderer::backend::ContextId;
use crate::renderer::pipeline::shader_defines::ShaderDefines;

// ---------------------------------------------------------------------------
// ShaderLimits
// ---------------------------------------------------------------------------

/// Encoding used by irradiance grids and the world diffuse probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IrradianceEncoding {
    /// Second-order spherical harmonics.
    ShL2,
    /// Low resolution cubemap.
    Cubemap,
    /// Half-Life 2 ambient cube.
    #[default]
    Hl2,
}

impl IrradianceEncoding {
    /// Define emitted into every shader for this encoding.
    #[must_use]
    pub fn define_name(self) -> &'static str {
        match self {
            Self::ShL2 => "IRRADIANCE_SH_L2",
            Self::Cubemap => "IRRADIANCE_CUBEMAP",
            Self::Hl2 => "IRRADIANCE_HL2",
        }
    }
}

/// Array sizes baked into every material shader.
///
/// These must match the uniform block layouts the lighting subsystem uploads,
/// so they are fixed for the lifetime of the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderLimits {
    pub max_probe: u32,
    pub max_grid: u32,
    pub max_planar: u32,
    pub max_light: u32,
    pub max_shadow_cube: u32,
    pub max_shadow_map: u32,
    pub max_shadow_cascade: u32,
    pub max_cascade_num: u32,
    pub irradiance: IrradianceEncoding,
}

impl Default for ShaderLimits {
    fn default() -> Self {
        Self {
            max_probe: 128,
            max_grid: 64,
            max_planar: 16,
            max_light: 128,
            max_shadow_cube: 42,
            max_shadow_map: 64,
            max_shadow_cascade: 8,
            max_cascade_num: 4,
            irradiance: IrradianceEncoding::default(),
        }
    }
}

impl ShaderLimits {
    /// Defines shared by every material, world and volume shader.
    #[must_use]
    pub fn prelude(&self) -> ShaderDefines {
        let mut defines = ShaderDefines::with_capacity(9);
        defines.set_value("MAX_PROBE", self.max_probe);
        defines.set_value("MAX_GRID", self.max_grid);
        defines.set_value("MAX_PLANAR", self.max_planar);
        defines.set_value("MAX_LIGHT", self.max_light);
        defines.set_value("MAX_SHADOW_CUBE", self.max_shadow_cube);
        defines.set_value("MAX_SHADOW_MAP", self.max_shadow_map);
        defines.set_value("MAX_SHADOW_CASCADE", self.max_shadow_cascade);
        defines.set_value("MAX_CASCADE_NUM", self.max_cascade_num);
        defines.set_flag(self.irradiance.define_name());
        defines
    }
}

// ---------------------------------------------------------------------------
// RegistrySettings
// ---------------------------------------------------------------------------

/// Process-wide settings of the shading registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    /// Identity under which node-graph programs are cached on their owners.
    pub context: ContextId,
    /// Background color used when the scene has no world.
    pub theme_background: [f32; 3],
    /// Shader array limits.
    pub limits: ShaderLimits,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            context: ContextId::VIEWPORT,
            theme_background: [0.224, 0.224, 0.224],
            limits: ShaderLimits::default(),
        }
    }
}

impl RegistrySettings {
    #[inline]
    #[must_use]
    pub fn theme_background(&self) -> Vec3 {
        Vec3::from_array(self.theme_background)
    }
}

// ---------------------------------------------------------------------------
// EffectSettings
// ---------------------------------------------------------------------------

/// Ground-truth ambient occlusion switches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientOcclusionSettings {
    pub enabled: bool,
    /// Request the bent normal variant. Independent of `enabled`.
    pub bent_normals: bool,
    /// Object-space search distance.
    pub distance: f32,
    pub factor: f32,
    pub quality: f32,
}

impl Default for AmbientOcclusionSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            bent_normals: true,
            distance: 0.2,
            factor: 1.0,
            quality: 0.25,
        }
    }
}

/// Screen-space effect switches for one frame.
///
/// Snapshotted by `cache_init`; the values decide which shader variants the
/// frame requests, so changing them between frames simply selects other
/// (cached) variants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectSettings {
    pub ambient_occlusion: AmbientOcclusionSettings,
    pub screen_space_reflections: bool,
    /// Alpha written by the background pass (0 for a transparent film).
    pub background_alpha: f32,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            ambient_occlusion: AmbientOcclusionSettings::default(),
            screen_space_reflections: false,
            background_alpha: 1.0,
        }
    }
}

impl EffectSettings {
    /// Whether ambient occlusion variants are requested.
    #[inline]
    #[must_use]
    pub fn use_ao(&self) -> bool {
        self.ambient_occlusion.enabled
    }

    /// Whether bent normal variants are requested, whatever [`use_ao`](Self::use_ao) says.
    #[inline]
    #[must_use]
    pub fn use_bent_normals(&self) -> bool {
        self.ambient_occlusion.bent_normals
    }

    /// `aoParameters` uniform value.
    #[inline]
    #[must_use]
    pub fn ao_parameters(&self) -> Vec3 {
        let ao = &self.ambient_occlusion;
        Vec3::new(ao.distance, ao.factor, ao.quality)
    }
}
