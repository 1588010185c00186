//! Shader Source Set
//!
//! The host ships the shader text; this crate only decides how the pieces
//! are concatenated and which defines are prepended. Sources are stored as
//! `Cow<'static, str>` so embedded `include_str!` blobs need no copy.

use std::borrow::Cow;

type Source = Cow<'static, str>;

/// Every shader stage and library chunk the material subsystem assembles.
#[derive(Debug, Clone, Default)]
pub struct ShaderSources {
    // ---- Entry points ----
    pub lit_surface_vert: Source,
    pub lit_surface_frag: Source,
    /// Fragment entry of the parameter-driven default material.
    pub default_frag: Source,
    pub prepass_vert: Source,
    pub prepass_frag: Source,
    pub shadow_vert: Source,
    pub shadow_geom: Source,
    pub background_vert: Source,
    /// Solid color background drawn when the world has no node graph.
    pub default_world_frag: Source,
    pub volumetric_frag: Source,

    // ---- Library chunks, concatenated in this order ----
    pub bsdf_common_lib: Source,
    pub ambient_occlusion_lib: Source,
    pub octahedron_lib: Source,
    pub irradiance_lib: Source,
    pub lightprobe_lib: Source,
    pub ltc_lib: Source,
    pub bsdf_direct_lib: Source,
    pub lamps_lib: Source,
}

impl ShaderSources {
    fn library_chunks(&self) -> [&str; 8] {
        [
            &*self.bsdf_common_lib,
            &*self.ambient_occlusion_lib,
            &*self.octahedron_lib,
            &*self.irradiance_lib,
            &*self.lightprobe_lib,
            &*self.ltc_lib,
            &*self.bsdf_direct_lib,
            &*self.lamps_lib,
        ]
    }

    fn concat_library(&self, entry: &str) -> String {
        let chunks = self.library_chunks();
        let len = chunks.iter().map(|c| c.len()).sum::<usize>() + entry.len();
        let mut out = String::with_capacity(len);
        for chunk in chunks {
            out.push_str(chunk);
        }
        out.push_str(entry);
        out
    }

    /// Lighting library followed by the lit surface fragment.
    ///
    /// Node-graph surface and world programs append their generated code to
    /// this text.
    #[must_use]
    pub fn surface_library(&self) -> String {
        self.concat_library(&self.lit_surface_frag)
    }

    /// Lighting library followed by the volumetric fragment.
    #[must_use]
    pub fn volume_library(&self) -> String {
        self.concat_library(&self.volumetric_frag)
    }
}

/// Fragment libraries assembled once by the registry.
#[derive(Debug, Clone, Default)]
pub struct FragmentLibraries {
    /// Lighting library + lit surface fragment.
    pub surface: String,
    /// Lighting library + volumetric fragment.
    pub volume: String,
    /// Surface library + default material entry.
    pub default_surface: String,
    /// Surface library + prepass entry, used by depth-only node programs.
    pub depth: String,
}

impl FragmentLibraries {
    #[must_use]
    pub fn build(sources: &ShaderSources) -> Self {
        let surface = sources.surface_library();
        let default_surface = format!("{surface}{}", sources.default_frag);
        let depth = format!("{surface}{}", sources.prepass_frag);
        Self {
            volume: sources.volume_library(),
            surface,
            default_surface,
            depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_order_is_fixed() {
        let sources = ShaderSources {
            bsdf_common_lib: "a".into(),
            ambient_occlusion_lib: "b".into(),
            octahedron_lib: "c".into(),
            irradiance_lib: "d".into(),
            lightprobe_lib: "e".into(),
            ltc_lib: "f".into(),
            bsdf_direct_lib: "g".into(),
            lamps_lib: "h".into(),
            lit_surface_frag: "S".into(),
            volumetric_frag: "V".into(),
            default_frag: "D".into(),
            prepass_frag: "P".into(),
            ..Default::default()
        };

        let libs = FragmentLibraries::build(&sources);
        assert_eq!(libs.surface, "abcdefghS");
        assert_eq!(libs.volume, "abcdefghV");
        assert_eq!(libs.default_surface, "abcdefghSD");
        assert_eq!(libs.depth, "abcdefghSP");
    }
}
