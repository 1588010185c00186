//! Shader Variant Keys
//!
//! Every material program is one *variant* of a shader family, selected by a
//! set of independent switches (geometry kind, screen-space effects, alpha
//! handling, shadow pass). This module turns those switches into a compact
//! integer key and back.
//!
//! Two disjoint families exist:
//!
//! - [`SurfaceVariant`]: mesh and hair surfaces, including depth-only
//!   variants for clipped / hashed alpha and shadow maps.
//! - [`VolumeVariant`]: world volumetrics.
//!
//! Keys of different families are never compared: surface keys index the
//! default shader table and material caches, world keys only ever live in
//! the world's own node-graph cache.
//!
//! # Key Layout
//!
//! ```text
//! bit   0    1     2    3   4    5    6     | 7    8      9    10
//!       MESH PROBE HAIR AO  FLAT BENT BLEND | CLIP SHADOW HASH MULT
//!       └──────────── cumulative ──────────┘ └──── node-graph only ──┘
//! ```
//!
//! The seven cumulative bits index the [`SURFACE_DEFAULT_SLOTS`]-sized default
//! shader table. The remaining bits only appear in node-graph programs.

use bitflags::bitflags;

use super::shader_defines::ShaderDefines;

/// Number of slots in the default surface shader table.
pub const SURFACE_DEFAULT_SLOTS: usize = 1 << 7;

/// Exclusive upper bound of any surface variant key.
pub const SURFACE_VARIANT_LIMIT: u32 = 1 << 11;

/// Exclusive upper bound of any world variant key.
pub const WORLD_VARIANT_LIMIT: u32 = (2 | (VolumeVariant::all().bits() << 2)) + 1;

bitflags! {
    /// Surface shader switches.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct SurfaceVariant: u32 {
        const MESH   = 1 << 0;
        const PROBE  = 1 << 1;
        const HAIR   = 1 << 2;
        const AO     = 1 << 3;
        const FLAT   = 1 << 4;
        const BENT   = 1 << 5;
        const BLEND  = 1 << 6;

        const CLIP   = 1 << 7;
        const SHADOW = 1 << 8;
        const HASH   = 1 << 9;
        const MULT   = 1 << 10;
    }
}

bitflags! {
    /// World volumetric shader switches.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct VolumeVariant: u32 {
        const SHADOW              = 1 << 0;
        const HOMOGENEOUS         = 1 << 1;
        const LIGHTING            = 1 << 2;
        const COLOR_TRANSMITTANCE = 1 << 3;
    }
}

/// Define names of every surface switch, in bit order.
const SURFACE_DEFINES: [(SurfaceVariant, &str); 11] = [
    (SurfaceVariant::MESH, "MESH_SHADER"),
    (SurfaceVariant::PROBE, "PROBE_CAPTURE"),
    (SurfaceVariant::HAIR, "HAIR_SHADER"),
    (SurfaceVariant::AO, "USE_AO"),
    (SurfaceVariant::FLAT, "USE_FLAT_NORMAL"),
    (SurfaceVariant::BENT, "USE_BENT_NORMAL"),
    (SurfaceVariant::BLEND, "USE_ALPHA_BLEND"),
    (SurfaceVariant::CLIP, "USE_ALPHA_CLIP"),
    (SurfaceVariant::SHADOW, "SHADOW_SHADER"),
    (SurfaceVariant::HASH, "USE_ALPHA_HASH"),
    (SurfaceVariant::MULT, "USE_MULTIPLY"),
];

const VOLUME_DEFINES: [(VolumeVariant, &str); 4] = [
    (VolumeVariant::SHADOW, "VOLUME_SHADOW"),
    (VolumeVariant::HOMOGENEOUS, "VOLUME_HOMOGENEOUS"),
    (VolumeVariant::LIGHTING, "VOLUME_LIGHTING"),
    (VolumeVariant::COLOR_TRANSMITTANCE, "COLOR_TRANSMITTANCE"),
];

/// Define always present in volumetric programs.
pub const VOLUMETRICS_DEFINE: &str = "VOLUMETRICS";

impl SurfaceVariant {
    /// Index into the default shader table, if this variant has one.
    ///
    /// Node-graph-only switches (clip, hash, multiply, shadow) have no
    /// default shader.
    #[inline]
    #[must_use]
    pub fn default_slot(self) -> Option<usize> {
        let index = self.bits() as usize;
        (index < SURFACE_DEFAULT_SLOTS).then_some(index)
    }

    /// Emit one define per active switch.
    #[must_use]
    pub fn defines(self) -> ShaderDefines {
        let mut defines = ShaderDefines::with_capacity(self.bits().count_ones() as usize);
        for (flag, name) in SURFACE_DEFINES {
            if self.contains(flag) {
                defines.set_flag(name);
            }
        }
        defines
    }

    /// Recover the switches from an emitted define set.
    ///
    /// Unrelated defines (limits, prelude) are ignored.
    #[must_use]
    pub fn from_defines(defines: &ShaderDefines) -> Self {
        SURFACE_DEFINES
            .iter()
            .filter(|(_, name)| defines.contains(name))
            .fold(Self::empty(), |acc, (flag, _)| acc | *flag)
    }

    /// Decode into the tagged configuration.
    ///
    /// Returns `None` for bit patterns [`SurfaceOptions::variant`] never
    /// produces (e.g. clip and hash together).
    #[must_use]
    pub fn options(self) -> Option<SurfaceOptions> {
        if !self.contains(Self::MESH) {
            return None;
        }
        let geometry = if self.contains(Self::HAIR) {
            GeometryKind::Hair
        } else {
            GeometryKind::Mesh
        };
        let alpha_bits = self & (Self::CLIP | Self::HASH | Self::BLEND | Self::MULT);
        let alpha = match alpha_bits {
            b if b.is_empty() => AlphaVariant::Opaque,
            b if b == Self::CLIP => AlphaVariant::Clip,
            b if b == Self::HASH => AlphaVariant::Hashed,
            b if b == Self::BLEND => AlphaVariant::Blend,
            b if b == Self::BLEND | Self::MULT => AlphaVariant::Multiply,
            _ => return None,
        };
        Some(SurfaceOptions {
            geometry,
            probe_capture: self.contains(Self::PROBE),
            ambient_occlusion: self.contains(Self::AO),
            bent_normals: self.contains(Self::BENT),
            flat_normals: self.contains(Self::FLAT),
            alpha,
            shadow: self.contains(Self::SHADOW),
        })
    }
}

impl VolumeVariant {
    /// Emit the volumetric define plus one define per active switch.
    #[must_use]
    pub fn defines(self) -> ShaderDefines {
        let mut defines = ShaderDefines::with_capacity(5);
        defines.set_flag(VOLUMETRICS_DEFINE);
        for (flag, name) in VOLUME_DEFINES {
            if self.contains(flag) {
                defines.set_flag(name);
            }
        }
        defines
    }

    #[must_use]
    pub fn from_defines(defines: &ShaderDefines) -> Self {
        VOLUME_DEFINES
            .iter()
            .filter(|(_, name)| defines.contains(name))
            .fold(Self::empty(), |acc, (flag, _)| acc | *flag)
    }
}

// ─── Tagged Configuration ─────────────────────────────────────────────────────

/// Geometry a surface program draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GeometryKind {
    #[default]
    Mesh,
    Hair,
}

/// Alpha handling baked into a surface program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AlphaVariant {
    #[default]
    Opaque,
    /// Discard below a threshold.
    Clip,
    /// Stochastic discard.
    Hashed,
    /// Blended in the transparent pass.
    Blend,
    /// Blended multiplicatively in the transparent pass.
    Multiply,
}

/// Readable form of a [`SurfaceVariant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SurfaceOptions {
    pub geometry: GeometryKind,
    pub probe_capture: bool,
    pub ambient_occlusion: bool,
    pub bent_normals: bool,
    pub flat_normals: bool,
    pub alpha: AlphaVariant,
    pub shadow: bool,
}

impl SurfaceOptions {
    /// Encode into the integer key.
    #[must_use]
    pub fn variant(&self) -> SurfaceVariant {
        let mut v = SurfaceVariant::MESH;
        v.set(SurfaceVariant::HAIR, self.geometry == GeometryKind::Hair);
        v.set(SurfaceVariant::PROBE, self.probe_capture);
        v.set(SurfaceVariant::AO, self.ambient_occlusion);
        v.set(SurfaceVariant::BENT, self.bent_normals);
        v.set(SurfaceVariant::FLAT, self.flat_normals);
        v.set(SurfaceVariant::SHADOW, self.shadow);
        v |= match self.alpha {
            AlphaVariant::Opaque => SurfaceVariant::empty(),
            AlphaVariant::Clip => SurfaceVariant::CLIP,
            AlphaVariant::Hashed => SurfaceVariant::HASH,
            AlphaVariant::Blend => SurfaceVariant::BLEND,
            AlphaVariant::Multiply => SurfaceVariant::BLEND | SurfaceVariant::MULT,
        };
        v
    }
}

// ─── World Variants ───────────────────────────────────────────────────────────

/// Programs compiled from the world node graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorldVariant {
    Background,
    ProbeCapture,
    Volume(VolumeVariant),
}

// ─── Integer Key ──────────────────────────────────────────────────────────────

/// Integer identity of a variant inside one family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantKey(pub u32);

impl VariantKey {
    #[inline]
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl From<SurfaceVariant> for VariantKey {
    #[inline]
    fn from(v: SurfaceVariant) -> Self {
        Self(v.bits())
    }
}

impl From<WorldVariant> for VariantKey {
    fn from(v: WorldVariant) -> Self {
        match v {
            WorldVariant::Background => Self(0),
            WorldVariant::ProbeCapture => Self(1),
            WorldVariant::Volume(volume) => Self(2 | (volume.bits() << 2)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cumulative_bits_fit_default_table() {
        let cumulative = SurfaceVariant::MESH
            | SurfaceVariant::PROBE
            | SurfaceVariant::HAIR
            | SurfaceVariant::AO
            | SurfaceVariant::FLAT
            | SurfaceVariant::BENT
            | SurfaceVariant::BLEND;
        assert_eq!(cumulative.default_slot(), Some(SURFACE_DEFAULT_SLOTS - 1));
        assert_eq!((SurfaceVariant::MESH | SurfaceVariant::CLIP).default_slot(), None);
        assert!(SurfaceVariant::all().bits() < SURFACE_VARIANT_LIMIT);
    }

    #[test]
    fn world_keys_are_distinct() {
        let background = VariantKey::from(WorldVariant::Background);
        let probe = VariantKey::from(WorldVariant::ProbeCapture);
        let volume = VariantKey::from(WorldVariant::Volume(VolumeVariant::empty()));
        let lit_volume = VariantKey::from(WorldVariant::Volume(VolumeVariant::LIGHTING));

        let keys = [background, probe, volume, lit_volume];
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a, b);
            }
            assert!(a.get() < WORLD_VARIANT_LIMIT);
        }
    }

    #[test]
    fn multiply_implies_blend() {
        let options = SurfaceOptions {
            alpha: AlphaVariant::Multiply,
            ..Default::default()
        };
        let v = options.variant();
        assert!(v.contains(SurfaceVariant::BLEND | SurfaceVariant::MULT));
        assert_eq!(v.options(), Some(options));
    }

    #[test]
    fn invalid_alpha_combination_does_not_decode() {
        let v = SurfaceVariant::MESH | SurfaceVariant::CLIP | SurfaceVariant::HASH;
        assert_eq!(v.options(), None);
        assert_eq!(SurfaceVariant::HAIR.options(), None);
    }

    #[test]
    fn volume_defines_always_mark_volumetrics() {
        let defines = VolumeVariant::empty().defines();
        assert!(defines.contains(VOLUMETRICS_DEFINE));
        assert_eq!(defines.len(), 1);

        let all = VolumeVariant::all();
        assert_eq!(VolumeVariant::from_defines(&all.defines()), all);
    }
}
