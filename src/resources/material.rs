//! Material Data Model
//!
//! Host-side description of a surface: either a plain parameter set drawn by
//! the default shader, or a node graph compiled on demand. Materials live in
//! a [`MaterialSet`] and are identified by generation-checked
//! [`MaterialKey`]s, which is also the identity the per-frame draw-group
//! caches use.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};

use crate::renderer::backend::NodeGraphId;

new_key_type! {
    /// Generation-checked handle to a [`Material`] inside a [`MaterialSet`].
    pub struct MaterialKey;
}

// ─── Blend & Shadow Modes ─────────────────────────────────────────────────────

/// How a surface is composited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlendMode {
    /// Fully opaque.
    #[default]
    Solid,
    /// Opaque with pixels discarded below `alpha_threshold`.
    Clip,
    /// Opaque with stochastic discard.
    Hashed,
    /// Additive transparency.
    Add,
    /// Multiplicative transparency.
    Multiply,
    /// Standard alpha blending.
    Blend,
}

/// Blend equation of a transparent surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransparentBlend {
    Add,
    Multiply,
    Blend,
}

/// Top-level routing of a [`BlendMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFamily {
    /// Drawn after the depth prepass; deduplicated per frame.
    Opaque,
    /// Drawn in the transparent pass; a fresh batch per object slot.
    Transparent(TransparentBlend),
}

impl BlendMode {
    pub const ALL: [Self; 6] = [
        Self::Solid,
        Self::Clip,
        Self::Hashed,
        Self::Add,
        Self::Multiply,
        Self::Blend,
    ];

    #[must_use]
    pub fn family(self) -> BlendFamily {
        match self {
            Self::Solid | Self::Clip | Self::Hashed => BlendFamily::Opaque,
            Self::Add => BlendFamily::Transparent(TransparentBlend::Add),
            Self::Multiply => BlendFamily::Transparent(TransparentBlend::Multiply),
            Self::Blend => BlendFamily::Transparent(TransparentBlend::Blend),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_transparent(self) -> bool {
        matches!(self.family(), BlendFamily::Transparent(_))
    }

    /// Whether the opaque path needs a dedicated depth program.
    #[inline]
    #[must_use]
    pub fn discards_in_depth(self) -> bool {
        matches!(self, Self::Clip | Self::Hashed)
    }
}

/// How a surface casts shadows when its node graph is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShadowMode {
    None,
    #[default]
    Solid,
    Clip,
    Hashed,
}

// ─── Material ─────────────────────────────────────────────────────────────────

/// A surface appearance definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub name: String,
    /// Base color of the default shader.
    pub color: Vec3,
    pub metallic: f32,
    pub specular: f32,
    pub roughness: f32,
    pub blend_mode: BlendMode,
    pub shadow_mode: ShadowMode,
    pub alpha_threshold: f32,
    /// Transparent surfaces only: draw a depth prepass so back faces are hidden.
    pub hide_backside: bool,
    pub use_nodes: bool,
    #[serde(skip)]
    pub node_graph: Option<NodeGraphId>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::from("Default"),
            color: Vec3::splat(0.8),
            metallic: 0.0,
            specular: 0.5,
            roughness: 0.5,
            blend_mode: BlendMode::Solid,
            shadow_mode: ShadowMode::Solid,
            alpha_threshold: 0.5,
            hide_backside: false,
            use_nodes: false,
            node_graph: None,
        }
    }
}

impl Material {
    /// Parameter material with the given base color.
    #[must_use]
    pub fn with_color(name: impl Into<String>, color: Vec3) -> Self {
        Self {
            name: name.into(),
            color,
            ..Default::default()
        }
    }

    /// Node-graph material.
    #[must_use]
    pub fn with_nodes(name: impl Into<String>, graph: NodeGraphId) -> Self {
        Self {
            name: name.into(),
            use_nodes: true,
            node_graph: Some(graph),
            ..Default::default()
        }
    }

    /// The node graph, if it exists and is enabled.
    #[inline]
    #[must_use]
    pub fn active_graph(&self) -> Option<NodeGraphId> {
        self.node_graph.filter(|_| self.use_nodes)
    }
}

// ─── World ────────────────────────────────────────────────────────────────────

/// Scene environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct World {
    /// Horizon color used by the solid background.
    pub horizon: Vec3,
    pub use_nodes: bool,
    #[serde(skip)]
    pub node_graph: Option<NodeGraphId>,
}

impl Default for World {
    fn default() -> Self {
        Self {
            horizon: Vec3::splat(0.05),
            use_nodes: false,
            node_graph: None,
        }
    }
}

impl World {
    #[inline]
    #[must_use]
    pub fn active_graph(&self) -> Option<NodeGraphId> {
        self.node_graph.filter(|_| self.use_nodes)
    }
}

// ─── Material Set ─────────────────────────────────────────────────────────────

/// Owns every material of a scene plus the fallback default material.
#[derive(Debug, Clone)]
pub struct MaterialSet {
    materials: SlotMap<MaterialKey, Material>,
    default_key: MaterialKey,
}

impl Default for MaterialSet {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialSet {
    #[must_use]
    pub fn new() -> Self {
        let mut materials = SlotMap::with_key();
        let default_key = materials.insert(Material::default());
        Self {
            materials,
            default_key,
        }
    }

    pub fn insert(&mut self, material: Material) -> MaterialKey {
        self.materials.insert(material)
    }

    /// Remove a material. The default material cannot be removed.
    pub fn remove(&mut self, key: MaterialKey) -> Option<Material> {
        if key == self.default_key {
            log::warn!("Attempted to remove the default material.");
            return None;
        }
        self.materials.remove(key)
    }

    #[must_use]
    pub fn get(&self, key: MaterialKey) -> Option<&Material> {
        self.materials.get(key)
    }

    pub fn get_mut(&mut self, key: MaterialKey) -> Option<&mut Material> {
        self.materials.get_mut(key)
    }

    #[inline]
    #[must_use]
    pub fn default_key(&self) -> MaterialKey {
        self.default_key
    }

    /// Material for a slot: the assigned one if it is still alive, the
    /// default material otherwise.
    #[must_use]
    pub fn resolve(&self, slot: Option<MaterialKey>) -> (MaterialKey, &Material) {
        if let Some(key) = slot
            && let Some(material) = self.materials.get(key)
        {
            return (key, material);
        }
        (self.default_key, &self.materials[self.default_key])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
