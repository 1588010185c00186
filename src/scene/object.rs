//! Renderable scene objects as seen by the material subsystem.

use glam::Mat4;
use smallvec::SmallVec;

use crate::renderer::backend::ObjectId;
use crate::resources::material::MaterialKey;

/// Object types; only meshes carry material slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ObjectKind {
    #[default]
    Mesh,
    Curve,
    Light,
    Camera,
    Empty,
}

/// Acceleration structure backing a sculpt session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PbvhType {
    /// Regular mesh faces; drawn through the normal surface path.
    Faces,
    /// Multires grids.
    Grids,
    /// Dynamic topology.
    BMesh,
}

/// Sculpt mode state of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SculptSession {
    pub pbvh: Option<PbvhType>,
}

/// How a particle system is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParticleDisplay {
    #[default]
    Path,
    Points,
    Object,
    Hidden,
}

/// A particle system attached to a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSystem {
    pub enabled: bool,
    pub display: ParticleDisplay,
    /// Strand paths (parent or child) have been computed.
    pub has_path_cache: bool,
    /// Index into the owner's material slots.
    pub material_slot: usize,
}

impl ParticleSystem {
    /// Enabled hair drawn as paths.
    #[must_use]
    pub fn hair(material_slot: usize) -> Self {
        Self {
            enabled: true,
            display: ParticleDisplay::Path,
            has_path_cache: true,
            material_slot,
        }
    }

    /// Whether strand geometry should be requested for this system.
    #[inline]
    #[must_use]
    pub fn draws_paths(&self) -> bool {
        self.enabled && self.display == ParticleDisplay::Path && self.has_path_cache
    }
}

/// One object of the scene being drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    /// Material per slot; `None` slots draw with the default material.
    pub material_slots: SmallVec<[Option<MaterialKey>; 4]>,
    pub transform: Mat4,
    pub backface_culling: bool,
    /// All faces are flat shaded.
    pub flat_normals: bool,
    pub sculpt_mode: bool,
    pub sculpt: Option<SculptSession>,
    pub particle_systems: Vec<ParticleSystem>,
}

impl SceneObject {
    /// A mesh with the given slots and an identity transform.
    #[must_use]
    pub fn mesh(id: ObjectId, slots: impl IntoIterator<Item = Option<MaterialKey>>) -> Self {
        Self {
            id,
            kind: ObjectKind::Mesh,
            material_slots: slots.into_iter().collect(),
            transform: Mat4::IDENTITY,
            backface_culling: false,
            flat_normals: false,
            sculpt_mode: false,
            sculpt: None,
            particle_systems: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_mesh(&self) -> bool {
        self.kind == ObjectKind::Mesh
    }

    /// Material assigned to slot `index`, if any.
    #[must_use]
    pub fn slot_material(&self, index: usize) -> Option<MaterialKey> {
        self.material_slots.get(index).copied().flatten()
    }

    /// Whether the object is drawn straight from its sculpt structure.
    ///
    /// Requires the object to be active, in sculpt mode and backed by a
    /// non-face structure.
    #[must_use]
    pub fn draws_sculpt(&self, is_active: bool) -> bool {
        is_active
            && self.sculpt_mode
            && self
                .sculpt
                .and_then(|s| s.pbvh)
                .is_some_and(|pbvh| pbvh != PbvhType::Faces)
    }
}
