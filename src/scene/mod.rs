//! Scene view consumed while populating material passes.
//!
//! The host owns the real scene graph; each frame it hands the material
//! subsystem a [`SceneView`] with the data the passes depend on.

pub mod object;

pub use object::{ObjectKind, ParticleDisplay, ParticleSystem, PbvhType, SceneObject, SculptSession};

use crate::renderer::backend::ObjectId;
use crate::resources::material::{MaterialSet, World};

/// Materials, world and interaction state of the scene being drawn.
#[derive(Debug, Clone, Default)]
pub struct SceneView {
    pub materials: MaterialSet,
    pub world: Option<World>,
    /// Object receiving sculpt and edit input.
    pub active_object: Option<ObjectId>,
    /// Object in edit mode; its hair is not drawn.
    pub edit_object: Option<ObjectId>,
}

impl SceneView {
    #[must_use]
    pub fn new(materials: MaterialSet) -> Self {
        Self {
            materials,
            ..Default::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self, object: ObjectId) -> bool {
        self.active_object == Some(object)
    }

    #[inline]
    #[must_use]
    pub fn is_edited(&self, object: ObjectId) -> bool {
        self.edit_object == Some(object)
    }
}
