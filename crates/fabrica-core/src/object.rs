use crate::property::Property;
use crate::types::ObjectReference;
use glam::{Quat, Vec3};

/// Rotation, position and scale carried by entity headers, serialized as
/// ten 32-bit floats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectTransform {
    pub rotation: Quat,
    pub position: Vec3,
    pub scale: Vec3,
}

impl Default for ObjectTransform {
    fn default() -> Self {
        Self {
            rotation: Quat::IDENTITY,
            position: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

/// A scene object owned by a level. The on-disk variant tag is 0 for
/// components and 1 for entities.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneObject {
    Component(ComponentObject),
    Entity(EntityObject),
}

impl SceneObject {
    pub fn type_path(&self) -> &str {
        match self {
            SceneObject::Component(c) => &c.type_path,
            SceneObject::Entity(e) => &e.type_path,
        }
    }

    pub fn instance_name(&self) -> &str {
        match self {
            SceneObject::Component(c) => &c.instance_name,
            SceneObject::Entity(e) => &e.instance_name,
        }
    }

    pub fn properties(&self) -> &[Property] {
        match self {
            SceneObject::Component(c) => &c.properties,
            SceneObject::Entity(e) => &e.properties,
        }
    }
}

/// A component attached to some entity, located through its outer path.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComponentObject {
    pub type_path: String,
    pub root_path: String,
    pub instance_name: String,
    pub outer_path: String,
    pub order_index: u32,
    pub properties: Vec<Property>,
    /// Bytes between the end of the property list and the declared body
    /// size. Opaque; preserved verbatim.
    pub extra: Vec<u8>,
}

/// A placed entity with a world transform and an optional object hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityObject {
    pub type_path: String,
    pub root_path: String,
    pub instance_name: String,
    /// uint32 boolean on disk; kept raw so odd values round-trip.
    pub needs_transform: u32,
    pub transform: ObjectTransform,
    /// uint32 boolean on disk; kept raw.
    pub was_placed_in_level: u32,
    pub order_index: u32,
    pub parent: Option<ObjectReference>,
    pub children: Vec<ObjectReference>,
    pub properties: Vec<Property>,
    /// Trailing opaque blob inside the declared body size.
    pub extra: Vec<u8>,
}

impl Default for EntityObject {
    fn default() -> Self {
        Self {
            type_path: String::new(),
            root_path: String::new(),
            instance_name: String::new(),
            needs_transform: 0,
            transform: ObjectTransform::default(),
            was_placed_in_level: 0,
            order_index: 0,
            parent: None,
            children: Vec::new(),
            properties: Vec::new(),
            extra: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_transform_is_identity() {
        let t = ObjectTransform::default();
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.scale, Vec3::ONE);
    }

    #[test]
    fn test_scene_object_accessors() {
        let entity = SceneObject::Entity(EntityObject {
            type_path: "/Game/Buildable/Smelter".into(),
            instance_name: "Smelter_1".into(),
            ..EntityObject::default()
        });
        assert_eq!(entity.type_path(), "/Game/Buildable/Smelter");
        assert_eq!(entity.instance_name(), "Smelter_1");
        assert!(entity.properties().is_empty());
    }
}
