use crate::cursor::{ByteReader, ByteWriter};
use crate::error::PersistError;
use crate::property::{
    read_object_reference, read_property_list, write_object_reference, write_property_list,
};
use fabrica_core::{ComponentObject, EntityObject, ObjectTransform, SceneObject};
use glam::{Quat, Vec3};

const OBJECT_KIND_COMPONENT: u32 = 0;
const OBJECT_KIND_ENTITY: u32 = 1;

/// Headers pass: object identities, entity transforms. Properties stay
/// empty until the bodies pass fills them in.
pub fn read_object_headers(r: &mut ByteReader<'_>) -> Result<Vec<SceneObject>, PersistError> {
    let count = r.read_u32()?;
    let mut objects = Vec::with_capacity((count as usize).min(r.remaining()));
    for _ in 0..count {
        let at = r.position();
        let kind = r.read_u32()?;
        let object = match kind {
            OBJECT_KIND_COMPONENT => SceneObject::Component(ComponentObject {
                type_path: r.read_string()?,
                root_path: r.read_string()?,
                instance_name: r.read_string()?,
                outer_path: r.read_string()?,
                ..ComponentObject::default()
            }),
            OBJECT_KIND_ENTITY => SceneObject::Entity(EntityObject {
                type_path: r.read_string()?,
                root_path: r.read_string()?,
                instance_name: r.read_string()?,
                needs_transform: r.read_u32()?,
                transform: read_transform(r)?,
                was_placed_in_level: r.read_u32()?,
                ..EntityObject::default()
            }),
            other => {
                return Err(PersistError::MalformedRecord {
                    context: "object header".to_owned(),
                    position: at,
                    reason: format!("unknown object kind {other}"),
                })
            }
        };
        objects.push(object);
    }
    Ok(objects)
}

pub fn write_object_headers(w: &mut ByteWriter, objects: &[SceneObject]) {
    w.write_u32(objects.len() as u32);
    for object in objects {
        match object {
            SceneObject::Component(c) => {
                w.write_u32(OBJECT_KIND_COMPONENT);
                w.write_string(&c.type_path);
                w.write_string(&c.root_path);
                w.write_string(&c.instance_name);
                w.write_string(&c.outer_path);
            }
            SceneObject::Entity(e) => {
                w.write_u32(OBJECT_KIND_ENTITY);
                w.write_string(&e.type_path);
                w.write_string(&e.root_path);
                w.write_string(&e.instance_name);
                w.write_u32(e.needs_transform);
                write_transform(w, &e.transform);
                w.write_u32(e.was_placed_in_level);
            }
        }
    }
}

/// Bodies pass: the count must match the headers pass exactly.
pub fn read_object_bodies(
    r: &mut ByteReader<'_>,
    objects: &mut [SceneObject],
) -> Result<(), PersistError> {
    let count = r.read_u32()?;
    if count as usize != objects.len() {
        return Err(PersistError::ObjectCountMismatch {
            headers: objects.len() as u32,
            bodies: count,
        });
    }
    for object in objects.iter_mut() {
        read_object_body(r, object)?;
    }
    Ok(())
}

pub fn write_object_bodies(
    w: &mut ByteWriter,
    objects: &[SceneObject],
) -> Result<(), PersistError> {
    w.write_u32(objects.len() as u32);
    for object in objects {
        write_object_body(w, object)?;
    }
    Ok(())
}

fn read_object_body(r: &mut ByteReader<'_>, object: &mut SceneObject) -> Result<(), PersistError> {
    let declared = r.read_u32()?;
    let order_index = r.read_u32()?;
    let body_start = r.position();

    match object {
        SceneObject::Entity(e) => {
            e.order_index = order_index;
            let flag_at = r.position();
            e.parent = match r.read_u32()? {
                0 => None,
                1 => Some(read_object_reference(r)?),
                other => {
                    return Err(PersistError::MalformedRecord {
                        context: format!("object `{}`", e.instance_name),
                        position: flag_at,
                        reason: format!("invalid parent flag {other}"),
                    })
                }
            };
            let child_count = r.read_u32()?;
            let mut children = Vec::with_capacity((child_count as usize).min(r.remaining()));
            for _ in 0..child_count {
                children.push(read_object_reference(r)?);
            }
            e.children = children;
            e.properties = read_property_list(r)?;
            e.extra = take_extra(r, body_start, declared, &e.instance_name)?;
        }
        SceneObject::Component(c) => {
            c.order_index = order_index;
            c.properties = read_property_list(r)?;
            c.extra = take_extra(r, body_start, declared, &c.instance_name)?;
        }
    }
    Ok(())
}

/// Position-check against the declared body size, then capture whatever is
/// left of it as the opaque trailing blob.
fn take_extra(
    r: &mut ByteReader<'_>,
    body_start: usize,
    declared: u32,
    instance_name: &str,
) -> Result<Vec<u8>, PersistError> {
    let consumed = r.position() - body_start;
    if consumed > declared as usize {
        return Err(PersistError::BodyLengthMismatch {
            context: format!("object `{instance_name}`"),
            declared: u64::from(declared),
            consumed: consumed as u64,
        });
    }
    Ok(r.read_bytes(declared as usize - consumed)?.to_vec())
}

fn write_object_body(w: &mut ByteWriter, object: &SceneObject) -> Result<(), PersistError> {
    let size_at = w.reserve_u32();
    match object {
        SceneObject::Entity(e) => {
            w.write_u32(e.order_index);
            let body_start = w.position();
            match &e.parent {
                Some(parent) => {
                    w.write_u32(1);
                    write_object_reference(w, parent);
                }
                None => w.write_u32(0),
            }
            w.write_u32(e.children.len() as u32);
            for child in &e.children {
                write_object_reference(w, child);
            }
            write_property_list(w, &e.properties)?;
            w.write_bytes(&e.extra);
            w.patch_u32(size_at, (w.position() - body_start) as u32);
        }
        SceneObject::Component(c) => {
            w.write_u32(c.order_index);
            let body_start = w.position();
            write_property_list(w, &c.properties)?;
            w.write_bytes(&c.extra);
            w.patch_u32(size_at, (w.position() - body_start) as u32);
        }
    }
    Ok(())
}

fn read_transform(r: &mut ByteReader<'_>) -> Result<ObjectTransform, PersistError> {
    Ok(ObjectTransform {
        rotation: Quat::from_xyzw(r.read_f32()?, r.read_f32()?, r.read_f32()?, r.read_f32()?),
        position: Vec3::new(r.read_f32()?, r.read_f32()?, r.read_f32()?),
        scale: Vec3::new(r.read_f32()?, r.read_f32()?, r.read_f32()?),
    })
}

fn write_transform(w: &mut ByteWriter, transform: &ObjectTransform) {
    w.write_f32(transform.rotation.x);
    w.write_f32(transform.rotation.y);
    w.write_f32(transform.rotation.z);
    w.write_f32(transform.rotation.w);
    w.write_f32(transform.position.x);
    w.write_f32(transform.position.y);
    w.write_f32(transform.position.z);
    w.write_f32(transform.scale.x);
    w.write_f32(transform.scale.y);
    w.write_f32(transform.scale.z);
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabrica_core::{ObjectReference, Property, PropertyValue};

    fn sample_entity() -> SceneObject {
        SceneObject::Entity(EntityObject {
            type_path: "/Game/Buildable/ConveyorBeltMk1".into(),
            root_path: "Persistent_Level".into(),
            instance_name: "ConveyorBeltMk1_7".into(),
            needs_transform: 1,
            transform: ObjectTransform {
                rotation: Quat::from_xyzw(0.0, 0.0, 0.707, 0.707),
                position: Vec3::new(-1200.0, 300.0, 0.0),
                scale: Vec3::ONE,
            },
            was_placed_in_level: 0,
            order_index: 0,
            parent: Some(ObjectReference::new("Persistent_Level", "Factory_1")),
            children: vec![ObjectReference::new("Persistent_Level", "Belt_7.Item_0")],
            properties: vec![Property::new("mSpeed", PropertyValue::Float(120.0))],
            extra: vec![0xDE, 0xAD],
        })
    }

    fn sample_component() -> SceneObject {
        SceneObject::Component(ComponentObject {
            type_path: "/Script/FactoryGame.FGInventoryComponent".into(),
            root_path: "Persistent_Level".into(),
            instance_name: "inventory".into(),
            outer_path: "ConveyorBeltMk1_7".into(),
            order_index: 1,
            properties: Vec::new(),
            extra: Vec::new(),
        })
    }

    fn roundtrip(objects: &[SceneObject]) -> Vec<SceneObject> {
        let mut w = ByteWriter::new();
        write_object_headers(&mut w, objects);
        write_object_bodies(&mut w, objects).unwrap();
        let bytes = w.into_bytes();

        let mut r = ByteReader::new(&bytes);
        let mut back = read_object_headers(&mut r).unwrap();
        read_object_bodies(&mut r, &mut back).unwrap();
        assert!(r.is_empty());
        back
    }

    #[test]
    fn test_entity_and_component_roundtrip() {
        let objects = vec![sample_entity(), sample_component()];
        assert_eq!(roundtrip(&objects), objects);
    }

    #[test]
    fn test_reader_lands_on_declared_body_size() {
        let objects = vec![sample_entity()];
        let mut w = ByteWriter::new();
        write_object_headers(&mut w, &objects);
        write_object_bodies(&mut w, &objects).unwrap();
        let bytes = w.into_bytes();

        let mut r = ByteReader::new(&bytes);
        let mut back = read_object_headers(&mut r).unwrap();
        read_object_bodies(&mut r, &mut back).unwrap();
        assert_eq!(r.remaining(), 0);
        match &back[0] {
            SceneObject::Entity(e) => assert_eq!(e.extra, vec![0xDE, 0xAD]),
            other => panic!("unexpected object {other:?}"),
        }
    }

    #[test]
    fn test_count_mismatch_rejected() {
        let objects = vec![sample_component()];
        let mut w = ByteWriter::new();
        write_object_headers(&mut w, &objects);
        write_object_bodies(&mut w, &objects).unwrap();
        let mut bytes = w.into_bytes();

        // bodies pass begins right after the single header; its count sits
        // at the end of the header block. Corrupt it to 2.
        let mut r = ByteReader::new(&bytes);
        let _ = read_object_headers(&mut r).unwrap();
        let count_at = r.position();
        bytes[count_at..count_at + 4].copy_from_slice(&2u32.to_le_bytes());

        let mut r = ByteReader::new(&bytes);
        let mut back = read_object_headers(&mut r).unwrap();
        let err = read_object_bodies(&mut r, &mut back).unwrap_err();
        assert!(matches!(
            err,
            PersistError::ObjectCountMismatch {
                headers: 1,
                bodies: 2
            }
        ));
    }

    #[test]
    fn test_body_overrun_rejected() {
        let objects = vec![sample_component()];
        let mut w = ByteWriter::new();
        write_object_headers(&mut w, &objects);
        write_object_bodies(&mut w, &objects).unwrap();
        let mut bytes = w.into_bytes();

        // shrink the declared body size below what the property list needs
        let mut r = ByteReader::new(&bytes);
        let _ = read_object_headers(&mut r).unwrap();
        let size_at = r.position() + 4;
        bytes[size_at..size_at + 4].copy_from_slice(&1u32.to_le_bytes());

        let mut r = ByteReader::new(&bytes);
        let mut back = read_object_headers(&mut r).unwrap();
        let err = read_object_bodies(&mut r, &mut back).unwrap_err();
        assert!(matches!(err, PersistError::BodyLengthMismatch { .. }));
    }

    #[test]
    fn test_unknown_object_kind_rejected() {
        let mut w = ByteWriter::new();
        w.write_u32(1);
        w.write_u32(7);
        let err = read_object_headers(&mut ByteReader::new(w.as_slice())).unwrap_err();
        assert!(matches!(err, PersistError::MalformedRecord { .. }));
    }
}
