//! The polymorphic property codec.
//!
//! Every property is a self-describing record: name, type tag, declared
//! payload length, array index, a type-specific header, one zero
//! terminator byte, then the counted payload body. A list ends at the
//! reserved name `None`. The declared length is verified against the bytes
//! actually consumed on decode and patched in after the body on encode, so
//! the two can never drift apart silently.

use crate::cursor::{ByteReader, ByteWriter};
use crate::error::PersistError;
use crate::format::PROPERTY_LIST_END;
use crate::structs;
use crate::text;
use fabrica_core::{
    ArrayValue, ByteValue, Guid, ObjectReference, Property, PropertyValue, ValueBody,
};

/// Read a property list terminated by the `None` sentinel.
pub fn read_property_list(r: &mut ByteReader<'_>) -> Result<Vec<Property>, PersistError> {
    let mut out = Vec::new();
    while let Some(property) = read_property(r)? {
        out.push(property);
    }
    Ok(out)
}

/// Write every property followed by the `None` sentinel.
pub fn write_property_list(w: &mut ByteWriter, properties: &[Property]) -> Result<(), PersistError> {
    for property in properties {
        write_property(w, property)?;
    }
    w.write_string(PROPERTY_LIST_END);
    Ok(())
}

/// Read one property record; `None` when the list terminator is reached.
pub fn read_property(r: &mut ByteReader<'_>) -> Result<Option<Property>, PersistError> {
    let name = r.read_string()?;
    if name == PROPERTY_LIST_END {
        return Ok(None);
    }
    let tag_at = r.position();
    let tag = r.read_string()?;
    let declared = r.read_u32()?;
    let index = r.read_u32()?;

    let header = read_type_header(r, &tag, tag_at)?;
    expect_terminator(r, &name)?;

    let body_start = r.position();
    let (guid, value) = read_body(r, header, &name)?;
    let consumed = (r.position() - body_start) as u64;
    if consumed != u64::from(declared) {
        return Err(PersistError::BodyLengthMismatch {
            context: format!("property `{name}`"),
            declared: u64::from(declared),
            consumed,
        });
    }

    Ok(Some(Property {
        name,
        index,
        guid,
        value,
    }))
}

/// Write one property record, patching the declared payload length once
/// the body has been serialized.
pub fn write_property(w: &mut ByteWriter, property: &Property) -> Result<(), PersistError> {
    if property.name == PROPERTY_LIST_END {
        return Err(PersistError::MalformedRecord {
            context: property.name.clone(),
            position: w.position(),
            reason: "the list terminator name is reserved".to_owned(),
        });
    }
    w.write_string(&property.name);
    w.write_string(property.type_tag());
    let size_at = w.reserve_u32();
    w.write_u32(property.index);

    write_type_header(w, property);
    w.write_u8(0);

    let body_start = w.position();
    write_body(w, &property.value)?;
    w.patch_u32(size_at, (w.position() - body_start) as u32);
    Ok(())
}

/// Everything between the array index and the zero terminator, per tag.
enum TypeHeader {
    Scalar { tag: String, guid: Option<Guid> },
    Bool { value: bool, guid: Option<Guid> },
    Byte { enum_name: String },
    Enum { enum_type: String },
    Array { inner_type: String, guid: Option<Guid> },
    Set { inner_type: String, guid: Option<Guid> },
    Map { key_type: String, value_type: String, guid: Option<Guid> },
    Struct { struct_type: String, struct_guid: Guid, guid: Option<Guid> },
}

fn read_type_header(
    r: &mut ByteReader<'_>,
    tag: &str,
    tag_at: usize,
) -> Result<TypeHeader, PersistError> {
    Ok(match tag {
        "ArrayProperty" => TypeHeader::Array {
            inner_type: r.read_string()?,
            guid: read_guid_info(r)?,
        },
        "SetProperty" => TypeHeader::Set {
            inner_type: r.read_string()?,
            guid: read_guid_info(r)?,
        },
        "MapProperty" => TypeHeader::Map {
            key_type: r.read_string()?,
            value_type: r.read_string()?,
            guid: read_guid_info(r)?,
        },
        "ByteProperty" => TypeHeader::Byte {
            enum_name: r.read_string()?,
        },
        "EnumProperty" => TypeHeader::Enum {
            enum_type: r.read_string()?,
        },
        "StructProperty" => TypeHeader::Struct {
            struct_type: r.read_string()?,
            struct_guid: r.read_guid()?,
            guid: read_guid_info(r)?,
        },
        "BoolProperty" => TypeHeader::Bool {
            value: r.read_bool_byte()?,
            guid: read_guid_info(r)?,
        },
        "Int8Property" | "IntProperty" | "Int64Property" | "UInt8Property" | "UInt32Property"
        | "UInt64Property" | "FloatProperty" | "DoubleProperty" | "StrProperty"
        | "NameProperty" | "ObjectProperty" | "SoftObjectProperty" | "TextProperty" => {
            TypeHeader::Scalar {
                tag: tag.to_owned(),
                guid: read_guid_info(r)?,
            }
        }
        _ => {
            return Err(PersistError::UnknownTypeTag {
                position: tag_at,
                tag: tag.to_owned(),
            })
        }
    })
}

fn write_type_header(w: &mut ByteWriter, property: &Property) {
    match &property.value {
        PropertyValue::Bool(value) => {
            w.write_bool_byte(*value);
            write_guid_info(w, property.guid);
        }
        PropertyValue::Array(array) => {
            let inner = match array {
                ArrayValue::Values { inner_type, .. } => inner_type.as_str(),
                ArrayValue::Structs { .. } => "StructProperty",
            };
            w.write_string(inner);
            write_guid_info(w, property.guid);
        }
        PropertyValue::Set { inner_type, .. } => {
            w.write_string(inner_type);
            write_guid_info(w, property.guid);
        }
        PropertyValue::Map {
            key_type,
            value_type,
            ..
        } => {
            w.write_string(key_type);
            w.write_string(value_type);
            write_guid_info(w, property.guid);
        }
        PropertyValue::Byte(value) => {
            let enum_name = match value {
                ByteValue::Raw(_) => "None",
                ByteValue::Enum { enum_name, .. } => enum_name.as_str(),
            };
            w.write_string(enum_name);
        }
        PropertyValue::Enum { enum_type, .. } => {
            w.write_string(enum_type);
        }
        PropertyValue::Struct {
            struct_type,
            struct_guid,
            ..
        } => {
            w.write_string(struct_type);
            w.write_guid(struct_guid);
            write_guid_info(w, property.guid);
        }
        _ => write_guid_info(w, property.guid),
    }
}

fn read_body(
    r: &mut ByteReader<'_>,
    header: TypeHeader,
    name: &str,
) -> Result<(Option<Guid>, PropertyValue), PersistError> {
    Ok(match header {
        TypeHeader::Bool { value, guid } => (guid, PropertyValue::Bool(value)),
        TypeHeader::Scalar { tag, guid } => (guid, read_scalar_body(r, &tag)?),
        TypeHeader::Byte { enum_name } => {
            let value = if enum_name == "None" {
                ByteValue::Raw(r.read_u8()?)
            } else {
                ByteValue::Enum {
                    enum_name,
                    value: r.read_string()?,
                }
            };
            (None, PropertyValue::Byte(value))
        }
        TypeHeader::Enum { enum_type } => (
            None,
            PropertyValue::Enum {
                enum_type,
                value: r.read_string()?,
            },
        ),
        TypeHeader::Array { inner_type, guid } => {
            (guid, PropertyValue::Array(read_array_body(r, inner_type, name)?))
        }
        TypeHeader::Set { inner_type, guid } => {
            let count = r.read_u32()?;
            let reserve_at = r.position();
            let reserve = r.read_u32()?;
            if reserve != 0 {
                return Err(PersistError::MalformedRecord {
                    context: name.to_owned(),
                    position: reserve_at,
                    reason: format!("nonzero set reserve field {reserve}"),
                });
            }
            let mut elements = Vec::with_capacity((count as usize).min(r.remaining()));
            for _ in 0..count {
                elements.push(read_element_body(r, &inner_type)?);
            }
            (guid, PropertyValue::Set { inner_type, elements })
        }
        TypeHeader::Map {
            key_type,
            value_type,
            guid,
        } => {
            let reserve_at = r.position();
            let reserve = r.read_u32()?;
            if reserve != 0 {
                return Err(PersistError::MalformedRecord {
                    context: name.to_owned(),
                    position: reserve_at,
                    reason: format!("nonzero map reserve field {reserve}"),
                });
            }
            let count = r.read_u32()?;
            let mut entries = Vec::with_capacity((count as usize).min(r.remaining()));
            for _ in 0..count {
                let key = read_element_body(r, &key_type)?;
                let value = read_element_body(r, &value_type)?;
                entries.push((key, value));
            }
            (
                guid,
                PropertyValue::Map {
                    key_type,
                    value_type,
                    entries,
                },
            )
        }
        TypeHeader::Struct {
            struct_type,
            struct_guid,
            guid,
        } => {
            let payload = structs::read_struct_payload(r, &struct_type, name)?;
            (
                guid,
                PropertyValue::Struct {
                    struct_type,
                    struct_guid,
                    payload,
                },
            )
        }
    })
}

fn read_scalar_body(r: &mut ByteReader<'_>, tag: &str) -> Result<PropertyValue, PersistError> {
    Ok(match tag {
        "Int8Property" => PropertyValue::Int8(r.read_i8()?),
        "IntProperty" => PropertyValue::Int32(r.read_i32()?),
        "Int64Property" => PropertyValue::Int64(r.read_i64()?),
        "UInt8Property" => PropertyValue::UInt8(r.read_u8()?),
        "UInt32Property" => PropertyValue::UInt32(r.read_u32()?),
        "UInt64Property" => PropertyValue::UInt64(r.read_u64()?),
        "FloatProperty" => PropertyValue::Float(r.read_f32()?),
        "DoubleProperty" => PropertyValue::Double(r.read_f64()?),
        "StrProperty" => PropertyValue::Str(r.read_string()?),
        "NameProperty" => PropertyValue::Name(r.read_string()?),
        "ObjectProperty" => PropertyValue::Object(read_object_reference(r)?),
        "SoftObjectProperty" => PropertyValue::SoftObject {
            reference: read_object_reference(r)?,
            index: r.read_u32()?,
        },
        "TextProperty" => PropertyValue::Text(text::read_text(r)?),
        // read_type_header only classifies the tags above as scalars
        other => unreachable!("scalar body for tag {other}"),
    })
}

fn write_body(w: &mut ByteWriter, value: &PropertyValue) -> Result<(), PersistError> {
    match value {
        PropertyValue::Bool(_) => {}
        PropertyValue::Int8(v) => w.write_i8(*v),
        PropertyValue::Int32(v) => w.write_i32(*v),
        PropertyValue::Int64(v) => w.write_i64(*v),
        PropertyValue::UInt8(v) => w.write_u8(*v),
        PropertyValue::UInt32(v) => w.write_u32(*v),
        PropertyValue::UInt64(v) => w.write_u64(*v),
        PropertyValue::Float(v) => w.write_f32(*v),
        PropertyValue::Double(v) => w.write_f64(*v),
        PropertyValue::Str(s) | PropertyValue::Name(s) => w.write_string(s),
        PropertyValue::Object(reference) => write_object_reference(w, reference),
        PropertyValue::SoftObject { reference, index } => {
            write_object_reference(w, reference);
            w.write_u32(*index);
        }
        PropertyValue::Enum { value, .. } => w.write_string(value),
        PropertyValue::Text(entry) => text::write_text(w, entry),
        PropertyValue::Byte(ByteValue::Raw(b)) => w.write_u8(*b),
        PropertyValue::Byte(ByteValue::Enum { value, .. }) => w.write_string(value),
        PropertyValue::Array(array) => write_array_body(w, array)?,
        PropertyValue::Set { elements, .. } => {
            w.write_u32(elements.len() as u32);
            w.write_u32(0);
            for element in elements {
                write_element_body(w, element)?;
            }
        }
        PropertyValue::Map { entries, .. } => {
            w.write_u32(0);
            w.write_u32(entries.len() as u32);
            for (key, value) in entries {
                write_element_body(w, key)?;
                write_element_body(w, value)?;
            }
        }
        PropertyValue::Struct {
            struct_type,
            payload,
            ..
        } => structs::write_struct_payload(w, struct_type, payload)?,
    }
    Ok(())
}

fn read_array_body(
    r: &mut ByteReader<'_>,
    inner_type: String,
    name: &str,
) -> Result<ArrayValue, PersistError> {
    let count = r.read_u32()?;
    if inner_type == "StructProperty" {
        let element_name = r.read_string()?;
        let struct_type = r.read_string()?;
        let declared = r.read_u32()?;
        let index_at = r.position();
        let index = r.read_u32()?;
        if index != 0 {
            return Err(PersistError::MalformedRecord {
                context: name.to_owned(),
                position: index_at,
                reason: format!("nonzero struct array index {index}"),
            });
        }
        let struct_guid = r.read_guid()?;
        let guid = read_guid_info(r)?;

        let body_start = r.position();
        let mut elements = Vec::with_capacity((count as usize).min(r.remaining()));
        for _ in 0..count {
            elements.push(structs::read_struct_payload(r, &struct_type, name)?);
        }
        let consumed = (r.position() - body_start) as u64;
        if consumed != u64::from(declared) {
            return Err(PersistError::BodyLengthMismatch {
                context: format!("struct array `{name}`"),
                declared: u64::from(declared),
                consumed,
            });
        }
        Ok(ArrayValue::Structs {
            element_name,
            struct_type,
            struct_guid,
            guid,
            elements,
        })
    } else {
        let mut elements = Vec::with_capacity((count as usize).min(r.remaining()));
        for _ in 0..count {
            elements.push(read_element_body(r, &inner_type)?);
        }
        Ok(ArrayValue::Values {
            inner_type,
            elements,
        })
    }
}

fn write_array_body(w: &mut ByteWriter, array: &ArrayValue) -> Result<(), PersistError> {
    match array {
        ArrayValue::Values { elements, .. } => {
            w.write_u32(elements.len() as u32);
            for element in elements {
                write_element_body(w, element)?;
            }
        }
        ArrayValue::Structs {
            element_name,
            struct_type,
            struct_guid,
            guid,
            elements,
        } => {
            w.write_u32(elements.len() as u32);
            w.write_string(element_name);
            w.write_string(struct_type);
            let size_at = w.reserve_u32();
            w.write_u32(0);
            w.write_guid(struct_guid);
            write_guid_info(w, *guid);

            let body_start = w.position();
            for element in elements {
                structs::write_struct_payload(w, struct_type, element)?;
            }
            w.patch_u32(size_at, (w.position() - body_start) as u32);
        }
    }
    Ok(())
}

/// Bare element body for array/set elements and map keys/values. The
/// container's inner type tag drives the decode; unknown tags are fatal
/// because an unsized element cannot be skipped.
fn read_element_body(r: &mut ByteReader<'_>, tag: &str) -> Result<ValueBody, PersistError> {
    let at = r.position();
    Ok(match tag {
        "BoolProperty" => ValueBody::Bool(r.read_bool_byte()?),
        "Int8Property" => ValueBody::Int8(r.read_i8()?),
        "IntProperty" => ValueBody::Int32(r.read_i32()?),
        "Int64Property" => ValueBody::Int64(r.read_i64()?),
        "UInt8Property" => ValueBody::UInt8(r.read_u8()?),
        "UInt32Property" => ValueBody::UInt32(r.read_u32()?),
        "UInt64Property" => ValueBody::UInt64(r.read_u64()?),
        "FloatProperty" => ValueBody::Float(r.read_f32()?),
        "DoubleProperty" => ValueBody::Double(r.read_f64()?),
        "StrProperty" | "NameProperty" | "EnumProperty" => ValueBody::Str(r.read_string()?),
        "ObjectProperty" => ValueBody::Object(read_object_reference(r)?),
        "SoftObjectProperty" => ValueBody::SoftObject {
            reference: read_object_reference(r)?,
            index: r.read_u32()?,
        },
        "ByteProperty" => ValueBody::Byte(r.read_u8()?),
        "TextProperty" => ValueBody::Text(text::read_text(r)?),
        "StructProperty" => ValueBody::Properties(read_property_list(r)?),
        other => {
            return Err(PersistError::UnknownTypeTag {
                position: at,
                tag: other.to_owned(),
            })
        }
    })
}

fn write_element_body(w: &mut ByteWriter, body: &ValueBody) -> Result<(), PersistError> {
    match body {
        ValueBody::Bool(v) => w.write_bool_byte(*v),
        ValueBody::Int8(v) => w.write_i8(*v),
        ValueBody::Int32(v) => w.write_i32(*v),
        ValueBody::Int64(v) => w.write_i64(*v),
        ValueBody::UInt8(v) => w.write_u8(*v),
        ValueBody::UInt32(v) => w.write_u32(*v),
        ValueBody::UInt64(v) => w.write_u64(*v),
        ValueBody::Float(v) => w.write_f32(*v),
        ValueBody::Double(v) => w.write_f64(*v),
        ValueBody::Str(s) => w.write_string(s),
        ValueBody::Object(reference) => write_object_reference(w, reference),
        ValueBody::SoftObject { reference, index } => {
            write_object_reference(w, reference);
            w.write_u32(*index);
        }
        ValueBody::Byte(b) => w.write_u8(*b),
        ValueBody::Text(entry) => text::write_text(w, entry),
        ValueBody::Properties(list) => write_property_list(w, list)?,
    }
    Ok(())
}

pub(crate) fn read_object_reference(
    r: &mut ByteReader<'_>,
) -> Result<ObjectReference, PersistError> {
    Ok(ObjectReference {
        level_name: r.read_string()?,
        path_name: r.read_string()?,
    })
}

pub(crate) fn write_object_reference(w: &mut ByteWriter, reference: &ObjectReference) {
    w.write_string(&reference.level_name);
    w.write_string(&reference.path_name);
}

/// GUIDInfo: one flag byte, then a 16-byte GUID when the flag is 1.
pub(crate) fn read_guid_info(r: &mut ByteReader<'_>) -> Result<Option<Guid>, PersistError> {
    let at = r.position();
    match r.read_u8()? {
        0 => Ok(None),
        1 => Ok(Some(r.read_guid()?)),
        flag => Err(PersistError::MalformedGuid { position: at, flag }),
    }
}

pub(crate) fn write_guid_info(w: &mut ByteWriter, guid: Option<Guid>) {
    match guid {
        Some(guid) => {
            w.write_u8(1);
            w.write_guid(&guid);
        }
        None => w.write_u8(0),
    }
}

fn expect_terminator(r: &mut ByteReader<'_>, name: &str) -> Result<(), PersistError> {
    let at = r.position();
    let byte = r.read_u8()?;
    if byte != 0 {
        return Err(PersistError::MalformedRecord {
            context: name.to_owned(),
            position: at,
            reason: format!("expected zero terminator, found {byte:#04x}"),
        });
    }
    Ok(())
}
