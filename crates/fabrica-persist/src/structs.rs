//! Struct payload dispatcher.
//!
//! Well-known struct types resolve through a static registry of
//! decode/encode pairs keyed by the type string. Anything not in the
//! registry round-trips as a generic nested property list, which is what
//! lets new game versions pass through without code changes here.

use crate::cursor::{ByteReader, ByteWriter};
use crate::error::PersistError;
use crate::property::{
    read_object_reference, read_property_list, write_object_reference, write_property_list,
};
use fabrica_core::{AccountIdEntry, StructPayload};
use glam::{DQuat, DVec2, DVec3, DVec4, IVec2, IVec3, Quat, Vec2, Vec3, Vec4};

type DecodeFn = fn(&mut ByteReader<'_>, bool) -> Result<StructPayload, PersistError>;
type EncodeFn = fn(&mut ByteWriter, &StructPayload) -> Result<(), PersistError>;

pub struct StructCodec {
    pub struct_type: &'static str,
    decode: DecodeFn,
    encode: EncodeFn,
}

/// Registry of well-known struct payload codecs.
pub static STRUCT_REGISTRY: &[StructCodec] = &[
    StructCodec { struct_type: "Vector", decode: decode_vector, encode: encode_vector },
    StructCodec { struct_type: "Rotator", decode: decode_rotator, encode: encode_rotator },
    StructCodec { struct_type: "Vector2D", decode: decode_vector2d, encode: encode_vector2d },
    StructCodec { struct_type: "Vector4", decode: decode_vector4, encode: encode_vector4 },
    StructCodec { struct_type: "Quat", decode: decode_quat, encode: encode_quat },
    StructCodec { struct_type: "Color", decode: decode_color, encode: encode_color },
    StructCodec { struct_type: "LinearColor", decode: decode_linear_color, encode: encode_linear_color },
    StructCodec { struct_type: "Transform", decode: decode_transform, encode: encode_transform },
    StructCodec { struct_type: "Box", decode: decode_box, encode: encode_box },
    StructCodec { struct_type: "IntPoint", decode: decode_int_point, encode: encode_int_point },
    StructCodec { struct_type: "IntVector", decode: decode_int_vector, encode: encode_int_vector },
    StructCodec { struct_type: "DateTime", decode: decode_date_time, encode: encode_date_time },
    StructCodec { struct_type: "Guid", decode: decode_guid, encode: encode_guid },
    StructCodec { struct_type: "FluidBox", decode: decode_fluid_box, encode: encode_fluid_box },
    StructCodec { struct_type: "RailroadTrackPosition", decode: decode_railroad, encode: encode_railroad },
    StructCodec { struct_type: "InventoryItem", decode: decode_inventory_item, encode: encode_inventory_item },
    StructCodec { struct_type: "ClientIdentityInfo", decode: decode_client_identity, encode: encode_client_identity },
    StructCodec { struct_type: "ScannableResourcePair", decode: decode_scannable_pair, encode: encode_scannable_pair },
    StructCodec { struct_type: "FICFrameRange", decode: decode_fic_frame_range, encode: encode_fic_frame_range },
    StructCodec { struct_type: "SpawnData", decode: decode_spawn_data, encode: encode_spawn_data },
    StructCodec { struct_type: "PhaseCost", decode: decode_phase_cost, encode: encode_phase_cost },
];

/// Vector-family struct properties serialized in 32-bit floats, keyed by
/// struct type and carrying property name. Everything else in the family
/// uses doubles. This table cannot be inferred from the byte stream and is
/// maintained alongside game-version updates.
const FLOAT_PRECISION_HINTS: &[(&str, &str)] = &[
    ("Vector", "SpawnLocation"),
    ("Vector", "Origin"),
    ("Vector", "BoxExtent"),
    ("Rotator", "SpawnRotation"),
    ("Vector2D", "LowerLeftCorner"),
    ("Vector2D", "UpperRightCorner"),
    ("Quat", "CachedBoneRotation"),
];

pub fn is_float_hinted(struct_type: &str, property_name: &str) -> bool {
    FLOAT_PRECISION_HINTS
        .iter()
        .any(|(s, p)| *s == struct_type && *p == property_name)
}

fn lookup(struct_type: &str) -> Option<&'static StructCodec> {
    STRUCT_REGISTRY.iter().find(|c| c.struct_type == struct_type)
}

/// Decode a struct body. `property_name` feeds the precision hint table.
pub fn read_struct_payload(
    r: &mut ByteReader<'_>,
    struct_type: &str,
    property_name: &str,
) -> Result<StructPayload, PersistError> {
    match lookup(struct_type) {
        Some(codec) => (codec.decode)(r, is_float_hinted(struct_type, property_name)),
        None => {
            log::debug!("no codec for struct type `{struct_type}`, reading a generic property list");
            Ok(StructPayload::Properties(read_property_list(r)?))
        }
    }
}

/// Encode a struct body. Typed payloads go through their registered
/// emitter; generic payloads mirror the fallback decoder.
pub fn write_struct_payload(
    w: &mut ByteWriter,
    struct_type: &str,
    payload: &StructPayload,
) -> Result<(), PersistError> {
    if let StructPayload::Properties(list) = payload {
        return write_property_list(w, list);
    }
    match lookup(struct_type) {
        Some(codec) => (codec.encode)(w, payload),
        None => Err(variant_mismatch(w, struct_type)),
    }
}

fn variant_mismatch(w: &ByteWriter, struct_type: &str) -> PersistError {
    PersistError::MalformedRecord {
        context: struct_type.to_owned(),
        position: w.position(),
        reason: "payload variant does not match the struct type".to_owned(),
    }
}

fn decode_vector(r: &mut ByteReader<'_>, float: bool) -> Result<StructPayload, PersistError> {
    if float {
        Ok(StructPayload::VectorF(Vec3::new(
            r.read_f32()?,
            r.read_f32()?,
            r.read_f32()?,
        )))
    } else {
        Ok(StructPayload::Vector(DVec3::new(
            r.read_f64()?,
            r.read_f64()?,
            r.read_f64()?,
        )))
    }
}

fn encode_vector(w: &mut ByteWriter, payload: &StructPayload) -> Result<(), PersistError> {
    match payload {
        StructPayload::Vector(v) => {
            w.write_f64(v.x);
            w.write_f64(v.y);
            w.write_f64(v.z);
            Ok(())
        }
        StructPayload::VectorF(v) => {
            w.write_f32(v.x);
            w.write_f32(v.y);
            w.write_f32(v.z);
            Ok(())
        }
        _ => Err(variant_mismatch(w, "Vector")),
    }
}

fn decode_rotator(r: &mut ByteReader<'_>, float: bool) -> Result<StructPayload, PersistError> {
    Ok(match decode_vector(r, float)? {
        StructPayload::Vector(v) => StructPayload::Rotator(v),
        StructPayload::VectorF(v) => StructPayload::RotatorF(v),
        other => other,
    })
}

fn encode_rotator(w: &mut ByteWriter, payload: &StructPayload) -> Result<(), PersistError> {
    match payload {
        StructPayload::Rotator(v) => encode_vector(w, &StructPayload::Vector(*v)),
        StructPayload::RotatorF(v) => encode_vector(w, &StructPayload::VectorF(*v)),
        _ => Err(variant_mismatch(w, "Rotator")),
    }
}

fn decode_vector2d(r: &mut ByteReader<'_>, float: bool) -> Result<StructPayload, PersistError> {
    if float {
        Ok(StructPayload::Vector2DF(Vec2::new(
            r.read_f32()?,
            r.read_f32()?,
        )))
    } else {
        Ok(StructPayload::Vector2D(DVec2::new(
            r.read_f64()?,
            r.read_f64()?,
        )))
    }
}

fn encode_vector2d(w: &mut ByteWriter, payload: &StructPayload) -> Result<(), PersistError> {
    match payload {
        StructPayload::Vector2D(v) => {
            w.write_f64(v.x);
            w.write_f64(v.y);
            Ok(())
        }
        StructPayload::Vector2DF(v) => {
            w.write_f32(v.x);
            w.write_f32(v.y);
            Ok(())
        }
        _ => Err(variant_mismatch(w, "Vector2D")),
    }
}

fn decode_vector4(r: &mut ByteReader<'_>, float: bool) -> Result<StructPayload, PersistError> {
    if float {
        Ok(StructPayload::Vector4F(Vec4::new(
            r.read_f32()?,
            r.read_f32()?,
            r.read_f32()?,
            r.read_f32()?,
        )))
    } else {
        Ok(StructPayload::Vector4(DVec4::new(
            r.read_f64()?,
            r.read_f64()?,
            r.read_f64()?,
            r.read_f64()?,
        )))
    }
}

fn encode_vector4(w: &mut ByteWriter, payload: &StructPayload) -> Result<(), PersistError> {
    match payload {
        StructPayload::Vector4(v) => {
            w.write_f64(v.x);
            w.write_f64(v.y);
            w.write_f64(v.z);
            w.write_f64(v.w);
            Ok(())
        }
        StructPayload::Vector4F(v) => {
            w.write_f32(v.x);
            w.write_f32(v.y);
            w.write_f32(v.z);
            w.write_f32(v.w);
            Ok(())
        }
        _ => Err(variant_mismatch(w, "Vector4")),
    }
}

fn decode_quat(r: &mut ByteReader<'_>, float: bool) -> Result<StructPayload, PersistError> {
    if float {
        Ok(StructPayload::QuatF(Quat::from_xyzw(
            r.read_f32()?,
            r.read_f32()?,
            r.read_f32()?,
            r.read_f32()?,
        )))
    } else {
        Ok(StructPayload::Quat(DQuat::from_xyzw(
            r.read_f64()?,
            r.read_f64()?,
            r.read_f64()?,
            r.read_f64()?,
        )))
    }
}

fn encode_quat(w: &mut ByteWriter, payload: &StructPayload) -> Result<(), PersistError> {
    match payload {
        StructPayload::Quat(q) => {
            w.write_f64(q.x);
            w.write_f64(q.y);
            w.write_f64(q.z);
            w.write_f64(q.w);
            Ok(())
        }
        StructPayload::QuatF(q) => {
            w.write_f32(q.x);
            w.write_f32(q.y);
            w.write_f32(q.z);
            w.write_f32(q.w);
            Ok(())
        }
        _ => Err(variant_mismatch(w, "Quat")),
    }
}

fn decode_color(r: &mut ByteReader<'_>, _float: bool) -> Result<StructPayload, PersistError> {
    Ok(StructPayload::Color {
        b: r.read_u8()?,
        g: r.read_u8()?,
        r: r.read_u8()?,
        a: r.read_u8()?,
    })
}

fn encode_color(w: &mut ByteWriter, payload: &StructPayload) -> Result<(), PersistError> {
    match payload {
        StructPayload::Color { b, g, r, a } => {
            w.write_u8(*b);
            w.write_u8(*g);
            w.write_u8(*r);
            w.write_u8(*a);
            Ok(())
        }
        _ => Err(variant_mismatch(w, "Color")),
    }
}

fn decode_linear_color(
    r: &mut ByteReader<'_>,
    _float: bool,
) -> Result<StructPayload, PersistError> {
    Ok(StructPayload::LinearColor(Vec4::new(
        r.read_f32()?,
        r.read_f32()?,
        r.read_f32()?,
        r.read_f32()?,
    )))
}

fn encode_linear_color(w: &mut ByteWriter, payload: &StructPayload) -> Result<(), PersistError> {
    match payload {
        StructPayload::LinearColor(c) => {
            w.write_f32(c.x);
            w.write_f32(c.y);
            w.write_f32(c.z);
            w.write_f32(c.w);
            Ok(())
        }
        _ => Err(variant_mismatch(w, "LinearColor")),
    }
}

fn decode_transform(r: &mut ByteReader<'_>, _float: bool) -> Result<StructPayload, PersistError> {
    let translation = if r.read_bool_byte()? {
        Some(DVec3::new(r.read_f64()?, r.read_f64()?, r.read_f64()?))
    } else {
        None
    };
    let rotation = if r.read_bool_byte()? {
        Some(DQuat::from_xyzw(
            r.read_f64()?,
            r.read_f64()?,
            r.read_f64()?,
            r.read_f64()?,
        ))
    } else {
        None
    };
    let scale = if r.read_bool_byte()? {
        Some(DVec3::new(r.read_f64()?, r.read_f64()?, r.read_f64()?))
    } else {
        None
    };
    Ok(StructPayload::Transform {
        translation,
        rotation,
        scale,
    })
}

fn encode_transform(w: &mut ByteWriter, payload: &StructPayload) -> Result<(), PersistError> {
    let StructPayload::Transform {
        translation,
        rotation,
        scale,
    } = payload
    else {
        return Err(variant_mismatch(w, "Transform"));
    };
    match translation {
        Some(v) => {
            w.write_bool_byte(true);
            w.write_f64(v.x);
            w.write_f64(v.y);
            w.write_f64(v.z);
        }
        None => w.write_bool_byte(false),
    }
    match rotation {
        Some(q) => {
            w.write_bool_byte(true);
            w.write_f64(q.x);
            w.write_f64(q.y);
            w.write_f64(q.z);
            w.write_f64(q.w);
        }
        None => w.write_bool_byte(false),
    }
    match scale {
        Some(v) => {
            w.write_bool_byte(true);
            w.write_f64(v.x);
            w.write_f64(v.y);
            w.write_f64(v.z);
        }
        None => w.write_bool_byte(false),
    }
    Ok(())
}

fn decode_box(r: &mut ByteReader<'_>, _float: bool) -> Result<StructPayload, PersistError> {
    Ok(StructPayload::Box {
        min: DVec3::new(r.read_f64()?, r.read_f64()?, r.read_f64()?),
        max: DVec3::new(r.read_f64()?, r.read_f64()?, r.read_f64()?),
        is_valid: r.read_u8()?,
    })
}

fn encode_box(w: &mut ByteWriter, payload: &StructPayload) -> Result<(), PersistError> {
    match payload {
        StructPayload::Box { min, max, is_valid } => {
            w.write_f64(min.x);
            w.write_f64(min.y);
            w.write_f64(min.z);
            w.write_f64(max.x);
            w.write_f64(max.y);
            w.write_f64(max.z);
            w.write_u8(*is_valid);
            Ok(())
        }
        _ => Err(variant_mismatch(w, "Box")),
    }
}

fn decode_int_point(r: &mut ByteReader<'_>, _float: bool) -> Result<StructPayload, PersistError> {
    Ok(StructPayload::IntPoint(IVec2::new(
        r.read_i32()?,
        r.read_i32()?,
    )))
}

fn encode_int_point(w: &mut ByteWriter, payload: &StructPayload) -> Result<(), PersistError> {
    match payload {
        StructPayload::IntPoint(p) => {
            w.write_i32(p.x);
            w.write_i32(p.y);
            Ok(())
        }
        _ => Err(variant_mismatch(w, "IntPoint")),
    }
}

fn decode_int_vector(r: &mut ByteReader<'_>, _float: bool) -> Result<StructPayload, PersistError> {
    Ok(StructPayload::IntVector(IVec3::new(
        r.read_i32()?,
        r.read_i32()?,
        r.read_i32()?,
    )))
}

fn encode_int_vector(w: &mut ByteWriter, payload: &StructPayload) -> Result<(), PersistError> {
    match payload {
        StructPayload::IntVector(v) => {
            w.write_i32(v.x);
            w.write_i32(v.y);
            w.write_i32(v.z);
            Ok(())
        }
        _ => Err(variant_mismatch(w, "IntVector")),
    }
}

fn decode_date_time(r: &mut ByteReader<'_>, _float: bool) -> Result<StructPayload, PersistError> {
    Ok(StructPayload::DateTime(r.read_i64()?))
}

fn encode_date_time(w: &mut ByteWriter, payload: &StructPayload) -> Result<(), PersistError> {
    match payload {
        StructPayload::DateTime(ticks) => {
            w.write_i64(*ticks);
            Ok(())
        }
        _ => Err(variant_mismatch(w, "DateTime")),
    }
}

fn decode_guid(r: &mut ByteReader<'_>, _float: bool) -> Result<StructPayload, PersistError> {
    Ok(StructPayload::Guid(r.read_guid()?))
}

fn encode_guid(w: &mut ByteWriter, payload: &StructPayload) -> Result<(), PersistError> {
    match payload {
        StructPayload::Guid(guid) => {
            w.write_guid(guid);
            Ok(())
        }
        _ => Err(variant_mismatch(w, "Guid")),
    }
}

fn decode_fluid_box(r: &mut ByteReader<'_>, _float: bool) -> Result<StructPayload, PersistError> {
    Ok(StructPayload::FluidBox(r.read_f32()?))
}

fn encode_fluid_box(w: &mut ByteWriter, payload: &StructPayload) -> Result<(), PersistError> {
    match payload {
        StructPayload::FluidBox(content) => {
            w.write_f32(*content);
            Ok(())
        }
        _ => Err(variant_mismatch(w, "FluidBox")),
    }
}

fn decode_railroad(r: &mut ByteReader<'_>, _float: bool) -> Result<StructPayload, PersistError> {
    Ok(StructPayload::RailroadTrackPosition {
        track: read_object_reference(r)?,
        offset: r.read_f32()?,
        forward: r.read_f32()?,
    })
}

fn encode_railroad(w: &mut ByteWriter, payload: &StructPayload) -> Result<(), PersistError> {
    match payload {
        StructPayload::RailroadTrackPosition {
            track,
            offset,
            forward,
        } => {
            write_object_reference(w, track);
            w.write_f32(*offset);
            w.write_f32(*forward);
            Ok(())
        }
        _ => Err(variant_mismatch(w, "RailroadTrackPosition")),
    }
}

fn decode_inventory_item(
    r: &mut ByteReader<'_>,
    _float: bool,
) -> Result<StructPayload, PersistError> {
    Ok(StructPayload::InventoryItem {
        item_name: r.read_string()?,
        item_state: read_object_reference(r)?,
    })
}

fn encode_inventory_item(w: &mut ByteWriter, payload: &StructPayload) -> Result<(), PersistError> {
    match payload {
        StructPayload::InventoryItem {
            item_name,
            item_state,
        } => {
            w.write_string(item_name);
            write_object_reference(w, item_state);
            Ok(())
        }
        _ => Err(variant_mismatch(w, "InventoryItem")),
    }
}

fn decode_client_identity(
    r: &mut ByteReader<'_>,
    _float: bool,
) -> Result<StructPayload, PersistError> {
    let identity_id = r.read_string()?;
    let count = r.read_u32()?;
    let mut accounts = Vec::with_capacity((count as usize).min(r.remaining()));
    for _ in 0..count {
        let kind = r.read_u8()?;
        let len = r.read_u32()?;
        accounts.push(AccountIdEntry {
            kind,
            data: r.read_bytes(len as usize)?.to_vec(),
        });
    }
    Ok(StructPayload::ClientIdentityInfo {
        identity_id,
        accounts,
    })
}

fn encode_client_identity(w: &mut ByteWriter, payload: &StructPayload) -> Result<(), PersistError> {
    match payload {
        StructPayload::ClientIdentityInfo {
            identity_id,
            accounts,
        } => {
            w.write_string(identity_id);
            w.write_u32(accounts.len() as u32);
            for account in accounts {
                w.write_u8(account.kind);
                w.write_u32(account.data.len() as u32);
                w.write_bytes(&account.data);
            }
            Ok(())
        }
        _ => Err(variant_mismatch(w, "ClientIdentityInfo")),
    }
}

fn decode_scannable_pair(
    r: &mut ByteReader<'_>,
    _float: bool,
) -> Result<StructPayload, PersistError> {
    Ok(StructPayload::ScannableResourcePair {
        resource: read_object_reference(r)?,
        scanner: read_object_reference(r)?,
    })
}

fn encode_scannable_pair(w: &mut ByteWriter, payload: &StructPayload) -> Result<(), PersistError> {
    match payload {
        StructPayload::ScannableResourcePair { resource, scanner } => {
            write_object_reference(w, resource);
            write_object_reference(w, scanner);
            Ok(())
        }
        _ => Err(variant_mismatch(w, "ScannableResourcePair")),
    }
}

fn decode_fic_frame_range(
    r: &mut ByteReader<'_>,
    _float: bool,
) -> Result<StructPayload, PersistError> {
    Ok(StructPayload::FicFrameRange {
        begin: r.read_i64()?,
        end: r.read_i64()?,
    })
}

fn encode_fic_frame_range(w: &mut ByteWriter, payload: &StructPayload) -> Result<(), PersistError> {
    match payload {
        StructPayload::FicFrameRange { begin, end } => {
            w.write_i64(*begin);
            w.write_i64(*end);
            Ok(())
        }
        _ => Err(variant_mismatch(w, "FICFrameRange")),
    }
}

fn decode_spawn_data(r: &mut ByteReader<'_>, _float: bool) -> Result<StructPayload, PersistError> {
    Ok(StructPayload::SpawnData {
        location: DVec3::new(r.read_f64()?, r.read_f64()?, r.read_f64()?),
        rotation: DQuat::from_xyzw(
            r.read_f64()?,
            r.read_f64()?,
            r.read_f64()?,
            r.read_f64()?,
        ),
        spawned_entity: read_object_reference(r)?,
    })
}

fn encode_spawn_data(w: &mut ByteWriter, payload: &StructPayload) -> Result<(), PersistError> {
    match payload {
        StructPayload::SpawnData {
            location,
            rotation,
            spawned_entity,
        } => {
            w.write_f64(location.x);
            w.write_f64(location.y);
            w.write_f64(location.z);
            w.write_f64(rotation.x);
            w.write_f64(rotation.y);
            w.write_f64(rotation.z);
            w.write_f64(rotation.w);
            write_object_reference(w, spawned_entity);
            Ok(())
        }
        _ => Err(variant_mismatch(w, "SpawnData")),
    }
}

fn decode_phase_cost(r: &mut ByteReader<'_>, _float: bool) -> Result<StructPayload, PersistError> {
    Ok(StructPayload::PhaseCost {
        item_class: read_object_reference(r)?,
        amount: r.read_i32()?,
    })
}

fn encode_phase_cost(w: &mut ByteWriter, payload: &StructPayload) -> Result<(), PersistError> {
    match payload {
        StructPayload::PhaseCost { item_class, amount } => {
            write_object_reference(w, item_class);
            w.write_i32(*amount);
            Ok(())
        }
        _ => Err(variant_mismatch(w, "PhaseCost")),
    }
}
