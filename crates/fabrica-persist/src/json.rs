//! Debug-dump JSON emitter. 64-bit integers render as quoted decimal
//! strings, a zero with its sign bit set renders as the literal `-0`, and
//! non-finite floats render as `null`.

use fabrica_core::{
    ArrayValue, Blueprint, BlueprintConfig, ByteValue, ChunkSummary, ComponentObject,
    CompressionInfo, EntityObject, Guid, ItemAmount, Level, ObjectReference, PartitionCell,
    PartitionGrid, PartitionGrids, Property, PropertyValue, Save, SaveHeader, SceneObject,
    StructPayload, TextEntry, TextHistory, ValueBody,
};
use std::fmt::Write as _;

/// A minimal JSON value tree, shaped for this codec's numeric rules.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonValue {
    Null,
    Bool(bool),
    /// Fits in 32 bits (or is a count); emitted bare.
    Int(i64),
    /// 64-bit signed; emitted as a quoted decimal string.
    BigInt(i64),
    /// 64-bit unsigned; emitted as a quoted decimal string.
    BigUint(u64),
    F32(f32),
    F64(f64),
    Str(String),
    Array(Vec<JsonValue>),
    Object(Vec<(String, JsonValue)>),
}

impl JsonValue {
    fn object(fields: Vec<(&str, JsonValue)>) -> JsonValue {
        JsonValue::Object(
            fields
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v))
                .collect(),
        )
    }
}

/// Render a value tree. `indent` is the number of spaces per level; zero
/// produces compact output.
pub fn stringify(value: &JsonValue, indent: usize) -> String {
    let mut out = String::new();
    write_value(&mut out, value, indent, 0);
    out
}

fn write_value(out: &mut String, value: &JsonValue, indent: usize, depth: usize) {
    match value {
        JsonValue::Null => out.push_str("null"),
        JsonValue::Bool(true) => out.push_str("true"),
        JsonValue::Bool(false) => out.push_str("false"),
        JsonValue::Int(v) => {
            let _ = write!(out, "{v}");
        }
        JsonValue::BigInt(v) => {
            let _ = write!(out, "\"{v}\"");
        }
        JsonValue::BigUint(v) => {
            let _ = write!(out, "\"{v}\"");
        }
        JsonValue::F32(v) => {
            if v.is_nan() || v.is_infinite() {
                out.push_str("null");
            } else if *v == 0.0 && v.is_sign_negative() {
                out.push_str("-0");
            } else {
                let _ = write!(out, "{v}");
            }
        }
        JsonValue::F64(v) => {
            if v.is_nan() || v.is_infinite() {
                out.push_str("null");
            } else if *v == 0.0 && v.is_sign_negative() {
                out.push_str("-0");
            } else {
                let _ = write!(out, "{v}");
            }
        }
        JsonValue::Str(s) => write_escaped(out, s),
        JsonValue::Array(items) => {
            if items.is_empty() {
                out.push_str("[]");
                return;
            }
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                newline_and_pad(out, indent, depth + 1);
                write_value(out, item, indent, depth + 1);
            }
            newline_and_pad(out, indent, depth);
            out.push(']');
        }
        JsonValue::Object(fields) => {
            if fields.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push('{');
            for (i, (key, item)) in fields.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                newline_and_pad(out, indent, depth + 1);
                write_escaped(out, key);
                out.push(':');
                if indent > 0 {
                    out.push(' ');
                }
                write_value(out, item, indent, depth + 1);
            }
            newline_and_pad(out, indent, depth);
            out.push('}');
        }
    }
}

fn newline_and_pad(out: &mut String, indent: usize, depth: usize) {
    if indent > 0 {
        out.push('\n');
        for _ in 0..indent * depth {
            out.push(' ');
        }
    }
}

fn write_escaped(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn hex(bytes: &[u8]) -> JsonValue {
    let mut s = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(s, "{byte:02x}");
    }
    JsonValue::Str(s)
}

/// Conversion into the emitter's value tree.
pub trait ToJson {
    fn to_json(&self) -> JsonValue;
}

impl ToJson for Guid {
    fn to_json(&self) -> JsonValue {
        JsonValue::Str(self.to_hex())
    }
}

impl ToJson for ObjectReference {
    fn to_json(&self) -> JsonValue {
        JsonValue::object(vec![
            ("level_name", JsonValue::Str(self.level_name.clone())),
            ("path_name", JsonValue::Str(self.path_name.clone())),
        ])
    }
}

impl ToJson for Property {
    fn to_json(&self) -> JsonValue {
        let mut fields = vec![
            ("name".to_owned(), JsonValue::Str(self.name.clone())),
            ("type".to_owned(), JsonValue::Str(self.type_tag().to_owned())),
        ];
        if self.index != 0 {
            fields.push(("index".to_owned(), JsonValue::Int(i64::from(self.index))));
        }
        if let Some(guid) = &self.guid {
            fields.push(("guid".to_owned(), guid.to_json()));
        }
        fields.push(("value".to_owned(), self.value.to_json()));
        JsonValue::Object(fields)
    }
}

impl ToJson for PropertyValue {
    fn to_json(&self) -> JsonValue {
        match self {
            PropertyValue::Bool(v) => JsonValue::Bool(*v),
            PropertyValue::Int8(v) => JsonValue::Int(i64::from(*v)),
            PropertyValue::Int32(v) => JsonValue::Int(i64::from(*v)),
            PropertyValue::Int64(v) => JsonValue::BigInt(*v),
            PropertyValue::UInt8(v) => JsonValue::Int(i64::from(*v)),
            PropertyValue::UInt32(v) => JsonValue::Int(i64::from(*v)),
            PropertyValue::UInt64(v) => JsonValue::BigUint(*v),
            PropertyValue::Float(v) => JsonValue::F32(*v),
            PropertyValue::Double(v) => JsonValue::F64(*v),
            PropertyValue::Str(s) | PropertyValue::Name(s) => JsonValue::Str(s.clone()),
            PropertyValue::Object(reference) => reference.to_json(),
            PropertyValue::SoftObject { reference, index } => JsonValue::object(vec![
                ("reference", reference.to_json()),
                ("index", JsonValue::Int(i64::from(*index))),
            ]),
            PropertyValue::Enum { enum_type, value } => JsonValue::object(vec![
                ("enum_type", JsonValue::Str(enum_type.clone())),
                ("value", JsonValue::Str(value.clone())),
            ]),
            PropertyValue::Text(entry) => entry.to_json(),
            PropertyValue::Byte(ByteValue::Raw(b)) => JsonValue::Int(i64::from(*b)),
            PropertyValue::Byte(ByteValue::Enum { enum_name, value }) => JsonValue::object(vec![
                ("enum_name", JsonValue::Str(enum_name.clone())),
                ("value", JsonValue::Str(value.clone())),
            ]),
            PropertyValue::Array(array) => array.to_json(),
            PropertyValue::Set {
                inner_type,
                elements,
            } => JsonValue::object(vec![
                ("inner_type", JsonValue::Str(inner_type.clone())),
                (
                    "elements",
                    JsonValue::Array(elements.iter().map(ToJson::to_json).collect()),
                ),
            ]),
            PropertyValue::Map {
                key_type,
                value_type,
                entries,
            } => JsonValue::object(vec![
                ("key_type", JsonValue::Str(key_type.clone())),
                ("value_type", JsonValue::Str(value_type.clone())),
                (
                    "entries",
                    JsonValue::Array(
                        entries
                            .iter()
                            .map(|(k, v)| {
                                JsonValue::object(vec![
                                    ("key", k.to_json()),
                                    ("value", v.to_json()),
                                ])
                            })
                            .collect(),
                    ),
                ),
            ]),
            PropertyValue::Struct {
                struct_type,
                struct_guid,
                payload,
            } => {
                let mut fields = vec![(
                    "struct_type".to_owned(),
                    JsonValue::Str(struct_type.clone()),
                )];
                if !struct_guid.is_zero() {
                    fields.push(("struct_guid".to_owned(), struct_guid.to_json()));
                }
                fields.push(("payload".to_owned(), payload.to_json()));
                JsonValue::Object(fields)
            }
        }
    }
}

impl ToJson for ValueBody {
    fn to_json(&self) -> JsonValue {
        match self {
            ValueBody::Bool(v) => JsonValue::Bool(*v),
            ValueBody::Int8(v) => JsonValue::Int(i64::from(*v)),
            ValueBody::Int32(v) => JsonValue::Int(i64::from(*v)),
            ValueBody::Int64(v) => JsonValue::BigInt(*v),
            ValueBody::UInt8(v) => JsonValue::Int(i64::from(*v)),
            ValueBody::UInt32(v) => JsonValue::Int(i64::from(*v)),
            ValueBody::UInt64(v) => JsonValue::BigUint(*v),
            ValueBody::Float(v) => JsonValue::F32(*v),
            ValueBody::Double(v) => JsonValue::F64(*v),
            ValueBody::Str(s) => JsonValue::Str(s.clone()),
            ValueBody::Object(reference) => reference.to_json(),
            ValueBody::SoftObject { reference, index } => JsonValue::object(vec![
                ("reference", reference.to_json()),
                ("index", JsonValue::Int(i64::from(*index))),
            ]),
            ValueBody::Byte(b) => JsonValue::Int(i64::from(*b)),
            ValueBody::Text(entry) => entry.to_json(),
            ValueBody::Properties(list) => {
                JsonValue::Array(list.iter().map(ToJson::to_json).collect())
            }
        }
    }
}

impl ToJson for ArrayValue {
    fn to_json(&self) -> JsonValue {
        match self {
            ArrayValue::Values {
                inner_type,
                elements,
            } => JsonValue::object(vec![
                ("inner_type", JsonValue::Str(inner_type.clone())),
                (
                    "elements",
                    JsonValue::Array(elements.iter().map(ToJson::to_json).collect()),
                ),
            ]),
            ArrayValue::Structs {
                struct_type,
                struct_guid,
                elements,
                ..
            } => JsonValue::object(vec![
                ("inner_type", JsonValue::Str("StructProperty".to_owned())),
                ("struct_type", JsonValue::Str(struct_type.clone())),
                ("struct_guid", struct_guid.to_json()),
                (
                    "elements",
                    JsonValue::Array(elements.iter().map(ToJson::to_json).collect()),
                ),
            ]),
        }
    }
}

impl ToJson for StructPayload {
    fn to_json(&self) -> JsonValue {
        match self {
            StructPayload::Vector(v) | StructPayload::Rotator(v) => JsonValue::object(vec![
                ("x", JsonValue::F64(v.x)),
                ("y", JsonValue::F64(v.y)),
                ("z", JsonValue::F64(v.z)),
            ]),
            StructPayload::VectorF(v) | StructPayload::RotatorF(v) => JsonValue::object(vec![
                ("x", JsonValue::F32(v.x)),
                ("y", JsonValue::F32(v.y)),
                ("z", JsonValue::F32(v.z)),
            ]),
            StructPayload::Vector2D(v) => JsonValue::object(vec![
                ("x", JsonValue::F64(v.x)),
                ("y", JsonValue::F64(v.y)),
            ]),
            StructPayload::Vector2DF(v) => JsonValue::object(vec![
                ("x", JsonValue::F32(v.x)),
                ("y", JsonValue::F32(v.y)),
            ]),
            StructPayload::Vector4(v) => JsonValue::object(vec![
                ("x", JsonValue::F64(v.x)),
                ("y", JsonValue::F64(v.y)),
                ("z", JsonValue::F64(v.z)),
                ("w", JsonValue::F64(v.w)),
            ]),
            StructPayload::Vector4F(v) => JsonValue::object(vec![
                ("x", JsonValue::F32(v.x)),
                ("y", JsonValue::F32(v.y)),
                ("z", JsonValue::F32(v.z)),
                ("w", JsonValue::F32(v.w)),
            ]),
            StructPayload::Quat(q) => JsonValue::object(vec![
                ("x", JsonValue::F64(q.x)),
                ("y", JsonValue::F64(q.y)),
                ("z", JsonValue::F64(q.z)),
                ("w", JsonValue::F64(q.w)),
            ]),
            StructPayload::QuatF(q) => JsonValue::object(vec![
                ("x", JsonValue::F32(q.x)),
                ("y", JsonValue::F32(q.y)),
                ("z", JsonValue::F32(q.z)),
                ("w", JsonValue::F32(q.w)),
            ]),
            StructPayload::Color { b, g, r, a } => JsonValue::object(vec![
                ("b", JsonValue::Int(i64::from(*b))),
                ("g", JsonValue::Int(i64::from(*g))),
                ("r", JsonValue::Int(i64::from(*r))),
                ("a", JsonValue::Int(i64::from(*a))),
            ]),
            StructPayload::LinearColor(c) => JsonValue::object(vec![
                ("r", JsonValue::F32(c.x)),
                ("g", JsonValue::F32(c.y)),
                ("b", JsonValue::F32(c.z)),
                ("a", JsonValue::F32(c.w)),
            ]),
            StructPayload::Transform {
                translation,
                rotation,
                scale,
            } => {
                let vec3 = |v: &glam::DVec3| {
                    JsonValue::object(vec![
                        ("x", JsonValue::F64(v.x)),
                        ("y", JsonValue::F64(v.y)),
                        ("z", JsonValue::F64(v.z)),
                    ])
                };
                let quat = |q: &glam::DQuat| {
                    JsonValue::object(vec![
                        ("x", JsonValue::F64(q.x)),
                        ("y", JsonValue::F64(q.y)),
                        ("z", JsonValue::F64(q.z)),
                        ("w", JsonValue::F64(q.w)),
                    ])
                };
                JsonValue::object(vec![
                    (
                        "translation",
                        translation.as_ref().map_or(JsonValue::Null, vec3),
                    ),
                    ("rotation", rotation.as_ref().map_or(JsonValue::Null, quat)),
                    ("scale", scale.as_ref().map_or(JsonValue::Null, vec3)),
                ])
            }
            StructPayload::Box { min, max, is_valid } => JsonValue::object(vec![
                (
                    "min",
                    StructPayload::Vector(*min).to_json(),
                ),
                (
                    "max",
                    StructPayload::Vector(*max).to_json(),
                ),
                ("is_valid", JsonValue::Int(i64::from(*is_valid))),
            ]),
            StructPayload::IntPoint(p) => JsonValue::object(vec![
                ("x", JsonValue::Int(i64::from(p.x))),
                ("y", JsonValue::Int(i64::from(p.y))),
            ]),
            StructPayload::IntVector(v) => JsonValue::object(vec![
                ("x", JsonValue::Int(i64::from(v.x))),
                ("y", JsonValue::Int(i64::from(v.y))),
                ("z", JsonValue::Int(i64::from(v.z))),
            ]),
            StructPayload::DateTime(ticks) => JsonValue::BigInt(*ticks),
            StructPayload::Guid(guid) => guid.to_json(),
            StructPayload::FluidBox(content) => JsonValue::F32(*content),
            StructPayload::RailroadTrackPosition {
                track,
                offset,
                forward,
            } => JsonValue::object(vec![
                ("track", track.to_json()),
                ("offset", JsonValue::F32(*offset)),
                ("forward", JsonValue::F32(*forward)),
            ]),
            StructPayload::InventoryItem {
                item_name,
                item_state,
            } => JsonValue::object(vec![
                ("item_name", JsonValue::Str(item_name.clone())),
                ("item_state", item_state.to_json()),
            ]),
            StructPayload::ClientIdentityInfo {
                identity_id,
                accounts,
            } => JsonValue::object(vec![
                ("identity_id", JsonValue::Str(identity_id.clone())),
                (
                    "accounts",
                    JsonValue::Array(
                        accounts
                            .iter()
                            .map(|a| {
                                JsonValue::object(vec![
                                    ("kind", JsonValue::Int(i64::from(a.kind))),
                                    ("data", hex(&a.data)),
                                ])
                            })
                            .collect(),
                    ),
                ),
            ]),
            StructPayload::ScannableResourcePair { resource, scanner } => JsonValue::object(vec![
                ("resource", resource.to_json()),
                ("scanner", scanner.to_json()),
            ]),
            StructPayload::FicFrameRange { begin, end } => JsonValue::object(vec![
                ("begin", JsonValue::BigInt(*begin)),
                ("end", JsonValue::BigInt(*end)),
            ]),
            StructPayload::SpawnData {
                location,
                rotation,
                spawned_entity,
            } => JsonValue::object(vec![
                ("location", StructPayload::Vector(*location).to_json()),
                ("rotation", StructPayload::Quat(*rotation).to_json()),
                ("spawned_entity", spawned_entity.to_json()),
            ]),
            StructPayload::PhaseCost { item_class, amount } => JsonValue::object(vec![
                ("item_class", item_class.to_json()),
                ("amount", JsonValue::Int(i64::from(*amount))),
            ]),
            StructPayload::Properties(list) => {
                JsonValue::Array(list.iter().map(ToJson::to_json).collect())
            }
        }
    }
}

impl ToJson for TextEntry {
    fn to_json(&self) -> JsonValue {
        let history = match &self.history {
            TextHistory::None { invariant } => JsonValue::object(vec![
                ("kind", JsonValue::Str("None".to_owned())),
                (
                    "invariant",
                    invariant
                        .as_ref()
                        .map_or(JsonValue::Null, |s| JsonValue::Str(s.clone())),
                ),
            ]),
            TextHistory::Base {
                namespace,
                key,
                source_string,
            } => JsonValue::object(vec![
                ("kind", JsonValue::Str("Base".to_owned())),
                ("namespace", JsonValue::Str(namespace.clone())),
                ("key", JsonValue::Str(key.clone())),
                ("source_string", JsonValue::Str(source_string.clone())),
            ]),
            TextHistory::NamedFormat {
                source_format,
                arguments,
            }
            | TextHistory::ArgumentFormat {
                source_format,
                arguments,
            } => {
                let kind = if matches!(self.history, TextHistory::NamedFormat { .. }) {
                    "NamedFormat"
                } else {
                    "ArgumentFormat"
                };
                JsonValue::object(vec![
                    ("kind", JsonValue::Str(kind.to_owned())),
                    ("source_format", source_format.to_json()),
                    (
                        "arguments",
                        JsonValue::Array(
                            arguments
                                .iter()
                                .map(|(name, value)| {
                                    JsonValue::object(vec![
                                        ("name", JsonValue::Str(name.clone())),
                                        ("value", value.to_json()),
                                    ])
                                })
                                .collect(),
                        ),
                    ),
                ])
            }
            TextHistory::AsNumber { source_value } => JsonValue::object(vec![
                ("kind", JsonValue::Str("AsNumber".to_owned())),
                ("source_value", source_value.to_json()),
            ]),
            TextHistory::AsDate {
                ticks,
                timezone,
                culture,
            } => JsonValue::object(vec![
                ("kind", JsonValue::Str("AsDate".to_owned())),
                ("ticks", JsonValue::BigInt(*ticks)),
                ("timezone", JsonValue::Str(timezone.clone())),
                ("culture", JsonValue::Str(culture.clone())),
            ]),
            TextHistory::Transform {
                source,
                transform_kind,
            } => JsonValue::object(vec![
                ("kind", JsonValue::Str("Transform".to_owned())),
                ("source", source.to_json()),
                ("transform_kind", JsonValue::Int(i64::from(*transform_kind))),
            ]),
            TextHistory::StringTableEntry { table_id, key } => JsonValue::object(vec![
                ("kind", JsonValue::Str("StringTableEntry".to_owned())),
                ("table_id", JsonValue::Str(table_id.clone())),
                ("key", JsonValue::Str(key.clone())),
            ]),
        };
        JsonValue::object(vec![
            ("flags", JsonValue::Int(i64::from(self.flags))),
            ("history", history),
        ])
    }
}

impl ToJson for SceneObject {
    fn to_json(&self) -> JsonValue {
        match self {
            SceneObject::Component(c) => c.to_json(),
            SceneObject::Entity(e) => e.to_json(),
        }
    }
}

impl ToJson for ComponentObject {
    fn to_json(&self) -> JsonValue {
        JsonValue::object(vec![
            ("kind", JsonValue::Str("component".to_owned())),
            ("type_path", JsonValue::Str(self.type_path.clone())),
            ("root_path", JsonValue::Str(self.root_path.clone())),
            ("instance_name", JsonValue::Str(self.instance_name.clone())),
            ("outer_path", JsonValue::Str(self.outer_path.clone())),
            (
                "properties",
                JsonValue::Array(self.properties.iter().map(ToJson::to_json).collect()),
            ),
            ("extra", hex(&self.extra)),
        ])
    }
}

impl ToJson for EntityObject {
    fn to_json(&self) -> JsonValue {
        JsonValue::object(vec![
            ("kind", JsonValue::Str("entity".to_owned())),
            ("type_path", JsonValue::Str(self.type_path.clone())),
            ("root_path", JsonValue::Str(self.root_path.clone())),
            ("instance_name", JsonValue::Str(self.instance_name.clone())),
            (
                "needs_transform",
                JsonValue::Int(i64::from(self.needs_transform)),
            ),
            (
                "transform",
                JsonValue::object(vec![
                    (
                        "rotation",
                        JsonValue::Array(
                            [
                                self.transform.rotation.x,
                                self.transform.rotation.y,
                                self.transform.rotation.z,
                                self.transform.rotation.w,
                            ]
                            .iter()
                            .map(|v| JsonValue::F32(*v))
                            .collect(),
                        ),
                    ),
                    (
                        "position",
                        JsonValue::Array(
                            self.transform
                                .position
                                .to_array()
                                .iter()
                                .map(|v| JsonValue::F32(*v))
                                .collect(),
                        ),
                    ),
                    (
                        "scale",
                        JsonValue::Array(
                            self.transform
                                .scale
                                .to_array()
                                .iter()
                                .map(|v| JsonValue::F32(*v))
                                .collect(),
                        ),
                    ),
                ]),
            ),
            (
                "was_placed_in_level",
                JsonValue::Int(i64::from(self.was_placed_in_level)),
            ),
            (
                "parent",
                self.parent
                    .as_ref()
                    .map_or(JsonValue::Null, ToJson::to_json),
            ),
            (
                "children",
                JsonValue::Array(self.children.iter().map(ToJson::to_json).collect()),
            ),
            (
                "properties",
                JsonValue::Array(self.properties.iter().map(ToJson::to_json).collect()),
            ),
            ("extra", hex(&self.extra)),
        ])
    }
}

impl ToJson for Level {
    fn to_json(&self) -> JsonValue {
        JsonValue::object(vec![
            ("name", JsonValue::Str(self.name.clone())),
            (
                "objects",
                JsonValue::Array(self.objects.iter().map(ToJson::to_json).collect()),
            ),
            (
                "collectables",
                JsonValue::Array(self.collectables.iter().map(ToJson::to_json).collect()),
            ),
            ("trailing", hex(&self.trailing)),
        ])
    }
}

impl ToJson for PartitionGrids {
    fn to_json(&self) -> JsonValue {
        JsonValue::Array(self.grids.iter().map(ToJson::to_json).collect())
    }
}

impl ToJson for PartitionGrid {
    fn to_json(&self) -> JsonValue {
        JsonValue::object(vec![
            ("name", JsonValue::Str(self.name.clone())),
            ("cell_size", JsonValue::Int(i64::from(self.cell_size))),
            ("checksum", JsonValue::Int(i64::from(self.checksum))),
            (
                "cells",
                JsonValue::Array(self.cells.iter().map(ToJson::to_json).collect()),
            ),
        ])
    }
}

impl ToJson for PartitionCell {
    fn to_json(&self) -> JsonValue {
        JsonValue::object(vec![
            ("name", JsonValue::Str(self.name.clone())),
            ("x", JsonValue::BigInt(self.x)),
            ("y", JsonValue::BigInt(self.y)),
            (
                "level_instances",
                JsonValue::Array(
                    self.level_instances
                        .iter()
                        .map(|s| JsonValue::Str(s.clone()))
                        .collect(),
                ),
            ),
        ])
    }
}

impl ToJson for SaveHeader {
    fn to_json(&self) -> JsonValue {
        JsonValue::object(vec![
            (
                "header_version",
                JsonValue::Int(i64::from(self.header_version)),
            ),
            ("save_version", JsonValue::Int(i64::from(self.save_version))),
            (
                "build_version",
                JsonValue::Int(i64::from(self.build_version)),
            ),
            ("level_name", JsonValue::Str(self.level_name.clone())),
            ("seed", JsonValue::Int(i64::from(self.seed))),
            ("session_name", JsonValue::Str(self.session_name.clone())),
            (
                "play_duration",
                JsonValue::Int(i64::from(self.play_duration)),
            ),
            ("save_date_ticks", JsonValue::BigInt(self.save_date_ticks)),
            (
                "session_visibility",
                JsonValue::Int(i64::from(self.session_visibility)),
            ),
            ("mod_metadata", JsonValue::Str(self.mod_metadata.clone())),
            ("is_modded", JsonValue::Int(i64::from(self.is_modded))),
        ])
    }
}

impl ToJson for CompressionInfo {
    fn to_json(&self) -> JsonValue {
        JsonValue::object(vec![
            ("algorithm", JsonValue::Int(i64::from(self.algorithm))),
            ("max_chunk_size", JsonValue::BigUint(self.max_chunk_size)),
            ("flags", JsonValue::Int(i64::from(self.flags))),
        ])
    }
}

impl ToJson for ChunkSummary {
    fn to_json(&self) -> JsonValue {
        JsonValue::object(vec![
            ("uncompressed_size", JsonValue::BigUint(self.uncompressed_size)),
            ("compressed_size", JsonValue::BigUint(self.compressed_size)),
            ("offset", JsonValue::BigUint(self.offset)),
        ])
    }
}

impl ToJson for Save {
    fn to_json(&self) -> JsonValue {
        JsonValue::object(vec![
            ("name", JsonValue::Str(self.name.clone())),
            ("header", self.header.to_json()),
            (
                "compression",
                self.compression
                    .as_ref()
                    .map_or(JsonValue::Null, ToJson::to_json),
            ),
            ("body_hash", hex(&self.body_hash)),
            ("grids", self.grids.to_json()),
            (
                "levels",
                JsonValue::Array(self.levels.iter().map(ToJson::to_json).collect()),
            ),
        ])
    }
}

impl ToJson for ItemAmount {
    fn to_json(&self) -> JsonValue {
        JsonValue::object(vec![
            ("item_class", self.item_class.to_json()),
            ("amount", JsonValue::Int(i64::from(self.amount))),
        ])
    }
}

impl ToJson for BlueprintConfig {
    fn to_json(&self) -> JsonValue {
        JsonValue::object(vec![
            ("description", JsonValue::Str(self.description.clone())),
            ("icon_id", JsonValue::Int(i64::from(self.icon_id))),
            (
                "color",
                JsonValue::Array(
                    self.color
                        .to_array()
                        .iter()
                        .map(|v| JsonValue::F32(*v))
                        .collect(),
                ),
            ),
        ])
    }
}

impl ToJson for Blueprint {
    fn to_json(&self) -> JsonValue {
        JsonValue::object(vec![
            ("name", JsonValue::Str(self.name.clone())),
            (
                "header_version",
                JsonValue::Int(i64::from(self.header_version)),
            ),
            ("save_version", JsonValue::Int(i64::from(self.save_version))),
            (
                "build_version",
                JsonValue::Int(i64::from(self.build_version)),
            ),
            (
                "dimensions",
                JsonValue::Array(
                    self.dimensions
                        .to_array()
                        .iter()
                        .map(|v| JsonValue::Int(i64::from(*v)))
                        .collect(),
                ),
            ),
            (
                "item_costs",
                JsonValue::Array(self.item_costs.iter().map(ToJson::to_json).collect()),
            ),
            (
                "recipes",
                JsonValue::Array(self.recipes.iter().map(ToJson::to_json).collect()),
            ),
            (
                "compression",
                self.compression
                    .as_ref()
                    .map_or(JsonValue::Null, ToJson::to_json),
            ),
            (
                "objects",
                JsonValue::Array(self.objects.iter().map(ToJson::to_json).collect()),
            ),
            ("config", self.config.to_json()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_zero_renders_as_literal() {
        assert_eq!(stringify(&JsonValue::F32(-0.0), 0), "-0");
        assert_eq!(stringify(&JsonValue::F64(-0.0), 0), "-0");
        assert_eq!(stringify(&JsonValue::F32(0.0), 0), "0");
    }

    #[test]
    fn test_big_integers_render_as_decimal_strings() {
        assert_eq!(
            stringify(&JsonValue::BigInt(9_223_372_036_854_775_807), 0),
            "\"9223372036854775807\""
        );
        assert_eq!(
            stringify(&JsonValue::BigUint(u64::MAX), 0),
            "\"18446744073709551615\""
        );
        assert_eq!(stringify(&JsonValue::BigInt(i64::MIN), 0), "\"-9223372036854775808\"");
    }

    #[test]
    fn test_non_finite_floats_render_null() {
        assert_eq!(stringify(&JsonValue::F32(f32::NAN), 0), "null");
        assert_eq!(stringify(&JsonValue::F64(f64::INFINITY), 0), "null");
    }

    #[test]
    fn test_string_escaping() {
        let value = JsonValue::Str("a\"b\\c\nd\u{1}".to_owned());
        assert_eq!(stringify(&value, 0), "\"a\\\"b\\\\c\\nd\\u0001\"");
    }

    #[test]
    fn test_compact_object_layout() {
        let value = JsonValue::object(vec![
            ("a", JsonValue::Int(1)),
            ("b", JsonValue::Array(vec![JsonValue::Bool(true)])),
        ]);
        assert_eq!(stringify(&value, 0), "{\"a\":1,\"b\":[true]}");
    }

    #[test]
    fn test_indented_layout() {
        let value = JsonValue::object(vec![("a", JsonValue::Int(1))]);
        assert_eq!(stringify(&value, 2), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn test_float_property_minus_zero_through_to_json() {
        let value = PropertyValue::Float(f32::from_bits(0x8000_0000));
        assert_eq!(stringify(&value.to_json(), 0), "-0");
    }

    #[test]
    fn test_int64_property_exact_through_to_json() {
        let value = PropertyValue::Int64(9_223_372_036_854_775_807);
        assert_eq!(stringify(&value.to_json(), 0), "\"9223372036854775807\"");
    }

    #[test]
    fn test_guid_renders_as_hex() {
        let value = Guid([0xAB; 16]).to_json();
        assert_eq!(
            stringify(&value, 0),
            "\"abababababababababababababababab\""
        );
    }
}
