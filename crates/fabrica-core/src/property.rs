use crate::types::{Guid, ObjectReference};
use glam::{DQuat, DVec2, DVec3, DVec4, IVec2, IVec3, Quat, Vec2, Vec3, Vec4};

/// A named, typed, self-describing field attached to a scene object.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    /// Static-array slot; zero for ordinary properties.
    pub index: u32,
    /// Optional property GUID from the GUIDInfo block. Always `None` for
    /// byte and enum properties, which carry no GUIDInfo on disk.
    pub guid: Option<Guid>,
    pub value: PropertyValue,
}

impl Property {
    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            index: 0,
            guid: None,
            value,
        }
    }

    /// The on-disk type tag for this property's value.
    pub fn type_tag(&self) -> &'static str {
        self.value.type_tag()
    }
}

/// Payload of a property, tagged by the on-disk type string.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int8(i8),
    Int32(i32),
    /// Exact 64-bit value; may exceed the safe floating-point range.
    Int64(i64),
    UInt8(u8),
    UInt32(u32),
    UInt64(u64),
    /// Carried as its 4-byte bit pattern; negative zero and NaN payloads
    /// survive round-trips.
    Float(f32),
    Double(f64),
    Str(String),
    Name(String),
    Object(ObjectReference),
    SoftObject {
        reference: ObjectReference,
        index: u32,
    },
    Enum {
        enum_type: String,
        value: String,
    },
    Text(TextEntry),
    Byte(ByteValue),
    Array(ArrayValue),
    Set {
        inner_type: String,
        elements: Vec<ValueBody>,
    },
    Map {
        key_type: String,
        value_type: String,
        entries: Vec<(ValueBody, ValueBody)>,
    },
    Struct {
        struct_type: String,
        struct_guid: Guid,
        payload: StructPayload,
    },
}

impl PropertyValue {
    pub fn type_tag(&self) -> &'static str {
        match self {
            PropertyValue::Bool(_) => "BoolProperty",
            PropertyValue::Int8(_) => "Int8Property",
            PropertyValue::Int32(_) => "IntProperty",
            PropertyValue::Int64(_) => "Int64Property",
            PropertyValue::UInt8(_) => "UInt8Property",
            PropertyValue::UInt32(_) => "UInt32Property",
            PropertyValue::UInt64(_) => "UInt64Property",
            PropertyValue::Float(_) => "FloatProperty",
            PropertyValue::Double(_) => "DoubleProperty",
            PropertyValue::Str(_) => "StrProperty",
            PropertyValue::Name(_) => "NameProperty",
            PropertyValue::Object(_) => "ObjectProperty",
            PropertyValue::SoftObject { .. } => "SoftObjectProperty",
            PropertyValue::Enum { .. } => "EnumProperty",
            PropertyValue::Text(_) => "TextProperty",
            PropertyValue::Byte(_) => "ByteProperty",
            PropertyValue::Array(_) => "ArrayProperty",
            PropertyValue::Set { .. } => "SetProperty",
            PropertyValue::Map { .. } => "MapProperty",
            PropertyValue::Struct { .. } => "StructProperty",
        }
    }
}

/// ByteProperty payload: a raw byte when the declared enum name is `None`,
/// otherwise a named enum value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ByteValue {
    Raw(u8),
    Enum { enum_name: String, value: String },
}

/// One container element: a bare body with no per-element header. The
/// container's declared inner type tag says how to read and write it.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueBody {
    Bool(bool),
    Int8(i8),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt32(u32),
    UInt64(u64),
    Float(f32),
    Double(f64),
    /// Str, Name and Enum elements all carry a bare string body.
    Str(String),
    Object(ObjectReference),
    SoftObject {
        reference: ObjectReference,
        index: u32,
    },
    Byte(u8),
    Text(TextEntry),
    /// Struct element inside a set or map, where no struct type is
    /// available on disk: a nested property list.
    Properties(Vec<Property>),
}

/// ArrayProperty payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayValue {
    Values {
        inner_type: String,
        elements: Vec<ValueBody>,
    },
    /// Struct elements share a single header emitted before the
    /// concatenated bodies.
    Structs {
        element_name: String,
        struct_type: String,
        struct_guid: Guid,
        guid: Option<Guid>,
        elements: Vec<StructPayload>,
    },
}

/// Payload of a `StructProperty`, dispatched on the struct type string.
///
/// The `*F` variants are the 32-bit-float flavors selected by the precision
/// hint table; keeping them distinct means a narrowing cast never touches
/// NaN payload bits.
#[derive(Debug, Clone, PartialEq)]
pub enum StructPayload {
    Vector(DVec3),
    VectorF(Vec3),
    Vector2D(DVec2),
    Vector2DF(Vec2),
    Vector4(DVec4),
    Vector4F(Vec4),
    Quat(DQuat),
    QuatF(Quat),
    Rotator(DVec3),
    RotatorF(Vec3),
    Color {
        b: u8,
        g: u8,
        r: u8,
        a: u8,
    },
    LinearColor(Vec4),
    Transform {
        translation: Option<DVec3>,
        rotation: Option<DQuat>,
        scale: Option<DVec3>,
    },
    Box {
        min: DVec3,
        max: DVec3,
        is_valid: u8,
    },
    IntPoint(IVec2),
    IntVector(IVec3),
    /// .NET-style ticks.
    DateTime(i64),
    Guid(Guid),
    FluidBox(f32),
    RailroadTrackPosition {
        track: ObjectReference,
        offset: f32,
        forward: f32,
    },
    InventoryItem {
        item_name: String,
        item_state: ObjectReference,
    },
    ClientIdentityInfo {
        identity_id: String,
        accounts: Vec<AccountIdEntry>,
    },
    ScannableResourcePair {
        resource: ObjectReference,
        scanner: ObjectReference,
    },
    /// Two exact 64-bit frame numbers; decimal strings at the JSON
    /// boundary.
    FicFrameRange {
        begin: i64,
        end: i64,
    },
    SpawnData {
        location: DVec3,
        rotation: DQuat,
        spawned_entity: ObjectReference,
    },
    PhaseCost {
        item_class: ObjectReference,
        amount: i32,
    },
    /// Fallback for struct types without a registered codec: a nested
    /// property list terminated by `None`. This is what lets new game
    /// versions round-trip without code changes.
    Properties(Vec<Property>),
}

/// One platform account entry inside `ClientIdentityInfo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountIdEntry {
    pub kind: u8,
    pub data: Vec<u8>,
}

/// Localized text value: a small recursive tagged union.
#[derive(Debug, Clone, PartialEq)]
pub struct TextEntry {
    pub flags: u32,
    pub history: TextHistory,
}

/// The history variants a text value can carry. Formats nest further text
/// values, decoded by the same routine.
#[derive(Debug, Clone, PartialEq)]
pub enum TextHistory {
    None {
        invariant: Option<String>,
    },
    Base {
        namespace: String,
        key: String,
        source_string: String,
    },
    NamedFormat {
        source_format: Box<TextEntry>,
        arguments: Vec<(String, TextEntry)>,
    },
    ArgumentFormat {
        source_format: Box<TextEntry>,
        arguments: Vec<(String, TextEntry)>,
    },
    AsNumber {
        source_value: Box<TextEntry>,
    },
    AsDate {
        ticks: i64,
        timezone: String,
        culture: String,
    },
    Transform {
        source: Box<TextEntry>,
        transform_kind: u8,
    },
    StringTableEntry {
        table_id: String,
        key: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tags_cover_every_variant() {
        let samples = [
            (PropertyValue::Bool(true), "BoolProperty"),
            (PropertyValue::Int32(1), "IntProperty"),
            (PropertyValue::Int64(i64::MAX), "Int64Property"),
            (PropertyValue::UInt64(u64::MAX), "UInt64Property"),
            (PropertyValue::Float(-0.0), "FloatProperty"),
            (PropertyValue::Str(String::new()), "StrProperty"),
            (
                PropertyValue::Object(ObjectReference::default()),
                "ObjectProperty",
            ),
            (
                PropertyValue::Struct {
                    struct_type: "Vector".into(),
                    struct_guid: Guid::default(),
                    payload: StructPayload::Vector(DVec3::ZERO),
                },
                "StructProperty",
            ),
        ];
        for (value, tag) in samples {
            assert_eq!(value.type_tag(), tag);
        }
    }

    #[test]
    fn test_property_new_defaults() {
        let prop = Property::new("mHealth", PropertyValue::Float(100.0));
        assert_eq!(prop.index, 0);
        assert!(prop.guid.is_none());
        assert_eq!(prop.type_tag(), "FloatProperty");
    }
}
