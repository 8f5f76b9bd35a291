//! Bidirectional binary codec for fabrica save and blueprint streams.
//!
//! Decoding walks bytes → chunk framing → inflated body → partition grids
//! and levels → scene objects → typed property trees, producing the object
//! graph defined in `fabrica-core`. Encoding is the exact reverse and
//! reproduces a decoded stream byte-identically.
//!
//! Everything works on in-memory buffers and callbacks; file I/O belongs to
//! the caller. A codec invocation is single-threaded and holds no shared
//! state, so independent invocations on disjoint buffers may run in
//! parallel. Callbacks are invoked synchronously and must not retain the
//! buffers they are handed; a panicking callback unwinds through the codec
//! and aborts the operation with no partial result.

pub mod blueprint;
pub mod chunk;
pub mod compat;
pub mod cursor;
pub mod error;
pub mod format;
pub mod json;
pub mod object;
pub mod property;
pub mod save;
pub mod structs;
pub mod text;

pub use compat::{classify, ensure_supported, GameVersion};
pub use error::PersistError;
pub use json::{stringify, JsonValue, ToJson};

use fabrica_core::{Blueprint, ChunkSummary, Save};

/// Optional hooks observed while decoding.
#[derive(Default)]
pub struct ParseOptions<'a> {
    /// Coarse progress in `[0, 1]` with a short message per milestone.
    pub on_progress: Option<Box<dyn FnMut(f32, &str) + 'a>>,
    /// The whole inflated body, once, before any parsing.
    pub on_decompressed_body: Option<Box<dyn FnMut(&[u8]) + 'a>>,
}

impl ParseOptions<'_> {
    pub(crate) fn progress(&mut self, fraction: f32, message: &str) {
        if let Some(cb) = self.on_progress.as_mut() {
            cb(fraction, message);
        }
    }
}

/// Optional hooks observed while encoding.
#[derive(Default)]
pub struct WriteOptions<'a> {
    /// The whole uncompressed body, once, before chunking and compression.
    pub on_binary_before_compressing: Option<Box<dyn FnMut(&[u8]) + 'a>>,
}

/// Decode a save stream into its object graph.
pub fn parse_save(
    name: &str,
    bytes: &[u8],
    options: &mut ParseOptions<'_>,
) -> Result<Save, PersistError> {
    log::debug!("parsing save `{name}` ({} bytes)", bytes.len());
    save::decode_save(name, bytes, options)
}

/// Encode a save graph. The uncompressed header goes to `on_header` once,
/// each framed chunk to `on_chunk` in emission order; concatenating the two
/// streams yields the complete file.
pub fn write_save(
    save: &Save,
    mut on_header: impl FnMut(&[u8]),
    mut on_chunk: impl FnMut(&[u8]),
    options: &mut WriteOptions<'_>,
) -> Result<Vec<ChunkSummary>, PersistError> {
    save::encode_save(save, &mut on_header, &mut on_chunk, options)
}

/// Decode a blueprint pair: the chunked main buffer and the uncompressed
/// config buffer.
pub fn parse_blueprint(
    name: &str,
    main_bytes: &[u8],
    config_bytes: &[u8],
    options: &mut ParseOptions<'_>,
) -> Result<Blueprint, PersistError> {
    log::debug!(
        "parsing blueprint `{name}` ({} + {} bytes)",
        main_bytes.len(),
        config_bytes.len()
    );
    blueprint::decode_blueprint(name, main_bytes, config_bytes, options)
}

/// Encode a blueprint pair; returns the chunk summaries for the main buffer
/// and the complete config buffer.
pub fn write_blueprint(
    blueprint: &Blueprint,
    mut on_header: impl FnMut(&[u8]),
    mut on_chunk: impl FnMut(&[u8]),
    options: &mut WriteOptions<'_>,
) -> Result<(Vec<ChunkSummary>, Vec<u8>), PersistError> {
    blueprint::encode_blueprint(blueprint, &mut on_header, &mut on_chunk, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabrica_core::{
        ArrayValue, ByteValue, EntityObject, Guid, Level, ObjectReference, PartitionGrids,
        Property, PropertyValue, SaveHeader, SceneObject, StructPayload, ValueBody,
    };
    use glam::DVec3;
    use std::cell::RefCell;

    fn rich_save() -> Save {
        let properties = vec![
            Property::new("mIsProducing", PropertyValue::Bool(true)),
            Property::new("mProgress", PropertyValue::Float(-0.0)),
            Property::new(
                "mTotalProduced",
                PropertyValue::Int64(9_223_372_036_854_775_807),
            ),
            Property::new(
                "mPosition",
                PropertyValue::Struct {
                    struct_type: "Vector".into(),
                    struct_guid: Guid::default(),
                    payload: StructPayload::Vector(DVec3::new(1.0, -0.0, 2.5)),
                },
            ),
            Property::new(
                "mCounters",
                PropertyValue::Map {
                    key_type: "StrProperty".into(),
                    value_type: "IntProperty".into(),
                    entries: vec![
                        (ValueBody::Str("a".into()), ValueBody::Int32(1)),
                        (ValueBody::Str("b".into()), ValueBody::Int32(-1)),
                    ],
                },
            ),
            Property::new(
                "mTags",
                PropertyValue::Array(ArrayValue::Values {
                    inner_type: "NameProperty".into(),
                    elements: vec![ValueBody::Str("smelter".into())],
                }),
            ),
            Property::new(
                "mStackSize",
                PropertyValue::Byte(ByteValue::Enum {
                    enum_name: "EStackSize".into(),
                    value: "SS_MEDIUM".into(),
                }),
            ),
            Property::new(
                "mModSettings",
                PropertyValue::Struct {
                    struct_type: "SomeModStruct".into(),
                    struct_guid: Guid::default(),
                    payload: StructPayload::Properties(vec![Property::new(
                        "mEnabled",
                        PropertyValue::Bool(false),
                    )]),
                },
            ),
        ];

        let entity = SceneObject::Entity(EntityObject {
            type_path: "/Game/Buildable/SmelterMk1".into(),
            root_path: "Persistent_Level".into(),
            instance_name: "SmelterMk1_3".into(),
            needs_transform: 1,
            was_placed_in_level: 0,
            parent: Some(ObjectReference::new("Persistent_Level", "Factory_Root")),
            properties,
            extra: vec![1, 2, 3, 4],
            ..EntityObject::default()
        });

        let mut level = Level::new("Persistent_Level");
        level.objects.push(entity);
        level
            .collectables
            .push(ObjectReference::new("Persistent_Level", "Berry_17"));

        Save {
            name: "factory".into(),
            header: SaveHeader {
                header_version: 14,
                save_version: 46,
                build_version: 365306,
                level_name: "Persistent_Level".into(),
                seed: -7,
                session_name: "Phase 4 base".into(),
                play_duration: 123_456,
                save_date_ticks: 638_600_000_000_000_000,
                session_visibility: 0,
                mod_metadata: String::new(),
                is_modded: 0,
            },
            compression: None,
            body_hash: [0; 32],
            grids: PartitionGrids::default(),
            levels: vec![level],
        }
    }

    fn encode_to_file(save: &Save) -> Vec<u8> {
        let mut header = Vec::new();
        let mut chunks = Vec::new();
        write_save(
            save,
            |h| header.extend_from_slice(h),
            |c| chunks.extend_from_slice(c),
            &mut WriteOptions::default(),
        )
        .unwrap();
        header.extend_from_slice(&chunks);
        header
    }

    #[test]
    fn test_facade_roundtrip_is_byte_identical() {
        let file = encode_to_file(&rich_save());
        let decoded = parse_save("factory", &file, &mut ParseOptions::default()).unwrap();
        assert_eq!(encode_to_file(&decoded), file);
    }

    #[test]
    fn test_decoded_graph_preserves_edge_values() {
        let file = encode_to_file(&rich_save());
        let decoded = parse_save("factory", &file, &mut ParseOptions::default()).unwrap();
        let level = decoded.persistent_level().unwrap();
        let properties = level.objects[0].properties();

        assert!(matches!(
            &properties[1].value,
            PropertyValue::Float(v) if v.to_bits() == 0x8000_0000
        ));
        assert!(matches!(
            &properties[2].value,
            PropertyValue::Int64(9_223_372_036_854_775_807)
        ));
        match &properties[3].value {
            PropertyValue::Struct { payload, .. } => match payload {
                StructPayload::Vector(v) => {
                    assert_eq!(v.y.to_bits(), 0x8000_0000_0000_0000);
                }
                other => panic!("unexpected payload {other:?}"),
            },
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn test_stringify_renders_edge_values() {
        let file = encode_to_file(&rich_save());
        let decoded = parse_save("factory", &file, &mut ParseOptions::default()).unwrap();
        let dump = stringify(&decoded.to_json(), 0);
        assert!(dump.contains("-0"));
        assert!(dump.contains("\"9223372036854775807\""));

        let pretty = stringify(&decoded.to_json(), 2);
        assert!(pretty.contains("\"session_name\": \"Phase 4 base\""));
    }

    #[test]
    fn test_chunk_sum_equals_recorded_body_length() {
        let save = rich_save();
        let recorded = RefCell::new(0u64);
        let mut options = WriteOptions {
            on_binary_before_compressing: Some(Box::new(|body: &[u8]| {
                *recorded.borrow_mut() = u64::from_le_bytes(body[0..8].try_into().unwrap());
            })),
        };
        let summaries = write_save(&save, |_| {}, |_| {}, &mut options).unwrap();
        drop(options);
        let total: u64 = summaries.iter().map(|s| s.uncompressed_size).sum();
        assert_eq!(total, *recorded.borrow());
    }

    #[test]
    fn test_encode_callback_order() {
        let events = RefCell::new(Vec::new());
        let mut options = WriteOptions {
            on_binary_before_compressing: Some(Box::new(|_: &[u8]| {
                events.borrow_mut().push("body")
            })),
        };
        write_save(
            &rich_save(),
            |_| events.borrow_mut().push("header"),
            |_| events.borrow_mut().push("chunk"),
            &mut options,
        )
        .unwrap();
        drop(options);
        let events = events.into_inner();
        assert_eq!(events[0], "body");
        assert_eq!(events[1], "header");
        assert!(events[2..].iter().all(|e| *e == "chunk"));
        assert!(events.len() >= 3);
    }

    #[test]
    fn test_on_decompressed_body_sees_the_inflated_body() {
        let file = encode_to_file(&rich_save());
        let body_len = RefCell::new(0usize);
        let mut options = ParseOptions {
            on_decompressed_body: Some(Box::new(|body: &[u8]| {
                *body_len.borrow_mut() = body.len();
            })),
            ..ParseOptions::default()
        };
        parse_save("factory", &file, &mut options).unwrap();
        drop(options);
        assert!(*body_len.borrow() > 40);
    }

    #[test]
    fn test_unsupported_version_through_facade() {
        let mut w = cursor::ByteWriter::new();
        save::write_save_header(
            &mut w,
            &SaveHeader {
                header_version: 6,
                save_version: 5,
                ..SaveHeader::default()
            },
        );
        let err = parse_save("ancient", w.as_slice(), &mut ParseOptions::default()).unwrap_err();
        assert!(err.to_string().contains("0.0.34"));
    }

    #[test]
    fn test_parallel_invocations_on_disjoint_buffers() {
        let file = encode_to_file(&rich_save());
        let other = file.clone();
        let handle = std::thread::spawn(move || {
            parse_save("factory", &other, &mut ParseOptions::default()).unwrap()
        });
        let here = parse_save("factory", &file, &mut ParseOptions::default()).unwrap();
        let there = handle.join().unwrap();
        assert_eq!(here, there);
    }
}
