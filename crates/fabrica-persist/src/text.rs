use crate::cursor::{ByteReader, ByteWriter};
use crate::error::PersistError;
use fabrica_core::{TextEntry, TextHistory};

const HISTORY_BASE: u8 = 0;
const HISTORY_NAMED_FORMAT: u8 = 1;
const HISTORY_ARGUMENT_FORMAT: u8 = 3;
const HISTORY_AS_NUMBER: u8 = 4;
const HISTORY_AS_DATE: u8 = 7;
const HISTORY_TRANSFORM: u8 = 10;
const HISTORY_STRING_TABLE_ENTRY: u8 = 11;
const HISTORY_NONE: u8 = 255;

pub fn read_text(r: &mut ByteReader<'_>) -> Result<TextEntry, PersistError> {
    let flags = r.read_u32()?;
    let at = r.position();
    let kind = r.read_u8()?;
    let history = match kind {
        HISTORY_BASE => TextHistory::Base {
            namespace: r.read_string()?,
            key: r.read_string()?,
            source_string: r.read_string()?,
        },
        HISTORY_NAMED_FORMAT | HISTORY_ARGUMENT_FORMAT => {
            let source_format = Box::new(read_text(r)?);
            let count = r.read_u32()?;
            let mut arguments = Vec::with_capacity((count as usize).min(r.remaining()));
            for _ in 0..count {
                let name = r.read_string()?;
                arguments.push((name, read_text(r)?));
            }
            if kind == HISTORY_NAMED_FORMAT {
                TextHistory::NamedFormat {
                    source_format,
                    arguments,
                }
            } else {
                TextHistory::ArgumentFormat {
                    source_format,
                    arguments,
                }
            }
        }
        HISTORY_AS_NUMBER => TextHistory::AsNumber {
            source_value: Box::new(read_text(r)?),
        },
        HISTORY_AS_DATE => TextHistory::AsDate {
            ticks: r.read_i64()?,
            timezone: r.read_string()?,
            culture: r.read_string()?,
        },
        HISTORY_TRANSFORM => TextHistory::Transform {
            source: Box::new(read_text(r)?),
            transform_kind: r.read_u8()?,
        },
        HISTORY_STRING_TABLE_ENTRY => TextHistory::StringTableEntry {
            table_id: r.read_string()?,
            key: r.read_string()?,
        },
        HISTORY_NONE => {
            let has_invariant = r.read_u32()?;
            let invariant = if has_invariant != 0 {
                Some(r.read_string()?)
            } else {
                None
            };
            TextHistory::None { invariant }
        }
        other => {
            return Err(PersistError::UnknownTypeTag {
                position: at,
                tag: format!("text history {other}"),
            })
        }
    };
    Ok(TextEntry { flags, history })
}

pub fn write_text(w: &mut ByteWriter, text: &TextEntry) {
    w.write_u32(text.flags);
    match &text.history {
        TextHistory::Base {
            namespace,
            key,
            source_string,
        } => {
            w.write_u8(HISTORY_BASE);
            w.write_string(namespace);
            w.write_string(key);
            w.write_string(source_string);
        }
        TextHistory::NamedFormat {
            source_format,
            arguments,
        } => {
            w.write_u8(HISTORY_NAMED_FORMAT);
            write_format_args(w, source_format, arguments);
        }
        TextHistory::ArgumentFormat {
            source_format,
            arguments,
        } => {
            w.write_u8(HISTORY_ARGUMENT_FORMAT);
            write_format_args(w, source_format, arguments);
        }
        TextHistory::AsNumber { source_value } => {
            w.write_u8(HISTORY_AS_NUMBER);
            write_text(w, source_value);
        }
        TextHistory::AsDate {
            ticks,
            timezone,
            culture,
        } => {
            w.write_u8(HISTORY_AS_DATE);
            w.write_i64(*ticks);
            w.write_string(timezone);
            w.write_string(culture);
        }
        TextHistory::Transform {
            source,
            transform_kind,
        } => {
            w.write_u8(HISTORY_TRANSFORM);
            write_text(w, source);
            w.write_u8(*transform_kind);
        }
        TextHistory::StringTableEntry { table_id, key } => {
            w.write_u8(HISTORY_STRING_TABLE_ENTRY);
            w.write_string(table_id);
            w.write_string(key);
        }
        TextHistory::None { invariant } => {
            w.write_u8(HISTORY_NONE);
            match invariant {
                Some(s) => {
                    w.write_u32(1);
                    w.write_string(s);
                }
                None => w.write_u32(0),
            }
        }
    }
}

fn write_format_args(w: &mut ByteWriter, source: &TextEntry, arguments: &[(String, TextEntry)]) {
    write_text(w, source);
    w.write_u32(arguments.len() as u32);
    for (name, value) in arguments {
        w.write_string(name);
        write_text(w, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(text: &TextEntry) -> TextEntry {
        let mut w = ByteWriter::new();
        write_text(&mut w, text);
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        let back = read_text(&mut r).unwrap();
        assert!(r.is_empty());
        back
    }

    #[test]
    fn test_base_roundtrip() {
        let text = TextEntry {
            flags: 2,
            history: TextHistory::Base {
                namespace: String::new(),
                key: "ABC123".into(),
                source_string: "Iron Ingot".into(),
            },
        };
        assert_eq!(roundtrip(&text), text);
    }

    #[test]
    fn test_none_with_invariant_roundtrip() {
        let text = TextEntry {
            flags: 0,
            history: TextHistory::None {
                invariant: Some("literal".into()),
            },
        };
        assert_eq!(roundtrip(&text), text);

        let empty = TextEntry {
            flags: 0,
            history: TextHistory::None { invariant: None },
        };
        assert_eq!(roundtrip(&empty), empty);
    }

    #[test]
    fn test_nested_named_format_roundtrip() {
        let inner = TextEntry {
            flags: 0,
            history: TextHistory::Base {
                namespace: "ns".into(),
                key: "k".into(),
                source_string: "{count} items".into(),
            },
        };
        let arg = TextEntry {
            flags: 0,
            history: TextHistory::AsNumber {
                source_value: Box::new(TextEntry {
                    flags: 0,
                    history: TextHistory::None { invariant: None },
                }),
            },
        };
        let text = TextEntry {
            flags: 1,
            history: TextHistory::NamedFormat {
                source_format: Box::new(inner),
                arguments: vec![("count".into(), arg)],
            },
        };
        assert_eq!(roundtrip(&text), text);
    }

    #[test]
    fn test_unknown_history_rejected() {
        let mut w = ByteWriter::new();
        w.write_u32(0);
        w.write_u8(99);
        let err = read_text(&mut ByteReader::new(w.as_slice())).unwrap_err();
        assert!(matches!(err, PersistError::UnknownTypeTag { .. }));
    }
}
