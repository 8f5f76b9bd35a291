use thiserror::Error;

/// Errors produced while decoding or encoding save and blueprint streams.
///
/// The codec never swallows or retries: the first failure aborts the whole
/// operation and no partial result is returned.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("save version {version} is no longer supported; open it with release {last_release} or earlier")]
    UnsupportedVersion {
        version: u32,
        last_release: &'static str,
    },

    #[error("unexpected end of stream at byte {position} (needed {needed} more bytes)")]
    UnexpectedEndOfStream { position: usize, needed: usize },

    #[error("malformed string (length prefix {length}) at byte {position}")]
    MalformedString { position: usize, length: i32 },

    #[error("malformed guid flag {flag:#04x} at byte {position}")]
    MalformedGuid { position: usize, flag: u8 },

    #[error("malformed chunk header at byte {position}: {reason}")]
    MalformedChunkHeader { position: usize, reason: String },

    #[error("chunk {index} inflated to {actual} bytes, header declared {expected}")]
    ChunkSizeMismatch {
        index: usize,
        expected: u64,
        actual: u64,
    },

    /// Usually means the struct dispatcher is missing a type; worth a bug
    /// report when it fires on a pristine file.
    #[error("body length mismatch in {context}: declared {declared}, consumed {consumed}")]
    BodyLengthMismatch {
        context: String,
        declared: u64,
        consumed: u64,
    },

    #[error("unknown property type tag `{tag}` at byte {position}")]
    UnknownTypeTag { position: usize, tag: String },

    #[error("body checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    #[error("invalid boolean byte {value} at byte {position}")]
    InvalidBoolean { position: usize, value: u8 },

    #[error("object header/body count mismatch: {headers} headers, {bodies} bodies")]
    ObjectCountMismatch { headers: u32, bodies: u32 },

    #[error("malformed record `{context}` at byte {position}: {reason}")]
    MalformedRecord {
        context: String,
        position: usize,
        reason: String,
    },

    #[error("chunk {index}: {message}")]
    Compression { index: usize, message: String },
}
