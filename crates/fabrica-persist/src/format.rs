//! On-disk constants shared by the decoder and the encoder, so the two can
//! never disagree about framing or version cutoffs.

/// 8-byte sentinel beginning every compressed chunk header.
pub const PACKAGE_FILE_TAG: u64 = 0x2222_2222_9E2A_83C1;

/// Chunk framing version.
pub const PACKAGE_FILE_VERSION: u32 = 3;

/// Compression algorithm discriminator for zlib, the only supported codec.
pub const ALGORITHM_ZLIB: u8 = 3;

/// Default upper bound on one chunk's uncompressed size.
pub const DEFAULT_MAX_CHUNK_SIZE: u64 = 128 * 1024;

/// Serialized size of a chunk header: tag (8) + version (4) + max chunk
/// size (8) + algorithm (1) + two size pairs (32) + flags (1).
pub const CHUNK_HEADER_SIZE: usize = 54;

/// Size of the body hash block at the start of an inflated save body.
pub const BODY_HASH_LEN: usize = 32;

/// First save version of the U6 line; anything older is rejected outright.
pub const SAVE_VERSION_U6: u32 = 29;

/// First save version of the U8 line.
pub const SAVE_VERSION_U8: u32 = 34;

/// First save version of the current line.
pub const SAVE_VERSION_CURRENT: u32 = 46;

/// First header version of the current line.
pub const HEADER_VERSION_CURRENT: u32 = 14;

/// Sentinel name closing every property list. No real property may use it.
pub const PROPERTY_LIST_END: &str = "None";
