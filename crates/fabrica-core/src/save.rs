use crate::object::SceneObject;
use crate::types::ObjectReference;

/// Compression parameters observed on the first chunk of a stream. Captured
/// at decode, required again at encode so a round-trip reproduces the same
/// framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionInfo {
    pub algorithm: u8,
    /// Upper bound on one chunk's uncompressed size.
    pub max_chunk_size: u64,
    pub flags: u8,
}

/// Per-chunk accounting returned by the encoder; consumers stream this to
/// disk alongside the chunk callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSummary {
    pub uncompressed_size: u64,
    pub compressed_size: u64,
    /// Byte offset of this framed chunk within the emitted chunk stream.
    pub offset: u64,
}

/// The uncompressed header at the front of every save stream.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SaveHeader {
    pub header_version: u32,
    pub save_version: u32,
    pub build_version: u32,
    /// Name of the persistent level; the level itself is unnamed on disk.
    pub level_name: String,
    pub seed: i32,
    pub session_name: String,
    /// Seconds of play time.
    pub play_duration: i32,
    /// .NET-style ticks.
    pub save_date_ticks: i64,
    pub session_visibility: u8,
    pub mod_metadata: String,
    /// uint32 boolean on disk; kept raw.
    pub is_modded: u32,
}

/// Spatial partition grids. The codec round-trips this tree verbatim and
/// attaches no meaning to it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartitionGrids {
    pub grids: Vec<PartitionGrid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionGrid {
    pub name: String,
    pub cell_size: u32,
    pub checksum: u32,
    pub cells: Vec<PartitionCell>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionCell {
    pub name: String,
    pub x: i64,
    pub y: i64,
    pub level_instances: Vec<String>,
}

/// One level and everything it owns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Level {
    pub name: String,
    pub objects: Vec<SceneObject>,
    pub collectables: Vec<ObjectReference>,
    /// Opaque trailing bytes, length-prefixed on disk.
    pub trailing: Vec<u8>,
}

impl Level {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A fully decoded save. Levels are ordered as on disk, the persistent
/// level last.
#[derive(Debug, Clone, PartialEq)]
pub struct Save {
    pub name: String,
    pub header: SaveHeader,
    pub compression: Option<CompressionInfo>,
    /// 32-byte block after the body length. Bytes 0..8 are recomputed on
    /// encode (crc32 + hashed byte count); the rest round-trips verbatim.
    pub body_hash: [u8; 32],
    pub grids: PartitionGrids,
    pub levels: Vec<Level>,
}

impl Save {
    /// The persistent level, which every well-formed save has.
    pub fn persistent_level(&self) -> Option<&Level> {
        self.levels.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistent_level_is_last() {
        let save = Save {
            name: "session".into(),
            header: SaveHeader::default(),
            compression: None,
            body_hash: [0; 32],
            grids: PartitionGrids::default(),
            levels: vec![Level::new("Sub_1"), Level::new("Persistent_Level")],
        };
        assert_eq!(save.persistent_level().map(|l| l.name.as_str()), Some("Persistent_Level"));
    }
}
