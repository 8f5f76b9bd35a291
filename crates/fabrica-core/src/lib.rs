//! In-memory object model for fabrica save and blueprint files.
//!
//! These types mirror the on-disk structure one-to-one so that the codec in
//! `fabrica-persist` can round-trip a stream byte-identically. Nothing here
//! interprets gameplay data; opaque regions of the format are carried as raw
//! bytes.

pub mod blueprint;
pub mod object;
pub mod property;
pub mod save;
pub mod types;

pub use blueprint::{Blueprint, BlueprintConfig, ItemAmount};
pub use object::{ComponentObject, EntityObject, ObjectTransform, SceneObject};
pub use property::{
    AccountIdEntry, ArrayValue, ByteValue, Property, PropertyValue, StructPayload, TextEntry,
    TextHistory, ValueBody,
};
pub use save::{
    ChunkSummary, CompressionInfo, Level, PartitionCell, PartitionGrid, PartitionGrids, Save,
    SaveHeader,
};
pub use types::{Guid, ObjectReference};
