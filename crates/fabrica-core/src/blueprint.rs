use crate::object::SceneObject;
use crate::save::CompressionInfo;
use crate::types::ObjectReference;
use glam::{IVec3, Vec4};

/// An item class paired with a count; blueprint headers list these as
/// construction costs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemAmount {
    pub item_class: ObjectReference,
    pub amount: i32,
}

/// Metadata from the uncompressed companion config file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlueprintConfig {
    pub description: String,
    pub icon_id: i32,
    /// RGBA.
    pub color: Vec4,
}

/// A decoded blueprint pair: the chunked main file plus its config file.
/// Blueprints carry objects directly — no grids, no levels, no body hash.
#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    pub name: String,
    pub header_version: u32,
    pub save_version: u32,
    pub build_version: u32,
    /// Footprint in foundation units.
    pub dimensions: IVec3,
    pub item_costs: Vec<ItemAmount>,
    pub recipes: Vec<ObjectReference>,
    pub compression: Option<CompressionInfo>,
    pub objects: Vec<SceneObject>,
    pub config: BlueprintConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = BlueprintConfig::default();
        assert!(config.description.is_empty());
        assert_eq!(config.icon_id, 0);
        assert_eq!(config.color, Vec4::ZERO);
    }
}
