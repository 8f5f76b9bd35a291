use crate::chunk;
use crate::compat;
use crate::cursor::{ByteReader, ByteWriter};
use crate::error::PersistError;
use crate::format::{ALGORITHM_ZLIB, DEFAULT_MAX_CHUNK_SIZE};
use crate::object;
use crate::property::{read_object_reference, write_object_reference};
use crate::{ParseOptions, WriteOptions};
use fabrica_core::{Blueprint, BlueprintConfig, ChunkSummary, CompressionInfo, ItemAmount};
use glam::{IVec3, Vec4};

pub(crate) fn decode_blueprint(
    name: &str,
    main_bytes: &[u8],
    config_bytes: &[u8],
    options: &mut ParseOptions<'_>,
) -> Result<Blueprint, PersistError> {
    let mut r = ByteReader::new(main_bytes);
    let header_version = r.read_u32()?;
    let save_version = r.read_u32()?;
    let build_version = r.read_u32()?;
    compat::ensure_supported(save_version, header_version)?;

    let dimensions = IVec3::new(r.read_i32()?, r.read_i32()?, r.read_i32()?);

    let cost_count = r.read_u32()?;
    let mut item_costs = Vec::with_capacity((cost_count as usize).min(r.remaining()));
    for _ in 0..cost_count {
        item_costs.push(ItemAmount {
            item_class: read_object_reference(&mut r)?,
            amount: r.read_i32()?,
        });
    }

    let recipe_count = r.read_u32()?;
    let mut recipes = Vec::with_capacity((recipe_count as usize).min(r.remaining()));
    for _ in 0..recipe_count {
        recipes.push(read_object_reference(&mut r)?);
    }
    options.progress(0.1, "blueprint header parsed");

    let (compression, body) = chunk::inflate_chunks(&mut r)?;
    if let Some(cb) = options.on_decompressed_body.as_mut() {
        cb(&body);
    }
    options.progress(0.4, "body inflated");

    let mut br = ByteReader::new(&body);
    let declared = br.read_u64()?;
    if declared != body.len() as u64 {
        return Err(PersistError::BodyLengthMismatch {
            context: "blueprint body".to_owned(),
            declared,
            consumed: body.len() as u64,
        });
    }
    let mut objects = object::read_object_headers(&mut br)?;
    object::read_object_bodies(&mut br, &mut objects)?;
    if br.remaining() != 0 {
        return Err(PersistError::BodyLengthMismatch {
            context: "blueprint body".to_owned(),
            declared: body.len() as u64,
            consumed: (body.len() - br.remaining()) as u64,
        });
    }

    let config = decode_config(config_bytes)?;
    options.progress(1.0, "blueprint parsed");

    Ok(Blueprint {
        name: name.to_owned(),
        header_version,
        save_version,
        build_version,
        dimensions,
        item_costs,
        recipes,
        compression: Some(compression),
        objects,
        config,
    })
}

pub(crate) fn encode_blueprint(
    blueprint: &Blueprint,
    on_header: &mut dyn FnMut(&[u8]),
    on_chunk: &mut dyn FnMut(&[u8]),
    options: &mut WriteOptions<'_>,
) -> Result<(Vec<ChunkSummary>, Vec<u8>), PersistError> {
    compat::ensure_supported(blueprint.save_version, blueprint.header_version)?;

    let mut bw = ByteWriter::new();
    bw.write_u64(0);
    object::write_object_headers(&mut bw, &blueprint.objects);
    object::write_object_bodies(&mut bw, &blueprint.objects)?;
    let total = bw.position() as u64;
    bw.patch_u64(0, total);
    let body = bw.into_bytes();

    if let Some(cb) = options.on_binary_before_compressing.as_mut() {
        cb(&body);
    }

    let mut hw = ByteWriter::new();
    hw.write_u32(blueprint.header_version);
    hw.write_u32(blueprint.save_version);
    hw.write_u32(blueprint.build_version);
    hw.write_i32(blueprint.dimensions.x);
    hw.write_i32(blueprint.dimensions.y);
    hw.write_i32(blueprint.dimensions.z);
    hw.write_u32(blueprint.item_costs.len() as u32);
    for cost in &blueprint.item_costs {
        write_object_reference(&mut hw, &cost.item_class);
        hw.write_i32(cost.amount);
    }
    hw.write_u32(blueprint.recipes.len() as u32);
    for recipe in &blueprint.recipes {
        write_object_reference(&mut hw, recipe);
    }
    on_header(hw.as_slice());

    let info = blueprint.compression.unwrap_or(CompressionInfo {
        algorithm: ALGORITHM_ZLIB,
        max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
        flags: 0,
    });
    let summaries = chunk::deflate_chunks(&body, &info, on_chunk)?;
    Ok((summaries, encode_config(&blueprint.config)))
}

fn decode_config(bytes: &[u8]) -> Result<BlueprintConfig, PersistError> {
    let mut r = ByteReader::new(bytes);
    let config = BlueprintConfig {
        description: r.read_string()?,
        icon_id: r.read_i32()?,
        color: Vec4::new(r.read_f32()?, r.read_f32()?, r.read_f32()?, r.read_f32()?),
    };
    if r.remaining() != 0 {
        return Err(PersistError::BodyLengthMismatch {
            context: "blueprint config".to_owned(),
            declared: bytes.len() as u64,
            consumed: (bytes.len() - r.remaining()) as u64,
        });
    }
    Ok(config)
}

fn encode_config(config: &BlueprintConfig) -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.write_string(&config.description);
    w.write_i32(config.icon_id);
    w.write_f32(config.color.x);
    w.write_f32(config.color.y);
    w.write_f32(config.color.z);
    w.write_f32(config.color.w);
    w.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabrica_core::{
        EntityObject, ObjectReference, Property, PropertyValue, SceneObject,
    };

    fn sample_blueprint() -> Blueprint {
        Blueprint {
            name: "iron_line".into(),
            header_version: 14,
            save_version: 46,
            build_version: 365306,
            dimensions: IVec3::new(4, 4, 2),
            item_costs: vec![ItemAmount {
                item_class: ObjectReference::new("", "Desc_IronPlate"),
                amount: 12,
            }],
            recipes: vec![ObjectReference::new("", "Recipe_ConveyorBeltMk1")],
            compression: None,
            objects: vec![SceneObject::Entity(EntityObject {
                type_path: "/Game/Buildable/Smelter".into(),
                instance_name: "Smelter_1".into(),
                properties: vec![Property::new("mIsProducing", PropertyValue::Bool(true))],
                ..EntityObject::default()
            })],
            config: BlueprintConfig {
                description: "one smelter, two belts".into(),
                icon_id: 42,
                color: Vec4::new(0.5, 0.25, 0.125, 1.0),
            },
        }
    }

    fn encode_pair(blueprint: &Blueprint) -> (Vec<u8>, Vec<u8>) {
        let mut main = Vec::new();
        let mut chunks = Vec::new();
        let (_, config) = encode_blueprint(
            blueprint,
            &mut |h| main.extend_from_slice(h),
            &mut |c| chunks.extend_from_slice(c),
            &mut WriteOptions::default(),
        )
        .unwrap();
        main.extend_from_slice(&chunks);
        (main, config)
    }

    #[test]
    fn test_blueprint_pair_roundtrip_is_byte_identical() {
        let (main, config) = encode_pair(&sample_blueprint());
        let decoded =
            decode_blueprint("iron_line", &main, &config, &mut ParseOptions::default()).unwrap();
        let (main_again, config_again) = encode_pair(&decoded);
        assert_eq!(main, main_again);
        assert_eq!(config, config_again);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = BlueprintConfig {
            description: "Förderband".into(),
            icon_id: -1,
            color: Vec4::new(0.0, 0.0, 0.0, 0.0),
        };
        let bytes = encode_config(&config);
        assert_eq!(decode_config(&bytes).unwrap(), config);
    }

    #[test]
    fn test_config_with_trailing_garbage_rejected() {
        let mut bytes = encode_config(&BlueprintConfig::default());
        bytes.push(0xFF);
        let err = decode_config(&bytes).unwrap_err();
        assert!(matches!(err, PersistError::BodyLengthMismatch { .. }));
    }

    #[test]
    fn test_old_blueprint_rejected() {
        let mut w = ByteWriter::new();
        w.write_u32(13);
        w.write_u32(42);
        w.write_u32(200000);
        let err = decode_blueprint("old", w.as_slice(), &[], &mut ParseOptions::default())
            .unwrap_err();
        match err {
            PersistError::UnsupportedVersion { last_release, .. } => {
                assert_eq!(last_release, "0.4.28")
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_chunk_sum_matches_recorded_body_length() {
        let blueprint = sample_blueprint();
        let mut recorded = 0u64;
        let mut chunks = Vec::new();
        let (summaries, _) = encode_blueprint(
            &blueprint,
            &mut |_h| {},
            &mut |c| chunks.extend_from_slice(c),
            &mut WriteOptions {
                on_binary_before_compressing: Some(Box::new(|body: &[u8]| {
                    recorded = u64::from_le_bytes(body[0..8].try_into().unwrap());
                })),
            },
        )
        .unwrap();
        let total: u64 = summaries.iter().map(|s| s.uncompressed_size).sum();
        assert_eq!(total, recorded);
    }
}
