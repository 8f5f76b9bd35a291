use crate::chunk;
use crate::compat;
use crate::cursor::{ByteReader, ByteWriter};
use crate::error::PersistError;
use crate::format::{ALGORITHM_ZLIB, BODY_HASH_LEN, DEFAULT_MAX_CHUNK_SIZE};
use crate::object;
use crate::property::{read_object_reference, write_object_reference};
use crate::{ParseOptions, WriteOptions};
use fabrica_core::{
    ChunkSummary, CompressionInfo, Level, PartitionCell, PartitionGrid, PartitionGrids, Save,
    SaveHeader,
};

pub(crate) fn decode_save(
    name: &str,
    bytes: &[u8],
    options: &mut ParseOptions<'_>,
) -> Result<Save, PersistError> {
    let mut r = ByteReader::new(bytes);
    let header = read_save_header(&mut r)?;
    options.progress(0.0, "header parsed");
    compat::ensure_supported(header.save_version, header.header_version)?;

    let (compression, body) = chunk::inflate_chunks(&mut r)?;
    if let Some(cb) = options.on_decompressed_body.as_mut() {
        cb(&body);
    }
    options.progress(0.2, "body inflated");

    let mut br = ByteReader::new(&body);
    let declared = br.read_u64()?;
    if declared != body.len() as u64 {
        return Err(PersistError::BodyLengthMismatch {
            context: "save body".to_owned(),
            declared,
            consumed: body.len() as u64,
        });
    }
    let body_hash = read_body_hash(&mut br, &body)?;

    let grids = read_grids(&mut br)?;
    options.progress(0.4, "partition grids parsed");

    let sub_count = br.read_u32()? as usize;
    let total = sub_count + 1;
    let mut levels = Vec::with_capacity(total);
    for i in 0..total {
        let persistent = i == total - 1;
        let level_name = if persistent {
            header.level_name.clone()
        } else {
            br.read_string()?
        };
        levels.push(read_level(&mut br, level_name)?);
        let fraction = 0.4 + 0.55 * ((i + 1) as f32 / total as f32);
        options.progress(fraction, "level parsed");
    }

    if br.remaining() != 0 {
        return Err(PersistError::BodyLengthMismatch {
            context: "save body".to_owned(),
            declared: body.len() as u64,
            consumed: (body.len() - br.remaining()) as u64,
        });
    }
    options.progress(1.0, "save parsed");

    Ok(Save {
        name: name.to_owned(),
        header,
        compression: Some(compression),
        body_hash,
        grids,
        levels,
    })
}

pub(crate) fn encode_save(
    save: &Save,
    on_header: &mut dyn FnMut(&[u8]),
    on_chunk: &mut dyn FnMut(&[u8]),
    options: &mut WriteOptions<'_>,
) -> Result<Vec<ChunkSummary>, PersistError> {
    compat::ensure_supported(save.header.save_version, save.header.header_version)?;
    let body = build_body(save)?;
    if let Some(cb) = options.on_binary_before_compressing.as_mut() {
        cb(&body);
    }

    let mut hw = ByteWriter::new();
    write_save_header(&mut hw, &save.header);
    on_header(hw.as_slice());

    let info = save.compression.unwrap_or(CompressionInfo {
        algorithm: ALGORITHM_ZLIB,
        max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
        flags: 0,
    });
    chunk::deflate_chunks(&body, &info, on_chunk)
}

/// Serialize the uncompressed body, then patch in the recorded length and
/// the first eight hash bytes (crc32 + hashed byte count).
fn build_body(save: &Save) -> Result<Vec<u8>, PersistError> {
    if save.levels.is_empty() {
        return Err(PersistError::MalformedRecord {
            context: "save".to_owned(),
            position: 0,
            reason: "a save must contain at least the persistent level".to_owned(),
        });
    }

    let mut w = ByteWriter::new();
    w.write_u64(0);
    w.write_bytes(&save.body_hash);
    write_grids(&mut w, &save.grids);

    let last = save.levels.len() - 1;
    w.write_u32(last as u32);
    for (i, level) in save.levels.iter().enumerate() {
        write_level(&mut w, level, i == last)?;
    }

    let mut body = w.into_bytes();
    let total = body.len() as u64;
    body[0..8].copy_from_slice(&total.to_le_bytes());

    let hashed_from = 8 + BODY_HASH_LEN;
    let crc = crc32(&body[hashed_from..]);
    let hashed_len = (body.len() - hashed_from) as u32;
    body[8..12].copy_from_slice(&crc.to_le_bytes());
    body[12..16].copy_from_slice(&hashed_len.to_le_bytes());
    Ok(body)
}

/// The 32-byte hash block: crc32 of everything after the block, the hashed
/// byte count, then reserved bytes carried verbatim.
fn read_body_hash(br: &mut ByteReader<'_>, body: &[u8]) -> Result<[u8; 32], PersistError> {
    let raw = br.read_bytes(BODY_HASH_LEN)?;
    let mut hash = [0u8; 32];
    hash.copy_from_slice(raw);
    let hashed_from = br.position();

    let stored_crc = u32::from_le_bytes([hash[0], hash[1], hash[2], hash[3]]);
    let computed_crc = crc32(&body[hashed_from..]);
    if stored_crc != computed_crc {
        return Err(PersistError::ChecksumMismatch {
            stored: stored_crc,
            computed: computed_crc,
        });
    }

    let stored_len = u32::from_le_bytes([hash[4], hash[5], hash[6], hash[7]]);
    let actual_len = (body.len() - hashed_from) as u32;
    if stored_len != actual_len {
        return Err(PersistError::ChecksumMismatch {
            stored: stored_len,
            computed: actual_len,
        });
    }
    Ok(hash)
}

fn crc32(bytes: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

pub(crate) fn read_save_header(r: &mut ByteReader<'_>) -> Result<SaveHeader, PersistError> {
    Ok(SaveHeader {
        header_version: r.read_u32()?,
        save_version: r.read_u32()?,
        build_version: r.read_u32()?,
        level_name: r.read_string()?,
        seed: r.read_i32()?,
        session_name: r.read_string()?,
        play_duration: r.read_i32()?,
        save_date_ticks: r.read_i64()?,
        session_visibility: r.read_u8()?,
        mod_metadata: r.read_string()?,
        is_modded: r.read_u32()?,
    })
}

pub(crate) fn write_save_header(w: &mut ByteWriter, header: &SaveHeader) {
    w.write_u32(header.header_version);
    w.write_u32(header.save_version);
    w.write_u32(header.build_version);
    w.write_string(&header.level_name);
    w.write_i32(header.seed);
    w.write_string(&header.session_name);
    w.write_i32(header.play_duration);
    w.write_i64(header.save_date_ticks);
    w.write_u8(header.session_visibility);
    w.write_string(&header.mod_metadata);
    w.write_u32(header.is_modded);
}

fn read_grids(r: &mut ByteReader<'_>) -> Result<PartitionGrids, PersistError> {
    let grid_count = r.read_u32()?;
    let mut grids = Vec::with_capacity((grid_count as usize).min(r.remaining()));
    for _ in 0..grid_count {
        let name = r.read_string()?;
        let cell_size = r.read_u32()?;
        let checksum = r.read_u32()?;
        let cell_count = r.read_u32()?;
        let mut cells = Vec::with_capacity((cell_count as usize).min(r.remaining()));
        for _ in 0..cell_count {
            let cell_name = r.read_string()?;
            let x = r.read_i64()?;
            let y = r.read_i64()?;
            let instance_count = r.read_u32()?;
            let mut level_instances =
                Vec::with_capacity((instance_count as usize).min(r.remaining()));
            for _ in 0..instance_count {
                level_instances.push(r.read_string()?);
            }
            cells.push(PartitionCell {
                name: cell_name,
                x,
                y,
                level_instances,
            });
        }
        grids.push(PartitionGrid {
            name,
            cell_size,
            checksum,
            cells,
        });
    }
    Ok(PartitionGrids { grids })
}

fn write_grids(w: &mut ByteWriter, grids: &PartitionGrids) {
    w.write_u32(grids.grids.len() as u32);
    for grid in &grids.grids {
        w.write_string(&grid.name);
        w.write_u32(grid.cell_size);
        w.write_u32(grid.checksum);
        w.write_u32(grid.cells.len() as u32);
        for cell in &grid.cells {
            w.write_string(&cell.name);
            w.write_i64(cell.x);
            w.write_i64(cell.y);
            w.write_u32(cell.level_instances.len() as u32);
            for instance in &cell.level_instances {
                w.write_string(instance);
            }
        }
    }
}

fn read_level(r: &mut ByteReader<'_>, name: String) -> Result<Level, PersistError> {
    let mut objects = object::read_object_headers(r)?;

    let collectable_count = r.read_u32()?;
    let mut collectables = Vec::with_capacity((collectable_count as usize).min(r.remaining()));
    for _ in 0..collectable_count {
        collectables.push(read_object_reference(r)?);
    }

    object::read_object_bodies(r, &mut objects)?;

    let trailing_len = r.read_u32()?;
    let trailing = r.read_bytes(trailing_len as usize)?.to_vec();

    Ok(Level {
        name,
        objects,
        collectables,
        trailing,
    })
}

fn write_level(w: &mut ByteWriter, level: &Level, persistent: bool) -> Result<(), PersistError> {
    if !persistent {
        w.write_string(&level.name);
    }
    object::write_object_headers(w, &level.objects);
    w.write_u32(level.collectables.len() as u32);
    for collectable in &level.collectables {
        write_object_reference(w, collectable);
    }
    object::write_object_bodies(w, &level.objects)?;
    w.write_u32(level.trailing.len() as u32);
    w.write_bytes(&level.trailing);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_header() -> SaveHeader {
        SaveHeader {
            header_version: 14,
            save_version: 46,
            build_version: 365306,
            level_name: "Persistent_Level".into(),
            seed: 1337,
            session_name: "factory".into(),
            play_duration: 3600,
            save_date_ticks: 638_600_000_000_000_000,
            session_visibility: 1,
            mod_metadata: String::new(),
            is_modded: 0,
        }
    }

    fn minimal_save() -> Save {
        Save {
            name: "factory".into(),
            header: minimal_header(),
            compression: None,
            body_hash: [0; 32],
            grids: PartitionGrids {
                grids: vec![PartitionGrid {
                    name: "MainGrid".into(),
                    cell_size: 25600,
                    checksum: 0xCAFE,
                    cells: vec![PartitionCell {
                        name: "Cell_0_0".into(),
                        x: -3,
                        y: 9_000_000_000,
                        level_instances: vec!["LI_A".into()],
                    }],
                }],
            },
            levels: vec![Level::new("Persistent_Level")],
        }
    }

    fn encode_to_file(save: &Save) -> Vec<u8> {
        let mut header = Vec::new();
        let mut chunks = Vec::new();
        encode_save(
            save,
            &mut |h| header.extend_from_slice(h),
            &mut |c| chunks.extend_from_slice(c),
            &mut WriteOptions::default(),
        )
        .unwrap();
        header.extend_from_slice(&chunks);
        header
    }

    #[test]
    fn test_header_roundtrip() {
        let mut w = ByteWriter::new();
        write_save_header(&mut w, &minimal_header());
        let bytes = w.into_bytes();
        let back = read_save_header(&mut ByteReader::new(&bytes)).unwrap();
        assert_eq!(back, minimal_header());
    }

    #[test]
    fn test_grids_roundtrip() {
        let grids = minimal_save().grids;
        let mut w = ByteWriter::new();
        write_grids(&mut w, &grids);
        let bytes = w.into_bytes();
        let back = read_grids(&mut ByteReader::new(&bytes)).unwrap();
        assert_eq!(back, grids);
    }

    #[test]
    fn test_minimal_save_roundtrip_is_byte_identical() {
        let file = encode_to_file(&minimal_save());
        let decoded = decode_save("factory", &file, &mut ParseOptions::default()).unwrap();
        let again = encode_to_file(&decoded);
        assert_eq!(file, again);
    }

    #[test]
    fn test_decode_is_idempotent() {
        let file = encode_to_file(&minimal_save());
        let once = decode_save("factory", &file, &mut ParseOptions::default()).unwrap();
        let again = encode_to_file(&once);
        let twice = decode_save("factory", &again, &mut ParseOptions::default()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_persistent_level_named_by_header() {
        let file = encode_to_file(&minimal_save());
        let decoded = decode_save("factory", &file, &mut ParseOptions::default()).unwrap();
        assert_eq!(
            decoded.persistent_level().map(|l| l.name.as_str()),
            Some("Persistent_Level")
        );
    }

    #[test]
    fn test_old_save_rejected_before_inflation() {
        let mut save = minimal_save();
        save.header.save_version = 5;
        // bypass the encoder's own version gate by writing the header directly
        let mut w = ByteWriter::new();
        write_save_header(&mut w, &save.header);
        let err = decode_save("old", w.as_slice(), &mut ParseOptions::default()).unwrap_err();
        match err {
            PersistError::UnsupportedVersion {
                version,
                last_release,
            } => {
                assert_eq!(version, 5);
                assert_eq!(last_release, "0.0.34");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_corrupted_body_fails_checksum() {
        let save = minimal_save();
        let mut header_bytes = Vec::new();
        let mut body_copy = Vec::new();
        let mut chunks = Vec::new();
        encode_save(
            &save,
            &mut |h| header_bytes.extend_from_slice(h),
            &mut |c| chunks.extend_from_slice(c),
            &mut WriteOptions {
                on_binary_before_compressing: Some(Box::new(|b: &[u8]| {
                    body_copy.extend_from_slice(b)
                })),
            },
        )
        .unwrap();

        // flip one byte inside the hashed region and re-frame the chunks
        body_copy[60] ^= 0xFF;
        let info = CompressionInfo {
            algorithm: ALGORITHM_ZLIB,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            flags: 0,
        };
        let mut tampered = header_bytes.clone();
        chunk::deflate_chunks(&body_copy, &info, &mut |c| tampered.extend_from_slice(c)).unwrap();

        let err = decode_save("factory", &tampered, &mut ParseOptions::default()).unwrap_err();
        assert!(matches!(err, PersistError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_reserved_hash_bytes_roundtrip() {
        let mut save = minimal_save();
        save.body_hash[20] = 0xAB;
        let file = encode_to_file(&save);
        let decoded = decode_save("factory", &file, &mut ParseOptions::default()).unwrap();
        assert_eq!(decoded.body_hash[20], 0xAB);
    }

    #[test]
    fn test_sub_levels_keep_their_names() {
        let mut save = minimal_save();
        save.levels.insert(0, Level::new("Sub_Cave_01"));
        let file = encode_to_file(&save);
        let decoded = decode_save("factory", &file, &mut ParseOptions::default()).unwrap();
        assert_eq!(decoded.levels.len(), 2);
        assert_eq!(decoded.levels[0].name, "Sub_Cave_01");
        assert_eq!(decoded.levels[1].name, "Persistent_Level");
    }

    #[test]
    fn test_progress_reaches_one() {
        let file = encode_to_file(&minimal_save());
        let mut milestones = Vec::new();
        let mut options = ParseOptions {
            on_progress: Some(Box::new(|p, _| milestones.push(p))),
            ..ParseOptions::default()
        };
        decode_save("factory", &file, &mut options).unwrap();
        drop(options);
        assert_eq!(milestones.first().copied(), Some(0.0));
        assert_eq!(milestones.last().copied(), Some(1.0));
        for pair in milestones.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }
}
