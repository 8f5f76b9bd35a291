//! Chunked compression framing. A stream's body is carried as a sequence
//! of independently deflated chunks, each preceded by a fixed header that
//! declares its compressed and uncompressed sizes twice.

use crate::cursor::{ByteReader, ByteWriter};
use crate::error::PersistError;
use crate::format::{
    ALGORITHM_ZLIB, CHUNK_HEADER_SIZE, PACKAGE_FILE_TAG, PACKAGE_FILE_VERSION,
};
use fabrica_core::{ChunkSummary, CompressionInfo};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

struct ChunkHeader {
    max_chunk_size: u64,
    algorithm: u8,
    compressed_size: u64,
    uncompressed_size: u64,
    flags: u8,
}

fn read_chunk_header(r: &mut ByteReader<'_>) -> Result<ChunkHeader, PersistError> {
    let start = r.position();
    let malformed = |reason: String| PersistError::MalformedChunkHeader {
        position: start,
        reason,
    };

    let tag = r.read_u64()?;
    if tag != PACKAGE_FILE_TAG {
        return Err(malformed(format!("bad package file tag {tag:#018x}")));
    }
    let version = r.read_u32()?;
    if version != PACKAGE_FILE_VERSION {
        return Err(malformed(format!("unsupported package file version {version}")));
    }
    let max_chunk_size = r.read_u64()?;
    let algorithm = r.read_u8()?;
    if algorithm != ALGORITHM_ZLIB {
        return Err(malformed(format!("unknown compression algorithm {algorithm}")));
    }
    let compressed_size = r.read_u64()?;
    let uncompressed_size = r.read_u64()?;
    let compressed_again = r.read_u64()?;
    let uncompressed_again = r.read_u64()?;
    if compressed_size != compressed_again || uncompressed_size != uncompressed_again {
        return Err(malformed("size summary pairs disagree".to_owned()));
    }
    let flags = r.read_u8()?;
    Ok(ChunkHeader {
        max_chunk_size,
        algorithm,
        compressed_size,
        uncompressed_size,
        flags,
    })
}

fn write_chunk_header(
    w: &mut ByteWriter,
    info: &CompressionInfo,
    compressed_size: u64,
    uncompressed_size: u64,
) {
    w.write_u64(PACKAGE_FILE_TAG);
    w.write_u32(PACKAGE_FILE_VERSION);
    w.write_u64(info.max_chunk_size);
    w.write_u8(info.algorithm);
    w.write_u64(compressed_size);
    w.write_u64(uncompressed_size);
    w.write_u64(compressed_size);
    w.write_u64(uncompressed_size);
    w.write_u8(info.flags);
}

/// Inflate every chunk remaining in `reader` into one contiguous body.
/// Returns the compression parameters observed on the first chunk; later
/// chunks must agree with them.
pub fn inflate_chunks(
    reader: &mut ByteReader<'_>,
) -> Result<(CompressionInfo, Vec<u8>), PersistError> {
    let mut info: Option<CompressionInfo> = None;
    let mut body = Vec::new();
    let mut index = 0usize;

    while !reader.is_empty() {
        let at = reader.position();
        let header = read_chunk_header(reader)?;
        let chunk_info = CompressionInfo {
            algorithm: header.algorithm,
            max_chunk_size: header.max_chunk_size,
            flags: header.flags,
        };
        match info {
            None => info = Some(chunk_info),
            Some(first) if first != chunk_info => {
                return Err(PersistError::MalformedChunkHeader {
                    position: at,
                    reason: "compression info changed between chunks".to_owned(),
                });
            }
            Some(_) => {}
        }

        let compressed = reader.read_bytes(header.compressed_size as usize)?;
        let mut inflated = Vec::with_capacity(header.uncompressed_size as usize);
        // cap the inflate at declared size + 1 so an overlong chunk fails
        // the size check instead of growing without bound
        ZlibDecoder::new(compressed)
            .take(header.uncompressed_size + 1)
            .read_to_end(&mut inflated)
            .map_err(|e| PersistError::Compression {
                index,
                message: format!("inflate failed: {e}"),
            })?;
        if inflated.len() as u64 != header.uncompressed_size {
            return Err(PersistError::ChunkSizeMismatch {
                index,
                expected: header.uncompressed_size,
                actual: inflated.len() as u64,
            });
        }
        body.extend_from_slice(&inflated);
        index += 1;
    }

    match info {
        Some(info) => Ok((info, body)),
        None => Err(PersistError::MalformedChunkHeader {
            position: reader.position(),
            reason: "stream contains no chunks".to_owned(),
        }),
    }
}

/// Slice `body` into bounded pieces, deflate each, and hand every framed
/// chunk (header + compressed bytes) to `on_chunk` in emission order.
/// Offsets in the returned summaries are monotonic and count framed bytes.
pub fn deflate_chunks(
    body: &[u8],
    info: &CompressionInfo,
    on_chunk: &mut dyn FnMut(&[u8]),
) -> Result<Vec<ChunkSummary>, PersistError> {
    let piece_size = info.max_chunk_size.max(1) as usize;
    let mut summaries = Vec::with_capacity(body.len() / piece_size + 1);
    let mut offset = 0u64;

    for (index, piece) in body.chunks(piece_size).enumerate() {
        let deflate_err = |e: std::io::Error| PersistError::Compression {
            index,
            message: format!("deflate failed: {e}"),
        };
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(piece).map_err(deflate_err)?;
        let compressed = encoder.finish().map_err(deflate_err)?;

        let mut w = ByteWriter::with_capacity(CHUNK_HEADER_SIZE + compressed.len());
        write_chunk_header(&mut w, info, compressed.len() as u64, piece.len() as u64);
        w.write_bytes(&compressed);
        let framed = w.into_bytes();

        summaries.push(ChunkSummary {
            uncompressed_size: piece.len() as u64,
            compressed_size: compressed.len() as u64,
            offset,
        });
        on_chunk(&framed);
        offset += framed.len() as u64;
    }
    Ok(summaries)
}
