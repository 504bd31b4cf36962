//! Chunk offset (stco) rebasing.
//!
//! On load every stco table is decoded and stored relative to the start of
//! the mdat payload, so structural edits that move mdat do not invalidate it.
//! Before writing, the table is re-encoded against mdat's new position.

use crate::boxes::{BoxId, BoxMeta, ChunkOffsetTable, FourCC, Payload};
use crate::error::{Error, Result};
use crate::file::Mp4File;
use byteorder::{BigEndian, ByteOrder};

pub const STCO: FourCC = FourCC(*b"stco");

/// Source offset of the first top-level mdat's payload.
///
/// With several mdat boxes the first one wins.
pub fn source_mdat_payload_offset(file: &Mp4File) -> Result<u64> {
    let mdat = file.mdat().ok_or(Error::MissingMediaData)?;
    let b = file.get(mdat);
    let start = b.source_offset().ok_or(Error::MissingMediaData)?;
    Ok((start + b.header_len()) as u64)
}

/// Decode `[version+flags][count][count x u32]`.
pub fn decode(payload: &[u8], box_offset: usize) -> Result<Vec<u32>> {
    let malformed = |reason| Error::MalformedBox { offset: box_offset, reason };
    if payload.len() < 8 {
        return Err(malformed("chunk offset table shorter than its header"));
    }
    let count = BigEndian::read_u32(&payload[4..8]) as usize;
    let body = &payload[8..];
    if count.checked_mul(4).is_none_or(|n| n > body.len()) {
        return Err(malformed("chunk offset table overruns its box"));
    }
    Ok(body.chunks_exact(4).take(count).map(BigEndian::read_u32).collect())
}

/// Decode the table of `id` and store its offsets relative to mdat's payload.
/// An empty table needs no mdat.
pub fn normalize(file: &mut Mp4File, id: BoxId) -> Result<()> {
    let box_offset = file.get(id).source_offset().unwrap_or(0);
    let payload = file
        .payload(id)
        .ok_or(Error::InvalidOperation("chunk offset box cannot be a container"))?;
    let absolute = decode(payload, box_offset)?;

    let base = if absolute.is_empty() { 0 } else { source_mdat_payload_offset(file)? as i64 };
    let table = ChunkOffsetTable {
        chunk_count: absolute.len() as u32,
        offsets: absolute.iter().map(|&a| a as i64 - base).collect(),
    };
    file.get_mut(id).meta = Some(BoxMeta::ChunkOffsets(table));
    Ok(())
}

/// Re-encode the relative table of `id` as absolute offsets against
/// `mdat_payload_offset`. The payload must already be owned.
pub fn denormalize(file: &mut Mp4File, id: BoxId, mdat_payload_offset: u64) -> Result<()> {
    let b = file.get_mut(id);
    let table = match &mut b.meta {
        Some(BoxMeta::ChunkOffsets(t)) => t,
        None => return Err(Error::InvalidOperation("chunk offsets were never normalized")),
    };
    let Payload::Owned(buf) = &mut b.payload else {
        return Err(Error::InvalidOperation("chunk offset box must be edited before rebasing"));
    };

    let count = u32::try_from(table.offsets.len()).map_err(|_| Error::TooLarge("chunk count"))?;
    table.chunk_count = count;
    let needed = 8 + 4 * table.offsets.len();
    if buf.len() < 8 || BigEndian::read_u32(&buf[4..8]) != count || buf.len() < needed {
        buf.resize(needed, 0);
    }

    BigEndian::write_u32(&mut buf[4..8], count);
    for (slot, &rel) in buf[8..needed].chunks_exact_mut(4).zip(&table.offsets) {
        let abs = u32::try_from(rel + mdat_payload_offset as i64).map_err(|_| Error::TooLarge("chunk offset"))?;
        BigEndian::write_u32(slot, abs);
    }

    b.size = u32::try_from(8 + b.ext_header.len() + buf.len()).map_err(|_| Error::TooLarge("box size"))?;
    Ok(())
}

pub(crate) fn describe(table: &ChunkOffsetTable) -> String {
    match (table.offsets.first(), table.offsets.last()) {
        (Some(&first), Some(&last)) => format!(
            "{:4} chunks from {} to {}",
            table.chunk_count,
            signed_hex(first),
            signed_hex(last)
        ),
        _ => format!("{:4} chunks", table.chunk_count),
    }
}

// chunks stored ahead of mdat's payload are negative
fn signed_hex(v: i64) -> String {
    if v < 0 {
        format!("-{:08x}", v.unsigned_abs())
    } else {
        format!("{v:08x}")
    }
}
