//! Size recomputation and byte emission.

use crate::boxes::{BoxId, Payload};
use crate::error::{Error, Result};
use crate::file::{MDAT, Mp4File};
use crate::registry::{Registry, WriteContext, default_registry};
use byteorder::{BigEndian, WriteBytesExt};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Serialize the tree under the root.
///
/// Sizes are recomputed bottom-up and every write hook runs first, so chunk
/// offset tables point into mdat wherever it ends up. Unedited boxes are
/// copied verbatim from the source.
pub fn write(file: &mut Mp4File, registry: &Registry) -> Result<Vec<u8>> {
    let ctx = layout(file)?;
    registry.write_all(file, &ctx)?;

    // Hooks may resize boxes ahead of mdat; rebase once more if it moved.
    let moved = layout(file)?;
    if moved != ctx {
        registry.write_all(file, &moved)?;
        layout(file)?;
    }

    let root = file.root();
    let mut out = Vec::new();
    for &c in file.children(root) {
        emit(file, c, &mut out)?;
    }
    if let Some(trailer) = file.trailer() {
        out.extend_from_slice(trailer);
    }
    debug!(len = out.len(), mdat_payload_offset = ?moved.mdat_payload_offset, "serialized");
    Ok(out)
}

/// Serialize into a temporary file next to `path`, then rename it into place.
/// The destination is never truncated, so `path` may be the file the tree
/// was mapped from.
pub fn write_to(file: &mut Mp4File, registry: &Registry, path: &Path) -> Result<()> {
    let bytes = write(file, registry)?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    debug!(path = %path.display(), len = bytes.len(), "wrote file");
    Ok(())
}

/// Recompute every box size and locate mdat in the output.
fn layout(file: &mut Mp4File) -> Result<WriteContext> {
    let root = file.root();
    let mut pos = 0u64;
    let mut mdat_payload_offset = None;
    for c in file.children(root).to_vec() {
        let size = update_size(file, c)?;
        let b = file.get(c);
        if mdat_payload_offset.is_none() && b.typ == MDAT {
            mdat_payload_offset = Some(pos + b.header_len() as u64);
        }
        pos += size;
    }
    Ok(WriteContext { mdat_payload_offset })
}

fn update_size(file: &mut Mp4File, id: BoxId) -> Result<u64> {
    let b = file.get(id);
    let mut total = b.header_len() as u64;
    if b.is_container() {
        for c in b.children().to_vec() {
            total += update_size(file, c)?;
        }
    } else {
        total += b.payload_state().len() as u64;
    }
    file.get_mut(id).size = u32::try_from(total).map_err(|_| Error::TooLarge("box size"))?;
    Ok(total)
}

fn emit(file: &Mp4File, id: BoxId, out: &mut Vec<u8>) -> Result<()> {
    let b = file.get(id);
    out.write_u32::<BigEndian>(b.size)?;
    out.extend_from_slice(&b.typ.0);
    out.extend_from_slice(b.ext_header());
    match b.payload_state() {
        Payload::Container => {
            for &c in b.children() {
                emit(file, c, out)?;
            }
        }
        Payload::Borrowed { .. } | Payload::Owned(_) => {
            out.extend_from_slice(file.payload(id).unwrap_or_default());
        }
    }
    Ok(())
}

impl Mp4File {
    /// [`write`] with the default registry.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        write(self, &default_registry())
    }

    /// [`write_to`] with the default registry.
    pub fn write_to(&mut self, path: impl AsRef<Path>) -> Result<()> {
        write_to(self, &default_registry(), path.as_ref())
    }
}
