use crate::boxes::{BoxHeader, BoxId, FourCC, Mp4Box, Payload};
use crate::error::{Error, Result};
use crate::known_boxes::{header_length, is_container};
use byteorder::{BigEndian, ByteOrder};
use tracing::warn;

/// How to react to a malformed box.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Abort the whole parse on the first malformed box. When unset, a
    /// container with a malformed descendant is kept as an opaque leaf and
    /// unparseable trailing bytes are kept verbatim.
    pub strict: bool,
}

/// Read the header of the box starting at `start`, which must end by `end`.
pub fn read_box_header(buf: &[u8], start: usize, end: usize) -> Result<BoxHeader> {
    let malformed = |reason| Error::MalformedBox { offset: start, reason };

    let end = end.min(buf.len());
    if start.checked_add(8).is_none_or(|h| h > end) {
        return Err(malformed("truncated box header"));
    }
    let size = BigEndian::read_u32(&buf[start..start + 4]);
    let typ = FourCC([buf[start + 4], buf[start + 5], buf[start + 6], buf[start + 7]]);

    if size < 8 {
        return Err(malformed("box size below 8"));
    }
    let header_size = header_length(typ);
    if (size as usize) < header_size {
        return Err(malformed("box size below its header length"));
    }
    if size as usize > end - start {
        return Err(malformed("box overruns its parent"));
    }

    Ok(BoxHeader { size, typ, header_size, start })
}

/// Parse one box (and, for containers, its whole subtree) into `arena`.
///
/// Leaf payloads are recorded as borrowed ranges of `buf`; nothing is copied.
pub(crate) fn parse_box(
    buf: &[u8],
    start: usize,
    end: usize,
    arena: &mut Vec<Mp4Box>,
    opts: &ParseOptions,
) -> Result<BoxId> {
    let h = read_box_header(buf, start, end)?;
    let box_end = start + h.size as usize;
    let payload_start = start + h.header_size;
    let opaque = Payload::Borrowed { offset: payload_start, len: box_end - payload_start };

    let payload = if is_container(h.typ) { Payload::Container } else { opaque.clone() };
    let mut b = Mp4Box::new(h.typ, buf[start + 8..payload_start].to_vec(), payload)?;
    b.size = h.size;
    b.source_offset = Some(start);

    let id = BoxId(arena.len());
    arena.push(b);

    if arena[id.0].is_container() {
        let mark = arena.len();
        match parse_children(buf, id, payload_start, box_end, arena, opts) {
            Ok(()) => {}
            Err(e) if !opts.strict => {
                warn!(typ = %h.typ, offset = start, error = %e, "keeping malformed container as opaque");
                arena.truncate(mark);
                arena[id.0].children.clear();
                arena[id.0].payload = opaque;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(id)
}

fn parse_children(
    buf: &[u8],
    parent: BoxId,
    mut pos: usize,
    end: usize,
    arena: &mut Vec<Mp4Box>,
    opts: &ParseOptions,
) -> Result<()> {
    while pos < end {
        let child = parse_box(buf, pos, end, arena, opts)?;
        arena[child.0].parent = Some(parent);
        arena[parent.0].children.push(child);
        pos += arena[child.0].size as usize;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(typ: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut v = ((8 + payload.len()) as u32).to_be_bytes().to_vec();
        v.extend_from_slice(typ);
        v.extend_from_slice(payload);
        v
    }

    #[test]
    fn header_of_meta_is_twelve_bytes() {
        let data = boxed(b"meta", &[0, 0, 0, 0]);
        let h = read_box_header(&data, 0, data.len()).unwrap();
        assert_eq!(h.size, 12);
        assert_eq!(h.header_size, 12);
    }

    #[test]
    fn meta_smaller_than_its_header_is_malformed() {
        let data = boxed(b"meta", &[]);
        assert!(matches!(
            read_box_header(&data, 0, data.len()),
            Err(Error::MalformedBox { offset: 0, .. })
        ));
    }

    #[test]
    fn truncated_header_is_malformed() {
        let data = [0u8, 0, 0, 16, b'f'];
        assert!(read_box_header(&data, 0, data.len()).is_err());
    }

    #[test]
    fn lenient_parse_keeps_bad_container_opaque() {
        // moov holding a child that claims 64 bytes
        let mut child = 64u32.to_be_bytes().to_vec();
        child.extend_from_slice(b"trak");
        let data = boxed(b"moov", &child);

        let mut arena = Vec::new();
        let id = parse_box(&data, 0, data.len(), &mut arena, &ParseOptions::default()).unwrap();
        assert_eq!(arena.len(), 1);
        assert!(arena[id.0].children.is_empty());
        assert_eq!(arena[id.0].payload, Payload::Borrowed { offset: 8, len: 8 });
    }

    #[test]
    fn strict_parse_fails_on_bad_child() {
        let mut child = 64u32.to_be_bytes().to_vec();
        child.extend_from_slice(b"trak");
        let data = boxed(b"moov", &child);

        let mut arena = Vec::new();
        let opts = ParseOptions { strict: true };
        let err = parse_box(&data, 0, data.len(), &mut arena, &opts).unwrap_err();
        assert!(matches!(err, Error::MalformedBox { offset: 8, .. }));
    }
}
