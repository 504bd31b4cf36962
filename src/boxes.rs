use crate::error::{Error, Result};
use std::fmt;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// Code of the synthetic root container.
    pub const ROOT: FourCC = FourCC([0; 4]);

    /// Four Latin-1 characters, so `©nam` maps to `a9 6e 61 6d`.
    pub fn from_str(s: &str) -> Option<Self> {
        let b: Vec<u8> = s.chars().map(|c| u8::try_from(u32::from(c)).ok()).collect::<Option<_>>()?;
        Some(FourCC(b.try_into().ok()?))
    }
    pub fn as_str_lossy(&self) -> String {
        self.0.iter().map(|&c| if (32..=126).contains(&c) { c as char } else { '.' })
            .collect()
    }
}
impl fmt::Debug for FourCC { fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.as_str_lossy()) } }
impl fmt::Display for FourCC { fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.as_str_lossy()) } }

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxHeader {
    pub size: u32,          // total size including header
    pub typ: FourCC,
    pub header_size: usize, // 8, 12 or 16
    pub start: usize,       // offset of header start in the buffer
}

/// Stable handle of a box inside an [`Mp4File`](crate::Mp4File) arena.
///
/// Handles stay valid for the lifetime of the file, including while the box
/// is detached from the tree.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct BoxId(pub(crate) usize);

impl BoxId {
    pub fn index(&self) -> usize { self.0 }
}

/// Where a box's bytes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Read-only view into the file's shared source buffer.
    Borrowed { offset: usize, len: usize },
    /// Independently mutable copy, produced by `edit`.
    Owned(Vec<u8>),
    /// No raw bytes, only children.
    Container,
}

impl Payload {
    pub fn is_container(&self) -> bool { matches!(self, Payload::Container) }

    pub fn len(&self) -> usize {
        match self {
            Payload::Borrowed { len, .. } => *len,
            Payload::Owned(buf) => buf.len(),
            Payload::Container => 0,
        }
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

/// Decoded stco table. Offsets are mdat-relative once normalized.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChunkOffsetTable {
    pub chunk_count: u32,
    pub offsets: Vec<i64>,
}

/// Type-specific state attached by registry read hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoxMeta {
    ChunkOffsets(ChunkOffsetTable),
}

#[derive(Debug, Clone)]
pub struct Mp4Box {
    /// Total encoded length including header. Only authoritative after a write.
    pub size: u32,
    pub typ: FourCC,
    /// Bytes between the 8-byte size/type header and the payload
    /// (version+flags for `meta`, the descriptor words for `data`).
    pub(crate) ext_header: Vec<u8>,
    pub(crate) payload: Payload,
    pub(crate) parent: Option<BoxId>,
    pub(crate) children: Vec<BoxId>,
    /// Offset of the header in the source buffer, if the box was parsed.
    pub(crate) source_offset: Option<usize>,
    pub meta: Option<BoxMeta>,
}

impl Mp4Box {
    pub(crate) fn new(typ: FourCC, ext_header: Vec<u8>, payload: Payload) -> Result<Self> {
        let size = u32::try_from(8 + ext_header.len() + payload.len()).map_err(|_| Error::TooLarge("box size"))?;
        Ok(Mp4Box {
            size,
            typ,
            ext_header,
            payload,
            parent: None,
            children: Vec::new(),
            source_offset: None,
            meta: None,
        })
    }

    pub fn header_len(&self) -> usize { 8 + self.ext_header.len() }
    pub fn ext_header(&self) -> &[u8] { &self.ext_header }
    pub fn payload_state(&self) -> &Payload { &self.payload }
    pub fn is_container(&self) -> bool { self.payload.is_container() }
    pub fn parent(&self) -> Option<BoxId> { self.parent }
    pub fn source_offset(&self) -> Option<usize> { self.source_offset }
    pub fn children(&self) -> &[BoxId] { &self.children }

    pub fn chunk_offsets(&self) -> Option<&ChunkOffsetTable> {
        match &self.meta {
            Some(BoxMeta::ChunkOffsets(t)) => Some(t),
            None => None,
        }
    }

    /// For stco boxes the decoded table, not the raw payload, is what gets
    /// written: entries are re-encoded from it on every save.
    pub fn chunk_offsets_mut(&mut self) -> Option<&mut ChunkOffsetTable> {
        match &mut self.meta {
            Some(BoxMeta::ChunkOffsets(t)) => Some(t),
            None => None,
        }
    }
}
