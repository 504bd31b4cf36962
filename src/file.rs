use crate::boxes::{BoxId, FourCC, Mp4Box, Payload};
use crate::error::Result;
use crate::parser::{ParseOptions, parse_box};
use crate::registry::{Registry, default_registry};
use memmap2::Mmap;
use std::ops::{Deref, Range};
use std::path::Path;
use tracing::{debug, warn};

pub const MDAT: FourCC = FourCC(*b"mdat");

/// Read-only bytes a file was parsed from.
enum Source {
    Mapped(Mmap),
    Memory(Vec<u8>),
}

impl Deref for Source {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Source::Mapped(m) => &m[..],
            Source::Memory(v) => &v[..],
        }
    }
}

/// A parsed MP4 file: the shared source bytes plus an arena of boxes rooted
/// at a synthetic, code-less container.
///
/// Boxes are addressed by [`BoxId`]. Detached boxes stay in the arena until
/// the file is dropped, so their handles remain usable for reinsertion.
pub struct Mp4File {
    source: Source,
    pub(crate) boxes: Vec<Mp4Box>,
    root: BoxId,
    trailer: Option<Range<usize>>,
}

impl Mp4File {
    /// Map `path` read-only and parse it with the default registry.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, &ParseOptions::default(), &default_registry())
    }

    pub fn open_with(path: impl AsRef<Path>, opts: &ParseOptions, registry: &Registry) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let source = if file.metadata()?.len() == 0 {
            Source::Memory(Vec::new())
        } else {
            // SAFETY: the map is read-only and lives as long as the Mp4File.
            // Concurrent truncation of the file by another process is not defended against.
            Source::Mapped(unsafe { Mmap::map(&file)? })
        };
        debug!(path = %path.as_ref().display(), len = source.len(), "opened");
        Self::load(source, opts, registry)
    }

    /// Parse an in-memory buffer with the default registry.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_bytes_with(bytes, &ParseOptions::default(), &default_registry())
    }

    pub fn from_bytes_with(bytes: Vec<u8>, opts: &ParseOptions, registry: &Registry) -> Result<Self> {
        Self::load(Source::Memory(bytes), opts, registry)
    }

    fn load(source: Source, opts: &ParseOptions, registry: &Registry) -> Result<Self> {
        let mut boxes = vec![Mp4Box::new(FourCC::ROOT, Vec::new(), Payload::Container)?];
        boxes[0].size = 0;
        let root = BoxId(0);
        let mut trailer = None;

        let len = source.len();
        let mut pos = 0;
        while pos < len {
            match parse_box(&source, pos, len, &mut boxes, opts) {
                Ok(id) => {
                    boxes[id.0].parent = Some(root);
                    boxes[root.0].children.push(id);
                    debug!(typ = %boxes[id.0].typ, offset = pos, size = boxes[id.0].size, "parsed top-level box");
                    pos += boxes[id.0].size as usize;
                }
                Err(e) if !opts.strict => {
                    warn!(offset = pos, error = %e, "keeping unparseable trailing bytes verbatim");
                    trailer = Some(pos..len);
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        let mut file = Mp4File { source, boxes, root, trailer };
        registry.read_all(&mut file, opts)?;
        Ok(file)
    }

    /// Release the source bytes. Every box goes with it.
    pub fn close(self) {}

    pub fn root(&self) -> BoxId { self.root }

    /// # Panics
    /// If `id` was not issued by this file.
    pub fn get(&self, id: BoxId) -> &Mp4Box { &self.boxes[id.0] }

    pub fn get_mut(&mut self, id: BoxId) -> &mut Mp4Box { &mut self.boxes[id.0] }

    pub fn children(&self, id: BoxId) -> &[BoxId] { &self.boxes[id.0].children }

    pub fn parent(&self, id: BoxId) -> Option<BoxId> { self.boxes[id.0].parent }

    pub fn source(&self) -> &[u8] { &self.source }

    /// Bytes after the last parseable top-level box, kept verbatim.
    pub fn trailer(&self) -> Option<&[u8]> {
        self.trailer.clone().map(|r| &self.source[r])
    }

    /// Raw payload of a leaf, wherever it currently lives. `None` for containers.
    pub fn payload(&self, id: BoxId) -> Option<&[u8]> {
        match &self.boxes[id.0].payload {
            Payload::Borrowed { offset, len } => Some(&self.source[*offset..*offset + *len]),
            Payload::Owned(buf) => Some(buf),
            Payload::Container => None,
        }
    }

    /// First top-level mdat box.
    pub fn mdat(&self) -> Option<BoxId> {
        self.children(self.root).iter().copied().find(|&c| self.boxes[c.0].typ == MDAT)
    }

    /// Depth-first pre-order walk from `from`. The callback gets the depth
    /// relative to `from` (which is depth 0).
    pub fn walk<F: FnMut(&Mp4File, BoxId, usize)>(&self, from: BoxId, mut f: F) {
        self.walk_inner(from, 0, &mut f);
    }

    fn walk_inner<F: FnMut(&Mp4File, BoxId, usize)>(&self, id: BoxId, depth: usize, f: &mut F) {
        f(self, id, depth);
        for &c in &self.boxes[id.0].children {
            self.walk_inner(c, depth + 1, f);
        }
    }

    /// Pre-order list of `from` and its descendants.
    pub fn preorder(&self, from: BoxId) -> Vec<BoxId> {
        let mut out = Vec::new();
        self.walk(from, |_, id, _| out.push(id));
        out
    }

    /// Visit `from` and its descendants in pre-order with mutable access,
    /// stopping at the first error. The set of visited boxes is fixed before
    /// the first callback runs.
    pub fn try_walk_mut<F>(&mut self, from: BoxId, mut f: F) -> Result<()>
    where
        F: FnMut(&mut Mp4File, BoxId) -> Result<()>,
    {
        for id in self.preorder(from) {
            f(self, id)?;
        }
        Ok(())
    }

    /// Boxes at a slash-delimited path of type codes below `from`, in
    /// document order, e.g. `moov/trak/mdia`. Empty when nothing matches.
    ///
    /// Segments are read as Latin-1, so `©nam` addresses the iTunes title tag.
    pub fn find(&self, path: &str, from: BoxId) -> Vec<BoxId> {
        let mut current = vec![from];
        let mut any = false;
        for seg in path.split('/').filter(|s| !s.is_empty()) {
            let Some(code) = FourCC::from_str(seg) else { return Vec::new() };
            current = current
                .iter()
                .flat_map(|&id| self.boxes[id.0].children.iter().copied())
                .filter(|&c| self.boxes[c.0].typ == code)
                .collect();
            any = true;
        }
        if any { current } else { Vec::new() }
    }
}
