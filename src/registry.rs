use crate::boxes::{BoxId, FourCC};
use crate::error::{Error, Result};
use crate::file::Mp4File;
use crate::parser::ParseOptions;
use crate::stco::{self, STCO};
use crate::util::{payload_preview, truncate};
use std::collections::HashMap;
use tracing::warn;

/// State computed once per write and handed to every write hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteContext {
    /// Output offset of the first top-level mdat's payload.
    pub mdat_payload_offset: Option<u64>,
}

/// Type-specific behaviour for one box type.
///
/// Every hook has a no-op default, so a handler only implements what its box
/// type needs.
pub trait BoxHandler: Send + Sync {
    /// One-line summary, at most `width` characters. `None` falls back to a
    /// raw payload preview.
    fn describe(&self, _file: &Mp4File, _id: BoxId, _width: usize) -> Option<String> {
        None
    }

    /// Runs once per box after the file is parsed.
    fn read(&self, _file: &mut Mp4File, _id: BoxId) -> Result<()> {
        Ok(())
    }

    /// Runs before the box is serialized.
    fn write(&self, _file: &mut Mp4File, _id: BoxId, _ctx: &WriteContext) -> Result<()> {
        Ok(())
    }
}

/// Registry of handlers keyed by box type.
///
/// The registry is immutable once constructed; use [`Registry::with_handler`]
/// to build it fluently.
pub struct Registry {
    map: HashMap<FourCC, Box<dyn BoxHandler>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Return a new registry with the given handler added.
    pub fn with_handler(mut self, typ: FourCC, handler: Box<dyn BoxHandler>) -> Self {
        self.map.insert(typ, handler);
        self
    }

    pub fn handler(&self, typ: FourCC) -> Option<&dyn BoxHandler> {
        self.map.get(&typ).map(|h| h.as_ref())
    }

    /// Summary of one box: "Container", the handler's description, or a hex
    /// preview of the payload.
    pub fn describe(&self, file: &Mp4File, id: BoxId, width: usize) -> String {
        let b = file.get(id);
        if b.is_container() {
            return truncate("Container", width);
        }
        if let Some(desc) = self.handler(b.typ).and_then(|h| h.describe(file, id, width)) {
            return truncate(&desc, width);
        }
        payload_preview(file.payload(id).unwrap_or_default(), width)
    }

    /// Run read hooks over the whole tree.
    ///
    /// Unless `opts.strict` is set, a hook rejecting a malformed box only
    /// logs it; the box keeps no decoded state and is written back verbatim.
    pub fn read_all(&self, file: &mut Mp4File, opts: &ParseOptions) -> Result<()> {
        let root = file.root();
        file.try_walk_mut(root, |f, id| {
            let Some(h) = self.handler(f.get(id).typ) else { return Ok(()) };
            match h.read(f, id) {
                Err(e @ Error::MalformedBox { .. }) if !opts.strict => {
                    warn!(typ = %f.get(id).typ, error = %e, "leaving malformed box undecoded");
                    f.get_mut(id).meta = None;
                    Ok(())
                }
                r => r,
            }
        })
    }

    /// Prepare one box for writing.
    pub fn save(&self, file: &mut Mp4File, id: BoxId, ctx: &WriteContext) -> Result<()> {
        match self.handler(file.get(id).typ) {
            Some(h) => h.write(file, id, ctx),
            None => Ok(()),
        }
    }

    /// Run write hooks over the whole tree.
    pub fn write_all(&self, file: &mut Mp4File, ctx: &WriteContext) -> Result<()> {
        let root = file.root();
        file.try_walk_mut(root, |f, id| self.save(f, id, ctx))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------- Handlers ----------

// stco: keep chunk offsets mdat-relative while the tree is in memory
pub struct StcoHandler;

impl BoxHandler for StcoHandler {
    fn describe(&self, file: &Mp4File, id: BoxId, _width: usize) -> Option<String> {
        file.get(id).chunk_offsets().map(stco::describe)
    }

    fn read(&self, file: &mut Mp4File, id: BoxId) -> Result<()> {
        stco::normalize(file, id)
    }

    fn write(&self, file: &mut Mp4File, id: BoxId, ctx: &WriteContext) -> Result<()> {
        // Boxes created after load carry no table and are written as-is.
        let Some(table) = file.get(id).chunk_offsets() else {
            return Ok(());
        };
        let base = match ctx.mdat_payload_offset {
            Some(off) => off,
            None if table.offsets.is_empty() => 0,
            None => return Err(Error::MissingMediaData),
        };
        file.edit(id)?;
        stco::denormalize(file, id, base)
    }
}

// hdlr: handler name after pre_defined, handler_type and reserved fields
pub struct HdlrHandler;

impl BoxHandler for HdlrHandler {
    fn describe(&self, file: &Mp4File, id: BoxId, _width: usize) -> Option<String> {
        let payload = file.payload(id)?;
        let name = payload.get(24..)?;
        let end = name.iter().position(|&c| c == 0).unwrap_or(name.len());
        Some(String::from_utf8_lossy(&name[..end]).into_owned())
    }
}

// ---------- Default registry ----------
pub fn default_registry() -> Registry {
    Registry::new()
        .with_handler(STCO, Box::new(StcoHandler))
        .with_handler(FourCC(*b"hdlr"), Box::new(HdlrHandler))
}
