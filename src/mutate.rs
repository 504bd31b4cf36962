//! Structural edits and copy-on-write promotion of payloads.

use crate::boxes::{BoxId, FourCC, Mp4Box, Payload};
use crate::error::{Error, Result};
use crate::file::Mp4File;
use crate::known_boxes::{header_length, is_container};

impl Mp4File {
    /// Move `child` to the end of `dest`'s children, detaching it from its
    /// current parent first.
    pub fn append(&mut self, dest: BoxId, child: BoxId) -> Result<()> {
        self.insert(dest, child, false)
    }

    /// Move `child` to the front of `dest`'s children, detaching it from its
    /// current parent first.
    pub fn prepend(&mut self, dest: BoxId, child: BoxId) -> Result<()> {
        self.insert(dest, child, true)
    }

    fn insert(&mut self, dest: BoxId, child: BoxId, front: bool) -> Result<()> {
        if !self.boxes[dest.0].is_container() {
            return Err(Error::InvalidOperation("destination is not a container"));
        }
        if child == self.root() {
            return Err(Error::InvalidOperation("the root cannot be moved"));
        }
        if self.is_ancestor_or_self(child, dest) {
            return Err(Error::InvalidOperation("a box cannot contain itself"));
        }

        if self.boxes[child.0].parent.is_some() {
            self.detach(child)?;
        }
        let kids = &mut self.boxes[dest.0].children;
        if front {
            kids.insert(0, child);
        } else {
            kids.push(child);
        }
        self.boxes[child.0].parent = Some(dest);
        Ok(())
    }

    /// Remove `child` from its parent, keeping the order of its siblings.
    /// The box stays in the arena as an orphan.
    pub fn detach(&mut self, child: BoxId) -> Result<()> {
        let parent = self.boxes[child.0]
            .parent
            .take()
            .ok_or(Error::InvalidOperation("box has no parent"))?;
        self.boxes[parent.0].children.retain(|&c| c != child);
        Ok(())
    }

    fn is_ancestor_or_self(&self, ancestor: BoxId, mut id: BoxId) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.boxes[id.0].parent {
                Some(p) => id = p,
                None => return false,
            }
        }
    }

    /// Promote a borrowed payload to an owned copy so it can be changed.
    /// Calling it again is a no-op.
    pub fn edit(&mut self, id: BoxId) -> Result<()> {
        let owned = match &self.boxes[id.0].payload {
            Payload::Owned(_) => return Ok(()),
            Payload::Container => return Err(Error::InvalidOperation("containers have no payload to edit")),
            Payload::Borrowed { offset, len } => self.source()[*offset..*offset + *len].to_vec(),
        };
        self.boxes[id.0].payload = Payload::Owned(owned);
        Ok(())
    }

    /// Mutable payload of a leaf, promoting it with [`edit`](Self::edit) first.
    ///
    /// An stco box with a decoded table is re-encoded from that table when
    /// written, so raw edits to its entries are overwritten. Change offsets
    /// through [`Mp4Box::chunk_offsets_mut`] instead.
    pub fn payload_mut(&mut self, id: BoxId) -> Result<&mut Vec<u8>> {
        self.edit(id)?;
        match &mut self.boxes[id.0].payload {
            Payload::Owned(buf) => Ok(buf),
            _ => Err(Error::InvalidOperation("containers have no payload to edit")),
        }
    }

    /// New orphan leaf with an owned payload. Extended header bytes are zeroed.
    /// Fails with `TooLarge` when the box would not fit a 32-bit size.
    pub fn new_leaf(&mut self, typ: FourCC, payload: Vec<u8>) -> Result<BoxId> {
        if is_container(typ) {
            return Err(Error::InvalidOperation("type is a container"));
        }
        Ok(self.push(Mp4Box::new(typ, vec![0; header_length(typ) - 8], Payload::Owned(payload))?))
    }

    /// New empty orphan container.
    pub fn new_container(&mut self, typ: FourCC) -> Result<BoxId> {
        if typ == FourCC::ROOT || !is_container(typ) {
            return Err(Error::InvalidOperation("type is not a container"));
        }
        Ok(self.push(Mp4Box::new(typ, vec![0; header_length(typ) - 8], Payload::Container)?))
    }

    /// Deep copy of `id` and its subtree as an orphan. Borrowed payloads stay
    /// borrowed; decoded metadata is copied.
    pub fn clone_subtree(&mut self, id: BoxId) -> Result<BoxId> {
        if id == self.root() {
            return Err(Error::InvalidOperation("the root cannot be copied"));
        }
        Ok(self.clone_inner(id))
    }

    fn clone_inner(&mut self, id: BoxId) -> BoxId {
        let mut copy = self.boxes[id.0].clone();
        copy.parent = None;
        let kids = std::mem::take(&mut copy.children);
        let new_id = self.push(copy);
        for kid in kids {
            let kid_copy = self.clone_inner(kid);
            self.boxes[kid_copy.0].parent = Some(new_id);
            self.boxes[new_id.0].children.push(kid_copy);
        }
        new_id
    }

    fn push(&mut self, b: Mp4Box) -> BoxId {
        self.boxes.push(b);
        BoxId(self.boxes.len() - 1)
    }
}
