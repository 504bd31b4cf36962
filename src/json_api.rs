use crate::{
    boxes::{BoxId, Payload},
    file::Mp4File,
    registry::Registry,
};
use serde::Serialize;

/// A JSON-serializable view of one box and its subtree.
///
/// Used for `m14dump --json` and for tools that want the tree without
/// linking against the arena types.
#[derive(Debug, Serialize)]
pub struct JsonBox {
    pub typ: String,
    pub size: u32,
    /// Header offset in the source file; `None` for boxes created in memory.
    pub offset: Option<usize>,
    pub header_size: usize,
    /// "container", "borrowed" or "owned".
    pub kind: &'static str,
    pub payload_size: Option<usize>,
    pub description: String,
    pub children: Option<Vec<JsonBox>>,
}

/// Top-level boxes of `file` as JSON values. Descriptions are cut to `width`.
pub fn tree_to_json(file: &Mp4File, registry: &Registry, width: usize) -> Vec<JsonBox> {
    file.children(file.root())
        .iter()
        .map(|&c| box_to_json(file, c, registry, width))
        .collect()
}

pub fn box_to_json(file: &Mp4File, id: BoxId, registry: &Registry, width: usize) -> JsonBox {
    let b = file.get(id);
    let (kind, payload_size, children) = match b.payload_state() {
        Payload::Container => {
            let kids = b
                .children()
                .iter()
                .map(|&c| box_to_json(file, c, registry, width))
                .collect();
            ("container", None, Some(kids))
        }
        Payload::Borrowed { len, .. } => ("borrowed", Some(*len), None),
        Payload::Owned(buf) => ("owned", Some(buf.len()), None),
    };

    JsonBox {
        typ: b.typ.to_string(),
        size: b.size,
        offset: b.source_offset(),
        header_size: b.header_len(),
        kind,
        payload_size,
        description: registry.describe(file, id, width),
        children,
    }
}
