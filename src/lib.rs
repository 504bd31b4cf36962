pub mod boxes;
pub mod describe;
pub mod error;
pub mod file;
pub mod json_api;
pub mod known_boxes;
mod mutate;
pub mod parser;
pub mod registry;
pub mod stco;
pub mod util;
pub mod writer;

pub use boxes::{BoxHeader, BoxId, BoxMeta, ChunkOffsetTable, FourCC, Mp4Box, Payload};
pub use describe::{PrintOptions, print_tree};
pub use error::{Error, Result};
pub use file::Mp4File;
pub use parser::{ParseOptions, read_box_header};
pub use registry::{BoxHandler, Registry, WriteContext, default_registry};
