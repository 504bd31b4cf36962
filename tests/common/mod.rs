#![allow(dead_code)]

use m14box::{BoxId, Mp4File};

/// `[size][typ][payload]`
pub fn boxed(typ: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&((8 + payload.len()) as u32).to_be_bytes());
    v.extend_from_slice(typ);
    v.extend_from_slice(payload);
    v
}

pub fn container(typ: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    boxed(typ, &children.concat())
}

/// ftyp with major brand, minor version and two compatible brands: 24 bytes.
pub fn ftyp() -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(b"isom");
    p.extend_from_slice(&512u32.to_be_bytes());
    p.extend_from_slice(b"isom");
    p.extend_from_slice(b"iso2");
    boxed(b"ftyp", &p)
}

pub fn stco(offsets: &[u32]) -> Vec<u8> {
    let mut p = vec![0, 0, 0, 0];
    p.extend_from_slice(&(offsets.len() as u32).to_be_bytes());
    for o in offsets {
        p.extend_from_slice(&o.to_be_bytes());
    }
    boxed(b"stco", &p)
}

/// moov/trak/mdia/minf/stbl/stco: 64 bytes with two offsets.
pub fn moov_with_stco(offsets: &[u32]) -> Vec<u8> {
    let stbl = container(b"stbl", &[stco(offsets)]);
    let minf = container(b"minf", &[stbl]);
    let mdia = container(b"mdia", &[minf]);
    let trak = container(b"trak", &[mdia]);
    container(b"moov", &[trak])
}

/// ftyp (0x00..0x18), mdat (0x18..0x60, payload at 0x20), moov (0x60..0xa0)
/// whose stco points at 0x28 and 0x50.
pub fn mdat_first_file() -> Vec<u8> {
    let payload: Vec<u8> = (0..0x40u8).collect();
    [ftyp(), boxed(b"mdat", &payload), moov_with_stco(&[0x28, 0x50])].concat()
}

/// Every box reachable from the root is listed exactly once by its parent,
/// and points back at it.
pub fn assert_tree_consistent(file: &Mp4File) {
    let root = file.root();
    assert_eq!(file.parent(root), None);
    file.walk(root, |f, id, _| {
        for &c in f.children(id) {
            assert_eq!(f.parent(c), Some(id), "child {c:?} of {id:?} points elsewhere");
            let count = f.children(id).iter().filter(|&&x| x == c).count();
            assert_eq!(count, 1, "child {c:?} listed {count} times");
        }
    });
}

pub fn first(file: &Mp4File, path: &str) -> BoxId {
    file.find(path, file.root())[0]
}
