mod common;

use common::{assert_tree_consistent, boxed, container};
use m14box::{Error, FourCC, Mp4File, ParseOptions, Payload, default_registry, read_box_header};

fn make_minimal_file() -> Vec<u8> {
    // ftyp: 16 bytes
    let mut v = boxed(b"ftyp", b"isom\0\0\x02\0");
    // moov holding one empty trak
    v.extend(container(b"moov", &[boxed(b"trak", &[])]));
    // mdat: 100 bytes
    v.extend(boxed(b"mdat", &[0xab; 92]));
    v
}

#[test]
fn read_single_ftyp_header() {
    let data = make_minimal_file();
    let hdr = read_box_header(&data, 0, data.len()).expect("read_box_header failed");

    assert_eq!(hdr.start, 0);
    assert_eq!(hdr.size, 16);
    assert_eq!(hdr.typ, FourCC(*b"ftyp"));
    assert_eq!(hdr.header_size, 8);
}

#[test]
fn parses_ftyp_moov_mdat() {
    let file = Mp4File::from_bytes(make_minimal_file()).expect("parse failed");
    let root = file.root();
    let kids = file.children(root);
    assert_eq!(kids.len(), 3);

    let types: Vec<_> = kids.iter().map(|&k| file.get(k).typ).collect();
    assert_eq!(types, [FourCC(*b"ftyp"), FourCC(*b"moov"), FourCC(*b"mdat")]);

    let moov = file.get(kids[1]);
    assert!(moov.is_container());
    assert_eq!(moov.children().len(), 1);
    assert_eq!(file.get(moov.children()[0]).typ, FourCC(*b"trak"));

    let mdat = file.get(kids[2]);
    assert_eq!(mdat.size, 100);
    assert_eq!(mdat.payload_state(), &Payload::Borrowed { offset: 40, len: 92 });
    assert_eq!(file.payload(kids[2]).unwrap(), &[0xab; 92][..]);

    assert_tree_consistent(&file);
}

#[test]
fn size_below_eight_is_malformed() {
    let mut data = 4u32.to_be_bytes().to_vec();
    data.extend_from_slice(b"free");

    let err = read_box_header(&data, 0, data.len()).unwrap_err();
    assert!(matches!(err, Error::MalformedBox { offset: 0, .. }));

    let strict = ParseOptions { strict: true };
    let err = Mp4File::from_bytes_with(data.clone(), &strict, &default_registry()).err();
    assert!(matches!(err, Some(Error::MalformedBox { .. })));

    // lenient: the bytes never become a box, but survive as a trailer
    let file = Mp4File::from_bytes(data.clone()).unwrap();
    assert!(file.children(file.root()).is_empty());
    assert_eq!(file.trailer(), Some(&data[..]));
}

#[test]
fn empty_buffer_gives_empty_root() {
    let file = Mp4File::from_bytes(Vec::new()).unwrap();
    assert!(file.children(file.root()).is_empty());
    assert!(file.trailer().is_none());
}

#[test]
fn eight_byte_box_is_an_empty_leaf() {
    let file = Mp4File::from_bytes(boxed(b"free", &[])).unwrap();
    let free = file.children(file.root())[0];
    assert_eq!(file.get(free).size, 8);
    assert_eq!(file.payload(free), Some(&[][..]));
}

#[test]
fn meta_children_start_after_version_and_flags() {
    let mut hdlr = vec![0u8; 24];
    hdlr[8..12].copy_from_slice(b"mdir");
    hdlr.extend_from_slice(b"\0");
    let mut meta_payload = vec![0, 0, 0, 1]; // version 0, flags 1
    meta_payload.extend(boxed(b"hdlr", &hdlr));
    meta_payload.extend(container(b"ilst", &[]));
    let data = container(b"udta", &[boxed(b"meta", &meta_payload)]);

    let file = Mp4File::from_bytes(data).unwrap();
    let meta = file.find("udta/meta", file.root())[0];
    assert_eq!(file.get(meta).header_len(), 12);
    assert_eq!(file.get(meta).ext_header(), &[0, 0, 0, 1]);

    let kids: Vec<_> = file.children(meta).iter().map(|&k| file.get(k).typ).collect();
    assert_eq!(kids, [FourCC(*b"hdlr"), FourCC(*b"ilst")]);
}

#[test]
fn itunes_data_has_sixteen_byte_header() {
    let data_box = boxed(b"data", b"\0\0\0\x01\0\0\0\0Title");
    let nam = container(&[0xa9, b'n', b'a', b'm'], &[data_box]);
    let file = Mp4File::from_bytes(container(b"ilst", &[nam])).unwrap();

    let data = file.find("ilst/©nam/data", file.root())[0];
    assert_eq!(file.get(data).header_len(), 16);
    assert_eq!(file.payload(data).unwrap(), b"Title");
}

#[test]
fn malformed_child_keeps_container_opaque_and_parsing_continues() {
    // trak claims 0x100 bytes inside a 16-byte moov
    let mut bad = 0x100u32.to_be_bytes().to_vec();
    bad.extend_from_slice(b"trak");
    let mut data = boxed(b"moov", &bad);
    data.extend(boxed(b"mdat", &[1, 2, 3]));

    let file = Mp4File::from_bytes(data.clone()).unwrap();
    let kids = file.children(file.root()).to_vec();
    assert_eq!(kids.len(), 2);
    assert!(!file.get(kids[0]).is_container());
    assert_eq!(file.payload(kids[0]).unwrap(), &bad[..]);
    assert_eq!(file.get(kids[1]).typ, FourCC(*b"mdat"));

    let strict = ParseOptions { strict: true };
    let err = Mp4File::from_bytes_with(data, &strict, &default_registry()).err();
    assert!(matches!(err, Some(Error::MalformedBox { offset: 8, .. })));
}

#[test]
fn open_maps_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("minimal.mp4");
    std::fs::write(&path, make_minimal_file()).unwrap();

    let file = Mp4File::open(&path).expect("open failed");
    assert_eq!(file.children(file.root()).len(), 3);
    assert_eq!(file.source().len(), 16 + 16 + 100);
    file.close();
}

#[test]
fn open_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Mp4File::open(dir.path().join("nope.mp4")).err();
    assert!(matches!(err, Some(Error::Io(_))));
}
