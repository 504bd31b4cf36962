use crate::boxes::FourCC;

/// Box types whose payload is a sequence of child boxes.
///
/// Kept in order of how often they occur in a typical file, since lookup is a
/// linear scan.
pub const CONTAINERS: &[FourCC] = &[
    FourCC(*b"stbl"),
    FourCC(*b"mdia"),
    FourCC(*b"minf"),
    FourCC(*b"dinf"),
    FourCC(*b"trak"),
    FourCC(*b"edts"),
    FourCC(*b"udta"),
    FourCC(*b"ilst"),
    FourCC(*b"moov"),
    FourCC(*b"meta"),
    // iTunes tags, under moov/udta/meta/ilst. Each holds `data` children.
    FourCC(*b"aART"),
    FourCC(*b"covr"),
    FourCC(*b"cprt"),
    FourCC(*b"cpil"),
    FourCC(*b"disk"),
    FourCC(*b"gnre"),
    FourCC(*b"trkn"),
    FourCC(*b"tmpo"),
    FourCC(*b"rtng"),
    FourCC(*b"stik"),
    FourCC(*b"pcst"),
    FourCC(*b"catg"),
    FourCC(*b"keyw"),
    FourCC(*b"purl"),
    FourCC(*b"egid"),
    FourCC(*b"desc"),
    FourCC(*b"tvnn"),
    FourCC(*b"tvsh"),
    FourCC(*b"tven"),
    FourCC(*b"tvsn"),
    FourCC(*b"tves"),
    FourCC(*b"purd"),
    FourCC(*b"pgap"),
    FourCC([0xa9, b'A', b'R', b'T']),
    FourCC([0xa9, b'a', b'l', b'b']),
    FourCC([0xa9, b'c', b'm', b't']),
    FourCC([0xa9, b'd', b'a', b'y']),
    FourCC([0xa9, b'g', b'e', b'n']),
    FourCC([0xa9, b'g', b'r', b'p']),
    FourCC([0xa9, b't', b'o', b'o']),
    FourCC([0xa9, b'l', b'y', b'r']),
    FourCC([0xa9, b'n', b'a', b'm']),
    FourCC([0xa9, b'w', b'r', b't']),
];

/// Size + type + version/flags.
const HEADER_12: &[FourCC] = &[FourCC(*b"meta")];

/// Size + type + two descriptor words.
const HEADER_16: &[FourCC] = &[FourCC(*b"data")];

pub fn is_container(code: FourCC) -> bool {
    code == FourCC::ROOT || CONTAINERS.contains(&code)
}

/// Bytes from the start of a box to its first child or payload byte.
pub fn header_length(code: FourCC) -> usize {
    if HEADER_12.contains(&code) {
        12
    } else if HEADER_16.contains(&code) {
        16
    } else {
        8
    }
}
