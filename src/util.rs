/// Hex of the leading bytes of `bytes`, at most `width` characters. A
/// trailing `..` marks a cut.
pub fn payload_preview(bytes: &[u8], width: usize) -> String {
    let max = width / 2;
    if max == 0 {
        String::new()
    } else if bytes.len() <= max {
        hex::encode(bytes)
    } else {
        format!("{}..", hex::encode(&bytes[..max.saturating_sub(1)]))
    }
}

/// First `width` characters of `s`.
pub fn truncate(s: &str, width: usize) -> String {
    s.chars().take(width).collect()
}

/// Classic 16-bytes-per-line hex dump, addresses starting at `start_offset`.
pub fn hex_dump(bytes: &[u8], start_offset: u64) -> String {
    let mut out = String::new();
    for (i, chunk) in bytes.chunks(16).enumerate() {
        let offs = start_offset + (i as u64) * 16;
        let hexs: String = chunk.iter().map(|b| format!("{:02x} ", b)).collect();
        let ascii: String = chunk.iter().map(|&c| if (32..=126).contains(&c) { c as char } else { '.' }).collect();
        out.push_str(&format!("{:08x}  {:<48}  |{}|\n", offs, hexs, ascii));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_fits_width() {
        let bytes = [0xde, 0xad, 0xbe, 0xef, 0x01];
        assert_eq!(payload_preview(&bytes, 80), "deadbeef01");
        assert_eq!(payload_preview(&bytes, 6), "dead..");
        assert_eq!(payload_preview(&bytes, 0), "");
    }

    #[test]
    fn hex_dump_lines() {
        let dump = hex_dump(b"moov", 0x20);
        assert!(dump.starts_with("00000020  6d 6f 6f 76"));
        assert!(dump.trim_end().ends_with("|moov|"));
    }
}
