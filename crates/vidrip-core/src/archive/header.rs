//! One 512-byte tar header block.

pub const BLOCK: usize = 512;

const NAME: std::ops::Range<usize> = 0..100;
const SIZE: std::ops::Range<usize> = 124..136;
const CHECKSUM: std::ops::Range<usize> = 148..156;
const TYPEFLAG: usize = 156;
const MAGIC: std::ops::Range<usize> = 257..262;
const PREFIX: std::ops::Range<usize> = 345..500;

/// Member kinds the extractor cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// `'0'`, NUL (old tar) or `'7'` (contiguous file).
    Regular,
    /// GNU `'L'`: payload is the next member's full name.
    GnuLongName,
    /// PAX `'x'`: payload holds `path=` overrides for the next member.
    PaxExtended,
    /// Directories, links, devices, global PAX headers.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// `prefix/name` when the ustar prefix is set, else `name`.
    pub path: String,
    pub size: u64,
    pub kind: EntryKind,
    /// Size field could not be parsed and was taken as 0.
    pub bad_size: bool,
    pub checksum_ok: bool,
}

/// True for the end-of-archive marker: a zero block or one with an empty name.
pub fn is_end_block(block: &[u8]) -> bool {
    block[NAME.start] == 0
}

pub fn parse_header(block: &[u8; BLOCK]) -> Header {
    let name = cstr(&block[NAME]);
    let path = if &block[MAGIC] == b"ustar" {
        let prefix = cstr(&block[PREFIX]);
        if prefix.is_empty() {
            name
        } else {
            format!("{}/{}", prefix.trim_end_matches('/'), name)
        }
    } else {
        name
    };
    let (size, bad_size) = match parse_size(&block[SIZE]) {
        Some(n) => (n, false),
        None => (0, true),
    };
    let kind = match block[TYPEFLAG] {
        b'0' | 0 | b'7' => EntryKind::Regular,
        b'L' => EntryKind::GnuLongName,
        b'x' => EntryKind::PaxExtended,
        _ => EntryKind::Other,
    };
    Header {
        path,
        size,
        kind,
        bad_size,
        checksum_ok: checksum_matches(block),
    }
}

/// NUL-terminated field as text (lossy).
fn cstr(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

/// Octal ASCII (NUL/space padded) or GNU base-256 (high bit of first byte set).
pub fn parse_size(field: &[u8]) -> Option<u64> {
    if field.first().is_some_and(|b| b & 0x80 != 0) {
        let mut n: u64 = u64::from(field[0] & 0x7f);
        for &b in &field[1..] {
            n = n.checked_mul(256)?.checked_add(u64::from(b))?;
        }
        return Some(n);
    }
    parse_octal(field)
}

fn parse_octal(field: &[u8]) -> Option<u64> {
    let text = field
        .iter()
        .skip_while(|&&b| b == b' ')
        .take_while(|&&b| b != 0 && b != b' ');
    // An all-blank field reads as 0.
    let mut n: u64 = 0;
    for &b in text {
        if !(b'0'..=b'7').contains(&b) {
            return None;
        }
        n = n.checked_mul(8)?.checked_add(u64::from(b - b'0'))?;
    }
    Some(n)
}

/// Header checksum: byte sum with the checksum field read as spaces.
fn checksum_matches(block: &[u8; BLOCK]) -> bool {
    let Some(stored) = parse_octal(&block[CHECKSUM]) else {
        return false;
    };
    let sum: u64 = block
        .iter()
        .enumerate()
        .map(|(i, &b)| if CHECKSUM.contains(&i) { u64::from(b' ') } else { u64::from(b) })
        .sum();
    sum == stored
}

/// `path=` value from a PAX extended header payload (`"<len> key=value\n"` records).
pub fn pax_path(payload: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(payload);
    text.lines()
        .filter_map(|record| record.split_once(' ').map(|(_, kv)| kv))
        .filter_map(|kv| kv.split_once('='))
        .find(|(k, _)| *k == "path")
        .map(|(_, v)| v.to_string())
}

/// Bytes a payload of `size` occupies including padding to the block boundary.
pub fn padded_len(size: u64) -> u64 {
    size.div_ceil(BLOCK as u64) * BLOCK as u64
}
