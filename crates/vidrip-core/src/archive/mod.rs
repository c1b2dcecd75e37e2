//! Minimal sequential reader for tar archives held in memory.
//!
//! The whole archive must be resident: members borrow their payloads from
//! the input buffer. Buffers over the configured ceiling
//! (`max_archive_bytes`, 2 GiB by default) are refused up front; that
//! ceiling is the extractor's scalability limit.
//!
//! Parsing never fails on a damaged member. A non-octal size reads as 0, a
//! bad checksum or a payload running past the end of the buffer flags the
//! listing as possibly truncated, and parsing carries on or stops cleanly.

mod header;

pub use header::BLOCK;

use header::{is_end_block, padded_len, parse_header, pax_path, EntryKind};

use crate::error::{RipError, Warning};

/// One regular file from the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMember<'a> {
    /// Full path, ustar prefix and long-name extensions applied.
    pub name: String,
    pub payload: &'a [u8],
    /// Size declared by the header (may exceed `payload.len()` when clipped).
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ArchiveListing<'a> {
    /// Regular files in archive order.
    pub members: Vec<ArchiveMember<'a>>,
    pub possibly_truncated: bool,
}

impl<'a> ArchiveListing<'a> {
    pub fn total_payload(&self) -> u64 {
        self.members.iter().map(|m| m.payload.len() as u64).sum()
    }

    /// Warning to attach to the final asset, if any.
    pub fn warning(&self, archive: &str) -> Option<Warning> {
        self.possibly_truncated.then(|| Warning::PossiblyTruncated {
            archive: archive.to_string(),
        })
    }
}

/// Walks `buf` header by header and collects its regular files.
///
/// Errors only when the buffer exceeds `limit` bytes.
pub fn extract_members(buf: &[u8], limit: u64) -> Result<ArchiveListing<'_>, RipError> {
    if buf.len() as u64 > limit {
        return Err(RipError::format(
            "archive",
            format!("{} bytes exceeds the {} byte in-memory limit", buf.len(), limit),
        ));
    }

    let mut listing = ArchiveListing::default();
    let mut pos: usize = 0;
    let mut long_name: Option<String> = None;

    loop {
        let Some(block) = buf.get(pos..pos + BLOCK) else {
            if pos < buf.len() {
                tracing::warn!(offset = pos, "archive ends inside a header block");
                listing.possibly_truncated = true;
            }
            break;
        };
        if is_end_block(block) {
            break;
        }
        let mut raw = [0u8; BLOCK];
        raw.copy_from_slice(block);
        let header = parse_header(&raw);
        pos += BLOCK;

        if header.bad_size {
            tracing::warn!(name = %header.path, offset = pos - BLOCK, "non-octal size field; reading as 0");
            listing.possibly_truncated = true;
        }
        if !header.checksum_ok {
            tracing::debug!(name = %header.path, "header checksum mismatch");
            listing.possibly_truncated = true;
        }

        let start = pos;
        let available = (buf.len() - start) as u64;
        let clipped = header.size > available;
        let take = header.size.min(available) as usize;
        let payload = &buf[start..start + take];

        match header.kind {
            EntryKind::Regular => {
                let name = long_name.take().unwrap_or(header.path);
                listing.members.push(ArchiveMember {
                    name,
                    payload,
                    size_bytes: header.size,
                });
            }
            EntryKind::GnuLongName => {
                let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
                long_name = Some(String::from_utf8_lossy(&payload[..end]).into_owned());
            }
            EntryKind::PaxExtended => {
                if let Some(path) = pax_path(payload) {
                    long_name = Some(path);
                }
            }
            EntryKind::Other => {
                long_name = None;
            }
        }

        if clipped {
            tracing::warn!(
                declared = header.size,
                available,
                "member payload runs past end of archive"
            );
            listing.possibly_truncated = true;
            break;
        }
        let advance = padded_len(header.size);
        match usize::try_from(advance).ok().and_then(|a| pos.checked_add(a)) {
            Some(next) => pos = next,
            None => {
                listing.possibly_truncated = true;
                break;
            }
        }
    }

    tracing::debug!(
        members = listing.members.len(),
        bytes = listing.total_payload(),
        truncated = listing.possibly_truncated,
        "archive parsed"
    );
    Ok(listing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TarBuilder;

    const LIMIT: u64 = 1 << 30;

    #[test]
    fn members_come_back_byte_identical() {
        let a: Vec<u8> = (0..700u32).map(|i| (i % 251) as u8).collect();
        let buf = TarBuilder::new()
            .file("index.m3u8", b"#EXTM3U\nseg0.ts\n")
            .file("seg0.ts", &a)
            .file("empty.ts", b"")
            .finish();
        let listing = extract_members(&buf, LIMIT).unwrap();
        assert!(!listing.possibly_truncated);
        assert_eq!(listing.members.len(), 3);
        assert_eq!(listing.members[0].name, "index.m3u8");
        assert_eq!(listing.members[1].payload, a.as_slice());
        assert_eq!(listing.members[1].size_bytes, 700);
        assert_eq!(listing.members[2].payload, b"");
    }

    #[test]
    fn prefix_is_joined_to_name() {
        let buf = TarBuilder::new()
            .entry("seg0.ts", "stream/720p", b'0', b"abc")
            .finish();
        let listing = extract_members(&buf, LIMIT).unwrap();
        assert_eq!(listing.members[0].name, "stream/720p/seg0.ts");
    }

    #[test]
    fn corrupt_size_degrades_to_zero_and_parsing_continues() {
        let buf = TarBuilder::new()
            .corrupt_size("broken.ts")
            .file("seg1.ts", b"payload")
            .finish();
        let listing = extract_members(&buf, LIMIT).unwrap();
        assert!(listing.possibly_truncated);
        assert_eq!(listing.members.len(), 2);
        assert_eq!(listing.members[0].size_bytes, 0);
        assert_eq!(listing.members[1].name, "seg1.ts");
        assert_eq!(listing.members[1].payload, b"payload");
    }

    #[test]
    fn skips_directories_and_applies_long_names() {
        let long = format!("{}/segment-000.ts", "d".repeat(120));
        let buf = TarBuilder::new()
            .entry("stream/", "", b'5', b"")
            .entry("././@LongLink", "", b'L', format!("{}\0", long).as_bytes())
            .file("truncated-name", b"xyz")
            .finish();
        let listing = extract_members(&buf, LIMIT).unwrap();
        assert_eq!(listing.members.len(), 1);
        assert_eq!(listing.members[0].name, long);
    }

    #[test]
    fn payload_past_end_is_clipped() {
        let full = TarBuilder::new().file("seg0.ts", &[7u8; 1000]).unterminated();
        let cut = &full[..BLOCK + 600];
        let listing = extract_members(cut, LIMIT).unwrap();
        assert!(listing.possibly_truncated);
        assert_eq!(listing.members[0].payload.len(), 600);
        assert_eq!(listing.members[0].size_bytes, 1000);
    }

    #[test]
    fn missing_end_marker_is_not_an_error() {
        let buf = TarBuilder::new().file("a.ts", b"1").unterminated();
        let listing = extract_members(&buf, LIMIT).unwrap();
        assert_eq!(listing.members.len(), 1);
        assert!(!listing.possibly_truncated);
    }

    #[test]
    fn empty_buffer_is_an_empty_listing() {
        let listing = extract_members(&[], LIMIT).unwrap();
        assert!(listing.members.is_empty());
    }

    #[test]
    fn oversized_buffer_is_refused() {
        let buf = TarBuilder::new().file("a.ts", &[0u8; 100]).finish();
        let err = extract_members(&buf, 512).unwrap_err();
        assert!(matches!(err, RipError::Format { .. }));
    }
}
