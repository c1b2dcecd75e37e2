//! Builders shared by unit tests.

use crate::archive::BLOCK;

/// 512-byte ustar header with a valid checksum.
pub(crate) fn header(name: &str, prefix: &str, size_field: &[u8], typeflag: u8) -> [u8; BLOCK] {
    let mut h = [0u8; BLOCK];
    h[..name.len()].copy_from_slice(name.as_bytes());
    h[100..107].copy_from_slice(b"0000644");
    h[108..115].copy_from_slice(b"0001750");
    h[116..123].copy_from_slice(b"0001750");
    h[124..124 + size_field.len()].copy_from_slice(size_field);
    h[136..147].copy_from_slice(b"14737213440");
    h[156] = typeflag;
    h[257..263].copy_from_slice(b"ustar\0");
    h[263..265].copy_from_slice(b"00");
    h[345..345 + prefix.len()].copy_from_slice(prefix.as_bytes());
    h[148..156].copy_from_slice(b"        ");
    let sum: u32 = h.iter().map(|&b| u32::from(b)).sum();
    h[148..155].copy_from_slice(format!("{:06o}\0", sum).as_bytes());
    h
}

fn octal_size(size: u64) -> Vec<u8> {
    format!("{:011o}\0", size).into_bytes()
}

/// In-memory tar writer.
#[derive(Default)]
pub(crate) struct TarBuilder {
    buf: Vec<u8>,
}

impl TarBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn file(self, name: &str, payload: &[u8]) -> Self {
        self.entry(name, "", b'0', payload)
    }

    pub(crate) fn entry(mut self, name: &str, prefix: &str, typeflag: u8, payload: &[u8]) -> Self {
        self.buf
            .extend_from_slice(&header(name, prefix, &octal_size(payload.len() as u64), typeflag));
        self.push_payload(payload);
        self
    }

    /// Header whose size field is not octal, followed by no payload.
    pub(crate) fn corrupt_size(mut self, name: &str) -> Self {
        self.buf.extend_from_slice(&header(name, "", b"zz-not-octal", b'0'));
        self
    }

    fn push_payload(&mut self, payload: &[u8]) {
        self.buf.extend_from_slice(payload);
        let rem = payload.len() % BLOCK;
        if rem != 0 {
            self.buf.resize(self.buf.len() + BLOCK - rem, 0);
        }
    }

    /// Appends the two zero end-of-archive blocks.
    pub(crate) fn finish(mut self) -> Vec<u8> {
        self.buf.resize(self.buf.len() + 2 * BLOCK, 0);
        self.buf
    }

    /// Bytes written so far, without an end marker.
    pub(crate) fn unterminated(self) -> Vec<u8> {
        self.buf
    }
}
