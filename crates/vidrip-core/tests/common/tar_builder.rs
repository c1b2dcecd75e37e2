//! Writes small ustar archives for tests.

const BLOCK: usize = 512;

fn header(name: &str, size: usize) -> [u8; BLOCK] {
    let mut h = [0u8; BLOCK];
    h[..name.len()].copy_from_slice(name.as_bytes());
    h[100..107].copy_from_slice(b"0000644");
    h[124..136].copy_from_slice(format!("{:011o}\0", size).as_bytes());
    h[136..147].copy_from_slice(b"14737213440");
    h[156] = b'0';
    h[257..263].copy_from_slice(b"ustar\0");
    h[263..265].copy_from_slice(b"00");
    h[148..156].copy_from_slice(b"        ");
    let sum: u32 = h.iter().map(|&b| u32::from(b)).sum();
    h[148..155].copy_from_slice(format!("{:06o}\0", sum).as_bytes());
    h
}

/// Archive of regular files in the given order, end marker included.
pub fn build(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    for (name, payload) in files {
        out.extend_from_slice(&header(name, payload.len()));
        out.extend_from_slice(payload);
        let rem = payload.len() % BLOCK;
        if rem != 0 {
            out.resize(out.len() + BLOCK - rem, 0);
        }
    }
    out.resize(out.len() + 2 * BLOCK, 0);
    out
}
