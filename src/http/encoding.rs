//! Content encoding module
//!
//! Gzip framing for response bodies. The body is announced with
//! `Content-Encoding: gzip`, so the client's HTTP layer hands the original
//! bytes to the user.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{self, Write};

pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Gzip-encode `data` at `level` (0-9, clamped)
pub fn gzip_encode(data: &[u8], level: u32) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(
        Vec::with_capacity(data.len() / 2 + 32),
        Compression::new(level.min(9)),
    );
    encoder.write_all(data)?;
    encoder.finish()
}
