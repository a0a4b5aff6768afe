//! Short content digests for cache keys and cache-busted filenames.
//!
//! Everything downstream — thumbnail filenames, the build cache, hashed
//! CSS/JS bundles — identifies content by the same 8-hex-char truncated
//! SHA-256 digest. Short hashes are enough here: a collision only affects
//! cache-busting and incremental-build correctness inside one project's
//! asset set, never security.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Length of the truncated hex digest.
pub const HASH_LENGTH: usize = 8;

/// Files are streamed through the digest in chunks of this size.
const CHUNK_SIZE: usize = 64 * 1024;

/// Truncated SHA-256 of raw bytes, as lowercase hex.
pub fn hash_bytes(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    truncate_digest(&digest)
}

/// Truncated SHA-256 of a file's contents, streamed in fixed-size chunks.
///
/// Returns the underlying I/O error (including not-found) rather than
/// absorbing it — callers decide whether a missing file is fatal.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(truncate_digest(&hasher.finalize()))
}

/// Truncated SHA-256 of a string's UTF-8 encoding.
pub fn hash_string(text: &str) -> String {
    hash_bytes(text.as_bytes())
}

fn truncate_digest(digest: &[u8]) -> String {
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    hex[..HASH_LENGTH].to_string()
}
