//! Cache-busted asset writing.
//!
//! Generated CSS/JS and copied originals get a content hash in their
//! filename (`gallery.1a2b3c4d.css`) so changed content gets a new URL.
//! Writing a new hash removes older hashed siblings of the same base name,
//! keeping exactly one live file per asset.

use crate::hashing::{HASH_LENGTH, hash_bytes, hash_string};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Write `content` as `{base}.{hash}.{ext}` in `dir`, removing any
/// differently-hashed sibling first. Returns the written path.
pub fn write_with_hash(dir: &Path, base: &str, ext: &str, content: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let hash = hash_string(content);
    remove_stale_siblings(dir, base, ext, &hash)?;
    let path = dir.join(format!("{base}.{hash}.{ext}"));
    fs::write(&path, content)?;
    Ok(path)
}

/// Copy `source` into `dir` as `{stem}.{hash}.{ext}`, hash taken over the
/// file's bytes. Like [`write_with_hash`], stale siblings are removed.
pub fn copy_with_hash(source: &Path, dir: &Path) -> io::Result<PathBuf> {
    let invalid = || io::Error::new(io::ErrorKind::InvalidInput, "asset needs a stem and extension");
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(invalid)?;
    let ext = source
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(invalid)?;

    fs::create_dir_all(dir)?;
    let bytes = fs::read(source)?;
    let hash = hash_bytes(&bytes);
    remove_stale_siblings(dir, stem, ext, &hash)?;
    let path = dir.join(format!("{stem}.{hash}.{ext}"));
    fs::write(&path, bytes)?;
    Ok(path)
}

/// Delete `{base}.{other-hash}.{ext}` files left over from earlier builds.
fn remove_stale_siblings(dir: &Path, base: &str, ext: &str, keep_hash: &str) -> io::Result<()> {
    let prefix = format!("{base}.");
    let suffix = format!(".{ext}");
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(middle) = name
            .strip_prefix(&prefix)
            .and_then(|rest| rest.strip_suffix(&suffix))
        else {
            continue;
        };
        let is_hash = middle.len() == HASH_LENGTH && middle.chars().all(|c| c.is_ascii_hexdigit());
        if is_hash && middle != keep_hash {
            debug!("removing stale asset {name}");
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}
