//! # Exposure
//!
//! A static image-gallery generator. A flat directory of photos is the
//! data source; a `gallery.yaml` file is the editing surface for
//! categories, titles, and descriptions; the output is a single
//! responsive HTML page with cache-busted CSS/JS.
//!
//! # Architecture: Incremental Build Pipeline
//!
//! ```text
//! 1. Scan       content/       →  sorted source list
//! 2. Sync       gallery.yaml   →  stub entries for new photos
//! 3. Thumbnail  sources        →  dist/images/thumbnails/   (cached)
//! 4. Assemble   yaml + records →  Category / GalleryImage
//! 5. Render     categories     →  dist/index.html + hashed assets
//! ```
//!
//! The only subsystem with real invariants is stage 3: thumbnails are
//! content-addressed (`{stem}-{hash}.webp|jpg`), gated by a persisted
//! build cache, scrubbed of privacy-sensitive EXIF, and paired with an
//! inline blur placeholder. Everything around it is plain data
//! transformation.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Flat content-directory discovery and duplicate-stem detection |
//! | [`yaml_sync`] | `gallery.yaml` load/save and stub-entry synchronization |
//! | [`thumbnails`] | Per-image pipeline orchestrator and sequential batch driver |
//! | [`cache`] | Persisted build cache: mtime pre-check, content-hash validation |
//! | [`exif`] | TIFF/EXIF parsing, allow-list privacy filtering, re-embedding |
//! | [`imaging`] | Pure image operations: dimensions, orientation, encoding, placeholders |
//! | [`hashing`] | Short SHA-256 digests for cache keys and cache-busting names |
//! | [`model`] | Rendering-layer entities (`Category`, `GalleryImage`) |
//! | [`generate`] | Gallery assembly and Maud HTML rendering |
//! | [`assets`] | Hash-named CSS/JS/original writing with stale-sibling cleanup |
//! | [`config`] | Layered settings: environment over YAML file over defaults |
//!
//! # Design Decisions
//!
//! ## Privacy Filtering Is Allow-List Based
//!
//! The [`exif`] filter keeps a fixed set of display-relevant tags
//! (orientation, camera model, capture time, exposure) and drops
//! everything else, GPS group included. An allow-list cannot leak a tag
//! it has never heard of; when filtering cannot be verified as safe the
//! outputs are saved with no EXIF container at all.
//!
//! ## Content-Addressed Thumbnails
//!
//! Output names embed an 8-character hash of the source bytes. A changed
//! photo gets new filenames (so stale HTTP caches cannot serve old
//! pixels), and the build deletes the previous hash's pair, keeping
//! exactly one `.webp`/`.jpg` pair per source.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/): malformed
//! markup is a compile error, interpolation is auto-escaped, and there is
//! no template directory to ship. Rendering is deterministic — an
//! unchanged gallery re-renders byte-identically.
//!
//! ## Sequential By Design
//!
//! The batch driver is single-threaded. Target workloads are tens to low
//! hundreds of images, and a strictly sequential pipeline keeps the
//! shared build cache and stale-output cleanup race-free without locks.

pub mod assets;
pub mod cache;
pub mod config;
pub mod exif;
pub mod generate;
pub mod hashing;
pub mod imaging;
pub mod model;
pub mod scan;
pub mod thumbnails;
pub mod yaml_sync;

#[cfg(test)]
pub(crate) mod test_helpers;
