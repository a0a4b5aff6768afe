//! EXIF parsing, privacy filtering, and re-embedding.
//!
//! Thumbnails must not leak what the camera wrote into the original: GPS
//! position, body/lens serial numbers, author and software strings, or the
//! embedded preview image. This module parses the EXIF blob out of a source
//! file, rebuilds it keeping only a fixed allow-list of display-relevant
//! tags, and splices the sanitized blob back into the encoded outputs.
//!
//! # Wire format
//!
//! An EXIF blob is a TIFF structure behind a 6-byte header:
//!
//! ```text
//! "Exif\0\0"                      6-byte identifier (JPEG APP1 only)
//! "II" | "MM"                     byte order (little / big endian)
//! 0x002A                          TIFF magic
//! u32   offset of IFD0
//! IFD:  u16 entry count
//!       entries × 12 bytes        tag u16, type u16, count u32, value/offset
//!       u32 offset of next IFD    (IFD1 = embedded preview; always dropped)
//! ```
//!
//! Values longer than 4 bytes live in a data area addressed by offset. IFD0
//! may point at two sub-IFDs: the Exif IFD (tag 0x8769) and the GPS IFD
//! (tag 0x8825). The GPS IFD is dropped unconditionally.
//!
//! # Failure policy
//!
//! Filtering never fails upward. Absent, truncated, or corrupt metadata
//! yields `None` and the caller saves outputs with no EXIF container at
//! all. When stripping cannot be verified as safe, err toward removing
//! more, not less.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Identifier prefix of an EXIF APP1 segment.
pub const EXIF_HEADER: &[u8] = b"Exif\0\0";

/// Orientation tag in IFD0 (values 1-8).
pub const TAG_ORIENTATION: u16 = 0x0112;

const TAG_X_RESOLUTION: u16 = 0x011A;
const TAG_Y_RESOLUTION: u16 = 0x011B;

/// IFD0 pointer to the Exif sub-IFD.
const TAG_EXIF_IFD: u16 = 0x8769;
/// IFD0 pointer to the GPS sub-IFD.
const TAG_GPS_IFD: u16 = 0x8825;

/// IFD0 tags that survive filtering: orientation, camera identity,
/// capture time, and print resolution.
const SAFE_IFD0_TAGS: &[u16] = &[
    0x010F, // Make
    0x0110, // Model
    0x0112, // Orientation
    0x011A, // XResolution
    0x011B, // YResolution
    0x0128, // ResolutionUnit
    0x0132, // DateTime
];

/// Exif sub-IFD tags that survive filtering: capture timestamps, lens
/// identity, exposure parameters, and color space.
const SAFE_EXIF_TAGS: &[u16] = &[
    0x829A, // ExposureTime
    0x829D, // FNumber
    0x8827, // ISOSpeedRatings
    0x9003, // DateTimeOriginal
    0x9004, // DateTimeDigitized
    0x920A, // FocalLength
    0xA001, // ColorSpace
    0xA433, // LensMake
    0xA434, // LensModel
];

/// Tags known to carry identifying data. The filter is allow-list based,
/// so none of these can survive regardless; the list exists so tests can
/// assert the property explicitly.
#[cfg(test)]
pub(crate) const SENSITIVE_TAGS: &[u16] = &[
    0x0131, // Software
    0x013B, // Artist
    0x013C, // HostComputer
    0x0201, // JPEGInterchangeFormat (embedded preview offset)
    0x0202, // JPEGInterchangeFormatLength
    0x8298, // Copyright
    0x9C9C, // XPComment
    0x9C9D, // XPAuthor
    0xA420, // ImageUniqueID
    0xA431, // BodySerialNumber
    0xA435, // LensSerialNumber
];

// TIFF value types
const TYPE_BYTE: u16 = 1;
const TYPE_ASCII: u16 = 2;
const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const TYPE_RATIONAL: u16 = 5;
const TYPE_UNDEFINED: u16 = 7;
const TYPE_SLONG: u16 = 9;
const TYPE_SRATIONAL: u16 = 10;

/// Upper bound on entries per IFD. Corrupt files can claim absurd counts;
/// real cameras write a few dozen.
const MAX_IFD_ENTRIES: usize = 512;

/// A decoded TIFF tag value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValue {
    Byte(Vec<u8>),
    Ascii(Vec<u8>),
    Short(Vec<u16>),
    Long(Vec<u32>),
    Rational(Vec<(u32, u32)>),
    Undefined(Vec<u8>),
    SLong(Vec<i32>),
    SRational(Vec<(i32, i32)>),
}

impl TagValue {
    fn type_code(&self) -> u16 {
        match self {
            TagValue::Byte(_) => TYPE_BYTE,
            TagValue::Ascii(_) => TYPE_ASCII,
            TagValue::Short(_) => TYPE_SHORT,
            TagValue::Long(_) => TYPE_LONG,
            TagValue::Rational(_) => TYPE_RATIONAL,
            TagValue::Undefined(_) => TYPE_UNDEFINED,
            TagValue::SLong(_) => TYPE_SLONG,
            TagValue::SRational(_) => TYPE_SRATIONAL,
        }
    }

    fn count(&self) -> u32 {
        (match self {
            TagValue::Byte(v) => v.len(),
            TagValue::Ascii(v) => v.len(),
            TagValue::Short(v) => v.len(),
            TagValue::Long(v) => v.len(),
            TagValue::Rational(v) => v.len(),
            TagValue::Undefined(v) => v.len(),
            TagValue::SLong(v) => v.len(),
            TagValue::SRational(v) => v.len(),
        }) as u32
    }

    /// Value bytes in little-endian order (the serializer's byte order).
    fn to_le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            TagValue::Byte(v) | TagValue::Ascii(v) | TagValue::Undefined(v) => {
                out.extend_from_slice(v);
            }
            TagValue::Short(v) => {
                for n in v {
                    out.extend_from_slice(&n.to_le_bytes());
                }
            }
            TagValue::Long(v) => {
                for n in v {
                    out.extend_from_slice(&n.to_le_bytes());
                }
            }
            TagValue::Rational(v) => {
                for (num, den) in v {
                    out.extend_from_slice(&num.to_le_bytes());
                    out.extend_from_slice(&den.to_le_bytes());
                }
            }
            TagValue::SLong(v) => {
                for n in v {
                    out.extend_from_slice(&n.to_le_bytes());
                }
            }
            TagValue::SRational(v) => {
                for (num, den) in v {
                    out.extend_from_slice(&num.to_le_bytes());
                    out.extend_from_slice(&den.to_le_bytes());
                }
            }
        }
        out
    }
}

/// Parsed EXIF structure: the three tag groups the filter cares about.
/// The thumbnail IFD (IFD1) is never retained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExifData {
    pub ifd0: BTreeMap<u16, TagValue>,
    pub exif: BTreeMap<u16, TagValue>,
    pub gps: BTreeMap<u16, TagValue>,
}

impl ExifData {
    pub fn is_empty(&self) -> bool {
        self.ifd0.is_empty() && self.exif.is_empty() && self.gps.is_empty()
    }

    /// Apply the privacy filter: drop GPS entirely, keep only allow-listed
    /// tags in IFD0 and the Exif sub-IFD.
    pub fn filtered(&self) -> ExifData {
        let keep = |map: &BTreeMap<u16, TagValue>, safe: &[u16]| {
            map.iter()
                .filter(|(tag, _)| safe.contains(tag))
                .map(|(tag, value)| (*tag, value.clone()))
                .collect()
        };
        ExifData {
            ifd0: keep(&self.ifd0, SAFE_IFD0_TAGS),
            exif: keep(&self.exif, SAFE_EXIF_TAGS),
            gps: BTreeMap::new(),
        }
    }

    /// The stored orientation (1-8), if present and in range.
    pub fn orientation(&self) -> Option<u16> {
        match self.ifd0.get(&TAG_ORIENTATION) {
            Some(TagValue::Short(v)) => v.first().copied().filter(|o| (1..=8).contains(o)),
            _ => None,
        }
    }

    /// Print resolution as whole DPI, if both axes are present.
    pub fn dpi(&self) -> Option<(u32, u32)> {
        let axis = |tag: u16| match self.ifd0.get(&tag) {
            Some(TagValue::Rational(v)) => v
                .first()
                .filter(|(_, den)| *den != 0)
                .map(|(num, den)| num / den),
            _ => None,
        };
        Some((axis(TAG_X_RESOLUTION)?, axis(TAG_Y_RESOLUTION)?))
    }
}

// =========================================================================
// Extraction
// =========================================================================

/// Parse the EXIF structure out of a full image file's bytes.
///
/// Accepts a JPEG (APP1 segment walk), a bare TIFF structure, or a blob
/// still carrying the `Exif\0\0` header. Returns `None` when no EXIF is
/// present or the structure is corrupt.
pub fn extract_exif(bytes: &[u8]) -> Option<ExifData> {
    let tiff = locate_tiff(bytes)?;
    parse_tiff(tiff)
}

/// Convenience wrapper over [`extract_exif`] for a file on disk.
pub fn extract_exif_file(path: &Path) -> Option<ExifData> {
    let bytes = fs::read(path).ok()?;
    extract_exif(&bytes)
}

fn locate_tiff(bytes: &[u8]) -> Option<&[u8]> {
    if bytes.starts_with(&[0xFF, 0xD8]) {
        return find_jpeg_exif_segment(bytes);
    }
    if let Some(tiff) = bytes.strip_prefix(EXIF_HEADER) {
        return Some(tiff);
    }
    if bytes.starts_with(b"II") || bytes.starts_with(b"MM") {
        return Some(bytes);
    }
    None
}

/// Walk JPEG segments looking for the `Exif\0\0` APP1 payload.
fn find_jpeg_exif_segment(jpeg: &[u8]) -> Option<&[u8]> {
    let mut pos = 2;
    while pos + 4 <= jpeg.len() {
        if jpeg[pos] != 0xFF {
            return None;
        }
        let marker = jpeg[pos + 1];
        // Start of scan: no more metadata segments follow
        if marker == 0xDA {
            return None;
        }
        let len = u16::from_be_bytes([jpeg[pos + 2], jpeg[pos + 3]]) as usize;
        if len < 2 || pos + 2 + len > jpeg.len() {
            return None;
        }
        let payload = &jpeg[pos + 4..pos + 2 + len];
        if marker == 0xE1
            && let Some(tiff) = payload.strip_prefix(EXIF_HEADER)
        {
            return Some(tiff);
        }
        pos += 2 + len;
    }
    None
}

struct TiffReader<'a> {
    data: &'a [u8],
    big_endian: bool,
}

impl<'a> TiffReader<'a> {
    fn read_u16(&self, at: usize) -> Option<u16> {
        let b: [u8; 2] = self.data.get(at..at + 2)?.try_into().ok()?;
        Some(if self.big_endian {
            u16::from_be_bytes(b)
        } else {
            u16::from_le_bytes(b)
        })
    }

    fn read_u32(&self, at: usize) -> Option<u32> {
        let b: [u8; 4] = self.data.get(at..at + 4)?.try_into().ok()?;
        Some(if self.big_endian {
            u32::from_be_bytes(b)
        } else {
            u32::from_le_bytes(b)
        })
    }
}

fn parse_tiff(tiff: &[u8]) -> Option<ExifData> {
    let big_endian = match tiff.get(0..2)? {
        b"II" => false,
        b"MM" => true,
        _ => return None,
    };
    let reader = TiffReader {
        data: tiff,
        big_endian,
    };
    if reader.read_u16(2)? != 42 {
        return None;
    }
    let ifd0_offset = reader.read_u32(4)? as usize;
    let mut ifd0 = parse_ifd(&reader, ifd0_offset)?;

    let sub_ifd = |map: &mut BTreeMap<u16, TagValue>, tag: u16| -> BTreeMap<u16, TagValue> {
        match map.remove(&tag) {
            Some(TagValue::Long(v)) => v
                .first()
                .and_then(|off| parse_ifd(&reader, *off as usize))
                .unwrap_or_default(),
            Some(_) | None => BTreeMap::new(),
        }
    };
    let exif = sub_ifd(&mut ifd0, TAG_EXIF_IFD);
    let gps = sub_ifd(&mut ifd0, TAG_GPS_IFD);

    Some(ExifData { ifd0, exif, gps })
}

/// Parse one IFD's entry table. Unknown value types and out-of-bounds
/// offsets skip the entry rather than failing the whole parse.
fn parse_ifd(reader: &TiffReader<'_>, offset: usize) -> Option<BTreeMap<u16, TagValue>> {
    let count = reader.read_u16(offset)? as usize;
    if count > MAX_IFD_ENTRIES {
        return None;
    }
    let mut tags = BTreeMap::new();
    for i in 0..count {
        let entry = offset + 2 + i * 12;
        let tag = reader.read_u16(entry)?;
        let type_code = reader.read_u16(entry + 2)?;
        let value_count = reader.read_u32(entry + 4)? as usize;
        if let Some(value) = read_value(reader, type_code, value_count, entry + 8) {
            tags.insert(tag, value);
        }
    }
    Some(tags)
}

fn type_size(type_code: u16) -> Option<usize> {
    match type_code {
        TYPE_BYTE | TYPE_ASCII | TYPE_UNDEFINED => Some(1),
        TYPE_SHORT => Some(2),
        TYPE_LONG | TYPE_SLONG => Some(4),
        TYPE_RATIONAL | TYPE_SRATIONAL => Some(8),
        _ => None,
    }
}

fn read_value(
    reader: &TiffReader<'_>,
    type_code: u16,
    count: usize,
    value_field: usize,
) -> Option<TagValue> {
    let unit = type_size(type_code)?;
    let byte_len = unit.checked_mul(count)?;
    let data_offset = if byte_len <= 4 {
        value_field
    } else {
        reader.read_u32(value_field)? as usize
    };
    reader.data.get(data_offset..data_offset + byte_len)?;

    let value = match type_code {
        TYPE_BYTE => TagValue::Byte(reader.data[data_offset..data_offset + byte_len].to_vec()),
        TYPE_ASCII => TagValue::Ascii(reader.data[data_offset..data_offset + byte_len].to_vec()),
        TYPE_UNDEFINED => {
            TagValue::Undefined(reader.data[data_offset..data_offset + byte_len].to_vec())
        }
        TYPE_SHORT => TagValue::Short(
            (0..count)
                .map(|i| reader.read_u16(data_offset + i * 2))
                .collect::<Option<Vec<_>>>()?,
        ),
        TYPE_LONG => TagValue::Long(
            (0..count)
                .map(|i| reader.read_u32(data_offset + i * 4))
                .collect::<Option<Vec<_>>>()?,
        ),
        TYPE_SLONG => TagValue::SLong(
            (0..count)
                .map(|i| reader.read_u32(data_offset + i * 4).map(|n| n as i32))
                .collect::<Option<Vec<_>>>()?,
        ),
        TYPE_RATIONAL => TagValue::Rational(
            (0..count)
                .map(|i| {
                    let num = reader.read_u32(data_offset + i * 8)?;
                    let den = reader.read_u32(data_offset + i * 8 + 4)?;
                    Some((num, den))
                })
                .collect::<Option<Vec<_>>>()?,
        ),
        TYPE_SRATIONAL => TagValue::SRational(
            (0..count)
                .map(|i| {
                    let num = reader.read_u32(data_offset + i * 8)? as i32;
                    let den = reader.read_u32(data_offset + i * 8 + 4)? as i32;
                    Some((num, den))
                })
                .collect::<Option<Vec<_>>>()?,
        ),
        _ => return None,
    };
    Some(value)
}

// =========================================================================
// Serialization
// =========================================================================

/// Serialize an [`ExifData`] into a fresh little-endian EXIF blob,
/// `Exif\0\0` header included. The GPS group is never written.
pub fn serialize(data: &ExifData) -> Vec<u8> {
    let mut ifd0: Vec<(u16, TagValue)> = data
        .ifd0
        .iter()
        .map(|(tag, value)| (*tag, value.clone()))
        .collect();
    let exif: Vec<(u16, TagValue)> = data
        .exif
        .iter()
        .map(|(tag, value)| (*tag, value.clone()))
        .collect();

    // IFD0 starts at offset 8; the Exif sub-IFD (if any) follows it, then
    // the shared out-of-line data area.
    let ifd0_count = ifd0.len() + usize::from(!exif.is_empty());
    let ifd0_offset = 8usize;
    let ifd_size = |entries: usize| 2 + entries * 12 + 4;
    let exif_offset = ifd0_offset + ifd_size(ifd0_count);
    let data_start = if exif.is_empty() {
        exif_offset
    } else {
        exif_offset + ifd_size(exif.len())
    };

    if !exif.is_empty() {
        ifd0.push((TAG_EXIF_IFD, TagValue::Long(vec![exif_offset as u32])));
        ifd0.sort_by_key(|(tag, _)| *tag);
    }

    let mut data_area: Vec<u8> = Vec::new();
    let mut out = Vec::new();
    out.extend_from_slice(EXIF_HEADER);
    out.extend_from_slice(b"II");
    out.extend_from_slice(&42u16.to_le_bytes());
    out.extend_from_slice(&(ifd0_offset as u32).to_le_bytes());

    write_ifd(&mut out, &ifd0, data_start, &mut data_area);
    if !exif.is_empty() {
        write_ifd(&mut out, &exif, data_start, &mut data_area);
    }
    out.extend_from_slice(&data_area);
    out
}

/// Write one IFD's entry table, spilling values longer than 4 bytes into
/// the shared data area.
fn write_ifd(
    out: &mut Vec<u8>,
    entries: &[(u16, TagValue)],
    data_start: usize,
    data_area: &mut Vec<u8>,
) {
    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    for (tag, value) in entries {
        out.extend_from_slice(&tag.to_le_bytes());
        out.extend_from_slice(&value.type_code().to_le_bytes());
        out.extend_from_slice(&value.count().to_le_bytes());
        let bytes = value.to_le_bytes();
        if bytes.len() <= 4 {
            let mut field = [0u8; 4];
            field[..bytes.len()].copy_from_slice(&bytes);
            out.extend_from_slice(&field);
        } else {
            let offset = (data_start + data_area.len()) as u32;
            out.extend_from_slice(&offset.to_le_bytes());
            data_area.extend_from_slice(&bytes);
        }
    }
    // No next IFD: the embedded preview (IFD1) is deliberately dropped
    out.extend_from_slice(&0u32.to_le_bytes());
}

// =========================================================================
// Filtering
// =========================================================================

/// Produce a sanitized EXIF blob for an image file, or `None` when the
/// file carries no parseable EXIF (caller saves with no EXIF at all).
pub fn filter_metadata(path: &Path) -> Option<Vec<u8>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("cannot read {} for metadata filtering: {err}", path.display());
            return None;
        }
    };
    filter_metadata_bytes(&bytes)
}

/// [`filter_metadata`] over bytes already in memory.
pub fn filter_metadata_bytes(bytes: &[u8]) -> Option<Vec<u8>> {
    let Some(parsed) = extract_exif(bytes) else {
        debug!("no parseable EXIF structure found");
        return None;
    };
    Some(serialize(&parsed.filtered()))
}

// =========================================================================
// Embedding
// =========================================================================

/// Insert an EXIF blob (with `Exif\0\0` header) into an encoded JPEG as an
/// APP1 segment, replacing any existing Exif APP1. The segment lands after
/// the run of leading APPn segments so a JFIF APP0 stays first.
pub fn embed_in_jpeg(jpeg: &[u8], exif_blob: &[u8]) -> Vec<u8> {
    if !jpeg.starts_with(&[0xFF, 0xD8]) {
        return jpeg.to_vec();
    }
    let segment_len = exif_blob.len() + 2;
    if segment_len > u16::MAX as usize {
        return jpeg.to_vec();
    }

    let mut out = Vec::with_capacity(jpeg.len() + segment_len + 2);
    out.extend_from_slice(&jpeg[..2]);
    let mut pos = 2;
    while pos + 4 <= jpeg.len() && jpeg[pos] == 0xFF {
        let marker = jpeg[pos + 1];
        if !(0xE0..=0xEF).contains(&marker) {
            break;
        }
        let len = u16::from_be_bytes([jpeg[pos + 2], jpeg[pos + 3]]) as usize;
        if len < 2 || pos + 2 + len > jpeg.len() {
            break;
        }
        let segment = &jpeg[pos..pos + 2 + len];
        let is_exif = marker == 0xE1 && segment.len() >= 10 && &segment[4..10] == EXIF_HEADER;
        if !is_exif {
            out.extend_from_slice(segment);
        }
        pos += 2 + len;
    }
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&(segment_len as u16).to_be_bytes());
    out.extend_from_slice(exif_blob);
    out.extend_from_slice(&jpeg[pos..]);
    out
}

/// Insert an EXIF blob into a simple (VP8/VP8L) WebP file by upgrading it
/// to an extended (VP8X) container with an `EXIF` chunk.
///
/// Already-extended files are returned unchanged; so is anything that does
/// not look like a WebP container.
pub fn embed_in_webp(webp: &[u8], exif_blob: &[u8], canvas: (u32, u32)) -> Vec<u8> {
    if webp.len() < 12 || &webp[0..4] != b"RIFF" || &webp[8..12] != b"WEBP" {
        return webp.to_vec();
    }
    let body = &webp[12..];
    if body.len() >= 4 && &body[0..4] == b"VP8X" {
        return webp.to_vec();
    }
    let (width, height) = canvas;
    if width == 0 || height == 0 {
        return webp.to_vec();
    }
    // The EXIF chunk payload is the bare TIFF structure
    let tiff = exif_blob.strip_prefix(EXIF_HEADER).unwrap_or(exif_blob);

    let mut chunks = Vec::new();
    let mut vp8x = Vec::with_capacity(10);
    vp8x.push(0x08); // EXIF flag
    vp8x.extend_from_slice(&[0, 0, 0]);
    vp8x.extend_from_slice(&(width - 1).to_le_bytes()[..3]);
    vp8x.extend_from_slice(&(height - 1).to_le_bytes()[..3]);
    push_riff_chunk(&mut chunks, b"VP8X", &vp8x);
    chunks.extend_from_slice(body);
    if body.len() % 2 == 1 {
        chunks.push(0);
    }
    push_riff_chunk(&mut chunks, b"EXIF", tiff);

    let mut out = Vec::with_capacity(12 + chunks.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&((4 + chunks.len()) as u32).to_le_bytes());
    out.extend_from_slice(b"WEBP");
    out.extend_from_slice(&chunks);
    out
}

fn push_riff_chunk(out: &mut Vec<u8>, fourcc: &[u8; 4], payload: &[u8]) {
    out.extend_from_slice(fourcc);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{sample_exif, tiny_jpeg};

    // =========================================================================
    // Parse / serialize round trip
    // =========================================================================

    #[test]
    fn serialize_then_extract_round_trips() {
        let data = sample_exif();
        let blob = serialize(&data);
        let parsed = extract_exif(&blob).unwrap();

        assert_eq!(parsed.ifd0, data.ifd0);
        assert_eq!(parsed.exif, data.exif);
        // GPS is never serialized
        assert!(parsed.gps.is_empty());
    }

    #[test]
    fn extract_from_big_endian_tiff() {
        // Hand-built MM structure: one SHORT orientation entry
        let mut tiff = Vec::new();
        tiff.extend_from_slice(b"MM");
        tiff.extend_from_slice(&42u16.to_be_bytes());
        tiff.extend_from_slice(&8u32.to_be_bytes());
        tiff.extend_from_slice(&1u16.to_be_bytes());
        tiff.extend_from_slice(&TAG_ORIENTATION.to_be_bytes());
        tiff.extend_from_slice(&TYPE_SHORT.to_be_bytes());
        tiff.extend_from_slice(&1u32.to_be_bytes());
        tiff.extend_from_slice(&6u16.to_be_bytes());
        tiff.extend_from_slice(&0u16.to_be_bytes());
        tiff.extend_from_slice(&0u32.to_be_bytes());

        let parsed = extract_exif(&tiff).unwrap();
        assert_eq!(parsed.orientation(), Some(6));
    }

    #[test]
    fn extract_garbage_returns_none() {
        assert!(extract_exif(b"definitely not an image").is_none());
        assert!(extract_exif(&[]).is_none());
    }

    #[test]
    fn extract_truncated_tiff_returns_none() {
        let blob = serialize(&sample_exif());
        assert!(extract_exif(&blob[..12]).is_none());
    }

    #[test]
    fn extract_rejects_absurd_entry_count() {
        let mut tiff = Vec::new();
        tiff.extend_from_slice(b"II");
        tiff.extend_from_slice(&42u16.to_le_bytes());
        tiff.extend_from_slice(&8u32.to_le_bytes());
        tiff.extend_from_slice(&u16::MAX.to_le_bytes());
        assert!(extract_exif(&tiff).is_none());
    }

    // =========================================================================
    // Filtering
    // =========================================================================

    #[test]
    fn filtered_drops_gps_group() {
        let filtered = sample_exif().filtered();
        assert!(filtered.gps.is_empty());
    }

    #[test]
    fn filtered_drops_all_sensitive_tags() {
        let filtered = sample_exif().filtered();
        for tag in SENSITIVE_TAGS {
            assert!(!filtered.ifd0.contains_key(tag), "tag {tag:#06x} survived");
            assert!(!filtered.exif.contains_key(tag), "tag {tag:#06x} survived");
        }
    }

    #[test]
    fn filtered_keeps_only_allow_listed_tags() {
        let filtered = sample_exif().filtered();
        for tag in filtered.ifd0.keys() {
            assert!(SAFE_IFD0_TAGS.contains(tag));
        }
        for tag in filtered.exif.keys() {
            assert!(SAFE_EXIF_TAGS.contains(tag));
        }
        // The fixture carries safe tags, so filtering must not empty it
        assert!(filtered.orientation().is_some());
        assert!(filtered.exif.contains_key(&0x9003));
    }

    #[test]
    fn filter_metadata_bytes_output_reparses_clean() {
        let original = tiny_jpeg(32, 24);
        let tagged = embed_in_jpeg(&original, &serialize(&sample_exif()));

        let blob = filter_metadata_bytes(&tagged).unwrap();
        let reparsed = extract_exif(&blob).unwrap();
        assert!(reparsed.gps.is_empty());
        for tag in SENSITIVE_TAGS {
            assert!(!reparsed.ifd0.contains_key(tag));
            assert!(!reparsed.exif.contains_key(tag));
        }
        assert_eq!(reparsed.orientation(), sample_exif().orientation());
    }

    #[test]
    fn filter_metadata_bytes_none_without_exif() {
        assert!(filter_metadata_bytes(&tiny_jpeg(16, 16)).is_none());
        assert!(filter_metadata_bytes(b"garbage").is_none());
    }

    // =========================================================================
    // Orientation and DPI accessors
    // =========================================================================

    #[test]
    fn orientation_out_of_range_is_none() {
        let mut data = ExifData::default();
        data.ifd0.insert(TAG_ORIENTATION, TagValue::Short(vec![9]));
        assert_eq!(data.orientation(), None);
    }

    #[test]
    fn dpi_from_rational_pair() {
        let mut data = ExifData::default();
        data.ifd0
            .insert(TAG_X_RESOLUTION, TagValue::Rational(vec![(300, 1)]));
        data.ifd0
            .insert(TAG_Y_RESOLUTION, TagValue::Rational(vec![(300, 1)]));
        assert_eq!(data.dpi(), Some((300, 300)));
    }

    #[test]
    fn dpi_zero_denominator_is_none() {
        let mut data = ExifData::default();
        data.ifd0
            .insert(TAG_X_RESOLUTION, TagValue::Rational(vec![(300, 0)]));
        data.ifd0
            .insert(TAG_Y_RESOLUTION, TagValue::Rational(vec![(300, 1)]));
        assert_eq!(data.dpi(), None);
    }

    // =========================================================================
    // JPEG embedding
    // =========================================================================

    #[test]
    fn embed_in_jpeg_round_trips() {
        let jpeg = tiny_jpeg(16, 16);
        let blob = serialize(&sample_exif().filtered());

        let tagged = embed_in_jpeg(&jpeg, &blob);
        let parsed = extract_exif(&tagged).unwrap();
        assert_eq!(parsed.orientation(), sample_exif().orientation());
        // Still decodable as an image
        assert!(image::load_from_memory(&tagged).is_ok());
    }

    #[test]
    fn embed_in_jpeg_replaces_existing_segment() {
        let jpeg = tiny_jpeg(16, 16);
        let first = serialize(&sample_exif());
        let tagged_once = embed_in_jpeg(&jpeg, &first);

        let mut replacement = ExifData::default();
        replacement
            .ifd0
            .insert(TAG_ORIENTATION, TagValue::Short(vec![3]));
        let tagged_twice = embed_in_jpeg(&tagged_once, &serialize(&replacement));

        let parsed = extract_exif(&tagged_twice).unwrap();
        assert_eq!(parsed.orientation(), Some(3));
        // Old segment gone: the serial number must not reappear
        assert!(!parsed.exif.contains_key(&0xA431));
    }

    #[test]
    fn embed_in_jpeg_ignores_non_jpeg_input() {
        let not_jpeg = b"plain text".to_vec();
        assert_eq!(embed_in_jpeg(&not_jpeg, b"Exif\0\0II"), not_jpeg);
    }

    // =========================================================================
    // WebP embedding
    // =========================================================================

    fn simple_webp(width: u32, height: u32) -> Vec<u8> {
        let pixels = vec![128u8; (width * height * 3) as usize];
        let encoder = webp::Encoder::from_rgb(&pixels, width, height);
        encoder.encode(80.0).to_vec()
    }

    #[test]
    fn embed_in_webp_produces_extended_container() {
        let file = simple_webp(20, 10);
        let blob = serialize(&sample_exif().filtered());

        let tagged = embed_in_webp(&file, &blob, (20, 10));
        assert_eq!(&tagged[0..4], b"RIFF");
        assert_eq!(&tagged[8..16], b"WEBPVP8X");
        // EXIF flag set in the VP8X header
        assert_eq!(tagged[20] & 0x08, 0x08);
        // RIFF size covers the whole file
        let riff_size = u32::from_le_bytes(tagged[4..8].try_into().unwrap()) as usize;
        assert_eq!(riff_size + 8, tagged.len());
        // The EXIF chunk is present and carries the TIFF structure
        let pos = tagged
            .windows(4)
            .position(|w| w == b"EXIF")
            .expect("EXIF chunk missing");
        let payload_len =
            u32::from_le_bytes(tagged[pos + 4..pos + 8].try_into().unwrap()) as usize;
        let payload = &tagged[pos + 8..pos + 8 + payload_len];
        assert_eq!(
            extract_exif(payload).unwrap().orientation(),
            sample_exif().orientation()
        );
    }

    #[test]
    fn embed_in_webp_leaves_non_webp_untouched() {
        let data = b"not a riff container".to_vec();
        assert_eq!(embed_in_webp(&data, b"blob", (1, 1)), data);
    }
}
