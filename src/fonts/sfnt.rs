//! Embedded TrueType/OpenType (`sfnt`) parsing for text extraction.
//!
//! Subset fonts frequently ship an incomplete ToUnicode CMap but a complete
//! `cmap` table inside the embedded font program. This module recovers a
//! glyph-id → Unicode mapping from that table (formats 0, 4, 6, and 12) and
//! a readable font name from the `name` table.
//!
//! Parsing is best-effort over an in-memory slice: any read that would
//! overrun the buffer aborts that table only, and overall success is
//! signalled iff at least one glyph mapping was produced. TrueType
//! Collections (`ttcf`) and bare CFF programs are recognized but not
//! parsed; callers fall back to ToUnicode/encoding for those.

use byteorder::{BigEndian, ByteOrder};
use std::collections::HashMap;

/// Groups wider than this in a format 12 subtable are treated as
/// adversarial and skipped.
const MAX_GROUP_SPAN: u32 = 10_000;

/// Mapping recovered from an embedded font program.
#[derive(Debug, Default)]
pub struct SfntFont {
    /// Glyph id → Unicode code point, first occurrence wins.
    pub glyph_to_unicode: HashMap<u16, u32>,
    /// Full or PostScript name from the `name` table, informational only.
    pub font_name: Option<String>,
}

fn read_u16(data: &[u8], pos: usize) -> Option<u16> {
    data.get(pos..pos + 2).map(BigEndian::read_u16)
}

fn read_u32(data: &[u8], pos: usize) -> Option<u32> {
    data.get(pos..pos + 4).map(BigEndian::read_u32)
}

/// Signed 16-bit read via bias subtraction.
fn read_i16(data: &[u8], pos: usize) -> Option<i32> {
    read_u16(data, pos).map(|v| {
        if v >= 0x8000 {
            v as i32 - 0x10000
        } else {
            v as i32
        }
    })
}

/// Parse an embedded font program.
///
/// Returns `None` when the container is not a parseable sfnt or when no
/// glyph mapping could be recovered.
pub fn parse(data: &[u8]) -> Option<SfntFont> {
    let magic = read_u32(data, 0)?;
    match magic {
        0x0001_0000 => {},                 // TrueType
        m if m == u32::from_be_bytes(*b"true") => {},
        m if m == u32::from_be_bytes(*b"OTTO") => {}, // OpenType/CFF container
        m if m == u32::from_be_bytes(*b"ttcf") => {
            log::debug!("TrueType Collection not supported");
            return None;
        },
        other => {
            log::debug!("unrecognized font magic 0x{:08X}", other);
            return None;
        },
    }

    let num_tables = read_u16(data, 4)? as usize;
    // searchRange, entrySelector, rangeShift are redundant; skip them

    let mut tables: HashMap<[u8; 4], (usize, usize)> = HashMap::new();
    for i in 0..num_tables {
        let entry = 12 + i * 16;
        let tag = match data.get(entry..entry + 4) {
            Some(t) => [t[0], t[1], t[2], t[3]],
            None => break, // truncated directory, keep what we have
        };
        let offset = match read_u32(data, entry + 8) {
            Some(o) => o as usize,
            None => break,
        };
        let length = read_u32(data, entry + 12).unwrap_or(0) as usize;
        tables.insert(tag, (offset, length));
    }

    let mut font = SfntFont::default();

    if let Some(&(offset, _)) = tables.get(b"cmap") {
        parse_cmap(data, offset, &mut font.glyph_to_unicode);
    }
    if let Some(&(offset, _)) = tables.get(b"name") {
        font.font_name = parse_name_table(data, offset);
    }

    if font.glyph_to_unicode.is_empty() {
        return None;
    }
    log::debug!(
        "embedded cmap recovered {} glyph mappings ({})",
        font.glyph_to_unicode.len(),
        font.font_name.as_deref().unwrap_or("unnamed")
    );
    Some(font)
}

/// Pick and parse the best `cmap` subtable.
///
/// Priority: Windows Unicode full (3,10) > Windows Unicode BMP (3,1) >
/// Unicode platform with encoding ≥ 3 > Unicode platform > Mac Roman (1,0).
fn parse_cmap(data: &[u8], table_offset: usize, map: &mut HashMap<u16, u32>) {
    let num_subtables = match read_u16(data, table_offset + 2) {
        Some(n) => n as usize,
        None => return,
    };

    let mut best: Option<(u8, usize)> = None;
    for i in 0..num_subtables {
        let entry = table_offset + 4 + i * 8;
        let (platform, encoding, sub_offset) = match (
            read_u16(data, entry),
            read_u16(data, entry + 2),
            read_u32(data, entry + 4),
        ) {
            (Some(p), Some(e), Some(o)) => (p, e, o as usize),
            _ => return,
        };
        let score: u8 = match (platform, encoding) {
            (3, 10) => 11,
            (3, 1) => 10,
            (0, e) if e >= 3 => 9,
            (0, _) => 8,
            (1, 0) => 5,
            _ => 0,
        };
        if score > 0 && best.map(|(s, _)| score > s).unwrap_or(true) {
            best = Some((score, table_offset + sub_offset));
        }
    }

    let (_, sub) = match best {
        Some(b) => b,
        None => return,
    };

    match read_u16(data, sub) {
        Some(0) => parse_format0(data, sub, map),
        Some(4) => parse_format4(data, sub, map),
        Some(6) => parse_format6(data, sub, map),
        Some(12) => parse_format12(data, sub, map),
        Some(other) => log::debug!("cmap subtable format {} not supported", other),
        None => {},
    }
}

/// Format 0: 256 byte-indexed glyph ids.
fn parse_format0(data: &[u8], sub: usize, map: &mut HashMap<u16, u32>) {
    // format, length, language, then the glyph id array
    let glyphs = match data.get(sub + 6..sub + 6 + 256) {
        Some(g) => g,
        None => return,
    };
    for (code, &gid) in glyphs.iter().enumerate() {
        if gid != 0 {
            map.entry(gid as u16).or_insert(code as u32);
        }
    }
}

/// Format 4: segment mapping to delta values.
fn parse_format4(data: &[u8], sub: usize, map: &mut HashMap<u16, u32>) {
    let seg_count_x2 = match read_u16(data, sub + 6) {
        Some(v) => v as usize,
        None => return,
    };
    let seg_count = seg_count_x2 / 2;
    if seg_count == 0 {
        return;
    }

    let end_codes = sub + 14;
    let start_codes = end_codes + seg_count_x2 + 2; // reserved pad between
    let id_deltas = start_codes + seg_count_x2;
    let id_range_offsets = id_deltas + seg_count_x2;

    for seg in 0..seg_count {
        let (end, start, delta, range_offset) = match (
            read_u16(data, end_codes + seg * 2),
            read_u16(data, start_codes + seg * 2),
            read_i16(data, id_deltas + seg * 2),
            read_u16(data, id_range_offsets + seg * 2),
        ) {
            (Some(e), Some(s), Some(d), Some(r)) => (e, s, d, r),
            _ => return, // truncated table
        };
        if start == 0xFFFF || end < start {
            continue;
        }

        for code in start..=end {
            let gid = if range_offset == 0 {
                (code as i32 + delta) as u16
            } else {
                // Indirect lookup into the glyph id array that follows
                let pos = id_range_offsets
                    + seg * 2
                    + range_offset as usize
                    + (code - start) as usize * 2;
                let raw = match read_u16(data, pos) {
                    Some(g) => g,
                    None => continue,
                };
                if raw == 0 {
                    0
                } else {
                    (raw as i32 + delta) as u16
                }
            };
            if gid != 0 {
                // First occurrence wins: keeps clean BMP mappings from being
                // overwritten by later aliased codes
                map.entry(gid).or_insert(code as u32);
            }
        }
    }
}

/// Format 6: trimmed table mapping.
fn parse_format6(data: &[u8], sub: usize, map: &mut HashMap<u16, u32>) {
    let (first_code, entry_count) = match (read_u16(data, sub + 6), read_u16(data, sub + 8)) {
        (Some(f), Some(e)) => (f as u32, e as usize),
        _ => return,
    };
    for i in 0..entry_count {
        let gid = match read_u16(data, sub + 10 + i * 2) {
            Some(g) => g,
            None => return,
        };
        if gid != 0 {
            map.entry(gid).or_insert(first_code + i as u32);
        }
    }
}

/// Format 12: segmented coverage with 32-bit groups.
fn parse_format12(data: &[u8], sub: usize, map: &mut HashMap<u16, u32>) {
    let num_groups = match read_u32(data, sub + 12) {
        Some(n) => n as usize,
        None => return,
    };
    for g in 0..num_groups {
        let group = sub + 16 + g * 12;
        let (start_char, end_char, start_glyph) = match (
            read_u32(data, group),
            read_u32(data, group + 4),
            read_u32(data, group + 8),
        ) {
            (Some(s), Some(e), Some(gl)) => (s, e, gl),
            _ => return,
        };
        if end_char < start_char || end_char - start_char > MAX_GROUP_SPAN {
            log::debug!("skipping oversized cmap group {}..{}", start_char, end_char);
            continue;
        }
        for k in 0..=(end_char - start_char) {
            let ch = start_char + k;
            let gid = start_glyph as u64 + k as u64;
            if ch >= 0x110000 || gid == 0 || gid > 0xFFFF {
                continue;
            }
            map.entry(gid as u16).or_insert(ch);
        }
    }
}

/// Extract a readable font name from the `name` table.
///
/// Uses the first record whose nameId is 4 (full name) or 6 (PostScript
/// name); platforms 0 and 3 store UTF-16BE, everything else Latin-1.
fn parse_name_table(data: &[u8], table_offset: usize) -> Option<String> {
    let count = read_u16(data, table_offset + 2)? as usize;
    let string_offset = read_u16(data, table_offset + 4)? as usize;

    for i in 0..count {
        let record = table_offset + 6 + i * 12;
        let platform = read_u16(data, record)?;
        let name_id = read_u16(data, record + 6)?;
        let length = read_u16(data, record + 8)? as usize;
        let offset = read_u16(data, record + 10)? as usize;

        if name_id != 4 && name_id != 6 {
            continue;
        }

        let start = table_offset + string_offset + offset;
        let bytes = data.get(start..start + length)?;

        let name = if platform == 0 || platform == 3 {
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(BigEndian::read_u16)
                .collect();
            String::from_utf16_lossy(&units)
        } else {
            bytes.iter().map(|&b| b as char).collect()
        };
        let name = name.trim_matches('\0').to_string();
        if !name.is_empty() {
            return Some(name);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn be16(v: u16) -> [u8; 2] {
        v.to_be_bytes()
    }

    fn be32(v: u32) -> [u8; 4] {
        v.to_be_bytes()
    }

    /// Assemble an sfnt container from (tag, body) pairs.
    fn build_sfnt(tables: &[([u8; 4], Vec<u8>)]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend(be32(0x0001_0000));
        data.extend(be16(tables.len() as u16));
        data.extend(be16(0)); // searchRange
        data.extend(be16(0)); // entrySelector
        data.extend(be16(0)); // rangeShift

        let mut offset = 12 + 16 * tables.len();
        let mut bodies = Vec::new();
        for (tag, body) in tables {
            data.extend(tag);
            data.extend(be32(0)); // checksum
            data.extend(be32(offset as u32));
            data.extend(be32(body.len() as u32));
            offset += body.len();
            bodies.extend_from_slice(body);
        }
        data.extend(bodies);
        data
    }

    /// cmap table with a single (3,1) format 4 subtable: one live segment
    /// plus the 0xFFFF terminator.
    fn cmap_format4(start: u16, end: u16, delta: i16) -> Vec<u8> {
        let mut t = Vec::new();
        t.extend(be16(0)); // version
        t.extend(be16(1)); // numTables
        t.extend(be16(3)); // platform
        t.extend(be16(1)); // encoding
        t.extend(be32(12)); // subtable offset

        let seg_count = 2u16;
        t.extend(be16(4)); // format
        t.extend(be16(16 + 8 * seg_count)); // length
        t.extend(be16(0)); // language
        t.extend(be16(seg_count * 2));
        t.extend(be16(0)); // searchRange
        t.extend(be16(0)); // entrySelector
        t.extend(be16(0)); // rangeShift
        t.extend(be16(end)); // endCode[0]
        t.extend(be16(0xFFFF)); // endCode[1]
        t.extend(be16(0)); // reserved pad
        t.extend(be16(start)); // startCode[0]
        t.extend(be16(0xFFFF)); // startCode[1]
        t.extend(be16(delta as u16)); // idDelta[0]
        t.extend(be16(1)); // idDelta[1]
        t.extend(be16(0)); // idRangeOffset[0]
        t.extend(be16(0)); // idRangeOffset[1]
        t
    }

    #[test]
    fn test_format4_identity_segment() {
        // Segment 0x41..=0x43 with delta 0: glyph id == char code
        let data = build_sfnt(&[(*b"cmap", cmap_format4(0x41, 0x43, 0))]);
        let font = parse(&data).unwrap();
        assert_eq!(font.glyph_to_unicode.get(&0x41), Some(&0x41));
        assert_eq!(font.glyph_to_unicode.get(&0x42), Some(&0x42));
        assert_eq!(font.glyph_to_unicode.get(&0x43), Some(&0x43));
        assert_eq!(font.glyph_to_unicode.len(), 3);
    }

    #[test]
    fn test_format4_with_delta() {
        // Chars 0x61..=0x62 map to glyphs 1..=2 via delta
        let delta = 1i32 - 0x61;
        let data = build_sfnt(&[(*b"cmap", cmap_format4(0x61, 0x62, delta as i16))]);
        let font = parse(&data).unwrap();
        assert_eq!(font.glyph_to_unicode.get(&1), Some(&0x61));
        assert_eq!(font.glyph_to_unicode.get(&2), Some(&0x62));
    }

    #[test]
    fn test_format0() {
        let mut t = Vec::new();
        t.extend(be16(0));
        t.extend(be16(1));
        t.extend(be16(1)); // platform Mac
        t.extend(be16(0)); // encoding Roman
        t.extend(be32(12));
        t.extend(be16(0)); // format 0
        t.extend(be16(262)); // length
        t.extend(be16(0)); // language
        let mut glyphs = [0u8; 256];
        glyphs[b'A' as usize] = 7;
        t.extend(glyphs);

        let font = parse(&build_sfnt(&[(*b"cmap", t)])).unwrap();
        assert_eq!(font.glyph_to_unicode.get(&7), Some(&(b'A' as u32)));
        assert_eq!(font.glyph_to_unicode.len(), 1);
    }

    #[test]
    fn test_format6() {
        let mut t = Vec::new();
        t.extend(be16(0));
        t.extend(be16(1));
        t.extend(be16(0)); // platform Unicode
        t.extend(be16(3));
        t.extend(be32(12));
        t.extend(be16(6)); // format 6
        t.extend(be16(14)); // length
        t.extend(be16(0)); // language
        t.extend(be16(0x30)); // firstCode
        t.extend(be16(2)); // entryCount
        t.extend(be16(5)); // glyph for 0x30
        t.extend(be16(0)); // unmapped slot

        let font = parse(&build_sfnt(&[(*b"cmap", t)])).unwrap();
        assert_eq!(font.glyph_to_unicode.get(&5), Some(&0x30));
        assert_eq!(font.glyph_to_unicode.len(), 1);
    }

    #[test]
    fn test_format12() {
        let mut t = Vec::new();
        t.extend(be16(0));
        t.extend(be16(1));
        t.extend(be16(3));
        t.extend(be16(10));
        t.extend(be32(12));
        t.extend(be16(12)); // format 12
        t.extend(be16(0)); // reserved
        t.extend(be32(40)); // length
        t.extend(be32(0)); // language
        t.extend(be32(2)); // numGroups
        // Group 1: U+1F600..U+1F601 from glyph 100
        t.extend(be32(0x1F600));
        t.extend(be32(0x1F601));
        t.extend(be32(100));
        // Group 2: oversized, must be skipped
        t.extend(be32(0));
        t.extend(be32(50_000));
        t.extend(be32(1));

        let font = parse(&build_sfnt(&[(*b"cmap", t)])).unwrap();
        assert_eq!(font.glyph_to_unicode.get(&100), Some(&0x1F600));
        assert_eq!(font.glyph_to_unicode.get(&101), Some(&0x1F601));
        assert_eq!(font.glyph_to_unicode.len(), 2);
    }

    #[test]
    fn test_name_table() {
        let name_bytes: Vec<u8> = "Demo-Font"
            .encode_utf16()
            .flat_map(|u| u.to_be_bytes())
            .collect();
        let mut name = Vec::new();
        name.extend(be16(0)); // format
        name.extend(be16(1)); // count
        name.extend(be16(18)); // stringOffset
        name.extend(be16(3)); // platform
        name.extend(be16(1)); // encoding
        name.extend(be16(0)); // language
        name.extend(be16(6)); // nameId: PostScript name
        name.extend(be16(name_bytes.len() as u16));
        name.extend(be16(0)); // offset
        name.extend(name_bytes);

        let data = build_sfnt(&[
            (*b"cmap", cmap_format4(0x41, 0x41, 0)),
            (*b"name", name),
        ]);
        let font = parse(&data).unwrap();
        assert_eq!(font.font_name.as_deref(), Some("Demo-Font"));
    }

    #[test]
    fn test_collection_rejected() {
        let mut data = b"ttcf".to_vec();
        data.extend([0u8; 32]);
        assert!(parse(&data).is_none());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(parse(b"").is_none());
        assert!(parse(b"not a font file at all").is_none());
    }

    #[test]
    fn test_truncated_cmap_tolerated() {
        // Directory says cmap is there but the table is cut short
        let data = build_sfnt(&[(*b"cmap", vec![0, 0])]);
        assert!(parse(&data).is_none());
    }
}
