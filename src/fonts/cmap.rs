//! ToUnicode CMap parsing.
//!
//! CMap streams define the mapping from character codes to Unicode strings
//! and are the highest-priority decoding signal during text extraction.
//! Two section kinds are recognized (Adobe TN #5014 grammar):
//!
//! - `beginbfchar ... endbfchar`: `<srcHex> <dstHex>` pairs
//! - `beginbfrange ... endbfrange`: `<loHex> <hiHex> <dstHex>` triplets, or
//!   `<loHex> <hiHex> [<dst0> <dst1> ...]` with one destination per code
//!
//! Destination hex decodes as UTF-16BE in 4-digit chunks with surrogate
//! pairs combined and zero chunks skipped. The parser never fails: unknown
//! sections, commentary, and malformed hex only reduce the mapping count.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    static ref RE_PAIR: Regex = Regex::new(r"<([0-9A-Fa-f\s]*)>\s*<([0-9A-Fa-f\s]*)>").unwrap();
    static ref RE_TRIPLET: Regex =
        Regex::new(r"<([0-9A-Fa-f\s]*)>\s*<([0-9A-Fa-f\s]*)>\s*<([0-9A-Fa-f\s]*)>").unwrap();
    static ref RE_RANGE_ARRAY: Regex =
        Regex::new(r"<([0-9A-Fa-f\s]*)>\s*<([0-9A-Fa-f\s]*)>\s*\[((?:\s*<[^>]*>\s*)+)\]").unwrap();
    static ref RE_HEX_ITEM: Regex = Regex::new(r"<([0-9A-Fa-f\s]*)>").unwrap();
}

/// Parse a ToUnicode CMap stream into a char-code → UTF-8 string map.
///
/// # Examples
///
/// ```
/// use pdftext::fonts::cmap::parse_tounicode_cmap;
///
/// let cmap = parse_tounicode_cmap(b"beginbfchar\n<0041> <00E9>\nendbfchar");
/// assert_eq!(cmap.get(&0x41).map(String::as_str), Some("\u{e9}"));
/// ```
pub fn parse_tounicode_cmap(data: &[u8]) -> HashMap<u32, String> {
    let mut map = HashMap::new();
    let content = String::from_utf8_lossy(data);

    for section in extract_sections(&content, "beginbfchar", "endbfchar") {
        for line in section.lines() {
            if let Some((src, dst)) = parse_bfchar_line(line) {
                log::trace!("bfchar 0x{:04X} -> {:?}", src, dst);
                map.insert(src, dst);
            }
        }
    }

    for section in extract_sections(&content, "beginbfrange", "endbfrange") {
        for line in section.lines() {
            for (src, dst) in parse_bfrange_line(line) {
                map.insert(src, dst);
            }
        }
    }

    map
}

/// Extract the contents between every `begin`/`end` marker pair.
fn extract_sections<'a>(content: &'a str, begin: &str, end: &str) -> Vec<&'a str> {
    let mut sections = Vec::new();
    let mut remaining = content;

    while let Some(begin_pos) = remaining.find(begin) {
        let after_begin = &remaining[begin_pos + begin.len()..];
        match after_begin.find(end) {
            Some(end_pos) => {
                sections.push(&after_begin[..end_pos]);
                remaining = &after_begin[end_pos + end.len()..];
            },
            None => break,
        }
    }

    sections
}

fn parse_hex_u32(hex: &str) -> Option<u32> {
    let cleaned: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return None;
    }
    u32::from_str_radix(&cleaned, 16).ok()
}

/// Decode destination hex as UTF-16BE: 4-digit chunks become code units,
/// surrogate pairs combine into supplementary code points, zero chunks are
/// skipped, and anything outside Unicode yields nothing.
fn utf16be_hex_to_string(hex: &str) -> String {
    let cleaned: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
    let mut units = Vec::with_capacity(cleaned.len() / 4 + 1);
    let chars: Vec<char> = cleaned.chars().collect();

    let mut i = 0;
    while i < chars.len() {
        let end = (i + 4).min(chars.len());
        let chunk: String = chars[i..end].iter().collect();
        if let Ok(unit) = u16::from_str_radix(&chunk, 16) {
            if unit != 0 {
                units.push(unit);
            }
        }
        i = end;
    }

    let mut out = String::new();
    let mut i = 0;
    while i < units.len() {
        let unit = units[i];
        if (0xD800..=0xDBFF).contains(&unit) && i + 1 < units.len() {
            let low = units[i + 1];
            if (0xDC00..=0xDFFF).contains(&low) {
                let cp =
                    0x10000 + (((unit & 0x3FF) as u32) << 10) + ((low & 0x3FF) as u32);
                if let Some(ch) = char::from_u32(cp) {
                    out.push(ch);
                }
                i += 2;
                continue;
            }
        }
        if let Some(ch) = char::from_u32(unit as u32) {
            out.push(ch);
        }
        i += 1;
    }

    out
}

/// Convert a computed code point to a string; values above the Unicode
/// range (or lone surrogates) yield the empty string. Values above 0xFFFF
/// that look like packed surrogate pairs are combined first.
fn code_point_to_string(value: u32) -> String {
    if value > 0xFFFF {
        let high = (value >> 16) as u16;
        let low = (value & 0xFFFF) as u16;
        if (0xD800..=0xDBFF).contains(&high) && (0xDC00..=0xDFFF).contains(&low) {
            let cp = 0x10000 + (((high & 0x3FF) as u32) << 10) + ((low & 0x3FF) as u32);
            return char::from_u32(cp).map(String::from).unwrap_or_default();
        }
    }
    char::from_u32(value).map(String::from).unwrap_or_default()
}

/// Parse one `bfchar` mapping: `<src> <dst>`.
fn parse_bfchar_line(line: &str) -> Option<(u32, String)> {
    let caps = RE_PAIR.captures(line)?;
    let src = parse_hex_u32(&caps[1])?;
    let dst = utf16be_hex_to_string(&caps[2]);
    if dst.is_empty() {
        return None;
    }
    Some((src, dst))
}

/// Parse one `bfrange` mapping line, in either form.
fn parse_bfrange_line(line: &str) -> Vec<(u32, String)> {
    let mut result = Vec::new();

    // Array form: <lo> <hi> [<dst0> <dst1> ...]
    if let Some(caps) = RE_RANGE_ARRAY.captures(line) {
        let (lo, hi) = match (parse_hex_u32(&caps[1]), parse_hex_u32(&caps[2])) {
            (Some(lo), Some(hi)) if lo <= hi => (lo, hi),
            _ => return result,
        };
        let span = (hi - lo + 1) as usize;
        for (k, item) in RE_HEX_ITEM.captures_iter(&caps[3]).enumerate() {
            // Excess destinations beyond the range are unmapped
            if k >= span {
                break;
            }
            let dst = utf16be_hex_to_string(&item[1]);
            if !dst.is_empty() {
                result.push((lo + k as u32, dst));
            }
        }
        return result;
    }

    // Scalar form: <lo> <hi> <dst>, mapping code i to dst + (i - lo)
    if let Some(caps) = RE_TRIPLET.captures(line) {
        let (lo, hi, dst) = match (
            parse_hex_u32(&caps[1]),
            parse_hex_u32(&caps[2]),
            parse_hex_u32(&caps[3]),
        ) {
            (Some(lo), Some(hi), Some(dst)) if lo <= hi => (lo, hi, dst),
            _ => return result,
        };
        for i in 0..=(hi - lo) {
            let s = code_point_to_string(dst.wrapping_add(i));
            if !s.is_empty() {
                result.push((lo + i, s));
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bfchar_single() {
        let cmap = parse_tounicode_cmap(b"beginbfchar\n<0041> <0041>\nendbfchar");
        assert_eq!(cmap.get(&0x41), Some(&"A".to_string()));
    }

    #[test]
    fn test_bfchar_accented() {
        let cmap = parse_tounicode_cmap(b"beginbfchar\n<0041> <00E9>\nendbfchar");
        assert_eq!(cmap.get(&0x41), Some(&"\u{e9}".to_string()));
    }

    #[test]
    fn test_bfchar_ligature() {
        // One code expanding to "fi"
        let cmap = parse_tounicode_cmap(b"beginbfchar\n<000C> <00660069>\nendbfchar");
        assert_eq!(cmap.get(&0x0C), Some(&"fi".to_string()));
    }

    #[test]
    fn test_bfchar_surrogate_pair() {
        // D835 DF0C is U+1D70C (mathematical italic small rho)
        let cmap = parse_tounicode_cmap(b"beginbfchar\n<0010> <D835DF0C>\nendbfchar");
        assert_eq!(cmap.get(&0x10), Some(&"\u{1D70C}".to_string()));
    }

    #[test]
    fn test_bfchar_zero_chunks_skipped() {
        let cmap = parse_tounicode_cmap(b"beginbfchar\n<0001> <00000041>\nendbfchar");
        assert_eq!(cmap.get(&0x01), Some(&"A".to_string()));
    }

    #[test]
    fn test_bfrange_scalar() {
        // S4 shape: 0x20..0x22 map to A, B, C
        let cmap = parse_tounicode_cmap(b"beginbfrange <20> <22> <0041> endbfrange");
        assert_eq!(cmap.get(&0x20), Some(&"A".to_string()));
        assert_eq!(cmap.get(&0x21), Some(&"B".to_string()));
        assert_eq!(cmap.get(&0x22), Some(&"C".to_string()));
        assert!(cmap.get(&0x23).is_none());
    }

    #[test]
    fn test_bfrange_array() {
        let cmap = parse_tounicode_cmap(
            b"beginbfrange\n<005F> <0061> [<00660066> <00660069> <00660066006C>]\nendbfrange",
        );
        assert_eq!(cmap.get(&0x5F), Some(&"ff".to_string()));
        assert_eq!(cmap.get(&0x60), Some(&"fi".to_string()));
        assert_eq!(cmap.get(&0x61), Some(&"ffl".to_string()));
    }

    #[test]
    fn test_bfrange_array_excess_unmapped() {
        let cmap =
            parse_tounicode_cmap(b"beginbfrange\n<0010> <0010> [<0041> <0042>]\nendbfrange");
        assert_eq!(cmap.get(&0x10), Some(&"A".to_string()));
        assert!(cmap.get(&0x11).is_none());
    }

    #[test]
    fn test_multiple_sections_and_commentary() {
        let data = b"%!PS-Adobe\n/CIDInit /ProcSet findresource begin\n\
                     beginbfchar\n<01> <0058>\nendbfchar\n\
                     beginbfchar\n<02> <0059>\nendbfchar\nendcmap";
        let cmap = parse_tounicode_cmap(data);
        assert_eq!(cmap.get(&0x01), Some(&"X".to_string()));
        assert_eq!(cmap.get(&0x02), Some(&"Y".to_string()));
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let data = b"beginbfchar\n<zz> <0041>\n<0042> <0042>\nendbfchar";
        let cmap = parse_tounicode_cmap(data);
        assert_eq!(cmap.len(), 1);
        assert_eq!(cmap.get(&0x42), Some(&"B".to_string()));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_tounicode_cmap(b"").is_empty());
        assert!(parse_tounicode_cmap(b"no cmap content").is_empty());
    }

    #[test]
    fn test_hex_with_internal_whitespace() {
        let cmap = parse_tounicode_cmap(b"beginbfchar\n<00 41> <00 5A>\nendbfchar");
        assert_eq!(cmap.get(&0x41), Some(&"Z".to_string()));
    }

    #[test]
    fn test_out_of_range_code_point_empty() {
        assert_eq!(code_point_to_string(0x110000), "");
        assert_eq!(code_point_to_string(0x41), "A");
    }

    #[test]
    fn test_extract_sections() {
        let sections = extract_sections("x beginA one endA y beginA two endA z", "beginA", "endA");
        assert_eq!(sections.len(), 2);
        assert!(sections[0].contains("one"));
        assert!(sections[1].contains("two"));
    }
}
