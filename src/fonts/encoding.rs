//! Standard single-byte encodings and glyph-name resolution.
//!
//! Provides the simple-font encoding tables (WinAnsi, MacRoman, Standard,
//! Identity) used when a font carries no ToUnicode CMap, plus the
//! glyph-name table consulted while applying `/Differences` arrays.
//!
//! WinAnsi follows PDF 1.7 Annex D exactly: 32–127 and 160–255 are
//! identity, 128–159 carry the CP1252 extensions (Euro at 0x80, curly
//! quotes, dashes, ...), and the five CP1252 holes stay unmapped.

use crate::object::Object;
use std::collections::HashMap;

/// WinAnsi positions 0x80–0x9F (PDF 1.7 Annex D). Zero marks an unmapped slot.
const WINANSI_HIGH: [u32; 32] = [
    0x20AC, // 0x80 Euro sign
    0,      // 0x81 unused
    0x201A, // 0x82 single low-9 quotation mark
    0x0192, // 0x83 f with hook
    0x201E, // 0x84 double low-9 quotation mark
    0x2026, // 0x85 horizontal ellipsis
    0x2020, // 0x86 dagger
    0x2021, // 0x87 double dagger
    0x02C6, // 0x88 modifier circumflex
    0x2030, // 0x89 per mille
    0x0160, // 0x8A S with caron
    0x2039, // 0x8B single left angle quote
    0x0152, // 0x8C OE ligature
    0,      // 0x8D unused
    0x017D, // 0x8E Z with caron
    0,      // 0x8F unused
    0,      // 0x90 unused
    0x2018, // 0x91 left single quote
    0x2019, // 0x92 right single quote
    0x201C, // 0x93 left double quote
    0x201D, // 0x94 right double quote
    0x2022, // 0x95 bullet
    0x2013, // 0x96 en dash
    0x2014, // 0x97 em dash
    0x02DC, // 0x98 small tilde
    0x2122, // 0x99 trade mark
    0x0161, // 0x9A s with caron
    0x203A, // 0x9B single right angle quote
    0x0153, // 0x9C oe ligature
    0,      // 0x9D unused
    0x017E, // 0x9E z with caron
    0x0178, // 0x9F Y with diaeresis
];

/// MacRoman positions 0x80–0xFF.
const MACROMAN_HIGH: [u32; 128] = [
    0x00C4, 0x00C5, 0x00C7, 0x00C9, 0x00D1, 0x00D6, 0x00DC, 0x00E1, // 0x80
    0x00E0, 0x00E2, 0x00E4, 0x00E3, 0x00E5, 0x00E7, 0x00E9, 0x00E8, // 0x88
    0x00EA, 0x00EB, 0x00ED, 0x00EC, 0x00EE, 0x00EF, 0x00F1, 0x00F3, // 0x90
    0x00F2, 0x00F4, 0x00F6, 0x00F5, 0x00FA, 0x00F9, 0x00FB, 0x00FC, // 0x98
    0x2020, 0x00B0, 0x00A2, 0x00A3, 0x00A7, 0x2022, 0x00B6, 0x00DF, // 0xA0
    0x00AE, 0x00A9, 0x2122, 0x00B4, 0x00A8, 0x2260, 0x00C6, 0x00D8, // 0xA8
    0x221E, 0x00B1, 0x2264, 0x2265, 0x00A5, 0x00B5, 0x2202, 0x2211, // 0xB0
    0x220F, 0x03C0, 0x222B, 0x00AA, 0x00BA, 0x03A9, 0x00E6, 0x00F8, // 0xB8
    0x00BF, 0x00A1, 0x00AC, 0x221A, 0x0192, 0x2248, 0x2206, 0x00AB, // 0xC0
    0x00BB, 0x2026, 0x00A0, 0x00C0, 0x00C3, 0x00D5, 0x0152, 0x0153, // 0xC8
    0x2013, 0x2014, 0x201C, 0x201D, 0x2018, 0x2019, 0x00F7, 0x25CA, // 0xD0
    0x00FF, 0x0178, 0x2044, 0x20AC, 0x2039, 0x203A, 0xFB01, 0xFB02, // 0xD8
    0x2021, 0x00B7, 0x201A, 0x201E, 0x2030, 0x00C2, 0x00CA, 0x00C1, // 0xE0
    0x00CB, 0x00C8, 0x00CD, 0x00CE, 0x00CF, 0x00CC, 0x00D3, 0x00D4, // 0xE8
    0xF8FF, 0x00D2, 0x00DA, 0x00DB, 0x00D9, 0x0131, 0x02C6, 0x02DC, // 0xF0
    0x00AF, 0x02D8, 0x02D9, 0x02DA, 0x00B8, 0x02DD, 0x02DB, 0x02C7, // 0xF8
];

/// Glyph names covering the printable ASCII range (Adobe Glyph List subset).
static GLYPH_NAMES: phf::Map<&'static str, u32> = phf::phf_map! {
    "space" => 0x20, "exclam" => 0x21, "quotedbl" => 0x22, "numbersign" => 0x23,
    "dollar" => 0x24, "percent" => 0x25, "ampersand" => 0x26, "quotesingle" => 0x27,
    "parenleft" => 0x28, "parenright" => 0x29, "asterisk" => 0x2A, "plus" => 0x2B,
    "comma" => 0x2C, "hyphen" => 0x2D, "period" => 0x2E, "slash" => 0x2F,
    "zero" => 0x30, "one" => 0x31, "two" => 0x32, "three" => 0x33,
    "four" => 0x34, "five" => 0x35, "six" => 0x36, "seven" => 0x37,
    "eight" => 0x38, "nine" => 0x39, "colon" => 0x3A, "semicolon" => 0x3B,
    "less" => 0x3C, "equal" => 0x3D, "greater" => 0x3E, "question" => 0x3F,
    "at" => 0x40,
    "A" => 0x41, "B" => 0x42, "C" => 0x43, "D" => 0x44, "E" => 0x45,
    "F" => 0x46, "G" => 0x47, "H" => 0x48, "I" => 0x49, "J" => 0x4A,
    "K" => 0x4B, "L" => 0x4C, "M" => 0x4D, "N" => 0x4E, "O" => 0x4F,
    "P" => 0x50, "Q" => 0x51, "R" => 0x52, "S" => 0x53, "T" => 0x54,
    "U" => 0x55, "V" => 0x56, "W" => 0x57, "X" => 0x58, "Y" => 0x59,
    "Z" => 0x5A,
    "bracketleft" => 0x5B, "backslash" => 0x5C, "bracketright" => 0x5D,
    "asciicircum" => 0x5E, "underscore" => 0x5F, "grave" => 0x60,
    "a" => 0x61, "b" => 0x62, "c" => 0x63, "d" => 0x64, "e" => 0x65,
    "f" => 0x66, "g" => 0x67, "h" => 0x68, "i" => 0x69, "j" => 0x6A,
    "k" => 0x6B, "l" => 0x6C, "m" => 0x6D, "n" => 0x6E, "o" => 0x6F,
    "p" => 0x70, "q" => 0x71, "r" => 0x72, "s" => 0x73, "t" => 0x74,
    "u" => 0x75, "v" => 0x76, "w" => 0x77, "x" => 0x78, "y" => 0x79,
    "z" => 0x7A,
    "braceleft" => 0x7B, "bar" => 0x7C, "braceright" => 0x7D, "asciitilde" => 0x7E,
};

/// Resolve a glyph name to a Unicode code point.
///
/// Covers the printable ASCII names plus the `uniXXXX` convention
/// (4 hex digits, BMP code point). Unknown names yield `None`.
pub fn glyph_name_to_unicode(name: &str) -> Option<u32> {
    if let Some(&code) = GLYPH_NAMES.get(name) {
        return Some(code);
    }
    if let Some(hex) = name.strip_prefix("uni") {
        if hex.len() == 4 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return u32::from_str_radix(hex, 16).ok();
        }
    }
    None
}

/// Build the code → Unicode table for a named standard encoding.
///
/// Recognized: `WinAnsiEncoding`, `MacRomanEncoding`, `StandardEncoding`,
/// `Identity-H`, `Identity-V` (the last two map bytes to themselves).
/// Unknown names yield `None`.
pub fn standard_encoding(name: &str) -> Option<HashMap<u16, u32>> {
    let mut map = HashMap::new();
    match name {
        "WinAnsiEncoding" => {
            for code in 0x20..0x7Fu16 {
                map.insert(code, code as u32);
            }
            for (i, &cp) in WINANSI_HIGH.iter().enumerate() {
                if cp != 0 {
                    map.insert(0x80 + i as u16, cp);
                }
            }
            for code in 0xA0..=0xFFu16 {
                map.insert(code, code as u32);
            }
        },
        "MacRomanEncoding" => {
            for code in 0x20..0x7Fu16 {
                map.insert(code, code as u32);
            }
            for (i, &cp) in MACROMAN_HIGH.iter().enumerate() {
                map.insert(0x80 + i as u16, cp);
            }
        },
        "StandardEncoding" => {
            for code in 0x20..0x7Fu16 {
                map.insert(code, code as u32);
            }
        },
        "Identity-H" | "Identity-V" => {
            for code in 0x00..=0xFFu16 {
                map.insert(code, code as u32);
            }
        },
        _ => return None,
    }
    Some(map)
}

/// Apply a `/Differences` array on top of a base encoding.
///
/// The array alternates numbers (which reset the running code) and glyph
/// names (assigned to the running code, which then advances). Names the
/// glyph table cannot resolve still consume a code but assign nothing.
pub fn apply_differences(encoding: &mut HashMap<u16, u32>, differences: &[Object]) {
    let mut code: u16 = 0;

    for item in differences {
        match item {
            Object::Number(n) => {
                if n.is_finite() && *n >= 0.0 && *n <= u16::MAX as f64 {
                    code = *n as u16;
                }
            },
            Object::Name(glyph) => {
                if let Some(cp) = glyph_name_to_unicode(glyph) {
                    encoding.insert(code, cp);
                } else {
                    log::trace!("unrecognized glyph name /{} at code {}", glyph, code);
                }
                code = code.saturating_add(1);
            },
            _ => {},
        }
    }
}
