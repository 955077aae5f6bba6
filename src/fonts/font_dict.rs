//! Font dictionary parsing.
//!
//! Builds the unified per-font decoder from every signal a font dictionary
//! offers: the ToUnicode CMap, standard encodings with `/Differences`, and
//! the embedded font program's `cmap` table (chained through `CIDToGIDMap`
//! for CID fonts).

use crate::config::ExtractOptions;
use crate::fonts::cmap::parse_tounicode_cmap;
use crate::fonts::encoding::{apply_differences, standard_encoding};
use crate::fonts::sfnt;
use crate::object::Object;
use crate::resolver::Resolver;
use std::collections::HashMap;

/// CID → GID mapping for CIDFontType2 fonts (ISO 32000-1:2008, §9.7.4.3).
#[derive(Debug, Clone)]
enum CidToGid {
    /// CID == GID (the default)
    Identity,
    /// Packed big-endian u16 array indexed by CID
    Explicit(Vec<u16>),
}

/// Unified per-font decoder.
///
/// The lookup order in [`FontInfo::decode`] is fixed: ToUnicode first, the
/// embedded font's glyph mapping second, the simple encoding third, then a
/// printable-ASCII fallback.
#[derive(Debug, Clone, Default)]
pub struct FontInfo {
    /// BaseFont name, informational.
    pub name: String,
    /// Named encoding (`WinAnsiEncoding`, `Identity-H`, ...), if any.
    pub encoding_name: Option<String>,
    /// Single-byte code → Unicode code point (standard table ± Differences).
    pub simple_encoding: HashMap<u16, u32>,
    /// Char code → decoded string, the highest-priority decoder.
    pub to_unicode: HashMap<u32, String>,
    /// Glyph id → Unicode, from the embedded sfnt `cmap`.
    pub embedded_glyph_to_unicode: HashMap<u16, u32>,
}

/// Strip characters the output contract forbids (controls other than
/// tab, newline, form feed, and carriage return).
fn sanitize(s: &str) -> String {
    s.chars()
        .filter(|&c| c >= ' ' || matches!(c, '\t' | '\n' | '\x0C' | '\r'))
        .collect()
}

fn code_point_to_utf8(cp: u32) -> String {
    char::from_u32(cp)
        .filter(|&c| c >= ' ' || matches!(c, '\t' | '\n' | '\x0C' | '\r'))
        .map(String::from)
        .unwrap_or_default()
}

impl FontInfo {
    /// Build a decoder from a font dictionary (or stream) body.
    ///
    /// Never fails; each missing or malformed signal just leaves its map
    /// empty and the decode chain falls through to the next one.
    pub fn from_dict(
        dict: &HashMap<String, Object>,
        resolver: &Resolver,
        options: &ExtractOptions,
    ) -> Self {
        let mut font = FontInfo {
            name: dict
                .get("BaseFont")
                .and_then(|o| o.as_name())
                .unwrap_or("Unknown")
                .to_string(),
            ..Default::default()
        };

        font.load_encoding(dict, resolver);
        font.load_to_unicode(dict, resolver);
        font.load_embedded(dict, resolver, options);

        log::debug!(
            "font '{}': {} ToUnicode, {} embedded, {} simple mappings",
            font.name,
            font.to_unicode.len(),
            font.embedded_glyph_to_unicode.len(),
            font.simple_encoding.len()
        );
        font
    }

    /// `/Encoding` as a name or a dictionary with BaseEncoding + Differences.
    fn load_encoding(&mut self, dict: &HashMap<String, Object>, resolver: &Resolver) {
        let encoding = match resolver.dict_get(dict, "Encoding") {
            Some(e) => e,
            None => return,
        };

        match encoding {
            Object::Name(name) => {
                self.encoding_name = Some(name.clone());
                if let Some(table) = standard_encoding(name) {
                    self.simple_encoding = table;
                }
            },
            Object::Dictionary(enc_dict) => {
                if let Some(base) = enc_dict.get("BaseEncoding").and_then(|o| o.as_name()) {
                    self.encoding_name = Some(base.to_string());
                    if let Some(table) = standard_encoding(base) {
                        self.simple_encoding = table;
                    }
                }
                if let Some(diffs) = resolver
                    .dict_get(enc_dict, "Differences")
                    .and_then(|o| o.as_array())
                {
                    apply_differences(&mut self.simple_encoding, diffs);
                }
            },
            _ => {},
        }
    }

    /// `/ToUnicode` stream → the primary decoder map.
    fn load_to_unicode(&mut self, dict: &HashMap<String, Object>, resolver: &Resolver) {
        if let Some((_, data)) = resolver
            .dict_get(dict, "ToUnicode")
            .and_then(|o| o.as_stream())
        {
            self.to_unicode = parse_tounicode_cmap(data);
        }
    }

    /// Embedded font program → glyph mapping, merged into `to_unicode`.
    ///
    /// Runs whenever the ToUnicode map is absent or suspiciously small:
    /// subset fonts frequently ship an incomplete ToUnicode alongside a
    /// complete embedded `cmap`.
    fn load_embedded(
        &mut self,
        dict: &HashMap<String, Object>,
        resolver: &Resolver,
        options: &ExtractOptions,
    ) {
        if self.to_unicode.len() >= options.min_tounicode_entries {
            return;
        }

        let descendant = resolver
            .dict_get(dict, "DescendantFonts")
            .and_then(|o| o.as_array())
            .and_then(|arr| arr.first())
            .and_then(|o| resolver.resolve_if_ref(o))
            .and_then(|o| o.as_dict());

        let descriptor = resolver
            .dict_get(dict, "FontDescriptor")
            .or_else(|| descendant.and_then(|d| resolver.dict_get(d, "FontDescriptor")))
            .and_then(|o| o.as_dict());
        let descriptor = match descriptor {
            Some(d) => d,
            None => return,
        };

        let cid_to_gid = descendant
            .and_then(|d| resolver.dict_get(d, "CIDToGIDMap"))
            .map(|obj| match obj {
                Object::Stream { data, .. } => {
                    let gids = data
                        .chunks_exact(2)
                        .map(|c| u16::from_be_bytes([c[0], c[1]]))
                        .collect();
                    CidToGid::Explicit(gids)
                },
                // /Identity or anything else: no indirection
                _ => CidToGid::Identity,
            })
            .unwrap_or(CidToGid::Identity);

        // FontFile2 (TrueType) first, then FontFile3 (CFF/OpenType), then
        // FontFile (Type 1); the sfnt parser rejects what it cannot read
        for key in ["FontFile2", "FontFile3", "FontFile"] {
            let data = match resolver.dict_get(descriptor, key).and_then(|o| o.as_stream()) {
                Some((_, data)) => data,
                None => continue,
            };
            let parsed = match sfnt::parse(data) {
                Some(p) => p,
                None => {
                    log::debug!("font '{}': {} not parseable as sfnt", self.name, key);
                    continue;
                },
            };

            match &cid_to_gid {
                CidToGid::Explicit(gids) => {
                    for (cid, &gid) in gids.iter().enumerate() {
                        if let Some(&uni) = parsed.glyph_to_unicode.get(&gid) {
                            self.to_unicode
                                .entry(cid as u32)
                                .or_insert_with(|| code_point_to_utf8(uni));
                        }
                    }
                },
                CidToGid::Identity => {
                    for (&gid, &uni) in &parsed.glyph_to_unicode {
                        self.to_unicode
                            .entry(gid as u32)
                            .or_insert_with(|| code_point_to_utf8(uni));
                    }
                },
            }
            self.embedded_glyph_to_unicode = parsed.glyph_to_unicode;
            if self.name == "Unknown" {
                if let Some(name) = parsed.font_name {
                    self.name = name;
                }
            }
            break;
        }

        // Empty strings from unmappable code points are useless entries
        self.to_unicode.retain(|_, v| !v.is_empty());
    }

    /// True when at least one decoding signal is populated.
    pub fn is_selectable(&self) -> bool {
        !self.to_unicode.is_empty()
            || !self.simple_encoding.is_empty()
            || !self.embedded_glyph_to_unicode.is_empty()
    }

    /// Decode one character code through the fixed priority chain.
    pub fn decode(&self, code: u32) -> String {
        if let Some(s) = self.to_unicode.get(&code) {
            return sanitize(s);
        }
        if code <= 0xFFFF {
            if let Some(&cp) = self.embedded_glyph_to_unicode.get(&(code as u16)) {
                return code_point_to_utf8(cp);
            }
            if let Some(&cp) = self.simple_encoding.get(&(code as u16)) {
                return code_point_to_utf8(cp);
            }
        }
        // Escape-produced \t \n \r pass through alongside printable ASCII
        if (32..127).contains(&code) || matches!(code, 9 | 10 | 13) {
            return (code as u8 as char).to_string();
        }
        String::new()
    }

    /// Decode a raw string operand.
    ///
    /// At each position the 2-byte big-endian code is tried against the
    /// ToUnicode map first; on a hit the cursor advances two bytes,
    /// otherwise the single byte is decoded. This covers simple and CID
    /// dual-width text without an explicit encoding flag.
    pub fn decode_bytes(&self, bytes: &[u8]) -> String {
        let mut out = String::new();
        let mut i = 0;

        while i < bytes.len() {
            if i + 1 < bytes.len() {
                let code = ((bytes[i] as u32) << 8) | bytes[i + 1] as u32;
                if let Some(s) = self.to_unicode.get(&code) {
                    out.push_str(&sanitize(s));
                    i += 2;
                    continue;
                }
            }
            out.push_str(&self.decode(bytes[i] as u32));
            i += 1;
        }

        out
    }
}
