//! Font handling and decoding.
//!
//! Everything needed to turn a font dictionary into a character-code →
//! Unicode decoder: ToUnicode CMap parsing, standard encodings with
//! `/Differences`, embedded sfnt `cmap` recovery, and the document-wide
//! registry that scopes decoders to resource names.

pub mod cmap;
pub mod encoding;
pub mod font_dict;
pub mod registry;
pub mod sfnt;

pub use cmap::parse_tounicode_cmap;
pub use encoding::{glyph_name_to_unicode, standard_encoding};
pub use font_dict::FontInfo;
pub use registry::FontRegistry;
