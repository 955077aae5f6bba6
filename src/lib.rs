//! # pdftext
//!
//! Best-effort PDF text extraction in pure Rust.
//!
//! The pipeline turns a parsed PDF object graph into a readable Unicode
//! string:
//!
//! 1. **Resolver** - flattens indirect objects into an id-indexed table and
//!    mines PDF 1.5+ object streams for hidden pages and fonts
//! 2. **Font registry** - builds a per-font decoder from every available
//!    signal: ToUnicode CMaps, standard encodings with `/Differences`, and
//!    embedded TrueType/OpenType `cmap` tables (chained through
//!    `CIDToGIDMap` for CID fonts)
//! 3. **Content tokenizer** - lexes the page operator stream and emits
//!    decoded text with operator-induced line breaks and word spacing
//! 4. **Coordinator** - walks pages in object-id order, scopes fonts per
//!    page, and assembles the output (with a fallback sweep over raw
//!    streams when the page tree is unusable)
//!
//! The public contract is best-effort: extraction always returns a string,
//! possibly empty, and never an error. Malformed structures degrade
//! locally. A broken font falls back to the next decoder in the chain,
//! and a bad operator or dangling reference is simply skipped.
//!
//! ## Quick start
//!
//! ```
//! use pdftext::extract_text_from_bytes;
//!
//! let data = b"1 0 obj\n<< /Type /Page /Contents 2 0 R >>\nendobj\n\
//!              2 0 obj\n<< /Length 26 >>\nstream\nBT /F1 12 Tf (Hello) Tj ET\nendstream\nendobj";
//! let text = extract_text_from_bytes(data);
//! assert!(text.contains("Hello"));
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Core PDF parsing
pub mod lexer;
pub mod object;
pub mod parser;
pub mod resolver;
pub mod unfilter;

// Text extraction
pub mod content;
pub mod extract;
pub mod fonts;

// Configuration
pub mod config;

// Re-exports
pub use config::ExtractOptions;
pub use error::{Error, Result};
pub use extract::{extract_text, extract_text_from_bytes, TextExtractor};
pub use object::{Object, ObjectRef};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(VERSION.starts_with("0."));
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "pdftext");
    }
}
