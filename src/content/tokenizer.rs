//! Content-stream tokenizer.
//!
//! Lexes a page's operator stream and emits decoded text in operator
//! order. Operands are collected with the shared object parser until an
//! operator name arrives; only the operators that affect textual output
//! are dispatched, everything else is skipped. A byte that parses as
//! neither operand nor operator is dropped and scanning continues, so the
//! tokenizer never terminates early on malformed input.

use crate::config::ExtractOptions;
use crate::fonts::{FontInfo, FontRegistry};
use crate::object::Object;
use crate::parser::parse_object;
use nom::bytes::complete::take_while1;
use std::collections::HashMap;
use std::sync::Arc;

/// Font lookup scope for one tokenizer run: the page's resource fonts
/// first, then the global registry.
pub struct FontScope<'a> {
    page_fonts: HashMap<String, Arc<FontInfo>>,
    registry: &'a FontRegistry,
}

impl<'a> FontScope<'a> {
    /// Scope over a page's resolved resource fonts.
    pub fn new(page_fonts: HashMap<String, Arc<FontInfo>>, registry: &'a FontRegistry) -> Self {
        Self {
            page_fonts,
            registry,
        }
    }

    /// Scope over the registry alone (fallback path).
    pub fn global(registry: &'a FontRegistry) -> Self {
        Self {
            page_fonts: HashMap::new(),
            registry,
        }
    }

    fn lookup(&self, name: &str) -> Option<Arc<FontInfo>> {
        self.page_fonts
            .get(name)
            .cloned()
            .or_else(|| self.registry.get(name))
    }
}

/// At least half of a string operand's bytes must be printable ASCII or
/// common whitespace, or the operand is treated as binary noise from a
/// non-text stream and dropped.
fn mostly_printable(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return true;
    }
    let printable = bytes
        .iter()
        .filter(|&&b| (32..127).contains(&b) || matches!(b, 9 | 10 | 13))
        .count();
    printable * 2 >= bytes.len()
}

/// Byte-wise fallback used when no font is selected: printable ASCII and
/// the tab/newline/return controls survive, everything else is dropped.
fn decode_without_font(bytes: &[u8]) -> String {
    bytes
        .iter()
        .filter(|&&b| (32..127).contains(&b) || matches!(b, 9 | 10 | 13))
        .map(|&b| b as char)
        .collect()
}

fn is_operator_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'\'' || byte == b'"'
}

fn parse_operator_name(input: &[u8]) -> Option<(&[u8], &str)> {
    let result: nom::IResult<&[u8], &[u8]> =
        take_while1(|c: u8| c.is_ascii_alphanumeric() || matches!(c, b'\'' | b'"' | b'*'))(input);
    let (rest, name_bytes) = result.ok()?;
    let name = std::str::from_utf8(name_bytes).ok()?;
    Some((rest, name))
}

struct TextAssembler<'a> {
    out: String,
    pending_line_break: bool,
    options: &'a ExtractOptions,
}

impl<'a> TextAssembler<'a> {
    fn new(options: &'a ExtractOptions) -> Self {
        Self {
            out: String::new(),
            pending_line_break: false,
            options,
        }
    }

    /// Append decoded text, flushing any pending line break first. The
    /// break becomes the configured divider only when output has already
    /// accumulated; a break before the first string is dropped.
    fn emit(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.pending_line_break {
            if !self.out.is_empty() {
                self.out.push_str(&self.options.divider);
            }
            self.pending_line_break = false;
        }
        self.out.push_str(text);
    }

    fn line_break(&mut self) {
        self.pending_line_break = true;
    }
}

/// Tokenize one content stream and return its decoded text.
pub fn tokenize(data: &[u8], scope: &FontScope<'_>, options: &ExtractOptions) -> String {
    let mut assembler = TextAssembler::new(options);
    let mut operands: Vec<Object> = Vec::new();
    let mut current_font: Option<Arc<FontInfo>> = None;
    let mut input = data;

    while !input.is_empty() {
        if let Ok((rest, ())) = crate::lexer::skip_ws(input) {
            input = rest;
        }
        if input.is_empty() {
            break;
        }

        if is_operator_start(input[0]) {
            if let Some((rest, name)) = parse_operator_name(input) {
                dispatch(name, &operands, scope, &mut current_font, &mut assembler, options);
                operands.clear();
                input = rest;
                continue;
            }
        }

        match parse_object(input) {
            Ok((rest, obj)) => {
                operands.push(obj);
                input = rest;
            },
            Err(_) => {
                // Stray delimiter or junk byte: drop it and keep scanning
                operands.clear();
                input = &input[1..];
            },
        }
    }

    assembler.out
}

fn dispatch(
    name: &str,
    operands: &[Object],
    scope: &FontScope<'_>,
    current_font: &mut Option<Arc<FontInfo>>,
    assembler: &mut TextAssembler<'_>,
    options: &ExtractOptions,
) {
    match name {
        "Tf" => {
            let font_name = operands.iter().rev().find_map(|o| o.as_name());
            let size = operands.iter().rev().find_map(|o| o.as_number());
            // A NaN size marks a broken operator; keep the current font
            if size.map(|s| s.is_nan()).unwrap_or(false) {
                return;
            }
            if let Some(font_name) = font_name {
                *current_font = scope.lookup(font_name);
                if current_font.is_none() {
                    log::debug!("font /{} not found in scope", font_name);
                }
            }
        },
        "Td" | "TD" | "Tm" | "T*" | "ET" => assembler.line_break(),
        "Tj" => {
            if let Some(bytes) = last_string(operands) {
                show_text(bytes, current_font, assembler);
            }
        },
        "'" | "\"" => {
            // Implicit line break, then show
            assembler.line_break();
            if let Some(bytes) = last_string(operands) {
                show_text(bytes, current_font, assembler);
            }
        },
        "TJ" => {
            let array = match operands.iter().rev().find_map(|o| o.as_array()) {
                Some(a) => a,
                None => return,
            };
            let mut run = String::new();
            for element in array {
                match element {
                    Object::String(bytes) => {
                        if mostly_printable(bytes) {
                            run.push_str(&decode(bytes, current_font));
                        }
                    },
                    Object::Number(n) => {
                        // Large negative adjustments advance the cursor by
                        // roughly a word gap
                        if *n < options.tj_gap_threshold {
                            run.push(' ');
                        }
                    },
                    _ => {},
                }
            }
            assembler.emit(&run);
        },
        _ => {},
    }
}

fn last_string(operands: &[Object]) -> Option<&[u8]> {
    operands.iter().rev().find_map(|o| o.as_string())
}

fn decode(bytes: &[u8], current_font: &Option<Arc<FontInfo>>) -> String {
    match current_font {
        Some(font) => font.decode_bytes(bytes),
        None => decode_without_font(bytes),
    }
}

fn show_text(bytes: &[u8], current_font: &Option<Arc<FontInfo>>, assembler: &mut TextAssembler<'_>) {
    if !mostly_printable(bytes) {
        log::trace!("dropping {}-byte non-text string operand", bytes.len());
        return;
    }
    let decoded = decode(bytes, current_font);
    assembler.emit(&decoded);
}
