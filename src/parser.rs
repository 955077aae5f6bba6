//! PDF object parser.
//!
//! Combines lexer tokens into complete objects (arrays, dictionaries,
//! streams, indirect references) using recursive descent, and scans whole
//! files for `id gen obj ... endobj` envelopes.
//!
//! The parser is lenient: unclosed arrays/dictionaries at EOF return what
//! was collected, stream payloads fall back to an `endstream` scan when
//! `/Length` is unusable, and non-object file furniture (`xref`, `trailer`,
//! `startxref`) is skipped bytewise by [`parse_document`].

use crate::lexer::{token, Token};
use crate::object::{Object, ObjectRef};
use nom::IResult;
use std::collections::HashMap;

/// Decode escape sequences in PDF literal strings (ISO 32000-1:2008, §7.3.4.2).
///
/// - `\n \r \t \b \f \( \) \\` - single-character escapes
/// - `\ddd` - octal character code, greedy up to 3 digits (`\1234` is
///   `\123` followed by a literal `4`)
/// - `\<newline>` - line continuation, removed
/// - any other `\x` - backslash dropped, `x` kept literally
pub fn decode_literal_string_escapes(raw: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        if raw[i] != b'\\' || i + 1 >= raw.len() {
            result.push(raw[i]);
            i += 1;
            continue;
        }

        match raw[i + 1] {
            b'n' => {
                result.push(b'\n');
                i += 2;
            },
            b'r' => {
                result.push(b'\r');
                i += 2;
            },
            b't' => {
                result.push(b'\t');
                i += 2;
            },
            b'b' => {
                result.push(0x08);
                i += 2;
            },
            b'f' => {
                result.push(0x0C);
                i += 2;
            },
            b'(' | b')' | b'\\' => {
                result.push(raw[i + 1]);
                i += 2;
            },
            // Line continuation: backslash-newline vanishes
            b'\n' => {
                i += 2;
            },
            b'\r' => {
                i += 2;
                if i < raw.len() && raw[i] == b'\n' {
                    i += 1;
                }
            },
            c if (b'0'..b'8').contains(&c) => {
                let mut value = 0u32;
                let mut len = 0;
                while len < 3 && i + 1 + len < raw.len() {
                    let d = raw[i + 1 + len];
                    if !(b'0'..b'8').contains(&d) {
                        break;
                    }
                    value = value * 8 + (d - b'0') as u32;
                    len += 1;
                }
                result.push((value & 0xFF) as u8);
                i += 1 + len;
            },
            other => {
                result.push(other);
                i += 2;
            },
        }
    }

    result
}

/// Decode a hex string body to bytes.
///
/// Whitespace is ignored; an odd final nybble is padded with 0.
pub fn decode_hex(hex_bytes: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(hex_bytes.len() / 2 + 1);
    let mut hi: Option<u8> = None;

    for &c in hex_bytes {
        let digit = match c {
            b'0'..=b'9' => c - b'0',
            b'a'..=b'f' => c - b'a' + 10,
            b'A'..=b'F' => c - b'A' + 10,
            _ => continue,
        };
        match hi.take() {
            None => hi = Some(digit),
            Some(h) => result.push((h << 4) | digit),
        }
    }

    if let Some(h) = hi {
        // Odd digit count: pad with 0
        result.push(h << 4);
    }

    result
}

/// Parse a single PDF object from input bytes.
///
/// Handles all object types: null, booleans, numbers, strings, names,
/// arrays, dictionaries, streams, and indirect references (`10 0 R`).
pub fn parse_object(input: &[u8]) -> IResult<&[u8], Object> {
    let (input, tok) = token(input)?;

    match tok {
        Token::Null => Ok((input, Object::Null)),
        Token::True => Ok((input, Object::Boolean(true))),
        Token::False => Ok((input, Object::Boolean(false))),

        Token::Integer(i) => {
            // Lookahead for an indirect reference: obj_num gen R
            if i >= 0 {
                if let Ok((input2, Token::Integer(gen))) = token(input) {
                    if (0..=u16::MAX as i64).contains(&gen) {
                        if let Ok((input3, Token::R)) = token(input2) {
                            return Ok((
                                input3,
                                Object::Reference(ObjectRef::new(i as u32, gen as u16)),
                            ));
                        }
                    }
                }
            }
            Ok((input, Object::Number(i as f64)))
        },

        Token::Real(r) => Ok((input, Object::Number(r))),

        Token::LiteralString(bytes) => {
            Ok((input, Object::String(decode_literal_string_escapes(bytes))))
        },

        Token::HexString(bytes) => Ok((input, Object::String(decode_hex(bytes)))),

        Token::Name(name) => Ok((input, Object::Name(name))),

        Token::ArrayStart => parse_array(input),

        Token::DictStart => {
            let (remaining, dict_obj) = parse_dictionary(input)?;

            // A dictionary followed by the `stream` keyword is a stream object
            if let Ok((stream_input, Token::StreamStart)) = token(remaining) {
                let dict = match dict_obj {
                    Object::Dictionary(d) => d,
                    _ => unreachable!("parse_dictionary returns Dictionary"),
                };
                let (rest, data) = parse_stream_data(stream_input, &dict)?;
                return Ok((
                    rest,
                    Object::Stream {
                        dict,
                        data: bytes::Bytes::from(data),
                    },
                ));
            }

            Ok((remaining, dict_obj))
        },

        _ => Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag))),
    }
}

/// Parse a PDF array body: `obj1 obj2 ... objN ]`
///
/// Lenient at EOF: an unclosed array returns what was collected.
fn parse_array(input: &[u8]) -> IResult<&[u8], Object> {
    let mut objects = Vec::new();
    let mut remaining = input;

    loop {
        match token(remaining) {
            Ok((inp, Token::ArrayEnd)) => return Ok((inp, Object::Array(objects))),
            Ok(_) => match parse_object(remaining) {
                Ok((inp, obj)) => {
                    objects.push(obj);
                    remaining = inp;
                },
                Err(e) => {
                    if remaining.is_empty() {
                        return Ok((remaining, Object::Array(objects)));
                    }
                    return Err(e);
                },
            },
            Err(_) => {
                // EOF or junk before `]`
                return Ok((remaining, Object::Array(objects)));
            },
        }
    }
}

/// Parse a PDF dictionary body: `/Key1 value1 ... >>`
///
/// Keys must be names; lenient at EOF like [`parse_array`].
fn parse_dictionary(input: &[u8]) -> IResult<&[u8], Object> {
    let mut dict = HashMap::new();
    let mut remaining = input;

    loop {
        match token(remaining) {
            Ok((inp, Token::DictEnd)) => return Ok((inp, Object::Dictionary(dict))),
            Ok((inp, Token::Name(key))) => match parse_object(inp) {
                Ok((inp, value)) => {
                    dict.insert(key, value);
                    remaining = inp;
                },
                Err(e) => {
                    if inp.is_empty() {
                        return Ok((inp, Object::Dictionary(dict)));
                    }
                    return Err(e);
                },
            },
            _ => {
                // Key is not a name, or EOF before `>>`
                if remaining.is_empty() {
                    return Ok((remaining, Object::Dictionary(dict)));
                }
                return Err(nom::Err::Error(nom::error::Error::new(
                    remaining,
                    nom::error::ErrorKind::Tag,
                )));
            },
        }
    }
}

/// Parse stream data after the `stream` keyword.
///
/// Reads `/Length` bytes when the entry is a usable integer; otherwise
/// scans forward for the `endstream` keyword. The data begins after the
/// EOL following `stream` (ISO 32000-1:2008, §7.3.8.1).
fn parse_stream_data<'a>(
    input: &'a [u8],
    dict: &HashMap<String, Object>,
) -> IResult<&'a [u8], Vec<u8>> {
    let input = if input.starts_with(b"\r\n") {
        &input[2..]
    } else if input.starts_with(b"\n") || input.starts_with(b"\r") {
        &input[1..]
    } else {
        input
    };

    if let Some(length) = dict.get("Length").and_then(|o| o.as_int()) {
        let length = length.max(0) as usize;
        if length <= input.len() {
            let data = input[..length].to_vec();
            let remaining = &input[length..];
            // Expect `endstream` after optional whitespace; accept its absence
            if let Ok((rest, Token::StreamEnd)) = token(remaining) {
                return Ok((rest, data));
            }
            if find_endstream(remaining) == Some(0) {
                return Ok((&remaining[b"endstream".len()..], data));
            }
            // Length was wrong; fall through to the scan below
        }
    }

    // Missing or unusable /Length (it may be an unresolved reference):
    // scan for the endstream keyword
    if let Some(pos) = find_endstream(input) {
        let data = trim_trailing_eol(&input[..pos]).to_vec();
        return Ok((&input[pos + b"endstream".len()..], data));
    }

    Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Eof)))
}

fn find_endstream(input: &[u8]) -> Option<usize> {
    let keyword = b"endstream";
    input
        .windows(keyword.len())
        .position(|window| window == keyword)
}

fn trim_trailing_eol(data: &[u8]) -> &[u8] {
    let mut end = data.len();
    if end > 0 && data[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && data[end - 1] == b'\r' {
        end -= 1;
    }
    &data[..end]
}

/// Parse one indirect object envelope: `id gen obj <body> endobj`.
fn parse_indirect_object(input: &[u8]) -> IResult<&[u8], Object> {
    let (rest, t1) = token(input)?;
    let id = match t1 {
        Token::Integer(i) if i >= 0 => i as u32,
        _ => {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Tag,
            )))
        },
    };
    let (rest, t2) = token(rest)?;
    let gen = match t2 {
        Token::Integer(g) if (0..=u16::MAX as i64).contains(&g) => g as u16,
        _ => {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Tag,
            )))
        },
    };
    let (rest, t3) = token(rest)?;
    if t3 != Token::ObjStart {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag)));
    }

    let (rest, body) = parse_object(rest)?;

    // `endobj` is expected but its absence is tolerated
    let rest = match token(rest) {
        Ok((r, Token::ObjEnd)) => r,
        _ => rest,
    };

    Ok((
        rest,
        Object::Indirect {
            id,
            gen,
            object: Box::new(body),
        },
    ))
}

/// Scan a whole PDF file for top-level indirect objects.
///
/// Everything that is not an `id gen obj ... endobj` envelope - the header
/// comment, `xref` tables, `trailer` dictionaries, `startxref` - is skipped
/// one byte at a time. The scan never fails; a file with no recognizable
/// objects yields an empty vector.
pub fn parse_document(data: &[u8]) -> Vec<Object> {
    let mut objects = Vec::new();
    let mut input = data;

    while !input.is_empty() {
        match parse_indirect_object(input) {
            Ok((rest, obj)) => {
                objects.push(obj);
                input = rest;
            },
            Err(_) => {
                input = &input[1..];
            },
        }
    }

    log::debug!("parsed {} top-level indirect objects", objects.len());
    objects
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_objects() {
        assert_eq!(parse_object(b"null").unwrap().1, Object::Null);
        assert_eq!(parse_object(b"true").unwrap().1, Object::Boolean(true));
        assert_eq!(parse_object(b"42").unwrap().1, Object::Number(42.0));
        assert_eq!(parse_object(b"-1.5").unwrap().1, Object::Number(-1.5));
        assert_eq!(parse_object(b"/Name").unwrap().1, Object::Name("Name".to_string()));
    }

    #[test]
    fn test_parse_reference() {
        let (_, obj) = parse_object(b"10 0 R").unwrap();
        assert_eq!(obj.as_reference(), Some(ObjectRef::new(10, 0)));
    }

    #[test]
    fn test_integer_not_reference() {
        // Two integers without R are just a number (the second stays unparsed)
        let (rest, obj) = parse_object(b"10 20 /Next").unwrap();
        assert_eq!(obj, Object::Number(10.0));
        assert_eq!(rest, b" 20 /Next");
    }

    #[test]
    fn test_parse_array() {
        let (_, obj) = parse_object(b"[ 1 2 /Name (str) [ 3 ] ]").unwrap();
        let arr = obj.as_array().unwrap();
        assert_eq!(arr.len(), 5);
        assert_eq!(arr[2].as_name(), Some("Name"));
        assert!(arr[4].as_array().is_some());
    }

    #[test]
    fn test_parse_dictionary() {
        let (_, obj) = parse_object(b"<< /Type /Page /Count 3 >>").unwrap();
        let dict = obj.as_dict().unwrap();
        assert_eq!(dict.get("Type").unwrap().as_name(), Some("Page"));
        assert_eq!(dict.get("Count").unwrap().as_int(), Some(3));
    }

    #[test]
    fn test_parse_stream() {
        let input = b"<< /Length 5 >>\nstream\nHello\nendstream";
        let (_, obj) = parse_object(input).unwrap();
        let (dict, data) = obj.as_stream().unwrap();
        assert_eq!(dict.get("Length").unwrap().as_int(), Some(5));
        assert_eq!(&data[..], b"Hello");
    }

    #[test]
    fn test_parse_stream_without_usable_length() {
        // /Length behind a reference cannot be resolved here; endstream scan kicks in
        let input = b"<< /Length 9 0 R >>\nstream\nHello\nendstream";
        let (_, obj) = parse_object(input).unwrap();
        let (_, data) = obj.as_stream().unwrap();
        assert_eq!(&data[..], b"Hello");
    }

    #[test]
    fn test_literal_escapes() {
        assert_eq!(decode_literal_string_escapes(b"Line1\\nLine2"), b"Line1\nLine2");
        assert_eq!(decode_literal_string_escapes(b"a\\(b\\)c"), b"a(b)c");
        assert_eq!(decode_literal_string_escapes(b"back\\\\slash"), b"back\\slash");
    }

    #[test]
    fn test_octal_escapes_greedy() {
        assert_eq!(decode_literal_string_escapes(b"\\101"), b"A");
        assert_eq!(decode_literal_string_escapes(b"\\1"), &[0x01][..]);
        assert_eq!(decode_literal_string_escapes(b"\\12"), b"\n");
        // \123 = 'S', then literal '4'
        assert_eq!(decode_literal_string_escapes(b"\\1234"), b"S4");
    }

    #[test]
    fn test_line_continuation() {
        assert_eq!(decode_literal_string_escapes(b"ab\\\ncd"), b"abcd");
        assert_eq!(decode_literal_string_escapes(b"ab\\\r\ncd"), b"abcd");
    }

    #[test]
    fn test_decode_hex() {
        assert_eq!(decode_hex(b"48656C6C6F"), b"Hello");
        assert_eq!(decode_hex(b"48 65 6C 6C 6F"), b"Hello");
        assert_eq!(decode_hex(b""), b"");
        // Odd nybble padded with zero
        assert_eq!(decode_hex(b"901FA"), vec![0x90, 0x1F, 0xA0]);
    }

    #[test]
    fn test_parse_document() {
        let data = b"%PDF-1.4\n1 0 obj\n<< /Type /Page >>\nendobj\n2 0 obj\n42\nendobj\n\
                     xref\n0 3\ntrailer\n<< /Size 3 >>\nstartxref\n9\n%%EOF";
        let objects = parse_document(data);
        assert_eq!(objects.len(), 2);
        match &objects[0] {
            Object::Indirect { id, object, .. } => {
                assert_eq!(*id, 1);
                assert_eq!(object.dict_type(), Some("Page"));
            },
            other => panic!("expected indirect object, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_document_ignores_junk() {
        assert!(parse_document(b"no objects here").is_empty());
        assert!(parse_document(b"").is_empty());
    }
}
