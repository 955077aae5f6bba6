//! PDF tokenizer.
//!
//! Low-level tokenization of PDF byte streams, shared by the top-level
//! object parser and the content-stream tokenizer. Recognized token types:
//!
//! - Numbers: integers (42, -123) and reals (3.14, -.002)
//! - Strings: literal ((Hello)) and hexadecimal (<48656C6C6F>)
//! - Names: identifiers starting with / (/Type), with #XX escapes decoded
//! - Keywords: true, false, null, obj, endobj, stream, endstream, R
//! - Delimiters: `[`, `]`, `<<`, `>>`
//!
//! Whitespace (space, \t, \r, \n, \0, \f) and comments (% to EOL) are
//! skipped before every token.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_while},
    character::complete::{char, digit1, one_of},
    combinator::{map, opt, value},
    sequence::{delimited, preceded},
    IResult,
};

/// Token types recognized by the PDF lexer.
#[derive(Debug, PartialEq, Clone)]
pub enum Token<'a> {
    /// Integer number (e.g., 42, -123)
    Integer(i64),
    /// Real (floating-point) number (e.g., 3.14, -.002)
    Real(f64),
    /// Literal string bytes (content of "(Hello)"). Escape sequences are
    /// NOT decoded at lexer level; the parser does that.
    LiteralString(&'a [u8]),
    /// Hexadecimal string bytes (content of "<48656C6C6F>"), whitespace
    /// preserved; decoding happens at parser level.
    HexString(&'a [u8]),
    /// Name with #XX escapes decoded (e.g., "Type" from "/Type")
    Name(String),
    /// Boolean true keyword
    True,
    /// Boolean false keyword
    False,
    /// Null keyword
    Null,
    /// Array start delimiter `[`
    ArrayStart,
    /// Array end delimiter `]`
    ArrayEnd,
    /// Dictionary start delimiter `<<`
    DictStart,
    /// Dictionary end delimiter `>>`
    DictEnd,
    /// Indirect object start keyword "obj"
    ObjStart,
    /// Indirect object end keyword "endobj"
    ObjEnd,
    /// Stream start keyword "stream"
    StreamStart,
    /// Stream end keyword "endstream"
    StreamEnd,
    /// Reference keyword "R" (as in "10 0 R")
    R,
}

/// True for the PDF whitespace set (ISO 32000-1:2008, Table 1).
pub fn is_pdf_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\r' | b'\n' | 0x00 | 0x0C)
}

/// True for PDF delimiter characters.
pub fn is_pdf_delimiter(c: u8) -> bool {
    matches!(c, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

fn comment(input: &[u8]) -> IResult<&[u8], ()> {
    value((), preceded(char('%'), take_till(|c| c == b'\r' || c == b'\n')))(input)
}

/// Skip all whitespace and comments.
pub fn skip_ws(input: &[u8]) -> IResult<&[u8], ()> {
    let mut remaining = input;

    loop {
        let (rest, ws) = take_while(is_pdf_whitespace)(remaining)?;
        remaining = rest;

        if let Ok((rest, ())) = comment(remaining) {
            remaining = rest;
            continue;
        }

        if ws.is_empty() {
            break;
        }
    }

    Ok((remaining, ()))
}

/// Parse an integer or real number.
///
/// PDF allows leading +/- signs, numbers starting with a decimal point
/// (.5), and trailing decimal points (5.).
fn parse_number(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (rest, sign) = opt(one_of("+-"))(input)?;
    let (rest, int_part) = opt(digit1)(rest)?;
    let (rest, frac_part) = opt(preceded(char('.'), opt(digit1)))(rest)?;

    if int_part.is_none() && frac_part.is_none() {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit)));
    }

    fn digits(bytes: Option<&[u8]>) -> &str {
        bytes
            .and_then(|b| std::str::from_utf8(b).ok())
            .unwrap_or("0")
    }

    if let Some(frac) = frac_part {
        let mut num_str = String::new();
        if sign == Some('-') {
            num_str.push('-');
        }
        num_str.push_str(digits(int_part));
        num_str.push('.');
        num_str.push_str(digits(frac));
        let num: f64 = num_str.parse().map_err(|_| {
            nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
        })?;
        Ok((rest, Token::Real(num)))
    } else {
        let int_str = digits(int_part);
        let mut num: i64 = int_str.parse().map_err(|_| {
            nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
        })?;
        if sign == Some('-') {
            num = -num;
        }
        Ok((rest, Token::Integer(num)))
    }
}

/// Parse a literal string enclosed in parentheses.
///
/// Honors balanced unescaped parentheses via a depth counter and leaves
/// escape sequences intact (the parser decodes them).
fn parse_literal_string(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (remaining, _) = char('(')(input)?;
    let mut depth = 1usize;
    let mut pos = 0usize;

    while depth > 0 && pos < remaining.len() {
        match remaining[pos] {
            b'\\' => {
                // Skip the escaped character; octal digits are resolved later
                pos += 2;
            },
            b'(' => {
                depth += 1;
                pos += 1;
            },
            b')' => {
                depth -= 1;
                pos += 1;
            },
            _ => pos += 1,
        }
    }

    if depth != 0 {
        // Unterminated string
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag)));
    }

    let end = pos.min(remaining.len());
    Ok((&remaining[end..], Token::LiteralString(&remaining[..end - 1])))
}

/// Parse a hexadecimal string enclosed in angle brackets.
///
/// Internal whitespace is preserved here and filtered at decode time.
fn parse_hex_string(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    // `<<` starts a dictionary, not a hex string
    if input.starts_with(b"<<") {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag)));
    }

    delimited(
        char('<'),
        map(
            take_while(|c: u8| c.is_ascii_hexdigit() || c.is_ascii_whitespace()),
            Token::HexString,
        ),
        char('>'),
    )(input)
}

/// Decode #XX escape sequences in PDF names (ISO 32000-1:2008, §7.3.5).
///
/// `/A#20B` becomes `A B`; invalid sequences are preserved literally.
pub fn decode_name_escapes(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut chars = name.chars();

    while let Some(ch) = chars.next() {
        if ch != '#' {
            result.push(ch);
            continue;
        }
        match (chars.next(), chars.next()) {
            (Some(h1), Some(h2)) => {
                let mut hex = String::with_capacity(2);
                hex.push(h1);
                hex.push(h2);
                if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                    result.push(byte as char);
                } else {
                    result.push('#');
                    result.push(h1);
                    result.push(h2);
                }
            },
            (Some(h1), None) => {
                result.push('#');
                result.push(h1);
            },
            _ => result.push('#'),
        }
    }

    result
}

/// Parse a name starting with `/`.
fn parse_name(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    preceded(
        char('/'),
        map(
            take_while(|c: u8| !is_pdf_whitespace(c) && !is_pdf_delimiter(c)),
            |bytes: &[u8]| {
                let name_str = std::str::from_utf8(bytes).unwrap_or("");
                Token::Name(decode_name_escapes(name_str))
            },
        ),
    )(input)
}

/// Parse PDF keywords and delimiters.
///
/// Order matters: multi-character keywords before shorter prefixes,
/// `<<` before `<`, `endstream` before `stream`.
fn parse_keyword(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    alt((
        value(Token::False, tag(b"false")),
        value(Token::True, tag(b"true")),
        value(Token::Null, tag(b"null")),
        value(Token::ObjEnd, tag(b"endobj")),
        value(Token::StreamEnd, tag(b"endstream")),
        value(Token::StreamStart, tag(b"stream")),
        value(Token::ObjStart, tag(b"obj")),
        value(Token::DictStart, tag(b"<<")),
        value(Token::DictEnd, tag(b">>")),
        value(Token::ArrayStart, tag(b"[")),
        value(Token::ArrayEnd, tag(b"]")),
        value(Token::R, tag(b"R")),
    ))(input)
}

/// Parse a single PDF token, skipping leading whitespace and comments.
///
/// Keywords are checked before names and numbers; strings last.
pub fn token(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (input, ()) = skip_ws(input)?;

    alt((
        parse_keyword,
        parse_name,
        parse_number,
        parse_literal_string,
        parse_hex_string,
    ))(input)
}
