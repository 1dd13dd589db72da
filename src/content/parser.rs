//! Content stream tokenizer.
//!
//! Content streams use postfix notation: operands come before their
//! operator. This scanner walks the raw bytes, groups operands with the
//! operator that consumes them, and records the byte span of each group so
//! the linker can splice marker operators around it.
//!
//! The scanner is resilient to stray bytes (skip and continue, the way the
//! rest of this crate treats malformed input) but reports unterminated
//! strings, arrays, and dictionaries as hard errors: splicing into a stream
//! whose nesting could not be resolved risks corrupting the page.

use crate::content::operators::is_text_showing;
use crate::error::{Error, Result};
use nom::bytes::complete::{tag, take_while, take_while1};
use nom::IResult;
use std::ops::Range;

/// One operator with its operand group.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentOp {
    /// Operator name ("Tj", "re", "BDC", ...)
    pub name: String,
    /// Byte span covering the first operand through the end of the operator
    pub span: Range<usize>,
    /// Number of operands in the group
    pub operand_count: usize,
}

/// PDF whitespace per ISO 32000-1:2008, Section 7.2.2.
fn is_pdf_whitespace(byte: u8) -> bool {
    matches!(byte, 0x00 | 0x09 | 0x0A | 0x0C | 0x0D | 0x20)
}

fn is_delimiter(byte: u8) -> bool {
    matches!(byte, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

fn is_regular(byte: u8) -> bool {
    !is_pdf_whitespace(byte) && !is_delimiter(byte)
}

fn is_operator_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || matches!(byte, b'\'' | b'"')
}

fn is_number_start(byte: u8) -> bool {
    byte.is_ascii_digit() || matches!(byte, b'+' | b'-' | b'.')
}

/// Skip PDF whitespace and `%` comments.
fn skip_whitespace(input: &[u8]) -> &[u8] {
    let mut rest = input;
    loop {
        let (after_ws, _) = take_while::<_, _, nom::error::Error<&[u8]>>(is_pdf_whitespace)(rest)
            .unwrap_or((rest, &[]));
        rest = after_ws;
        if rest.first() == Some(&b'%') {
            let (after_comment, _) = take_while::<_, _, nom::error::Error<&[u8]>>(
                |b| b != b'\n' && b != b'\r',
            )(rest)
            .unwrap_or((rest, &[]));
            rest = after_comment;
        } else {
            return rest;
        }
    }
}

/// Parse a literal string `( ... )` with nesting and backslash escapes.
fn literal_string(input: &[u8]) -> IResult<&[u8], ()> {
    let (mut rest, _) = tag("(")(input)?;
    let mut depth = 1usize;
    while let Some(&byte) = rest.first() {
        rest = &rest[1..];
        match byte {
            b'\\' => {
                if !rest.is_empty() {
                    rest = &rest[1..];
                }
            },
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((rest, ()));
                }
            },
            _ => {},
        }
    }
    Err(nom::Err::Failure(nom::error::Error::new(
        rest,
        nom::error::ErrorKind::Eof,
    )))
}

/// Parse a hex string `< ... >`.
fn hex_string(input: &[u8]) -> IResult<&[u8], ()> {
    let (rest, _) = tag("<")(input)?;
    let (rest, _) = take_while(|b| b != b'>')(rest)?;
    let (rest, _) = tag(">")(rest)?;
    Ok((rest, ()))
}

/// Parse a name token `/Name`.
fn name_token(input: &[u8]) -> IResult<&[u8], ()> {
    let (rest, _) = tag("/")(input)?;
    let (rest, _) = take_while(is_regular)(rest)?;
    Ok((rest, ()))
}

/// Parse a numeric token.
fn number_token(input: &[u8]) -> IResult<&[u8], ()> {
    let (rest, _) =
        take_while1(|b: u8| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.'))(input)?;
    Ok((rest, ()))
}

/// Skip one object (operand), recursing into arrays and dictionaries.
fn skip_object(input: &[u8]) -> IResult<&[u8], ()> {
    match input.first().copied() {
        Some(b'(') => literal_string(input),
        Some(b'<') if input.get(1) == Some(&b'<') => skip_dictionary(input),
        Some(b'<') => hex_string(input),
        Some(b'[') => skip_array(input),
        Some(b'/') => name_token(input),
        Some(b) if is_number_start(b) => number_token(input),
        Some(b) if is_regular(b) => {
            // Keyword operand (true/false/null) inside a collection
            let (rest, _) = take_while1(is_regular)(input)?;
            Ok((rest, ()))
        },
        _ => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Char,
        ))),
    }
}

/// Skip an array `[ ... ]`.
fn skip_array(input: &[u8]) -> IResult<&[u8], ()> {
    let (mut rest, _) = tag("[")(input)?;
    loop {
        rest = skip_whitespace(rest);
        match rest.first().copied() {
            Some(b']') => return Ok((&rest[1..], ())),
            Some(_) => {
                let (after, _) = skip_object(rest)?;
                rest = after;
            },
            None => {
                return Err(nom::Err::Failure(nom::error::Error::new(
                    rest,
                    nom::error::ErrorKind::Eof,
                )))
            },
        }
    }
}

/// Skip a dictionary `<< ... >>`.
fn skip_dictionary(input: &[u8]) -> IResult<&[u8], ()> {
    let (mut rest, _) = tag("<<")(input)?;
    loop {
        rest = skip_whitespace(rest);
        if rest.starts_with(b">>") {
            return Ok((&rest[2..], ()));
        }
        match rest.first() {
            Some(_) => {
                let (after, _) = skip_object(rest)?;
                rest = after;
            },
            None => {
                return Err(nom::Err::Failure(nom::error::Error::new(
                    rest,
                    nom::error::ErrorKind::Eof,
                )))
            },
        }
    }
}

/// Find the end of an inline image: `EI` delimited by whitespace.
fn skip_inline_image(input: &[u8]) -> Option<&[u8]> {
    let mut i = 0;
    while i + 1 < input.len() {
        if input[i] == b'E'
            && input[i + 1] == b'I'
            && (i == 0 || is_pdf_whitespace(input[i - 1]))
            && (i + 2 >= input.len() || !is_regular(input[i + 2]))
        {
            return Some(&input[i + 2..]);
        }
        i += 1;
    }
    None
}

/// Tokenize a content stream into operator groups with byte spans.
///
/// Stray unparseable bytes are skipped. Unterminated strings, arrays, or
/// dictionaries are a [`Error::ContentStream`] error — the caller falls
/// back rather than splicing into a stream it cannot account for.
pub fn scan_content_ops(data: &[u8]) -> Result<Vec<ContentOp>> {
    let total = data.len();
    let mut ops = Vec::new();
    let mut input = data;
    let mut operand_start: Option<usize> = None;
    let mut operand_count = 0usize;

    loop {
        input = skip_whitespace(input);
        if input.is_empty() {
            break;
        }
        let offset = total - input.len();
        let first = input[0];

        if first == b'(' || first == b'<' || first == b'[' || first == b'/' || is_number_start(first)
        {
            match skip_object(input) {
                Ok((rest, _)) => {
                    if operand_start.is_none() {
                        operand_start = Some(offset);
                    }
                    operand_count += 1;
                    input = rest;
                },
                Err(_) => {
                    return Err(Error::ContentStream {
                        offset,
                        reason: "unterminated string, array, or dictionary".to_string(),
                    })
                },
            }
        } else if is_operator_start(first) {
            let (rest, name_bytes) = take_while1::<_, _, nom::error::Error<&[u8]>>(|b: u8| {
                is_regular(b)
            })(input)
            .unwrap_or((&input[1..], &input[..1]));
            let name = String::from_utf8_lossy(name_bytes).to_string();

            if name == "BI" {
                // Inline image: binary payload, no tokenizing until EI
                match skip_inline_image(rest) {
                    Some(after) => {
                        let end = total - after.len();
                        ops.push(ContentOp {
                            name,
                            span: operand_start.unwrap_or(offset)..end,
                            operand_count,
                        });
                        input = after;
                    },
                    None => {
                        return Err(Error::ContentStream {
                            offset,
                            reason: "inline image without EI terminator".to_string(),
                        })
                    },
                }
            } else {
                let end = total - rest.len();
                ops.push(ContentOp {
                    name,
                    span: operand_start.unwrap_or(offset)..end,
                    operand_count,
                });
                input = rest;
            }
            operand_start = None;
            operand_count = 0;
        } else {
            // Stray delimiter; skip it and drop the pending operand group,
            // its span can no longer be trusted
            log::debug!("skipping stray byte 0x{:02X} at offset {}", first, offset);
            input = &input[1..];
            operand_start = None;
            operand_count = 0;
        }
    }
    Ok(ops)
}

/// Count text-showing operators in a stream; 0 if the stream cannot be
/// tokenized.
pub fn count_text_showing_ops(data: &[u8]) -> usize {
    match scan_content_ops(data) {
        Ok(ops) => ops.iter().filter(|op| is_text_showing(&op.name)).count(),
        Err(err) => {
            log::warn!("content stream not countable: {}", err);
            0
        },
    }
}
