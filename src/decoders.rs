//! Stream filter codecs.
//!
//! Decodes the stream filters that show up on page content streams
//! (FlateDecode, ASCIIHexDecode) and compresses streams for writing.
//! See ISO 32000-1:2008, Section 7.4.

use crate::error::{Error, Result};
use std::io::{Read, Write};

/// Decode stream data through a filter pipeline.
///
/// Filters are applied in the order they appear in the `/Filter` entry.
pub fn decode_stream(data: &[u8], filters: &[String]) -> Result<Vec<u8>> {
    let mut current = data.to_vec();
    for filter in filters {
        current = match filter.as_str() {
            "FlateDecode" | "Fl" => flate_decode(&current)?,
            "ASCIIHexDecode" | "AHx" => ascii_hex_decode(&current)?,
            other => return Err(Error::UnsupportedFilter(other.to_string())),
        };
    }
    Ok(current)
}

/// Compress data for a FlateDecode stream.
pub fn flate_encode(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder =
        flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Decompress FlateDecode stream data.
///
/// Tries zlib first; some generators emit raw deflate without the zlib
/// header, so that is attempted as a fallback before giving up.
pub fn flate_decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut decoder = flate2::read::ZlibDecoder::new(data);
    match decoder.read_to_end(&mut out) {
        Ok(_) => Ok(out),
        Err(zlib_err) => {
            out.clear();
            let mut raw = flate2::read::DeflateDecoder::new(data);
            match raw.read_to_end(&mut out) {
                Ok(_) => Ok(out),
                Err(_) => Err(Error::Decode(format!("FlateDecode failed: {}", zlib_err))),
            }
        },
    }
}

/// Decode ASCIIHexDecode data.
///
/// Whitespace is ignored; `>` terminates the data. An odd trailing digit is
/// padded with zero per the spec.
pub fn ascii_hex_decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() / 2);
    let mut hi: Option<u8> = None;

    for &byte in data {
        let digit = match byte {
            b'0'..=b'9' => byte - b'0',
            b'a'..=b'f' => byte - b'a' + 10,
            b'A'..=b'F' => byte - b'A' + 10,
            b'>' => break,
            0x00 | 0x09 | 0x0A | 0x0C | 0x0D | 0x20 => continue,
            _ => {
                return Err(Error::Decode(format!(
                    "ASCIIHexDecode: invalid byte 0x{:02X}",
                    byte
                )))
            },
        };
        match hi.take() {
            Some(h) => out.push((h << 4) | digit),
            None => hi = Some(digit),
        }
    }

    if let Some(h) = hi {
        out.push(h << 4);
    }
    Ok(out)
}
