//! PDF object serialization.
//!
//! Serializes PDF objects to their byte representation according to
//! PDF specification ISO 32000-1:2008.

use crate::object::{Dictionary, Object};
use std::io::Write;

/// Serializer for PDF objects.
///
/// Converts `Object` values to their byte representation following the
/// PDF syntax rules. Dictionary keys are written sorted for deterministic
/// output.
#[derive(Debug, Clone, Default)]
pub struct ObjectSerializer;

impl ObjectSerializer {
    /// Create a new object serializer.
    pub fn new() -> Self {
        Self
    }

    /// Serialize an object to bytes.
    pub fn serialize(&self, obj: &Object) -> Vec<u8> {
        let mut buf = Vec::new();
        self.write_object(&mut buf, obj)
            .expect("writing to Vec cannot fail");
        buf
    }

    /// Serialize an object to a string (for tests and debugging).
    pub fn serialize_to_string(&self, obj: &Object) -> String {
        String::from_utf8_lossy(&self.serialize(obj)).to_string()
    }

    /// Serialize an indirect object definition.
    ///
    /// Format: `{id} {gen} obj\n{object}\nendobj\n`
    pub fn serialize_indirect(&self, id: u32, gen: u16, obj: &Object) -> Vec<u8> {
        let mut buf = Vec::new();
        writeln!(buf, "{} {} obj", id, gen).expect("writing to Vec cannot fail");
        self.write_object(&mut buf, obj)
            .expect("writing to Vec cannot fail");
        write!(buf, "\nendobj\n").expect("writing to Vec cannot fail");
        buf
    }

    /// Write an object to a buffer.
    fn write_object<W: Write>(&self, w: &mut W, obj: &Object) -> std::io::Result<()> {
        match obj {
            Object::Null => write!(w, "null"),
            Object::Boolean(b) => write!(w, "{}", if *b { "true" } else { "false" }),
            Object::Integer(i) => write!(w, "{}", i),
            Object::Real(r) => self.write_real(w, *r),
            Object::String(s) => self.write_string(w, s),
            Object::Name(n) => self.write_name(w, n),
            Object::Array(arr) => self.write_array(w, arr),
            Object::Dictionary(dict) => self.write_dictionary(w, dict),
            Object::Stream { dict, data } => self.write_stream(w, dict, data),
            Object::Reference(r) => write!(w, "{} {} R", r.id, r.gen),
        }
    }

    /// Write a real number, trimming trailing zeros.
    fn write_real<W: Write>(&self, w: &mut W, value: f64) -> std::io::Result<()> {
        if value.fract() == 0.0 {
            write!(w, "{}", value as i64)
        } else {
            let formatted = format!("{:.5}", value);
            let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
            write!(w, "{}", trimmed)
        }
    }

    /// Write a PDF string: literal `(...)` when printable, hex `<...>`
    /// otherwise.
    fn write_string<W: Write>(&self, w: &mut W, data: &[u8]) -> std::io::Result<()> {
        let is_printable = data
            .iter()
            .all(|&b| b == b'\n' || b == b'\r' || b == b'\t' || (0x20..=0x7E).contains(&b));

        if is_printable {
            write!(w, "(")?;
            for &byte in data {
                match byte {
                    b'(' => write!(w, "\\(")?,
                    b')' => write!(w, "\\)")?,
                    b'\\' => write!(w, "\\\\")?,
                    b'\n' => write!(w, "\\n")?,
                    b'\r' => write!(w, "\\r")?,
                    b'\t' => write!(w, "\\t")?,
                    _ => w.write_all(&[byte])?,
                }
            }
            write!(w, ")")
        } else {
            write!(w, "<")?;
            for byte in data {
                write!(w, "{:02X}", byte)?;
            }
            write!(w, ">")
        }
    }

    /// Write a PDF name, escaping irregular characters with `#xx`.
    fn write_name<W: Write>(&self, w: &mut W, name: &str) -> std::io::Result<()> {
        write!(w, "/")?;
        for byte in name.bytes() {
            if byte.is_ascii_graphic()
                && !matches!(byte, b'#' | b'/' | b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'%')
            {
                w.write_all(&[byte])?;
            } else {
                write!(w, "#{:02X}", byte)?;
            }
        }
        Ok(())
    }

    /// Write a PDF array.
    fn write_array<W: Write>(&self, w: &mut W, arr: &[Object]) -> std::io::Result<()> {
        write!(w, "[")?;
        for (i, obj) in arr.iter().enumerate() {
            if i > 0 {
                write!(w, " ")?;
            }
            self.write_object(w, obj)?;
        }
        write!(w, "]")
    }

    /// Write a PDF dictionary with sorted keys.
    fn write_dictionary<W: Write>(&self, w: &mut W, dict: &Dictionary) -> std::io::Result<()> {
        write!(w, "<<")?;
        let mut keys: Vec<_> = dict.keys().collect();
        keys.sort();
        for key in keys {
            if let Some(value) = dict.get(key) {
                write!(w, " ")?;
                self.write_name(w, key)?;
                write!(w, " ")?;
                self.write_object(w, value)?;
            }
        }
        write!(w, " >>")
    }

    /// Write a PDF stream, adding `/Length` if absent.
    fn write_stream<W: Write>(
        &self,
        w: &mut W,
        dict: &Dictionary,
        data: &[u8],
    ) -> std::io::Result<()> {
        let mut dict_with_length = dict.clone();
        dict_with_length
            .entry("Length".to_string())
            .or_insert(Object::Integer(data.len() as i64));

        self.write_dictionary(w, &dict_with_length)?;
        write!(w, "\nstream\n")?;
        w.write_all(data)?;
        write!(w, "\nendstream")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectRef;

    #[test]
    fn test_serialize_scalars() {
        let s = ObjectSerializer::new();
        assert_eq!(s.serialize_to_string(&Object::Null), "null");
        assert_eq!(s.serialize_to_string(&Object::Boolean(true)), "true");
        assert_eq!(s.serialize_to_string(&Object::Integer(-123)), "-123");
        assert_eq!(s.serialize_to_string(&Object::Real(1.0)), "1");
        assert_eq!(s.serialize_to_string(&Object::Real(0.5)), "0.5");
    }

    #[test]
    fn test_serialize_string_escaping() {
        let s = ObjectSerializer::new();
        assert_eq!(
            s.serialize_to_string(&Object::String(b"Test (parens)".to_vec())),
            "(Test \\(parens\\))"
        );
    }

    #[test]
    fn test_serialize_binary_string_as_hex() {
        let s = ObjectSerializer::new();
        assert_eq!(
            s.serialize_to_string(&Object::String(vec![0x00, 0xFF, 0x80])),
            "<00FF80>"
        );
    }

    #[test]
    fn test_serialize_name_with_space() {
        let s = ObjectSerializer::new();
        assert_eq!(
            s.serialize_to_string(&Object::name("Name With Space")),
            "/Name#20With#20Space"
        );
    }

    #[test]
    fn test_serialize_dictionary_sorted() {
        let s = ObjectSerializer::new();
        let dict = Object::dict(vec![
            ("Type", Object::name("Page")),
            ("Count", Object::Integer(1)),
        ]);
        // Keys are sorted: Count before Type
        assert_eq!(s.serialize_to_string(&dict), "<< /Count 1 /Type /Page >>");
    }

    #[test]
    fn test_serialize_reference_and_array() {
        let s = ObjectSerializer::new();
        let arr = Object::Array(vec![
            Object::Reference(ObjectRef::new(3, 0)),
            Object::Integer(7),
        ]);
        assert_eq!(s.serialize_to_string(&arr), "[3 0 R 7]");
    }

    #[test]
    fn test_serialize_indirect() {
        let s = ObjectSerializer::new();
        let bytes = s.serialize_indirect(1, 0, &Object::Integer(42));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.starts_with("1 0 obj\n"));
        assert!(text.contains("42"));
        assert!(text.ends_with("endobj\n"));
    }

    #[test]
    fn test_serialize_stream_gets_length() {
        let s = ObjectSerializer::new();
        let stream = Object::Stream {
            dict: crate::object::Dictionary::new(),
            data: bytes::Bytes::from_static(b"BT (x) Tj ET"),
        };
        let text = s.serialize_to_string(&stream);
        assert!(text.contains("/Length 12"));
        assert!(text.contains("stream\nBT (x) Tj ET\nendstream"));
    }
}
